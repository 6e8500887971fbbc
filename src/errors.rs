//! Centralized error handling for sstrend
//!
//! Every fallible operation in the crate returns [`Result`], carrying a
//! [`TrendError`] that tells the caller whether the input file, the requested
//! window, or the grid itself was at fault.

use thiserror::Error;

/// Main error type for sstrend operations
#[derive(Error, Debug)]
pub enum TrendError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),

    /// Variable not found in NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// Dimension not found in variable
    #[error("Dimension '{dim}' not found in variable '{var}'")]
    DimensionNotFound { var: String, dim: String },

    /// Regression window does not fit inside the available data
    #[error("Invalid trend window: {message}")]
    InvalidWindow { message: String },

    /// Input array has the wrong rank or extents
    #[error("Invalid shape: {message}")]
    InvalidShape { message: String },

    /// Latitude/longitude bounds that cannot select anything
    #[error("Invalid region: {message}")]
    InvalidRegion { message: String },

    /// Unparseable time units or unknown calendar
    #[error("Calendar error: {message}")]
    Calendar { message: String },

    /// A selection produced no data
    #[error("No data: {message}")]
    NoData { message: String },

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Statistics computation errors
    #[error("Statistics computation error: {0}")]
    Statistics(String),
}

impl TrendError {
    pub(crate) fn window(message: impl Into<String>) -> Self {
        Self::InvalidWindow {
            message: message.into(),
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }

    pub(crate) fn calendar(message: impl Into<String>) -> Self {
        Self::Calendar {
            message: message.into(),
        }
    }
}

/// Result type alias for sstrend operations
pub type Result<T> = std::result::Result<T, TrendError>;
