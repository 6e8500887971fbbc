//! sstrend: per-cell temperature trends for gridded climate model output
//!
//! A Rust library for analysing monthly surface-temperature fields from
//! scenario runs (SSP-style NetCDF output). At every grid cell it regresses
//! temperature against year, per calendar month and for the annual mean, and
//! reports the trend, its significance, the correlation and the intercept.
//!
//! ## Key Features
//!
//! - **Parallel Processing**: Per-cell regressions run on Rayon's thread pool
//! - **Trend Maps**: Slope, significance, correlation and intercept rasters
//! - **Model Calendars**: 360-day, noleap, all-leap and gregorian time axes
//! - **Regions and Points**: Lat/lon subsets and nearest-cell series
//! - **Climatologies**: Annual, seasonal and monthly means and anomalies
//!
//! ## Module Organization
//!
//! - [`trend`]: Regression and the per-cell trend engine
//! - [`field`]: (year, month, lat, lon) temperature fields
//! - [`dataset`]: Loading a variable with its coordinates and dates
//! - [`calendar`]: CF time units and model calendars
//! - [`statistics`]: Parallel reductions and climatologies
//! - [`series`]: Single-location time series
//! - [`metadata`]: NetCDF file inspection and variable description
//! - [`netcdf_io`]: Writing result rasters to NetCDF
//! - [`parallel`]: Parallel processing configuration
//! - [`errors`]: Centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sstrend::prelude::*;
//!
//! let dataset = ClimateDataset::open("ts_ssp585.nc", "ts").unwrap();
//! let field = dataset.to_field(12).unwrap();
//!
//! // Regress the first 30 years, every calendar month
//! let maps = TrendEngine::new(TrendWindow::new(0, 30, 0, 12))
//!     .compute(&field)
//!     .unwrap();
//! println!("{:.3} K/decade", maps.summary().mean_trend_per_decade);
//! ```

pub mod calendar;
pub mod dataset;
pub mod errors;
pub mod field;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod series;
pub mod statistics;
pub mod trend;

pub use errors::{Result, TrendError};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::calendar::{Calendar, CalendarDate};
    pub use crate::dataset::{ClimateDataset, RegionBounds};
    pub use crate::errors::{Result, TrendError};
    pub use crate::field::{TemperatureField, MONTHS_PER_YEAR};
    pub use crate::netcdf_io::TrendWriter;
    pub use crate::parallel::ParallelConfig;
    pub use crate::trend::{
        compute_trends, linear_rate, TrendEngine, TrendMaps, TrendWindow, SIGNIFICANCE_LEVEL,
    };
}
