//! Linear trend analysis of gridded temperature
//!
//! # Organization
//!
//! - [`regression`]: single-series least-squares fit and significance test
//! - [`engine`]: per-cell monthly and annual trend rasters
//! - [`rate`]: slope-only rate over a flat monthly series

pub mod engine;
pub mod rate;
pub mod regression;

pub use engine::{
    compute_trends, TrendArrays, TrendEngine, TrendMaps, TrendSet, TrendSummary, TrendWindow,
    SIGNIFICANCE_LEVEL, YEARS_PER_DECADE,
};
pub use rate::{linear_rate, MONTHS_PER_DECADE};
pub use regression::{LinearFit, TimeAxis};
