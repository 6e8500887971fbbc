//! Statistical computations and parallel reduction operations
//!
//! This module provides NaN-aware reductions (mean, std, min, max) over one
//! axis of a gridded array, and the time aggregations built on them.
//!
//! # Organization
//!
//! This module is organized into submodules:
//! - [`operations`]: Core statistical operations and traits
//! - [`parallel`]: Parallel computation implementations
//! - [`climatology`]: Annual, seasonal and anomaly views of a temperature field

pub mod climatology;
pub mod operations;
pub mod parallel;

// Re-export the main types and functions for convenience
pub use climatology::{
    annual_means, difference, monthly_anomaly, monthly_climatology, seasonal_means,
    time_mean_and_std, Season,
};
pub use operations::{StatOperation, StatisticalReduction};
pub use parallel::{
    parallel_max_axis, parallel_mean_axis, parallel_min_axis, parallel_reduce_axis,
    parallel_std_axis,
};
