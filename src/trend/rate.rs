//! Whole-series linear rate per grid cell
//!
//! A faster alternative to the full engine when only the slope is wanted: each
//! cell's complete monthly series is regressed against time step, without
//! splitting it into years and months and without a significance test.

use super::regression::TimeAxis;
use crate::errors::{Result, TrendError};
use ndarray::{s, Array2, ArrayView3};
use rayon::prelude::*;
use tracing::info;

/// Converts a per-month slope to per-decade
pub const MONTHS_PER_DECADE: f64 = 120.0;

/// Slope of every cell of a (time, x, y) series, multiplied by `scale`.
///
/// A cell with any masked value gets NaN.
///
/// # Errors
///
/// Returns [`TrendError::InvalidShape`] if the grid is empty, or
/// [`TrendError::InvalidWindow`] with fewer than two time steps.
pub fn linear_rate(series: ArrayView3<'_, f64>, scale: f64) -> Result<Array2<f64>> {
    let (nt, nx, ny) = series.dim();
    if nx == 0 || ny == 0 {
        return Err(TrendError::shape(format!(
            "grid extents must be positive, got {nx}x{ny}"
        )));
    }
    let axis = TimeAxis::new(nt)?;

    info!(nt, nx, ny, scale, "Computing linear rate");

    let slopes: Vec<f64> = (0..nx * ny)
        .into_par_iter()
        .map(|cell| {
            let (i, j) = (cell / ny, cell % ny);
            axis.slope(series.slice(s![.., i, j])) * scale
        })
        .collect();

    Ok(Array2::from_shape_vec((nx, ny), slopes)?)
}
