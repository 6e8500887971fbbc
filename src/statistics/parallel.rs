//! Parallel computation implementations for statistical operations
//!
//! Each output element reduces one lane of the input along the requested
//! axis. Lanes are independent, so they are distributed over the Rayon pool.

use super::operations::StatOperation;
use crate::errors::Result;
use ndarray::{ArrayD, ArrayViewD, Axis, RemoveAxis, Zip};
use tracing::debug;

/// Reduce `data` along `axis`, skipping NaN and infinite values.
///
/// Elements whose lane holds no finite value become NaN.
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_reduce_axis(
    data: ArrayViewD<'_, f64>,
    axis: usize,
    operation: StatOperation,
) -> Result<ArrayD<f64>> {
    if axis >= data.ndim() {
        return Err(crate::errors::TrendError::Statistics(format!(
            "Axis {axis} is out of bounds for array with {} dimensions",
            data.ndim()
        )));
    }

    let axis = Axis(axis);
    let mut result = ArrayD::<f64>::zeros(data.raw_dim().remove_axis(axis));

    debug!(
        operation = operation.as_str(),
        elements = result.len(),
        threads = rayon::current_num_threads(),
        "Parallel reduction"
    );

    Zip::from(&mut result)
        .and(data.lanes(axis))
        .par_for_each(|out, lane| *out = operation.reduce(lane.iter()));

    Ok(result)
}

/// Computes mean along an axis using parallel processing
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_mean_axis(data: ArrayViewD<'_, f64>, axis: usize) -> Result<ArrayD<f64>> {
    parallel_reduce_axis(data, axis, StatOperation::Mean)
}

/// Computes population standard deviation along an axis using parallel processing
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_std_axis(data: ArrayViewD<'_, f64>, axis: usize) -> Result<ArrayD<f64>> {
    parallel_reduce_axis(data, axis, StatOperation::Std)
}

/// Computes minimum along an axis using parallel processing
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_min_axis(data: ArrayViewD<'_, f64>, axis: usize) -> Result<ArrayD<f64>> {
    parallel_reduce_axis(data, axis, StatOperation::Min)
}

/// Computes maximum along an axis using parallel processing
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_max_axis(data: ArrayViewD<'_, f64>, axis: usize) -> Result<ArrayD<f64>> {
    parallel_reduce_axis(data, axis, StatOperation::Max)
}
