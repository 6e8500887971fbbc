//! Core statistical operations and traits
//!
//! This module defines the reductions available over one axis of a gridded
//! array and the trait that dispatches them.

use crate::errors::{Result, TrendError};
use ndarray::ArrayD;

/// Supported statistical operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Arithmetic mean
    Mean,
    /// Population standard deviation
    Std,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

impl StatOperation {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Std => "std",
            Self::Min => "minimum",
            Self::Max => "maximum",
        }
    }

    /// Reduce one lane, ignoring non-finite values. NaN if none remain.
    pub(crate) fn reduce<'a>(self, values: impl Iterator<Item = &'a f64>) -> f64 {
        let finite: Vec<f64> = values.copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return f64::NAN;
        }
        let n = finite.len() as f64;

        match self {
            Self::Mean => finite.iter().sum::<f64>() / n,
            Self::Std => {
                let mean = finite.iter().sum::<f64>() / n;
                (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
            }
            Self::Min => finite.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Trait for types that can perform statistical reductions along an axis
pub trait StatisticalReduction<T> {
    /// Perform a statistical reduction along the specified axis
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds for the array.
    fn reduce_along_axis(&self, axis: usize, operation: StatOperation) -> Result<ArrayD<T>>;
}

impl StatisticalReduction<f64> for ArrayD<f64> {
    fn reduce_along_axis(&self, axis: usize, operation: StatOperation) -> Result<ArrayD<f64>> {
        if axis >= self.ndim() {
            return Err(TrendError::Statistics(format!(
                "Axis {axis} is out of bounds for array with {} dimensions",
                self.ndim()
            )));
        }

        super::parallel::parallel_reduce_axis(self.view(), axis, operation)
    }
}
