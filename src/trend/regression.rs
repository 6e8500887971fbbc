//! Ordinary least-squares fit of a single series against its time index
//!
//! Every series regressed by the engine shares the same independent variable
//! (the index `0..n`), so its mean and sum of squares are computed once in
//! [`TimeAxis`] and reused for every grid cell.

use crate::errors::{Result, TrendError};
use ndarray::ArrayView1;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Regression statistics for one series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Change per time step
    pub slope: f64,
    /// Fitted value at index 0
    pub intercept: f64,
    /// Pearson correlation between index and value
    pub correlation: f64,
    /// `100 * (1 - p)` for the two-sided test of a zero slope
    pub significance: f64,
}

impl LinearFit {
    /// Sentinel for a series with masked or non-finite values
    pub const MISSING: Self = Self {
        slope: f64::NAN,
        intercept: f64::NAN,
        correlation: f64::NAN,
        significance: f64::NAN,
    };

    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.slope.is_nan()
    }
}

/// Precomputed statistics of the regressor `0, 1, ..., n - 1`
#[derive(Debug, Clone)]
pub struct TimeAxis {
    len: usize,
    mean: f64,
    sxx: f64,
    t_dist: Option<StudentsT>,
}

impl TimeAxis {
    /// Build the axis for `len` samples.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidWindow`] when fewer than two samples are
    /// requested, since a slope is undefined for a single point.
    pub fn new(len: usize) -> Result<Self> {
        if len < 2 {
            return Err(TrendError::window(format!(
                "a linear fit needs at least 2 samples, got {len}"
            )));
        }

        let n = len as f64;
        let mean = (n - 1.0) / 2.0;
        // Sum of (i - mean)^2 for i in 0..n
        let sxx = n * (n * n - 1.0) / 12.0;

        let t_dist = if len > 2 {
            Some(
                StudentsT::new(0.0, 1.0, n - 2.0)
                    .map_err(|e| TrendError::Statistics(e.to_string()))?,
            )
        } else {
            None
        };

        Ok(Self {
            len,
            mean,
            sxx,
            t_dist,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Full regression of `values` against the axis.
    ///
    /// A series with any non-finite value, or whose length differs from
    /// [`TimeAxis::len`], yields [`LinearFit::MISSING`].
    #[must_use]
    pub fn fit(&self, values: ArrayView1<'_, f64>) -> LinearFit {
        let Some(moments) = self.moments(values) else {
            return LinearFit::MISSING;
        };

        if moments.constant {
            // No trend and no defined correlation
            return LinearFit {
                slope: 0.0,
                intercept: moments.y_mean,
                correlation: f64::NAN,
                significance: 0.0,
            };
        }

        let slope = moments.sxy / self.sxx;
        let intercept = moments.y_mean - slope * self.mean;

        let correlation = (moments.sxy / (self.sxx * moments.syy).sqrt()).clamp(-1.0, 1.0);
        let p_value = self.p_value(correlation);

        LinearFit {
            slope,
            intercept,
            correlation,
            significance: 100.0 * (1.0 - p_value),
        }
    }

    /// Slope only, skipping the significance test.
    #[must_use]
    pub fn slope(&self, values: ArrayView1<'_, f64>) -> f64 {
        self.moments(values).map_or(f64::NAN, |moments| {
            if moments.constant {
                0.0
            } else {
                moments.sxy / self.sxx
            }
        })
    }

    fn p_value(&self, correlation: f64) -> f64 {
        let Some(dist) = &self.t_dist else {
            // Two points always lie on a line
            return 0.0;
        };
        if correlation.abs() >= 1.0 {
            return 0.0;
        }

        let df = (self.len - 2) as f64;
        let t = correlation * (df / ((1.0 - correlation) * (1.0 + correlation))).sqrt();
        (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0)
    }

    fn moments(&self, values: ArrayView1<'_, f64>) -> Option<Moments> {
        if values.len() != self.len || values.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let &first = values.iter().next()?;
        if values.iter().all(|&v| v == first) {
            return Some(Moments {
                y_mean: first,
                sxy: 0.0,
                syy: 0.0,
                constant: true,
            });
        }

        let y_mean = values.sum() / self.len as f64;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let dx = i as f64 - self.mean;
            let dy = y - y_mean;
            sxy += dx * dy;
            syy += dy * dy;
        }

        Some(Moments {
            y_mean,
            sxy,
            syy,
            constant: false,
        })
    }
}

struct Moments {
    y_mean: f64,
    sxy: f64,
    syy: f64,
    constant: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_known_regression() {
        let axis = TimeAxis::new(5).unwrap();
        let fit = axis.fit(arr1(&[1.0, 3.0, 2.0, 5.0, 4.0]).view());

        assert_abs_diff_eq!(fit.slope, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.intercept, 1.4, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.correlation, 0.8, epsilon = 1e-12);
        // t = 4/sqrt(3) with 3 degrees of freedom gives p = 0.104084
        assert_abs_diff_eq!(fit.significance, 89.5916, epsilon = 1e-3);
    }

    #[test]
    fn test_two_points() {
        let axis = TimeAxis::new(2).unwrap();

        let rising = axis.fit(arr1(&[1.0, 2.0]).view());
        assert_abs_diff_eq!(rising.slope, 1.0);
        assert_abs_diff_eq!(rising.correlation, 1.0);
        assert_abs_diff_eq!(rising.significance, 100.0);

        let flat = axis.fit(arr1(&[4.0, 4.0]).view());
        assert_abs_diff_eq!(flat.slope, 0.0);
        assert!(flat.correlation.is_nan());
        assert_abs_diff_eq!(flat.significance, 0.0);
    }

    #[test]
    fn test_constant_series_with_inexact_mean() {
        let axis = TimeAxis::new(7).unwrap();
        let fit = axis.fit(arr1(&[273.15; 7]).view());
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 273.15);
        assert!(fit.correlation.is_nan());
        assert_eq!(fit.significance, 0.0);
    }

    #[test]
    fn test_single_sample_rejected() {
        assert!(matches!(
            TimeAxis::new(1),
            Err(TrendError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_slope_matches_fit() {
        let axis = TimeAxis::new(4).unwrap();
        let values = arr1(&[10.0, 12.5, 14.0, 17.0]);
        assert_abs_diff_eq!(
            axis.slope(values.view()),
            axis.fit(values.view()).slope,
            epsilon = 1e-12
        );
        assert!(axis.slope(arr1(&[1.0, f64::NAN, 2.0, 3.0]).view()).is_nan());
    }

    #[test]
    fn test_length_mismatch_is_missing() {
        let axis = TimeAxis::new(4).unwrap();
        assert!(axis.fit(arr1(&[1.0, 2.0, 3.0]).view()).is_missing());
        assert!(axis.fit(arr1(&[1.0, 2.0, 3.0, 4.0, 5.0]).view()).is_missing());
        assert!(axis.slope(arr1::<f64>(&[]).view()).is_nan());
    }
}
