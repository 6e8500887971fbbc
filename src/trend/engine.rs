//! Per-cell monthly and annual trend computation
//!
//! The engine regresses temperature against year index independently at every
//! grid cell: once per calendar month across years, and once for the annual
//! mean. Cells are fitted in parallel with Rayon; each cell is computed the
//! same way regardless of scheduling, so results are bit-identical for any
//! thread count.

use super::regression::{LinearFit, TimeAxis};
use crate::errors::{Result, TrendError};
use crate::field::TemperatureField;
use ndarray::{s, Array, ArrayView3, ArrayView4, Axis, Dimension, Ix2, Ix3};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// Years per decade, for converting K/year trends to K/decade
pub const YEARS_PER_DECADE: f64 = 10.0;

/// Which years and calendar months enter the regression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendWindow {
    /// Offset of the first year into the field's year axis
    pub start_year: usize,
    /// Number of consecutive years regressed
    pub num_years: usize,
    /// First calendar month (0-based) with a monthly regression
    pub start_month: usize,
    /// Number of calendar months with a monthly regression
    pub num_months: usize,
}

impl TrendWindow {
    #[must_use]
    pub const fn new(
        start_year: usize,
        num_years: usize,
        start_month: usize,
        num_months: usize,
    ) -> Self {
        Self {
            start_year,
            num_years,
            start_month,
            num_months,
        }
    }

    /// Window covering every year and month of `field`
    #[must_use]
    pub fn spanning(field: &TemperatureField) -> Self {
        Self::new(0, field.years(), 0, field.months())
    }

    /// Check the window against a (year, month, x, y) shape.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidWindow`] if the window does not fit inside
    /// the field, or [`TrendError::InvalidShape`] if any extent is zero.
    pub fn validate(&self, shape: &[usize]) -> Result<()> {
        let [years, months, nx, ny] = shape else {
            return Err(TrendError::shape(format!(
                "expected a (year, month, x, y) field, got {} dimensions",
                shape.len()
            )));
        };

        if [*years, *months, *nx, *ny].contains(&0) {
            return Err(TrendError::shape(format!(
                "field extents must be positive, got {shape:?}"
            )));
        }
        if self.num_years < 2 {
            return Err(TrendError::window(format!(
                "num_years must be at least 2, got {}",
                self.num_years
            )));
        }
        window_end(self.start_year, self.num_years, *years, "years")?;
        if self.num_months == 0 {
            return Err(TrendError::window("num_months must be positive"));
        }
        window_end(self.start_month, self.num_months, *months, "months per year")?;

        Ok(())
    }

    /// Year range of a validated window
    fn years(&self) -> std::ops::Range<usize> {
        self.start_year..self.start_year.saturating_add(self.num_years)
    }

    /// Month range of a validated window
    fn months(&self) -> std::ops::Range<usize> {
        self.start_month..self.start_month.saturating_add(self.num_months)
    }
}

/// End of `start..start + len`, checked against `available`.
fn window_end(start: usize, len: usize, available: usize, what: &str) -> Result<usize> {
    match start.checked_add(len) {
        Some(end) if end <= available => Ok(end),
        Some(end) => Err(TrendError::window(format!(
            "{what} {start}..{end} exceed the {available} {what} available"
        ))),
        None => Err(TrendError::window(format!(
            "{what} window starting at {start} with length {len} overflows"
        ))),
    }
}

/// Trend, significance, correlation and intercept rasters of one resolution
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSet<D: Dimension> {
    pub trend: Array<f64, D>,
    pub significance: Array<f64, D>,
    pub correlation: Array<f64, D>,
    pub intercept: Array<f64, D>,
}

impl<D: Dimension> TrendSet<D> {
    fn from_fits(dim: D, fits: &[LinearFit]) -> Result<Self> {
        let collect = |f: fn(&LinearFit) -> f64| -> Result<Array<f64, D>> {
            Ok(Array::from_shape_vec(
                dim.clone(),
                fits.iter().map(f).collect(),
            )?)
        };

        Ok(Self {
            trend: collect(|fit: &LinearFit| fit.slope)?,
            significance: collect(|fit: &LinearFit| fit.significance)?,
            correlation: collect(|fit: &LinearFit| fit.correlation)?,
            intercept: collect(|fit: &LinearFit| fit.intercept)?,
        })
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.trend.shape()
    }

    /// Trend scaled from per-year to per-decade
    #[must_use]
    pub fn per_decade(&self) -> Array<f64, D> {
        self.trend.mapv(|v| v * YEARS_PER_DECADE)
    }

    /// Mean trend over cells that have one, NaN if none do
    #[must_use]
    pub fn mean_trend(&self) -> f64 {
        let (sum, count) = self
            .trend
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0_usize), |(sum, count), &v| (sum + v, count + 1));
        if count == 0 {
            f64::NAN
        } else {
            sum / count as f64
        }
    }

    /// Fraction of valid cells whose significance reaches `threshold`
    #[must_use]
    pub fn significant_fraction(&self, threshold: f64) -> f64 {
        let valid: Vec<f64> = self
            .significance
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if valid.is_empty() {
            return f64::NAN;
        }
        valid.iter().filter(|&&v| v >= threshold).count() as f64 / valid.len() as f64
    }

    /// Number of cells whose trend is the missing sentinel
    #[must_use]
    pub fn missing_cells(&self) -> usize {
        self.trend.iter().filter(|v| v.is_nan()).count()
    }
}

/// The eight rasters produced by one engine call
pub type TrendArrays = (
    ndarray::Array2<f64>,
    ndarray::Array3<f64>,
    ndarray::Array2<f64>,
    ndarray::Array3<f64>,
    ndarray::Array2<f64>,
    ndarray::Array3<f64>,
    ndarray::Array2<f64>,
    ndarray::Array3<f64>,
);

/// Significance (percent) at which a trend counts as significant in summaries
pub const SIGNIFICANCE_LEVEL: f64 = 95.0;

/// Domain-wide overview of one engine call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub start_year: usize,
    pub num_years: usize,
    /// Mean annual trend over valid cells, K/decade
    pub mean_trend_per_decade: f64,
    /// Fraction of valid cells at or above [`SIGNIFICANCE_LEVEL`]
    pub significant_fraction: f64,
    pub missing_cells: usize,
    /// (0-based calendar month, mean trend in K/decade)
    pub monthly_trend_per_decade: Vec<(usize, f64)>,
}

/// Annual and monthly trend rasters for one field
#[derive(Debug, Clone, PartialEq)]
pub struct TrendMaps {
    /// Regression of the annual mean, shape (x, y)
    pub annual: TrendSet<Ix2>,
    /// One regression per calendar month, shape (num_months, x, y)
    pub monthly: TrendSet<Ix3>,
    pub window: TrendWindow,
}

impl TrendMaps {
    #[must_use]
    pub fn summary(&self) -> TrendSummary {
        let monthly_trend_per_decade = self
            .monthly
            .trend
            .outer_iter()
            .zip(self.window.months())
            .map(|(trend, month)| {
                let valid: Vec<f64> = trend.iter().copied().filter(|v| v.is_finite()).collect();
                let mean = if valid.is_empty() {
                    f64::NAN
                } else {
                    valid.iter().sum::<f64>() / valid.len() as f64
                };
                (month, mean * YEARS_PER_DECADE)
            })
            .collect();

        TrendSummary {
            start_year: self.window.start_year,
            num_years: self.window.num_years,
            mean_trend_per_decade: self.annual.mean_trend() * YEARS_PER_DECADE,
            significant_fraction: self.annual.significant_fraction(SIGNIFICANCE_LEVEL),
            missing_cells: self.annual.missing_cells(),
            monthly_trend_per_decade,
        }
    }

    /// Annual trend of `self` minus that of `other`, in K/decade.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidShape`] if the two grids differ.
    pub fn decadal_difference(&self, other: &TrendMaps) -> Result<ndarray::Array2<f64>> {
        if self.annual.shape() != other.annual.shape() {
            return Err(TrendError::shape(format!(
                "cannot compare grids {:?} and {:?}",
                self.annual.shape(),
                other.annual.shape()
            )));
        }
        Ok(self.annual.per_decade() - other.annual.per_decade())
    }

    /// Split into `(trend, trend_monthly, significance, significance_monthly,
    /// correlation, correlation_monthly, intercept, intercept_monthly)`.
    #[must_use]
    pub fn into_arrays(self) -> TrendArrays {
        (
            self.annual.trend,
            self.monthly.trend,
            self.annual.significance,
            self.monthly.significance,
            self.annual.correlation,
            self.monthly.correlation,
            self.annual.intercept,
            self.monthly.intercept,
        )
    }
}

/// Stateless per-cell trend calculator
#[derive(Debug, Clone, Copy)]
pub struct TrendEngine {
    window: TrendWindow,
}

impl TrendEngine {
    #[must_use]
    pub const fn new(window: TrendWindow) -> Self {
        Self { window }
    }

    #[must_use]
    pub const fn window(&self) -> TrendWindow {
        self.window
    }

    /// Compute monthly and annual trend rasters for `field`.
    ///
    /// # Errors
    ///
    /// Returns an error if the window does not fit the field. Cells with
    /// missing data do not fail the call; their outputs are NaN.
    pub fn compute(&self, field: &TemperatureField) -> Result<TrendMaps> {
        self.compute_view(field.view())
    }

    /// Same as [`TrendEngine::compute`] for a raw (year, month, x, y) view.
    ///
    /// # Errors
    ///
    /// See [`TrendEngine::compute`].
    pub fn compute_view(&self, field: ArrayView4<'_, f64>) -> Result<TrendMaps> {
        let window = self.window;
        window.validate(field.shape())?;

        let (_, _, nx, ny) = field.dim();
        let axis = TimeAxis::new(window.num_years)?;

        info!(
            nx,
            ny,
            start_year = window.start_year,
            num_years = window.num_years,
            threads = rayon::current_num_threads(),
            "Computing per-cell trends"
        );

        let mut monthly_fits = Vec::with_capacity(window.num_months * nx * ny);
        for month in window.months() {
            debug!(month, "Monthly regression");
            let series = field.slice(s![window.years(), month, .., ..]);
            monthly_fits.extend(fit_cells(series, &axis));
        }
        let monthly = TrendSet::from_fits(Ix3(window.num_months, nx, ny), &monthly_fits)?;

        // Annual means use every month of the year, not only the monthly window
        let annual_series = field
            .slice(s![window.years(), .., .., ..])
            .mean_axis(Axis(1))
            .ok_or_else(|| TrendError::shape("field has no months"))?;
        debug!("Annual regression");
        let annual_fits = fit_cells(annual_series.view(), &axis);
        let annual = TrendSet::from_fits(Ix2(nx, ny), &annual_fits)?;

        Ok(TrendMaps {
            annual,
            monthly,
            window,
        })
    }
}

/// Fit every (x, y) column of a (time, x, y) array, in row-major cell order.
fn fit_cells(series: ArrayView3<'_, f64>, axis: &TimeAxis) -> Vec<LinearFit> {
    let (_, nx, ny) = series.dim();
    (0..nx * ny)
        .into_par_iter()
        .map(|cell| {
            let (i, j) = (cell / ny, cell % ny);
            axis.fit(series.slice(s![.., i, j]))
        })
        .collect()
}

/// Compute trends for `field` over `window`.
///
/// # Errors
///
/// See [`TrendEngine::compute`].
pub fn compute_trends(field: &TemperatureField, window: TrendWindow) -> Result<TrendMaps> {
    TrendEngine::new(window).compute(field)
}
