//! Time aggregations of a temperature field
//!
//! Annual means, seasonal means, anomalies from the monthly climatology, and
//! time-mean/standard-deviation maps. These are the views of the data a user
//! compares against the trend maps.

use super::operations::{StatOperation, StatisticalReduction};
use crate::errors::{Result, TrendError};
use crate::field::{TemperatureField, MONTHS_PER_YEAR};
use ndarray::{s, Array2, Array3, Array4, ArrayView3, Axis, Ix2, Ix3};
use std::fmt;
use std::str::FromStr;

/// Three-month meteorological seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// December, January, February
    Djf,
    /// March, April, May
    Mam,
    /// June, July, August
    Jja,
    /// September, October, November
    Son,
}

impl Season {
    /// Zero-based calendar months of the season
    #[must_use]
    pub const fn months(self) -> [usize; 3] {
        match self {
            Self::Djf => [11, 0, 1],
            Self::Mam => [2, 3, 4],
            Self::Jja => [5, 6, 7],
            Self::Son => [8, 9, 10],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Djf => "DJF",
            Self::Mam => "MAM",
            Self::Jja => "JJA",
            Self::Son => "SON",
        }
    }

    /// Whether a 1-based calendar month falls in the season
    #[must_use]
    pub fn contains_month(self, month: u32) -> bool {
        self.months().iter().any(|&m| m + 1 == month as usize)
    }
}

impl FromStr for Season {
    type Err = TrendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DJF" => Ok(Self::Djf),
            "MAM" => Ok(Self::Mam),
            "JJA" => Ok(Self::Jja),
            "SON" => Ok(Self::Son),
            other => Err(TrendError::Statistics(format!(
                "unknown season '{other}', expected DJF, MAM, JJA or SON"
            ))),
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean of each year, shape (year, lat, lon).
///
/// A year with any missing month is NaN, matching the annual series the
/// trend engine regresses.
///
/// # Errors
///
/// Returns [`TrendError::InvalidShape`] if the field has no months.
pub fn annual_means(field: &TemperatureField) -> Result<Array3<f64>> {
    field
        .view()
        .mean_axis(Axis(1))
        .ok_or_else(|| TrendError::shape("field has no months"))
}

/// Per-year mean over the months of `season`, shape (year, lat, lon).
///
/// Months are grouped by calendar year, so DJF of year `y` uses January and
/// February of `y` and December of `y`. Missing months are skipped.
///
/// # Errors
///
/// Returns [`TrendError::InvalidShape`] unless the field has 12 months per year.
pub fn seasonal_means(field: &TemperatureField, season: Season) -> Result<Array3<f64>> {
    if field.months() != MONTHS_PER_YEAR {
        return Err(TrendError::shape(format!(
            "seasons need {MONTHS_PER_YEAR} months per year, field has {}",
            field.months()
        )));
    }

    let selected = field.view().select(Axis(1), &season.months());
    Ok(selected
        .into_dyn()
        .reduce_along_axis(1, StatOperation::Mean)?
        .into_dimensionality::<Ix3>()?)
}

/// Long-term mean of each calendar month, shape (month, lat, lon)
///
/// # Errors
///
/// Propagates reduction errors.
pub fn monthly_climatology(field: &TemperatureField) -> Result<Array3<f64>> {
    Ok(field
        .view()
        .to_owned()
        .into_dyn()
        .reduce_along_axis(0, StatOperation::Mean)?
        .into_dimensionality::<Ix3>()?)
}

/// Field minus its monthly climatology, shape (year, month, lat, lon)
///
/// # Errors
///
/// Propagates reduction errors.
pub fn monthly_anomaly(field: &TemperatureField) -> Result<Array4<f64>> {
    let climatology = monthly_climatology(field)?.insert_axis(Axis(0));
    Ok(&field.view() - &climatology)
}

/// Mean and standard deviation over time of a (time, lat, lon) series
///
/// # Errors
///
/// Propagates reduction errors.
pub fn time_mean_and_std(series: ArrayView3<'_, f64>) -> Result<(Array2<f64>, Array2<f64>)> {
    let series = series.into_dyn();
    let mean = super::parallel::parallel_mean_axis(series.view(), 0)?.into_dimensionality::<Ix2>()?;
    let std = super::parallel::parallel_std_axis(series, 0)?.into_dimensionality::<Ix2>()?;
    Ok((mean, std))
}

/// `series[to] - series[from]` for a (time, lat, lon) series
///
/// # Errors
///
/// Returns [`TrendError::InvalidWindow`] if either index is out of range.
pub fn difference(series: ArrayView3<'_, f64>, from: usize, to: usize) -> Result<Array2<f64>> {
    let steps = series.len_of(Axis(0));
    if from >= steps || to >= steps {
        return Err(TrendError::window(format!(
            "time steps {from} and {to} must both be below {steps}"
        )));
    }
    Ok(&series.slice(s![to, .., ..]) - &series.slice(s![from, .., ..]))
}
