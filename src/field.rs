//! Temperature field arranged by year and calendar month
//!
//! Model output stores time as one flat axis of monthly steps. The trend
//! engine needs years and months as separate axes, so [`TemperatureField`]
//! reshapes a (time, lat, lon) series into (year, month, lat, lon) with
//! `time = year * months_per_year + month`.

use crate::errors::{Result, TrendError};
use ndarray::{s, Array3, Array4, ArrayView3, ArrayView4};

/// Calendar months in a model year
pub const MONTHS_PER_YEAR: usize = 12;

/// A (year, month, lat, lon) temperature array in Kelvin
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureField {
    data: Array4<f64>,
}

impl TemperatureField {
    /// Wrap an existing (year, month, lat, lon) array.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidShape`] if any extent is zero.
    pub fn new(data: Array4<f64>) -> Result<Self> {
        if data.shape().contains(&0) {
            return Err(TrendError::shape(format!(
                "field extents must be positive, got {:?}",
                data.shape()
            )));
        }
        Ok(Self { data })
    }

    /// Reshape a flat (time, lat, lon) series.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidShape`] if `months_per_year` is zero or
    /// does not divide the number of time steps.
    pub fn from_series(series: Array3<f64>, months_per_year: usize) -> Result<Self> {
        let (nt, nlat, nlon) = series.dim();
        if months_per_year == 0 {
            return Err(TrendError::shape("months_per_year must be positive"));
        }
        if nt % months_per_year != 0 {
            return Err(TrendError::shape(format!(
                "{nt} time steps do not split into whole years of {months_per_year} months"
            )));
        }

        let series = if series.is_standard_layout() {
            series
        } else {
            series.as_standard_layout().into_owned()
        };
        let data = series.into_shape((nt / months_per_year, months_per_year, nlat, nlon))?;
        Self::new(data)
    }

    #[must_use]
    pub fn view(&self) -> ArrayView4<'_, f64> {
        self.data.view()
    }

    #[must_use]
    pub fn years(&self) -> usize {
        self.data.shape()[0]
    }

    #[must_use]
    pub fn months(&self) -> usize {
        self.data.shape()[1]
    }

    /// Spatial extents (lat, lon)
    #[must_use]
    pub fn grid(&self) -> (usize, usize) {
        (self.data.shape()[2], self.data.shape()[3])
    }

    /// One calendar month across all years, shape (year, lat, lon).
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidWindow`] if `month` is out of range.
    pub fn month_series(&self, month: usize) -> Result<ArrayView3<'_, f64>> {
        if month >= self.months() {
            return Err(TrendError::window(format!(
                "month {month} is out of range for {} months per year",
                self.months()
            )));
        }
        Ok(self.data.slice(s![.., month, .., ..]))
    }
}
