//! Temperature time series at a single location
//!
//! Used to follow one city through a scenario: the series of the grid cell
//! nearest to the requested coordinates, with annual, monthly and seasonal
//! views and a JSON export.

use crate::calendar::CalendarDate;
use crate::dataset::ClimateDataset;
use crate::errors::Result;
use crate::statistics::{Season, StatOperation};
use ndarray::s;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Offset between Kelvin and degrees Celsius
pub const KELVIN_OFFSET: f64 = 273.15;

/// Monthly series of the grid cell nearest to a point
#[derive(Debug, Clone, Serialize)]
pub struct PointSeries {
    pub variable: String,
    /// Latitude of the selected grid cell
    pub lat: f64,
    /// Longitude of the selected grid cell
    pub lon: f64,
    pub lat_index: usize,
    pub lon_index: usize,
    pub dates: Vec<CalendarDate>,
    /// Values in the dataset's units, NaN where masked
    pub values: Vec<f64>,
}

impl PointSeries {
    /// Extract the series nearest to (`lat`, `lon`).
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite coordinates.
    pub fn extract(dataset: &ClimateDataset, lat: f64, lon: f64) -> Result<Self> {
        let (lat_index, lon_index) = dataset.nearest_cell(lat, lon)?;
        let cell_lat = dataset.lat()[lat_index];
        let cell_lon = dataset.lon()[lon_index];
        info!(lat, lon, cell_lat, cell_lon, "Selected nearest grid cell");

        Ok(Self {
            variable: dataset.variable().to_string(),
            lat: cell_lat,
            lon: cell_lon,
            lat_index,
            lon_index,
            dates: dataset.dates().to_vec(),
            values: dataset.data().slice(s![.., lat_index, lon_index]).to_vec(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values converted from Kelvin to degrees Celsius
    #[must_use]
    pub fn to_celsius(&self) -> Vec<f64> {
        self.values.iter().map(|v| v - KELVIN_OFFSET).collect()
    }

    /// Mean of each calendar year, skipping masked months
    #[must_use]
    pub fn annual_means(&self) -> Vec<(i32, f64)> {
        self.grouped_by_year(|_| true)
    }

    /// Mean over the months of `season` in each calendar year
    #[must_use]
    pub fn seasonal_means(&self, season: Season) -> Vec<(i32, f64)> {
        self.grouped_by_year(|date| season.contains_month(date.month))
    }

    /// Values of one calendar month (1-based) across years
    #[must_use]
    pub fn month(&self, month: u32) -> Vec<(CalendarDate, f64)> {
        self.dates
            .iter()
            .zip(&self.values)
            .filter(|(date, _)| date.month == month)
            .map(|(&date, &value)| (date, value))
            .collect()
    }

    /// Each value minus the long-term mean of its calendar month
    #[must_use]
    pub fn anomalies(&self) -> Vec<f64> {
        let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
        for (date, &value) in self.dates.iter().zip(&self.values) {
            by_month.entry(date.month).or_default().push(value);
        }
        let climatology: BTreeMap<u32, f64> = by_month
            .into_iter()
            .map(|(month, values)| (month, StatOperation::Mean.reduce(values.iter())))
            .collect();

        self.dates
            .iter()
            .zip(&self.values)
            .map(|(date, value)| value - climatology.get(&date.month).copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Write the series as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn grouped_by_year(&self, keep: impl Fn(&CalendarDate) -> bool) -> Vec<(i32, f64)> {
        let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for (date, &value) in self.dates.iter().zip(&self.values) {
            if keep(date) {
                by_year.entry(date.year).or_default().push(value);
            }
        }
        by_year
            .into_iter()
            .map(|(year, values)| (year, StatOperation::Mean.reduce(values.iter())))
            .collect()
    }
}
