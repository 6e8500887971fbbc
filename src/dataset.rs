//! Gridded climate dataset loaded from NetCDF
//!
//! [`ClimateDataset`] holds one temperature variable on a (time, lat, lon)
//! grid together with its coordinates and decoded dates. Fill values are
//! replaced with NaN on load, so every downstream computation sees a single
//! missing-value sentinel. Packed variables are unpacked with their
//! `scale_factor` and `add_offset`.

use crate::calendar::{num2date, Calendar, CalendarDate, DEFAULT_CALENDAR};
use crate::errors::{Result, TrendError};
use crate::field::TemperatureField;
use ndarray::{Array1, Array3, Axis};
use netcdf::{AttributeValue, File, Variable};
use std::path::Path;
use tracing::{debug, info, warn};

const LAT_NAMES: [&str; 2] = ["lat", "latitude"];
const LON_NAMES: [&str; 2] = ["lon", "longitude"];

/// Latitude/longitude box, bounds inclusive, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl RegionBounds {
    /// Create a region. Longitudes may use either the -180..180 or the
    /// 0..360 convention; `lon_min > lon_max` wraps across the antimeridian.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidRegion`] for reversed or out-of-range
    /// latitudes and non-finite bounds.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Result<Self> {
        if ![lat_min, lat_max, lon_min, lon_max].iter().all(|v| v.is_finite()) {
            return Err(TrendError::InvalidRegion {
                message: "bounds must be finite".to_string(),
            });
        }
        if lat_min > lat_max || lat_min < -90.0 || lat_max > 90.0 {
            return Err(TrendError::InvalidRegion {
                message: format!("latitude range {lat_min}..{lat_max} is not within -90..90"),
            });
        }
        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    #[must_use]
    pub fn contains_lat(&self, lat: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat)
    }

    #[must_use]
    pub fn contains_lon(&self, lon: f64) -> bool {
        if self.lon_max - self.lon_min >= 360.0 {
            return true;
        }
        let lo = self.lon_min.rem_euclid(360.0);
        let hi = self.lon_max.rem_euclid(360.0);
        let lon = lon.rem_euclid(360.0);
        if lo <= hi {
            (lo..=hi).contains(&lon)
        } else {
            lon >= lo || lon <= hi
        }
    }
}

/// One temperature variable on a (time, lat, lon) grid
#[derive(Debug, Clone)]
pub struct ClimateDataset {
    variable: String,
    data: Array3<f64>,
    lat: Array1<f64>,
    lon: Array1<f64>,
    dates: Vec<CalendarDate>,
    calendar: Calendar,
}

impl ClimateDataset {
    /// Build a dataset from in-memory arrays.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidShape`] if the coordinate lengths do not
    /// match the data extents or the grid is empty.
    pub fn new(
        variable: impl Into<String>,
        data: Array3<f64>,
        lat: Array1<f64>,
        lon: Array1<f64>,
        dates: Vec<CalendarDate>,
        calendar: Calendar,
    ) -> Result<Self> {
        let (nt, nlat, nlon) = data.dim();
        if nt == 0 || nlat == 0 || nlon == 0 {
            return Err(TrendError::shape(format!(
                "dataset extents must be positive, got ({nt}, {nlat}, {nlon})"
            )));
        }
        if lat.len() != nlat || lon.len() != nlon || dates.len() != nt {
            return Err(TrendError::shape(format!(
                "coordinates (time {}, lat {}, lon {}) do not match data ({nt}, {nlat}, {nlon})",
                dates.len(),
                lat.len(),
                lon.len()
            )));
        }

        Ok(Self {
            variable: variable.into(),
            data,
            lat,
            lon,
            dates,
            calendar,
        })
    }

    /// Open `path` and load `variable`.
    ///
    /// # Errors
    ///
    /// See [`ClimateDataset::from_file`].
    pub fn open(path: impl AsRef<Path>, variable: &str) -> Result<Self> {
        let file = netcdf::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), variable, "Opened NetCDF file");
        Self::from_file(&file, variable)
    }

    /// Load `variable` and its coordinates from an open file.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::VariableNotFound`] if the variable or one of its
    /// coordinates is missing, [`TrendError::DimensionNotFound`] if its time
    /// dimension has no coordinate variable, [`TrendError::InvalidShape`] if it is not
    /// three-dimensional, and [`TrendError::Calendar`] if its time units
    /// cannot be decoded.
    pub fn from_file(file: &File, variable: &str) -> Result<Self> {
        let var = file
            .variable(variable)
            .ok_or_else(|| TrendError::VariableNotFound {
                var: variable.to_string(),
            })?;

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
        let [nt, nlat, nlon] = shape[..] else {
            return Err(TrendError::shape(format!(
                "variable '{variable}' must be (time, lat, lon), has dimensions {dims:?}"
            )));
        };

        let time_var = file
            .variable(&dims[0])
            .ok_or_else(|| TrendError::DimensionNotFound {
                var: variable.to_string(),
                dim: dims[0].clone(),
            })?;
        let lat = read_coordinate(file, &dims[1], &LAT_NAMES)?;
        let lon = read_coordinate(file, &dims[2], &LON_NAMES)?;

        let units = string_attribute(&time_var, "units").ok_or_else(|| {
            TrendError::calendar(format!("time variable '{}' has no units", dims[0]))
        })?;
        let calendar = match string_attribute(&time_var, "calendar") {
            Some(name) => name.parse()?,
            None => {
                warn!("Time variable has no calendar attribute, assuming {DEFAULT_CALENDAR}");
                DEFAULT_CALENDAR
            }
        };
        let time: Vec<f64> = time_var.get_values::<f64, _>(..)?;
        let dates = num2date(&time, &units, calendar)?;

        let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
            .iter()
            .filter_map(|name| numeric_attribute(&var, name))
            .collect();
        let mut values: Vec<f64> = var.get_values::<f64, _>(..)?;
        let mut masked = 0_usize;
        for value in &mut values {
            if !value.is_finite() || fill_values.iter().any(|fill| *value == *fill) {
                *value = f64::NAN;
                masked += 1;
            }
        }

        // CF packing: unpacked = packed * scale_factor + add_offset
        let scale = numeric_attribute(&var, "scale_factor");
        let offset = numeric_attribute(&var, "add_offset");
        if scale.is_some() || offset.is_some() {
            let (scale, offset) = (scale.unwrap_or(1.0), offset.unwrap_or(0.0));
            debug!(scale, offset, "Unpacking variable");
            for value in values.iter_mut().filter(|v| !v.is_nan()) {
                *value = *value * scale + offset;
            }
        }

        debug!(nt, nlat, nlon, masked, %calendar, "Loaded variable");
        let data = Array3::from_shape_vec((nt, nlat, nlon), values)?;

        Self::new(variable, data, lat, lon, dates, calendar)
    }

    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The (time, lat, lon) values, NaN where masked
    #[must_use]
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    #[must_use]
    pub fn lat(&self) -> &Array1<f64> {
        &self.lat
    }

    #[must_use]
    pub fn lon(&self) -> &Array1<f64> {
        &self.lon
    }

    #[must_use]
    pub fn dates(&self) -> &[CalendarDate] {
        &self.dates
    }

    #[must_use]
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Number of time steps and grid extents
    #[must_use]
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Distinct calendar years, in file order
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = Vec::new();
        for date in &self.dates {
            if years.last() != Some(&date.year) {
                years.push(date.year);
            }
        }
        years
    }

    /// Reshape into a (year, month, lat, lon) field.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidShape`] if the time axis does not hold a
    /// whole number of years.
    pub fn to_field(&self, months_per_year: usize) -> Result<TemperatureField> {
        if let Some(first) = self.dates.first() {
            if first.month != 1 {
                warn!(first = %first, "Series does not start in January; months are relative to the first step");
            }
        }
        TemperatureField::from_series(self.data.clone(), months_per_year)
    }

    /// Index of the grid cell closest to a point. Longitudes compare modulo 360.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidRegion`] for non-finite coordinates.
    pub fn nearest_cell(&self, lat: f64, lon: f64) -> Result<(usize, usize)> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(TrendError::InvalidRegion {
                message: format!("point ({lat}, {lon}) is not finite"),
            });
        }

        let lat_index = argmin(self.lat.iter().map(|&v| (v - lat).abs()));
        let lon_index = argmin(self.lon.iter().map(|&v| {
            let d = (v - lon).rem_euclid(360.0);
            d.min(360.0 - d)
        }));

        match (lat_index, lon_index) {
            (Some(i), Some(j)) => Ok((i, j)),
            _ => Err(TrendError::NoData {
                message: "dataset has no grid cells".to_string(),
            }),
        }
    }

    /// Restrict the grid to `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::NoData`] if no grid cell lies inside the region.
    pub fn subset(&self, bounds: &RegionBounds) -> Result<Self> {
        let lat_idx: Vec<usize> = indices_where(&self.lat, |v| bounds.contains_lat(v));
        let lon_idx: Vec<usize> = indices_where(&self.lon, |v| bounds.contains_lon(v));
        if lat_idx.is_empty() || lon_idx.is_empty() {
            return Err(TrendError::NoData {
                message: format!("no grid cells inside {bounds:?}"),
            });
        }

        debug!(nlat = lat_idx.len(), nlon = lon_idx.len(), "Region subset");
        let data = self
            .data
            .select(Axis(1), &lat_idx)
            .select(Axis(2), &lon_idx);

        Self::new(
            self.variable.clone(),
            data,
            self.lat.select(Axis(0), &lat_idx),
            self.lon.select(Axis(0), &lon_idx),
            self.dates.clone(),
            self.calendar,
        )
    }

    /// Keep only time steps whose calendar year lies in `first..=last`.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::NoData`] if no time step matches.
    pub fn select_years(&self, first: i32, last: i32) -> Result<Self> {
        let time_idx: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, date)| (first..=last).contains(&date.year))
            .map(|(i, _)| i)
            .collect();
        if time_idx.is_empty() {
            return Err(TrendError::NoData {
                message: format!("no time steps between {first} and {last}"),
            });
        }

        Self::new(
            self.variable.clone(),
            self.data.select(Axis(0), &time_idx),
            self.lat.clone(),
            self.lon.clone(),
            time_idx.iter().map(|&i| self.dates[i]).collect(),
            self.calendar,
        )
    }
}

fn argmin(distances: impl Iterator<Item = f64>) -> Option<usize> {
    distances
        .enumerate()
        .filter(|(_, d)| d.is_finite())
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

fn indices_where(values: &Array1<f64>, keep: impl Fn(f64) -> bool) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| keep(v))
        .map(|(i, _)| i)
        .collect()
}

/// Read a 1-D coordinate, trying the dimension name first and then the
/// conventional aliases.
fn read_coordinate(file: &File, dim_name: &str, aliases: &[&str]) -> Result<Array1<f64>> {
    let var = std::iter::once(dim_name)
        .chain(aliases.iter().copied())
        .find_map(|name| file.variable(name))
        .ok_or_else(|| TrendError::VariableNotFound {
            var: dim_name.to_string(),
        })?;
    Ok(Array1::from(var.get_values::<f64, _>(..)?))
}

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

fn numeric_attribute(var: &Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Floats(v) => v.first().copied().map(f64::from),
        AttributeValue::Doubles(v) => v.first().copied(),
        _ => None,
    }
}
