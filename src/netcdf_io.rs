//! NetCDF output of trend rasters and derived maps
//!
//! Results are written to a fresh file on a (lat, lon) grid with coordinate
//! variables, so they can be plotted by any CF-aware tool. Missing cells keep
//! the NaN sentinel and are flagged through `_FillValue`.

use crate::errors::{Result, TrendError};
use crate::trend::{TrendMaps, TrendSet};
use chrono::Utc;
use ndarray::{Array1, ArrayView2, Dimension};
use netcdf::{create, FileMut};
use std::{fs, path::Path};
use tracing::{debug, info};

/// Description of one output variable
#[derive(Debug, Clone, Copy)]
pub struct MapAttributes<'a> {
    pub name: &'a str,
    pub units: &'a str,
    pub long_name: &'a str,
}

/// Writer for trend rasters on a lat/lon grid
pub struct TrendWriter<'a> {
    output_path: &'a Path,
    source_variable: &'a str,
    lat: &'a Array1<f64>,
    lon: &'a Array1<f64>,
}

impl<'a> TrendWriter<'a> {
    /// Create a new writer for maps of `source_variable` on the given grid
    pub fn new(
        output_path: &'a Path,
        source_variable: &'a str,
        lat: &'a Array1<f64>,
        lon: &'a Array1<f64>,
    ) -> Self {
        Self {
            output_path,
            source_variable,
            lat,
            lon,
        }
    }

    /// Write the annual and monthly trend sets.
    ///
    /// Annual rasters are named `trend`, `significance`, `correlation` and
    /// `intercept`; the monthly ones carry a `_monthly` suffix and a leading
    /// `month` dimension.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidShape`] if the rasters do not match the
    /// grid, or any NetCDF/I/O error.
    pub fn write_trends(&self, maps: &TrendMaps) -> Result<()> {
        self.check_grid(maps.annual.shape())?;

        let mut file = self.create_file()?;
        file.add_dimension("month", maps.window.num_months)?;
        {
            let months: Array1<i32> = (maps.window.start_month..)
                .take(maps.window.num_months)
                .map(|m| m as i32 + 1)
                .collect();
            let mut month_var = file.add_variable::<i32>("month", &["month"])?;
            month_var.put_attribute("long_name", "calendar month")?;
            month_var.put(months.view(), ..)?;
        }

        write_set(&mut file, &maps.annual, &["lat", "lon"], "")?;
        write_set(&mut file, &maps.monthly, &["month", "lat", "lon"], "_monthly")?;

        file.add_attribute("start_year_offset", maps.window.start_year as i32)?;
        file.add_attribute("num_years", maps.window.num_years as i32)?;

        info!(path = %self.output_path.display(), "Wrote trend rasters");
        Ok(())
    }

    /// Write a single 2-D map such as a linear rate or a scenario difference.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidShape`] if the map does not match the
    /// grid, or any NetCDF/I/O error.
    pub fn write_map(&self, map: ArrayView2<'_, f64>, attributes: MapAttributes<'_>) -> Result<()> {
        self.write_maps(&[(map, attributes)])
    }

    /// Write several 2-D maps on the same grid into one file.
    ///
    /// # Errors
    ///
    /// See [`TrendWriter::write_map`].
    pub fn write_maps(&self, maps: &[(ArrayView2<'_, f64>, MapAttributes<'_>)]) -> Result<()> {
        for (map, _) in maps {
            self.check_grid(map.shape())?;
        }

        let mut file = self.create_file()?;
        for (map, attributes) in maps {
            let mut var = file.add_variable::<f64>(attributes.name, &["lat", "lon"])?;
            var.put_attribute("_FillValue", f64::NAN)?;
            var.put_attribute("units", attributes.units)?;
            var.put_attribute("long_name", attributes.long_name)?;
            var.put(map.view(), ..)?;
            debug!(name = attributes.name, "Wrote map");
        }

        info!(path = %self.output_path.display(), count = maps.len(), "Wrote maps");
        Ok(())
    }

    fn check_grid(&self, shape: &[usize]) -> Result<()> {
        let expected = [self.lat.len(), self.lon.len()];
        if shape.len() < 2 || shape[shape.len() - 2..] != expected {
            return Err(TrendError::shape(format!(
                "raster shape {shape:?} does not match grid {expected:?}"
            )));
        }
        Ok(())
    }

    /// Replace any existing output and lay down the lat/lon coordinates.
    fn create_file(&self) -> Result<FileMut> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let mut file = create(self.output_path)?;
        file.add_dimension("lat", self.lat.len())?;
        file.add_dimension("lon", self.lon.len())?;

        {
            let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
            lat_var.put_attribute("units", "degrees_north")?;
            lat_var.put_attribute("standard_name", "latitude")?;
            lat_var.put(self.lat.view(), ..)?;
        }
        {
            let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
            lon_var.put_attribute("units", "degrees_east")?;
            lon_var.put_attribute("standard_name", "longitude")?;
            lon_var.put(self.lon.view(), ..)?;
        }

        file.add_attribute("source_variable", self.source_variable)?;
        file.add_attribute(
            "history",
            format!("Created by sstrend on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(file)
    }
}

fn write_set<D: Dimension>(
    file: &mut FileMut,
    set: &TrendSet<D>,
    dims: &[&str],
    suffix: &str,
) -> Result<()> {
    let rasters = [
        (&set.trend, "trend", "K year-1", "least-squares trend"),
        (&set.significance, "significance", "percent", "100 * (1 - p-value) of the trend"),
        (&set.correlation, "correlation", "1", "Pearson correlation with year"),
        (&set.intercept, "intercept", "K", "fitted value in the first year"),
    ];

    for (data, name, units, long_name) in rasters {
        let mut var = file.add_variable::<f64>(&format!("{name}{suffix}"), dims)?;
        var.put_attribute("_FillValue", f64::NAN)?;
        var.put_attribute("units", units)?;
        var.put_attribute("long_name", long_name)?;
        var.put(data.view(), ..)?;
    }
    Ok(())
}
