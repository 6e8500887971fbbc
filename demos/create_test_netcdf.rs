//! Creates a sample scenario file for trying out sstrend.
//!
//! The file mimics monthly model output: `ts(time, lat, lon)` in Kelvin on a
//! 360-day calendar, warming faster towards the poles, with a seasonal cycle
//! and a few filled ocean-mask values.

use ndarray::{Array1, Array3};
use netcdf::create;
use std::f64::consts::PI;
use std::path::Path;

const YEARS: usize = 30;
const NLAT: usize = 18;
const NLON: usize = 36;
const FILL: f32 = 1.0e20;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = Path::new("ts_ssp585_demo.nc");
    println!("Creating demo scenario file: {}", output_path.display());

    if output_path.exists() {
        std::fs::remove_file(output_path)?;
    }

    let nt = YEARS * 12;
    let mut file = create(output_path)?;

    file.add_attribute("title", "Synthetic SSP5-8.5 surface temperature")?;
    file.add_attribute("experiment_id", "ssp585")?;
    file.add_attribute("frequency", "mon")?;

    file.add_dimension("time", nt)?;
    file.add_dimension("lat", NLAT)?;
    file.add_dimension("lon", NLON)?;

    let lat: Array1<f64> = (0..NLAT).map(|i| -85.0 + i as f64 * 10.0).collect();
    let lon: Array1<f64> = (0..NLON).map(|j| j as f64 * 10.0).collect();

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "days since 2015-01-01 00:00:00")?;
        time_var.put_attribute("calendar", "360_day")?;
        time_var.put_attribute("standard_name", "time")?;
        let time: Array1<f64> = (0..nt).map(|t| 15.0 + t as f64 * 30.0).collect();
        time_var.put(time.view(), ..)?;
    }
    {
        let mut lat_var = file.add_variable::<f64>("lat", &["lat"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put(lat.view(), ..)?;
    }
    {
        let mut lon_var = file.add_variable::<f64>("lon", &["lon"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put(lon.view(), ..)?;
    }

    let data = Array3::from_shape_fn((nt, NLAT, NLON), |(t, i, j)| {
        let year = (t / 12) as f64;
        let month = (t % 12) as f64;
        let latitude = lat[i];
        let warming = 0.03 + 0.04 * (latitude.abs() / 90.0);
        let season = 8.0 * (latitude / 90.0) * (2.0 * PI * (month - 0.5) / 12.0).cos();
        let weather = ((t * 31 + i * 17 + j * 7) % 19) as f64 * 0.05;
        // A small masked patch in the Southern Ocean
        if i == 1 && (10..14).contains(&j) {
            return FILL;
        }
        (300.0 - 40.0 * (latitude / 90.0).powi(2) + warming * year + season + weather) as f32
    });

    let mut ts = file.add_variable::<f32>("ts", &["time", "lat", "lon"])?;
    ts.put_attribute("_FillValue", FILL)?;
    ts.put_attribute("units", "K")?;
    ts.put_attribute("long_name", "Surface Temperature")?;
    ts.put(data.view(), ..)?;

    println!("Wrote {nt} months on a {NLAT}x{NLON} grid");
    println!("Try: sstrend -f {} --trend", output_path.display());
    Ok(())
}
