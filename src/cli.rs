//! Defines command-line interface options using `clap` for the sstrend application.

use clap::Parser;
use sstrend::dataset::RegionBounds;
use std::path::PathBuf;

/// Per-cell temperature trends for gridded climate model output
#[derive(Parser, Debug)]
#[command(
    version,
    name = "sstrend",
    about = "Compute per-cell temperature trends from NetCDF climate model output"
)]
pub struct Args {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Temperature variable to analyse
    #[arg(long = "var", default_value = "ts")]
    pub variable: String,

    /// List all variables and dimensions in the NetCDF file
    #[arg(long)]
    pub list_vars: bool,

    /// Describe a specific variable (data type, shape, and attributes)
    #[arg(long)]
    pub describe: Option<String>,

    /// Compute annual and monthly trends, significance, correlation and intercept
    #[arg(long)]
    pub trend: bool,

    /// Compute the linear warming rate of the full monthly series in K/decade
    #[arg(long)]
    pub rate: bool,

    /// Compute the time mean and standard deviation of every grid cell
    #[arg(long)]
    pub climatology: bool,

    /// Extract the series of the grid cell nearest to a point, formatted as <lat>:<lon>
    #[arg(long, value_parser = parse_point_arg, allow_hyphen_values = true)]
    pub point: Option<(f64, f64)>,

    /// Second scenario file; reports the difference of annual trends against it
    #[arg(long)]
    pub compare: Option<PathBuf>,

    /// Restrict to a region, formatted as <lat0>:<lat1>,<lon0>:<lon1>
    #[arg(long, value_parser = parse_region_arg, allow_hyphen_values = true)]
    pub region: Option<RegionBounds>,

    /// Restrict to calendar years, formatted as <first>:<last>
    #[arg(long, value_parser = parse_years_arg)]
    pub years: Option<(i32, i32)>,

    /// Offset of the first regressed year into the series
    #[arg(long, default_value_t = 0)]
    pub start_year: usize,

    /// Number of regressed years. Defaults to every year after --start-year
    #[arg(long)]
    pub num_years: Option<usize>,

    /// First calendar month (0-based) with a monthly regression
    #[arg(long, default_value_t = 0)]
    pub start_month: usize,

    /// Number of calendar months with a monthly regression. Defaults to the rest of the year
    #[arg(long)]
    pub num_months: Option<usize>,

    /// Time steps per model year
    #[arg(long, default_value_t = sstrend::field::MONTHS_PER_YEAR)]
    pub months_per_year: usize,

    /// Path to save results as NetCDF. If not set, prints a summary to the terminal.
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// Path to save a point series or trend summary as JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, env = "SSTREND_THREADS")]
    pub threads: Option<usize>,
}

fn parse_pair<T: std::str::FromStr>(s: &str, expected: &str) -> Result<(T, T), String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [a, b] => {
            let a = a.trim().parse::<T>();
            let b = b.trim().parse::<T>();
            match (a, b) {
                (Ok(a), Ok(b)) => Ok((a, b)),
                _ => Err(format!("Invalid number in '{s}': Expected '{expected}'.")),
            }
        }
        _ => Err(format!("Invalid format: Expected '{expected}'.")),
    }
}

fn parse_point_arg(s: &str) -> Result<(f64, f64), String> {
    parse_pair(s, "<lat>:<lon>")
}

fn parse_years_arg(s: &str) -> Result<(i32, i32), String> {
    let (first, last) = parse_pair(s, "<first>:<last>")?;
    if first > last {
        return Err(format!("First year {first} is after last year {last}"));
    }
    Ok((first, last))
}

fn parse_region_arg(s: &str) -> Result<RegionBounds, String> {
    let expected = "<lat0>:<lat1>,<lon0>:<lon1>";
    let Some((lat, lon)) = s.split_once(',') else {
        return Err(format!("Invalid format: Expected '{expected}'."));
    };
    let (lat_min, lat_max) = parse_pair(lat, expected)?;
    let (lon_min, lon_max) = parse_pair(lon, expected)?;
    RegionBounds::new(lat_min, lat_max, lon_min, lon_max).map_err(|e| e.to_string())
}
