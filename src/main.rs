//! Entry point for the sstrend application.
//! Handles CLI parsing, dataset loading, and dispatches operations like trend
//! maps, warming rates and point series, or prints metadata.

use clap::Parser;
use netcdf::open;
use sstrend::prelude::*;
use sstrend::series::PointSeries;
use sstrend::statistics::time_mean_and_std;
use sstrend::{metadata, netcdf_io::MapAttributes, trend::MONTHS_PER_DECADE};
use std::fs;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Args;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    ParallelConfig::new(args.threads).setup_global_pool()?;

    println!("------------------------------------------------------------------");
    println!("          sstrend: gridded temperature trend toolkit");
    println!("------------------------------------------------------------------");

    let file = open(&args.file)?;
    println!("Successfully opened NetCDF file: {}", args.file.display());

    if args.list_vars {
        metadata::list_variables_and_dimensions(&file)?;
    } else if let Some(var) = &args.describe {
        metadata::describe_variable(&file, var)?;
    } else if let Some((lat, lon)) = args.point {
        let dataset = load(&file, &args)?;
        run_point(&dataset, lat, lon, &args)?;
    } else if let Some(other) = &args.compare {
        let dataset = load(&file, &args)?;
        let other_file = open(other)?;
        let other_dataset = load(&other_file, &args)?;
        run_compare(&dataset, &other_dataset, &args)?;
    } else if args.trend {
        let dataset = load(&file, &args)?;
        run_trend(&dataset, &args)?;
    } else if args.rate {
        let dataset = load(&file, &args)?;
        run_rate(&dataset, &args)?;
    } else if args.climatology {
        let dataset = load(&file, &args)?;
        run_climatology(&dataset, &args)?;
    } else {
        metadata::print_metadata(&file)?;
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load the variable and apply the region and year selections.
fn load(file: &netcdf::File, args: &Args) -> Result<ClimateDataset> {
    let mut dataset = ClimateDataset::from_file(file, &args.variable)?;
    if let Some(bounds) = &args.region {
        dataset = dataset.subset(bounds)?;
    }
    if let Some((first, last)) = args.years {
        dataset = dataset.select_years(first, last)?;
    }
    let (nt, nlat, nlon) = dataset.dim();
    debug!(nt, nlat, nlon, calendar = %dataset.calendar(), "Dataset ready");
    Ok(dataset)
}

fn window_for(field: &TemperatureField, args: &Args) -> TrendWindow {
    let num_years = args
        .num_years
        .unwrap_or_else(|| field.years().saturating_sub(args.start_year));
    let num_months = args
        .num_months
        .unwrap_or_else(|| field.months().saturating_sub(args.start_month));
    TrendWindow::new(args.start_year, num_years, args.start_month, num_months)
}

fn compute(dataset: &ClimateDataset, args: &Args) -> Result<TrendMaps> {
    let field = dataset.to_field(args.months_per_year)?;
    let window = window_for(&field, args);
    TrendEngine::new(window).compute(&field)
}

fn run_trend(dataset: &ClimateDataset, args: &Args) -> Result<()> {
    let maps = compute(dataset, args)?;
    let summary = maps.summary();
    let first_year = dataset.years().get(summary.start_year).copied();

    println!("\n===== Trend of '{}' =====", dataset.variable());
    if let Some(year) = first_year {
        println!(
            "Years: {}..={} ({} years)",
            year,
            year + summary.num_years as i32 - 1,
            summary.num_years
        );
    }
    println!(
        "Mean annual trend: {:.4} K/decade",
        summary.mean_trend_per_decade
    );
    println!(
        "Cells significant at {SIGNIFICANCE_LEVEL}%: {:.1}%",
        summary.significant_fraction * 100.0
    );
    println!("Cells with missing data: {}", summary.missing_cells);
    for (month, trend) in &summary.monthly_trend_per_decade {
        println!("  month {:>2}: {trend:.4} K/decade", month + 1);
    }

    if let Some(path) = &args.output_netcdf {
        TrendWriter::new(path, dataset.variable(), dataset.lat(), dataset.lon()).write_trends(&maps)?;
        println!("Saved trend rasters to {}", path.display());
    }
    if let Some(path) = &args.output_json {
        fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        println!("Saved trend summary to {}", path.display());
    }
    Ok(())
}

fn run_compare(dataset: &ClimateDataset, other: &ClimateDataset, args: &Args) -> Result<()> {
    let maps = compute(dataset, args)?;
    let other_maps = compute(other, args)?;
    let difference = maps.decadal_difference(&other_maps)?;

    let valid: Vec<f64> = difference.iter().copied().filter(|v| v.is_finite()).collect();
    println!("\n===== Trend difference of '{}' =====", dataset.variable());
    println!(
        "{}: {:.4} K/decade",
        args.file.display(),
        maps.summary().mean_trend_per_decade
    );
    if let Some(path) = &args.compare {
        println!(
            "{}: {:.4} K/decade",
            path.display(),
            other_maps.summary().mean_trend_per_decade
        );
    }
    if valid.is_empty() {
        println!("No grid cell has a trend in both scenarios");
    } else {
        let mean = valid.iter().sum::<f64>() / valid.len() as f64;
        println!("Mean difference: {mean:.4} K/decade over {} cells", valid.len());
    }

    if let Some(path) = &args.output_netcdf {
        TrendWriter::new(path, dataset.variable(), dataset.lat(), dataset.lon()).write_map(
            difference.view(),
            MapAttributes {
                name: "trend_difference",
                units: "K decade-1",
                long_name: "difference of annual trends between scenarios",
            },
        )?;
        println!("Saved trend difference to {}", path.display());
    }
    Ok(())
}

fn run_rate(dataset: &ClimateDataset, args: &Args) -> Result<()> {
    let rate = linear_rate(dataset.data().view(), MONTHS_PER_DECADE)?;
    let valid: Vec<f64> = rate.iter().copied().filter(|v| v.is_finite()).collect();
    info!(cells = valid.len(), "Computed linear rate");

    println!("\n===== Linear rate of '{}' =====", dataset.variable());
    if valid.is_empty() {
        println!("No grid cell has a complete series");
    } else {
        let mean = valid.iter().sum::<f64>() / valid.len() as f64;
        let (min, max) = valid
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        println!("Mean: {mean:.4} K/decade (min {min:.4}, max {max:.4})");
    }

    if let Some(path) = &args.output_netcdf {
        TrendWriter::new(path, dataset.variable(), dataset.lat(), dataset.lon()).write_map(
            rate.view(),
            MapAttributes {
                name: "rate",
                units: "K decade-1",
                long_name: "least-squares rate of the monthly series",
            },
        )?;
        println!("Saved rate map to {}", path.display());
    }
    Ok(())
}

fn run_climatology(dataset: &ClimateDataset, args: &Args) -> Result<()> {
    let (mean, std) = time_mean_and_std(dataset.data().view())?;

    println!("\n===== Climatology of '{}' =====", dataset.variable());
    let finite_mean = |values: &ndarray::Array2<f64>| {
        let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        valid.iter().sum::<f64>() / valid.len() as f64
    };
    println!("Domain mean: {:.3}", finite_mean(&mean));
    println!("Mean temporal std: {:.3}", finite_mean(&std));

    if let Some(path) = &args.output_netcdf {
        TrendWriter::new(path, dataset.variable(), dataset.lat(), dataset.lon()).write_maps(&[
            (
                mean.view(),
                MapAttributes {
                    name: "mean",
                    units: "K",
                    long_name: "time mean",
                },
            ),
            (
                std.view(),
                MapAttributes {
                    name: "std",
                    units: "K",
                    long_name: "temporal standard deviation",
                },
            ),
        ])?;
        println!("Saved climatology to {}", path.display());
    }
    Ok(())
}

fn run_point(dataset: &ClimateDataset, lat: f64, lon: f64, args: &Args) -> Result<()> {
    let series = PointSeries::extract(dataset, lat, lon)?;

    println!(
        "\n===== '{}' at ({:.2}, {:.2}) =====",
        series.variable, series.lat, series.lon
    );
    for (year, mean) in series.annual_means() {
        println!("  {year}: {:.2} °C", mean - sstrend::series::KELVIN_OFFSET);
    }

    if let Some(path) = &args.output_json {
        series.write_json(path)?;
        println!("Saved point series to {}", path.display());
    }
    Ok(())
}
