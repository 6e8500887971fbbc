//! Unit tests for the sstrend modules
//!
//! These cover the building blocks around the trend engine: errors, thread
//! configuration, field reshaping, reductions, regions and point series.

use approx::assert_abs_diff_eq;
use ndarray::{arr1, Array1, Array3, Array4, ArrayD, IxDyn};
use sstrend::{
    calendar::{num2date, Calendar, CalendarDate, TimeUnits},
    dataset::{ClimateDataset, RegionBounds},
    errors::TrendError,
    field::TemperatureField,
    parallel::{get_parallel_info, ParallelConfig},
    series::{PointSeries, KELVIN_OFFSET},
    statistics::{
        annual_means, difference, monthly_anomaly, monthly_climatology, parallel_max_axis,
        parallel_mean_axis, parallel_min_axis, parallel_std_axis, seasonal_means,
        time_mean_and_std, Season, StatOperation, StatisticalReduction,
    },
};
use tempfile::tempdir;

/// Two years of 360-day monthly data on a 3x4 grid starting in January 2015
fn small_dataset() -> ClimateDataset {
    let data = Array3::from_shape_fn((24, 3, 4), |(t, i, j)| {
        280.0 + t as f64 * 0.1 + i as f64 * 10.0 + j as f64
    });
    let dates = (0..24)
        .map(|t| CalendarDate::new(2015 + t / 12, (t % 12) as u32 + 1, 16))
        .collect();
    ClimateDataset::new(
        "ts",
        data,
        arr1(&[-30.0, 0.0, 30.0]),
        arr1(&[0.0, 90.0, 180.0, 270.0]),
        dates,
        Calendar::Day360,
    )
    .unwrap()
}

#[test]
fn test_error_types() {
    let var_err = TrendError::VariableNotFound {
        var: "ts".to_string(),
    };
    assert_eq!(format!("{var_err}"), "Variable 'ts' not found in file");

    let dim_err = TrendError::DimensionNotFound {
        var: "ts".to_string(),
        dim: "time".to_string(),
    };
    assert!(format!("{dim_err}").contains("Dimension 'time' not found in variable 'ts'"));

    let window_err = TrendError::InvalidWindow {
        message: "years 0..11 exceed the 10 years available".to_string(),
    };
    assert!(format!("{window_err}").starts_with("Invalid trend window"));

    let io_err: TrendError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(format!("{io_err}").contains("I/O error"));
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores = ParallelConfig::all_cores();
    assert!(all_cores.num_threads.unwrap() > 0);

    assert!(default_config.current_threads() > 0);
    assert!(ParallelConfig::new(None).setup_global_pool().is_ok());

    let zero = ParallelConfig::with_threads(0).setup_global_pool();
    assert!(matches!(zero, Err(TrendError::ThreadPool(_))));

    let info = get_parallel_info();
    assert!(info.current_threads > 0);
    assert!(info.available_cores > 0);
}

#[test]
fn test_field_from_series() {
    let series = Array3::from_shape_fn((36, 2, 2), |(t, i, j)| (t * 100 + i * 10 + j) as f64);
    let field = TemperatureField::from_series(series, 12).unwrap();

    assert_eq!(field.years(), 3);
    assert_eq!(field.months(), 12);
    assert_eq!(field.grid(), (2, 2));
    // time = year * 12 + month
    assert_eq!(field.view()[[2, 5, 1, 0]], ((2 * 12 + 5) * 100 + 10) as f64);

    let march = field.month_series(2).unwrap();
    assert_eq!(march.shape(), &[3, 2, 2]);
    assert_eq!(march[[1, 0, 1]], ((12 + 2) * 100 + 1) as f64);
    assert!(matches!(
        field.month_series(12),
        Err(TrendError::InvalidWindow { .. })
    ));
}

#[test]
fn test_field_rejects_partial_years() {
    let series = Array3::<f64>::zeros((30, 2, 2));
    assert!(matches!(
        TemperatureField::from_series(series.clone(), 12),
        Err(TrendError::InvalidShape { .. })
    ));
    assert!(TemperatureField::from_series(series, 0).is_err());
    assert!(TemperatureField::new(Array4::zeros((0, 12, 2, 2))).is_err());
}

#[test]
fn test_field_from_non_standard_layout() {
    let series = Array3::from_shape_fn((2, 2, 24), |(i, j, t)| (t * 100 + i * 10 + j) as f64);
    let transposed = series.permuted_axes([2, 0, 1]);
    let field = TemperatureField::from_series(transposed, 12).unwrap();
    assert_eq!(field.view()[[1, 3, 1, 1]], ((12 + 3) * 100 + 11) as f64);
}

#[test]
fn test_parallel_reductions() {
    let data = ArrayD::from_shape_vec(
        IxDyn(&[2, 3]),
        vec![1.0, 2.0, 3.0, 5.0, f64::NAN, 9.0],
    )
    .unwrap();

    let mean = parallel_mean_axis(data.view(), 0).unwrap();
    assert_eq!(mean.shape(), &[3]);
    assert_abs_diff_eq!(mean[[0]], 3.0);
    // NaN is skipped rather than propagated
    assert_abs_diff_eq!(mean[[1]], 2.0);

    let min = parallel_min_axis(data.view(), 1).unwrap();
    assert_abs_diff_eq!(min[[0]], 1.0);
    assert_abs_diff_eq!(min[[1]], 5.0);

    let max = parallel_max_axis(data.view(), 1).unwrap();
    assert_abs_diff_eq!(max[[1]], 9.0);

    let std = parallel_std_axis(data.view(), 1).unwrap();
    assert_abs_diff_eq!(std[[0]], (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(std[[1]], 2.0, epsilon = 1e-12);

    let all_missing = ArrayD::from_elem(IxDyn(&[2, 2]), f64::NAN);
    assert!(parallel_mean_axis(all_missing.view(), 0).unwrap()[[0]].is_nan());

    assert!(matches!(
        data.reduce_along_axis(2, StatOperation::Mean),
        Err(TrendError::Statistics(_))
    ));
    assert_eq!(StatOperation::Std.as_str(), "std");
}

#[test]
fn test_annual_and_seasonal_means() {
    let field = TemperatureField::new(Array4::from_shape_fn((2, 12, 1, 1), |(y, m, _, _)| {
        (y * 100 + m) as f64
    }))
    .unwrap();

    let annual = annual_means(&field).unwrap();
    assert_eq!(annual.shape(), &[2, 1, 1]);
    assert_abs_diff_eq!(annual[[0, 0, 0]], 5.5);
    assert_abs_diff_eq!(annual[[1, 0, 0]], 105.5);

    // DJF uses December of the same calendar year
    let djf = seasonal_means(&field, Season::Djf).unwrap();
    assert_abs_diff_eq!(djf[[1, 0, 0]], 100.0 + 12.0 / 3.0, epsilon = 1e-12);
    let jja = seasonal_means(&field, Season::Jja).unwrap();
    assert_abs_diff_eq!(jja[[0, 0, 0]], 6.0, epsilon = 1e-12);

    let quarterly = TemperatureField::new(Array4::zeros((2, 4, 1, 1))).unwrap();
    assert!(seasonal_means(&quarterly, Season::Son).is_err());
}

#[test]
fn test_annual_mean_propagates_missing_month() {
    let mut data = Array4::from_elem((2, 12, 1, 2), 280.0);
    data[[0, 7, 0, 1]] = f64::NAN;
    let annual = annual_means(&TemperatureField::new(data).unwrap()).unwrap();
    assert!(annual[[0, 0, 1]].is_nan());
    assert_abs_diff_eq!(annual[[0, 0, 0]], 280.0);
    assert_abs_diff_eq!(annual[[1, 0, 1]], 280.0);
}

#[test]
fn test_monthly_climatology_and_anomaly() {
    let field = TemperatureField::new(Array4::from_shape_fn((3, 12, 2, 1), |(y, m, i, _)| {
        270.0 + m as f64 + y as f64 * 2.0 + i as f64
    }))
    .unwrap();

    let climatology = monthly_climatology(&field).unwrap();
    assert_eq!(climatology.shape(), &[12, 2, 1]);
    assert_abs_diff_eq!(climatology[[4, 1, 0]], 270.0 + 4.0 + 2.0 + 1.0, epsilon = 1e-12);

    let anomaly = monthly_anomaly(&field).unwrap();
    assert_eq!(anomaly.shape(), &[3, 12, 2, 1]);
    assert_abs_diff_eq!(anomaly[[0, 6, 0, 0]], -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(anomaly[[2, 6, 1, 0]], 2.0, epsilon = 1e-12);
}

#[test]
fn test_time_mean_std_and_difference() {
    let series = Array3::from_shape_fn((4, 2, 2), |(t, i, j)| (t + i + j) as f64);

    let (mean, std) = time_mean_and_std(series.view()).unwrap();
    assert_eq!(mean.shape(), &[2, 2]);
    assert_abs_diff_eq!(mean[[1, 1]], 3.5, epsilon = 1e-12);
    assert_abs_diff_eq!(std[[0, 0]], 1.25f64.sqrt(), epsilon = 1e-12);

    let change = difference(series.view(), 0, 3).unwrap();
    assert!(change.iter().all(|&v| v == 3.0));
    assert!(difference(series.view(), 0, 4).is_err());
}

#[test]
fn test_season_parsing() {
    assert_eq!("djf".parse::<Season>().unwrap(), Season::Djf);
    assert_eq!(Season::Son.to_string(), "SON");
    assert!(Season::Djf.contains_month(12));
    assert!(Season::Djf.contains_month(1));
    assert!(!Season::Djf.contains_month(3));
    assert!("winter".parse::<Season>().is_err());
}

#[test]
fn test_calendar_parsing() {
    assert_eq!("360_day".parse::<Calendar>().unwrap(), Calendar::Day360);
    assert_eq!("365_day".parse::<Calendar>().unwrap(), Calendar::NoLeap);
    assert_eq!("proleptic_gregorian".parse::<Calendar>().unwrap(), Calendar::Gregorian);
    assert!(matches!(
        "julian_ish".parse::<Calendar>(),
        Err(TrendError::Calendar { .. })
    ));

    let units: TimeUnits = "Days since 1850-1-1".parse().unwrap();
    assert_eq!(units.reference, CalendarDate::new(1850, 1, 1));
    assert!("fortnights since 1850-01-01".parse::<TimeUnits>().is_err());
    assert!("days after 1850-01-01".parse::<TimeUnits>().is_err());
}

#[test]
fn test_noleap_and_all_leap_dates() {
    let noleap = num2date(&[58.0, 59.0, 365.0], "days since 2000-01-01", Calendar::NoLeap).unwrap();
    assert_eq!(noleap[0], CalendarDate::new(2000, 2, 28));
    assert_eq!(noleap[1], CalendarDate::new(2000, 3, 1));
    assert_eq!(noleap[2], CalendarDate::new(2001, 1, 1));

    let all_leap = num2date(&[59.0, 366.0], "days since 2001-01-01", Calendar::AllLeap).unwrap();
    assert_eq!(all_leap[0], CalendarDate::new(2001, 2, 29));
    assert_eq!(all_leap[1], CalendarDate::new(2002, 1, 1));

    let hours = num2date(&[-24.0], "hours since 2015-01-01", Calendar::Day360).unwrap();
    assert_eq!(hours[0], CalendarDate::new(2014, 12, 30));

    assert!(num2date(&[f64::NAN], "days since 2015-01-01", Calendar::Day360).is_err());
}

#[test]
fn test_region_bounds() {
    let region = RegionBounds::new(-10.0, 10.0, -20.0, 20.0).unwrap();
    assert!(region.contains_lat(0.0));
    assert!(!region.contains_lat(10.5));
    assert!(region.contains_lon(350.0));
    assert!(region.contains_lon(-5.0));
    assert!(!region.contains_lon(180.0));

    let global = RegionBounds::new(-90.0, 90.0, 0.0, 360.0).unwrap();
    assert!(global.contains_lon(359.9));

    assert!(matches!(
        RegionBounds::new(10.0, -10.0, 0.0, 10.0),
        Err(TrendError::InvalidRegion { .. })
    ));
    assert!(RegionBounds::new(-95.0, 0.0, 0.0, 10.0).is_err());
    assert!(RegionBounds::new(0.0, f64::NAN, 0.0, 10.0).is_err());
}

#[test]
fn test_dataset_shape_validation() {
    let result = ClimateDataset::new(
        "ts",
        Array3::zeros((2, 2, 2)),
        arr1(&[0.0, 1.0, 2.0]),
        arr1(&[0.0, 1.0]),
        vec![CalendarDate::new(2015, 1, 1), CalendarDate::new(2015, 2, 1)],
        Calendar::Day360,
    );
    assert!(matches!(result, Err(TrendError::InvalidShape { .. })));
}

#[test]
fn test_dataset_nearest_cell_wraps_longitude() {
    let dataset = small_dataset();
    assert_eq!(dataset.nearest_cell(25.0, 85.0).unwrap(), (2, 1));
    // -0.1 east is next to 0, and 359 is closer to 0 than to 270
    assert_eq!(dataset.nearest_cell(-31.0, -0.1).unwrap(), (0, 0));
    assert_eq!(dataset.nearest_cell(0.0, 359.0).unwrap(), (1, 0));
    assert!(dataset.nearest_cell(f64::NAN, 0.0).is_err());
}

#[test]
fn test_dataset_subset_and_years() {
    let dataset = small_dataset();
    assert_eq!(dataset.years(), vec![2015, 2016]);

    let region = RegionBounds::new(-5.0, 40.0, -100.0, 100.0).unwrap();
    let subset = dataset.subset(&region).unwrap();
    assert_eq!(subset.dim(), (24, 2, 3));
    assert_eq!(subset.lat().to_vec(), vec![0.0, 30.0]);
    // Longitudes keep their grid order: 0, 90, 270
    assert_eq!(subset.lon().to_vec(), vec![0.0, 90.0, 270.0]);
    assert_abs_diff_eq!(subset.data()[[0, 0, 2]], 280.0 + 10.0 + 3.0);

    let empty = RegionBounds::new(50.0, 60.0, 0.0, 10.0).unwrap();
    assert!(matches!(dataset.subset(&empty), Err(TrendError::NoData { .. })));

    let second_year = dataset.select_years(2016, 2016).unwrap();
    assert_eq!(second_year.dim(), (12, 3, 4));
    assert_eq!(second_year.dates()[0], CalendarDate::new(2016, 1, 16));
    assert!(dataset.select_years(2050, 2060).is_err());

    let field = dataset.to_field(12).unwrap();
    assert_eq!(field.years(), 2);
    assert!(dataset.to_field(7).is_err());
}

#[test]
fn test_point_series() {
    let dataset = small_dataset();
    let series = PointSeries::extract(&dataset, 29.0, 92.0).unwrap();

    assert_eq!((series.lat_index, series.lon_index), (2, 1));
    assert_eq!(series.lat, 30.0);
    assert_eq!(series.len(), 24);
    assert!(!series.is_empty());
    assert_abs_diff_eq!(series.values[0], 301.0);
    assert_abs_diff_eq!(series.to_celsius()[0], 301.0 - KELVIN_OFFSET, epsilon = 1e-12);

    let annual = series.annual_means();
    assert_eq!(annual.len(), 2);
    assert_eq!(annual[1].0, 2016);
    assert_abs_diff_eq!(annual[1].1 - annual[0].1, 1.2, epsilon = 1e-9);

    let july = series.month(7);
    assert_eq!(july.len(), 2);
    assert_eq!(july[1].0, CalendarDate::new(2016, 7, 16));

    let djf = series.seasonal_means(Season::Djf);
    assert_abs_diff_eq!(djf[0].1, 301.0 + (0.0 + 0.1 + 1.1) / 3.0, epsilon = 1e-9);

    // Same month one year apart differs by 1.2 K, so anomalies are +-0.6
    let anomalies = series.anomalies();
    assert_abs_diff_eq!(anomalies[0], -0.6, epsilon = 1e-9);
    assert_abs_diff_eq!(anomalies[12], 0.6, epsilon = 1e-9);
}

#[test]
fn test_point_series_json() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("point.json");

    let series = PointSeries::extract(&small_dataset(), -30.0, 0.0).unwrap();
    series.write_json(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["variable"], "ts");
    assert_eq!(json["values"].as_array().unwrap().len(), 24);
    assert_eq!(json["dates"][13]["month"], 2);
    assert_eq!(json["dates"][13]["year"], 2016);
}

#[test]
fn test_masked_point_values_are_skipped_in_means() {
    let mut data = Array3::from_elem((12, 1, 1), 290.0);
    data[[3, 0, 0]] = f64::NAN;
    let dates = (0..12).map(|m| CalendarDate::new(2020, m + 1, 1)).collect();
    let dataset = ClimateDataset::new(
        "tas",
        data,
        Array1::from(vec![0.0]),
        Array1::from(vec![0.0]),
        dates,
        Calendar::NoLeap,
    )
    .unwrap();

    let series = PointSeries::extract(&dataset, 0.0, 0.0).unwrap();
    assert_abs_diff_eq!(series.annual_means()[0].1, 290.0);
    assert!(series.values[3].is_nan());
}
