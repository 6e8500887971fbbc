use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array3};
use netcdf::{create, open, AttributeValue};
use sstrend::calendar::{Calendar, CalendarDate};
use sstrend::dataset::ClimateDataset;
use sstrend::errors::TrendError;
use sstrend::metadata::{
    describe_variable, get_variable_metadata, list_variables_and_dimensions, print_metadata,
};
use sstrend::netcdf_io::{MapAttributes, TrendWriter};
use sstrend::trend::{compute_trends, linear_rate, TrendWindow, MONTHS_PER_DECADE};
use std::path::Path;
use tempfile::tempdir;

const FILL: f32 = 1.0e20;
const YEARS: usize = 10;
const NLAT: usize = 3;
const NLON: usize = 4;

/// Write a small scenario-style file: `ts(time, lat, lon)` in Kelvin with a
/// 360-day monthly time axis and one filled value at (t=5, lat=2, lon=3).
fn write_scenario(path: &Path, warming: f32, calendar: Option<&str>) {
    let nt = YEARS * 12;
    let mut file = create(path).expect("Failed to create NetCDF file");

    file.add_dimension("time", nt).expect("Failed to add dimension time");
    file.add_dimension("lat", NLAT).expect("Failed to add dimension lat");
    file.add_dimension("lon", NLON).expect("Failed to add dimension lon");
    file.add_attribute("experiment_id", "ssp585")
        .expect("Failed to add global attribute");

    {
        let mut time = file
            .add_variable::<f64>("time", &["time"])
            .expect("Failed to add time");
        time.put_attribute("units", "days since 2015-01-01 00:00:00")
            .expect("Failed to add units");
        if let Some(calendar) = calendar {
            time.put_attribute("calendar", calendar)
                .expect("Failed to add calendar");
        }
        let values: Array1<f64> = (0..nt).map(|t| 15.0 + 30.0 * t as f64).collect();
        time.put(values.view(), ..).expect("Failed to write time");
    }
    {
        let mut lat = file
            .add_variable::<f64>("lat", &["lat"])
            .expect("Failed to add lat");
        lat.put(Array1::from(vec![-45.0, 0.0, 45.0]).view(), ..)
            .expect("Failed to write lat");
    }
    {
        let mut lon = file
            .add_variable::<f64>("lon", &["lon"])
            .expect("Failed to add lon");
        lon.put(Array1::from(vec![0.0, 90.0, 180.0, 270.0]).view(), ..)
            .expect("Failed to write lon");
    }

    let mut data = Array3::from_shape_fn((nt, NLAT, NLON), |(t, i, j)| {
        let year = (t / 12) as f32;
        let month = (t % 12) as f32;
        280.0 + warming * year + month * 0.5 + i as f32 * 5.0 + j as f32
    });
    data[[5, 2, 3]] = FILL;

    let mut ts = file
        .add_variable::<f32>("ts", &["time", "lat", "lon"])
        .expect("Failed to add ts");
    ts.put_attribute("_FillValue", FILL).expect("Failed to add fill value");
    ts.put_attribute("units", "K").expect("Failed to add units");
    ts.put_attribute("long_name", "Surface Temperature")
        .expect("Failed to add long_name");
    ts.put(data.view(), ..).expect("Failed to write ts");
}

#[test]
fn test_load_scenario_dataset() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("ts_ssp585.nc");
    write_scenario(&path, 0.05, Some("360_day"));

    let dataset = ClimateDataset::open(&path, "ts").expect("Failed to load dataset");
    assert_eq!(dataset.dim(), (YEARS * 12, NLAT, NLON));
    assert_eq!(dataset.calendar(), Calendar::Day360);
    assert_eq!(dataset.dates()[0], CalendarDate::new(2015, 1, 16));
    assert_eq!(dataset.dates()[13], CalendarDate::new(2016, 2, 16));
    assert_eq!(dataset.years().len(), YEARS);
    assert_eq!(dataset.lat().to_vec(), vec![-45.0, 0.0, 45.0]);

    // Fill values are masked as NaN on load
    assert!(dataset.data()[[5, 2, 3]].is_nan());
    assert_abs_diff_eq!(dataset.data()[[0, 1, 2]], 287.0, epsilon = 1e-4);
}

#[test]
fn test_missing_calendar_defaults_to_360_day() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("no_calendar.nc");
    write_scenario(&path, 0.05, None);

    let dataset = ClimateDataset::open(&path, "ts").unwrap();
    assert_eq!(dataset.calendar(), Calendar::Day360);
    assert_eq!(dataset.dates()[11], CalendarDate::new(2015, 12, 16));
}

#[test]
fn test_load_errors() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("ts_ssp126.nc");
    write_scenario(&path, 0.02, Some("360_day"));

    assert!(matches!(
        ClimateDataset::open(&path, "tas"),
        Err(TrendError::VariableNotFound { .. })
    ));
    // Coordinate variables are one-dimensional
    assert!(matches!(
        ClimateDataset::open(&path, "lat"),
        Err(TrendError::InvalidShape { .. })
    ));
}

#[test]
fn test_trends_written_to_netcdf() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("ts_ssp585.nc");
    let output = temp_dir.path().join("trend.nc");
    write_scenario(&input, 0.05, Some("360_day"));

    let dataset = ClimateDataset::open(&input, "ts").unwrap();
    let field = dataset.to_field(12).unwrap();
    let maps = compute_trends(&field, TrendWindow::new(0, YEARS, 0, 12)).unwrap();

    TrendWriter::new(&output, dataset.variable(), dataset.lat(), dataset.lon())
        .write_trends(&maps)
        .expect("Failed to write trends");

    let file = open(&output).expect("Failed to open output");
    assert_eq!(file.dimension("month").unwrap().len(), 12);
    assert_eq!(file.dimension("lat").unwrap().len(), NLAT);
    assert_eq!(file.dimension("lon").unwrap().len(), NLON);

    for name in [
        "trend",
        "significance",
        "correlation",
        "intercept",
        "trend_monthly",
        "significance_monthly",
        "correlation_monthly",
        "intercept_monthly",
    ] {
        assert!(file.variable(name).is_some(), "missing variable {name}");
    }

    let trend_var = file.variable("trend").unwrap();
    match trend_var.attribute("units").unwrap().value().unwrap() {
        AttributeValue::Str(units) => assert_eq!(units, "K year-1"),
        other => panic!("unexpected units attribute {other:?}"),
    }

    let trend: Vec<f64> = trend_var.get_values::<f64, _>(..).unwrap();
    assert_eq!(trend.len(), NLAT * NLON);
    // Only the cell with the filled value is missing
    assert!(trend[NLAT * NLON - 1].is_nan());
    for &value in &trend[..NLAT * NLON - 1] {
        assert_abs_diff_eq!(value, 0.05, epsilon = 1e-4);
    }

    let significance: Vec<f64> = file
        .variable("significance")
        .unwrap()
        .get_values::<f64, _>(..)
        .unwrap();
    assert_abs_diff_eq!(significance[0], 100.0, epsilon = 1e-3);

    let trend_monthly = file.variable("trend_monthly").unwrap();
    assert_eq!(trend_monthly.dimensions().len(), 3);
    let month: Vec<i32> = file
        .variable("month")
        .unwrap()
        .get_values::<i32, _>(..)
        .unwrap();
    assert_eq!(month.first(), Some(&1));
    assert_eq!(month.last(), Some(&12));
}

#[test]
fn test_rate_map_replaces_existing_output() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input = temp_dir.path().join("ts_ssp245.nc");
    let output = temp_dir.path().join("rate.nc");
    write_scenario(&input, 0.03, Some("360_day"));
    std::fs::write(&output, b"stale").unwrap();

    let dataset = ClimateDataset::open(&input, "ts").unwrap();
    let rate = linear_rate(dataset.data().view(), MONTHS_PER_DECADE).unwrap();
    TrendWriter::new(&output, dataset.variable(), dataset.lat(), dataset.lon())
        .write_map(
            rate.view(),
            MapAttributes {
                name: "rate",
                units: "K decade-1",
                long_name: "least-squares rate of the monthly series",
            },
        )
        .expect("Failed to write rate map");

    let file = open(&output).unwrap();
    let values: Vec<f64> = file
        .variable("rate")
        .unwrap()
        .get_values::<f64, _>(..)
        .unwrap();
    assert_eq!(values.len(), NLAT * NLON);
    assert!(values[NLAT * NLON - 1].is_nan());
    assert!(values[0] > 0.0);
}

#[test]
fn test_writer_rejects_mismatched_grid() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let output = temp_dir.path().join("bad.nc");
    let lat = Array1::from(vec![0.0, 1.0]);
    let lon = Array1::from(vec![0.0, 1.0, 2.0]);

    let map = ndarray::Array2::<f64>::zeros((3, 2));
    let result = TrendWriter::new(&output, "ts", &lat, &lon).write_map(
        map.view(),
        MapAttributes {
            name: "mean",
            units: "K",
            long_name: "time mean",
        },
    );
    assert!(matches!(result, Err(TrendError::InvalidShape { .. })));
    assert!(!output.exists());
}

#[test]
fn test_metadata_functions() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("ts_ssp585.nc");
    write_scenario(&path, 0.05, Some("360_day"));
    let file = open(&path).unwrap();

    let meta = get_variable_metadata(&file, "ts").unwrap();
    assert_eq!(meta.dimension_names(), vec!["time", "lat", "lon"]);
    assert_eq!(meta.shape(), vec![YEARS * 12, NLAT, NLON]);
    assert_eq!(meta.total_elements, YEARS * 12 * NLAT * NLON);
    assert!(meta.attributes.iter().any(|(name, _)| name == "_FillValue"));

    assert!(print_metadata(&file).is_ok());
    assert!(list_variables_and_dimensions(&file).is_ok());
    assert!(describe_variable(&file, "ts").is_ok());
    assert!(matches!(
        describe_variable(&file, "missing"),
        Err(TrendError::VariableNotFound { .. })
    ));
}

#[test]
fn test_packed_variable_is_unpacked() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("ts_packed.nc");
    let nt = 24;

    {
        let mut file = create(&path).expect("Failed to create NetCDF file");
        file.add_dimension("time", nt).expect("Failed to add dimension time");
        file.add_dimension("lat", 1).expect("Failed to add dimension lat");
        file.add_dimension("lon", 2).expect("Failed to add dimension lon");

        let mut time = file
            .add_variable::<f64>("time", &["time"])
            .expect("Failed to add time");
        time.put_attribute("units", "days since 2015-01-01")
            .expect("Failed to add units");
        time.put_attribute("calendar", "360_day")
            .expect("Failed to add calendar");
        let values: Array1<f64> = (0..nt).map(|t| 15.0 + 30.0 * t as f64).collect();
        time.put(values.view(), ..).expect("Failed to write time");

        let mut lat = file.add_variable::<f64>("lat", &["lat"]).expect("Failed to add lat");
        lat.put(Array1::from(vec![10.0]).view(), ..)
            .expect("Failed to write lat");
        let mut lon = file.add_variable::<f64>("lon", &["lon"]).expect("Failed to add lon");
        lon.put(Array1::from(vec![0.0, 90.0]).view(), ..)
            .expect("Failed to write lon");

        // Stored as hundredths of a kelvin above 273.15
        let mut packed = Array3::from_shape_fn((nt, 1, 2), |(t, _, j)| (1000 + t * 10 + j * 100) as i16);
        packed[[4, 0, 1]] = -32767;

        let mut ts = file
            .add_variable::<i16>("ts", &["time", "lat", "lon"])
            .expect("Failed to add ts");
        ts.put_attribute("_FillValue", -32767i16)
            .expect("Failed to add fill value");
        ts.put_attribute("scale_factor", 0.01f64)
            .expect("Failed to add scale_factor");
        ts.put_attribute("add_offset", 273.15f64)
            .expect("Failed to add add_offset");
        ts.put(packed.view(), ..).expect("Failed to write ts");
    }

    let dataset = ClimateDataset::open(&path, "ts").unwrap();
    assert_abs_diff_eq!(dataset.data()[[0, 0, 0]], 283.15, epsilon = 1e-9);
    assert_abs_diff_eq!(dataset.data()[[3, 0, 1]], 284.45, epsilon = 1e-9);
    // The fill value is compared in packed units and stays masked
    assert!(dataset.data()[[4, 0, 1]].is_nan());

    let rate = linear_rate(dataset.data().view(), MONTHS_PER_DECADE).unwrap();
    assert_abs_diff_eq!(rate[[0, 0]], 0.1 * MONTHS_PER_DECADE, epsilon = 1e-9);
}
