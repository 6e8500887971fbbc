//! Benchmark of the per-cell trend engine across thread counts.
//!
//! Builds an in-memory field and times the full monthly plus annual
//! regression on Rayon pools of increasing size. Results are checked to be
//! identical for every pool.

use ndarray::Array4;
use rayon::ThreadPoolBuilder;
use sstrend::prelude::*;
use std::time::Instant;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("sstrend trend engine benchmark");
    println!("==============================\n");

    let available = num_cpus::get();
    println!("System has {available} logical CPU cores available\n");

    let (years, nlat, nlon) = (86, 90, 180);
    let data = Array4::from_shape_fn((years, 12, nlat, nlon), |(y, m, i, j)| {
        let weather = ((y * 13 + m * 7 + i * 3 + j) % 17) as f64 * 0.1;
        280.0 + 0.04 * y as f64 + m as f64 * 0.3 + weather
    });
    let field = TemperatureField::new(data)?;
    let engine = TrendEngine::new(TrendWindow::spanning(&field));
    println!("Field: {years} years x 12 months on a {nlat}x{nlon} grid\n");

    let mut reference: Option<TrendMaps> = None;
    let mut baseline = None;
    let mut threads = 1;
    while threads <= available {
        let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
        let start = Instant::now();
        let maps = pool.install(|| engine.compute(&field))?;
        let seconds = start.elapsed().as_secs_f64();

        let base = *baseline.get_or_insert(seconds);
        println!(
            "{threads:>3} threads: {seconds:.3} s ({:.2}x), mean trend {:.4} K/decade",
            base / seconds,
            maps.summary().mean_trend_per_decade
        );

        match &reference {
            Some(expected) if *expected != maps => println!("    results differ from 1 thread!"),
            Some(_) => {}
            None => reference = Some(maps),
        }
        threads *= 2;
    }

    Ok(())
}
