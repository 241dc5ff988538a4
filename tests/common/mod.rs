//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Europe::Nicosia;
use chrono_tz::Tz;

use pv_forecast::site::Site;
use pv_forecast::weather::WeatherSample;

/// Float comparison with an absolute tolerance.
macro_rules! assert_approx {
    ($left:expr, $right:expr, $tol:expr) => {
        let (l, r) = ($left as f64, $right as f64);
        assert!(
            (l - r).abs() <= $tol,
            "assert_approx failed: left={}, right={}, diff={}, tol={}",
            l,
            r,
            (l - r).abs(),
            $tol
        );
    };
}

/// Rooftop array in Nicosia (30° tilt, south, 10 panels of 2 m² at 20 %).
pub fn nicosia_site() -> Site {
    Site::new(35.1856, 33.3823, Nicosia)
        .with_orientation(30.0, 180.0)
        .with_module(2000.0, 1000.0, 0.2)
        .with_panel_count(10)
}

/// Production reference installation: 10 panels of 2 m² at 20 %, ageing
/// 1 %/year since 2023-01-01.
pub fn reference_site(tz: Tz) -> Site {
    Site::new(35.1856, 33.3823, tz)
        .with_orientation(30.0, 180.0)
        .with_module(2000.0, 1000.0, 0.2)
        .with_panel_count(10)
        .with_degradation(NaiveDate::from_ymd_opt(2023, 1, 1), 1.0)
}

/// Hourly weather for one local day with constant conditions.
pub fn hourly_day(
    tz: Tz,
    date: NaiveDate,
    temperature_c: f64,
    cloud_pct: f64,
) -> Vec<WeatherSample> {
    (0..24)
        .filter_map(|h| date.and_hms_opt(h, 0, 0))
        .filter_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|t| WeatherSample::new(t, Some(temperature_c), Some(cloud_pct)))
        .collect()
}

/// Midsummer day 2024-06-21.
pub fn midsummer() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 21).unwrap_or_default()
}

/// Path of a file under the crate's `data/` directory.
pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}
