use std::f64::consts::PI;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike};
use serde::Serialize;

/// Time-of-day and day-of-year features for the regression model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeFeatures {
    /// Fractional local hour, 0.0 to < 24.0.
    pub hour_local: f64,
    /// Day of year, 1 to 366.
    pub day_of_year: u32,
    pub hour_sin: f64,
    pub hour_cos: f64,
    pub doy_sin: f64,
    pub doy_cos: f64,
}

/// Number of days in the calendar year.
pub fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31).map_or(365, |d| d.ordinal())
}

/// Derives local-time features for a timestamp.
pub fn time_features<Tz: TimeZone>(ts: &DateTime<Tz>) -> TimeFeatures {
    let hour_local =
        f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0 + f64::from(ts.second()) / 3600.0;
    let day_of_year = ts.ordinal();
    let year_len = f64::from(days_in_year(ts.year()));
    let hour_angle = hour_local * 2.0 * PI / 24.0;
    let doy_angle = f64::from(day_of_year) * 2.0 * PI / year_len;
    TimeFeatures {
        hour_local,
        day_of_year,
        hour_sin: hour_angle.sin(),
        hour_cos: hour_angle.cos(),
        doy_sin: doy_angle.sin(),
        doy_cos: doy_angle.cos(),
    }
}
