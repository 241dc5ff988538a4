use chrono::DateTime;
use tracing::debug;

use super::{WeatherRow, WeatherSample};
use crate::error::{ForecastError, Result};

/// Grid step in seconds (15 minutes).
pub const STEP_SECONDS: i64 = 900;

/// Known values of one field as `(unix_seconds, value)`, time-ordered.
type Knots = Vec<(i64, f64)>;

/// Resamples weather onto a 15-minute grid.
///
/// Samples are sorted and de-duplicated (first occurrence of a timestamp
/// wins). The grid runs from the first sample floored to the quarter hour
/// through the last sample floored to the quarter hour. Each field is
/// interpolated linearly between its known values; outside that range the
/// nearest known value is held. A field with no known values stays absent.
///
/// Returns an empty vector for empty input.
pub fn resample_quarter_hour(samples: &[WeatherSample]) -> Vec<WeatherSample> {
    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|s| s.timestamp);
    sorted.dedup_by_key(|s| s.timestamp);

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    let tz = first.timestamp.timezone();
    let start = first.timestamp.timestamp().div_euclid(STEP_SECONDS) * STEP_SECONDS;
    let end = last.timestamp.timestamp().div_euclid(STEP_SECONDS) * STEP_SECONDS;

    let temperature: Knots = knots(&sorted, |s| s.temperature_c);
    let cloud: Knots = knots(&sorted, |s| s.cloud_pct);

    let mut out = Vec::with_capacity(((end - start) / STEP_SECONDS + 1) as usize);
    let mut t = start;
    while t <= end {
        if let Some(utc) = DateTime::from_timestamp(t, 0) {
            out.push(WeatherSample::new(
                utc.with_timezone(&tz),
                interpolate(&temperature, t),
                interpolate(&cloud, t),
            ));
        }
        t += STEP_SECONDS;
    }

    debug!(
        input = samples.len(),
        unique = sorted.len(),
        output = out.len(),
        "resampled weather to quarter-hour grid"
    );
    out
}

/// Resamples and attaches time features.
///
/// # Errors
///
/// Returns [`ForecastError::EmptyWeatherSeries`] when there are no samples.
pub fn normalize(samples: &[WeatherSample]) -> Result<Vec<WeatherRow>> {
    let grid = resample_quarter_hour(samples);
    if grid.is_empty() {
        return Err(ForecastError::EmptyWeatherSeries);
    }
    Ok(grid.into_iter().map(WeatherRow::from_sample).collect())
}

fn knots(samples: &[WeatherSample], field: impl Fn(&WeatherSample) -> Option<f64>) -> Knots {
    samples
        .iter()
        .filter_map(|s| field(s).map(|v| (s.timestamp.timestamp(), v)))
        .collect()
}

/// Linear interpolation at `t`, holding the endpoint values outside the
/// known range.
fn interpolate(knots: &[(i64, f64)], t: i64) -> Option<f64> {
    let idx = knots.partition_point(|(k, _)| *k < t);
    match (idx.checked_sub(1).and_then(|i| knots.get(i)), knots.get(idx)) {
        (_, Some(&(k, v))) if k == t => Some(v),
        (Some(&(t0, v0)), Some(&(t1, v1))) => {
            let w = (t - t0) as f64 / (t1 - t0) as f64;
            Some(v0 + (v1 - v0) * w)
        }
        (None, Some(&(_, v))) | (Some(&(_, v)), None) => Some(v),
        (None, None) => None,
    }
}
