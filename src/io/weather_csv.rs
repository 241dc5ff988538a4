//! CSV reader for weather observations and forecasts.
//!
//! Expected columns (header names are trimmed and case-insensitive):
//!
//! | column   | content                                              |
//! |----------|------------------------------------------------------|
//! | `time`   | `YYYY-MM-DD HH:MM[:SS]` local time, or RFC 3339      |
//! | `temp_c` | air temperature in °C, empty if unknown              |
//! | `cloud`  | cloud cover in percent, empty if unknown             |

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::weather::WeatherSample;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Deserialize)]
struct WeatherRecord {
    time: String,
    #[serde(default)]
    temp_c: Option<f64>,
    #[serde(default)]
    cloud: Option<f64>,
}

/// Reads weather samples from a CSV file, localizing naive times in `tz`.
///
/// # Errors
///
/// Returns [`ForecastError::Io`] if the file cannot be opened, otherwise
/// the errors of [`read_weather_csv`].
pub fn load_weather_csv(path: &Path, tz: Tz) -> Result<Vec<WeatherSample>> {
    let file = File::open(path)?;
    read_weather_csv(io::BufReader::new(file), tz)
}

/// Reads weather samples from any CSV source.
///
/// # Errors
///
/// Returns [`ForecastError::Csv`] for malformed rows and
/// [`ForecastError::Timestamp`] for unparseable or non-existent local times.
pub fn read_weather_csv(reader: impl Read, tz: Tz) -> Result<Vec<WeatherSample>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.iter().map(str::to_lowercase).collect::<csv::StringRecord>();
    rdr.set_headers(headers);

    let mut samples = Vec::new();
    for record in rdr.deserialize::<WeatherRecord>() {
        let record = record?;
        let timestamp = parse_timestamp(&record.time, tz)?;
        samples.push(WeatherSample::new(timestamp, record.temp_c, record.cloud));
    }
    debug!(rows = samples.len(), %tz, "read weather csv");
    Ok(samples)
}

/// Parses an RFC 3339 timestamp, or a naive local time in `tz`.
///
/// Ambiguous local times (autumn DST fold) resolve to the earlier instant.
///
/// # Errors
///
/// Returns [`ForecastError::Timestamp`] if nothing matches or the local
/// time falls in a DST gap.
pub fn parse_timestamp(s: &str, tz: Tz) -> Result<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&tz));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .ok_or_else(|| ForecastError::Timestamp(s.to_string()))
}
