//! Weather samples, quarter-hour normalization and time features.

/// Cyclical time-of-day and day-of-year encodings.
pub mod features;
/// Quarter-hour resampling with linear interpolation.
pub mod resample;
/// Seeded synthetic weather for demonstration runs.
pub mod synthetic;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

pub use features::{TimeFeatures, time_features};
pub use resample::{normalize, resample_quarter_hour};

/// Temperature assumed when a sample has none (°C).
pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;
/// Cloud cover assumed when a sample has none (%).
pub const DEFAULT_CLOUD_PCT: f64 = 0.0;

/// One weather observation or forecast point.
///
/// Non-finite readings are stored as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSample {
    /// Local, timezone-aware timestamp.
    pub timestamp: DateTime<Tz>,
    /// Air temperature in °C.
    pub temperature_c: Option<f64>,
    /// Cloud cover in percent (0-100).
    pub cloud_pct: Option<f64>,
}

impl WeatherSample {
    pub fn new(
        timestamp: DateTime<Tz>,
        temperature_c: Option<f64>,
        cloud_pct: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            temperature_c: temperature_c.filter(|v| v.is_finite()),
            cloud_pct: cloud_pct.filter(|v| v.is_finite()).map(|c| c.clamp(0.0, 100.0)),
        }
    }

    /// Temperature with the 25 °C default applied.
    pub fn temperature_or_default(&self) -> f64 {
        self.temperature_c.unwrap_or(DEFAULT_TEMPERATURE_C)
    }

    /// Cloud cover with the clear-sky default applied.
    pub fn cloud_or_default(&self) -> f64 {
        self.cloud_pct.unwrap_or(DEFAULT_CLOUD_PCT)
    }
}

/// A normalized weather row: quarter-hour sample plus time features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRow {
    #[serde(flatten)]
    pub sample: WeatherSample,
    #[serde(flatten)]
    pub features: TimeFeatures,
}

impl WeatherRow {
    pub fn from_sample(sample: WeatherSample) -> Self {
        let features = time_features(&sample.timestamp);
        Self { sample, features }
    }

    pub fn timestamp(&self) -> DateTime<Tz> {
        self.sample.timestamp
    }
}
