//! Error types for the forecasting pipeline.

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"site.tilt_deg"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main error type for forecast operations.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Site location or panel orientation outside its physical range.
    #[error("invalid geometry: {field} = {value} ({reason})")]
    InvalidGeometry {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// No usable weather samples for the requested span.
    #[error("weather series is empty")]
    EmptyWeatherSeries,

    /// A trained model requires a feature the pipeline cannot build.
    #[error("model requests unsupported feature \"{feature}\"")]
    ModelFeatureMismatch { feature: String },

    /// NaN or infinity produced while computing an output field.
    #[error("non-finite value in {field}")]
    NonFiniteResult { field: &'static str },

    /// Target date lies beyond the forecast horizon.
    #[error("forecast is available at most {max_days} days ahead (requested {requested})")]
    HorizonExceeded { max_days: i64, requested: i64 },

    #[error("no site specification for tag \"{0}\"")]
    UnknownTag(String),

    #[error("invalid timestamp \"{0}\"")]
    Timestamp(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_names_field() {
        let e = ConfigError::new("site.tilt_deg", "must be in [0, 90]");
        assert_eq!(e.to_string(), "config error: site.tilt_deg: must be in [0, 90]");
    }

    #[test]
    fn config_error_converts_into_forecast_error() {
        let e: ForecastError = ConfigError::new("losses.inverter_efficiency", "must be > 0").into();
        assert!(matches!(e, ForecastError::Config(_)));
        assert!(e.to_string().contains("losses.inverter_efficiency"));
    }

    #[test]
    fn invalid_geometry_reports_value() {
        let e = ForecastError::InvalidGeometry {
            field: "tilt_deg",
            value: 95.0,
            reason: "must be in [0, 90]",
        };
        assert_eq!(e.to_string(), "invalid geometry: tilt_deg = 95 (must be in [0, 90])");
    }
}
