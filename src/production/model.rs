//! Statistical production correction.
//!
//! A trained regression model maps a feature row (irradiance, weather and
//! time encodings) to either a performance ratio or an absolute per-panel
//! DC output. Which of the two a model produces is not declared by the
//! model file, so the whole prediction series is classified once:
//!
//! - every finite prediction within \[0, 1.1\] => [`Interpretation::Ratio`]
//! - anything else => [`Interpretation::Absolute`] (watts per panel)

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::physical::{effective_irradiance, rated_dc_w};
use crate::error::{ConfigError, ForecastError, Result};
use crate::solar::IrradianceSample;
use crate::weather::WeatherRow;

/// Upper bound of predictions still read as a performance ratio.
pub const RATIO_UPPER_BOUND: f64 = 1.1;

/// A trained regression model.
pub trait RegressionModel: Send + Sync {
    /// Names of the features, in the order `predict` expects them.
    fn feature_names(&self) -> &[String];

    /// Predicts one value from a feature row.
    fn predict(&self, features: &[f64]) -> f64;
}

/// Linear model `intercept + sum(coefficients[i] * features[i])`.
///
/// Stored as JSON:
/// ```json
/// {"features": ["poa_w_m2", "temp_c"], "coefficients": [0.0009, -0.004], "intercept": 0.1}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearModel {
    features: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Creates a model, checking that every feature has a coefficient.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Config`] on a length mismatch or a
    /// non-finite parameter.
    pub fn new(features: Vec<String>, coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        let model = Self {
            features,
            coefficients,
            intercept,
        };
        model.check()?;
        Ok(model)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(s)?;
        model.check()?;
        Ok(model)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn check(&self) -> std::result::Result<(), ConfigError> {
        if self.features.len() != self.coefficients.len() {
            return Err(ConfigError::new(
                "model.coefficients",
                format!(
                    "{} coefficients for {} features",
                    self.coefficients.len(),
                    self.features.len()
                ),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::new("model", "parameters must be finite"));
        }
        Ok(())
    }
}

impl RegressionModel for LinearModel {
    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}

/// Value fed to a model for a feature with no data.
pub const MISSING_FEATURE_VALUE: f64 = 0.0;

/// Numeric weather-feed fields a model may be trained on but the pipeline
/// has no data for. They are fed as [`MISSING_FEATURE_VALUE`].
pub const UNAVAILABLE_FEATURES: &[&str] = &[
    "is_day",
    "wind_kph",
    "wind_degree",
    "pressure_mb",
    "precip_mm",
    "snow_cm",
    "humidity",
    "feelslike_c",
    "windchill_c",
    "heatindex_c",
    "dewpoint_c",
    "will_it_rain",
    "chance_of_rain",
    "will_it_snow",
    "chance_of_snow",
    "vis_km",
    "gust_kph",
    "uv",
    "solar_intensity_score",
];

/// Feature vocabulary the pipeline can build for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Clear-sky plane-of-array irradiance
    /// (`radiation_w_m2_y`, `poa_w_m2`, `clearsky_poa`).
    Poa,
    Ghi,
    Cloud,
    Temperature,
    HourLocal,
    DayOfYear,
    HourSin,
    HourCos,
    DoySin,
    DoyCos,
    /// Known numeric field without data.
    Unavailable,
}

impl FromStr for Feature {
    type Err = ForecastError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "radiation_w_m2_y" | "poa_w_m2" | "clearsky_poa" => Ok(Self::Poa),
            "ghi" => Ok(Self::Ghi),
            "cloud" => Ok(Self::Cloud),
            "temp_c" => Ok(Self::Temperature),
            "hour_local" => Ok(Self::HourLocal),
            "dayofyear" => Ok(Self::DayOfYear),
            "hour_sin" => Ok(Self::HourSin),
            "hour_cos" => Ok(Self::HourCos),
            "doy_sin" => Ok(Self::DoySin),
            "doy_cos" => Ok(Self::DoyCos),
            other if UNAVAILABLE_FEATURES.contains(&other) => Ok(Self::Unavailable),
            other => Err(ForecastError::ModelFeatureMismatch {
                feature: other.to_string(),
            }),
        }
    }
}

impl Feature {
    /// Value of this feature for one row. Absent weather readings and
    /// unavailable fields are [`MISSING_FEATURE_VALUE`].
    pub fn value(self, row: &WeatherRow, irradiance: &IrradianceSample) -> f64 {
        match self {
            Self::Poa => irradiance.poa_w_m2,
            Self::Ghi => irradiance.ghi_w_m2,
            Self::Cloud => row.sample.cloud_pct.unwrap_or(MISSING_FEATURE_VALUE),
            Self::Temperature => row.sample.temperature_c.unwrap_or(MISSING_FEATURE_VALUE),
            Self::HourLocal => row.features.hour_local,
            Self::DayOfYear => f64::from(row.features.day_of_year),
            Self::HourSin => row.features.hour_sin,
            Self::HourCos => row.features.hour_cos,
            Self::DoySin => row.features.doy_sin,
            Self::DoyCos => row.features.doy_cos,
            Self::Unavailable => MISSING_FEATURE_VALUE,
        }
    }
}

/// Resolves a model's declared feature names against the vocabulary.
///
/// # Errors
///
/// Returns [`ForecastError::ModelFeatureMismatch`] for the first unknown or
/// non-numeric name.
pub fn resolve_features(model: &dyn RegressionModel) -> Result<Vec<Feature>> {
    model.feature_names().iter().map(|n| n.parse::<Feature>()).collect()
}

/// How a series of model predictions is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    Ratio,
    Absolute,
}

impl Interpretation {
    /// Classifies a whole prediction series; non-finite values are ignored.
    pub fn classify(predictions: &[f64]) -> Self {
        let is_ratio = predictions
            .iter()
            .filter(|p| p.is_finite())
            .all(|p| (0.0..=RATIO_UPPER_BOUND).contains(p));
        if is_ratio { Self::Ratio } else { Self::Absolute }
    }

    pub fn wrap(self, prediction: f64) -> ModelOutput {
        match self {
            Self::Ratio => ModelOutput::Ratio(prediction),
            Self::Absolute => ModelOutput::Absolute(prediction),
        }
    }
}

/// One interpreted model prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ModelOutput {
    /// Fraction of rated output.
    Ratio(f64),
    /// Per-panel DC watts.
    Absolute(f64),
}

impl ModelOutput {
    /// Per-panel DC watts; negatives clamp to 0 and sub-threshold
    /// irradiance always yields 0.
    pub fn panel_dc_w(self, poa_w_m2: f64, area_m2: f64, efficiency: f64) -> f64 {
        if effective_irradiance(poa_w_m2) == 0.0 {
            return 0.0;
        }
        match self {
            Self::Ratio(r) => rated_dc_w(poa_w_m2, area_m2, efficiency, r.max(0.0)),
            Self::Absolute(w) => w.max(0.0),
        }
    }
}

/// Per-panel DC watts for every row using a trained model.
///
/// Rows below the irradiance threshold are not sent to the model and
/// yield `Some(0.0)`. Non-finite predictions yield `None`.
///
/// # Errors
///
/// Returns [`ForecastError::ModelFeatureMismatch`] when the model needs a
/// feature outside the vocabulary.
pub fn statistical_panel_dc_w(
    model: &dyn RegressionModel,
    rows: &[WeatherRow],
    irradiance: &[IrradianceSample],
    area_m2: f64,
    efficiency: f64,
) -> Result<Vec<Option<f64>>> {
    let features = resolve_features(model)?;
    let mut buf = Vec::with_capacity(features.len());

    let raw: Vec<Option<f64>> = rows
        .iter()
        .zip(irradiance)
        .map(|(row, irr)| {
            if effective_irradiance(irr.poa_w_m2) == 0.0 {
                return None;
            }
            buf.clear();
            buf.extend(features.iter().map(|f| f.value(row, irr)));
            Some(model.predict(&buf))
        })
        .collect();

    let finite: Vec<f64> = raw.iter().flatten().copied().filter(|p| p.is_finite()).collect();
    let interpretation = Interpretation::classify(&finite);
    debug!(?interpretation, predictions = finite.len(), "classified model output");

    Ok(raw
        .into_iter()
        .zip(irradiance)
        .map(|(prediction, irr)| match prediction {
            None => Some(0.0),
            Some(p) if !p.is_finite() => {
                trace!(timestamp = %irr.timestamp, "non-finite model prediction");
                None
            }
            Some(p) => Some(interpretation.wrap(p).panel_dc_w(irr.poa_w_m2, area_m2, efficiency)),
        })
        .collect())
}
