//! TOML-based site configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::production::LossFactors;
use crate::site::Site;
use crate::solar::{DEFAULT_ALBEDO, DEFAULT_LINKE_TURBIDITY, SkyParams};
use crate::weather::synthetic::SyntheticWeather;

/// Top-level forecast configuration parsed from TOML.
///
/// All fields have defaults matching the `nicosia` preset. Load from TOML
/// with [`ForecastConfig::from_toml_file`] or pick a built-in preset with
/// [`ForecastConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    /// Location and panel geometry.
    #[serde(default)]
    pub site: SiteConfig,
    /// Wiring and inverter losses.
    #[serde(default)]
    pub losses: LossesConfig,
    /// Clear-sky atmosphere and ground.
    #[serde(default)]
    pub sky: SkyConfig,
    /// Synthetic weather used when no weather file is given.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
    /// Horizon and correction selection.
    #[serde(default)]
    pub forecast: ForecastSection,
}

/// Location and panel geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Latitude in degrees, north positive.
    pub latitude: f64,
    /// Longitude in degrees, east positive.
    pub longitude: f64,
    /// Altitude above sea level (m).
    pub altitude_m: f64,
    /// IANA time zone name, e.g. `"Europe/Nicosia"`.
    pub timezone: String,
    /// Panel tilt from horizontal (degrees).
    pub tilt_deg: f64,
    /// Panel azimuth (degrees, 180 = south).
    pub azimuth_deg: f64,
    /// Module length (mm).
    pub module_length_mm: f64,
    /// Module width (mm).
    pub module_width_mm: f64,
    /// Module efficiency as a fraction (0.0-1.0].
    pub module_efficiency: f64,
    /// Number of installed panels.
    pub panel_count: u32,
    /// Commissioning date (`YYYY-MM-DD`); omit to disable degradation.
    pub commissioning_date: Option<NaiveDate>,
    /// Annual degradation (% per year).
    pub degradation_rate_pct: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latitude: 35.1856,
            longitude: 33.3823,
            altitude_m: 220.0,
            timezone: "Europe/Nicosia".to_string(),
            tilt_deg: 30.0,
            azimuth_deg: 180.0,
            module_length_mm: 1722.0,
            module_width_mm: 1134.0,
            module_efficiency: 0.213,
            panel_count: 24,
            commissioning_date: None,
            degradation_rate_pct: 0.5,
        }
    }
}

/// Wiring and inverter losses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LossesConfig {
    /// String wiring loss factor (0.0-1.0].
    pub string_loss_factor: f64,
    /// Inverter efficiency (0.0-1.0].
    pub inverter_efficiency: f64,
}

impl Default for LossesConfig {
    fn default() -> Self {
        let l = LossFactors::default();
        Self {
            string_loss_factor: l.string_loss_factor,
            inverter_efficiency: l.inverter_efficiency,
        }
    }
}

/// Clear-sky atmosphere and ground.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkyConfig {
    /// Linke turbidity factor (typical 2-7).
    pub linke_turbidity: f64,
    /// Ground albedo (0.0-1.0).
    pub albedo: f64,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            linke_turbidity: DEFAULT_LINKE_TURBIDITY,
            albedo: DEFAULT_ALBEDO,
        }
    }
}

/// Synthetic weather parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Daily mean temperature (°C).
    pub mean_temperature_c: f64,
    /// Half the daily temperature swing (°C).
    pub temperature_amplitude_c: f64,
    /// Long-run mean cloud cover (%).
    pub mean_cloud_pct: f64,
    /// AR(1) correlation coefficient (0.0-1.0).
    pub alpha: f64,
    /// Cloud innovation noise standard deviation (%).
    pub cloud_noise_std: f64,
    /// Random seed.
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        let s = SyntheticWeather::default();
        Self {
            mean_temperature_c: s.mean_temperature_c,
            temperature_amplitude_c: s.temperature_amplitude_c,
            mean_cloud_pct: s.mean_cloud_pct,
            alpha: s.alpha,
            cloud_noise_std: s.cloud_noise_std,
            seed: s.seed,
        }
    }
}

/// Horizon and correction selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSection {
    /// Furthest target date accepted, in days after today.
    pub max_days_ahead: i64,
    /// Correction: `"auto"`, `"physical"` or `"none"`.
    pub correction: String,
}

impl Default for ForecastSection {
    fn default() -> Self {
        Self {
            max_days_ahead: 14,
            correction: "auto".to_string(),
        }
    }
}

impl ForecastConfig {
    /// Rooftop array in Nicosia, Cyprus.
    pub fn nicosia() -> Self {
        Self::default()
    }

    /// Single large panel in Moscow with a cooler, cloudier climate.
    pub fn moscow() -> Self {
        Self {
            site: SiteConfig {
                latitude: 55.7558,
                longitude: 37.6176,
                altitude_m: 156.0,
                timezone: "Europe/Moscow".to_string(),
                module_length_mm: 5000.0,
                module_width_mm: 2000.0,
                module_efficiency: 0.18,
                panel_count: 1,
                ..SiteConfig::default()
            },
            sky: SkyConfig {
                linke_turbidity: 3.5,
                albedo: 0.2,
            },
            synthetic: SyntheticConfig {
                mean_temperature_c: 8.0,
                temperature_amplitude_c: 4.0,
                mean_cloud_pct: 60.0,
                ..SyntheticConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["nicosia", "moscow"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "nicosia" => Ok(Self::nicosia()),
            "moscow" => Ok(Self::moscow()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.site;

        if !(-90.0..=90.0).contains(&s.latitude) {
            errors.push(ConfigError::new("site.latitude", "must be in [-90, 90]"));
        }
        if !(-180.0..=180.0).contains(&s.longitude) {
            errors.push(ConfigError::new("site.longitude", "must be in [-180, 180]"));
        }
        if s.timezone.parse::<Tz>().is_err() {
            errors.push(ConfigError::new(
                "site.timezone",
                format!("unknown time zone \"{}\"", s.timezone),
            ));
        }
        if !(0.0..=90.0).contains(&s.tilt_deg) {
            errors.push(ConfigError::new("site.tilt_deg", "must be in [0, 90]"));
        }
        if !(0.0..360.0).contains(&s.azimuth_deg) {
            errors.push(ConfigError::new("site.azimuth_deg", "must be in [0, 360)"));
        }
        if !(s.module_length_mm > 0.0 && s.module_width_mm > 0.0) {
            errors.push(ConfigError::new("site.module_length_mm", "module dimensions must be > 0"));
        }
        if !(s.module_efficiency > 0.0 && s.module_efficiency <= 1.0) {
            errors.push(ConfigError::new("site.module_efficiency", "must be in (0.0, 1.0]"));
        }
        if s.panel_count == 0 {
            errors.push(ConfigError::new("site.panel_count", "must be >= 1"));
        }
        if !(s.degradation_rate_pct >= 0.0 && s.degradation_rate_pct < 100.0) {
            errors.push(ConfigError::new("site.degradation_rate_pct", "must be in [0, 100)"));
        }

        let l = &self.losses;
        if !(l.string_loss_factor > 0.0 && l.string_loss_factor <= 1.0) {
            errors.push(ConfigError::new("losses.string_loss_factor", "must be in (0.0, 1.0]"));
        }
        if !(l.inverter_efficiency > 0.0 && l.inverter_efficiency <= 1.0) {
            errors.push(ConfigError::new("losses.inverter_efficiency", "must be in (0.0, 1.0]"));
        }

        let sky = &self.sky;
        if !sky.linke_turbidity.is_finite() || sky.linke_turbidity <= 0.0 {
            errors.push(ConfigError::new("sky.linke_turbidity", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&sky.albedo) {
            errors.push(ConfigError::new("sky.albedo", "must be in [0.0, 1.0]"));
        }

        let syn = &self.synthetic;
        if !(0.0..=1.0).contains(&syn.alpha) {
            errors.push(ConfigError::new("synthetic.alpha", "must be in [0.0, 1.0]"));
        }
        if !(0.0..=100.0).contains(&syn.mean_cloud_pct) {
            errors.push(ConfigError::new("synthetic.mean_cloud_pct", "must be in [0, 100]"));
        }

        let f = &self.forecast;
        if f.max_days_ahead < 0 {
            errors.push(ConfigError::new("forecast.max_days_ahead", "must be >= 0"));
        }
        if !matches!(f.correction.as_str(), "auto" | "physical" | "none") {
            errors.push(ConfigError::new(
                "forecast.correction",
                format!(
                    "must be \"auto\", \"physical\" or \"none\", got \"{}\"",
                    f.correction
                ),
            ));
        }

        errors
    }

    /// Builds the [`Site`] described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error as [`crate::error::ForecastError::Config`],
    /// or [`crate::error::ForecastError::InvalidGeometry`] from the site check.
    pub fn to_site(&self) -> Result<Site> {
        if let Some(err) = self.validate().into_iter().next() {
            return Err(err.into());
        }
        let s = &self.site;
        let tz: Tz = s
            .timezone
            .parse()
            .map_err(|_| {
                let message = format!("unknown time zone \"{}\"", s.timezone);
                ConfigError::new("site.timezone", message)
            })?;
        let site = Site::new(s.latitude, s.longitude, tz)
            .with_altitude(s.altitude_m)
            .with_orientation(s.tilt_deg, s.azimuth_deg)
            .with_module(s.module_length_mm, s.module_width_mm, s.module_efficiency)
            .with_panel_count(s.panel_count)
            .with_degradation(s.commissioning_date, s.degradation_rate_pct)
            .with_losses(LossFactors {
                string_loss_factor: self.losses.string_loss_factor,
                inverter_efficiency: self.losses.inverter_efficiency,
            })
            .with_sky(SkyParams {
                linke_turbidity: self.sky.linke_turbidity,
                albedo: self.sky.albedo,
            });
        site.validate()?;
        Ok(site)
    }

    /// Synthetic weather generator for this configuration.
    pub fn synthetic_weather(&self) -> SyntheticWeather {
        let s = &self.synthetic;
        SyntheticWeather {
            mean_temperature_c: s.mean_temperature_c,
            temperature_amplitude_c: s.temperature_amplitude_c,
            mean_cloud_pct: s.mean_cloud_pct,
            alpha: s.alpha,
            cloud_noise_std: s.cloud_noise_std,
            seed: s.seed,
            ..SyntheticWeather::default()
        }
    }
}
