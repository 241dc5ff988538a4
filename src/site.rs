//! Site description: location, panel geometry and system parameters.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::error::{ForecastError, Result};
use crate::production::losses::LossFactors;
use crate::solar::SkyParams;

/// A fixed photovoltaic installation.
///
/// Built with [`Site::new`] and the `with_*` methods, or from configuration
/// via [`crate::config::ForecastConfig::to_site`]. Treated as read-only for
/// the duration of a forecast.
///
/// # Examples
///
/// ```
/// use chrono_tz::Europe::Nicosia;
/// use pv_forecast::site::Site;
///
/// let site = Site::new(35.1856, 33.3823, Nicosia)
///     .with_orientation(30.0, 180.0)
///     .with_module(1722.0, 1134.0, 0.213)
///     .with_panel_count(24);
/// assert!(site.validate().is_ok());
/// assert!((site.module_area_m2() - 1.9527).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct Site {
    /// Latitude in degrees (north positive).
    pub latitude: f64,
    /// Longitude in degrees (east positive).
    pub longitude: f64,
    /// Altitude above sea level in meters.
    pub altitude_m: f64,
    /// Panel tilt from horizontal in degrees.
    pub tilt_deg: f64,
    /// Panel azimuth in degrees (0 = north, 180 = south).
    pub azimuth_deg: f64,
    /// Module length in millimeters.
    pub module_length_mm: f64,
    /// Module width in millimeters.
    pub module_width_mm: f64,
    /// Module efficiency as a fraction (0.0-1.0).
    pub module_efficiency: f64,
    /// Number of installed panels.
    pub panel_count: u32,
    /// Commissioning date; `None` disables degradation.
    pub commissioning_date: Option<NaiveDate>,
    /// Annual degradation rate in percent per year.
    pub degradation_rate_pct: f64,
    /// Local time zone of the site.
    pub timezone: Tz,
    /// String wiring and inverter losses.
    pub losses: LossFactors,
    /// Atmosphere and ground parameters for the clear-sky model.
    pub sky: SkyParams,
}

impl Site {
    /// Creates a site at the given location with a flat, south-facing,
    /// single-panel default geometry.
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m: 0.0,
            tilt_deg: 0.0,
            azimuth_deg: 180.0,
            module_length_mm: 1000.0,
            module_width_mm: 1000.0,
            module_efficiency: 0.177,
            panel_count: 1,
            commissioning_date: None,
            degradation_rate_pct: 0.0,
            timezone,
            losses: LossFactors::default(),
            sky: SkyParams::default(),
        }
    }

    /// Sets tilt and azimuth. Non-finite tilt falls back to flat, non-finite
    /// azimuth to due south.
    pub fn with_orientation(mut self, tilt_deg: f64, azimuth_deg: f64) -> Self {
        self.tilt_deg = if tilt_deg.is_finite() { tilt_deg } else { 0.0 };
        self.azimuth_deg = if azimuth_deg.is_finite() {
            azimuth_deg
        } else {
            180.0
        };
        self
    }

    pub fn with_module(mut self, length_mm: f64, width_mm: f64, efficiency: f64) -> Self {
        self.module_length_mm = length_mm;
        self.module_width_mm = width_mm;
        self.module_efficiency = efficiency;
        self
    }

    pub fn with_panel_count(mut self, panel_count: u32) -> Self {
        self.panel_count = panel_count;
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }

    pub fn with_degradation(
        mut self,
        commissioning_date: Option<NaiveDate>,
        rate_pct: f64,
    ) -> Self {
        self.commissioning_date = commissioning_date;
        self.degradation_rate_pct = rate_pct;
        self
    }

    pub fn with_losses(mut self, losses: LossFactors) -> Self {
        self.losses = losses;
        self
    }

    pub fn with_sky(mut self, sky: SkyParams) -> Self {
        self.sky = sky;
        self
    }

    /// Module area in square meters.
    pub fn module_area_m2(&self) -> f64 {
        (self.module_length_mm / 1000.0) * (self.module_width_mm / 1000.0)
    }

    /// Checks location and panel geometry against their physical ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidGeometry`] for the first field found
    /// out of range.
    pub fn validate(&self) -> Result<()> {
        check_range("latitude", self.latitude, -90.0, 90.0, "must be in [-90, 90]")?;
        check_range("longitude", self.longitude, -180.0, 180.0, "must be in [-180, 180]")?;
        check_range("tilt_deg", self.tilt_deg, 0.0, 90.0, "must be in [0, 90]")?;
        if !(self.azimuth_deg.is_finite() && (0.0..360.0).contains(&self.azimuth_deg)) {
            return Err(ForecastError::InvalidGeometry {
                field: "azimuth_deg",
                value: self.azimuth_deg,
                reason: "must be in [0, 360)",
            });
        }
        if self.panel_count == 0 {
            return Err(ForecastError::InvalidGeometry {
                field: "panel_count",
                value: 0.0,
                reason: "must be >= 1",
            });
        }
        check_positive("module_length_mm", self.module_length_mm)?;
        check_positive("module_width_mm", self.module_width_mm)?;
        if !(self.module_efficiency > 0.0 && self.module_efficiency <= 1.0) {
            return Err(ForecastError::InvalidGeometry {
                field: "module_efficiency",
                value: self.module_efficiency,
                reason: "must be in (0, 1]",
            });
        }
        let rate = self.degradation_rate_pct;
        if !(rate.is_finite() && (0.0..100.0).contains(&rate)) {
            return Err(ForecastError::InvalidGeometry {
                field: "degradation_rate_pct",
                value: rate,
                reason: "must be in [0, 100)",
            });
        }
        if !self.altitude_m.is_finite() {
            return Err(ForecastError::InvalidGeometry {
                field: "altitude_m",
                value: self.altitude_m,
                reason: "must be finite",
            });
        }
        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
    reason: &'static str,
) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ForecastError::InvalidGeometry {
            field,
            value,
            reason,
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ForecastError::InvalidGeometry {
            field,
            value,
            reason: "must be > 0",
        })
    }
}
