//! Solar geometry, clear-sky irradiance and plane-of-array transposition.

/// Ineichen-Perez clear-sky model.
pub mod clearsky;
/// NOAA solar position algorithm.
pub mod position;
/// Isotropic-sky plane-of-array transposition.
pub mod transposition;

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use serde::Serialize;

use crate::site::Site;

pub use clearsky::{ClearSky, ineichen};
pub use position::{SolarPosition, solar_position};
pub use transposition::plane_of_array;

/// Default Linke turbidity for a clear continental atmosphere.
pub const DEFAULT_LINKE_TURBIDITY: f64 = 3.0;
/// Default ground albedo.
pub const DEFAULT_ALBEDO: f64 = 0.25;

/// Atmosphere and ground parameters for the clear-sky model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyParams {
    /// Linke turbidity factor.
    pub linke_turbidity: f64,
    /// Ground reflectance (0.0-1.0).
    pub albedo: f64,
}

impl Default for SkyParams {
    fn default() -> Self {
        Self {
            linke_turbidity: DEFAULT_LINKE_TURBIDITY,
            albedo: DEFAULT_ALBEDO,
        }
    }
}

/// Clear-sky irradiance on the site's panel plane at one timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct IrradianceSample {
    pub timestamp: DateTime<Tz>,
    /// Apparent (refraction-corrected) zenith in degrees.
    pub zenith_deg: f64,
    /// Sun azimuth in degrees from north.
    pub azimuth_deg: f64,
    pub dni_w_m2: f64,
    pub ghi_w_m2: f64,
    pub dhi_w_m2: f64,
    /// Plane-of-array global irradiance; exactly 0 when the sun is down.
    pub poa_w_m2: f64,
}

/// Computes clear-sky irradiance for a single timestamp.
pub fn irradiance_at(site: &Site, timestamp: DateTime<Tz>) -> IrradianceSample {
    let sun = solar_position(site.latitude, site.longitude, &timestamp);
    let sky = ineichen(
        sun.apparent_zenith_deg,
        site.altitude_m,
        timestamp.ordinal(),
        site.sky.linke_turbidity,
    );
    let poa = plane_of_array(&sky, &sun, site.tilt_deg, site.azimuth_deg, site.sky.albedo);
    IrradianceSample {
        timestamp,
        zenith_deg: sun.apparent_zenith_deg,
        azimuth_deg: sun.azimuth_deg,
        dni_w_m2: sky.dni,
        ghi_w_m2: sky.ghi,
        dhi_w_m2: sky.dhi,
        poa_w_m2: poa,
    }
}

/// Computes clear-sky irradiance for every timestamp, converted to the
/// site's time zone.
pub fn irradiance_series<Z: chrono::TimeZone>(
    site: &Site,
    times: &[DateTime<Z>],
) -> Vec<IrradianceSample> {
    times
        .iter()
        .map(|t| irradiance_at(site, t.with_timezone(&site.timezone)))
        .collect()
}
