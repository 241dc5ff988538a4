//! Plane-of-array transposition with an isotropic sky.

use super::clearsky::ClearSky;
use super::position::SolarPosition;

/// Irradiance components on the tilted panel surface (W/m²).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoaComponents {
    /// Direct beam projected on the panel.
    pub beam: f64,
    /// Diffuse light from the sky dome.
    pub sky_diffuse: f64,
    /// Light reflected from the ground.
    pub ground_reflected: f64,
}

impl PoaComponents {
    pub fn total(&self) -> f64 {
        self.beam + self.sky_diffuse + self.ground_reflected
    }
}

/// Cosine of the angle of incidence between sun rays and the panel normal.
///
/// # Arguments
///
/// * `zenith_deg` - Sun zenith angle
/// * `azimuth_deg` - Sun azimuth (0 = N, 180 = S)
/// * `tilt_deg` - Panel tilt from horizontal
/// * `panel_azimuth_deg` - Direction the panel faces (0 = N, 180 = S)
pub fn aoi_cosine(zenith_deg: f64, azimuth_deg: f64, tilt_deg: f64, panel_azimuth_deg: f64) -> f64 {
    let z = zenith_deg.to_radians();
    let tilt = tilt_deg.to_radians();
    let cos_aoi = z.cos() * tilt.cos()
        + z.sin() * tilt.sin() * (azimuth_deg - panel_azimuth_deg).to_radians().cos();
    cos_aoi.clamp(-1.0, 1.0)
}

/// Isotropic-sky transposition of clear-sky components onto the panel.
pub fn isotropic(
    sky: &ClearSky,
    sun: &SolarPosition,
    tilt_deg: f64,
    panel_azimuth_deg: f64,
    albedo: f64,
) -> PoaComponents {
    let cos_aoi = aoi_cosine(sun.zenith_deg, sun.azimuth_deg, tilt_deg, panel_azimuth_deg);
    let cos_tilt = tilt_deg.to_radians().cos();
    PoaComponents {
        beam: sky.dni * cos_aoi.max(0.0),
        sky_diffuse: sky.dhi * (1.0 + cos_tilt) / 2.0,
        ground_reflected: sky.ghi * albedo * (1.0 - cos_tilt) / 2.0,
    }
}

/// Global plane-of-array irradiance with the night and sanity policy applied.
///
/// Returns exactly `0.0` when the sun is below the horizon or the
/// transposition yields a non-finite value; otherwise the total clamped to
/// be non-negative.
pub fn plane_of_array(
    sky: &ClearSky,
    sun: &SolarPosition,
    tilt_deg: f64,
    panel_azimuth_deg: f64,
    albedo: f64,
) -> f64 {
    if !sun.is_above_horizon() {
        return 0.0;
    }
    let poa = isotropic(sky, sun, tilt_deg, panel_azimuth_deg, albedo).total();
    if poa.is_finite() { poa.max(0.0) } else { 0.0 }
}
