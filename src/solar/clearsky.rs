//! Ineichen-Perez clear-sky irradiance model.
//!
//! References:
//! - Ineichen, P. and Perez, R. (2002). "A new airmass independent formulation
//!   for the Linke turbidity coefficient"
//! - Kasten, F. and Young, A. T. (1989). "Revised optical air mass tables and
//!   approximation formula"

use std::f64::consts::PI;

/// Solar constant in W/m².
const SOLAR_CONSTANT: f64 = 1366.1;

/// Clear-sky irradiance components in W/m².
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearSky {
    /// Direct normal irradiance.
    pub dni: f64,
    /// Global horizontal irradiance.
    pub ghi: f64,
    /// Diffuse horizontal irradiance.
    pub dhi: f64,
}

/// Extraterrestrial normal irradiance for a day of year (Spencer, 1971).
pub fn extraterrestrial_irradiance(day_of_year: u32) -> f64 {
    let b = 2.0 * PI * (f64::from(day_of_year) - 1.0) / 365.0;
    let correction = 1.000_11
        + 0.034_221 * b.cos()
        + 0.001_28 * b.sin()
        + 0.000_719 * (2.0 * b).cos()
        + 0.000_077 * (2.0 * b).sin();
    SOLAR_CONSTANT * correction
}

/// Relative optical air mass (Kasten-Young, 1989).
///
/// Returns `None` when the sun is at or below the horizon.
pub fn relative_air_mass(zenith_deg: f64) -> Option<f64> {
    if !(zenith_deg.is_finite() && zenith_deg < 90.0) {
        return None;
    }
    let correction = 0.505_72 * (96.079_95 - zenith_deg).powf(-1.6364);
    Some(1.0 / (zenith_deg.to_radians().cos() + correction))
}

/// Station pressure relative to sea level from altitude (ISA).
pub fn pressure_ratio(altitude_m: f64) -> f64 {
    let pressure_pa = 100.0 * ((44_331.514 - altitude_m) / 11_880.516).powf(1.0 / 0.190_263_2);
    pressure_pa / 101_325.0
}

/// Clear-sky DNI, GHI and DHI for an apparent zenith angle.
///
/// All components are zero when the sun is at or below the horizon. DHI is
/// derived as `GHI - DNI * cos(zenith)` so the three values are consistent.
///
/// # Arguments
///
/// * `apparent_zenith_deg` - Refraction-corrected zenith angle
/// * `altitude_m` - Site altitude above sea level
/// * `day_of_year` - Day of year (1-366)
/// * `linke_turbidity` - Linke turbidity factor (2-7 typical)
pub fn ineichen(
    apparent_zenith_deg: f64,
    altitude_m: f64,
    day_of_year: u32,
    linke_turbidity: f64,
) -> ClearSky {
    let Some(am_rel) = relative_air_mass(apparent_zenith_deg) else {
        return ClearSky::default();
    };
    let cos_zenith = apparent_zenith_deg.to_radians().cos();
    if cos_zenith <= 0.0 {
        return ClearSky::default();
    }

    let altitude = altitude_m.clamp(-500.0, 11_000.0);
    let am = am_rel * pressure_ratio(altitude);
    let tl = linke_turbidity.max(1.0);
    let i0 = extraterrestrial_irradiance(day_of_year);

    let fh1 = (-altitude / 8000.0).exp();
    let fh2 = (-altitude / 1250.0).exp();
    let cg1 = 5.09e-5 * altitude + 0.868;
    let cg2 = 3.92e-5 * altitude + 0.0387;

    let ghi = cg1 * i0 * cos_zenith * (-cg2 * am * (fh1 + fh2 * (tl - 1.0))).exp().max(0.0);

    let b = 0.664 + 0.163 / fh1;
    let bnci = i0 * (b * (-0.09 * am * (tl - 1.0)).exp()).max(0.0);
    let beam_fraction = 1.0 - (0.1 - 0.2 * (-tl).exp()) / (0.1 + 0.882 / fh1);
    let bnci_ghi = ghi * (beam_fraction / cos_zenith).max(0.0);
    let dni = bnci.min(bnci_ghi);
    let dhi = (ghi - dni * cos_zenith).max(0.0);

    ClearSky { dni, ghi, dhi }
}
