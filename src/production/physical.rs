//! Physics-based DC output of a single panel.

/// Plane-of-array irradiance below which output is zero (W/m²).
pub const THRESHOLD_W_M2: f64 = 40.0;
/// Reference cell temperature for the temperature coefficient (°C).
pub const REFERENCE_TEMPERATURE_C: f64 = 25.0;

const TEMP_COEFF_LINEAR: f64 = 0.0044;
const TEMP_COEFF_QUADRATIC: f64 = 0.0001;
const CLOUD_ATTENUATION: f64 = 1.0;

/// Irradiance that actually drives the panel: zero below the threshold or
/// when the input is not finite.
pub fn effective_irradiance(poa_w_m2: f64) -> f64 {
    if poa_w_m2.is_finite() && poa_w_m2 >= THRESHOLD_W_M2 {
        poa_w_m2
    } else {
        0.0
    }
}

/// Efficiency factor relative to 25 °C, never negative.
pub fn temperature_factor(temperature_c: f64) -> f64 {
    let dt = temperature_c - REFERENCE_TEMPERATURE_C;
    (1.0 - TEMP_COEFF_LINEAR * dt + TEMP_COEFF_QUADRATIC * dt * dt).max(0.0)
}

/// Attenuation from cloud cover in percent.
pub fn cloud_factor(cloud_pct: f64) -> f64 {
    (-CLOUD_ATTENUATION * cloud_pct / 100.0).exp()
}

/// Per-panel DC watts at rated efficiency scaled by `factor`.
pub fn rated_dc_w(poa_w_m2: f64, area_m2: f64, efficiency: f64, factor: f64) -> f64 {
    effective_irradiance(poa_w_m2) * area_m2 * efficiency * factor
}

/// Per-panel DC watts on the physical path.
pub fn panel_dc_w(
    poa_w_m2: f64,
    area_m2: f64,
    efficiency: f64,
    temperature_c: f64,
    cloud_pct: f64,
) -> f64 {
    rated_dc_w(
        poa_w_m2,
        area_m2,
        efficiency,
        temperature_factor(temperature_c) * cloud_factor(cloud_pct),
    )
}
