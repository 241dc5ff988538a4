//! Degradation and balance-of-system losses.

use chrono::{DateTime, NaiveDate, TimeZone};
use tracing::warn;

/// Average Julian year length used for degradation ageing.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Fixed multiplicative losses between panel DC output and grid AC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossFactors {
    /// Wiring and mismatch losses along the string (0.0-1.0).
    pub string_loss_factor: f64,
    /// Inverter DC-to-AC conversion efficiency (0.0-1.0).
    pub inverter_efficiency: f64,
}

impl Default for LossFactors {
    fn default() -> Self {
        Self {
            string_loss_factor: 0.98,
            inverter_efficiency: 0.95,
        }
    }
}

impl LossFactors {
    /// Combined system loss multiplier.
    pub fn combined(&self) -> f64 {
        self.string_loss_factor * self.inverter_efficiency
    }
}

/// Fractional years between local midnight of `commissioned` and `at`.
///
/// Negative when `at` precedes commissioning. Returns 0.0 if local midnight
/// cannot be resolved in the time zone.
pub fn years_elapsed<Tz: TimeZone>(commissioned: NaiveDate, at: &DateTime<Tz>) -> f64 {
    let tz = at.timezone();
    let Some(start) = commissioned
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
    else {
        warn!(%commissioned, "commissioning midnight does not exist locally; no ageing applied");
        return 0.0;
    };
    let seconds = at.clone().signed_duration_since(start).num_seconds() as f64;
    seconds / 86_400.0 / DAYS_PER_YEAR
}

/// Output multiplier after `years` of degradation at `rate_pct` percent per year.
///
/// Exactly 1.0 at zero years. Dates before commissioning give a multiplier
/// above 1, which is accepted as-is.
pub fn degradation_multiplier(rate_pct: f64, years: f64) -> f64 {
    if years == 0.0 || rate_pct == 0.0 {
        return 1.0;
    }
    (1.0 - rate_pct / 100.0).powf(years)
}

/// Degradation multiplier at `at` for an optional commissioning date.
///
/// No commissioning date means no degradation.
pub fn degradation_at<Tz: TimeZone>(
    commissioned: Option<NaiveDate>,
    rate_pct: f64,
    at: &DateTime<Tz>,
) -> f64 {
    commissioned.map_or(1.0, |date| degradation_multiplier(rate_pct, years_elapsed(date, at)))
}

/// AC power from DC power, floored at zero.
pub fn apply_losses(dc: f64, degradation: f64, losses: &LossFactors) -> f64 {
    (dc * degradation * losses.combined()).max(0.0)
}
