//! Daily energy summary computed from forecast rows.

use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::pipeline::ForecastRow;

/// Duration of one forecast step in hours.
pub const STEP_HOURS: f64 = 0.25;

/// Aggregate figures for a forecast table.
///
/// Absent values are skipped, not treated as zero output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    /// Clear-sky energy (kWh).
    pub ideal_kwh: f64,
    /// Energy under forecast conditions (kWh).
    pub predicted_kwh: f64,
    /// Highest predicted power (kW).
    pub peak_kw: f64,
    /// Timestamp of the predicted peak; `None` when nothing was predicted.
    pub peak_time: Option<DateTime<Tz>>,
    /// Predicted energy as a percentage of the clear-sky energy.
    pub clear_sky_index_pct: Option<f64>,
    /// Rows with no predicted value.
    pub missing_rows: usize,
}

impl ForecastSummary {
    pub fn from_rows(rows: &[ForecastRow]) -> Self {
        let mut ideal_kwh = 0.0;
        let mut predicted_kwh = 0.0;
        let mut peak: Option<(f64, DateTime<Tz>)> = None;
        let mut missing_rows = 0;

        for r in rows {
            if let Some(kw) = r.ideal_kw {
                ideal_kwh += kw * STEP_HOURS;
            }
            match r.predicted_kw {
                Some(kw) => {
                    predicted_kwh += kw * STEP_HOURS;
                    if peak.is_none_or(|(p, _)| kw > p) {
                        peak = Some((kw, r.timestamp));
                    }
                }
                None => missing_rows += 1,
            }
        }

        let clear_sky_index_pct = (ideal_kwh > 0.0).then(|| 100.0 * predicted_kwh / ideal_kwh);

        Self {
            ideal_kwh,
            predicted_kwh,
            peak_kw: peak.map_or(0.0, |(kw, _)| kw),
            peak_time: peak.map(|(_, t)| t),
            clear_sky_index_pct,
            missing_rows,
        }
    }
}

impl fmt::Display for ForecastSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Forecast Summary ---")?;
        writeln!(f, "Ideal energy:      {:.2} kWh", self.ideal_kwh)?;
        writeln!(f, "Predicted energy:  {:.2} kWh", self.predicted_kwh)?;
        match self.peak_time {
            Some(t) => writeln!(
                f,
                "Peak power:        {:.3} kW at {}",
                self.peak_kw,
                t.format("%H:%M")
            )?,
            None => writeln!(f, "Peak power:        -")?,
        }
        if let Some(pct) = self.clear_sky_index_pct {
            writeln!(f, "Clear-sky index:   {pct:.1}%")?;
        }
        if self.missing_rows > 0 {
            writeln!(f, "Missing rows:      {}", self.missing_rows)?;
        }
        Ok(())
    }
}
