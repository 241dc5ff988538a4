//! Forecast orchestration: weather + site geometry -> power series.
//!
//! Every entry point runs the same stages:
//!
//! 1. validate the [`Site`]
//! 2. normalize the weather onto a quarter-hour grid in the site time zone
//! 3. clear-sky irradiance on the panel plane for every grid timestamp
//! 4. per-panel DC from the selected [`CorrectionStrategy`]
//! 5. array DC, degradation and losses -> AC
//!
//! NaN and infinity never leave this module; they become `None`.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{ForecastError, Result};
use crate::production::model::statistical_panel_dc_w;
use crate::production::physical::{panel_dc_w, rated_dc_w};
use crate::production::{RegressionModel, apply_losses, degradation_at};
use crate::site::Site;
use crate::solar::{IrradianceSample, irradiance_series};
use crate::summary::ForecastSummary;
use crate::weather::{
    DEFAULT_CLOUD_PCT, DEFAULT_TEMPERATURE_C, WeatherRow, WeatherSample, normalize,
};

/// Where the weather for a target day comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Weather forecast for today or a future day.
    Forecast,
    /// Observed weather for a past day.
    History,
}

impl DataSource {
    /// Forecast for `target >= today`, history otherwise.
    pub fn for_date(target: NaiveDate, today: NaiveDate) -> Self {
        if target >= today {
            Self::Forecast
        } else {
            Self::History
        }
    }
}

/// How clear-sky output is corrected for the actual conditions.
#[derive(Clone, Copy)]
pub enum CorrectionStrategy<'a> {
    /// Uncorrected clear-sky output at rated efficiency.
    None,
    /// Temperature and cloud factors.
    Physical,
    /// A trained regression model.
    Statistical(&'a dyn RegressionModel),
}

impl<'a> CorrectionStrategy<'a> {
    /// Default strategy for a data source: forecast days use the physical
    /// path, history days use the model when one is available.
    pub fn for_source(source: DataSource, model: Option<&'a dyn RegressionModel>) -> Self {
        match (source, model) {
            (DataSource::History, Some(m)) => Self::Statistical(m),
            _ => Self::Physical,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Physical => "physical",
            Self::Statistical(_) => "statistical",
        }
    }
}

impl fmt::Debug for CorrectionStrategy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statistical(m) => f
                .debug_tuple("Statistical")
                .field(&m.feature_names())
                .finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Rejects targets more than `max_days_ahead` days after `today`.
///
/// # Errors
///
/// Returns [`ForecastError::HorizonExceeded`].
pub fn check_horizon(target: NaiveDate, today: NaiveDate, max_days_ahead: i64) -> Result<()> {
    let requested = (target - today).num_days();
    if requested > max_days_ahead {
        return Err(ForecastError::HorizonExceeded {
            max_days: max_days_ahead,
            requested,
        });
    }
    Ok(())
}

/// Array output at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSample {
    pub timestamp: DateTime<Tz>,
    /// Array DC before degradation and losses (kW).
    pub dc_kw: Option<f64>,
    /// AC after degradation, string losses and inverter (kW).
    pub ac_kw: Option<f64>,
}

/// One row of the combined forecast table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub timestamp: DateTime<Tz>,
    pub poa_w_m2: Option<f64>,
    pub temperature_c: Option<f64>,
    pub cloud_pct: Option<f64>,
    /// Clear-sky AC output at 25 °C (kW).
    pub ideal_kw: Option<f64>,
    /// AC output under the forecast conditions (kW).
    pub predicted_kw: Option<f64>,
}

impl fmt::Display for ForecastRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | poa={:>7} W/m2  temp={:>6} C  cloud={:>5} % | ideal={:>7} kW  predicted={:>7} kW",
            self.timestamp.format("%Y-%m-%d %H:%M %Z"),
            fmt_opt(self.poa_w_m2, 1),
            fmt_opt(self.temperature_c, 1),
            fmt_opt(self.cloud_pct, 0),
            fmt_opt(self.ideal_kw, 3),
            fmt_opt(self.predicted_kw, 3),
        )
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

/// Forecast rows plus the strategy that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastTable {
    pub strategy: &'static str,
    pub rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn summary(&self) -> ForecastSummary {
        ForecastSummary::from_rows(&self.rows)
    }
}

/// Power forecast for the weather series.
///
/// # Errors
///
/// Returns [`ForecastError::InvalidGeometry`] for an invalid site and
/// [`ForecastError::EmptyWeatherSeries`] when there is no weather.
pub fn forecast(
    site: &Site,
    weather: &[WeatherSample],
    strategy: CorrectionStrategy<'_>,
) -> Result<Vec<PowerSample>> {
    let (rows, irradiance) = prepare(site, weather)?;
    let dc_w = panel_dc_series(site, &rows, &irradiance, strategy);
    Ok(power_samples(site, &irradiance, &dc_w))
}

/// Clear-sky variant: temperature fixed at 25 °C and no cloud.
pub fn forecast_ideal(site: &Site, weather: &[WeatherSample]) -> Result<Vec<PowerSample>> {
    let (_, irradiance) = prepare(site, weather)?;
    let dc_w = ideal_dc_series(site, &irradiance);
    Ok(power_samples(site, &irradiance, &dc_w))
}

/// Ideal and predicted output side by side with the driving conditions.
pub fn forecast_table(
    site: &Site,
    weather: &[WeatherSample],
    strategy: CorrectionStrategy<'_>,
) -> Result<ForecastTable> {
    let (rows, irradiance) = prepare(site, weather)?;
    let ideal = power_samples(site, &irradiance, &ideal_dc_series(site, &irradiance));
    let predicted = power_samples(
        site,
        &irradiance,
        &panel_dc_series(site, &rows, &irradiance, strategy),
    );

    let rows = rows
        .iter()
        .zip(&irradiance)
        .zip(ideal.iter().zip(&predicted))
        .map(|((row, irr), (ideal, predicted))| ForecastRow {
            timestamp: irr.timestamp,
            poa_w_m2: sanitize("poa_w_m2", irr.poa_w_m2, &irr.timestamp),
            temperature_c: row.sample.temperature_c,
            cloud_pct: row.sample.cloud_pct,
            ideal_kw: ideal.ac_kw,
            predicted_kw: predicted.ac_kw,
        })
        .collect();

    Ok(ForecastTable {
        strategy: strategy.name(),
        rows,
    })
}

/// Clear-sky irradiance on the panel plane, for diagnostics.
///
/// # Errors
///
/// Returns [`ForecastError::InvalidGeometry`] for an invalid site.
pub fn poa_series<Z: chrono::TimeZone>(
    site: &Site,
    timestamps: &[DateTime<Z>],
) -> Result<Vec<IrradianceSample>> {
    site.validate()?;
    Ok(irradiance_series(site, timestamps))
}

fn prepare(
    site: &Site,
    weather: &[WeatherSample],
) -> Result<(Vec<WeatherRow>, Vec<IrradianceSample>)> {
    site.validate()?;
    let local: Vec<WeatherSample> = weather
        .iter()
        .map(|s| WeatherSample {
            timestamp: s.timestamp.with_timezone(&site.timezone),
            ..s.clone()
        })
        .collect();
    let rows = normalize(&local)?;
    let timestamps: Vec<DateTime<Tz>> = rows.iter().map(WeatherRow::timestamp).collect();
    let irradiance = irradiance_series(site, &timestamps);
    debug!(
        samples = weather.len(),
        rows = rows.len(),
        daylight = irradiance.iter().filter(|i| i.poa_w_m2 > 0.0).count(),
        "prepared forecast inputs"
    );
    Ok((rows, irradiance))
}

/// Per-panel DC watts from the correction strategy.
fn panel_dc_series(
    site: &Site,
    rows: &[WeatherRow],
    irradiance: &[IrradianceSample],
    strategy: CorrectionStrategy<'_>,
) -> Vec<Option<f64>> {
    let area = site.module_area_m2();
    let eff = site.module_efficiency;
    match strategy {
        CorrectionStrategy::None => irradiance
            .iter()
            .map(|irr| Some(rated_dc_w(irr.poa_w_m2, area, eff, 1.0)))
            .collect(),
        CorrectionStrategy::Physical => physical_dc_series(site, rows, irradiance),
        CorrectionStrategy::Statistical(model) => {
            match statistical_panel_dc_w(model, rows, irradiance, area, eff) {
                Ok(dc) => dc,
                Err(err) => {
                    warn!(%err, "model unusable; falling back to physical correction");
                    physical_dc_series(site, rows, irradiance)
                }
            }
        }
    }
}

fn physical_dc_series(
    site: &Site,
    rows: &[WeatherRow],
    irradiance: &[IrradianceSample],
) -> Vec<Option<f64>> {
    rows.iter()
        .zip(irradiance)
        .map(|(row, irr)| {
            Some(panel_dc_w(
                irr.poa_w_m2,
                site.module_area_m2(),
                site.module_efficiency,
                row.sample.temperature_or_default(),
                row.sample.cloud_or_default(),
            ))
        })
        .collect()
}

fn ideal_dc_series(site: &Site, irradiance: &[IrradianceSample]) -> Vec<Option<f64>> {
    irradiance
        .iter()
        .map(|irr| {
            Some(panel_dc_w(
                irr.poa_w_m2,
                site.module_area_m2(),
                site.module_efficiency,
                DEFAULT_TEMPERATURE_C,
                DEFAULT_CLOUD_PCT,
            ))
        })
        .collect()
}

/// Scales per-panel DC to the array and applies degradation and losses.
fn power_samples(
    site: &Site,
    irradiance: &[IrradianceSample],
    panel_dc_w: &[Option<f64>],
) -> Vec<PowerSample> {
    let panels = f64::from(site.panel_count);
    irradiance
        .iter()
        .zip(panel_dc_w)
        .map(|(irr, dc_w)| {
            let ts = &irr.timestamp;
            let dc_kw = dc_w.and_then(|w| sanitize("dc_kw", w * panels / 1000.0, ts));
            let ac_kw = dc_kw.and_then(|dc| {
                let degradation =
                    degradation_at(site.commissioning_date, site.degradation_rate_pct, ts);
                sanitize("ac_kw", apply_losses(dc, degradation, &site.losses), ts)
            });
            PowerSample {
                timestamp: irr.timestamp,
                dc_kw,
                ac_kw,
            }
        })
        .collect()
}

/// Converts a non-finite output value into the absent marker.
fn sanitize(field: &'static str, value: f64, timestamp: &DateTime<Tz>) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        let err = ForecastError::NonFiniteResult { field };
        trace!(%timestamp, %err, "dropping value");
        None
    }
}
