//! Integration tests for the forecast pipeline.

#[macro_use]
mod common;

use chrono::{NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Europe::{Moscow, Nicosia};
use chrono_tz::{Arctic, UTC};

use pv_forecast::ForecastError;
use pv_forecast::pipeline::{
    CorrectionStrategy, forecast, forecast_ideal, forecast_table, poa_series,
};
use pv_forecast::production::{LinearModel, apply_losses, degradation_at, panel_dc_w};
use pv_forecast::site::Site;

#[test]
fn nicosia_midsummer_night_and_noon() {
    let times = [
        Utc.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap(),
    ];
    let site = Site::new(35.1856, 33.3823, Nicosia).with_orientation(30.0, 180.0);
    let poa = poa_series(&site, &times).unwrap();
    assert_eq!(poa.len(), 2);
    assert_eq!(poa[0].poa_w_m2, 0.0);
    assert!(poa[1].poa_w_m2 > 0.0);
    assert!(poa.iter().all(|s| s.poa_w_m2.is_finite()));
}

#[test]
fn moscow_march_noon_has_irradiance() {
    let site = Site::new(55.7558, 37.6176, Moscow).with_orientation(30.0, 180.0);
    let t = Moscow.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let poa = poa_series(&site, &[t]).unwrap();
    assert!(poa[0].poa_w_m2 > 100.0, "poa {}", poa[0].poa_w_m2);
}

#[test]
fn reference_production_regression() {
    // POA 800 W/m² at 25 °C, then darkness at 35 °C.
    let site = common::reference_site(UTC);
    let t = UTC.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let inputs = [(800.0, 25.0), (0.0, 35.0)];

    let ac: Vec<f64> = inputs
        .iter()
        .map(|&(poa, temp)| {
            let dc_kw = panel_dc_w(poa, site.module_area_m2(), site.module_efficiency, temp, 0.0)
                * f64::from(site.panel_count)
                / 1000.0;
            let degradation =
                degradation_at(site.commissioning_date, site.degradation_rate_pct, &t);
            apply_losses(dc_kw, degradation, &site.losses)
        })
        .collect();

    assert!((ac[0] - 2.95).abs() / 2.95 < 1e-3, "ac {}", ac[0]);
    assert_eq!(ac[1], 0.0);
}

#[test]
fn full_day_is_quarter_hourly_and_non_negative() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 30.0, 20.0);
    let out = forecast(&common::nicosia_site(), &weather, CorrectionStrategy::Physical).unwrap();
    assert_eq!(out.len(), 93);
    for w in out.windows(2) {
        assert_eq!((w[1].timestamp - w[0].timestamp).num_minutes(), 15);
    }
    assert!(out.iter().all(|p| p.ac_kw.is_some_and(|v| v >= 0.0)));
    assert!(out.iter().all(|p| p.dc_kw.is_some_and(|v| v.is_finite())));
}

#[test]
fn output_is_zero_at_night_and_peaks_near_solar_noon() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let out = forecast_ideal(&common::nicosia_site(), &weather).unwrap();
    assert_eq!(out[0].ac_kw, Some(0.0));
    assert_eq!(out.last().and_then(|p| p.ac_kw), Some(0.0));

    let peak = out
        .iter()
        .max_by(|a, b| a.ac_kw.partial_cmp(&b.ac_kw).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap();
    // Solar noon in Nicosia is about 12:45 local summer time.
    assert!((11..=14).contains(&peak.timestamp.hour()), "peak at {}", peak.timestamp);
    // 4 kW nameplate at 1000 W/m², less 6.9 % of losses.
    let kw = peak.ac_kw.unwrap();
    assert!(kw > 2.5 && kw < 4.5, "peak {kw}");
}

#[test]
fn polar_night_produces_nothing() {
    let site = Site::new(78.2232, 15.6267, Arctic::Longyearbyen).with_orientation(45.0, 180.0);
    let date = NaiveDate::from_ymd_opt(2024, 12, 21).unwrap();
    let weather = common::hourly_day(Arctic::Longyearbyen, date, -10.0, 0.0);
    let table = forecast_table(&site, &weather, CorrectionStrategy::Physical).unwrap();
    assert!(table.rows.iter().all(|r| r.poa_w_m2 == Some(0.0)));
    assert!(table.rows.iter().all(|r| r.predicted_kw == Some(0.0)));
    let summary = table.summary();
    assert_eq!(summary.predicted_kwh, 0.0);
    assert_eq!(summary.peak_kw, 0.0);
    assert_eq!(summary.clear_sky_index_pct, None);
}

#[test]
fn midnight_sun_has_light_at_midnight() {
    let site = Site::new(78.2232, 15.6267, Arctic::Longyearbyen).with_orientation(0.0, 180.0);
    let t = Arctic::Longyearbyen.with_ymd_and_hms(2024, 6, 21, 0, 0, 0).unwrap();
    let poa = poa_series(&site, &[t]).unwrap();
    assert!(poa[0].poa_w_m2 > 0.0);
}

#[test]
fn below_threshold_is_zero_with_and_without_model() {
    // Just after sunrise the clear-sky POA is under 40 W/m².
    let weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let site = common::nicosia_site();
    let table = forecast_table(&site, &weather, CorrectionStrategy::Physical).unwrap();
    let dim: Vec<usize> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.poa_w_m2.is_some_and(|p| p > 0.0 && p < 40.0))
        .map(|(i, _)| i)
        .collect();
    assert!(!dim.is_empty(), "expected twilight rows");

    let absolute = LinearModel::new(vec![], vec![], 250.0).unwrap();
    let with_model = forecast(&site, &weather, CorrectionStrategy::Statistical(&absolute)).unwrap();
    for i in dim {
        assert_eq!(table.rows[i].predicted_kw, Some(0.0));
        assert_eq!(with_model[i].ac_kw, Some(0.0));
    }
}

#[test]
fn absolute_model_output_is_per_panel_watts() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let site = common::nicosia_site();
    let absolute = LinearModel::new(vec![], vec![], 250.0).unwrap();
    let out = forecast(&site, &weather, CorrectionStrategy::Statistical(&absolute)).unwrap();
    let noon = out.iter().find(|p| p.timestamp.hour() == 12).unwrap();
    // 250 W x 10 panels = 2.5 kW DC.
    assert_approx!(noon.dc_kw.unwrap(), 2.5, 1e-12);
    assert_approx!(noon.ac_kw.unwrap(), 2.5 * 0.98 * 0.95, 1e-12);
}

#[test]
fn ratio_model_uses_features() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let site = common::nicosia_site();
    // Ratio falls with cloud; with 0 % cloud the ratio is the intercept.
    let model = LinearModel::new(vec!["cloud".into()], vec![-0.005], 0.9).unwrap();
    let stat = forecast(&site, &weather, CorrectionStrategy::Statistical(&model)).unwrap();
    let rated = forecast(&site, &weather, CorrectionStrategy::None).unwrap();
    let i = 48;
    assert_approx!(stat[i].ac_kw.unwrap(), rated[i].ac_kw.unwrap() * 0.9, 1e-9);
}

#[test]
fn model_sees_zero_for_missing_temperature() {
    let mut weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    for s in &mut weather {
        s.temperature_c = None;
    }
    let site = common::nicosia_site();
    let model = LinearModel::new(vec!["temp_c".into()], vec![1.0], 0.0).unwrap();
    let out = forecast(&site, &weather, CorrectionStrategy::Statistical(&model)).unwrap();
    let noon = out.iter().find(|p| p.timestamp.hour() == 12).unwrap();
    assert_eq!(noon.dc_kw, Some(0.0));
}

#[test]
fn weather_feed_fields_without_data_keep_the_model() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let site = common::nicosia_site();
    let model = LinearModel::new(vec!["wind_kph".into()], vec![0.01], 0.5).unwrap();
    let stat = forecast(&site, &weather, CorrectionStrategy::Statistical(&model)).unwrap();
    let rated = forecast(&site, &weather, CorrectionStrategy::None).unwrap();
    let physical = forecast(&site, &weather, CorrectionStrategy::Physical).unwrap();
    let i = 48;
    assert_approx!(stat[i].ac_kw.unwrap(), rated[i].ac_kw.unwrap() * 0.5, 1e-9);
    assert!(stat[i].ac_kw.unwrap() < physical[i].ac_kw.unwrap());
}

#[test]
fn text_feature_falls_back_to_physical() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 30.0, 10.0);
    let site = common::nicosia_site();
    let model = LinearModel::new(vec!["condition_text".into()], vec![1.0], 0.5).unwrap();
    let stat = forecast(&site, &weather, CorrectionStrategy::Statistical(&model)).unwrap();
    let physical = forecast(&site, &weather, CorrectionStrategy::Physical).unwrap();
    assert_eq!(stat, physical);
}

#[test]
fn heat_and_cloud_lower_the_forecast() {
    let site = common::nicosia_site();
    let cool = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let hot = common::hourly_day(Nicosia, common::midsummer(), 35.0, 0.0);
    let cloudy = common::hourly_day(Nicosia, common::midsummer(), 25.0, 80.0);
    let energy = |w| {
        forecast_table(&site, w, CorrectionStrategy::Physical)
            .unwrap()
            .summary()
            .predicted_kwh
    };
    let (e_cool, e_hot, e_cloudy) = (energy(&cool), energy(&hot), energy(&cloudy));
    assert!(e_hot < e_cool);
    assert!(e_cloudy < e_hot);
    assert_approx!(e_cloudy / e_cool, (-0.8f64).exp(), 1e-9);
}

#[test]
fn degradation_lowers_output_over_the_years() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let fresh = common::nicosia_site();
    let aged = common::reference_site(Nicosia);
    let a = forecast_ideal(&fresh, &weather).unwrap();
    let b = forecast_ideal(&aged, &weather).unwrap();
    let i = 48;
    let ratio = b[i].ac_kw.unwrap() / a[i].ac_kw.unwrap();
    assert!(ratio < 1.0 && ratio > 0.98, "ratio {ratio}");
}

#[test]
fn runs_are_deterministic() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 28.0, 35.0);
    let site = common::nicosia_site();
    let a = forecast_table(&site, &weather, CorrectionStrategy::Physical).unwrap();
    let b = forecast_table(&site, &weather, CorrectionStrategy::Physical).unwrap();
    assert_eq!(a.rows, b.rows);
}

#[test]
fn invalid_site_is_rejected() {
    let weather = common::hourly_day(Nicosia, common::midsummer(), 25.0, 0.0);
    let site = common::nicosia_site().with_orientation(30.0, 400.0);
    assert!(matches!(
        forecast(&site, &weather, CorrectionStrategy::Physical),
        Err(ForecastError::InvalidGeometry { field: "azimuth_deg", .. })
    ));
}
