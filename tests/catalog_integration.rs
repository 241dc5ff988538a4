//! Catalog, model store and process-wide store installation.

#[macro_use]
mod common;

use chrono_tz::{Europe, UTC};

use pv_forecast::ForecastError;
use pv_forecast::catalog::{self, ModelStore, SiteCatalog, Stores};
use pv_forecast::io::weather_csv::load_weather_csv;
use pv_forecast::pipeline::{CorrectionStrategy, forecast_table};

fn sample_catalog() -> SiteCatalog {
    SiteCatalog::from_csv_file(&common::data_path("tag_spec.csv"), UTC).unwrap()
}

fn sample_models() -> ModelStore {
    ModelStore::load_dir(&common::data_path("models"), Some("nicosia/roof-a")).unwrap()
}

#[test]
fn catalog_resolves_sample_sites() {
    let sites = sample_catalog();
    assert_eq!(sites.len(), 3);
    let tags: Vec<String> = sites.tags().into_iter().map(|t| t.tag).collect();
    assert_eq!(tags, ["nicosia/roof-a", "nicosia/carport", "moscow/yard"]);

    let roof = sites.get("nicosia/roof-a").unwrap();
    assert_eq!(roof.timezone, Europe::Nicosia);
    assert_eq!(roof.panel_count, 24);
    assert_approx!(roof.module_efficiency, 0.213, 1e-12);
    assert_approx!(roof.module_area_m2(), 1.722 * 1.134, 1e-12);
    assert_eq!(roof.degradation_rate_pct, 0.5);

    let yard = sites.get("moscow/yard").unwrap();
    assert_eq!(yard.timezone, Europe::Moscow);
    assert_approx!(yard.module_efficiency, 0.177, 1e-12);
    assert_eq!(yard.commissioning_date, None);
    assert_eq!(yard.degradation_rate_pct, 0.0);
}

#[test]
fn unknown_tag_is_reported() {
    assert!(matches!(
        sample_catalog().get("nowhere/none"),
        Err(ForecastError::UnknownTag(tag)) if tag == "nowhere/none"
    ));
}

#[test]
fn model_store_falls_back_for_tags_without_model() {
    let store = sample_models();
    assert_eq!(store.len(), 2);
    let own = store.get("nicosia/carport").unwrap();
    assert_eq!(own.feature_names(), ["radiation_w_m2_y", "cloud"]);
    let fallback = store.get("moscow/yard").unwrap();
    assert_eq!(fallback.feature_names().len(), 4);
}

#[test]
fn ratio_model_stays_below_clear_sky() {
    let site = sample_catalog().get("nicosia/roof-a").unwrap();
    let model = sample_models().get("nicosia/roof-a").unwrap();
    let weather_path = common::data_path("weather_nicosia_2024-06-21.csv");
    let weather = load_weather_csv(&weather_path, site.timezone).unwrap();

    let strategy = CorrectionStrategy::Statistical(model.as_ref());
    let table = forecast_table(&site, &weather, strategy).unwrap();
    assert_eq!(table.strategy, "statistical");
    assert_eq!(table.rows.len(), 93);

    let summary = table.summary();
    assert_eq!(summary.missing_rows, 0);
    assert!(summary.predicted_kwh > 0.0);
    assert!(summary.predicted_kwh < summary.ideal_kwh);
    for r in &table.rows {
        assert!(r.predicted_kw.unwrap() <= r.ideal_kw.unwrap() + 1e-9, "{r}");
    }
}

#[test]
fn absolute_model_yields_per_panel_watts() {
    let site = sample_catalog().get("nicosia/carport").unwrap();
    let model = sample_models().get("nicosia/carport").unwrap();
    let weather_path = common::data_path("weather_nicosia_2024-06-21.csv");
    let weather = load_weather_csv(&weather_path, site.timezone).unwrap();

    let strategy = CorrectionStrategy::Statistical(model.as_ref());
    let table = forecast_table(&site, &weather, strategy).unwrap();
    let night = &table.rows[0];
    assert_eq!(night.predicted_kw, Some(0.0));
    let peak = table.summary().peak_kw;
    // 40 panels at a few hundred watts each.
    assert!(peak > 5.0 && peak < 20.0, "peak {peak}");
}

#[test]
fn stores_install_once() {
    let first = catalog::install(Stores {
        sites: sample_catalog(),
        models: sample_models(),
    });
    let second = catalog::install(Stores {
        sites: SiteCatalog::from_csv_reader("tag\n".as_bytes(), UTC).unwrap(),
        models: ModelStore::new(),
    });

    assert_eq!(second.sites.len(), first.sites.len());
    assert_eq!(second.models.len(), 2);
    let installed = catalog::installed().unwrap();
    assert!(installed.sites.get("moscow/yard").is_ok());
}
