//! PV forecast entry point: CLI wiring and config-driven pipeline construction.

use std::io;
use std::process;
use std::sync::Arc;

use chrono::Local;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use pv_forecast::catalog::{self, ModelStore, SiteCatalog, Stores};
use pv_forecast::cli::{self, CliOptions, Command, SiteSource};
use pv_forecast::config::ForecastConfig;
use pv_forecast::error::{ForecastError, Result};
use pv_forecast::io::export::{export_csv, export_json, write_json};
use pv_forecast::io::weather_csv::load_weather_csv;
use pv_forecast::pipeline::{CorrectionStrategy, DataSource, check_horizon, forecast_table};
use pv_forecast::production::{LinearModel, RegressionModel};
use pv_forecast::site::Site;

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging unavailable: {e}");
    }
}

fn load_config(opts: &CliOptions) -> Result<ForecastConfig> {
    let mut cfg = match &opts.source {
        SiteSource::Config(path) => ForecastConfig::from_toml_file(path)?,
        SiteSource::Preset(name) => ForecastConfig::from_preset(name)?,
        SiteSource::Catalog { .. } => ForecastConfig::default(),
    };
    if let Some(seed) = opts.seed {
        cfg.synthetic.seed = seed;
    }

    let mut errors = cfg.validate();
    for e in &errors {
        error!("{e}");
    }
    if !errors.is_empty() {
        return Err(errors.swap_remove(0).into());
    }
    Ok(cfg)
}

/// Resolves the site and, in catalog mode, the tag's model.
fn resolve_site(
    opts: &CliOptions,
    cfg: &ForecastConfig,
) -> Result<(Site, Option<Arc<dyn RegressionModel>>)> {
    let base = cfg.to_site()?;
    let SiteSource::Catalog { csv, tag } = &opts.source else {
        return Ok((base, None));
    };

    let models = match &opts.models_dir {
        Some(dir) => ModelStore::load_dir(dir, opts.fallback_model.as_deref())?,
        None => ModelStore::new(),
    };
    let stores = catalog::install(Stores {
        sites: SiteCatalog::from_csv_file(csv, base.timezone)?,
        models,
    });
    let site = stores.sites.get(tag)?.with_losses(base.losses).with_sky(base.sky);
    Ok((site, stores.models.get(tag)))
}

fn run(opts: &CliOptions) -> Result<()> {
    let today = opts.today.unwrap_or_else(|| Local::now().date_naive());
    let target = opts.date.unwrap_or(today);

    let cfg = load_config(opts)?;
    check_horizon(target, today, cfg.forecast.max_days_ahead)?;
    let (site, catalog_model) = resolve_site(opts, &cfg)?;

    let model: Option<Arc<dyn RegressionModel>> = match &opts.model {
        Some(path) => Some(Arc::new(LinearModel::from_json_file(path)?)),
        None => catalog_model,
    };

    let weather = match &opts.weather {
        Some(path) => load_weather_csv(path, site.timezone)?,
        None => {
            debug!(%target, "no weather file; generating synthetic day");
            cfg.synthetic_weather().generate(target, site.timezone)
        }
    };

    let source = DataSource::for_date(target, today);
    let strategy = match cfg.forecast.correction.as_str() {
        "none" => CorrectionStrategy::None,
        "physical" => CorrectionStrategy::Physical,
        _ => CorrectionStrategy::for_source(source, model.as_deref()),
    };
    info!(
        %target,
        ?source,
        strategy = strategy.name(),
        panels = site.panel_count,
        "running forecast"
    );

    let table = forecast_table(&site, &weather, strategy)?;

    if opts.json {
        write_json(&table, io::stdout().lock())?;
    } else {
        for r in &table.rows {
            println!("{r}");
        }
        println!("\n{}", table.summary());
    }

    if let Some(path) = &opts.out {
        if path.extension().is_some_and(|e| e == "json") {
            export_json(&table, path)?;
        } else {
            export_csv(&table.rows, path)?;
        }
        eprintln!("Forecast written to {}", path.display());
    }
    Ok(())
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            cli::print_usage();
            return;
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };

    setup_logging(opts.verbose);

    if let Err(e) = run(&opts) {
        error!("{e}");
        let code = match e {
            ForecastError::Config(_)
            | ForecastError::HorizonExceeded { .. }
            | ForecastError::UnknownTag(_) => 2,
            _ => 1,
        };
        process::exit(code);
    }
}
