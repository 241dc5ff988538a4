//! Load-once site and model stores keyed by installation tag.
//!
//! Both stores are immutable after loading and shared through [`Arc`].
//! A process-wide instance can be installed once with [`install`]; replacing
//! the data requires a new process.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ForecastError, Result};
use crate::production::{LinearModel, RegressionModel};
use crate::site::Site;

/// Module efficiency assumed when a record has none (%).
pub const DEFAULT_MODULE_EFFICIENCY_PCT: f64 = 17.7;
/// Suffix of model files in a model directory.
pub const MODEL_FILE_SUFFIX: &str = "_model.json";

/// Tag listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_type: Option<String>,
}

/// Site specifications read from a tag-specification CSV.
///
/// Column names are trimmed and lower-cased. Recognized columns:
/// `tag` (required), `tag_type`, `latitude`, `longitude`, `altitude`,
/// `timezone`, `tilt` (default 0), `azimuth` (default 180),
/// `module_length` (or `module_height`), `module_width` (mm),
/// `module_efficiency` (%, default 17.7), `total_panels`,
/// `commissioning_date` (`YYYY-MM-DD`) and `degradation_rate` (%/year,
/// default 0). Records are converted to a [`Site`] on lookup.
#[derive(Debug, Clone)]
pub struct SiteCatalog {
    records: Vec<HashMap<String, String>>,
    default_timezone: Tz,
}

impl SiteCatalog {
    /// Loads a catalog from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid CSV, or
    /// has no `tag` column.
    pub fn from_csv_file(path: &Path, default_timezone: Tz) -> Result<Self> {
        let file = File::open(path)?;
        let catalog = Self::from_csv_reader(io::BufReader::new(file), default_timezone)?;
        info!(path = %path.display(), records = catalog.len(), "loaded tag specifications");
        Ok(catalog)
    }

    /// Loads a catalog from any CSV source.
    pub fn from_csv_reader(reader: impl Read, default_timezone: Tz) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_lowercase).collect();
        if !headers.iter().any(|h| h == "tag") {
            return Err(ConfigError::new("catalog", "missing required \"tag\" column").into());
        }

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let record: HashMap<String, String> = headers
                .iter()
                .zip(row.iter())
                .filter(|(_, v)| !v.is_empty())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect();
            records.push(record);
        }
        Ok(Self {
            records,
            default_timezone,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lists all tags in file order.
    pub fn tags(&self) -> Vec<TagInfo> {
        self.records
            .iter()
            .filter_map(|r| {
                r.get("tag").map(|tag| TagInfo {
                    tag: tag.clone(),
                    tag_type: r.get("tag_type").cloned(),
                })
            })
            .collect()
    }

    /// Builds the site for `tag`; the first matching record wins.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::UnknownTag`] if no record matches,
    /// [`ForecastError::Config`] for missing or malformed fields, and
    /// [`ForecastError::InvalidGeometry`] from site validation.
    pub fn get(&self, tag: &str) -> Result<Site> {
        let record = self
            .records
            .iter()
            .find(|r| r.get("tag").is_some_and(|t| t == tag));
        let Some(record) = record else {
            warn!(tag, "no specification found");
            return Err(ForecastError::UnknownTag(tag.to_string()));
        };
        let site = site_from_record(record, self.default_timezone)?;
        site.validate()?;
        debug!(tag, panels = site.panel_count, "resolved site");
        Ok(site)
    }
}

fn site_from_record(r: &HashMap<String, String>, default_timezone: Tz) -> Result<Site> {
    let latitude = required(r, "latitude")?;
    let longitude = required(r, "longitude")?;
    let timezone = match r.get("timezone") {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| ConfigError::new("timezone", format!("unknown time zone \"{name}\"")))?,
        None => default_timezone,
    };
    let length = match number(r, "module_length")? {
        Some(v) => v,
        None => required(r, "module_height")
            .map_err(|_| ConfigError::new("module_length", "missing module dimensions"))?,
    };
    let width = required(r, "module_width")?;
    let efficiency_pct = number(r, "module_efficiency")?.unwrap_or(DEFAULT_MODULE_EFFICIENCY_PCT);
    let panels = required(r, "total_panels")?;
    if panels.fract() != 0.0 || panels < 0.0 || panels > f64::from(u32::MAX) {
        let message = format!("not a panel count: {panels}");
        return Err(ConfigError::new("total_panels", message).into());
    }
    let commissioning = r
        .get("commissioning_date")
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| ConfigError::new("commissioning_date", format!("\"{s}\": {e}")))
        })
        .transpose()?;

    Ok(Site::new(latitude, longitude, timezone)
        .with_altitude(number(r, "altitude")?.unwrap_or(0.0))
        .with_orientation(
            number(r, "tilt")?.unwrap_or(0.0),
            number(r, "azimuth")?.unwrap_or(180.0),
        )
        .with_module(length, width, efficiency_pct / 100.0)
        .with_panel_count(panels as u32)
        .with_degradation(commissioning, number(r, "degradation_rate")?.unwrap_or(0.0)))
}

fn number(r: &HashMap<String, String>, key: &str) -> std::result::Result<Option<f64>, ConfigError> {
    r.get(key)
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| ConfigError::new(key, format!("not a number: \"{s}\"")))
        })
        .transpose()
}

fn required(r: &HashMap<String, String>, key: &str) -> std::result::Result<f64, ConfigError> {
    number(r, key)?.ok_or_else(|| ConfigError::new(key, "missing value"))
}

/// File name of the model for `tag`: `/` becomes `_`, suffixed `_model.json`.
pub fn model_file_name(tag: &str) -> String {
    format!("{}{MODEL_FILE_SUFFIX}", model_key(tag))
}

fn model_key(tag: &str) -> String {
    tag.replace('/', "_")
}

/// Trained models keyed by tag, with an optional fallback model.
#[derive(Default, Clone)]
pub struct ModelStore {
    models: HashMap<String, Arc<dyn RegressionModel>>,
    fallback: Option<Arc<dyn RegressionModel>>,
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.models.keys().collect();
        keys.sort();
        f.debug_struct("ModelStore")
            .field("models", &keys)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*_model.json` file in `dir`. `fallback_tag`, if given,
    /// names the model used for tags without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a model file is
    /// invalid. A missing fallback model is only logged.
    pub fn load_dir(dir: &Path, fallback_tag: Option<&str>) -> Result<Self> {
        let mut store = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(key) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(MODEL_FILE_SUFFIX))
                .map(str::to_string)
            else {
                continue;
            };
            let model = LinearModel::from_json_file(&path)?;
            debug!(path = %path.display(), features = model.feature_names().len(), "loaded model");
            store.models.insert(key, Arc::new(model));
        }

        if let Some(tag) = fallback_tag {
            match store.models.get(&model_key(tag)) {
                Some(m) => store.fallback = Some(Arc::clone(m)),
                None => warn!(tag, "fallback model not found"),
            }
        }
        info!(dir = %dir.display(), models = store.models.len(), "loaded model store");
        Ok(store)
    }

    pub fn with_model(mut self, tag: &str, model: impl RegressionModel + 'static) -> Self {
        self.models.insert(model_key(tag), Arc::new(model));
        self
    }

    pub fn with_fallback(mut self, model: impl RegressionModel + 'static) -> Self {
        self.fallback = Some(Arc::new(model));
        self
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model for `tag`, or the fallback model.
    pub fn get(&self, tag: &str) -> Option<Arc<dyn RegressionModel>> {
        if let Some(m) = self.models.get(&model_key(tag)) {
            return Some(Arc::clone(m));
        }
        if self.fallback.is_some() {
            debug!(tag, "no model for tag; using fallback");
        }
        self.fallback.clone()
    }
}

/// Site catalog and model store loaded together.
#[derive(Debug, Clone)]
pub struct Stores {
    pub sites: SiteCatalog,
    pub models: ModelStore,
}

static STORES: OnceLock<Arc<Stores>> = OnceLock::new();

/// Installs the process-wide stores. The first call wins; later calls
/// return the already installed instance.
pub fn install(stores: Stores) -> Arc<Stores> {
    let fresh = Arc::new(stores);
    match STORES.set(Arc::clone(&fresh)) {
        Ok(()) => fresh,
        Err(_) => {
            warn!("stores already installed; keeping the existing instance");
            STORES.get().cloned().unwrap_or(fresh)
        }
    }
}

/// The process-wide stores, if installed.
pub fn installed() -> Option<Arc<Stores>> {
    STORES.get().cloned()
}
