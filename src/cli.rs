//! Command-line argument parsing for the `pv-forecast` binary.

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;

/// Where the site description comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteSource {
    /// TOML configuration file.
    Config(PathBuf),
    /// Built-in preset name.
    Preset(String),
    /// Tag-specification CSV plus the tag to forecast.
    Catalog { csv: PathBuf, tag: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub source: SiteSource,
    pub weather: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub models_dir: Option<PathBuf>,
    /// Tag whose model serves catalog tags without one.
    pub fallback_model: Option<String>,
    pub date: Option<NaiveDate>,
    pub today: Option<NaiveDate>,
    pub seed: Option<u64>,
    pub out: Option<PathBuf>,
    pub json: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(CliOptions),
    Help,
}

pub fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

pub fn parse_args_from(args: &[String]) -> Result<Command, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut catalog = None;
    let mut tag = None;
    let mut weather = None;
    let mut model = None;
    let mut models_dir = None;
    let mut fallback_model = None;
    let mut date = None;
    let mut today = None;
    let mut seed = None;
    let mut out = None;
    let mut json = false;
    let mut verbose = false;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => return Ok(Command::Help),
            "--json" => json = true,
            "--verbose" | "-v" => verbose = true,
            "--site" => {
                let value = args.next_or_err(&mut i, flag, "a TOML file path")?;
                set_once(&mut config, flag, PathBuf::from(value))?;
            }
            "--preset" => {
                let value = args.next_or_err(&mut i, flag, "a preset name")?;
                set_once(&mut preset, flag, value.to_string())?;
            }
            "--catalog" => {
                let value = args.next_or_err(&mut i, flag, "a CSV file path")?;
                set_once(&mut catalog, flag, PathBuf::from(value))?;
            }
            "--tag" => {
                let value = args.next_or_err(&mut i, flag, "a tag")?;
                set_once(&mut tag, flag, value.to_string())?;
            }
            "--weather" => {
                let value = args.next_or_err(&mut i, flag, "a CSV file path")?;
                set_once(&mut weather, flag, PathBuf::from(value))?;
            }
            "--model" => {
                let value = args.next_or_err(&mut i, flag, "a JSON file path")?;
                set_once(&mut model, flag, PathBuf::from(value))?;
            }
            "--models" => {
                let value = args.next_or_err(&mut i, flag, "a directory")?;
                set_once(&mut models_dir, flag, PathBuf::from(value))?;
            }
            "--fallback-model" => {
                let value = args.next_or_err(&mut i, flag, "a tag")?;
                set_once(&mut fallback_model, flag, value.to_string())?;
            }
            "--out" => {
                let value = args.next_or_err(&mut i, flag, "a file path")?;
                set_once(&mut out, flag, PathBuf::from(value))?;
            }
            "--date" => {
                let value = args.next_or_err(&mut i, flag, "YYYY-MM-DD")?;
                set_once(&mut date, flag, parse_date(value, flag)?)?;
            }
            "--today" => {
                let value = args.next_or_err(&mut i, flag, "YYYY-MM-DD")?;
                set_once(&mut today, flag, parse_date(value, flag)?)?;
            }
            "--seed" => {
                let raw = args.next_or_err(&mut i, flag, "a u64")?;
                let value = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                set_once(&mut seed, flag, value)?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    let source = match (config, preset, catalog, tag) {
        (Some(path), None, None, None) => SiteSource::Config(path),
        (None, Some(name), None, None) => SiteSource::Preset(name),
        (None, None, Some(csv), Some(tag)) => SiteSource::Catalog { csv, tag },
        (None, None, None, None) => SiteSource::Preset("nicosia".to_string()),
        (None, None, Some(_), None) => return Err("--catalog requires --tag".to_string()),
        (None, None, None, Some(_)) => return Err("--tag requires --catalog".to_string()),
        _ => {
            let sources = "arguments `--site`, `--preset` and `--catalog` are mutually exclusive";
            return Err(format!("{sources}; choose one source"));
        }
    };

    if models_dir.is_some() && !matches!(source, SiteSource::Catalog { .. }) {
        return Err("--models requires --catalog".to_string());
    }
    if fallback_model.is_some() && models_dir.is_none() {
        return Err("--fallback-model requires --models".to_string());
    }

    Ok(Command::Run(CliOptions {
        source,
        weather,
        model,
        models_dir,
        fallback_model,
        date,
        today,
        seed,
        out,
        json,
        verbose,
    }))
}

fn set_once<T>(slot: &mut Option<T>, flag: &str, value: T) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

fn parse_date(raw: &str, flag: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("{flag} value \"{raw}\" is not a YYYY-MM-DD date"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: &mut usize, flag: &str, expected: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: &mut usize, flag: &str, expected: &str) -> Result<&str, String> {
        *index += 1;
        self.get(*index)
            .map(String::as_str)
            .ok_or_else(|| format!("missing value for {flag} (expected {expected})"))
    }
}

pub fn print_usage() {
    eprintln!("pv-forecast - clear-sky PV power forecast for a fixed installation");
    eprintln!();
    eprintln!("Usage: pv-forecast [OPTIONS]");
    eprintln!();
    eprintln!("Site (choose one, default: --preset nicosia):");
    eprintln!("  --site <path>            Load site from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (nicosia, moscow)");
    eprintln!("  --catalog <csv>          Tag-specification CSV, used with --tag");
    eprintln!("  --tag <tag>              Installation tag to look up in the catalog");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --weather <csv>          Weather CSV (time,temp_c,cloud); synthetic if omitted");
    eprintln!("  --model <json>           Linear regression model for history days");
    eprintln!("  --models <dir>           Directory of <tag>_model.json files (with --catalog)");
    eprintln!("  --fallback-model <tag>   Model for tags without one (with --models)");
    eprintln!("  --date <YYYY-MM-DD>      Target date (default: today)");
    eprintln!("  --today <YYYY-MM-DD>     Override the current date");
    eprintln!("  --seed <u64>             Override the synthetic weather seed");
    eprintln!("  --out <path>             Export forecast rows (CSV, or JSON for *.json)");
    eprintln!("  --json                   Print JSON instead of text");
    eprintln!("  --verbose, -v            Debug logging");
    eprintln!("  --help, -h               Show this help message");
}
