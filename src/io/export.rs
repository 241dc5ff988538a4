//! CSV and JSON export for forecast tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::pipeline::{ForecastRow, ForecastTable};
use crate::summary::ForecastSummary;

/// Column header for CSV forecast export.
const HEADER: &str = "timestamp,poa_w_m2,temp_c,cloud_pct,ideal_kw,predicted_kw";

/// Exports forecast rows to a CSV file at the given path.
///
/// Absent values are written as empty cells.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_csv(rows: &[ForecastRow], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(rows, io::BufWriter::new(file))
}

/// Writes forecast rows as CSV to any writer.
///
/// Timestamps are RFC 3339 with the site's UTC offset.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv(rows: &[ForecastRow], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(','))?;

    for r in rows {
        wtr.write_record(&[
            r.timestamp.to_rfc3339(),
            cell(r.poa_w_m2, 2),
            cell(r.temperature_c, 2),
            cell(r.cloud_pct, 1),
            cell(r.ideal_kw, 4),
            cell(r.predicted_kw, 4),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.precision$}"))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    table: &'a ForecastTable,
    summary: ForecastSummary,
}

/// Writes the table and its summary as pretty JSON. Absent values become `null`.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(table: &ForecastTable, mut writer: impl Write) -> Result<()> {
    let report = JsonReport {
        table,
        summary: table.summary(),
    };
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

/// Writes JSON to a file at the given path.
pub fn export_json(table: &ForecastTable, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_json(table, io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Nicosia;

    fn make_row(h: u32, predicted: Option<f64>) -> ForecastRow {
        ForecastRow {
            timestamp: Nicosia.with_ymd_and_hms(2024, 6, 21, h, 0, 0).unwrap(),
            poa_w_m2: Some(812.346),
            temperature_c: Some(31.0),
            cloud_pct: None,
            ideal_kw: Some(4.2),
            predicted_kw: predicted,
        }
    }

    fn table() -> ForecastTable {
        ForecastTable {
            strategy: "physical",
            rows: vec![make_row(12, Some(3.9)), make_row(13, None)],
        }
    }

    #[test]
    fn header_and_row_count() {
        let mut buf = Vec::new();
        write_csv(&table().rows, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn absent_values_are_empty_cells() {
        let mut buf = Vec::new();
        write_csv(&table().rows, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(
            output.lines().nth(1),
            Some("2024-06-21T12:00:00+03:00,812.35,31.00,,4.2000,3.9000")
        );
        assert!(output.lines().nth(2).unwrap().ends_with(",4.2000,"));
    }

    #[test]
    fn json_uses_null_for_absent() {
        let mut buf = Vec::new();
        write_json(&table(), &mut buf).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v["strategy"], "physical");
        assert!(v["rows"][1]["predicted_kw"].is_null());
        assert!(v["rows"][0]["cloud_pct"].is_null());
        assert_eq!(v["rows"][0]["timestamp"], "2024-06-21T12:00:00+03:00");
        assert!((v["summary"]["predicted_kwh"].as_f64().unwrap() - 0.975).abs() < 1e-12);
    }

    #[test]
    fn json_file_round_trips_summary() {
        let path =
            std::env::temp_dir().join(format!("pv-forecast-export-{}.json", std::process::id()));
        export_json(&table(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(v["rows"].as_array().map(Vec::len), Some(2));
        assert_eq!(v["summary"]["missing_rows"], 1);
    }

    #[test]
    fn output_is_deterministic() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_csv(&table().rows, &mut a).unwrap();
        write_csv(&table().rows, &mut b).unwrap();
        assert_eq!(a, b);
    }
}
