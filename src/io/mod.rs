//! File input and output.

/// Forecast table export (CSV, JSON).
pub mod export;
/// Weather series import.
pub mod weather_csv;
