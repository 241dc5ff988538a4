//! Clear-sky photovoltaic power forecasting.
//!
//! Computes plane-of-array irradiance for a fixed installation from solar
//! geometry and a clear-sky model, then converts it to DC and AC power
//! using weather-based physical corrections or a trained regression model.

/// Tag-keyed site and model stores.
pub mod catalog;
/// Command-line argument parsing.
pub mod cli;
pub mod config;
pub mod error;
/// Weather import and forecast export.
pub mod io;
/// Forecast orchestration.
pub mod pipeline;
/// Irradiance-to-power conversion, model interpretation and losses.
pub mod production;
pub mod site;
/// Solar position, clear-sky irradiance and transposition.
pub mod solar;
pub mod summary;
/// Weather normalization, time features and synthetic weather.
pub mod weather;

pub use error::{ForecastError, Result};
