//! Synthetic hourly weather with temporally correlated cloud cover.
//!
//! Used when no weather feed is supplied. Cloud cover follows a first-order
//! autoregressive process:
//! ```text
//! c(t) = alpha * c(t-1) + (1 - alpha) * (mean + epsilon(t))
//! ```
//! clamped to \[0, 100\] percent. Temperature follows a cosine day curve
//! peaking mid-afternoon.

use std::f64::consts::PI;

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use super::WeatherSample;

/// Parameters for synthetic weather generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticWeather {
    /// Daily mean temperature in °C.
    pub mean_temperature_c: f64,
    /// Half the daily temperature swing in °C.
    pub temperature_amplitude_c: f64,
    /// Local hour of the daily temperature maximum.
    pub peak_hour: f64,
    /// Long-run mean cloud cover in percent.
    pub mean_cloud_pct: f64,
    /// AR(1) correlation coefficient (0.0 = uncorrelated, 1.0 = fully persistent).
    pub alpha: f64,
    /// Standard deviation of the cloud innovation noise in percent.
    pub cloud_noise_std: f64,
    /// Random seed for reproducible output.
    pub seed: u64,
}

impl Default for SyntheticWeather {
    fn default() -> Self {
        Self {
            mean_temperature_c: 22.0,
            temperature_amplitude_c: 6.0,
            peak_hour: 15.0,
            mean_cloud_pct: 20.0,
            alpha: 0.8,
            cloud_noise_std: 40.0,
            seed: 42,
        }
    }
}

impl SyntheticWeather {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generates one sample per local hour of `date`.
    ///
    /// Hours that do not exist locally (spring DST gap) are skipped; the
    /// cloud process still advances through them.
    pub fn generate(&self, date: NaiveDate, tz: Tz) -> Vec<WeatherSample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let alpha = self.alpha.clamp(0.0, 1.0);
        let mut cloud = self.mean_cloud_pct.clamp(0.0, 100.0);
        let mut out = Vec::with_capacity(24);

        for hour in 0..24u32 {
            let epsilon = gaussian_noise(&mut rng, self.cloud_noise_std);
            let target = self.mean_cloud_pct + epsilon;
            cloud = (alpha * cloud + (1.0 - alpha) * target).clamp(0.0, 100.0);

            let Some(local) = date.and_hms_opt(hour, 0, 0) else {
                continue;
            };
            let Some(timestamp) = tz.from_local_datetime(&local).earliest() else {
                continue;
            };
            let phase = 2.0 * PI * (f64::from(hour) - self.peak_hour) / 24.0;
            let temperature = self.mean_temperature_c + self.temperature_amplitude_c * phase.cos();
            out.push(WeatherSample::new(timestamp, Some(temperature), Some(cloud)));
        }

        debug!(%date, seed = self.seed, samples = out.len(), "generated synthetic weather");
        out
    }
}

/// Zero-mean Gaussian noise via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
}
