//! Conversion from plane-of-array irradiance to electrical output.

/// Degradation and balance-of-system losses.
pub mod losses;
/// Trained regression models and output interpretation.
pub mod model;
/// Physics-based panel output.
pub mod physical;

pub use losses::{LossFactors, apply_losses, degradation_at, degradation_multiplier};
pub use model::{Interpretation, LinearModel, ModelOutput, RegressionModel};
pub use physical::{THRESHOLD_W_M2, cloud_factor, panel_dc_w, temperature_factor};
