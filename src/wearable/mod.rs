//! Wearable gyroscope branch
//!
//! Pronation-supination cycle extraction, spectral peak estimation and
//! wavelet-based hesitation detection for wrist-worn sensor traces.

pub mod cwt;
pub mod cycles;
pub mod features;
pub mod hesitation;
pub mod spectrum;

pub use cwt::{CwtConfig, Scalogram};
pub use cycles::{integrate_and_segment, CycleSegmentation};
pub use features::{WearableDerivation, WearableFeatureDeriver};
pub use hesitation::{detect_hesitations, HesitationReport};
pub use spectrum::main_frequency;

use serde::{Deserialize, Serialize};

/// Wearable analysis parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WearableConfig {
    /// Neighbourhood, in samples on each side, for extremum detection
    pub extrema_order: usize,
    pub cwt: CwtConfig,
    /// Hesitation threshold as a fraction of mean CSA
    pub hesitation_ratio: f64,
    /// Freeze threshold as a fraction of mean CSA
    pub freeze_ratio: f64,
}

impl Default for WearableConfig {
    fn default() -> Self {
        Self {
            extrema_order: 50,
            cwt: CwtConfig::default(),
            hesitation_ratio: 0.5,
            freeze_ratio: 0.25,
        }
    }
}
