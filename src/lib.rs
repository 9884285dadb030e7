//! Synheart Motor - Motor-symptom feature extraction for Parkinsonian assessment
//!
//! Motor turns two raw signal sources into quantitative features through a
//! deterministic pipeline:
//!
//! - **Tapping**: keyboard press/release streams from finger-tapping tests →
//!   flight and dwell segmentation → outlier rejection → windowed trend,
//!   variance, accuracy and velocity scores.
//! - **Wearable**: wrist gyroscope traces from pronation-supination tasks →
//!   half-cycle segmentation → amplitude and period statistics → wavelet
//!   hesitation and freeze detection.
//!
//! Every record yields an immutable feature bundle; features that cannot be
//! computed are left empty and explained by a diagnostic.

pub mod config;
pub mod encoder;
pub mod error;
pub mod outliers;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod tapping;
pub mod types;
pub mod wearable;

pub use config::AnalysisConfig;
pub use encoder::{FeatureBundle, MotorEncoder, MotorPayload};
pub use error::MotorError;
pub use pipeline::{
    tapping_batch, tapping_features, wearable_batch, wearable_features, BatchItem, MotorProcessor,
};
pub use schema::{RecordReader, TappingRecord, Timeslots, WearableRecord};

/// Motor version embedded in all output payloads
pub const MOTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for output payloads
pub const PRODUCER_NAME: &str = "synheart-motor";
