//! Finger-tapping test branch
//!
//! Turns a keyboard press/release stream into flight times, dwell times,
//! accuracy and velocity scores, aggregated per analysis window.

pub mod accuracy;
pub mod aggregate;
pub mod dwell;
pub mod protocol;
pub mod segmenter;
pub mod velocity;

pub use accuracy::accuracy_score;
pub use aggregate::{sequence_effect, summarize_sequence, HandDerivation, TappingFeatureDeriver};
pub use dwell::extract_dwell_times;
pub use protocol::{default_protocols, TestProtocol};
pub use segmenter::{extract_flight_times, FlightTimes};
pub use velocity::{per_cycle_velocity, windowed_velocity, VelocityConfig};
