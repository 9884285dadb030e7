//! Tapping velocity and deceleration scores
//!
//! Two complementary measures of progressive slowing:
//! - windowed: cycle counts in consecutive short windows relative to the first
//! - per-cycle: instantaneous rate derived from every flight time

use crate::error::MotorError;
use crate::stats::Trend;
use crate::tapping::segmenter::{extract_flight_times, FlightTimes};
use crate::types::{KeyEvent, Targets, Window};
use serde::{Deserialize, Serialize};

const BASELINE_EPSILON: f64 = 1e-12;
const CYCLE_EPSILON: f64 = 1e-5;
/// Numerator of the per-cycle rate transform
const RATE_SCALE: f64 = 16.0;

/// Windowed velocity parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    /// Length of each sub-window and the stride between them
    pub step_ms: i64,
    /// Sub-windows start at offsets below this value
    pub span_ms: i64,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            step_ms: 2_000,
            span_ms: 60_000,
        }
    }
}

/// Trend of per-window tap rate, as a percentage of the first window's rate.
///
/// The first window at offset 0 is the baseline; the trend is fitted over the
/// remaining windows. Windows without an anchoring target release count as
/// zero cycles.
pub fn windowed_velocity(
    events: &[KeyEvent],
    targets: &Targets,
    config: &VelocityConfig,
) -> Result<Trend, MotorError> {
    if config.step_ms <= 0 {
        return Err(MotorError::Config(format!(
            "velocity step must be positive, got {}",
            config.step_ms
        )));
    }

    let seconds = config.step_ms as f64 / 1000.0;
    let rate_at = |offset_ms: i64| {
        let cycles = FlightTimes::or_empty(extract_flight_times(
            events,
            targets,
            Window::with_offset(config.step_ms, offset_ms),
        ));
        cycles.len() as f64 / seconds
    };

    let baseline = rate_at(0) + BASELINE_EPSILON;
    let changes: Vec<f64> = (1..)
        .map(|i| i * config.step_ms)
        .take_while(|offset| *offset < config.span_ms)
        .map(|offset| rate_at(offset) / baseline * 100.0)
        .collect();

    Trend::fit(&changes)
}

/// Slope of the per-cycle rate `16 / ft`, expressed as percent change from
/// the first cycle.
pub fn per_cycle_velocity(flight_times: &[f64]) -> Result<f64, MotorError> {
    let rates: Vec<f64> = flight_times
        .iter()
        .map(|ft| RATE_SCALE / (ft + CYCLE_EPSILON))
        .collect();
    let Some(&first) = rates.first() else {
        return Err(MotorError::InsufficientData {
            required: 2,
            actual: 0,
        });
    };

    let percent: Vec<f64> = rates.iter().map(|r| r / first * 100.0 - 100.0).collect();
    Ok(Trend::fit(&percent)?.slope)
}
