//! Windowed feature aggregation
//!
//! Re-runs the segmenter over each configured window and condenses the
//! resulting flight- and dwell-time sequences into trend, variance and
//! sequence-effect statistics.

use crate::config::AnalysisConfig;
use crate::error::MotorError;
use crate::outliers::OutlierConfig;
use crate::stats::{mean, population_variance, sample_variance, Trend};
use crate::tapping::accuracy::accuracy_score;
use crate::tapping::dwell::extract_dwell_times;
use crate::tapping::protocol::TestProtocol;
use crate::tapping::segmenter::extract_flight_times;
use crate::tapping::velocity::{per_cycle_velocity, windowed_velocity};
use crate::types::{FeatureIssue, KeyEvent, SequenceStats, TappingWindowFeatures, Window};
use tracing::debug;

const BLOCK_LEN: usize = 5;

/// Variance of per-block slopes over consecutive blocks of five values.
/// A trailing partial block is discarded.
pub fn sequence_effect(values: &[f64]) -> Result<f64, MotorError> {
    let slopes = values
        .chunks_exact(BLOCK_LEN)
        .map(|block| Trend::fit(block).map(|t| t.slope))
        .collect::<Result<Vec<f64>, MotorError>>()?;

    population_variance(&slopes).ok_or(MotorError::InsufficientData {
        required: BLOCK_LEN,
        actual: values.len(),
    })
}

/// Reject outliers from `values`, then summarise the survivors.
/// Statistics that cannot be computed are `None` and raise an issue.
pub fn summarize_sequence(
    values: &[f64],
    outliers: &OutlierConfig,
    feature: &str,
    window_ms: i64,
    issues: &mut Vec<FeatureIssue>,
) -> SequenceStats {
    let filtered = outliers.apply(values);
    let kept = &filtered.values;

    let mut record = |name: &str, error: MotorError| {
        issues.push(FeatureIssue::missing(
            &format!("{feature}.{name}"),
            Some(window_ms),
            &error,
        ));
    };

    let trend = Trend::fit(kept)
        .map_err(|e| record("trend", e))
        .ok();
    let sequence_effect = sequence_effect(kept)
        .map_err(|e| record("sequence_effect", e))
        .ok();
    let variance = sample_variance(kept);
    if variance.is_none() {
        record(
            "variance",
            MotorError::InsufficientData {
                required: 2,
                actual: kept.len(),
            },
        );
    }

    SequenceStats {
        count: values.len(),
        kept: kept.len(),
        outliers: filtered.outliers,
        mean: mean(kept),
        variance,
        trend,
        sequence_effect,
    }
}

/// Features derived from one hand's stream for one protocol
#[derive(Debug, Clone, PartialEq)]
pub struct HandDerivation {
    pub windows: Vec<TappingWindowFeatures>,
    pub velocity_trend: Option<Trend>,
    pub issues: Vec<FeatureIssue>,
}

/// Stateless deriver for tapping features
pub struct TappingFeatureDeriver;

impl TappingFeatureDeriver {
    pub fn derive(
        events: &[KeyEvent],
        protocol: &TestProtocol,
        config: &AnalysisConfig,
    ) -> HandDerivation {
        let mut issues = Vec::new();

        let windows = config
            .windows_ms
            .iter()
            .map(|&window_ms| derive_window(events, protocol, window_ms, config, &mut issues))
            .collect();

        let velocity_trend = windowed_velocity(events, &protocol.targets, &config.velocity)
            .map_err(|e| issues.push(FeatureIssue::missing("velocity_trend", None, &e)))
            .ok();

        HandDerivation {
            windows,
            velocity_trend,
            issues,
        }
    }
}

fn derive_window(
    events: &[KeyEvent],
    protocol: &TestProtocol,
    window_ms: i64,
    config: &AnalysisConfig,
    issues: &mut Vec<FeatureIssue>,
) -> TappingWindowFeatures {
    let targets = &protocol.targets;

    let (intervals, errors) = match extract_flight_times(events, targets, Window::new(window_ms)) {
        Ok(ft) => {
            let errors = ft.error_count();
            (ft.intervals, Some(errors))
        }
        Err(e) => {
            issues.push(FeatureIssue::missing("flight_times", Some(window_ms), &e));
            (Vec::new(), None)
        }
    };
    let dwell_times = extract_dwell_times(events, targets, window_ms);

    let accuracy = accuracy_score(events, targets, window_ms, &protocol.adjacent_keys)
        .map_err(|e| issues.push(FeatureIssue::missing("accuracy", Some(window_ms), &e)))
        .ok();
    let velocity_slope = per_cycle_velocity(&intervals)
        .map_err(|e| issues.push(FeatureIssue::missing("velocity_slope", Some(window_ms), &e)))
        .ok();

    let flight = summarize_sequence(&intervals, &config.outliers, "flight", window_ms, issues);
    let dwell = summarize_sequence(&dwell_times, &config.outliers, "dwell", window_ms, issues);

    debug!(
        protocol = %protocol.name,
        window_ms,
        taps = intervals.len(),
        dwell = dwell_times.len(),
        "derived tapping window"
    );

    TappingWindowFeatures {
        window_ms,
        taps: intervals.len(),
        errors,
        accuracy,
        velocity_slope,
        flight,
        dwell,
    }
}
