//! Per-wrist wearable feature derivation

use crate::error::MotorError;
use crate::stats::{mean, population_variance, Trend};
use crate::types::{AmplitudeStats, FeatureIssue, GyroRecording, Hand, HandRole, WearableHandFeatures};
use crate::wearable::cycles::{integrate_and_segment, CycleSegmentation};
use crate::wearable::hesitation::detect_hesitations;
use crate::wearable::spectrum::main_frequency;
use crate::wearable::WearableConfig;
use tracing::debug;

/// Fits on fewer points than this are flagged as numerically weak
const RELIABLE_FIT_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct WearableDerivation {
    pub features: WearableHandFeatures,
    pub issues: Vec<FeatureIssue>,
}

/// Stateless deriver for wearable features
pub struct WearableFeatureDeriver;

impl WearableFeatureDeriver {
    pub fn derive(
        recording: &GyroRecording,
        hand: Hand,
        role: HandRole,
        affected: bool,
        config: &WearableConfig,
    ) -> WearableDerivation {
        let mut issues = Vec::new();
        let timestamps = &recording.timestamps;
        let velocity = &recording.angular_velocity;

        let segmentation = integrate_and_segment(timestamps, velocity, config.extrema_order)
            .unwrap_or_else(|e| {
                issues.push(FeatureIssue::missing("cycles", None, &e));
                CycleSegmentation::default()
            });

        let magnitudes: Vec<f64> = segmentation.amplitudes.iter().map(|a| a.abs()).collect();
        let supinations: Vec<f64> = segmentation
            .amplitudes
            .iter()
            .copied()
            .filter(|a| *a > 0.0)
            .collect();
        let pronations: Vec<f64> = segmentation
            .amplitudes
            .iter()
            .copied()
            .filter(|a| *a < 0.0)
            .collect();

        let amplitude = amplitude_stats(&magnitudes, "amplitude", &mut issues);
        let supination = amplitude_stats(&supinations, "supination", &mut issues);
        let pronation = amplitude_stats(&pronations, "pronation", &mut issues);

        let durations = &segmentation.durations;
        let period_variance = population_variance(durations);
        if period_variance.is_none() {
            issues.push(FeatureIssue::missing(
                "period_variance",
                None,
                &MotorError::InsufficientData {
                    required: 1,
                    actual: 0,
                },
            ));
        }
        let period_decrement = decrement(durations, "period_decrement", &mut issues);

        let main_frequency = main_frequency(velocity, recording.sample_rate)
            .map_err(|e| issues.push(FeatureIssue::missing("main_frequency", None, &e)))
            .ok();

        let report = detect_hesitations(timestamps, velocity, recording.sample_rate, config)
            .map_err(|e| issues.push(FeatureIssue::missing("hesitations", None, &e)))
            .ok();

        debug!(
            hand = hand.as_str(),
            samples = recording.len(),
            movements = durations.len(),
            "derived wearable features"
        );

        WearableDerivation {
            features: WearableHandFeatures {
                hand,
                role,
                affected,
                samples: recording.len(),
                amplitude,
                supination,
                pronation,
                main_frequency,
                period_variance,
                period_decrement,
                movements: durations.len(),
                dominant_frequency: report.map(|r| r.dominant_frequency),
                hesitations: report.map(|r| r.hesitations),
                freezes: report.map(|r| r.freezes),
            },
            issues,
        }
    }
}

fn amplitude_stats(values: &[f64], feature: &str, issues: &mut Vec<FeatureIssue>) -> AmplitudeStats {
    let mean = mean(values);
    let variance = population_variance(values);
    for (stat, missing) in [("mean", mean.is_none()), ("variance", variance.is_none())] {
        if missing {
            issues.push(FeatureIssue::missing(
                &format!("{feature}.{stat}"),
                None,
                &MotorError::InsufficientData {
                    required: 1,
                    actual: values.len(),
                },
            ));
        }
    }

    AmplitudeStats {
        mean,
        variance,
        decrement: decrement(values, &format!("{feature}.decrement"), issues),
    }
}

/// Slope of a linear fit over the sequence index
fn decrement(values: &[f64], feature: &str, issues: &mut Vec<FeatureIssue>) -> Option<f64> {
    let trend = Trend::fit(values)
        .map_err(|e| issues.push(FeatureIssue::missing(feature, None, &e)))
        .ok()?;

    if values.len() < RELIABLE_FIT_POINTS {
        issues.push(FeatureIssue::numerical(
            feature,
            None,
            format!("linear fit over only {} points", values.len()),
        ));
    }
    Some(trend.slope)
}
