//! Hesitation and freeze detection
//!
//! The detrended, normalised gyroscope trace is transformed with a Morlet
//! CWT. Its cross-sectional energy (CSA) drops when the movement stalls; a
//! drop below a fraction of the mean CSA lasting longer than a third of the
//! dominant movement period is counted as one event.

use crate::error::MotorError;
use crate::stats::{population_std, Trend};
use crate::wearable::cwt::Scalogram;
use crate::wearable::spectrum::main_frequency;
use crate::wearable::WearableConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HesitationReport {
    /// FFT peak of the raw trace
    pub coarse_frequency: f64,
    /// Scalogram peak frequency
    pub dominant_frequency: f64,
    pub hesitations: usize,
    pub freezes: usize,
    /// Samples a drop must exceed to count
    pub min_run_samples: usize,
}

/// Remove the least-squares line over `t - t0` and scale to unit population σ
pub fn detrend_normalize(timestamps: &[f64], signal: &[f64]) -> Result<Vec<f64>, MotorError> {
    let t0 = timestamps.first().copied().unwrap_or(0.0);
    let x: Vec<f64> = timestamps.iter().map(|t| t - t0).collect();
    let line = Trend::fit_xy(&x, signal)?;

    let residual: Vec<f64> = x
        .iter()
        .zip(signal)
        .map(|(xi, yi)| yi - (line.slope * xi + line.intercept))
        .collect();

    match population_std(&residual) {
        Some(sigma) if sigma > 0.0 => Ok(residual.iter().map(|r| r / sigma).collect()),
        _ => Err(MotorError::DegenerateStatistics(
            "detrended signal has zero variance".to_string(),
        )),
    }
}

/// Minimum run length, in samples, for a sustained drop: a third of the
/// period measured in steps of `sample_spacing` seconds
pub fn run_length_steps(dominant_frequency: f64, sample_spacing: f64) -> Result<usize, MotorError> {
    if !(dominant_frequency > 0.0) || !(sample_spacing > 0.0) {
        return Err(MotorError::DegenerateStatistics(format!(
            "cannot derive run length from frequency {dominant_frequency} with spacing {sample_spacing} s"
        )));
    }
    let period_samples = (1.0 / dominant_frequency) / sample_spacing;
    Ok((period_samples / 3.0).floor() as usize)
}

/// Number of runs of `csa < threshold` longer than `steps` samples.
/// A run still open at the end of the trace is counted too.
pub fn count_sustained_runs(csa: &[f64], threshold: f64, steps: usize) -> usize {
    let mut events = 0;
    let mut run = 0;
    for &value in csa {
        if value < threshold {
            run += 1;
            continue;
        }
        if run > steps {
            events += 1;
        }
        run = 0;
    }
    if run > steps {
        events += 1;
    }
    events
}

pub fn detect_hesitations(
    timestamps: &[f64],
    signal: &[f64],
    sample_rate: f64,
    config: &WearableConfig,
) -> Result<HesitationReport, MotorError> {
    let [t0, t1, ..] = timestamps else {
        return Err(MotorError::InsufficientData {
            required: 2,
            actual: timestamps.len(),
        });
    };
    let sample_spacing = t1 - t0;

    let coarse_frequency = main_frequency(signal, sample_rate)?;
    let normalized = detrend_normalize(timestamps, signal)?;

    let scalogram = Scalogram::compute(&normalized, sample_rate, &config.cwt)?;
    let dominant_frequency = scalogram
        .dominant_frequency()
        .ok_or_else(|| MotorError::DegenerateStatistics("empty scalogram".to_string()))?;
    let csa = scalogram.cross_sectional_energy()?;

    let mean_csa = csa.iter().sum::<f64>() / csa.len() as f64;
    let steps = run_length_steps(dominant_frequency, sample_spacing)?;
    let hesitations = count_sustained_runs(&csa, config.hesitation_ratio * mean_csa, steps);
    let freezes = count_sustained_runs(&csa, config.freeze_ratio * mean_csa, steps);

    debug!(
        coarse_frequency,
        dominant_frequency, steps, hesitations, freezes, "scanned scalogram energy"
    );

    Ok(HesitationReport {
        coarse_frequency,
        dominant_frequency,
        hesitations,
        freezes,
        min_run_samples: steps,
    })
}
