//! Half-cycle segmentation of pronation-supination movements
//!
//! Angular velocity is integrated to angular displacement; strict local
//! extrema of the displacement delimit supination (positive) and pronation
//! (negative) half-cycles.

use crate::error::MotorError;

/// Integral signal plus per-half-cycle amplitude and duration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleSegmentation {
    pub integral: Vec<f64>,
    /// Signed displacement between successive extrema
    pub amplitudes: Vec<f64>,
    /// Seconds between successive extrema
    pub durations: Vec<f64>,
}

/// Rectangle-rule cumulative integral using the first sample gap as a fixed step
pub fn integrate(timestamps: &[f64], velocity: &[f64]) -> Result<Vec<f64>, MotorError> {
    if timestamps.len() != velocity.len() {
        return Err(MotorError::InvalidInput(format!(
            "{} timestamps for {} velocity samples",
            timestamps.len(),
            velocity.len()
        )));
    }
    if timestamps.len() < 2 {
        return Err(MotorError::InsufficientData {
            required: 2,
            actual: timestamps.len(),
        });
    }

    let dt = timestamps[1] - timestamps[0];
    let integral = velocity
        .iter()
        .scan(0.0, |acc, v| {
            *acc += dt * v;
            Some(*acc)
        })
        .collect();
    Ok(integral)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Maximum,
    Minimum,
}

/// Indices strictly above (or below) every neighbour within `order` samples.
/// Neighbour indices are clipped to the signal bounds, so the first and last
/// samples are never extrema.
pub fn local_extrema(values: &[f64], order: usize, kind: Extremum) -> Vec<usize> {
    let n = values.len();
    if n == 0 || order == 0 {
        return Vec::new();
    }

    let beats = |a: f64, b: f64| match kind {
        Extremum::Maximum => a > b,
        Extremum::Minimum => a < b,
    };

    (0..n)
        .filter(|&i| {
            (1..=order).all(|k| {
                let lo = i.saturating_sub(k);
                let hi = (i + k).min(n - 1);
                beats(values[i], values[lo]) && beats(values[i], values[hi])
            })
        })
        .collect()
}

/// Integrate `velocity` and walk its extrema in time order, always consuming
/// whichever of the next maximum or minimum comes first. Stops when either
/// list runs out.
pub fn integrate_and_segment(
    timestamps: &[f64],
    velocity: &[f64],
    order: usize,
) -> Result<CycleSegmentation, MotorError> {
    let integral = integrate(timestamps, velocity)?;
    let maxima = local_extrema(&integral, order, Extremum::Maximum);
    let minima = local_extrema(&integral, order, Extremum::Minimum);

    let mut amplitudes = Vec::new();
    let mut durations = Vec::new();
    let (mut mi, mut ma) = (0, 0);
    while mi < minima.len() && ma < maxima.len() {
        let (lo, hi) = (minima[mi], maxima[ma]);
        if lo < hi {
            amplitudes.push(integral[lo] - integral[hi]);
            durations.push(timestamps[hi] - timestamps[lo]);
            mi += 1;
        } else {
            amplitudes.push(integral[hi] - integral[lo]);
            durations.push(timestamps[lo] - timestamps[hi]);
            ma += 1;
        }
    }

    Ok(CycleSegmentation {
        integral,
        amplitudes,
        durations,
    })
}
