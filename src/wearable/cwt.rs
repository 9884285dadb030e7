//! Continuous wavelet transform with a complex Morlet mother wavelet
//!
//! The transform convolves the signal with a conjugated, time-reversed
//! wavelet at each width and keeps the centred ("same") part of the full
//! convolution, so every row has the length of the input signal.

use crate::error::MotorError;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Frequency grid for the scalogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CwtConfig {
    /// Number of grid frequencies between `min_frequency` and Nyquist
    pub frequencies: usize,
    pub min_frequency: f64,
    /// Morlet omega0
    pub w: f64,
}

impl Default for CwtConfig {
    fn default() -> Self {
        Self {
            frequencies: 100,
            min_frequency: 1.0,
            w: 1.0,
        }
    }
}

impl CwtConfig {
    /// Evenly spaced frequencies from `min_frequency` to `sample_rate / 2`, inclusive
    pub fn frequency_grid(&self, sample_rate: f64) -> Vec<f64> {
        let stop = sample_rate / 2.0;
        match self.frequencies {
            0 => Vec::new(),
            1 => vec![self.min_frequency],
            n => {
                let step = (stop - self.min_frequency) / (n - 1) as f64;
                (0..n).map(|i| self.min_frequency + step * i as f64).collect()
            }
        }
    }

    /// Morlet width for each grid frequency.
    ///
    /// Each width is the one at which a sinusoid of that frequency produces
    /// the largest coefficient, so the scalogram peak sits on the tone's own
    /// grid frequency.
    pub fn widths(&self, frequencies: &[f64], sample_rate: f64) -> Vec<f64> {
        let peak = peak_scale(self.w);
        frequencies
            .iter()
            .map(|f| peak * sample_rate / (2.0 * PI * f))
            .collect()
    }
}

/// Dimensionless `s * omega` at which a real sinusoid of angular frequency
/// `omega` (radians per sample) maximises the `morlet2` coefficient magnitude.
///
/// The peak over time of `sqrt(s) * (exp(-(u - w)^2 / 2) + exp(-(u + w)^2 / 2))`
/// lies where `1 / (2u) - u + w * tanh(w * u) = 0`, with `u = s * omega`. For
/// large `w` this tends to `(w + sqrt(w^2 + 2)) / 2`, and it is about 1.248 at `w = 1`.
pub fn peak_scale(w: f64) -> f64 {
    let slope = |u: f64| 0.5 / u - u + w * (w * u).tanh();
    let mut lo = 1e-9;
    let mut hi = w.abs() + 1.0;
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if slope(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Complex Morlet wavelet of `points` samples (rounded up) at width `s`
pub fn morlet2(points: f64, s: f64, w: f64) -> Vec<Complex<f64>> {
    let count = points.ceil().max(0.0) as usize;
    let centre = (points - 1.0) / 2.0;
    let norm = PI.powf(-0.25) * (1.0 / s).sqrt();

    (0..count)
        .map(|k| {
            let x = (k as f64 - centre) / s;
            Complex::from_polar(norm * (-x * x / 2.0).exp(), w * x)
        })
        .collect()
}

/// Wavelet coefficients, one row per width
pub fn cwt(signal: &[f64], widths: &[f64], w: f64) -> Vec<Vec<Complex<f64>>> {
    let n = signal.len();
    widths
        .iter()
        .map(|&width| {
            let points = (10.0 * width).min(n as f64);
            let kernel: Vec<Complex<f64>> =
                morlet2(points, width, w).iter().rev().map(|c| c.conj()).collect();
            convolve_same(signal, &kernel)
        })
        .collect()
}

fn convolve_same(signal: &[f64], kernel: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let m = kernel.len();
    if m == 0 {
        return vec![Complex::new(0.0, 0.0); signal.len()];
    }
    let offset = (m - 1) / 2;

    (0..signal.len())
        .map(|i| {
            let full = i + offset;
            let lo = full.saturating_sub(m - 1);
            let hi = full.min(signal.len() - 1);
            (lo..=hi)
                .map(|j| kernel[full - j] * signal[j])
                .sum::<Complex<f64>>()
        })
        .collect()
}

/// Coefficient magnitudes over the frequency grid
#[derive(Debug, Clone, PartialEq)]
pub struct Scalogram {
    pub frequencies: Vec<f64>,
    /// `magnitudes[f][t]`
    pub magnitudes: Vec<Vec<f64>>,
}

impl Scalogram {
    pub fn compute(signal: &[f64], sample_rate: f64, config: &CwtConfig) -> Result<Self, MotorError> {
        if signal.is_empty() {
            return Err(MotorError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if config.frequencies == 0 {
            return Err(MotorError::Config("cwt needs at least one frequency".to_string()));
        }

        let frequencies = config.frequency_grid(sample_rate);
        let widths = config.widths(&frequencies, sample_rate);
        let magnitudes = cwt(signal, &widths, config.w)
            .into_iter()
            .map(|row| row.iter().map(|c| c.norm()).collect())
            .collect();

        Ok(Self {
            frequencies,
            magnitudes,
        })
    }

    /// Grid frequency holding the largest coefficient magnitude.
    /// The first maximum in row order wins ties.
    pub fn dominant_frequency(&self) -> Option<f64> {
        let mut best: Option<(usize, f64)> = None;
        for (row, values) in self.magnitudes.iter().enumerate() {
            for &v in values {
                if best.map_or(true, |(_, b)| v > b) {
                    best = Some((row, v));
                }
            }
        }
        best.map(|(row, _)| self.frequencies[row])
    }

    /// Per-sample sum of magnitudes across frequencies, scaled to a peak of 100
    pub fn cross_sectional_energy(&self) -> Result<Vec<f64>, MotorError> {
        let len = self.magnitudes.first().map_or(0, Vec::len);
        let sums: Vec<f64> = (0..len)
            .map(|t| self.magnitudes.iter().map(|row| row[t]).sum())
            .collect();

        let peak = sums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(peak > 0.0) {
            return Err(MotorError::DegenerateStatistics(
                "scalogram carries no energy".to_string(),
            ));
        }
        Ok(sums.iter().map(|s| s / peak * 100.0).collect())
    }
}
