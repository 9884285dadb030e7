//! Coarse spectral peak of a gyroscope trace

use crate::error::MotorError;
use rustfft::{num_complex::Complex, FftPlanner};

/// Frequency (Hz) of the largest-magnitude FFT bin over the non-negative half
/// of the spectrum, `0..=n/2`. The DC bin is included, so a signal with a
/// large offset reports 0 Hz.
pub fn main_frequency(signal: &[f64], sample_rate: f64) -> Result<f64, MotorError> {
    if signal.is_empty() {
        return Err(MotorError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if !(sample_rate > 0.0) {
        return Err(MotorError::InvalidInput(format!(
            "sample rate must be positive, got {sample_rate}"
        )));
    }

    let n = signal.len();
    let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
    let fft = FftPlanner::new().plan_fft_forward(n);
    fft.process(&mut buffer);

    let mut peak = 0;
    let mut peak_norm = f64::NEG_INFINITY;
    for (k, z) in buffer.iter().enumerate().take(n / 2 + 1) {
        let norm = z.norm();
        if norm > peak_norm {
            peak_norm = norm;
            peak = k;
        }
    }

    Ok(peak as f64 * sample_rate / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_pure_tone() {
        let fs = 400.0;
        let signal: Vec<f64> = (0..2000)
            .map(|i| (2.0 * PI * 2.0 * i as f64 / fs + 0.3).cos())
            .collect();
        let f = main_frequency(&signal, fs).unwrap();
        assert!((f - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_dominates() {
        let signal: Vec<f64> = (0..256)
            .map(|i| 10.0 + (2.0 * PI * 8.0 * i as f64 / 128.0).sin())
            .collect();
        assert_eq!(main_frequency(&signal, 128.0).unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(main_frequency(&[], 100.0).is_err());
        assert!(main_frequency(&[1.0, 2.0], 0.0).is_err());
    }
}
