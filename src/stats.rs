//! Shared numerical primitives
//!
//! Means, variances and ordinary least-squares trend fitting used by both the
//! tapping and the wearable branches.

use crate::error::MotorError;
use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance with an `n` denominator
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    Some(ss / values.len() as f64)
}

/// Variance with an `n - 1` denominator; needs at least two values
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mu).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

pub fn population_std(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Least-squares line with the standard error of its slope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
    pub std_err: f64,
}

impl Trend {
    /// Fit `values` against their 0-based index
    pub fn fit(values: &[f64]) -> Result<Trend, MotorError> {
        let x: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        Self::fit_xy(&x, values)
    }

    /// Fit `y` against `x`
    pub fn fit_xy(x: &[f64], y: &[f64]) -> Result<Trend, MotorError> {
        if x.len() != y.len() {
            return Err(MotorError::InvalidInput(format!(
                "trend fit needs equal-length inputs, got {} and {}",
                x.len(),
                y.len()
            )));
        }
        let n = x.len();
        if n < 2 {
            return Err(MotorError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let nf = n as f64;
        let x_mean = x.iter().sum::<f64>() / nf;
        let y_mean = y.iter().sum::<f64>() / nf;

        let mut ssx = 0.0;
        let mut ssy = 0.0;
        let mut ssxy = 0.0;
        for (xi, yi) in x.iter().zip(y) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            ssx += dx * dx;
            ssy += dy * dy;
            ssxy += dx * dy;
        }
        ssx /= nf;
        ssy /= nf;
        ssxy /= nf;

        if ssx == 0.0 {
            return Err(MotorError::DegenerateStatistics(
                "trend fit over constant x".to_string(),
            ));
        }

        let slope = ssxy / ssx;
        let intercept = y_mean - slope * x_mean;

        let std_err = if n == 2 {
            0.0
        } else {
            let r = if ssy == 0.0 {
                0.0
            } else {
                (ssxy / (ssx * ssy).sqrt()).clamp(-1.0, 1.0)
            };
            ((1.0 - r * r) * ssy / ssx / (nf - 2.0)).max(0.0).sqrt()
        };

        Ok(Trend {
            slope,
            intercept,
            std_err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variances() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(population_variance(&values), Some(4.0));
        assert_eq!(population_std(&values), Some(2.0));
        assert!((sample_variance(&values).unwrap() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_variance(&[]), None);
        assert_eq!(sample_variance(&[1.0]), None);
    }

    #[test]
    fn test_trend_exact_on_linear_sequence() {
        let values: Vec<f64> = (0..20).map(|i| 3.5 * i as f64 - 12.0).collect();
        let trend = Trend::fit(&values).unwrap();

        assert!((trend.slope - 3.5).abs() < 1e-9);
        assert!((trend.intercept + 12.0).abs() < 1e-9);
        assert!(trend.std_err < 1e-6);
    }

    #[test]
    fn test_trend_two_points() {
        let trend = Trend::fit(&[10.0, 14.0]).unwrap();
        assert!((trend.slope - 4.0).abs() < 1e-12);
        assert!((trend.intercept - 10.0).abs() < 1e-12);
        assert_eq!(trend.std_err, 0.0);
    }

    #[test]
    fn test_trend_std_err_on_noisy_sequence() {
        // SSE = 1.8 over 2 degrees of freedom, Sxx = 5
        let trend = Trend::fit(&[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert!((trend.slope - 0.8).abs() < 1e-12);
        assert!((trend.intercept - 1.3).abs() < 1e-12);
        assert!((trend.std_err - 0.18f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_trend_constant_sequence() {
        let trend = Trend::fit(&[5.0; 6]).unwrap();
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.intercept, 5.0);
        assert_eq!(trend.std_err, 0.0);
    }

    #[test]
    fn test_trend_insufficient_data() {
        let err = Trend::fit(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            MotorError::InsufficientData {
                required: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_trend_constant_x() {
        let err = Trend::fit_xy(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, MotorError::DegenerateStatistics(_)));
    }
}
