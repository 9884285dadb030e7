//! Outlier rejection
//!
//! Removes values lying `m` or more population standard deviations from the
//! mean, then optionally trims a fixed count from each end.

use crate::stats::{mean, population_std};
use serde::{Deserialize, Serialize};

/// Outlier rejection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Rejection threshold in standard deviations
    pub m: f64,
    /// Elements dropped from each end after rejection
    pub trim_ends: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            m: 2.0,
            trim_ends: 0,
        }
    }
}

/// Surviving values in original order plus the number rejected
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filtered {
    pub values: Vec<f64>,
    pub outliers: usize,
}

/// Reject outliers from `values`.
///
/// A value is an outlier when `|v - mean| >= m * std`. A zero standard
/// deviation rejects nothing. Trimming happens after rejection and never
/// counts towards `outliers`.
pub fn reject_outliers(values: &[f64], m: f64, trim_ends: usize) -> Filtered {
    let (Some(mu), Some(sigma)) = (mean(values), population_std(values)) else {
        return Filtered::default();
    };

    let mut kept = Vec::with_capacity(values.len());
    let mut outliers = 0;
    for &v in values {
        if sigma > 0.0 && (v - mu).abs() >= m * sigma {
            outliers += 1;
        } else {
            kept.push(v);
        }
    }

    if trim_ends > 0 {
        kept = if kept.len() > 2 * trim_ends {
            kept[trim_ends..kept.len() - trim_ends].to_vec()
        } else {
            Vec::new()
        };
    }

    Filtered {
        values: kept,
        outliers,
    }
}

impl OutlierConfig {
    pub fn apply(&self, values: &[f64]) -> Filtered {
        reject_outliers(values, self.m, self.trim_ends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_single_spike() {
        let mut values = vec![1.0; 9];
        values.push(100.0);

        let filtered = reject_outliers(&values, 2.0, 0);
        assert_eq!(filtered.values, vec![1.0; 9]);
        assert_eq!(filtered.outliers, 1);
    }

    #[test]
    fn test_idempotent_on_filtered_output() {
        let mut values = vec![1.0; 9];
        values.push(100.0);

        let first = reject_outliers(&values, 2.0, 0);
        let second = reject_outliers(&first.values, 2.0, 0);
        assert_eq!(second.values, first.values);
        assert_eq!(second.outliers, 0);
    }

    #[test]
    fn test_zero_std_rejects_nothing() {
        let filtered = reject_outliers(&[4.0, 4.0, 4.0], 2.0, 0);
        assert_eq!(filtered.values, vec![4.0, 4.0, 4.0]);
        assert_eq!(filtered.outliers, 0);
    }

    #[test]
    fn test_preserves_order() {
        let values = [120.0, 80.0, 100.0, 95.0, 105.0, 110.0, 90.0, 2000.0];
        let filtered = reject_outliers(&values, 2.0, 0);
        assert_eq!(
            filtered.values,
            vec![120.0, 80.0, 100.0, 95.0, 105.0, 110.0, 90.0]
        );
    }

    #[test]
    fn test_trim_after_rejection() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let filtered = reject_outliers(&values, 3.0, 2);
        assert_eq!(filtered.values, vec![3.0, 4.0]);
        assert_eq!(filtered.outliers, 0);

        let too_short = reject_outliers(&values, 3.0, 3);
        assert!(too_short.values.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(reject_outliers(&[], 2.0, 0), Filtered::default());
    }

    /// Evenly spaced values plus one far spike, shuffled. A ramp never has a
    /// member `sqrt(3)` or more σ from its mean, so once the spike is gone a
    /// second pass with `m >= 1.8` finds nothing.
    fn ramp_with_spike() -> impl Strategy<Value = Vec<f64>> {
        (8usize..40, -1e3f64..1e3, 0.1f64..10.0, any::<bool>()).prop_flat_map(
            |(len, start, step, high)| {
                let mut values: Vec<f64> = (0..len).map(|i| start + step * i as f64).collect();
                values.push(if high { 1e6 } else { -1e6 });
                Just(values).prop_shuffle()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_rejection_is_idempotent(values in ramp_with_spike(), m in 1.8f64..2.5) {
            let first = reject_outliers(&values, m, 0);
            prop_assert_eq!(first.outliers, 1);

            let second = reject_outliers(&first.values, m, 0);
            prop_assert_eq!(second.outliers, 0);
            prop_assert_eq!(second.values, first.values);
        }

        #[test]
        fn prop_kept_plus_outliers_is_len(values in prop::collection::vec(-1e4f64..1e4, 0..64), m in 0.5f64..4.0) {
            let filtered = reject_outliers(&values, m, 0);
            prop_assert_eq!(filtered.values.len() + filtered.outliers, values.len());
        }

        #[test]
        fn prop_kept_values_are_members(values in prop::collection::vec(-1e4f64..1e4, 1..64)) {
            let filtered = reject_outliers(&values, 2.0, 1);
            for v in &filtered.values {
                prop_assert!(values.contains(v));
            }
        }
    }
}
