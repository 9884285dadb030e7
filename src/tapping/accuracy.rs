//! Dysmetria (key-strike accuracy) scoring

use crate::error::MotorError;
use crate::types::{KeyEvent, Targets};

const ON_TARGET: f64 = 1.0;
const ADJACENT: f64 = 2.0;
const OFF_TARGET: f64 = 3.0;

/// Mean accuracy of every press within the first `window_ms` of the stream:
/// 1 for a target key, 2 for a key in `adjacent_keys`, 3 otherwise.
///
/// Zero presses in the window is reported as
/// [`MotorError::DegenerateStatistics`] rather than a division by zero.
pub fn accuracy_score(
    events: &[KeyEvent],
    targets: &Targets,
    window_ms: i64,
    adjacent_keys: &[u16],
) -> Result<f64, MotorError> {
    let end = events
        .first()
        .map(|e| e.timestamp_ms + window_ms)
        .unwrap_or(i64::MIN);

    let scores: Vec<f64> = events
        .iter()
        .filter(|e| e.is_press() && e.timestamp_ms < end)
        .map(|e| {
            if targets.contains(e.key_code) {
                ON_TARGET
            } else if adjacent_keys.contains(&e.key_code) {
                ADJACENT
            } else {
                OFF_TARGET
            }
        })
        .collect();

    if scores.is_empty() {
        return Err(MotorError::DegenerateStatistics(format!(
            "no key presses within {window_ms} ms for accuracy score"
        )));
    }

    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADJACENT_QP: [u16; 12] = [79, 48, 45, 91, 59, 76, 9, 49, 50, 87, 65, 20];

    #[test]
    fn test_all_on_target() {
        let events = vec![
            KeyEvent::press(80, 0),
            KeyEvent::release(80, 100),
            KeyEvent::press(81, 500),
            KeyEvent::release(81, 600),
        ];
        let score = accuracy_score(&events, &Targets::Alternating(80, 81), 2000, &ADJACENT_QP).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_mixed_accuracy() {
        let events = vec![
            KeyEvent::press(80, 0),
            KeyEvent::press(79, 100),
            KeyEvent::press(12, 200),
            KeyEvent::press(81, 300),
            // Outside the window
            KeyEvent::press(12, 5000),
        ];
        let score = accuracy_score(&events, &Targets::Alternating(80, 81), 1000, &ADJACENT_QP).unwrap();
        // (1 + 2 + 3 + 1) / 4
        assert!((score - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_single_target_adjacency() {
        let events = vec![KeyEvent::press(77, 0), KeyEvent::press(78, 100)];
        let score = accuracy_score(&events, &Targets::Single(77), 1000, &[78, 74, 75, 32, 44]).unwrap();
        assert!((score - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_presses_is_degenerate() {
        let events = vec![KeyEvent::release(80, 0), KeyEvent::release(81, 100)];
        let err = accuracy_score(&events, &Targets::Alternating(80, 81), 1000, &ADJACENT_QP).unwrap_err();
        assert!(matches!(err, MotorError::DegenerateStatistics(_)));

        let err = accuracy_score(&[], &Targets::Single(77), 1000, &[]).unwrap_err();
        assert!(matches!(err, MotorError::DegenerateStatistics(_)));
    }
}
