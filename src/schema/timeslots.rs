//! Timeslot mapping for wearable sessions
//!
//! A sensor file usually spans more than the pronation-supination task. The
//! mapping gives, per subject and wrist, the task's start and end in seconds.

use crate::error::MotorError;
use crate::types::{GyroRecording, Hand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub start: f64,
    pub end: f64,
}

impl Slot {
    /// Sub-recording from the sample nearest `start` up to, but excluding,
    /// the sample nearest `end`
    pub fn select(&self, recording: &GyroRecording) -> Result<GyroRecording, MotorError> {
        if !(self.end > self.start) {
            return Err(MotorError::InvalidInput(format!(
                "timeslot end {} must follow start {}",
                self.end, self.start
            )));
        }

        let from = nearest_index(&recording.timestamps, self.start);
        let to = nearest_index(&recording.timestamps, self.end);
        if to <= from {
            return Err(MotorError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        Ok(GyroRecording {
            timestamps: recording.timestamps[from..to].to_vec(),
            angular_velocity: recording.angular_velocity[from..to].to_vec(),
            sample_rate: recording.sample_rate,
        })
    }
}

/// Index of the sorted timestamp closest to `target`; the later index wins ties
fn nearest_index(timestamps: &[f64], target: f64) -> usize {
    let upper = timestamps.partition_point(|t| *t < target);
    if upper == 0 {
        return 0;
    }
    if upper == timestamps.len() {
        return upper - 1;
    }
    let below = target - timestamps[upper - 1];
    let above = timestamps[upper] - target;
    if below < above {
        upper - 1
    } else {
        upper
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectSlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Slot>,
}

/// Subject id → per-wrist task slots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeslots(pub BTreeMap<String, SubjectSlots>);

impl Timeslots {
    pub fn from_json(json: &str) -> Result<Self, MotorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MotorError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn slot(&self, subject_id: &str, hand: Hand) -> Option<&Slot> {
        let slots = self.0.get(subject_id)?;
        match hand {
            Hand::Left => slots.left.as_ref(),
            Hand::Right => slots.right.as_ref(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn recording() -> GyroRecording {
        GyroRecording {
            timestamps: (0..100).map(|i| i as f64 * 0.1).collect(),
            angular_velocity: (0..100).map(|i| i as f64).collect(),
            sample_rate: 10.0,
        }
    }

    #[test]
    fn test_parse_timeslots() {
        let json = r#"{
            "PD001OFF": {"left": {"start": 12.5, "end": 42.0}, "right": {"start": 50.0, "end": 80.0}},
            "HC002": {"right": {"start": 3.0, "end": 9.0}}
        }"#;
        let slots = Timeslots::from_json(json).unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(
            slots.slot("PD001OFF", Hand::Left),
            Some(&Slot {
                start: 12.5,
                end: 42.0
            })
        );
        assert!(slots.slot("HC002", Hand::Left).is_none());
        assert!(slots.slot("CA999", Hand::Right).is_none());
    }

    #[test]
    fn test_select_nearest_samples() {
        let slot = Slot {
            start: 1.04,
            end: 2.06,
        };
        let selected = slot.select(&recording()).unwrap();

        // Nearest to 1.04 is index 10, nearest to 2.06 is index 21 (exclusive)
        assert_eq!(selected.len(), 11);
        assert_eq!(selected.angular_velocity[0], 10.0);
        assert_eq!(selected.angular_velocity[10], 20.0);
        assert_eq!(selected.sample_rate, 10.0);
    }

    #[test]
    fn test_nearest_index_tie_takes_later_sample() {
        let timestamps = [0.0, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(nearest_index(&timestamps, 0.25), 1);
        assert_eq!(nearest_index(&timestamps, 1.75), 4);
        assert_eq!(nearest_index(&timestamps, 0.2), 0);
        assert_eq!(nearest_index(&timestamps, 1.0), 2);

        let slot = Slot { start: 0.25, end: 1.75 };
        let recording = GyroRecording {
            timestamps: timestamps.to_vec(),
            angular_velocity: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            sample_rate: 2.0,
        };
        let selected = slot.select(&recording).unwrap();
        assert_eq!(selected.angular_velocity, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_select_clamps_to_recording() {
        let slot = Slot {
            start: -5.0,
            end: 100.0,
        };
        let selected = slot.select(&recording()).unwrap();
        assert_eq!(selected.len(), 99);
    }

    #[test]
    fn test_select_rejects_empty_slot() {
        let inverted = Slot {
            start: 5.0,
            end: 1.0,
        };
        assert!(inverted.select(&recording()).is_err());

        let tiny = Slot {
            start: 5.0,
            end: 5.01,
        };
        assert!(matches!(
            tiny.select(&recording()),
            Err(MotorError::InsufficientData { .. })
        ));
    }
}
