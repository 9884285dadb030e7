//! Per-subject input records
//!
//! A tapping record carries the six key event streams of one assessment
//! session; a wearable record carries the gyroscope trace of each wrist.

use crate::types::{GyroRecording, Hand, KeyEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keyboard session of one subject, streams keyed by slot (`"0"`..`"5"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TappingRecord {
    pub subject_id: String,
    /// Dominant hand
    pub hand: Hand,
    /// Clinical side code: 1 right, 2 left, 3 both
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<i64>,
    #[serde(rename = "d")]
    pub streams: BTreeMap<String, Vec<KeyEvent>>,
}

impl TappingRecord {
    pub fn stream(&self, slot: &str) -> Option<&[KeyEvent]> {
        self.streams.get(slot).map(Vec::as_slice)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject_id.trim().is_empty() {
            return Err(ValidationError::MissingSubjectId);
        }
        for (slot, events) in &self.streams {
            if let Some(index) = events
                .windows(2)
                .position(|pair| pair[1].timestamp_ms < pair[0].timestamp_ms)
            {
                return Err(ValidationError::UnsortedEvents {
                    slot: slot.clone(),
                    index: index + 1,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wrists {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<GyroRecording>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<GyroRecording>,
}

impl Wrists {
    pub fn get(&self, hand: Hand) -> Option<&GyroRecording> {
        match hand {
            Hand::Left => self.left.as_ref(),
            Hand::Right => self.right.as_ref(),
        }
    }
}

/// Wrist sensor session of one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableRecord {
    pub subject_id: String,
    /// Dominant hand
    pub hand: Hand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<i64>,
    pub wrists: Wrists,
}

impl WearableRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.subject_id.trim().is_empty() {
            return Err(ValidationError::MissingSubjectId);
        }
        if self.wrists.left.is_none() && self.wrists.right.is_none() {
            return Err(ValidationError::NoRecordings);
        }
        for hand in [Hand::Left, Hand::Right] {
            if let Some(recording) = self.wrists.get(hand) {
                validate_recording(hand, recording)?;
            }
        }
        Ok(())
    }
}

fn validate_recording(hand: Hand, recording: &GyroRecording) -> Result<(), ValidationError> {
    let wrist = hand.as_str().to_string();
    if recording.timestamps.len() != recording.angular_velocity.len() {
        return Err(ValidationError::LengthMismatch {
            wrist,
            timestamps: recording.timestamps.len(),
            samples: recording.angular_velocity.len(),
        });
    }
    if recording.len() < 2 {
        return Err(ValidationError::TooFewSamples {
            wrist,
            samples: recording.len(),
        });
    }
    if !(recording.sample_rate > 0.0) {
        return Err(ValidationError::InvalidSampleRate {
            wrist,
            sample_rate: recording.sample_rate,
        });
    }
    if let Some(index) = recording
        .timestamps
        .windows(2)
        .position(|pair| !(pair[1] > pair[0]))
    {
        return Err(ValidationError::NonIncreasingTimestamps {
            wrist,
            index: index + 1,
        });
    }
    Ok(())
}

/// Structural problems that stop a record from being processed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Record has no subject_id")]
    MissingSubjectId,

    #[error("Events in slot {slot} are out of order at index {index}")]
    UnsortedEvents { slot: String, index: usize },

    #[error("Record has no wrist recordings")]
    NoRecordings,

    #[error("{wrist} wrist has {timestamps} timestamps but {samples} samples")]
    LengthMismatch {
        wrist: String,
        timestamps: usize,
        samples: usize,
    },

    #[error("{wrist} wrist has only {samples} samples")]
    TooFewSamples { wrist: String, samples: usize },

    #[error("{wrist} wrist sample rate must be positive, got {sample_rate}")]
    InvalidSampleRate { wrist: String, sample_rate: f64 },

    #[error("{wrist} wrist timestamps stop increasing at index {index}")]
    NonIncreasingTimestamps { wrist: String, index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyPhase;

    fn gyro(n: usize) -> GyroRecording {
        GyroRecording {
            timestamps: (0..n).map(|i| i as f64 * 0.01).collect(),
            angular_velocity: vec![0.0; n],
            sample_rate: 100.0,
        }
    }

    #[test]
    fn test_parse_tapping_record() {
        let json = r#"{
            "subject_id": "PD012OFF",
            "hand": "right",
            "side": 2,
            "d": {
                "0": [{"k": 80, "p": 1, "e": 0}, {"k": 80, "p": 0, "e": 95}],
                "1": []
            }
        }"#;
        let record: TappingRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.hand, Hand::Right);
        assert_eq!(record.side, Some(2));
        let qp = record.stream("0").unwrap();
        assert_eq!(qp[0].phase, KeyPhase::Press);
        assert_eq!(qp[1].timestamp_ms, 95);
        assert!(record.stream("4").is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_side_is_optional() {
        let json = r#"{"subject_id": "HC001", "hand": "left", "d": {}}"#;
        let record: TappingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.side, None);
    }

    #[test]
    fn test_unsorted_stream_is_rejected() {
        let record = TappingRecord {
            subject_id: "HC001".to_string(),
            hand: Hand::Right,
            side: None,
            streams: BTreeMap::from([(
                "2".to_string(),
                vec![KeyEvent::press(77, 100), KeyEvent::release(77, 50)],
            )]),
        };
        assert_eq!(
            record.validate(),
            Err(ValidationError::UnsortedEvents {
                slot: "2".to_string(),
                index: 1
            })
        );
    }

    #[test]
    fn test_wearable_validation() {
        let mut record = WearableRecord {
            subject_id: "CA003".to_string(),
            hand: Hand::Left,
            side: Some(1),
            wrists: Wrists {
                left: Some(gyro(10)),
                right: None,
            },
        };
        assert!(record.validate().is_ok());

        record.wrists.right = Some(GyroRecording {
            angular_velocity: vec![0.0; 3],
            ..gyro(5)
        });
        assert!(matches!(
            record.validate(),
            Err(ValidationError::LengthMismatch { .. })
        ));

        record.wrists.right = Some(GyroRecording {
            sample_rate: 0.0,
            ..gyro(5)
        });
        assert!(matches!(
            record.validate(),
            Err(ValidationError::InvalidSampleRate { .. })
        ));

        record.wrists = Wrists::default();
        assert_eq!(record.validate(), Err(ValidationError::NoRecordings));
    }

    #[test]
    fn test_repeated_timestamp_is_rejected() {
        let mut recording = gyro(4);
        recording.timestamps[2] = recording.timestamps[1];
        assert_eq!(
            validate_recording(Hand::Right, &recording),
            Err(ValidationError::NonIncreasingTimestamps {
                wrist: "right".to_string(),
                index: 2
            })
        );
    }
}
