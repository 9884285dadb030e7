//! Event stream segmentation into flight times
//!
//! A flight time is the interval between successive valid target releases.
//! The scan anchors on the first target release inside the window and then
//! walks forward, tallying every off-target keystroke as an error.

use crate::error::MotorError;
use crate::types::{KeyEvent, Targets, Window};

/// Flight times extracted from one window of a key event stream
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlightTimes {
    /// Intervals in milliseconds, chronological
    pub intervals: Vec<f64>,
    raw_errors: u32,
    single_target: bool,
}

impl FlightTimes {
    /// Off-target keystrokes. Single-target scans see each off-target
    /// keystroke as a press and a release, so the raw tally is halved.
    pub fn error_count(&self) -> f64 {
        if self.single_target {
            f64::from(self.raw_errors) / 2.0
        } else {
            f64::from(self.raw_errors)
        }
    }

    pub fn raw_errors(&self) -> u32 {
        self.raw_errors
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Treat an unanchored window as zero cycles and zero errors
    pub fn or_empty(result: Result<FlightTimes, MotorError>) -> FlightTimes {
        result.unwrap_or_default()
    }
}

/// Extract flight times from `events` inside `window`.
///
/// Returns [`MotorError::MalformedStream`] when no target release occurs at or
/// after the window start; the error carries the off-target releases that
/// were seen before the stream ran out.
pub fn extract_flight_times(
    events: &[KeyEvent],
    targets: &Targets,
    window: Window,
) -> Result<FlightTimes, MotorError> {
    let Some(first) = events.first() else {
        return Err(MotorError::MalformedStream {
            targets: *targets,
            discarded_errors: 0,
        });
    };
    let (start, end) = window.bounds(first.timestamp_ms);

    let mut errors: u32 = 0;
    let mut anchor = None;
    for (i, event) in events.iter().enumerate() {
        if event.is_release() && targets.contains(event.key_code) && event.timestamp_ms >= start {
            anchor = Some(i);
            break;
        }
        if event.is_release() && !targets.contains(event.key_code) {
            errors += 1;
        }
    }

    let Some(anchor) = anchor else {
        return Err(MotorError::MalformedStream {
            targets: *targets,
            discarded_errors: errors,
        });
    };

    let mut current_key = events[anchor].key_code;
    let mut last_ms = events[anchor].timestamp_ms;
    let mut intervals = Vec::new();

    for event in events[anchor + 1..]
        .iter()
        .filter(|e| e.timestamp_ms < end)
    {
        let on_target = targets.contains(event.key_code);
        if event.is_release() {
            if event.key_code == targets.next_after(current_key) {
                intervals.push((event.timestamp_ms - last_ms) as f64);
                current_key = event.key_code;
                last_ms = event.timestamp_ms;
            } else if !on_target {
                errors += 1;
            }
        } else if event.key_code == current_key {
            last_ms = event.timestamp_ms;
        } else if !on_target {
            errors += 1;
        }
    }

    Ok(FlightTimes {
        intervals,
        raw_errors: errors,
        single_target: targets.is_single(),
    })
}
