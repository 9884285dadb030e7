//! Dwell time extraction

use crate::types::{KeyEvent, Targets};

/// Press-to-release durations of target keys pressed within the first
/// `window_ms` of the stream.
///
/// The matching release is searched for beyond the window end. Presses with
/// no later release of the same key are skipped.
pub fn extract_dwell_times(events: &[KeyEvent], targets: &Targets, window_ms: i64) -> Vec<f64> {
    let Some(first) = events.first() else {
        return Vec::new();
    };
    let end = first.timestamp_ms + window_ms;

    events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_press() && targets.contains(e.key_code) && e.timestamp_ms < end)
        .filter_map(|(i, press)| {
            events[i + 1..]
                .iter()
                .find(|e| e.is_release() && e.key_code == press.key_code)
                .map(|release| (release.timestamp_ms - press.timestamp_ms) as f64)
        })
        .collect()
}
