//! Core types for the Synheart Motor pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw key events and gyroscope recordings on the way in, per-window
//! feature records and diagnostics on the way out.

use crate::stats::Trend;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key transition recorded by the tapping test harness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum KeyPhase {
    /// Wire flag `1`
    Press,
    /// Wire flag `0`
    Release,
}

impl TryFrom<u8> for KeyPhase {
    type Error = String;

    fn try_from(flag: u8) -> Result<Self, Self::Error> {
        match flag {
            1 => Ok(KeyPhase::Press),
            0 => Ok(KeyPhase::Release),
            other => Err(format!("invalid key phase flag {other}, expected 0 or 1")),
        }
    }
}

impl From<KeyPhase> for u8 {
    fn from(phase: KeyPhase) -> Self {
        match phase {
            KeyPhase::Press => 1,
            KeyPhase::Release => 0,
        }
    }
}

/// A single key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    #[serde(rename = "k")]
    pub key_code: u16,
    #[serde(rename = "p")]
    pub phase: KeyPhase,
    /// Milliseconds from test start
    #[serde(rename = "e")]
    pub timestamp_ms: i64,
}

impl KeyEvent {
    pub fn press(key_code: u16, timestamp_ms: i64) -> Self {
        Self {
            key_code,
            phase: KeyPhase::Press,
            timestamp_ms,
        }
    }

    pub fn release(key_code: u16, timestamp_ms: i64) -> Self {
        Self {
            key_code,
            phase: KeyPhase::Release,
            timestamp_ms,
        }
    }

    pub fn is_press(&self) -> bool {
        self.phase == KeyPhase::Press
    }

    pub fn is_release(&self) -> bool {
        self.phase == KeyPhase::Release
    }
}

/// Target key(s) a subject is instructed to strike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targets {
    /// Repeated strikes of one key
    Single(u16),
    /// Alternation between two keys
    Alternating(u16, u16),
}

impl Targets {
    pub fn contains(&self, key_code: u16) -> bool {
        match *self {
            Targets::Single(key) => key == key_code,
            Targets::Alternating(a, b) => a == key_code || b == key_code,
        }
    }

    /// The key expected after `current`. For single-target tests this is the key itself.
    pub fn next_after(&self, current: u16) -> u16 {
        match *self {
            Targets::Single(key) => key,
            Targets::Alternating(a, b) => {
                if current == a {
                    b
                } else {
                    a
                }
            }
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Targets::Single(_))
    }
}

impl fmt::Display for Targets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Targets::Single(key) => write!(f, "{key}"),
            Targets::Alternating(a, b) => write!(f, "{a}/{b}"),
        }
    }
}

/// Half-open window `[first_event + offset, first_event + offset + duration)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub duration_ms: i64,
    #[serde(default)]
    pub offset_ms: i64,
}

impl Window {
    pub fn new(duration_ms: i64) -> Self {
        Self {
            duration_ms,
            offset_ms: 0,
        }
    }

    pub fn with_offset(duration_ms: i64, offset_ms: i64) -> Self {
        Self {
            duration_ms,
            offset_ms,
        }
    }

    /// Absolute `(start, end)` bounds for a stream whose first event is at `origin_ms`
    pub fn bounds(&self, origin_ms: i64) -> (i64, i64) {
        let start = origin_ms + self.offset_ms;
        (start, start + self.duration_ms)
    }
}

/// Physical hand / wrist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }

    pub fn opposite(&self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// Hand role relative to the subject's handedness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandRole {
    Dominant,
    NonDominant,
}

impl HandRole {
    /// Physical hand playing this role for a subject with the given handedness
    pub fn hand_for(&self, handedness: Hand) -> Hand {
        match self {
            HandRole::Dominant => handedness,
            HandRole::NonDominant => handedness.opposite(),
        }
    }
}

/// Clinical side code: 1 right, 2 left, 3 both, anything else unknown
pub fn is_affected(side: Option<i64>, hand: Hand) -> bool {
    matches!(
        (side, hand),
        (Some(1), Hand::Right) | (Some(2), Hand::Left) | (Some(3), _)
    )
}

/// Study cohort, parsed from the subject identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    /// Parkinson's disease, off medication
    PdOff,
    /// Parkinson's disease, on medication
    PdOn,
    /// Clinical control
    Ca,
    /// Healthy control
    Hc,
}

impl Cohort {
    pub fn from_subject_id(subject_id: &str) -> Option<Cohort> {
        let id = subject_id.to_ascii_uppercase();
        if id.contains("PD") && id.contains("OFF") {
            Some(Cohort::PdOff)
        } else if id.contains("PD") && id.contains("ON") {
            Some(Cohort::PdOn)
        } else if id.contains("CA") {
            Some(Cohort::Ca)
        } else if id.contains("HC") {
            Some(Cohort::Hc)
        } else {
            None
        }
    }
}

/// Angular-velocity trace from one wrist-worn sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GyroRecording {
    /// Sample times in seconds
    pub timestamps: Vec<f64>,
    /// Angular velocity along the analysed axis (deg/s)
    pub angular_velocity: Vec<f64>,
    /// Effective sample rate (Hz)
    pub sample_rate: f64,
}

impl GyroRecording {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Feature computed, but on too few points to be statistically meaningful
    NumericalWarning,
    /// Feature could not be computed and is reported as missing
    Warning,
}

/// Feature-level problem raised while deriving one hand's features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureIssue {
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_ms: Option<i64>,
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl FeatureIssue {
    pub fn missing(feature: &str, window_ms: Option<i64>, error: &crate::MotorError) -> Self {
        Self {
            feature: feature.to_string(),
            window_ms,
            severity: Severity::Warning,
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }

    pub fn numerical(feature: &str, window_ms: Option<i64>, message: String) -> Self {
        Self {
            feature: feature.to_string(),
            window_ms,
            severity: Severity::NumericalWarning,
            code: "numerical_warning".to_string(),
            message,
        }
    }
}

/// Attributable diagnostic recorded in a feature bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub subject_id: String,
    pub hand: Hand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_ms: Option<i64>,
    pub feature: String,
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn from_issue(
        subject_id: &str,
        hand: Hand,
        protocol: Option<&str>,
        issue: FeatureIssue,
    ) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            hand,
            protocol: protocol.map(str::to_string),
            window_ms: issue.window_ms,
            feature: issue.feature,
            severity: issue.severity,
            code: issue.code,
            message: issue.message,
        }
    }
}

/// Order statistics of one flight-time or dwell-time sequence after outlier rejection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceStats {
    /// Measurements before outlier rejection
    pub count: usize,
    /// Measurements surviving outlier rejection
    pub kept: usize,
    /// Measurements rejected as outliers
    pub outliers: usize,
    pub mean: Option<f64>,
    /// Sample variance (n - 1 denominator)
    pub variance: Option<f64>,
    pub trend: Option<Trend>,
    pub sequence_effect: Option<f64>,
}

/// Tapping features of one (protocol, hand, window) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TappingWindowFeatures {
    pub window_ms: i64,
    /// Kinesia score: number of flight times in the window
    pub taps: usize,
    /// `None` when no target release anchored the window
    pub errors: Option<f64>,
    /// Dysmetria score: mean key-strike accuracy (1 best, 3 worst)
    pub accuracy: Option<f64>,
    /// Slope of per-cycle tapping rate, in percent of the first cycle
    pub velocity_slope: Option<f64>,
    pub flight: SequenceStats,
    /// Dwell mean is the akinesia time; flight variance is the incoordination score
    pub dwell: SequenceStats,
}

/// All tapping features for one hand performing one test protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TappingHandFeatures {
    pub protocol: String,
    pub role: HandRole,
    pub hand: Hand,
    pub affected: bool,
    /// Trend of 2 s tap-rate windows relative to the first window
    pub velocity_trend: Option<Trend>,
    pub windows: Vec<TappingWindowFeatures>,
}

impl TappingHandFeatures {
    pub fn window(&self, window_ms: i64) -> Option<&TappingWindowFeatures> {
        self.windows.iter().find(|w| w.window_ms == window_ms)
    }
}

/// Absolute dominant/non-dominant difference of trend parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendAsymmetry {
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
    pub std_err: Option<f64>,
}

impl TrendAsymmetry {
    pub fn between(dominant: Option<&Trend>, non_dominant: Option<&Trend>) -> Self {
        match (dominant, non_dominant) {
            (Some(d), Some(n)) => Self {
                slope: Some((d.slope - n.slope).abs()),
                intercept: Some((d.intercept - n.intercept).abs()),
                std_err: Some((d.std_err - n.std_err).abs()),
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryFeatures {
    pub protocol: String,
    pub window_ms: i64,
    pub flight: TrendAsymmetry,
    pub dwell: TrendAsymmetry,
}

/// Immutable tapping feature bundle for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TappingBundle {
    pub subject_id: String,
    pub cohort: Option<Cohort>,
    pub handedness: Hand,
    pub hands: Vec<TappingHandFeatures>,
    pub asymmetry: Vec<AsymmetryFeatures>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TappingBundle {
    pub fn hand(&self, protocol: &str, role: HandRole) -> Option<&TappingHandFeatures> {
        self.hands
            .iter()
            .find(|h| h.protocol == protocol && h.role == role)
    }
}

/// Mean, variance and linear decrement of a half-cycle amplitude sequence
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AmplitudeStats {
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub decrement: Option<f64>,
}

/// Pronation-supination features of one wrist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableHandFeatures {
    pub hand: Hand,
    pub role: HandRole,
    pub affected: bool,
    pub samples: usize,
    /// Statistics of |amplitude| over all half-cycles
    pub amplitude: AmplitudeStats,
    /// Positive half-cycles
    pub supination: AmplitudeStats,
    /// Negative half-cycles
    pub pronation: AmplitudeStats,
    /// Coarse FFT peak of the raw signal (Hz)
    pub main_frequency: Option<f64>,
    pub period_variance: Option<f64>,
    pub period_decrement: Option<f64>,
    pub movements: usize,
    /// Wavelet-grid frequency with the largest coefficient magnitude (Hz)
    pub dominant_frequency: Option<f64>,
    pub hesitations: Option<usize>,
    pub freezes: Option<usize>,
}

/// Immutable wearable feature bundle for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearableBundle {
    pub subject_id: String,
    pub cohort: Option<Cohort>,
    pub handedness: Hand,
    pub hands: Vec<WearableHandFeatures>,
    pub diagnostics: Vec<Diagnostic>,
}

impl WearableBundle {
    pub fn hand(&self, hand: Hand) -> Option<&WearableHandFeatures> {
        self.hands.iter().find(|h| h.hand == hand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_event_wire_format() {
        let events: Vec<KeyEvent> =
            serde_json::from_str(r#"[{"k":80,"p":1,"e":0},{"k":80,"p":0,"e":100}]"#).unwrap();

        assert_eq!(
            events,
            vec![KeyEvent::press(80, 0), KeyEvent::release(80, 100)]
        );
        assert_eq!(
            serde_json::to_string(&events[1]).unwrap(),
            r#"{"k":80,"p":0,"e":100}"#
        );
    }

    #[test]
    fn test_invalid_phase_rejected() {
        let result = serde_json::from_str::<KeyEvent>(r#"{"k":80,"p":2,"e":0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_targets() {
        let qp = Targets::Alternating(80, 81);
        assert!(qp.contains(81));
        assert!(!qp.contains(79));
        assert_eq!(qp.next_after(80), 81);
        assert_eq!(qp.next_after(81), 80);

        let m = Targets::Single(77);
        assert_eq!(m.next_after(77), 77);
        assert!(m.is_single());
        assert_eq!(qp.to_string(), "80/81");
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(Window::new(10_000).bounds(250), (250, 10_250));
        assert_eq!(Window::with_offset(2_000, 4_000).bounds(250), (4_250, 6_250));
    }

    #[test]
    fn test_affected_side() {
        assert!(is_affected(Some(1), Hand::Right));
        assert!(!is_affected(Some(1), Hand::Left));
        assert!(is_affected(Some(2), Hand::Left));
        assert!(is_affected(Some(3), Hand::Left));
        assert!(is_affected(Some(3), Hand::Right));
        assert!(!is_affected(Some(0), Hand::Right));
        assert!(!is_affected(None, Hand::Left));
    }

    #[test]
    fn test_hand_roles() {
        assert_eq!(HandRole::Dominant.hand_for(Hand::Left), Hand::Left);
        assert_eq!(HandRole::NonDominant.hand_for(Hand::Left), Hand::Right);
    }

    #[test]
    fn test_cohort_from_subject_id() {
        assert_eq!(Cohort::from_subject_id("PD01_OFF"), Some(Cohort::PdOff));
        assert_eq!(Cohort::from_subject_id("PD21_ON"), Some(Cohort::PdOn));
        assert_eq!(Cohort::from_subject_id("CA13"), Some(Cohort::Ca));
        assert_eq!(Cohort::from_subject_id("HC08"), Some(Cohort::Hc));
        assert_eq!(Cohort::from_subject_id("X99"), None);
    }

    #[test]
    fn test_trend_asymmetry() {
        let dom = Trend {
            slope: 1.5,
            intercept: 100.0,
            std_err: 0.2,
        };
        let ndom = Trend {
            slope: 2.0,
            intercept: 90.0,
            std_err: 0.5,
        };

        let asym = TrendAsymmetry::between(Some(&dom), Some(&ndom));
        assert_eq!(asym.slope, Some(0.5));
        assert_eq!(asym.intercept, Some(10.0));
        assert!((asym.std_err.unwrap() - 0.3).abs() < 1e-12);

        assert_eq!(TrendAsymmetry::between(None, Some(&ndom)), TrendAsymmetry::default());
    }
}
