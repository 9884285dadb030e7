//! Analysis configuration
//!
//! Every knob has a default matching the standard assessment protocol, so an
//! empty JSON object is a valid configuration.

use crate::error::MotorError;
use crate::outliers::OutlierConfig;
use crate::tapping::protocol::{default_protocols, TestProtocol};
use crate::tapping::velocity::VelocityConfig;
use crate::wearable::WearableConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analysis windows measured from the first event of each stream
    pub windows_ms: Vec<i64>,
    pub outliers: OutlierConfig,
    pub velocity: VelocityConfig,
    pub wearable: WearableConfig,
    pub protocols: Vec<TestProtocol>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            windows_ms: vec![10_000, 30_000, 60_000],
            outliers: OutlierConfig::default(),
            velocity: VelocityConfig::default(),
            wearable: WearableConfig::default(),
            protocols: default_protocols(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, MotorError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MotorError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, MotorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn protocol(&self, name: &str) -> Option<&TestProtocol> {
        self.protocols.iter().find(|p| p.name == name)
    }

    pub fn validate(&self) -> Result<(), MotorError> {
        if self.windows_ms.is_empty() {
            return Err(MotorError::Config("at least one analysis window is required".into()));
        }
        if let Some(w) = self.windows_ms.iter().find(|w| **w <= 0) {
            return Err(MotorError::Config(format!("window must be positive, got {w} ms")));
        }
        if !(self.outliers.m > 0.0) {
            return Err(MotorError::Config(format!(
                "outlier multiplier must be positive, got {}",
                self.outliers.m
            )));
        }
        if self.velocity.step_ms <= 0 || self.velocity.span_ms <= self.velocity.step_ms {
            return Err(MotorError::Config(format!(
                "velocity span {} ms must exceed a positive step, got step {} ms",
                self.velocity.span_ms, self.velocity.step_ms
            )));
        }

        let wearable = &self.wearable;
        if wearable.extrema_order == 0 {
            return Err(MotorError::Config("extrema order must be at least 1".into()));
        }
        if wearable.cwt.frequencies == 0 || !(wearable.cwt.min_frequency > 0.0) || !(wearable.cwt.w > 0.0) {
            return Err(MotorError::Config(
                "cwt needs a positive frequency count, minimum frequency and omega0".into(),
            ));
        }
        for (name, ratio) in [
            ("hesitation", wearable.hesitation_ratio),
            ("freeze", wearable.freeze_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(MotorError::Config(format!(
                    "{name} ratio must be in (0, 1], got {ratio}"
                )));
            }
        }

        let mut names = HashSet::new();
        for protocol in &self.protocols {
            if !names.insert(protocol.name.as_str()) {
                return Err(MotorError::Config(format!(
                    "duplicate protocol '{}'",
                    protocol.name
                )));
            }
            if protocol.dominant_slot == protocol.non_dominant_slot {
                return Err(MotorError::Config(format!(
                    "protocol '{}' uses slot '{}' for both hands",
                    protocol.name, protocol.dominant_slot
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.windows_ms, vec![10_000, 30_000, 60_000]);
        assert_eq!(config.protocols.len(), 3);
        assert!(config.protocol("mn").is_some());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config =
            AnalysisConfig::from_json(r#"{"windows_ms": [5000], "wearable": {"extrema_order": 20}}"#)
                .unwrap();
        assert_eq!(config.windows_ms, vec![5000]);
        assert_eq!(config.wearable.extrema_order, 20);
        assert_eq!(config.wearable.freeze_ratio, 0.25);
        assert_eq!(config.outliers.m, 2.0);
    }

    #[test]
    fn test_json_round_trip() {
        let config = AnalysisConfig::default();
        let parsed = AnalysisConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for json in [
            r#"{"windows_ms": []}"#,
            r#"{"windows_ms": [0]}"#,
            r#"{"outliers": {"m": 0}}"#,
            r#"{"velocity": {"step_ms": 0}}"#,
            r#"{"wearable": {"freeze_ratio": 1.5}}"#,
        ] {
            let err = AnalysisConfig::from_json(json).unwrap_err();
            assert!(matches!(err, MotorError::Config(_)), "{json}");
        }
    }

    #[test]
    fn test_rejects_duplicate_protocols() {
        let mut config = AnalysisConfig::default();
        let qp = config.protocols[0].clone();
        config.protocols.push(qp);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            AnalysisConfig::from_json("{"),
            Err(MotorError::JsonError(_))
        ));
    }
}
