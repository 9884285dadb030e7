//! Output encoding
//!
//! Wraps feature bundles into a self-describing envelope carrying producer
//! and provenance metadata. A record that failed validation still produces an
//! envelope, with `status = failed` and the error in place of features.

use crate::error::MotorError;
use crate::types::{TappingBundle, WearableBundle};
use crate::{MOTOR_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Output envelope schema identifier
pub const OUTPUT_SCHEMA_VERSION: &str = "motor.features.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureBundle {
    Tapping(TappingBundle),
    Wearable(WearableBundle),
}

impl FeatureBundle {
    pub fn subject_id(&self) -> &str {
        match self {
            FeatureBundle::Tapping(b) => &b.subject_id,
            FeatureBundle::Wearable(b) => &b.subject_id,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            FeatureBundle::Tapping(_) => RecordKind::Tapping,
            FeatureBundle::Wearable(_) => RecordKind::Wearable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Tapping,
    Wearable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub subject_id: String,
    pub record_kind: RecordKind,
    pub computed_at_utc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorPayload {
    pub schema_version: String,
    pub producer: Producer,
    pub provenance: Provenance,
    pub status: PayloadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PayloadError>,
}

/// Encoder stamping every payload with one producer instance
pub struct MotorEncoder {
    instance_id: String,
}

impl Default for MotorEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MotorEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode(&self, bundle: FeatureBundle) -> MotorPayload {
        MotorPayload {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            producer: self.producer(),
            provenance: self.provenance(bundle.subject_id(), bundle.kind()),
            status: PayloadStatus::Ok,
            features: Some(bundle),
            error: None,
        }
    }

    pub fn encode_failure(&self, subject_id: &str, kind: RecordKind, error: &MotorError) -> MotorPayload {
        MotorPayload {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            producer: self.producer(),
            provenance: self.provenance(subject_id, kind),
            status: PayloadStatus::Failed,
            features: None,
            error: Some(PayloadError {
                code: error.code().to_string(),
                message: error.to_string(),
            }),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(&self, bundle: FeatureBundle) -> Result<String, MotorError> {
        let payload = self.encode(bundle);
        serde_json::to_string_pretty(&payload).map_err(MotorError::JsonError)
    }

    fn producer(&self) -> Producer {
        Producer {
            name: PRODUCER_NAME.to_string(),
            version: MOTOR_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    fn provenance(&self, subject_id: &str, record_kind: RecordKind) -> Provenance {
        Provenance {
            subject_id: subject_id.to_string(),
            record_kind,
            computed_at_utc: Utc::now().to_rfc3339(),
        }
    }
}
