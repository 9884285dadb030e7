//! Error types for Synheart Motor

use crate::types::Targets;
use thiserror::Error;

/// Errors that can occur during feature extraction
#[derive(Debug, Error)]
pub enum MotorError {
    /// No release of a target key was found at or after the window start.
    /// `discarded_errors` holds the off-target releases seen during the failed scan.
    #[error("No release of target {targets} found in stream ({discarded_errors} off-target releases seen)")]
    MalformedStream {
        targets: Targets,
        discarded_errors: u32,
    },

    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Degenerate statistics: {0}")]
    DegenerateStatistics(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MotorError {
    /// Short machine-readable code used in diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            MotorError::MalformedStream { .. } => "malformed_stream",
            MotorError::InsufficientData { .. } => "insufficient_data",
            MotorError::DegenerateStatistics(_) => "degenerate_statistics",
            MotorError::InvalidInput(_) => "invalid_input",
            MotorError::Config(_) => "config",
            MotorError::JsonError(_) => "json",
            MotorError::Io(_) => "io",
        }
    }
}
