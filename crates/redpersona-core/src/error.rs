//! Error types for the persona pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole workspace.
///
/// The first four variants are the pipeline's failure taxonomy. Only
/// `MalformedEvidence` and `ReportUnavailable` ever end a run; the two
/// inference variants are recovered inside a category and only show up in
/// logs and degraded-section reasons.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PersonaError {
    /// No usable evidence survived normalization.
    #[error("Malformed evidence: no usable items after normalization ({dropped} dropped)")]
    MalformedEvidence { dropped: usize },

    /// The inference capability failed in a way that may succeed on retry.
    #[error("Inference transient failure: {0}")]
    InferenceTransient(String),

    /// The inference capability cited a local index it was never shown.
    #[error("Inference cited unknown source #{index} in category '{category}'")]
    InferenceInvariantViolation { category: String, index: usize },

    /// Every category degraded, so there is nothing to report.
    #[error("Report unavailable: all {degraded} categories degraded or failed")]
    ReportUnavailable { degraded: usize },

    /// The given profile URL is not a recognised Reddit user URL.
    #[error("Invalid profile URL: {0}")]
    InvalidProfileUrl(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The activity source could not be read.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The run was cancelled before it could finish.
    #[error("Run cancelled")]
    Cancelled,

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersonaError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error ends a run.
    ///
    /// `InferenceTransient` and `InferenceInvariantViolation` are always
    /// recovered at category level.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::InferenceTransient(_) | Self::InferenceInvariantViolation { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_report_unavailable(&self) -> bool {
        matches!(self, Self::ReportUnavailable { .. })
    }

    pub fn is_malformed_evidence(&self) -> bool {
        matches!(self, Self::MalformedEvidence { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PersonaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PersonaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PersonaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for PersonaError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for PersonaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, PersonaError>`.
pub type Result<T> = std::result::Result<T, PersonaError>;
