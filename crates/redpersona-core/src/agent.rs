//! The inference capability seam.
//!
//! An `InferenceAgent` turns a prompt into free text. Implementations live in
//! `redpersona-interaction`; tests use scripted agents.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One bounded request to the inference capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// System instruction framing the task
    pub system: String,
    /// Goal, evidence legend and citation instructions
    pub prompt: String,
    /// Upper bound on the response size
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Failures of the inference capability.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Network, quota or server-side failure
    #[error("Transient inference failure: {message}")]
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The call did not complete within the per-call timeout
    #[error("Inference call timed out after {0:?}")]
    Timeout(Duration),

    /// Empty or garbled output
    #[error("Malformed inference response: {0}")]
    Malformed(String),

    /// The request itself was refused (bad credentials, invalid request)
    #[error("Inference request rejected: {0}")]
    Permanent(String),
}

impl InferenceError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent(_))
    }

    /// Delay suggested by the capability before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Something that can analyze a prompt and answer in free text.
#[async_trait]
pub trait InferenceAgent: Send + Sync {
    /// Short description used in logs.
    fn expertise(&self) -> &str;

    async fn execute(&self, request: InferenceRequest) -> Result<String, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(InferenceError::transient("503").is_retryable());
        assert!(InferenceError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(InferenceError::Malformed("empty".into()).is_retryable());
        assert!(!InferenceError::Permanent("401".into()).is_retryable());
    }

    #[test]
    fn test_retry_after_only_for_transient() {
        let err = InferenceError::Transient {
            message: "rate limited".into(),
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
        assert_eq!(InferenceError::Malformed("x".into()).retry_after(), None);
    }
}
