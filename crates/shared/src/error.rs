use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required local input was missing; nothing was sent.
    Validation,
    /// No response was received from the intelligence service.
    ServiceUnreachable,
    /// A response arrived but reported failure (or could not be decoded).
    ServiceError,
    Auth,
}

impl ErrorKind {
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Validation => "Missing input",
            Self::ServiceUnreachable => "Backend not reachable",
            Self::ServiceError => "The analysis service reported a failure",
            Self::Auth => "Authentication failed",
        }
    }
}

/// Serialisable failure summary handed from the backend worker to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind:?}: {message}")]
pub struct ServiceFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
