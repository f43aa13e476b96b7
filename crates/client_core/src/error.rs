use shared::error::{ErrorKind, ServiceFailure};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing required input: {field}")]
    MissingInput { field: &'static str },
    #[error("invalid content type {mime_type:?} for {filename}")]
    InvalidContentType { filename: String, mime_type: String },
    #[error("invalid service base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("service base url {url:?} must be an absolute http(s) url")]
    UnsupportedBaseUrl { url: String },
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("{operation}: service unreachable: {source}")]
    ServiceUnreachable {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("{operation}: service responded with status {status}")]
    ServiceError { operation: &'static str, status: u16 },
    #[error("{operation}: malformed response body: {source}")]
    MalformedResponse {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("{operation} failed")]
    Auth { operation: &'static str },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput { .. }
            | Self::InvalidContentType { .. }
            | Self::InvalidBaseUrl { .. }
            | Self::UnsupportedBaseUrl { .. } => ErrorKind::Validation,
            Self::ClientBuild(_) | Self::ServiceUnreachable { .. } => {
                ErrorKind::ServiceUnreachable
            }
            Self::ServiceError { .. } | Self::MalformedResponse { .. } => ErrorKind::ServiceError,
            Self::Auth { .. } => ErrorKind::Auth,
        }
    }

    /// True when the error was raised before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. }
                | Self::InvalidContentType { .. }
                | Self::InvalidBaseUrl { .. }
                | Self::UnsupportedBaseUrl { .. }
        )
    }

    pub fn to_failure(&self) -> ServiceFailure {
        ServiceFailure::new(self.kind(), self.to_string())
    }
}

impl From<GatewayError> for ServiceFailure {
    fn from(value: GatewayError) -> Self {
        value.to_failure()
    }
}
