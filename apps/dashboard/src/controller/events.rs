//! Backend-to-UI events and user-facing error modeling for the dashboard controller.

use std::path::Path;

use client_core::GatewayError;
#[cfg(feature = "auth")]
use shared::domain::AuthAction;
use shared::{
    domain::RequestTicket,
    error::ErrorKind,
    protocol::{AnalysisResult, ComparisonResult, ServiceStatus},
};

#[derive(Debug, Clone)]
pub enum UiEvent {
    Error(UiError),
    AnalysisFinished {
        ticket: RequestTicket,
        result: Result<AnalysisResult, UiError>,
    },
    ComparisonFinished {
        ticket: RequestTicket,
        result: Result<ComparisonResult, UiError>,
    },
    /// Always carries an answer; failures arrive as the fallback text.
    CopilotAnswered {
        ticket: RequestTicket,
        answer: String,
    },
    #[cfg(feature = "auth")]
    AuthFinished {
        ticket: RequestTicket,
        action: AuthAction,
        result: Result<(), UiError>,
    },
    HealthChecked {
        ticket: RequestTicket,
        result: Result<ServiceStatus, UiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Analyze,
    Compare,
    Ask,
    Register,
    Login,
    Health,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: ErrorKind,
    context: UiErrorContext,
    message: String,
    detail: Option<String>,
}

impl UiError {
    pub fn validation(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: ErrorKind::Validation,
            context,
            message: message.into(),
            detail: None,
        }
    }

    pub fn from_gateway(context: UiErrorContext, err: &GatewayError) -> Self {
        let failure = err.to_failure();
        let category = failure.kind;
        let message = match (category, context) {
            (ErrorKind::Validation, UiErrorContext::Compare) => "Upload both files".to_string(),
            (ErrorKind::Validation, UiErrorContext::Register | UiErrorContext::Login) => {
                "Fill all fields".to_string()
            }
            (ErrorKind::Validation, _) => err.to_string(),
            (ErrorKind::ServiceUnreachable, _) => "Backend not reachable".to_string(),
            (_, UiErrorContext::Register) => "Signup failed".to_string(),
            (_, UiErrorContext::Login) => "Login failed".to_string(),
            (ErrorKind::Auth, _) => "Authentication failed".to_string(),
            (ErrorKind::ServiceError, UiErrorContext::Analyze) => "Analyze failed".to_string(),
            (ErrorKind::ServiceError, UiErrorContext::Compare) => "Comparison failed".to_string(),
            (ErrorKind::ServiceError, _) => category.user_message().to_string(),
        };
        Self {
            category,
            context,
            message,
            detail: Some(failure.message),
        }
    }

    pub fn unreadable_document(
        context: UiErrorContext,
        path: &Path,
        err: &std::io::Error,
    ) -> Self {
        Self {
            category: ErrorKind::Validation,
            context,
            message: format!("Could not read {}", path.display()),
            detail: Some(err.to_string()),
        }
    }

    pub fn backend_unavailable(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: ErrorKind::ServiceUnreachable,
            context,
            message: message.into(),
            detail: None,
        }
    }

    pub fn category(&self) -> ErrorKind {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl std::fmt::Display for UiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
