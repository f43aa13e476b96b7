use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::protocol::{
    AnalysisResult, AskRequest, AskResponse, ComparisonResult, Extraction, ServiceStatus,
};
#[cfg(feature = "auth")]
use shared::protocol::{LoginRequest, RegisterRequest};
use tracing::{debug, info, warn};

pub mod error;
pub mod metrics;
pub mod upload;

pub use error::GatewayError;
pub use metrics::{derive, DerivedMetrics, Verdict};
pub use upload::DocumentUpload;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
/// Answer shown by the copilot whenever the question round-trip fails.
pub const COPILOT_FALLBACK_ANSWER: &str = "AI unavailable.";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    /// `None` leaves requests unbounded; document analysis can take minutes.
    pub request_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout: None,
        }
    }
}

/// Outbound side of the dashboard: one intent in, one request out, one
/// payload or [`GatewayError`] back. No caching and no retries.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze_document(&self, upload: DocumentUpload)
        -> Result<AnalysisResult, GatewayError>;

    async fn compare_documents(
        &self,
        base: Option<DocumentUpload>,
        new: Option<DocumentUpload>,
    ) -> Result<ComparisonResult, GatewayError>;

    async fn ask_question(
        &self,
        question: &str,
        extraction: &Extraction,
        doc_id: Option<&str>,
    ) -> Result<AskResponse, GatewayError>;

    /// Best-effort copilot round-trip: every failure becomes
    /// [`COPILOT_FALLBACK_ANSWER`].
    async fn answer_question(
        &self,
        question: &str,
        extraction: &Extraction,
        doc_id: Option<&str>,
    ) -> String {
        match self.ask_question(question, extraction, doc_id).await {
            Ok(response) => response.answer,
            Err(err) => {
                warn!(error = %err, "copilot question failed; using fallback answer");
                COPILOT_FALLBACK_ANSWER.to_string()
            }
        }
    }

    #[cfg(feature = "auth")]
    async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), GatewayError>;

    #[cfg(feature = "auth")]
    async fn login_user(&self, email: &str, password: &str) -> Result<(), GatewayError>;

    async fn health(&self) -> Result<ServiceStatus, GatewayError>;
}

pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let parsed = url::Url::parse(config.base_url.trim()).map_err(|source| {
            GatewayError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(GatewayError::UnsupportedBaseUrl {
                url: config.base_url,
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GatewayError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn document_part(upload: DocumentUpload) -> Result<Part, GatewayError> {
        let mime_type = upload.mime_type_or_default().to_string();
        let filename = upload.filename;
        Part::bytes(upload.bytes)
            .file_name(filename.clone())
            .mime_str(&mime_type)
            .map_err(|_| GatewayError::InvalidContentType {
                filename,
                mime_type,
            })
    }

    async fn post_form(
        &self,
        operation: &'static str,
        form: Form,
    ) -> Result<Response, GatewayError> {
        let response = self
            .http
            .post(self.endpoint(operation))
            .multipart(form)
            .send()
            .await
            .map_err(|source| GatewayError::ServiceUnreachable { operation, source })?;
        ensure_success(operation, response)
    }

    async fn post_json<B: serde::Serialize + Sync>(
        &self,
        operation: &'static str,
        body: &B,
    ) -> Result<Response, GatewayError> {
        let response = self
            .http
            .post(self.endpoint(operation))
            .json(body)
            .send()
            .await
            .map_err(|source| GatewayError::ServiceUnreachable { operation, source })?;
        ensure_success(operation, response)
    }
}

fn ensure_success(operation: &'static str, response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!(operation, status = status.as_u16(), "service rejected request");
        Err(GatewayError::ServiceError {
            operation,
            status: status.as_u16(),
        })
    }
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, GatewayError> {
    response
        .json()
        .await
        .map_err(|source| GatewayError::MalformedResponse { operation, source })
}

#[cfg(feature = "auth")]
fn require_field(value: &str, field: &'static str) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        Err(GatewayError::MissingInput { field })
    } else {
        Ok(())
    }
}

#[async_trait]
impl AnalysisGateway for HttpGateway {
    async fn analyze_document(
        &self,
        upload: DocumentUpload,
    ) -> Result<AnalysisResult, GatewayError> {
        let upload = DocumentUpload::validated(Some(upload), "file")?;
        info!(
            filename = %upload.filename,
            size_bytes = upload.bytes.len(),
            "uploading document for analysis"
        );
        let form = Form::new().part("file", Self::document_part(upload)?);
        let response = self.post_form("analyze", form).await?;
        let analysis: AnalysisResult = decode("analyze", response).await?;
        debug!(
            clauses = analysis.extraction.len(),
            doc_id = ?analysis.doc_id,
            "analysis received"
        );
        Ok(analysis)
    }

    async fn compare_documents(
        &self,
        base: Option<DocumentUpload>,
        new: Option<DocumentUpload>,
    ) -> Result<ComparisonResult, GatewayError> {
        let base = DocumentUpload::validated(base, "file1")?;
        let new = DocumentUpload::validated(new, "file2")?;
        info!(
            base = %base.filename,
            new = %new.filename,
            "uploading document versions for comparison"
        );
        let form = Form::new()
            .part("file1", Self::document_part(base)?)
            .part("file2", Self::document_part(new)?);
        let response = self.post_form("compare", form).await?;
        decode("compare", response).await
    }

    async fn ask_question(
        &self,
        question: &str,
        extraction: &Extraction,
        doc_id: Option<&str>,
    ) -> Result<AskResponse, GatewayError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GatewayError::MissingInput { field: "question" });
        }
        let body = AskRequest {
            question: question.to_string(),
            extraction: extraction.clone(),
            doc_id: doc_id.map(str::to_string),
        };
        let response = self.post_json("ask", &body).await?;
        decode("ask", response).await
    }

    #[cfg(feature = "auth")]
    async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), GatewayError> {
        require_field(name, "name")?;
        require_field(email, "email")?;
        require_field(password, "password")?;
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("register", &body).await.map_err(|err| {
            warn!(error = %err, "register request failed");
            GatewayError::Auth {
                operation: "register",
            }
        })?;
        Ok(())
    }

    #[cfg(feature = "auth")]
    async fn login_user(&self, email: &str, password: &str) -> Result<(), GatewayError> {
        require_field(email, "email")?;
        require_field(password, "password")?;
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("login", &body).await.map_err(|err| {
            warn!(error = %err, "login request failed");
            GatewayError::Auth { operation: "login" }
        })?;
        Ok(())
    }

    async fn health(&self) -> Result<ServiceStatus, GatewayError> {
        let response = self
            .http
            .get(self.endpoint(""))
            .send()
            .await
            .map_err(|source| GatewayError::ServiceUnreachable {
                operation: "health",
                source,
            })?;
        let response = ensure_success("health", response)?;
        decode("health", response).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
