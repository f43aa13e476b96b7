use std::path::Path;

use crate::error::GatewayError;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One document ready to be sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first()
            .map(|mime| mime.essence_str().to_string());
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::new(filename, bytes))
    }

    pub fn mime_type_or_default(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() || self.filename.trim().is_empty()
    }

    pub(crate) fn validated(
        upload: Option<Self>,
        field: &'static str,
    ) -> Result<Self, GatewayError> {
        match upload {
            Some(upload) if !upload.is_empty() => Ok(upload),
            _ => Err(GatewayError::MissingInput { field }),
        }
    }
}
