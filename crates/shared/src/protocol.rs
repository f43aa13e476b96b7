use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Clause name to extracted value, as produced by the intelligence service.
pub type Extraction = Map<String, Value>;

pub const CONFIDENCE_MIN: f64 = 0.0;
pub const CONFIDENCE_MAX: f64 = 100.0;

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Optional extras: a value of the wrong type reads as absent instead of
/// failing the whole payload.
fn lenient_optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

/// Output of `POST /analyze` for one document.
///
/// Every field is optional on the wire; missing or `null` values decode to
/// their empty defaults so downstream metric derivation never has to care.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risks: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extraction: Extraction,
    #[serde(default, deserialize_with = "null_as_default")]
    pub negotiation: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub engine: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub pages_processed: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub doc_id: Option<String>,
}

impl AnalysisResult {
    /// Confidence clamped into `[0, 100]`; absent or non-finite reads as zero.
    pub fn confidence(&self) -> f64 {
        match self.confidence {
            Some(value) if value.is_finite() => value.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX),
            _ => CONFIDENCE_MIN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub comparison: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub extraction: Extraction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `GET /` on the intelligence service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub methods: Vec<String>,
}
