//! Remote service contracts
//!
//! The client core consumes two HTTP services it does not implement:
//!
//! - the upload service: `POST /upload` (multipart) and `GET /status/{task_id}`
//! - the query service: `POST /query`
//!
//! Both sit behind async traits so the state machines can be driven by the
//! bundled `reqwest` clients, by test doubles, or by any other transport.

use crate::error::{Result, RagdeskError};
use crate::jobs::UploadFile;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

pub mod query;
pub mod upload;

pub use query::HttpQueryClient;
pub use upload::HttpUploadClient;

/// User agent sent with every request
pub(crate) const USER_AGENT: &str = concat!("ragdesk/", env!("CARGO_PKG_VERSION"));

/// Upload and processing-status endpoints
#[async_trait]
pub trait UploadApi: Send + Sync {
    /// Upload one file and ask the service to start processing it
    ///
    /// # Errors
    ///
    /// Returns `RagdeskError::Transport` for network failures and non-2xx
    /// responses, `RagdeskError::Parse` for malformed bodies
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse>;

    /// Fetch the processing status of a previously accepted upload
    ///
    /// # Errors
    ///
    /// Returns `RagdeskError::Transport` for network failures and non-2xx
    /// responses, `RagdeskError::Parse` for malformed bodies or unknown
    /// status values
    async fn status(&self, task_id: &str) -> Result<StatusResponse>;
}

/// Question-answering endpoint
#[async_trait]
pub trait QueryApi: Send + Sync {
    /// Ask a question against the indexed documents
    ///
    /// # Errors
    ///
    /// Returns `RagdeskError::Transport` for network failures and non-2xx
    /// responses (carrying the server's `detail` when present),
    /// `RagdeskError::Parse` for malformed bodies
    async fn query(&self, question: &str, num_chunks: u32) -> Result<QueryResponse>;
}

/// Body of `POST /upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Whether the service accepted the file
    pub success: bool,
    /// Handle for status polling, present on success
    #[serde(default)]
    pub task_id: Option<String>,
    /// Human-readable outcome
    #[serde(default)]
    pub message: Option<String>,
}

/// Remote processing state reported by `GET /status/{task_id}`
///
/// Any other value on the wire is rejected as a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    /// Still running
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

/// Body of `GET /status/{task_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Echo of the polled task id
    #[serde(default)]
    pub task_id: Option<String>,
    /// Processing state
    pub status: RemoteStatus,
    /// Latest human-readable status line
    pub message: String,
    /// Free-text progress, expected to contain a percentage such as `"37%"`
    #[serde(default)]
    pub progress: Option<String>,
}

/// Body of `POST /query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question
    pub question: String,
    /// Number of retrieval chunks to ground the answer on
    pub num_chunks: u32,
}

/// Answer returned by `POST /query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Echo of the question
    #[serde(default)]
    pub question: Option<String>,
    /// Generated answer, possibly with lightweight markup
    pub answer: String,
    /// Citation labels; numeric ids on the wire become strings
    #[serde(default, deserialize_with = "citation_labels")]
    pub sources: Vec<String>,
    /// Server-side latency
    #[serde(default, deserialize_with = "optional_millis")]
    pub runtime_ms: Option<u64>,
    /// Number of retrieved chunks the answer used
    #[serde(default)]
    pub chunks_used: Option<u32>,
    /// Whether the service flagged the answer as weakly grounded
    #[serde(default)]
    pub low_confidence: Option<bool>,
}

fn citation_labels<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .map(|value| match value {
            serde_json::Value::String(label) => label,
            other => other.to_string(),
        })
        .collect())
}

fn optional_millis<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(value.and_then(|n| {
        n.as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
    }))
}

/// Build `base/segment/...`, percent-encoding each segment
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RagdeskError::Config(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Human-readable message for a non-2xx response
///
/// Prefers the `detail` field of a JSON error body, then the raw body, then
/// the status line.
pub(crate) fn describe_http_error(status: reqwest::StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<serde_json::Value>,
    }

    if let Ok(ErrorBody {
        detail: Some(detail),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        return match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP error! status: {}", status)
    } else {
        format!("HTTP error! status: {}: {}", status, body)
    }
}
