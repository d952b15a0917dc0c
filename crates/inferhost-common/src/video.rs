use serde::{Deserialize, Serialize};

/// Lifecycle of a video generation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VideoRequestStatus {
    Created,
    Queued,
    Dispatched,
    Processing,
    Success,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl VideoRequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            VideoRequestStatus::Success | VideoRequestStatus::Failed | VideoRequestStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VideoRequestStatus::Created => "created",
            VideoRequestStatus::Queued => "queued",
            VideoRequestStatus::Dispatched => "dispatched",
            VideoRequestStatus::Processing => "processing",
            VideoRequestStatus::Success => "success",
            VideoRequestStatus::Failed => "failed",
            VideoRequestStatus::Cancelled => "cancelled",
            VideoRequestStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for VideoRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submit a generation job. `payload` is model specific (prompt, image URL,
/// duration, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequestRequest {
    pub model: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequestResponse {
    pub request_id: String,
    #[serde(default)]
    pub status: Option<VideoRequestStatus>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequestResponse {
    pub request_id: String,
    pub status: VideoRequestStatus,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    /// Result or error details once the request is terminal.
    #[serde(default)]
    pub outcome: Option<serde_json::Value>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub queued_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoModel {
    pub model: String,
    #[serde(default)]
    pub brief_description: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoModelDetail {
    pub model: String,
    #[serde(default)]
    pub detailed_description: Option<String>,
    /// JSON schema of the accepted payload.
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
    #[serde(default)]
    pub price: Option<serde_json::Value>,
}
