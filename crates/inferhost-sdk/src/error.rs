use inferhost_common::{BuildStatus, TaskStatus};

use crate::serve_command::ServeCommandError;

/// SDK-level error type.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// The service answered with a non-2xx status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    /// The request never got a usable answer: connection failure or a body
    /// that is not valid JSON.
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("Invalid argument: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Artifact {artifact_id} build failed with status {status}")]
    BuildFailed {
        artifact_id: String,
        status: BuildStatus,
    },
    #[error("Task {task_id} ended in status {status}")]
    TaskFailed { task_id: String, status: TaskStatus },
    #[error("Every endpoint of task {task_id} failed")]
    EndpointFailed { task_id: String },
    #[error("{what} did not finish within {timeout_secs}s")]
    Timeout { what: String, timeout_secs: u64 },
    #[error(transparent)]
    ServeCommand(#[from] ServeCommandError),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

impl SdkError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Reject `None`, empty and whitespace-only values before any network call.
pub(crate) fn require_non_empty(value: &str, what: &str) -> SdkResult<()> {
    if value.trim().is_empty() {
        return Err(SdkError::Validation(format!(
            "{what} is required and cannot be empty"
        )));
    }
    Ok(())
}
