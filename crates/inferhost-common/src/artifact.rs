use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build lifecycle of an artifact. Only the server moves an artifact
/// between these states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Init,
    Created,
    Building,
    Success,
    #[serde(alias = "FAILED")]
    Failure,
    Timeout,
    Cancelled,
    /// Any status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    /// SUCCESS, FAILURE, TIMEOUT and CANCELLED never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildStatus::Success
                | BuildStatus::Failure
                | BuildStatus::Timeout
                | BuildStatus::Cancelled
        )
    }

    pub fn is_failure(self) -> bool {
        self.is_terminal() && self != BuildStatus::Success
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildStatus::Init => "INIT",
            BuildStatus::Created => "CREATED",
            BuildStatus::Building => "BUILDING",
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::Timeout => "TIMEOUT",
            BuildStatus::Cancelled => "CANCELLED",
            BuildStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata about a large file stored alongside an artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BigFileMetadata {
    #[serde(default)]
    pub gcs_link: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub upload_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub artifact_name: Option<String>,
    #[serde(default)]
    pub artifact_description: Option<String>,
    #[serde(default)]
    pub artifact_tags: Option<Vec<String>>,
    #[serde(default)]
    pub artifact_volume_path: Option<String>,
    #[serde(default)]
    pub artifact_template_id: Option<String>,
    #[serde(default)]
    pub big_files_metadata: Option<Vec<BigFileMetadata>>,
}

/// Server-side build state and upload links of an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactData {
    #[serde(default)]
    pub artifact_type: Option<String>,
    /// Pre-signed URL for the artifact bundle (small-file upload).
    #[serde(default)]
    pub upload_link: Option<String>,
    /// Resumable URL for chunked uploads.
    #[serde(default)]
    pub resumable_upload_link: Option<String>,
    #[serde(default)]
    pub artifact_link: Option<String>,
    pub build_status: BuildStatus,
    #[serde(default)]
    pub build_id: Option<String>,
    #[serde(default)]
    pub build_file_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub create_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: String,
    pub artifact_data: ArtifactData,
    #[serde(default)]
    pub artifact_metadata: ArtifactMetadata,
}

impl Artifact {
    pub fn build_status(&self) -> BuildStatus {
        self.artifact_data.build_status
    }

    pub fn name(&self) -> &str {
        self.artifact_metadata
            .artifact_name
            .as_deref()
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtifactRequest {
    pub artifact_name: String,
    #[serde(default)]
    pub artifact_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtifactResponse {
    pub artifact_id: String,
    /// Pre-signed URL for the artifact bundle.
    pub upload_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtifactFromTemplateRequest {
    pub artifact_template_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtifactFromTemplateResponse {
    pub artifact_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Ask the artifact service for a resumable upload URL for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumableUploadLinkRequest {
    pub artifact_id: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumableUploadLinkResponse {
    pub artifact_id: String,
    pub upload_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildArtifactResponse {
    pub artifact_id: String,
    pub build_status: BuildStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteArtifactResponse {
    pub artifact_id: String,
    #[serde(default)]
    pub delete_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBigfileResponse {
    pub artifact_id: String,
    pub file_name: String,
    pub status: String,
}

/// Environment variables baked into an artifact built from a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddEnvParametersRequest {
    pub artifact_id: String,
    pub env_parameters: Vec<EnvParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvParameter {
    pub key: String,
    pub value: String,
}

impl AddEnvParametersRequest {
    /// Build the request from a key/value map, sorted by key so the wire
    /// order is stable.
    pub fn from_map(artifact_id: &str, env: &HashMap<String, String>) -> Self {
        let mut env_parameters: Vec<EnvParameter> = env
            .iter()
            .map(|(k, v)| EnvParameter {
                key: k.clone(),
                value: v.clone(),
            })
            .collect();
        env_parameters.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            artifact_id: artifact_id.to_string(),
            env_parameters,
        }
    }
}
