use std::path::PathBuf;
use std::time::Duration;

use crate::artifact_manager::{DEFAULT_BUILD_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_UPLOAD_CONCURRENCY};
use crate::error::{SdkError, SdkResult};
use crate::task_manager::DEFAULT_TASK_TIMEOUT;
use crate::upload::DEFAULT_CHUNK_SIZE;

pub const DEFAULT_IAM_URL: &str = "https://api.inferhost.dev/iam";
pub const DEFAULT_ARTIFACT_URL: &str = "https://api.inferhost.dev/artifact";
pub const DEFAULT_TASK_URL: &str = "https://api.inferhost.dev/task";
pub const DEFAULT_VIDEO_URL: &str = "https://api.inferhost.dev/video";

pub const DEFAULT_CLIENT_ID: &str = "inferhost-sdk";

/// Per-request timeout for JSON API calls. Uploads use their own client.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_CLIENT_ID: &str = "INFERHOST_CLIENT_ID";
pub const ENV_EMAIL: &str = "INFERHOST_EMAIL";
pub const ENV_PASSWORD: &str = "INFERHOST_PASSWORD";
pub const ENV_API_KEY: &str = "INFERHOST_API_KEY";
pub const ENV_IAM_URL: &str = "INFERHOST_IAM_URL";
pub const ENV_ARTIFACT_URL: &str = "INFERHOST_ARTIFACT_URL";
pub const ENV_TASK_URL: &str = "INFERHOST_TASK_URL";
pub const ENV_VIDEO_URL: &str = "INFERHOST_VIDEO_URL";

/// Credentials and service endpoints for a [`crate::Client`].
#[derive(Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub email: Option<String>,
    pub password: Option<String>,
    /// When set, used as the bearer token and password login is skipped.
    pub api_key: Option<String>,
    pub iam_url: String,
    pub artifact_url: String,
    pub task_url: String,
    pub video_url: String,
    /// Refresh-token cache file. `None` disables the cache.
    pub credential_path: Option<PathBuf>,
    pub request_timeout: Duration,
    /// Parallel model-file uploads.
    pub upload_concurrency: usize,
    /// Chunk size of resumable uploads, in bytes.
    pub chunk_size: u64,
    /// Interval between artifact build and task status polls.
    pub poll_interval: Duration,
    pub build_timeout: Duration,
    /// Limit for a task to start, stop, or bring up an endpoint.
    pub task_timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("iam_url", &self.iam_url)
            .field("artifact_url", &self.artifact_url)
            .field("task_url", &self.task_url)
            .field("video_url", &self.video_url)
            .field("credential_path", &self.credential_path)
            .field("request_timeout", &self.request_timeout)
            .field("upload_concurrency", &self.upload_concurrency)
            .field("chunk_size", &self.chunk_size)
            .field("poll_interval", &self.poll_interval)
            .field("build_timeout", &self.build_timeout)
            .field("task_timeout", &self.task_timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            email: None,
            password: None,
            api_key: None,
            iam_url: DEFAULT_IAM_URL.to_string(),
            artifact_url: DEFAULT_ARTIFACT_URL.to_string(),
            task_url: DEFAULT_TASK_URL.to_string(),
            video_url: DEFAULT_VIDEO_URL.to_string(),
            credential_path: crate::auth::CredentialStore::default_path(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Read credentials and URL overrides from `INFERHOST_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            client_id: get(ENV_CLIENT_ID).unwrap_or(defaults.client_id),
            email: get(ENV_EMAIL),
            password: get(ENV_PASSWORD),
            api_key: get(ENV_API_KEY),
            iam_url: get(ENV_IAM_URL).unwrap_or(defaults.iam_url),
            artifact_url: get(ENV_ARTIFACT_URL).unwrap_or(defaults.artifact_url),
            task_url: get(ENV_TASK_URL).unwrap_or(defaults.task_url),
            video_url: get(ENV_VIDEO_URL).unwrap_or(defaults.video_url),
            ..defaults
        }
    }

    pub fn with_credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_credential_path(mut self, path: Option<PathBuf>) -> Self {
        self.credential_path = path;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Either an API key or an email/password pair must be present.
    pub fn validate(&self) -> SdkResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(SdkError::Config(format!("{ENV_CLIENT_ID} is empty")));
        }
        if self.chunk_size == 0 || self.upload_concurrency == 0 {
            return Err(SdkError::Config(
                "chunk size and upload concurrency must be positive".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(SdkError::Config("poll interval must be positive".into()));
        }
        if self.api_key.is_some() {
            return Ok(());
        }
        if self.email.is_none() || self.password.is_none() {
            return Err(SdkError::Config(format!(
                "set {ENV_API_KEY}, or both {ENV_EMAIL} and {ENV_PASSWORD}"
            )));
        }
        Ok(())
    }
}
