use std::sync::Arc;
use std::time::Duration;

use inferhost_common::{Task, TaskScheduling};

use crate::artifact_client::ArtifactClient;
use crate::artifact_manager::ArtifactManager;
use crate::auth::{AuthProvider, CredentialStore, IamClient, OtpProvider};
use crate::config::ClientConfig;
use crate::error::{SdkError, SdkResult};
use crate::task_client::TaskClient;
use crate::task_manager::TaskManager;
use crate::transport::HttpClient;
use crate::video_client::VideoClient;
use crate::video_manager::VideoManager;

const UPLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated entry point bundling one manager per service.
pub struct Client {
    iam: Arc<IamClient>,
    artifacts: ArtifactManager,
    tasks: TaskManager,
    videos: VideoManager,
}

impl Client {
    /// Authenticate and build the managers. With an API key the key is used
    /// as the bearer token; otherwise a cached refresh token is tried before
    /// a password login. `otp` answers 2FA prompts.
    pub async fn connect(config: ClientConfig, otp: Option<&dyn OtpProvider>) -> SdkResult<Self> {
        config.validate()?;

        let api_http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SdkError::Config(format!("failed to build HTTP client: {e}")))?;
        // Uploads can run for a long time; only bound the connect phase.
        let upload_http = reqwest::Client::builder()
            .connect_timeout(UPLOAD_CONNECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SdkError::Config(format!("failed to build upload client: {e}")))?;

        let iam_http = HttpClient::new(&config.iam_url, api_http.clone());
        let iam = match &config.api_key {
            Some(key) => IamClient::with_api_key(&config.client_id, key, iam_http),
            None => {
                let iam = IamClient::new(
                    &config.client_id,
                    config.email.as_deref().unwrap_or_default(),
                    config.password.as_deref().unwrap_or_default(),
                    iam_http,
                    config.credential_path.clone().map(CredentialStore::new),
                );
                iam.authenticate(otp).await?;
                iam
            }
        };
        let iam = Arc::new(iam);
        let auth: Arc<dyn AuthProvider> = iam.clone();

        let artifacts = ArtifactManager::new(
            ArtifactClient::new(
                HttpClient::new(&config.artifact_url, api_http.clone()),
                auth.clone(),
            ),
            upload_http,
        )
        .with_upload_concurrency(config.upload_concurrency)
        .with_chunk_size(config.chunk_size)
        .with_poll_interval(config.poll_interval)
        .with_build_timeout(config.build_timeout);
        let tasks = TaskManager::new(TaskClient::new(
            HttpClient::new(&config.task_url, api_http.clone()),
            auth.clone(),
        ))
        .with_poll_interval(config.poll_interval)
        .with_task_timeout(config.task_timeout);
        let videos = VideoManager::new(VideoClient::new(
            HttpClient::new(&config.video_url, api_http),
            auth,
        ));

        tracing::debug!(user_id=%iam.user_id(), "client ready");
        Ok(Self {
            iam,
            artifacts,
            tasks,
            videos,
        })
    }

    pub fn iam(&self) -> &IamClient {
        &self.iam
    }

    pub fn artifact_manager(&self) -> &ArtifactManager {
        &self.artifacts
    }

    pub fn task_manager(&self) -> &TaskManager {
        &self.tasks
    }

    pub fn video_manager(&self) -> &VideoManager {
        &self.videos
    }

    /// Build an artifact from a public template, create a task serving it
    /// with the template's recommended resources, start it and wait until
    /// one of its endpoints serves traffic.
    pub async fn create_task_from_artifact_template(
        &self,
        template_name: &str,
        scheduling: TaskScheduling,
    ) -> SdkResult<Task> {
        let (artifact_id, resources) = self
            .artifacts
            .create_artifact_from_template_name(template_name, None)
            .await?;
        let task_id = self
            .tasks
            .create_task_from_artifact_id(&artifact_id, resources, scheduling)
            .await?;
        self.tasks.start_task_and_wait(&task_id).await?;
        self.tasks
            .wait_for_task_endpoint(&task_id, self.tasks.task_timeout())
            .await
    }
}
