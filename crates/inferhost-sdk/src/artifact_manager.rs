use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::{stream, StreamExt};
use tokio::time::Instant;

use inferhost_common::{
    AddEnvParametersRequest, Artifact, CreateArtifactFromTemplateRequest, CreateArtifactRequest,
    CreateArtifactResponse, DeleteArtifactResponse, RebuildArtifactResponse, ReplicaResource,
    ResumableUploadLinkRequest, Template,
};

use crate::artifact_client::{ArtifactApi, ArtifactClient};
use crate::error::{require_non_empty, SdkError, SdkResult};
use crate::serve_command::recommend_resources;
use crate::upload::{self, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(900);
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;

/// Env key holding the launch command of a template-built artifact.
pub const SERVE_COMMAND_ENV: &str = "SERVE_COMMAND";
pub const GPU_TYPE_ENV: &str = "GPU_TYPE";

const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Outcome of a parallel model-file upload.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl UploadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Artifact workflows: validated CRUD, uploads, build polling and
/// template-based creation.
pub struct ArtifactManager<A: ArtifactApi = ArtifactClient> {
    api: A,
    upload_http: reqwest::Client,
    poll_interval: Duration,
    build_timeout: Duration,
    upload_concurrency: usize,
    chunk_size: u64,
}

impl<A: ArtifactApi> ArtifactManager<A> {
    pub fn new(api: A, upload_http: reqwest::Client) -> Self {
        Self {
            api,
            upload_http,
            poll_interval: DEFAULT_POLL_INTERVAL,
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build timeout used by the template workflows.
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    pub fn with_upload_concurrency(mut self, n: usize) -> Self {
        self.upload_concurrency = n.max(1);
        self
    }

    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    pub fn build_timeout(&self) -> Duration {
        self.build_timeout
    }

    pub async fn get_artifact(&self, artifact_id: &str) -> SdkResult<Artifact> {
        require_non_empty(artifact_id, "Artifact ID")?;
        self.api.get_artifact(artifact_id).await
    }

    pub async fn get_all_artifacts(&self) -> SdkResult<Vec<Artifact>> {
        self.api.get_all_artifacts().await
    }

    pub async fn create_artifact(
        &self,
        name: &str,
        description: Option<&str>,
        tags: Option<Vec<String>>,
    ) -> SdkResult<CreateArtifactResponse> {
        require_non_empty(name, "Artifact name")?;
        let req = CreateArtifactRequest {
            artifact_name: name.to_string(),
            artifact_description: description.map(str::to_string),
            artifact_tags: tags,
        };
        self.api.create_artifact(&req).await
    }

    /// Create an artifact from a template id and attach `env` to it.
    /// Returns the new artifact id.
    pub async fn create_artifact_from_template(
        &self,
        template_id: &str,
        env: Option<&HashMap<String, String>>,
    ) -> SdkResult<String> {
        require_non_empty(template_id, "Artifact template ID")?;
        let resp = self
            .api
            .create_artifact_from_template(&CreateArtifactFromTemplateRequest {
                artifact_template_id: template_id.to_string(),
            })
            .await?;
        if resp.artifact_id.is_empty() {
            return Err(SdkError::Transport(format!(
                "no artifact id returned for template {template_id}"
            )));
        }

        if let Some(env) = env.filter(|e| !e.is_empty()) {
            self.api
                .add_env_parameters_to_artifact(&AddEnvParametersRequest::from_map(
                    &resp.artifact_id,
                    env,
                ))
                .await?;
        }
        tracing::info!(artifact_id=%resp.artifact_id, template_id, "artifact created from template");
        Ok(resp.artifact_id)
    }

    /// Look up a public template by name, create an artifact from it, wait
    /// for the build, and return the artifact id with the replica resources
    /// to request for it. Resources come from `SERVE_COMMAND` / `GPU_TYPE`
    /// in `env` when present, else from the template.
    pub async fn create_artifact_from_template_name(
        &self,
        template_name: &str,
        env: Option<&HashMap<String, String>>,
    ) -> SdkResult<(String, ReplicaResource)> {
        require_non_empty(template_name, "Artifact template name")?;
        let template = self
            .get_public_templates()
            .await?
            .into_iter()
            .find(|t| t.name() == Some(template_name))
            .ok_or_else(|| SdkError::NotFound(format!("template {template_name}")))?;

        let resources = match env.and_then(|e| e.get(SERVE_COMMAND_ENV)) {
            Some(cmd) => {
                let gpu_type = env.and_then(|e| e.get(GPU_TYPE_ENV)).ok_or_else(|| {
                    SdkError::Validation(format!(
                        "{GPU_TYPE_ENV} is required when {SERVE_COMMAND_ENV} is set"
                    ))
                })?;
                recommend_resources(cmd, gpu_type)?
            }
            None => template
                .template_data
                .as_ref()
                .map(|d| ReplicaResource::from(&d.resources))
                .unwrap_or_default(),
        };

        let artifact_id = self
            .create_artifact_from_template(&template.template_id, env)
            .await?;
        if let Err(e) = self
            .wait_for_artifact_ready(&artifact_id, self.build_timeout)
            .await
        {
            tracing::error!(artifact_id=%artifact_id, error=%e, "artifact from template not ready");
            return Err(e);
        }
        Ok((artifact_id, resources))
    }

    pub async fn rebuild_artifact(&self, artifact_id: &str) -> SdkResult<RebuildArtifactResponse> {
        require_non_empty(artifact_id, "Artifact ID")?;
        self.api.rebuild_artifact(artifact_id).await
    }

    pub async fn delete_artifact(&self, artifact_id: &str) -> SdkResult<DeleteArtifactResponse> {
        require_non_empty(artifact_id, "Artifact ID")?;
        self.api.delete_artifact(artifact_id).await
    }

    /// Upload the zipped artifact bundle to its pre-signed link.
    pub async fn upload_artifact_file(&self, upload_link: &str, path: &Path) -> SdkResult<()> {
        require_non_empty(upload_link, "Upload link")?;
        validate_artifact_file(path)?;
        upload::upload_small_file(&self.upload_http, upload_link, path, Some(ZIP_CONTENT_TYPE))
            .await
    }

    /// Create an artifact and upload its bundle. Returns the artifact id.
    pub async fn create_artifact_with_file(
        &self,
        name: &str,
        path: &Path,
        description: Option<&str>,
        tags: Option<Vec<String>>,
    ) -> SdkResult<String> {
        validate_artifact_file(path)?;
        let created = self.create_artifact(name, description, tags).await?;
        upload::upload_small_file(
            &self.upload_http,
            &created.upload_link,
            path,
            Some(ZIP_CONTENT_TYPE),
        )
        .await?;
        Ok(created.artifact_id)
    }

    /// Resumable upload URL for one model file, stored under the file's
    /// base name.
    pub async fn get_bigfile_upload_url(&self, artifact_id: &str, path: &Path) -> SdkResult<String> {
        require_non_empty(artifact_id, "Artifact ID")?;
        validate_file_path(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SdkError::Validation(format!("no file name in {}", path.display())))?;
        self.resumable_link(artifact_id, file_name, path).await
    }

    async fn resumable_link(&self, artifact_id: &str, file_name: &str, path: &Path) -> SdkResult<String> {
        let resp = self
            .api
            .get_bigfile_upload_url(&ResumableUploadLinkRequest {
                artifact_id: artifact_id.to_string(),
                file_name: file_name.to_string(),
                file_type: upload::guess_content_type(path).map(str::to_string),
            })
            .await?;
        if resp.upload_link.is_empty() {
            return Err(SdkError::Transport(format!(
                "no upload link returned for {file_name}"
            )));
        }
        Ok(resp.upload_link)
    }

    /// Delete a model file; returns the status reported by the service.
    pub async fn delete_bigfile(&self, artifact_id: &str, file_name: &str) -> SdkResult<String> {
        require_non_empty(artifact_id, "Artifact ID")?;
        require_non_empty(file_name, "File name")?;
        let resp = self.api.delete_bigfile(artifact_id, file_name).await?;
        Ok(resp.status)
    }

    pub async fn upload_large_file(&self, upload_link: &str, path: &Path) -> SdkResult<()> {
        require_non_empty(upload_link, "Upload link")?;
        validate_file_path(path)?;
        upload::upload_large_file(&self.upload_http, upload_link, path, self.chunk_size).await
    }

    /// Upload every file under `model_dir` to the artifact, at most
    /// `upload_concurrency` at a time. Per-file failures are logged and
    /// recorded in the report; only a failure to list the directory is
    /// returned as an error.
    pub async fn upload_model_files_to_artifact(
        &self,
        artifact_id: &str,
        model_dir: &Path,
    ) -> SdkResult<UploadReport> {
        require_non_empty(artifact_id, "Artifact ID")?;
        if !model_dir.is_dir() {
            return Err(SdkError::NotFound(format!(
                "model directory {}",
                model_dir.display()
            )));
        }

        let files = collect_files(model_dir).await?;
        let total = files.len();
        tracing::info!(artifact_id, files = total, dir=%model_dir.display(), "uploading model files");

        let results: Vec<(PathBuf, SdkResult<()>)> = stream::iter(files)
            .map(|path| async move {
                let result = self.upload_model_file(artifact_id, model_dir, &path).await;
                (path, result)
            })
            .buffer_unordered(self.upload_concurrency)
            .collect()
            .await;

        let mut report = UploadReport::default();
        for (path, result) in results {
            match result {
                Ok(()) => report.succeeded.push(path),
                Err(e) => {
                    tracing::error!(artifact_id, path=%path.display(), error=%e, "model file upload failed");
                    report.failed.push((path, e.to_string()));
                }
            }
        }
        tracing::info!(
            artifact_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "model file upload finished"
        );
        Ok(report)
    }

    async fn upload_model_file(&self, artifact_id: &str, root: &Path, path: &Path) -> SdkResult<()> {
        let file_name = relative_name(root, path);
        let link = self.resumable_link(artifact_id, &file_name, path).await?;
        upload::upload_large_file(&self.upload_http, &link, path, self.chunk_size).await
    }

    /// Create an artifact from a bundle, then upload the model directory.
    pub async fn create_artifact_with_model_files(
        &self,
        name: &str,
        artifact_file: &Path,
        model_dir: &Path,
        description: Option<&str>,
        tags: Option<Vec<String>>,
    ) -> SdkResult<(String, UploadReport)> {
        let artifact_id = self
            .create_artifact_with_file(name, artifact_file, description, tags)
            .await?;
        tracing::info!(artifact_id=%artifact_id, "artifact created");
        let report = self
            .upload_model_files_to_artifact(&artifact_id, model_dir)
            .await?;
        Ok((artifact_id, report))
    }

    /// Poll until the build reaches SUCCESS. A failed terminal status ends
    /// the wait at once; fetch errors are logged and retried until the
    /// timeout.
    pub async fn wait_for_artifact_ready(&self, artifact_id: &str, timeout: Duration) -> SdkResult<()> {
        require_non_empty(artifact_id, "Artifact ID")?;
        let started = Instant::now();
        loop {
            match self.api.get_artifact(artifact_id).await {
                Ok(artifact) => {
                    let status = artifact.build_status();
                    if status.is_failure() {
                        return Err(SdkError::BuildFailed {
                            artifact_id: artifact_id.to_string(),
                            status,
                        });
                    }
                    if status.is_terminal() {
                        tracing::info!(artifact_id, "artifact ready");
                        return Ok(());
                    }
                    tracing::debug!(artifact_id, %status, elapsed_secs = started.elapsed().as_secs(), "artifact building");
                }
                Err(e) => {
                    tracing::warn!(artifact_id, error=%e, "failed to get artifact");
                }
            }

            if started.elapsed() > timeout {
                return Err(SdkError::Timeout {
                    what: format!("artifact {artifact_id} build"),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    pub async fn get_public_templates(&self) -> SdkResult<Vec<Template>> {
        self.api.get_public_templates().await
    }

    /// Names of all public templates. A failed lookup is logged and yields
    /// an empty list.
    pub async fn list_public_template_names(&self) -> Vec<String> {
        match self.get_public_templates().await {
            Ok(templates) => templates
                .iter()
                .filter_map(|t| t.name())
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                tracing::error!(error=%e, "failed to get artifact templates");
                Vec::new()
            }
        }
    }
}

fn validate_file_path(path: &Path) -> SdkResult<()> {
    if path.as_os_str().is_empty() {
        return Err(SdkError::Validation(
            "File path is required and cannot be empty".into(),
        ));
    }
    if !path.exists() {
        return Err(SdkError::NotFound(format!("file {}", path.display())));
    }
    Ok(())
}

fn validate_artifact_file(path: &Path) -> SdkResult<()> {
    validate_file_path(path)?;
    if upload::guess_content_type(path) != Some(ZIP_CONTENT_TYPE) {
        return Err(SdkError::Validation(format!(
            "artifact file {} must be a .zip archive",
            path.display()
        )));
    }
    Ok(())
}

/// `path` relative to `root`, `/`-separated.
fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Regular files under `dir`, recursively, in a stable order. Symlinks are
/// followed; dangling links and special files are logged and skipped.
async fn collect_files(dir: &Path) -> SdkResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen_dirs = HashSet::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        // Symlinked directories can form cycles.
        if !seen_dirs.insert(tokio::fs::canonicalize(&current).await?) {
            tracing::debug!(path=%current.display(), "directory already visited");
            continue;
        }
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let meta = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(path=%path.display(), error=%e, "skipping unreadable entry");
                    continue;
                }
            };
            if meta.is_dir() {
                pending.push(path);
            } else if meta.is_file() {
                files.push(path);
            } else {
                tracing::warn!(path=%path.display(), "skipping special file");
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use async_trait::async_trait;
    use axum::extract::Path as AxumPath;
    use axum::http::StatusCode;
    use axum::routing::put;
    use axum::Router;
    use inferhost_common::{
        BuildStatus, CreateArtifactFromTemplateResponse, DeleteBigfileResponse,
        ResumableUploadLinkResponse,
    };
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory artifact service. `script` feeds `get_artifact`: `None`
    /// is a fetch error, the last entry repeats forever.
    #[derive(Default)]
    struct FakeArtifacts {
        script: Mutex<VecDeque<Option<BuildStatus>>>,
        get_calls: AtomicUsize,
        templates: Vec<Template>,
        templates_fail: bool,
        upload_base: String,
        env_requests: Mutex<Vec<AddEnvParametersRequest>>,
        link_requests: Mutex<Vec<String>>,
    }

    impl FakeArtifacts {
        fn scripted(statuses: &[Option<BuildStatus>]) -> Self {
            Self {
                script: Mutex::new(statuses.iter().copied().collect()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.get_calls.load(Ordering::SeqCst)
        }
    }

    fn artifact(id: &str, status: BuildStatus) -> Artifact {
        serde_json::from_value(json!({
            "artifact_id": id,
            "artifact_data": {"build_status": status},
        }))
        .unwrap()
    }

    fn template(id: &str, name: &str) -> Template {
        serde_json::from_value(json!({
            "template_id": id,
            "template_data": {
                "name": name,
                "resources": {"cpu": 16, "memory": 200, "gpu": 2, "gpu_name": "H100"}
            }
        }))
        .unwrap()
    }

    #[async_trait]
    impl ArtifactApi for FakeArtifacts {
        async fn get_artifact(&self, artifact_id: &str) -> SdkResult<Artifact> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().flatten()
            } else {
                script.front().copied().unwrap_or(Some(BuildStatus::Success))
            };
            next.map(|s| artifact(artifact_id, s))
                .ok_or_else(|| SdkError::Transport("connection reset".into()))
        }

        async fn get_all_artifacts(&self) -> SdkResult<Vec<Artifact>> {
            Ok(vec![])
        }

        async fn create_artifact(&self, req: &CreateArtifactRequest) -> SdkResult<CreateArtifactResponse> {
            Ok(CreateArtifactResponse {
                artifact_id: format!("a-{}", req.artifact_name),
                upload_link: format!("{}/upload/bundle.zip", self.upload_base),
            })
        }

        async fn create_artifact_from_template(
            &self,
            req: &CreateArtifactFromTemplateRequest,
        ) -> SdkResult<CreateArtifactFromTemplateResponse> {
            Ok(CreateArtifactFromTemplateResponse {
                artifact_id: format!("from-{}", req.artifact_template_id),
                status: None,
            })
        }

        async fn add_env_parameters_to_artifact(&self, req: &AddEnvParametersRequest) -> SdkResult<()> {
            self.env_requests.lock().unwrap().push(req.clone());
            Ok(())
        }

        async fn rebuild_artifact(&self, artifact_id: &str) -> SdkResult<RebuildArtifactResponse> {
            Ok(RebuildArtifactResponse {
                artifact_id: artifact_id.to_string(),
                build_status: BuildStatus::Building,
            })
        }

        async fn delete_artifact(&self, artifact_id: &str) -> SdkResult<DeleteArtifactResponse> {
            Err(SdkError::NotFound(artifact_id.to_string()))
        }

        async fn get_bigfile_upload_url(
            &self,
            req: &ResumableUploadLinkRequest,
        ) -> SdkResult<ResumableUploadLinkResponse> {
            self.link_requests.lock().unwrap().push(req.file_name.clone());
            Ok(ResumableUploadLinkResponse {
                artifact_id: req.artifact_id.clone(),
                upload_link: format!("{}/upload/{}", self.upload_base, req.file_name),
            })
        }

        async fn delete_bigfile(
            &self,
            artifact_id: &str,
            file_name: &str,
        ) -> SdkResult<DeleteBigfileResponse> {
            Ok(DeleteBigfileResponse {
                artifact_id: artifact_id.to_string(),
                file_name: file_name.to_string(),
                status: "deleted".into(),
            })
        }

        async fn get_public_templates(&self) -> SdkResult<Vec<Template>> {
            if self.templates_fail {
                return Err(SdkError::Api {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(self.templates.clone())
        }
    }

    fn manager(api: FakeArtifacts) -> ArtifactManager<FakeArtifacts> {
        ArtifactManager::new(api, reqwest::Client::new())
            .with_poll_interval(Duration::from_millis(5))
            .with_build_timeout(Duration::from_secs(5))
    }

    /// Storage stub: files whose name contains "broken" are rejected.
    async fn storage() -> String {
        let app = Router::new().route(
            "/upload/*name",
            put(|AxumPath(name): AxumPath<String>| async move {
                if name.contains("broken") {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::OK
                }
            }),
        );
        spawn_server(app).await
    }

    #[tokio::test]
    async fn test_wait_until_success() {
        use BuildStatus::*;
        let m = manager(FakeArtifacts::scripted(&[Some(Building), Some(Building), Some(Success)]));
        m.wait_for_artifact_ready("a-1", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(m.api.calls(), 3);
    }

    #[tokio::test]
    async fn test_wait_stops_on_failure() {
        use BuildStatus::*;
        let m = manager(FakeArtifacts::scripted(&[Some(Building), Some(Failure), Some(Success)]));
        let err = m
            .wait_for_artifact_ready("a-1", Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            SdkError::BuildFailed { artifact_id, status } => {
                assert_eq!(artifact_id, "a-1");
                assert_eq!(status, Failure);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(m.api.calls(), 2);
    }

    #[tokio::test]
    async fn test_wait_keeps_polling_unknown_status() {
        use BuildStatus::*;
        let m = manager(FakeArtifacts::scripted(&[Some(Unknown), Some(Building), Some(Success)]));
        m.wait_for_artifact_ready("a-1", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(m.api.calls(), 3);
    }

    #[tokio::test]
    async fn test_wait_retries_fetch_errors() {
        let m = manager(FakeArtifacts::scripted(&[None, None, Some(BuildStatus::Success)]));
        m.wait_for_artifact_ready("a-1", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(m.api.calls(), 3);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let m = manager(FakeArtifacts::scripted(&[Some(BuildStatus::Building)]));
        let err = m
            .wait_for_artifact_ready("a-1", Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Timeout { .. }));
        assert!(m.api.calls() >= 2);
    }

    #[tokio::test]
    async fn test_validation_before_network() {
        let m = manager(FakeArtifacts::default());
        assert!(matches!(
            m.get_artifact(" ").await,
            Err(SdkError::Validation(_))
        ));
        assert!(matches!(
            m.create_artifact("", None, None).await,
            Err(SdkError::Validation(_))
        ));
        assert!(matches!(
            m.wait_for_artifact_ready("", Duration::from_secs(1)).await,
            Err(SdkError::Validation(_))
        ));
        assert_eq!(m.api.calls(), 0);

        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("bundle.txt");
        std::fs::write(&txt, b"x").unwrap();
        assert!(matches!(
            m.upload_artifact_file("http://upload", &txt).await,
            Err(SdkError::Validation(_))
        ));
        assert!(matches!(
            m.upload_artifact_file("http://upload", &dir.path().join("missing.zip"))
                .await,
            Err(SdkError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_parallel_upload_reports_each_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("shards")).unwrap();
        std::fs::write(dir.path().join("config.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("shards/part-1.safetensors"), vec![1u8; 300]).unwrap();
        std::fs::write(dir.path().join("shards/part-2.safetensors"), vec![2u8; 300]).unwrap();
        std::fs::write(dir.path().join("broken.bin"), vec![3u8; 10]).unwrap();

        let api = FakeArtifacts {
            upload_base: storage().await,
            ..Default::default()
        };
        let m = manager(api).with_chunk_size(128).with_upload_concurrency(2);

        let report = m
            .upload_model_files_to_artifact("a-1", dir.path())
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 3);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("broken.bin"));
        assert!(!report.is_complete());

        let mut names = m.api.link_requests.lock().unwrap().clone();
        names.sort();
        assert_eq!(
            names,
            vec![
                "broken.bin",
                "config.json",
                "shards/part-1.safetensors",
                "shards/part-2.safetensors"
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_collect_files_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        let shard = outside.path().join("blob");
        std::fs::write(&shard, vec![7u8; 16]).unwrap();

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), b"{}").unwrap();
        symlink(&shard, dir.path().join("model.safetensors")).unwrap();
        symlink(outside.path(), dir.path().join("linked")).unwrap();
        symlink(dir.path(), dir.path().join("loop")).unwrap();
        symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let files = collect_files(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|p| relative_name(dir.path(), p)).collect();
        assert_eq!(names, vec!["config.json", "linked/blob", "model.safetensors"]);
    }

    #[tokio::test]
    async fn test_upload_missing_model_dir() {
        let m = manager(FakeArtifacts::default());
        let err = m
            .upload_model_files_to_artifact("a-1", Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_artifact_with_file_uploads_bundle() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("bundle.zip");
        std::fs::write(&bundle, b"PK").unwrap();
        let api = FakeArtifacts {
            upload_base: storage().await,
            ..Default::default()
        };
        let m = manager(api);
        let id = m
            .create_artifact_with_file("demo", &bundle, Some("test"), None)
            .await
            .unwrap();
        assert_eq!(id, "a-demo");
    }

    #[tokio::test]
    async fn test_template_name_with_serve_command() {
        let api = FakeArtifacts {
            templates: vec![template("t-1", "vllm-llama"), template("t-2", "sglang-ds")],
            ..Default::default()
        };
        let m = manager(api);
        let env: HashMap<String, String> = [
            (SERVE_COMMAND_ENV, "vllm serve m --tensor-parallel-size 4"),
            (GPU_TYPE_ENV, "H200"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let (id, resources) = m
            .create_artifact_from_template_name("vllm-llama", Some(&env))
            .await
            .unwrap();
        assert_eq!(id, "from-t-1");
        assert_eq!(resources.gpu, 4);
        assert_eq!(resources.cpu, 32);
        assert_eq!(resources.ram_gb, 400);
        assert_eq!(resources.gpu_name.as_deref(), Some("H200"));

        let env_requests = m.api.env_requests.lock().unwrap();
        assert_eq!(env_requests.len(), 1);
        assert_eq!(env_requests[0].artifact_id, "from-t-1");
    }

    #[tokio::test]
    async fn test_template_name_uses_template_resources() {
        let api = FakeArtifacts {
            templates: vec![template("t-1", "vllm-llama")],
            ..Default::default()
        };
        let m = manager(api);
        let (_, resources) = m
            .create_artifact_from_template_name("vllm-llama", None)
            .await
            .unwrap();
        assert_eq!(
            resources,
            ReplicaResource {
                cpu: 16,
                ram_gb: 200,
                gpu: 2,
                gpu_name: Some("H100".into()),
            }
        );
        assert!(m.api.env_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_template_name_errors() {
        let api = FakeArtifacts {
            templates: vec![template("t-1", "vllm-llama")],
            ..Default::default()
        };
        let m = manager(api);
        assert!(matches!(
            m.create_artifact_from_template_name("missing", None).await,
            Err(SdkError::NotFound(_))
        ));

        let env = HashMap::from([(SERVE_COMMAND_ENV.to_string(), "vllm serve m".to_string())]);
        assert!(matches!(
            m.create_artifact_from_template_name("vllm-llama", Some(&env))
                .await,
            Err(SdkError::Validation(_))
        ));

        let env = HashMap::from([
            (SERVE_COMMAND_ENV.to_string(), "vllm serve m -tp 16".to_string()),
            (GPU_TYPE_ENV.to_string(), "H100".to_string()),
        ]);
        assert!(matches!(
            m.create_artifact_from_template_name("vllm-llama", Some(&env))
                .await,
            Err(SdkError::ServeCommand(_))
        ));
        assert_eq!(m.api.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_template_names_swallows_errors() {
        let m = manager(FakeArtifacts {
            templates: vec![template("t-1", "a"), template("t-2", "b")],
            ..Default::default()
        });
        assert_eq!(m.list_public_template_names().await, vec!["a", "b"]);

        let m = manager(FakeArtifacts {
            templates_fail: true,
            ..Default::default()
        });
        assert!(m.list_public_template_names().await.is_empty());
        assert!(m.get_public_templates().await.is_err());
    }

    #[test]
    fn test_relative_name() {
        let root = Path::new("/models/llama");
        assert_eq!(
            relative_name(root, Path::new("/models/llama/shards/a.bin")),
            "shards/a.bin"
        );
        assert_eq!(relative_name(root, Path::new("/models/llama/c.json")), "c.json");
    }
}
