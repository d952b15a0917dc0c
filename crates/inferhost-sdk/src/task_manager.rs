use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;

use inferhost_common::{
    CreateTaskResponse, EndpointStatus, RayTaskConfig, ReplicaResource, Task, TaskConfig, TaskScheduling,
    TaskStatus, UpdateTaskScheduleRequest,
};

use crate::error::{require_non_empty, SdkError, SdkResult};
use crate::task_client::{TaskApi, TaskClient};

pub const DEFAULT_RAY_VERSION: &str = "2.40.0-py310-gpu";
/// Entry module and deployment inside template-built artifacts.
pub const DEFAULT_SERVE_FILE: &str = "serve";
pub const DEFAULT_DEPLOYMENT_NAME: &str = "app";

pub const DEFAULT_TASK_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(900);

pub struct TaskManager<T: TaskApi = TaskClient> {
    api: T,
    poll_interval: Duration,
    task_timeout: Duration,
}

impl<T: TaskApi> TaskManager<T> {
    pub fn new(api: T) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_TASK_POLL_INTERVAL,
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Timeout for [`TaskManager::start_task_and_wait`] and
    /// [`TaskManager::stop_task_and_wait`].
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub async fn get_task(&self, task_id: &str) -> SdkResult<Task> {
        require_non_empty(task_id, "Task ID")?;
        self.api.get_task(task_id).await
    }

    pub async fn get_all_tasks(&self) -> SdkResult<Vec<Task>> {
        self.api.get_all_tasks().await
    }

    /// Submit a task definition. It must reference an artifact.
    pub async fn create_task(&self, task: &Task) -> SdkResult<CreateTaskResponse> {
        match task.artifact_id() {
            Some(id) => require_non_empty(id, "Task artifact ID")?,
            None => {
                return Err(SdkError::Validation(
                    "task config must reference an artifact".into(),
                ))
            }
        }
        self.api.create_task(task).await
    }

    /// Create a task serving `artifact_id` with the default Ray config.
    /// Returns the new task id.
    pub async fn create_task_from_artifact_id(
        &self,
        artifact_id: &str,
        resources: ReplicaResource,
        scheduling: TaskScheduling,
    ) -> SdkResult<String> {
        require_non_empty(artifact_id, "Artifact ID")?;
        if scheduling.is_empty() {
            return Err(SdkError::Validation(
                "task scheduling must set a one-off or daily trigger".into(),
            ));
        }

        let task = Task {
            config: Some(TaskConfig {
                ray_task_config: Some(RayTaskConfig {
                    ray_version: Some(DEFAULT_RAY_VERSION.to_string()),
                    artifact_id: Some(artifact_id.to_string()),
                    file_path: Some(DEFAULT_SERVE_FILE.to_string()),
                    deployment_name: Some(DEFAULT_DEPLOYMENT_NAME.to_string()),
                    replica_resource: Some(resources),
                    ..Default::default()
                }),
                task_scheduling: Some(scheduling),
                ..Default::default()
            }),
            ..Default::default()
        };

        let resp = self.create_task(&task).await?;
        let task_id = resp
            .task
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SdkError::Transport("no task id returned".into()))?;
        tracing::info!(task_id=%task_id, artifact_id, "task created");
        Ok(task_id)
    }

    pub async fn update_task_schedule(
        &self,
        task_id: &str,
        scheduling: TaskScheduling,
    ) -> SdkResult<()> {
        require_non_empty(task_id, "Task ID")?;
        self.api
            .update_task_schedule(&UpdateTaskScheduleRequest {
                task_id: task_id.to_string(),
                task_scheduling: scheduling,
            })
            .await
    }

    pub async fn start_task(&self, task_id: &str) -> SdkResult<()> {
        require_non_empty(task_id, "Task ID")?;
        self.api.start_task(task_id).await
    }

    pub async fn stop_task(&self, task_id: &str) -> SdkResult<()> {
        require_non_empty(task_id, "Task ID")?;
        self.api.stop_task(task_id).await
    }

    pub async fn archive_task(&self, task_id: &str) -> SdkResult<()> {
        require_non_empty(task_id, "Task ID")?;
        self.api.archive_task(task_id).await
    }

    /// Create a task from a JSON definition on disk.
    pub async fn create_task_from_file(&self, path: &Path) -> SdkResult<CreateTaskResponse> {
        let task = read_task_file(path).await?;
        self.create_task(&task).await
    }

    /// Apply the scheduling of a JSON task definition to the task it names.
    pub async fn update_task_schedule_from_file(&self, path: &Path) -> SdkResult<()> {
        let task = read_task_file(path).await?;
        let task_id = task
            .task_id
            .ok_or_else(|| SdkError::Validation(format!("{} has no task_id", path.display())))?;
        let scheduling = task
            .config
            .and_then(|c| c.task_scheduling)
            .ok_or_else(|| {
                SdkError::Validation(format!("{} has no task_scheduling", path.display()))
            })?;
        self.update_task_schedule(&task_id, scheduling).await
    }

    /// Host of a serving endpoint of the task. `NotFound` until one is
    /// ready.
    pub async fn get_task_endpoint_url(&self, task_id: &str) -> SdkResult<String> {
        let task = self.get_task(task_id).await?;
        task.endpoint_url()
            .map(str::to_string)
            .ok_or_else(|| SdkError::NotFound(format!("ready endpoint of task {task_id}")))
    }

    /// Poll until the task is running and one of its endpoints is ready.
    /// [`Task::endpoint_url`] of the returned task is always set. Fetch
    /// errors are retried.
    pub async fn wait_for_task_endpoint(&self, task_id: &str, timeout: Duration) -> SdkResult<Task> {
        require_non_empty(task_id, "Task ID")?;
        let started = Instant::now();
        loop {
            match self.api.get_task(task_id).await {
                Ok(task) => {
                    if task.status() == Some(TaskStatus::Archived) {
                        return Err(SdkError::TaskFailed {
                            task_id: task_id.to_string(),
                            status: TaskStatus::Archived,
                        });
                    }
                    if task.endpoints_failed() {
                        return Err(SdkError::EndpointFailed {
                            task_id: task_id.to_string(),
                        });
                    }
                    if task.status() == Some(TaskStatus::Running) {
                        if let Some(url) = task.endpoint_url() {
                            tracing::info!(task_id, endpoint = url, "task endpoint ready");
                            return Ok(task);
                        }
                    }
                    tracing::debug!(
                        task_id,
                        status = task.status().map(TaskStatus::as_str).unwrap_or("none"),
                        endpoint_status = task.endpoint_status().map(EndpointStatus::as_str).unwrap_or("none"),
                        "waiting for task endpoint"
                    );
                }
                Err(e) => {
                    tracing::warn!(task_id, error=%e, "failed to get task");
                }
            }

            if started.elapsed() > timeout {
                return Err(SdkError::Timeout {
                    what: format!("endpoint of task {task_id}"),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Poll until the task reports `target`. Reaching `archived` while
    /// waiting for anything else fails; fetch errors are retried.
    pub async fn wait_for_task(
        &self,
        task_id: &str,
        target: TaskStatus,
        timeout: Duration,
    ) -> SdkResult<Task> {
        require_non_empty(task_id, "Task ID")?;
        let started = Instant::now();
        loop {
            match self.api.get_task(task_id).await {
                Ok(task) => match task.status() {
                    Some(status) if status == target => {
                        tracing::info!(task_id, %status, "task reached target status");
                        return Ok(task);
                    }
                    Some(TaskStatus::Archived) => {
                        return Err(SdkError::TaskFailed {
                            task_id: task_id.to_string(),
                            status: TaskStatus::Archived,
                        });
                    }
                    status => {
                        tracing::debug!(
                            task_id,
                            status = status.map(TaskStatus::as_str).unwrap_or("none"),
                            target = target.as_str(),
                            "waiting for task"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(task_id, error=%e, "failed to get task");
                }
            }

            if started.elapsed() > timeout {
                return Err(SdkError::Timeout {
                    what: format!("task {task_id} reaching {target}"),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    pub async fn start_task_and_wait(&self, task_id: &str) -> SdkResult<Task> {
        self.start_task(task_id).await?;
        self.wait_for_task(task_id, TaskStatus::Running, self.task_timeout)
            .await
    }

    pub async fn stop_task_and_wait(&self, task_id: &str) -> SdkResult<Task> {
        self.stop_task(task_id).await?;
        self.wait_for_task(task_id, TaskStatus::Archived, self.task_timeout)
            .await
    }

    pub fn task_timeout(&self) -> Duration {
        self.task_timeout
    }
}

async fn read_task_file(path: &Path) -> SdkResult<Task> {
    if path.as_os_str().is_empty() {
        return Err(SdkError::Validation(
            "File path is required and cannot be empty".into(),
        ));
    }
    if !path.exists() {
        return Err(SdkError::NotFound(format!("file {}", path.display())));
    }
    let raw = tokio::fs::read(path).await?;
    serde_json::from_slice(&raw).map_err(|e| {
        SdkError::Validation(format!("failed to parse task from {}: {e}", path.display()))
    })
}
