use serde::{Deserialize, Serialize};

use crate::resource::ReplicaResource;

/// Runtime lifecycle of a task, as reported by the task service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Deploying,
    Scaling,
    Running,
    Archived,
    /// Any status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Deploying => "deploying",
            TaskStatus::Scaling => "scaling",
            TaskStatus::Running => "running",
            TaskStatus::Archived => "archived",
            TaskStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskOwner {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub service_account_id: Option<String>,
}

/// Serving configuration for a Ray Serve deployment built from an artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RayTaskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ray_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ray_cluster_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    /// Entry module inside the artifact, e.g. "serve".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_resource: Option<ReplicaResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<serde_json::Value>,
}

/// Start at a fixed moment with fixed replica bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OneOffScheduling {
    /// Unix timestamp (seconds).
    pub trigger_timestamp: i64,
    pub min_replicas: u32,
    pub max_replicas: u32,
}

/// Recurring trigger at a wall-clock time of day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyTrigger {
    /// IANA name, e.g. "UTC".
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub second: u32,
    #[serde(default)]
    pub min_replicas: u32,
    #[serde(default)]
    pub max_replicas: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyScheduling {
    #[serde(default)]
    pub triggers: Vec<DailyTrigger>,
}

/// Scheduling policy of a task. The API accepts one populated variant at a
/// time; use [`TaskScheduling::one_off`] or [`TaskScheduling::daily`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskScheduling {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_oneoff: Option<OneOffScheduling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_daily: Option<DailyScheduling>,
}

impl TaskScheduling {
    pub fn one_off(trigger_timestamp: i64, min_replicas: u32, max_replicas: u32) -> Self {
        Self {
            scheduling_oneoff: Some(OneOffScheduling {
                trigger_timestamp,
                min_replicas,
                max_replicas,
            }),
            scheduling_daily: None,
        }
    }

    pub fn daily(triggers: Vec<DailyTrigger>) -> Self {
        Self {
            scheduling_oneoff: None,
            scheduling_daily: Some(DailyScheduling { triggers }),
        }
    }

    /// True when neither variant is populated.
    pub fn is_empty(&self) -> bool {
        self.scheduling_oneoff.is_none()
            && self
                .scheduling_daily
                .as_ref()
                .is_none_or(|d| d.triggers.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ray_task_config: Option<RayTaskConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_scheduling: Option<TaskScheduling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_timestamp: Option<i64>,
}

/// Serving state of a task endpoint. Services report either the readiness
/// form (`ready`, `not_ready`, `failed`) or the task lifecycle form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    Ready,
    NotReady,
    Failed,
    Pending,
    Deploying,
    Scaling,
    Running,
    Archived,
    #[serde(other)]
    Unknown,
}

impl EndpointStatus {
    /// The endpoint accepts traffic.
    pub fn is_ready(self) -> bool {
        matches!(self, EndpointStatus::Ready | EndpointStatus::Running)
    }

    /// The endpoint will not come up without operator action.
    pub fn is_failure(self) -> bool {
        matches!(self, EndpointStatus::Failed | EndpointStatus::Archived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndpointStatus::Ready => "ready",
            EndpointStatus::NotReady => "not_ready",
            EndpointStatus::Failed => "failed",
            EndpointStatus::Pending => "pending",
            EndpointStatus::Deploying => "deploying",
            EndpointStatus::Scaling => "scaling",
            EndpointStatus::Running => "running",
            EndpointStatus::Archived => "archived",
            EndpointStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskEndpointInfo {
    /// Absent on services that predate endpoint readiness reporting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_status: Option<EndpointStatus>,
    /// Host name of the serving endpoint, without scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl TaskEndpointInfo {
    /// URL of this endpoint when it can serve. An endpoint without a status
    /// is taken as serving.
    pub fn ready_url(&self) -> Option<&str> {
        let ready = self.endpoint_status.is_none_or(EndpointStatus::is_ready);
        self.endpoint_url
            .as_deref()
            .filter(|url| ready && !url.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskInfo {
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_info: Option<TaskEndpointInfo>,
    /// Older services report the endpoint as a flat string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<TaskOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TaskConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<TaskInfo>,
    /// Per-cluster endpoints of a task deployed to several clusters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_endpoints: Vec<TaskEndpointInfo>,
}

impl Task {
    pub fn status(&self) -> Option<TaskStatus> {
        self.info.as_ref().map(|i| i.status)
    }

    pub fn artifact_id(&self) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.ray_task_config.as_ref())
            .and_then(|r| r.artifact_id.as_deref())
    }

    /// Status of the primary endpoint, if reported.
    pub fn endpoint_status(&self) -> Option<EndpointStatus> {
        self.info
            .as_ref()
            .and_then(|i| i.endpoint_info.as_ref())
            .and_then(|e| e.endpoint_status)
    }

    /// Host of an endpoint that can serve traffic. The primary endpoint is
    /// checked first, then the cluster endpoints in order. The flat legacy
    /// `endpoint` string is used only when no structured info is present.
    pub fn endpoint_url(&self) -> Option<&str> {
        let info = self.info.as_ref();
        let primary = info.and_then(|i| i.endpoint_info.as_ref());
        if let Some(url) = primary.and_then(TaskEndpointInfo::ready_url) {
            return Some(url);
        }
        if let Some(url) = self.cluster_endpoints.iter().find_map(TaskEndpointInfo::ready_url) {
            return Some(url);
        }
        if primary.is_none() && self.cluster_endpoints.is_empty() {
            return info
                .and_then(|i| i.endpoint.as_deref())
                .filter(|s| !s.is_empty());
        }
        None
    }

    /// True when every reported endpoint has failed.
    pub fn endpoints_failed(&self) -> bool {
        let primary = self.info.as_ref().and_then(|i| i.endpoint_info.as_ref());
        let endpoints: Vec<_> = primary.into_iter().chain(&self.cluster_endpoints).collect();
        !endpoints.is_empty()
            && endpoints
                .iter()
                .all(|e| e.endpoint_status.is_some_and(EndpointStatus::is_failure))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub task: Task,
    #[serde(default)]
    pub upload_link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetAllTasksResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTaskScheduleRequest {
    pub task_id: String,
    pub task_scheduling: TaskScheduling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskIdRequest {
    pub task_id: String,
}
