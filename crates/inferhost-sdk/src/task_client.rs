use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use inferhost_common::{
    CreateTaskResponse, GetAllTasksResponse, Task, TaskIdRequest, UpdateTaskScheduleRequest,
};

use crate::auth::AuthProvider;
use crate::error::SdkResult;
use crate::transport::HttpClient;

/// Calls against the task service.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn get_task(&self, task_id: &str) -> SdkResult<Task>;
    async fn get_all_tasks(&self) -> SdkResult<Vec<Task>>;
    async fn create_task(&self, task: &Task) -> SdkResult<CreateTaskResponse>;
    async fn update_task_schedule(&self, req: &UpdateTaskScheduleRequest) -> SdkResult<()>;
    async fn start_task(&self, task_id: &str) -> SdkResult<()>;
    async fn stop_task(&self, task_id: &str) -> SdkResult<()>;
    async fn archive_task(&self, task_id: &str) -> SdkResult<()>;
}

#[derive(Clone)]
pub struct TaskClient {
    http: HttpClient,
    auth: Arc<dyn AuthProvider>,
}

impl TaskClient {
    pub fn new(http: HttpClient, auth: Arc<dyn AuthProvider>) -> Self {
        Self { http, auth }
    }

    async fn post_task_id(&self, path: &str, task_id: &str) -> SdkResult<()> {
        let req = TaskIdRequest {
            task_id: task_id.to_string(),
        };
        let _: Value = self.http.post(path, self.auth.auth_headers()?, &req).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskApi for TaskClient {
    async fn get_task(&self, task_id: &str) -> SdkResult<Task> {
        self.http
            .get_with_query("/get_task", self.auth.auth_headers()?, &[("task_id", task_id)])
            .await
    }

    async fn get_all_tasks(&self) -> SdkResult<Vec<Task>> {
        let resp: GetAllTasksResponse = self
            .http
            .get("/get_tasks", self.auth.auth_headers()?)
            .await?;
        Ok(resp.tasks)
    }

    async fn create_task(&self, task: &Task) -> SdkResult<CreateTaskResponse> {
        self.http
            .post("/create_task", self.auth.auth_headers()?, task)
            .await
    }

    async fn update_task_schedule(&self, req: &UpdateTaskScheduleRequest) -> SdkResult<()> {
        let _: Value = self
            .http
            .post("/update_schedule", self.auth.auth_headers()?, req)
            .await?;
        Ok(())
    }

    async fn start_task(&self, task_id: &str) -> SdkResult<()> {
        self.post_task_id("/start_task", task_id).await
    }

    async fn stop_task(&self, task_id: &str) -> SdkResult<()> {
        self.post_task_id("/stop_task", task_id).await
    }

    async fn archive_task(&self, task_id: &str) -> SdkResult<()> {
        self.post_task_id("/archive_task", task_id).await
    }
}
