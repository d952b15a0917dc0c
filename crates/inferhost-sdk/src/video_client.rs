use std::sync::Arc;

use async_trait::async_trait;

use inferhost_common::{
    GetRequestResponse, SubmitRequestRequest, SubmitRequestResponse, VideoModel, VideoModelDetail,
};

use crate::auth::AuthProvider;
use crate::error::SdkResult;
use crate::transport::{encode_path, HttpClient};

/// Calls against the video request queue.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn get_request_detail(&self, request_id: &str) -> SdkResult<GetRequestResponse>;
    async fn get_requests(&self, model_id: &str) -> SdkResult<Vec<GetRequestResponse>>;
    async fn create_request(&self, req: &SubmitRequestRequest) -> SdkResult<SubmitRequestResponse>;
    async fn get_models(&self) -> SdkResult<Vec<VideoModel>>;
    async fn get_model_detail(&self, model_id: &str) -> SdkResult<VideoModelDetail>;
}

#[derive(Clone)]
pub struct VideoClient {
    http: HttpClient,
    auth: Arc<dyn AuthProvider>,
}

impl VideoClient {
    pub fn new(http: HttpClient, auth: Arc<dyn AuthProvider>) -> Self {
        Self { http, auth }
    }
}

#[async_trait]
impl VideoApi for VideoClient {
    async fn get_request_detail(&self, request_id: &str) -> SdkResult<GetRequestResponse> {
        self.http
            .get(&encode_path(&["requests", request_id])?, self.auth.auth_headers()?)
            .await
    }

    async fn get_requests(&self, model_id: &str) -> SdkResult<Vec<GetRequestResponse>> {
        self.http
            .get_with_query("/requests", self.auth.auth_headers()?, &[("model_id", model_id)])
            .await
    }

    async fn create_request(&self, req: &SubmitRequestRequest) -> SdkResult<SubmitRequestResponse> {
        self.http
            .post("/requests", self.auth.auth_headers()?, req)
            .await
    }

    async fn get_models(&self) -> SdkResult<Vec<VideoModel>> {
        self.http.get("/models", self.auth.auth_headers()?).await
    }

    async fn get_model_detail(&self, model_id: &str) -> SdkResult<VideoModelDetail> {
        self.http
            .get(&encode_path(&["models", model_id])?, self.auth.auth_headers()?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_server, StaticAuth};
    use axum::extract::{Path, Query};
    use axum::routing::get;
    use axum::{Json, Router};
    use inferhost_common::VideoRequestStatus;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn client() -> VideoClient {
        let app = Router::new()
            .route(
                "/models",
                get(|| async { Json(json!([{"model": "wan2.1"}, {"model": "kling"}])) }),
            )
            .route(
                "/models/:id",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"model": id, "detailed_description": "text to video"}))
                }),
            )
            .route(
                "/requests",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!([{"request_id": "r-1", "status": "queued", "model": q["model_id"]}]))
                })
                .post(|Json(body): Json<Value>| async move {
                    Json(json!({"request_id": "r-2", "status": "created", "model": body["model"]}))
                }),
            )
            .route(
                "/requests/:id",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"request_id": id, "status": "success", "outcome": {"video_url": "http://v"}}))
                }),
            );
        let base = spawn_server(app).await;
        VideoClient::new(
            HttpClient::new(&base, reqwest::Client::new()),
            Arc::new(StaticAuth),
        )
    }

    #[tokio::test]
    async fn test_models() {
        let client = client().await;
        let models = client.get_models().await.unwrap();
        assert_eq!(models.len(), 2);
        let detail = client.get_model_detail("wan2.1").await.unwrap();
        assert_eq!(detail.model, "wan2.1");
    }

    #[tokio::test]
    async fn test_requests() {
        let client = client().await;
        let submitted = client
            .create_request(&SubmitRequestRequest {
                model: "wan2.1".into(),
                payload: json!({"prompt": "a cat"}),
            })
            .await
            .unwrap();
        assert_eq!(submitted.request_id, "r-2");
        assert_eq!(submitted.model.as_deref(), Some("wan2.1"));

        let listed = client.get_requests("wan2.1").await.unwrap();
        assert_eq!(listed[0].status, VideoRequestStatus::Queued);

        let detail = client.get_request_detail("r-1").await.unwrap();
        assert_eq!(detail.status, VideoRequestStatus::Success);
        assert_eq!(detail.outcome.unwrap()["video_url"], "http://v");
    }

    #[tokio::test]
    async fn test_ids_stay_in_their_path_segment() {
        let client = client().await;
        let detail = client.get_request_detail("r/1?model_id=x").await.unwrap();
        assert_eq!(detail.request_id, "r/1?model_id=x");
        let model = client.get_model_detail("org/wan2.1").await.unwrap();
        assert_eq!(model.model, "org/wan2.1");
    }
}
