use std::time::Duration;

use tokio::time::Instant;

use inferhost_common::{
    GetRequestResponse, SubmitRequestRequest, SubmitRequestResponse, VideoModel, VideoModelDetail,
};

use crate::error::{require_non_empty, SdkResult};
use crate::video_client::{VideoApi, VideoClient};

pub const DEFAULT_VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct VideoManager<V: VideoApi = VideoClient> {
    api: V,
}

impl<V: VideoApi> VideoManager<V> {
    pub fn new(api: V) -> Self {
        Self { api }
    }

    pub async fn get_request_detail(&self, request_id: &str) -> SdkResult<GetRequestResponse> {
        require_non_empty(request_id, "Request ID")?;
        self.api.get_request_detail(request_id).await
    }

    pub async fn get_requests(&self, model_id: &str) -> SdkResult<Vec<GetRequestResponse>> {
        require_non_empty(model_id, "Model ID")?;
        self.api.get_requests(model_id).await
    }

    pub async fn create_request(&self, req: &SubmitRequestRequest) -> SdkResult<SubmitRequestResponse> {
        require_non_empty(&req.model, "Model ID")?;
        self.api.create_request(req).await
    }

    pub async fn get_models(&self) -> SdkResult<Vec<VideoModel>> {
        self.api.get_models().await
    }

    pub async fn get_model_detail(&self, model_id: &str) -> SdkResult<VideoModelDetail> {
        require_non_empty(model_id, "Model ID")?;
        self.api.get_model_detail(model_id).await
    }

    /// Poll a request until it reaches a terminal status. `on_poll` sees
    /// every observed state with the time elapsed since the call started.
    /// There is no timeout; fetch errors end the wait.
    pub async fn wait_for_request<F>(
        &self,
        request_id: &str,
        interval: Duration,
        mut on_poll: F,
    ) -> SdkResult<GetRequestResponse>
    where
        F: FnMut(&GetRequestResponse, Duration) + Send,
    {
        require_non_empty(request_id, "Request ID")?;
        let started = Instant::now();
        loop {
            let detail = self.api.get_request_detail(request_id).await?;
            on_poll(&detail, started.elapsed());
            if detail.status.is_terminal() {
                tracing::info!(request_id, status=%detail.status, "video request finished");
                return Ok(detail);
            }
            tokio::time::sleep(interval).await;
        }
    }
}
