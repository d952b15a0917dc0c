use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use inferhost_common::{
    AddEnvParametersRequest, Artifact, CreateArtifactFromTemplateRequest,
    CreateArtifactFromTemplateResponse, CreateArtifactRequest, CreateArtifactResponse,
    DeleteArtifactResponse, DeleteBigfileResponse, GetTemplatesResponse, RebuildArtifactResponse,
    ResumableUploadLinkRequest, ResumableUploadLinkResponse, Template,
};

use crate::auth::AuthProvider;
use crate::error::SdkResult;
use crate::transport::HttpClient;

/// Calls against the artifact service. Implemented over HTTP by
/// [`ArtifactClient`]; managers depend on this trait only.
#[async_trait]
pub trait ArtifactApi: Send + Sync {
    async fn get_artifact(&self, artifact_id: &str) -> SdkResult<Artifact>;
    async fn get_all_artifacts(&self) -> SdkResult<Vec<Artifact>>;
    async fn create_artifact(&self, req: &CreateArtifactRequest) -> SdkResult<CreateArtifactResponse>;
    async fn create_artifact_from_template(
        &self,
        req: &CreateArtifactFromTemplateRequest,
    ) -> SdkResult<CreateArtifactFromTemplateResponse>;
    async fn add_env_parameters_to_artifact(&self, req: &AddEnvParametersRequest) -> SdkResult<()>;
    async fn rebuild_artifact(&self, artifact_id: &str) -> SdkResult<RebuildArtifactResponse>;
    async fn delete_artifact(&self, artifact_id: &str) -> SdkResult<DeleteArtifactResponse>;
    async fn get_bigfile_upload_url(
        &self,
        req: &ResumableUploadLinkRequest,
    ) -> SdkResult<ResumableUploadLinkResponse>;
    async fn delete_bigfile(&self, artifact_id: &str, file_name: &str)
        -> SdkResult<DeleteBigfileResponse>;
    async fn get_public_templates(&self) -> SdkResult<Vec<Template>>;
}

#[derive(Deserialize)]
struct GetAllArtifactsResponse {
    #[serde(default)]
    artifacts: Vec<Artifact>,
}

#[derive(Clone)]
pub struct ArtifactClient {
    http: HttpClient,
    auth: Arc<dyn AuthProvider>,
}

impl ArtifactClient {
    pub fn new(http: HttpClient, auth: Arc<dyn AuthProvider>) -> Self {
        Self { http, auth }
    }
}

#[async_trait]
impl ArtifactApi for ArtifactClient {
    async fn get_artifact(&self, artifact_id: &str) -> SdkResult<Artifact> {
        self.http
            .get_with_query(
                "/get_artifact",
                self.auth.auth_headers()?,
                &[("artifact_id", artifact_id)],
            )
            .await
    }

    async fn get_all_artifacts(&self) -> SdkResult<Vec<Artifact>> {
        let resp: GetAllArtifactsResponse = self
            .http
            .get("/get_all_artifacts", self.auth.auth_headers()?)
            .await?;
        Ok(resp.artifacts)
    }

    async fn create_artifact(&self, req: &CreateArtifactRequest) -> SdkResult<CreateArtifactResponse> {
        self.http
            .post("/create_artifact", self.auth.auth_headers()?, req)
            .await
    }

    async fn create_artifact_from_template(
        &self,
        req: &CreateArtifactFromTemplateRequest,
    ) -> SdkResult<CreateArtifactFromTemplateResponse> {
        self.http
            .post("/create_artifact_from_template", self.auth.auth_headers()?, req)
            .await
    }

    async fn add_env_parameters_to_artifact(&self, req: &AddEnvParametersRequest) -> SdkResult<()> {
        let _: Value = self
            .http
            .post("/add_env_parameters_to_artifact", self.auth.auth_headers()?, req)
            .await?;
        Ok(())
    }

    async fn rebuild_artifact(&self, artifact_id: &str) -> SdkResult<RebuildArtifactResponse> {
        self.http
            .post(
                "/rebuild_artifact",
                self.auth.auth_headers()?,
                &serde_json::json!({ "artifact_id": artifact_id }),
            )
            .await
    }

    async fn delete_artifact(&self, artifact_id: &str) -> SdkResult<DeleteArtifactResponse> {
        self.http
            .delete(
                "/delete_artifact",
                self.auth.auth_headers()?,
                &[("artifact_id", artifact_id)],
            )
            .await
    }

    async fn get_bigfile_upload_url(
        &self,
        req: &ResumableUploadLinkRequest,
    ) -> SdkResult<ResumableUploadLinkResponse> {
        self.http
            .post("/get_bigfile_upload_url", self.auth.auth_headers()?, req)
            .await
    }

    async fn delete_bigfile(
        &self,
        artifact_id: &str,
        file_name: &str,
    ) -> SdkResult<DeleteBigfileResponse> {
        self.http
            .delete(
                "/delete_bigfile",
                self.auth.auth_headers()?,
                &[("artifact_id", artifact_id), ("file_name", file_name)],
            )
            .await
    }

    async fn get_public_templates(&self) -> SdkResult<Vec<Template>> {
        let resp: GetTemplatesResponse = self
            .http
            .get("/get_public_templates", self.auth.auth_headers()?)
            .await?;
        Ok(resp.artifact_templates)
    }
}
