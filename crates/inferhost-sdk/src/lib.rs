//! Client SDK for the inferhost inference platform: IAM sessions, artifact
//! builds and uploads, serving tasks and video generation requests.

pub mod artifact_client;
pub mod artifact_manager;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod serve_command;
pub mod task_client;
pub mod task_manager;
pub mod transport;
pub mod upload;
pub mod video_client;
pub mod video_manager;

#[cfg(test)]
mod test_support;

pub use artifact_client::{ArtifactApi, ArtifactClient};
pub use artifact_manager::{ArtifactManager, UploadReport};
pub use auth::{AuthProvider, CredentialStore, IamClient, OtpProvider};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{SdkError, SdkResult};
pub use serve_command::{
    parse_serve_command, recommend_resources, ParsedServeCommand, ServeCommandError,
    ServingFramework,
};
pub use task_client::{TaskApi, TaskClient};
pub use task_manager::TaskManager;
pub use video_client::{VideoApi, VideoClient};
pub use video_manager::VideoManager;

pub use inferhost_common as types;
