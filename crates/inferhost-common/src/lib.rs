pub mod artifact;
pub mod iam;
pub mod resource;
pub mod task;
pub mod template;
pub mod video;

pub use artifact::{
    AddEnvParametersRequest, Artifact, ArtifactData, ArtifactMetadata, BigFileMetadata,
    BuildStatus, CreateArtifactFromTemplateRequest, CreateArtifactFromTemplateResponse,
    CreateArtifactRequest, CreateArtifactResponse, DeleteArtifactResponse,
    DeleteBigfileResponse, EnvParameter, RebuildArtifactResponse, ResumableUploadLinkRequest,
    ResumableUploadLinkResponse,
};
pub use iam::*;
pub use resource::ReplicaResource;
pub use task::{
    CreateTaskResponse, DailyScheduling, DailyTrigger, EndpointStatus, GetAllTasksResponse,
    OneOffScheduling, RayTaskConfig, Task, TaskConfig, TaskEndpointInfo, TaskIdRequest, TaskInfo,
    TaskOwner, TaskScheduling, TaskStatus, UpdateTaskScheduleRequest,
};
pub use template::{GetTemplatesResponse, Template, TemplateData, TemplateResources};
pub use video::{
    GetRequestResponse, SubmitRequestRequest, SubmitRequestResponse, VideoModel, VideoModelDetail,
    VideoRequestStatus,
};

pub mod telemetry;
