use serde::{Deserialize, Serialize};

use crate::resource::ReplicaResource;

/// Resource envelope a public template recommends for one replica.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateResources {
    #[serde(default)]
    pub cpu: u32,
    /// RAM in GB.
    #[serde(default)]
    pub memory: u32,
    #[serde(default)]
    pub gpu: u32,
    #[serde(default)]
    pub gpu_name: Option<String>,
}

impl From<&TemplateResources> for ReplicaResource {
    fn from(r: &TemplateResources) -> Self {
        ReplicaResource {
            cpu: r.cpu,
            ram_gb: r.memory,
            gpu: r.gpu,
            gpu_name: r.gpu_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateData {
    /// Human-readable template name, unique among public templates.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Serving framework image, e.g. "vllm" or "sglang".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub resources: TemplateResources,
}

/// Reusable artifact recipe published by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub template_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_data: Option<TemplateData>,
}

impl Template {
    pub fn name(&self) -> Option<&str> {
        self.template_data.as_ref().map(|d| d.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetTemplatesResponse {
    #[serde(default)]
    pub artifact_templates: Vec<Template>,
}
