use serde::{Deserialize, Serialize};

/// CPU/RAM/GPU envelope allocated to one running replica of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicaResource {
    /// CPU cores.
    #[serde(default)]
    pub cpu: u32,
    #[serde(default)]
    pub ram_gb: u32,
    #[serde(default)]
    pub gpu: u32,
    /// GPU model, e.g. "H100".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_name: Option<String>,
}
