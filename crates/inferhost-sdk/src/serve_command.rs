//! Replica sizing from a vLLM / SGLang launch command.
//!
//! The GPU count of one replica is the tensor-parallel degree when given,
//! else the pipeline-parallel degree, else the data-parallel degree, else 1.
//! Each GPU brings 8 vCPUs and 100 GB of RAM.

use std::sync::LazyLock;

use regex::Regex;

use inferhost_common::ReplicaResource;

/// GPU models a replica can be scheduled on.
pub const SUPPORTED_GPU_TYPES: &[&str] = &["H100", "H200"];
pub const MAX_GPUS_PER_REPLICA: u32 = 8;
pub const CPU_PER_GPU: u32 = 8;
pub const RAM_GB_PER_GPU: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServeCommandError {
    #[error("Serve command must launch either sglang or vllm")]
    UnknownFramework,
    #[error("GPU type {0} is not supported (supported: H100, H200)")]
    UnsupportedGpu(String),
    #[error("{requested} GPUs requested, at most {cap} are supported per replica")]
    ExceedsGpuCap { requested: u32, cap: u32 },
    #[error("Invalid parallel degree in serve command: {0}")]
    InvalidDegree(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServingFramework {
    Vllm,
    Sglang,
}

impl ServingFramework {
    pub fn as_str(self) -> &'static str {
        match self {
            ServingFramework::Vllm => "vllm",
            ServingFramework::Sglang => "sglang",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedServeCommand {
    pub framework: ServingFramework,
    pub tp: Option<u32>,
    pub pp: Option<u32>,
    pub dp: Option<u32>,
}

impl ParsedServeCommand {
    pub fn gpu_count(&self) -> u32 {
        self.tp.or(self.pp).or(self.dp).unwrap_or(1)
    }
}

static VLLM_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bvllm\b").unwrap());

struct DegreePatterns {
    short: Regex,
    long: Regex,
}

impl DegreePatterns {
    fn new(short: &str, long: &str) -> Self {
        Self {
            short: Regex::new(&format!(r"-{{1,2}}{short}[=\s]+(\d+)")).unwrap(),
            long: Regex::new(&format!(r"--(?:{long})[=\s]+(\d+)")).unwrap(),
        }
    }

    fn find(&self, cmd: &str) -> Result<Option<u32>, ServeCommandError> {
        let caps = self
            .short
            .captures(cmd)
            .or_else(|| self.long.captures(cmd));
        let Some(raw) = caps.and_then(|c| c.get(1)) else {
            return Ok(None);
        };
        match raw.as_str().parse::<u32>() {
            Ok(0) | Err(_) => Err(ServeCommandError::InvalidDegree(raw.as_str().to_string())),
            Ok(n) => Ok(Some(n)),
        }
    }
}

static TP: LazyLock<DegreePatterns> =
    LazyLock::new(|| DegreePatterns::new("tp", "tensor-parallel-size|tp-size"));
static PP: LazyLock<DegreePatterns> =
    LazyLock::new(|| DegreePatterns::new("pp", "pipeline-parallel-size|pp-size"));
static DP: LazyLock<DegreePatterns> =
    LazyLock::new(|| DegreePatterns::new("dp", "data-parallel-size|dp-size"));

/// Classify the command and extract its parallelism degrees.
pub fn parse_serve_command(cmd: &str) -> Result<ParsedServeCommand, ServeCommandError> {
    let cmd = cmd.trim().replace('\u{2013}', "--");

    let framework = if cmd.contains("sglang.launch_server") {
        ServingFramework::Sglang
    } else if cmd.contains("vllm serve") || VLLM_WORD.is_match(&cmd) {
        ServingFramework::Vllm
    } else {
        return Err(ServeCommandError::UnknownFramework);
    };

    Ok(ParsedServeCommand {
        framework,
        tp: TP.find(&cmd)?,
        pp: PP.find(&cmd)?,
        dp: DP.find(&cmd)?,
    })
}

/// Recommended replica resources for running `cmd` on `gpu_type` GPUs.
pub fn recommend_resources(
    cmd: &str,
    gpu_type: &str,
) -> Result<ReplicaResource, ServeCommandError> {
    let parsed = parse_serve_command(cmd)?;
    if !SUPPORTED_GPU_TYPES.contains(&gpu_type) {
        return Err(ServeCommandError::UnsupportedGpu(gpu_type.to_string()));
    }

    let gpus = parsed.gpu_count();
    if gpus > MAX_GPUS_PER_REPLICA {
        return Err(ServeCommandError::ExceedsGpuCap {
            requested: gpus,
            cap: MAX_GPUS_PER_REPLICA,
        });
    }

    tracing::debug!(
        framework = parsed.framework.as_str(),
        gpus,
        gpu_type,
        "recommended replica resources"
    );
    Ok(ReplicaResource {
        cpu: gpus * CPU_PER_GPU,
        ram_gb: gpus * RAM_GB_PER_GPU,
        gpu: gpus,
        gpu_name: Some(gpu_type.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vllm_long_form() {
        let r = recommend_resources(
            "vllm serve meta-llama/Llama-3.1-8B --tensor-parallel-size 4",
            "H100",
        )
        .unwrap();
        assert_eq!(
            r,
            ReplicaResource {
                cpu: 32,
                ram_gb: 400,
                gpu: 4,
                gpu_name: Some("H100".into()),
            }
        );
    }

    #[test]
    fn test_gpu_cap() {
        let err = recommend_resources(
            "python3 -m sglang.launch_server --model-path m -tp 9",
            "H200",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ServeCommandError::ExceedsGpuCap {
                requested: 9,
                cap: 8
            }
        );
    }

    #[test]
    fn test_short_flag_wins_over_long_form() {
        let parsed =
            parse_serve_command("vllm serve m --tp=2 --tensor-parallel-size 8").unwrap();
        assert_eq!(parsed.tp, Some(2));
        assert_eq!(parsed.gpu_count(), 2);
    }

    #[test]
    fn test_precedence_tp_then_pp_then_dp() {
        let parsed = parse_serve_command("vllm serve m --pipeline-parallel-size 2 --dp 4").unwrap();
        assert_eq!(parsed.tp, None);
        assert_eq!(parsed.gpu_count(), 2);

        let parsed = parse_serve_command("vllm serve m --data-parallel-size=3").unwrap();
        assert_eq!(parsed.gpu_count(), 3);

        let parsed = parse_serve_command("vllm serve m").unwrap();
        assert_eq!(parsed.gpu_count(), 1);
    }

    #[test]
    fn test_sglang_detection() {
        let parsed = parse_serve_command(
            "python3 -m sglang.launch_server --model-path deepseek --tp-size 8",
        )
        .unwrap();
        assert_eq!(parsed.framework, ServingFramework::Sglang);
        assert_eq!(parsed.tp, Some(8));
    }

    #[test]
    fn test_en_dash_is_normalized() {
        let parsed = parse_serve_command("vllm serve m \u{2013}tensor-parallel-size 2").unwrap();
        assert_eq!(parsed.tp, Some(2));
    }

    #[test]
    fn test_bare_vllm_word() {
        let parsed = parse_serve_command("python -m vllm.entrypoints.openai.api_server -tp 2").unwrap();
        assert_eq!(parsed.framework, ServingFramework::Vllm);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            parse_serve_command("python serve.py --tp 2"),
            Err(ServeCommandError::UnknownFramework)
        );
        assert_eq!(
            recommend_resources("vllm serve m", "A100"),
            Err(ServeCommandError::UnsupportedGpu("A100".into()))
        );
        assert!(matches!(
            parse_serve_command("vllm serve m --tp 0"),
            Err(ServeCommandError::InvalidDegree(_))
        ));
    }
}
