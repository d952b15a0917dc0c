use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "inferhost")]
#[command(about = "inferhost CLI for artifacts, serving tasks and video requests", long_about = None)]
pub struct Args {
    /// Account email (password login)
    #[arg(long, env = "INFERHOST_EMAIL")]
    pub email: Option<String>,

    /// Account password
    #[arg(long, env = "INFERHOST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// API key; used as the bearer token instead of a password login
    #[arg(long, env = "INFERHOST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Client ID sent as CE-ClientId
    #[arg(long, env = "INFERHOST_CLIENT_ID")]
    pub client_id: Option<String>,

    /// IAM service URL
    #[arg(long, env = "INFERHOST_IAM_URL")]
    pub iam_url: Option<String>,

    /// Artifact service URL
    #[arg(long, env = "INFERHOST_ARTIFACT_URL")]
    pub artifact_url: Option<String>,

    /// Task service URL
    #[arg(long, env = "INFERHOST_TASK_URL")]
    pub task_url: Option<String>,

    /// Video service URL
    #[arg(long, env = "INFERHOST_VIDEO_URL")]
    pub video_url: Option<String>,

    /// Do not read or write the refresh-token cache
    #[arg(long)]
    pub no_credential_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Artifact management
    Artifact {
        #[command(subcommand)]
        subcommand: ArtifactCommand,
    },
    /// Serving task management
    Task {
        #[command(subcommand)]
        subcommand: TaskCommand,
    },
    /// Recommend replica resources for a vLLM / SGLang serve command
    Resources {
        /// Full launch command, e.g. "vllm serve m --tensor-parallel-size 4"
        serve_command: String,
        /// GPU model (H100 or H200)
        #[arg(long, default_value = "H100")]
        gpu_type: String,
    },
    /// Video generation requests
    Video {
        #[command(subcommand)]
        subcommand: VideoCommand,
    },
    /// Organization API keys
    Apikey {
        #[command(subcommand)]
        subcommand: ApiKeyCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ArtifactCommand {
    /// List all artifacts
    List,
    /// Show one artifact
    Get { artifact_id: String },
    /// Create an artifact from a zipped bundle
    Create {
        #[arg(long)]
        name: String,
        /// Bundle (.zip) with the Dockerfile and serving code
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        /// Model directory to upload after the bundle
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// List public template names
    Templates,
    /// Create an artifact from a public template and wait for the build
    FromTemplate {
        template_name: String,
        /// Environment parameter KEY=VALUE (repeatable)
        #[arg(long = "env", value_parser = parse_key_value)]
        env: Vec<(String, String)>,
    },
    /// Upload every file of a model directory to an artifact
    UploadModel {
        artifact_id: String,
        model_dir: PathBuf,
        /// Parallel uploads
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Wait until the artifact build succeeds
    Wait {
        artifact_id: String,
        /// Timeout in seconds
        #[arg(long, default_value_t = 900)]
        timeout: u64,
    },
    /// Rebuild an artifact
    Rebuild { artifact_id: String },
    /// Delete an artifact
    Delete { artifact_id: String },
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List all tasks
    List,
    /// Show one task
    Get { task_id: String },
    /// Create a task for an artifact, scheduled to start now
    Create {
        #[arg(long)]
        artifact_id: String,
        #[arg(long, default_value_t = 8)]
        cpu: u32,
        #[arg(long, default_value_t = 100)]
        ram_gb: u32,
        #[arg(long, default_value_t = 1)]
        gpu: u32,
        #[arg(long)]
        gpu_name: Option<String>,
        #[arg(long, default_value_t = 1)]
        min_replicas: u32,
        #[arg(long, default_value_t = 1)]
        max_replicas: u32,
    },
    /// Create a task from a JSON definition file
    CreateFromFile { file: PathBuf },
    /// Start a task
    Start {
        task_id: String,
        /// Wait until the task is running
        #[arg(long)]
        wait: bool,
    },
    /// Stop a task
    Stop {
        task_id: String,
        /// Wait until the task is archived
        #[arg(long)]
        wait: bool,
    },
    /// Archive a task
    Archive { task_id: String },
    /// Print the serving endpoint of a task
    Endpoint {
        task_id: String,
        /// Wait until an endpoint is ready
        #[arg(long)]
        wait: bool,
    },
    /// Replace the schedule with a one-off trigger
    Schedule {
        task_id: String,
        /// Unix timestamp; defaults to now
        #[arg(long)]
        at: Option<i64>,
        #[arg(long, default_value_t = 1)]
        min_replicas: u32,
        #[arg(long, default_value_t = 1)]
        max_replicas: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum VideoCommand {
    /// List video models
    Models,
    /// Show a model and its payload schema
    Model { model_id: String },
    /// List requests for a model
    Requests { model_id: String },
    /// Submit a request
    Submit {
        #[arg(long)]
        model: String,
        /// JSON payload, e.g. '{"prompt": "a cat"}'
        #[arg(long)]
        payload: String,
        /// Poll until the request finishes
        #[arg(long)]
        wait: bool,
    },
    /// Poll a request until it finishes
    Wait {
        request_id: String,
        /// Seconds between polls
        #[arg(long, default_value_t = 5)]
        interval: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum ApiKeyCommand {
    /// List organization API keys
    List,
    /// Create an organization API key and print its secret
    Create {
        name: String,
        /// Expiry as a unix timestamp
        #[arg(long)]
        expires_at: Option<i64>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (k, v) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if k.trim().is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((k.trim().to_string(), v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("SERVE_COMMAND=vllm serve m --tp=2").unwrap(),
            ("SERVE_COMMAND".to_string(), "vllm serve m --tp=2".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_from_template_args() {
        let args = Args::try_parse_from([
            "inferhost",
            "--api-key",
            "k",
            "artifact",
            "from-template",
            "vllm-llama",
            "--env",
            "GPU_TYPE=H100",
            "--env",
            "SERVE_COMMAND=vllm serve m",
        ])
        .unwrap();
        match args.command {
            Command::Artifact {
                subcommand: ArtifactCommand::FromTemplate { template_name, env },
            } => {
                assert_eq!(template_name, "vllm-llama");
                assert_eq!(env.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
