mod args;
mod config;
mod output;

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use inferhost_common::telemetry::init_tracing;
use inferhost_common::{ReplicaResource, SubmitRequestRequest, TaskScheduling};
use inferhost_sdk::{recommend_resources, Client, OtpProvider};

use crate::args::{ApiKeyCommand, Args, ArtifactCommand, Command, TaskCommand, VideoCommand};
use crate::config::build_config;
use crate::output::{
    print_api_keys, print_artifact, print_artifacts, print_resources, print_task, print_tasks,
    print_template_names, print_upload_report, print_video_model, print_video_models,
    print_video_outcome, print_video_requests,
};

/// Ask for a 2FA code on the terminal. An empty line aborts.
fn prompt_otp(attempt: u32, max_attempts: u32) -> Option<String> {
    eprint!("2FA code ({attempt}/{max_attempts}): ");
    std::io::stderr().flush().ok()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    let code = line.trim().to_string();
    (!code.is_empty()).then_some(code)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("inferhost-cli", "info");
    let args = Args::parse();

    // Pure local computation; no login needed.
    if let Command::Resources {
        serve_command,
        gpu_type,
    } = &args.command
    {
        let r = recommend_resources(serve_command, gpu_type)?;
        println!("\n=== Recommended Replica Resources ===\n");
        print_resources(&r);
        println!();
        return Ok(());
    }

    let mut config = build_config(&args);
    if let Command::Artifact {
        subcommand: ArtifactCommand::UploadModel { concurrency, .. },
    } = &args.command
    {
        config.upload_concurrency = *concurrency;
    }
    let client = Client::connect(config, Some(&prompt_otp as &dyn OtpProvider))
        .await
        .context("failed to sign in")?;

    match args.command {
        Command::Artifact { subcommand } => {
            let artifacts = client.artifact_manager();
            match subcommand {
                ArtifactCommand::List => {
                    print_artifacts(&artifacts.get_all_artifacts().await?);
                }
                ArtifactCommand::Get { artifact_id } => {
                    print_artifact(&artifacts.get_artifact(&artifact_id).await?);
                }
                ArtifactCommand::Create {
                    name,
                    file,
                    description,
                    tags,
                    model_dir,
                } => match model_dir {
                    Some(dir) => {
                        let (id, report) = artifacts
                            .create_artifact_with_model_files(
                                &name,
                                &file,
                                &dir,
                                description.as_deref(),
                                tags,
                            )
                            .await?;
                        println!("✓ Artifact created: {id}");
                        print_upload_report(&report);
                    }
                    None => {
                        let id = artifacts
                            .create_artifact_with_file(&name, &file, description.as_deref(), tags)
                            .await?;
                        println!("✓ Artifact created: {id}");
                    }
                },
                ArtifactCommand::Templates => {
                    print_template_names(&artifacts.list_public_template_names().await);
                }
                ArtifactCommand::FromTemplate { template_name, env } => {
                    let env: HashMap<String, String> = env.into_iter().collect();
                    let (id, resources) = artifacts
                        .create_artifact_from_template_name(
                            &template_name,
                            (!env.is_empty()).then_some(&env),
                        )
                        .await?;
                    println!("✓ Artifact {id} is ready");
                    println!("\nRecommended replica resources:");
                    print_resources(&resources);
                }
                ArtifactCommand::UploadModel {
                    artifact_id,
                    model_dir,
                    ..
                } => {
                    let report = artifacts
                        .upload_model_files_to_artifact(&artifact_id, &model_dir)
                        .await?;
                    print_upload_report(&report);
                }
                ArtifactCommand::Wait {
                    artifact_id,
                    timeout,
                } => {
                    artifacts
                        .wait_for_artifact_ready(&artifact_id, Duration::from_secs(timeout))
                        .await?;
                    println!("✓ Artifact {artifact_id} is ready");
                }
                ArtifactCommand::Rebuild { artifact_id } => {
                    let resp = artifacts.rebuild_artifact(&artifact_id).await?;
                    println!("✓ Rebuild started: {} ({})", resp.artifact_id, resp.build_status);
                }
                ArtifactCommand::Delete { artifact_id } => {
                    artifacts.delete_artifact(&artifact_id).await?;
                    println!("✓ Artifact '{artifact_id}' deleted");
                }
            }
        }
        Command::Task { subcommand } => {
            let tasks = client.task_manager();
            match subcommand {
                TaskCommand::List => print_tasks(&tasks.get_all_tasks().await?),
                TaskCommand::Get { task_id } => print_task(&tasks.get_task(&task_id).await?),
                TaskCommand::Create {
                    artifact_id,
                    cpu,
                    ram_gb,
                    gpu,
                    gpu_name,
                    min_replicas,
                    max_replicas,
                } => {
                    let resources = ReplicaResource {
                        cpu,
                        ram_gb,
                        gpu,
                        gpu_name,
                    };
                    let scheduling = TaskScheduling::one_off(
                        chrono::Utc::now().timestamp(),
                        min_replicas,
                        max_replicas,
                    );
                    let id = tasks
                        .create_task_from_artifact_id(&artifact_id, resources, scheduling)
                        .await?;
                    println!("✓ Task created: {id}");
                }
                TaskCommand::CreateFromFile { file } => {
                    let resp = tasks.create_task_from_file(&file).await?;
                    println!(
                        "✓ Task created: {}",
                        resp.task.task_id.as_deref().unwrap_or("?")
                    );
                }
                TaskCommand::Start { task_id, wait } => {
                    if wait {
                        let task = tasks.start_task_and_wait(&task_id).await?;
                        println!("✓ Task '{task_id}' is running");
                        print_task(&task);
                    } else {
                        tasks.start_task(&task_id).await?;
                        println!("✓ Task '{task_id}' starting");
                    }
                }
                TaskCommand::Stop { task_id, wait } => {
                    if wait {
                        tasks.stop_task_and_wait(&task_id).await?;
                        println!("✓ Task '{task_id}' archived");
                    } else {
                        tasks.stop_task(&task_id).await?;
                        println!("✓ Task '{task_id}' stopping");
                    }
                }
                TaskCommand::Archive { task_id } => {
                    tasks.archive_task(&task_id).await?;
                    println!("✓ Task '{task_id}' archived");
                }
                TaskCommand::Endpoint { task_id, wait } => {
                    let url = if wait {
                        let task = tasks
                            .wait_for_task_endpoint(&task_id, tasks.task_timeout())
                            .await?;
                        task.endpoint_url().unwrap_or_default().to_string()
                    } else {
                        tasks.get_task_endpoint_url(&task_id).await?
                    };
                    println!("{url}");
                }
                TaskCommand::Schedule {
                    task_id,
                    at,
                    min_replicas,
                    max_replicas,
                } => {
                    let at = at.unwrap_or_else(|| chrono::Utc::now().timestamp());
                    tasks
                        .update_task_schedule(
                            &task_id,
                            TaskScheduling::one_off(at, min_replicas, max_replicas),
                        )
                        .await?;
                    println!("✓ Task '{task_id}' scheduled at {at}");
                }
            }
        }
        Command::Video { subcommand } => {
            let videos = client.video_manager();
            match subcommand {
                VideoCommand::Models => print_video_models(&videos.get_models().await?),
                VideoCommand::Model { model_id } => {
                    print_video_model(&videos.get_model_detail(&model_id).await?)
                }
                VideoCommand::Requests { model_id } => {
                    print_video_requests(&videos.get_requests(&model_id).await?)
                }
                VideoCommand::Submit {
                    model,
                    payload,
                    wait,
                } => {
                    let payload: serde_json::Value =
                        serde_json::from_str(&payload).context("--payload is not valid JSON")?;
                    let resp = videos
                        .create_request(&SubmitRequestRequest { model, payload })
                        .await?;
                    println!("✓ Request submitted: {}", resp.request_id);
                    if wait {
                        let done = wait_for_video(&client, &resp.request_id, 5).await?;
                        print_video_outcome(&done);
                    }
                }
                VideoCommand::Wait {
                    request_id,
                    interval,
                } => {
                    let done = wait_for_video(&client, &request_id, interval).await?;
                    print_video_outcome(&done);
                }
            }
        }
        Command::Apikey { subcommand } => match subcommand {
            ApiKeyCommand::List => print_api_keys(&client.iam().get_org_api_keys().await?),
            ApiKeyCommand::Create { name, expires_at } => {
                let key = client.iam().create_org_api_key(&name, expires_at).await?;
                println!("✓ API key '{name}' created. Store it now; it is shown only once:");
                println!("{key}");
            }
        },
        // Answered before sign-in.
        Command::Resources { .. } => {}
    }

    Ok(())
}

async fn wait_for_video(
    client: &Client,
    request_id: &str,
    interval_secs: u64,
) -> Result<inferhost_common::GetRequestResponse> {
    let done = client
        .video_manager()
        .wait_for_request(
            request_id,
            Duration::from_secs(interval_secs.max(1)),
            |detail, elapsed| {
                println!(
                    "  [{:>4}s] {} {}",
                    elapsed.as_secs(),
                    detail.request_id,
                    detail.status
                );
            },
        )
        .await?;
    Ok(done)
}
