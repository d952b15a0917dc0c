use inferhost_common::{
    ApiKey, Artifact, GetRequestResponse, ReplicaResource, Task, VideoModel, VideoModelDetail,
};
use inferhost_sdk::UploadReport;

pub fn print_artifacts(artifacts: &[Artifact]) {
    println!("\n=== Artifacts ===\n");
    if artifacts.is_empty() {
        println!("No artifacts found.");
        return;
    }
    println!("{:<38} {:<30} {:<10}", "Artifact ID", "Name", "Build");
    println!("{:-<80}", "");
    for a in artifacts {
        println!(
            "{:<38} {:<30} {:<10}",
            a.artifact_id,
            a.name(),
            a.build_status().as_str()
        );
    }
    println!();
}

pub fn print_artifact(a: &Artifact) {
    println!("\n=== Artifact Detail ===\n");
    println!("  ID:       {}", a.artifact_id);
    println!("  Name:     {}", a.name());
    println!("  Build:    {}", a.build_status());
    if let Some(desc) = &a.artifact_metadata.artifact_description {
        println!("  About:    {desc}");
    }
    if let Some(tags) = &a.artifact_metadata.artifact_tags {
        println!("  Tags:     {}", tags.join(", "));
    }
    if let Some(files) = &a.artifact_metadata.big_files_metadata {
        println!("  Files:");
        for f in files {
            println!("    - {}", f.file_name.as_deref().unwrap_or("?"));
        }
    }
    if let Some(t) = a.artifact_data.update_at {
        println!("  Updated:  {}", t.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!();
}

pub fn print_template_names(names: &[String]) {
    println!("\n=== Public Templates ===\n");
    if names.is_empty() {
        println!("No templates found.");
        return;
    }
    for n in names {
        println!("  {n}");
    }
    println!();
}

pub fn print_upload_report(report: &UploadReport) {
    println!(
        "Uploaded {} file(s), {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    for (path, err) in &report.failed {
        println!("  ✗ {}: {}", path.display(), err);
    }
}

pub fn print_resources(r: &ReplicaResource) {
    println!("  CPU:      {}", r.cpu);
    println!("  RAM:      {} GB", r.ram_gb);
    println!("  GPU:      {} x {}", r.gpu, r.gpu_name.as_deref().unwrap_or("any"));
}

pub fn print_tasks(tasks: &[Task]) {
    println!("\n=== Tasks ===\n");
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    println!(
        "{:<38} {:<24} {:<10} {:<38}",
        "Task ID", "Name", "Status", "Artifact"
    );
    println!("{:-<112}", "");
    for t in tasks {
        let name = t
            .config
            .as_ref()
            .and_then(|c| c.task_name.as_deref())
            .unwrap_or("");
        println!(
            "{:<38} {:<24} {:<10} {:<38}",
            t.task_id.as_deref().unwrap_or(""),
            name,
            t.status().map(|s| s.as_str()).unwrap_or("-"),
            t.artifact_id().unwrap_or("")
        );
    }
    println!();
}

pub fn print_task(t: &Task) {
    println!("\n=== Task Detail ===\n");
    println!("  ID:       {}", t.task_id.as_deref().unwrap_or(""));
    println!(
        "  Status:   {}",
        t.status().map(|s| s.as_str()).unwrap_or("-")
    );
    println!("  Artifact: {}", t.artifact_id().unwrap_or("-"));
    println!("  Endpoint: {}", t.endpoint_url().unwrap_or("-"));
    if let Some(status) = t.endpoint_status() {
        println!("  Endpoint status: {}", status.as_str());
    }
    if let Some(r) = t
        .config
        .as_ref()
        .and_then(|c| c.ray_task_config.as_ref())
        .and_then(|r| r.replica_resource.as_ref())
    {
        print_resources(r);
    }
    println!();
}

pub fn print_video_models(models: &[VideoModel]) {
    println!("\n=== Video Models ===\n");
    if models.is_empty() {
        println!("No models found.");
        return;
    }
    println!("{:<30} {:<12} {}", "Model", "Type", "Description");
    println!("{:-<90}", "");
    for m in models {
        println!(
            "{:<30} {:<12} {}",
            m.model,
            m.model_type.as_deref().unwrap_or(""),
            m.brief_description.as_deref().unwrap_or("")
        );
    }
    println!();
}

pub fn print_video_model(m: &VideoModelDetail) {
    println!("\n=== {} ===\n", m.model);
    if let Some(desc) = &m.detailed_description {
        println!("{desc}\n");
    }
    if let Some(params) = &m.parameters {
        println!(
            "Parameters:\n{}",
            serde_json::to_string_pretty(params).unwrap_or_default()
        );
    }
    println!();
}

pub fn print_video_requests(requests: &[GetRequestResponse]) {
    println!("\n=== Video Requests ===\n");
    if requests.is_empty() {
        println!("No requests found.");
        return;
    }
    println!("{:<38} {:<24} {:<12}", "Request ID", "Model", "Status");
    println!("{:-<76}", "");
    for r in requests {
        println!(
            "{:<38} {:<24} {:<12}",
            r.request_id,
            r.model.as_deref().unwrap_or(""),
            r.status.as_str()
        );
    }
    println!();
}

pub fn print_video_outcome(r: &GetRequestResponse) {
    println!("Request {} finished: {}", r.request_id, r.status);
    if let Some(outcome) = &r.outcome {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).unwrap_or_default()
        );
    }
}

pub fn print_api_keys(keys: &[ApiKey]) {
    println!("\n=== API Keys ===\n");
    if keys.is_empty() {
        println!("No API keys found.");
        return;
    }
    println!("{:<38} {:<24} {:<16} {:<20}", "ID", "Name", "Key", "Expires");
    println!("{:-<100}", "");
    for k in keys {
        let expires = k
            .expires_at
            .filter(|t| *t > 0)
            .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<38} {:<24} {:<16} {:<20}",
            k.id,
            k.name,
            k.partial_key.as_deref().unwrap_or(""),
            expires
        );
    }
    println!();
}
