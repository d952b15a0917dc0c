use inferhost_sdk::ClientConfig;

use crate::args::Args;

/// Layer command-line values over the compiled-in defaults. clap already
/// falls back to the `INFERHOST_*` variables for every flag.
pub fn build_config(args: &Args) -> ClientConfig {
    let mut config = ClientConfig::default();
    if let Some(id) = &args.client_id {
        config.client_id = id.clone();
    }
    config.email = args.email.clone();
    config.password = args.password.clone();
    config.api_key = args.api_key.clone();

    let urls = [
        (&args.iam_url, &mut config.iam_url),
        (&args.artifact_url, &mut config.artifact_url),
        (&args.task_url, &mut config.task_url),
        (&args.video_url, &mut config.video_url),
    ];
    for (value, slot) in urls {
        if let Some(url) = value {
            *slot = url.clone();
        }
    }

    if args.no_credential_cache {
        config.credential_path = None;
    }
    config
}
