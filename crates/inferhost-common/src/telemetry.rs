use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for a binary built on the SDK.
///
/// - `service_name`: identifies the component in the startup log line
///   (e.g. "inferhost-cli")
/// - `default_level`: filter used when `RUST_LOG` is unset
///
/// The SDK itself only emits events; installing a subscriber is left to the
/// binary. Calling this twice is harmless: the second call is ignored.
pub fn init_tracing(service_name: &str, default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(service_name, "tracing initialized");
    }
}
