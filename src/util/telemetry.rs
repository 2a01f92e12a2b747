//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Variable selecting the log output format (`json` or plain text).
pub const LOG_FORMAT_ENV: &str = "RUST_LOG_FORMAT";

/// Initialize tracing. Users can install their own subscriber; this helper
/// installs an env-filtered subscriber (default level `info`) if none is set.
///
/// Output is JSON lines when `RUST_LOG_FORMAT=json`.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
