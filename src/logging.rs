use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TASKBOARD_LOG";

/// Install the global subscriber. Output goes to stderr so `--json` stdout
/// stays machine-readable. `TASKBOARD_LOG` wins over the configured level.
pub fn init(fallback_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
