use tracing_subscriber::EnvFilter;

/// Initialise logging at `info` level, or `debug` when enabled in the
/// settings file. `RUST_LOG` can override the filter only in debug mode so a
/// stray environment variable never floods a normal run.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
