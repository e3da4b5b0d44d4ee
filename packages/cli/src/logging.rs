use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CHROMA_LOG";

/// Install the stderr subscriber. `-v` forces `debug`; otherwise
/// `CHROMA_LOG` applies, falling back to `warn`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
