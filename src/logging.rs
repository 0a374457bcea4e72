use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Overrides the level picked from `--verbose`, e.g. `SCOREBOOK_LOG=trace`.
pub const LOG_ENV_VAR: &str = "SCOREBOOK_LOG";

/// Default filter directive. `--verbose` shows this crate's debug output
/// without turning on debug logs from the HTTP stack.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,scorebook=debug"
    } else {
        "warn"
    }
}

pub fn filter_for(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the stderr subscriber. A second call leaves the first one in place.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(verbose))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}
