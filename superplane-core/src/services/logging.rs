//! Logging service

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter.
pub const LOG_ENV: &str = "SUPERPLANE_LOG";

const VERBOSE_FILTER: &str = "superplane=debug,superplane_core=debug,superplane_cli=debug";

/// Filter directives for a run: `SUPERPLANE_LOG` if set, else debug when verbose, else off.
pub fn filter_directives(verbose: bool, env_override: Option<&str>) -> String {
    match env_override.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => directives.to_string(),
        None if verbose => VERBOSE_FILTER.to_string(),
        None => "off".to_string(),
    }
}

/// Initialize logging to stderr so rendered output on stdout stays clean.
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_override = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::try_new(filter_directives(verbose, env_override.as_deref()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()?;

    Ok(())
}
