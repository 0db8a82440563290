use crate::output::Verbosity;
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding an explicit filter directive
pub const LOG_ENV: &str = "DIRSYNC_LOG";

/// Initialize the global tracing subscriber.
///
/// Logs go to stderr so they never mix with completion scripts on stdout.
/// The filter comes from `DIRSYNC_LOG` when set, otherwise from the
/// verbosity level. Calling this twice is harmless.
///
/// # Errors
///
/// Returns an error if `DIRSYNC_LOG` holds an invalid filter directive.
pub fn init(verbosity: Verbosity) -> Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive)
            .with_context(|| format!("Invalid {LOG_ENV} filter: {directive}"))?,
        Err(_) => EnvFilter::new(verbosity.log_filter()),
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    // Already initialized (tests, repeated calls)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, warn};

    #[test]
    fn test_init_is_idempotent() -> Result<()> {
        init(Verbosity::Normal)?;
        init(Verbosity::Verbose)?;

        debug!("debug message");
        warn!("warning message");
        Ok(())
    }
}
