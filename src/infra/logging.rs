//! Tracing subscriber setup for the binary.
//!
//! Logs go to stderr so stdout stays clean for results and `--json`.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// `RUST_LOG` or `SIMPAIR_LOG` win over the flags; otherwise `--log-level`
/// wins over `--verbose`, and the fallback is warnings only.
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<()>
{
    let directive = match (verbose, log_level)
    {
        (_, Some(level)) if level.contains('=') => level.to_string(),
        (_, Some(level)) => format!("simpair={level}"),
        (true, None) => "simpair=debug".to_string(),
        (false, None) => "simpair=warn".to_string(),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("SIMPAIR_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(directive));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json
    {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()
            .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;
    }
    else
    {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;
    }

    Ok(())
}
