//! Logging setup using tracing.
//!
//! Output goes to stderr so it never mixes with dump data on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` and defaults to `warn`, which keeps normal
/// CLI output quiet while still surfacing skipped tags.
///
/// # Example RUST_LOG values
/// - `RUST_LOG=info` - note lifecycle and maintenance
/// - `RUST_LOG=cnote=debug` - every record write
///
/// # Errors
/// Returns an error if a subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}
