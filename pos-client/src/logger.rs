//! Logging Infrastructure
//!
//! Console logging through `tracing-subscriber`. `RUST_LOG` takes precedence
//! over the configured level.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::ClientConfig;

/// Initialize the global subscriber
///
/// # Examples
/// ```no_run
/// // Development
/// pos_client::logger::init_logger("debug", false)?;
///
/// // Production
/// pos_client::logger::init_logger("info", true)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_thread_ids(true),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init()?;
    }

    Ok(())
}

/// Initialize from [`ClientConfig`] log settings
pub fn init_from_config(config: &ClientConfig) -> anyhow::Result<()> {
    init_logger(&config.log_level, config.log_json)
}
