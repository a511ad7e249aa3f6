use anyhow::{anyhow, Result};
use printsettings_core::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Install a global subscriber for the appender's log output.
///
/// `RUST_LOG` wins over the configured level. When the host already
/// installed a subscriber this is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("invalid log filter '{}': {}", config.level, e))?;

    let registry = Registry::default().with(env_filter);
    let installed = match config.format.as_str() {
        "pretty" => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().pretty()),
        ),
        "full" => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer()),
        ),
        "compact" => tracing::subscriber::set_global_default(
            registry.with(tracing_subscriber::fmt::layer().compact()),
        ),
        other => return Err(anyhow!("unknown log format: {}", other)),
    };

    if installed.is_err() {
        tracing::debug!("A global tracing subscriber is already installed");
    }
    Ok(())
}
