use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set: our crates at `level`, the rest at warn.
pub fn default_filter(level: &str) -> String {
    let level = level.trim().to_ascii_lowercase();
    format!("warn,interio_server={level},interio_engine={level}")
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(level))
            .with_context(|| format!("invalid log level '{level}'"))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow!("failed to initialise logging: {err}"))
}
