//! Tracing initialization
//!
//! `RUST_LOG` wins when set; otherwise the caller's default directive is used.

use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "syncwatch=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
        }
    }
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(format: LogFormat, default_filter: &str) -> Result<(), anyhow::Error> {
    let registry = tracing_subscriber::registry().with(env_filter(default_filter));

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true),
            )
            .try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    tracing::debug!(?format, "Tracing initialized");
    Ok(())
}
