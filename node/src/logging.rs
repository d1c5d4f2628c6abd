use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Output format for log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init(level: Level, format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(level);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| anyhow!("install tracing subscriber: {err}"))
}
