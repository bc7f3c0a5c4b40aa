use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

use crate::actors::scheduler::DEFAULT_INTERVAL_SECS;
use crate::engine::MonitorSettings;
use crate::monitors::http::DEFAULT_TIMEOUT_SECS;
use crate::util::normalize_url;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Seconds between ticks
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds before a probe gives up
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Targets registered at startup
    #[serde(default)]
    pub targets: Vec<String>,

    /// HTTP server settings (optional - defaults apply)
    pub api: Option<ApiSection>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ApiSection {
    pub bind: Option<SocketAddr>,
    pub cors: Option<bool>,
    pub static_dir: Option<PathBuf>,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
            targets: Vec::new(),
            api: None,
        }
    }
}

impl Config {
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_secs(self.interval),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    fn validate(mut self) -> anyhow::Result<Self> {
        if self.interval == 0 {
            anyhow::bail!("interval must be at least one second");
        }
        if self.timeout == 0 {
            anyhow::bail!("timeout must be at least one second");
        }
        self.targets = self
            .targets
            .iter()
            .map(|url| normalize_url(url))
            .collect::<anyhow::Result<_>>()?;
        Ok(self)
    }
}

pub fn parse_config(content: &str) -> anyhow::Result<Config> {
    let config: Config = serde_json::from_str(content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;
    config
        .validate()
        .inspect(|config| trace!("loaded config: {config:?}"))
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content)
}
