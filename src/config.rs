use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the monitoring port, e.g. "http://127.0.0.1:8222".
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Delay between a tick completing and the next one starting.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-request deadline for one /varz fetch.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max events kept in the broadcast channel (slow subscribers may lag).
    pub broadcast_capacity: usize,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.server.url.trim().is_empty(),
            "server.url must be non-empty"
        );
        anyhow::ensure!(
            self.monitoring.poll_interval_ms > 0,
            "monitoring.poll_interval_ms must be > 0, got {}",
            self.monitoring.poll_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.request_timeout_ms > 0,
            "monitoring.request_timeout_ms must be > 0, got {}",
            self.monitoring.request_timeout_ms
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        Ok(())
    }
}
