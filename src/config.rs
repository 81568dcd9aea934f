//! Service configuration.
//!
//! Every field is optional so partial config files merge over the defaults.
//! Precedence is CLI flag > config file > built-in default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SERVICE_NAME: &str = "shopping-cart-service";
pub const DEFAULT_COLLECT_INTERVAL: u64 = 5;
pub const DEFAULT_TRAFFIC_START_DELAY: u64 = 5;

/// Config file locations probed when no explicit path is given.
const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/shopping-cart-service/config.yaml",
    "/etc/shopping-cart-service/config.yml",
    "/etc/shopping-cart-service/config.json",
    "./shopping-cart-service.yaml",
    "./shopping-cart-service.yml",
    "./shopping-cart-service.json",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,
    #[serde(alias = "service-name")]
    pub service_name: Option<String>,

    // Metrics collection
    /// Seconds between two cart gauge observations
    #[serde(alias = "collect-interval-secs")]
    pub collect_interval_secs: Option<u64>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "simulate-latency")]
    pub simulate_latency: Option<bool>,
    #[serde(alias = "simulate-traffic")]
    pub simulate_traffic: Option<bool>,
    #[serde(alias = "traffic-start-delay-secs")]
    pub traffic_start_delay_secs: Option<u64>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            service_name: Some(DEFAULT_SERVICE_NAME.to_string()),
            collect_interval_secs: Some(DEFAULT_COLLECT_INTERVAL),
            enable_health: Some(true),
            simulate_latency: Some(true),
            simulate_traffic: Some(true),
            traffic_start_delay_secs: Some(DEFAULT_TRAFFIC_START_DELAY),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn collect_interval(&self) -> Duration {
        Duration::from_secs(
            self.collect_interval_secs
                .unwrap_or(DEFAULT_COLLECT_INTERVAL),
        )
    }

    pub fn traffic_start_delay(&self) -> Duration {
        Duration::from_secs(
            self.traffic_start_delay_secs
                .unwrap_or(DEFAULT_TRAFFIC_START_DELAY),
        )
    }

    pub fn health_enabled(&self) -> bool {
        self.enable_health.unwrap_or(true)
    }

    pub fn latency_enabled(&self) -> bool {
        self.simulate_latency.unwrap_or(true)
    }

    pub fn traffic_enabled(&self) -> bool {
        self.simulate_traffic.unwrap_or(true)
    }

    /// Fills every unset field from `base`.
    fn merged_over(self, base: Config) -> Config {
        Config {
            port: self.port.or(base.port),
            bind: self.bind.or(base.bind),
            service_name: self.service_name.or(base.service_name),
            collect_interval_secs: self.collect_interval_secs.or(base.collect_interval_secs),
            enable_health: self.enable_health.or(base.enable_health),
            simulate_latency: self.simulate_latency.or(base.simulate_latency),
            simulate_traffic: self.simulate_traffic.or(base.simulate_traffic),
            traffic_start_delay_secs: self
                .traffic_start_delay_secs
                .or(base.traffic_start_delay_secs),
            log_level: self.log_level.or(base.log_level),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.collect_interval_secs == Some(0) {
        anyhow::bail!("collect_interval_secs must be greater than zero");
    }

    if cfg.service_name().trim().is_empty() {
        anyhow::bail!("service_name must not be empty");
    }

    if cfg.bind_addr().parse::<IpAddr>().is_err() {
        anyhow::bail!("Invalid bind address '{}'", cfg.bind_addr());
    }

    Ok(())
}

/// Loads a config file (YAML/JSON/TOML by extension). Without an explicit
/// path the default locations are probed; if none exists the defaults apply.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => PathBuf::from(p),
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;

    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config content; missing fields fall back to the defaults.
pub fn parse_config(content: &str, extension: Option<&str>) -> anyhow::Result<Config> {
    let loaded: Config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        // Default to YAML
        _ => serde_yaml::from_str(content)?,
    };
    Ok(loaded.merged_over(Config::default()))
}
