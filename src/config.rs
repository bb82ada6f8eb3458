//! Log API settings (server-only).
//! Defaults, then `dashboard.json` in the config dir, then values baked from `.env`
//! at build time, then the runtime environment. Later sources win.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::QueryError;
use crate::log;
use crate::model::SchemaVersion;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api";

const MAX_BACKOFF_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub endpoint: String,
    pub schema: SchemaVersion,
    pub timeout_secs: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            schema: SchemaVersion::V1,
            timeout_secs: 10,
            retries: 2,
            backoff_ms: 250,
        }
    }
}

impl DashboardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Delay before retry number `attempt` (0-based): doubles each time, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(QueryError::Config("LOG_API_ENDPOINT is empty".to_string()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(QueryError::Config(format!("Endpoint must be http(s): {}", endpoint)));
        }
        Ok(())
    }

    /// Apply overrides from a key lookup (environment or baked values).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), QueryError> {
        if let Some(v) = lookup("LOG_API_ENDPOINT") {
            self.endpoint = v.trim().to_string();
        }
        if let Some(v) = lookup("LOG_API_SCHEMA") {
            self.schema = SchemaVersion::from_string(&v)
                .ok_or_else(|| QueryError::Config(format!("Unknown LOG_API_SCHEMA: {}", v)))?;
        }
        if let Some(v) = lookup("LOG_API_TIMEOUT_SECS") {
            self.timeout_secs = parse_num(&v, "LOG_API_TIMEOUT_SECS")?;
        }
        if let Some(v) = lookup("LOG_API_RETRIES") {
            self.retries = parse_num(&v, "LOG_API_RETRIES")?;
        }
        if let Some(v) = lookup("LOG_API_BACKOFF_MS") {
            self.backoff_ms = parse_num(&v, "LOG_API_BACKOFF_MS")?;
        }
        Ok(())
    }
}

fn parse_num<T: std::str::FromStr>(v: &str, key: &str) -> Result<T, QueryError> {
    v.trim()
        .parse::<T>()
        .map_err(|_| QueryError::Config(format!("{} is not a number: {}", key, v)))
}

fn baked(key: &str) -> Option<String> {
    let v = match key {
        "LOG_API_ENDPOINT" => option_env!("LOG_API_ENDPOINT"),
        "LOG_API_SCHEMA" => option_env!("LOG_API_SCHEMA"),
        "LOG_API_TIMEOUT_SECS" => option_env!("LOG_API_TIMEOUT_SECS"),
        "LOG_API_RETRIES" => option_env!("LOG_API_RETRIES"),
        "LOG_API_BACKOFF_MS" => option_env!("LOG_API_BACKOFF_MS"),
        _ => None,
    };
    v.map(str::to_string)
}

fn runtime_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "LogDashboard", "LogDashboard")
        .map(|d| d.config_dir().join("dashboard.json"))
}

fn load_config_file() -> DashboardConfig {
    let Some(path) = config_file_path() else {
        return DashboardConfig::default();
    };
    let Ok(data) = std::fs::read_to_string(&path) else {
        return DashboardConfig::default();
    };
    match serde_json::from_str(&data) {
        Ok(cfg) => {
            log::app_log("INFO", format!("Config: loaded {}", path.display()));
            cfg
        }
        Err(e) => {
            log::app_log("WARN", format!("Config: ignoring {}: {}", path.display(), e));
            DashboardConfig::default()
        }
    }
}

/// Build the effective config from every source.
pub fn load_config() -> Result<DashboardConfig, QueryError> {
    let _ = dotenvy::dotenv();
    let mut cfg = load_config_file();
    cfg.apply_overrides(baked)?;
    cfg.apply_overrides(runtime_env)?;
    cfg.validate()?;
    Ok(cfg)
}

static CONFIG: OnceLock<DashboardConfig> = OnceLock::new();

/// Process-wide config, loaded on first use.
pub fn config() -> Result<&'static DashboardConfig, QueryError> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = load_config()?;
    log::app_log(
        "INFO",
        format!("Config: endpoint={} schema={:?} timeout={}s retries={}", cfg.endpoint, cfg.schema, cfg.timeout_secs, cfg.retries),
    );
    Ok(CONFIG.get_or_init(|| cfg))
}
