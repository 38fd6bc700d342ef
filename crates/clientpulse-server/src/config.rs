//! Process configuration assembled from `CLIENTPULSE_*` environment
//! variables layered over the library defaults.

use std::time::Duration;

use clientpulse_db::DbConfig;
use clientpulse_service::ServiceConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub service: ServiceConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset or empty keys
    /// keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("CLIENTPULSE_DB_URL") {
            config.db.url = url;
        }
        if let Some(ns) = get("CLIENTPULSE_DB_NAMESPACE") {
            config.db.namespace = ns;
        }
        if let Some(db) = get("CLIENTPULSE_DB_DATABASE") {
            config.db.database = db;
        }
        if let Some(user) = get("CLIENTPULSE_DB_USERNAME") {
            config.db.username = user;
        }
        if let Some(pass) = get("CLIENTPULSE_DB_PASSWORD") {
            config.db.password = pass;
        }
        if let Some(raw) = get("CLIENTPULSE_DB_CONNECT_TIMEOUT_SECS") {
            let secs = parse_positive("CLIENTPULSE_DB_CONNECT_TIMEOUT_SECS", &raw)?;
            config.db.connect_timeout = Duration::from_secs(secs as u64);
        }
        if let Some(raw) = get("CLIENTPULSE_STORE_TIMEOUT_SECS") {
            let secs = parse_positive("CLIENTPULSE_STORE_TIMEOUT_SECS", &raw)?;
            config.service.store_timeout = Duration::from_secs(secs as u64);
        }
        if let Some(raw) = get("CLIENTPULSE_MAX_UPLOAD_BYTES") {
            config.service.tabular.max_bytes = parse_positive("CLIENTPULSE_MAX_UPLOAD_BYTES", &raw)?;
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
        }),
    }
}
