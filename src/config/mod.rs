//! Configuration module for the community site backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::collections::BTreeSet;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::db::StorageMode;

/// Roles the organization roster must always contain.
pub const DEFAULT_SEED_ROLES: &str = "President,Vice President,Secretary,Treasurer";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var} '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes
    pub api_psk: Option<String>,
    /// Which backend the repositories use
    pub storage_mode: StorageMode,
    /// JSON file backing the local key-value store
    pub local_store_path: PathBuf,
    /// Path to the SQLite database backing the remote document store
    pub db_path: PathBuf,
    /// Directory holding the seed fixtures
    pub fixtures_dir: PathBuf,
    /// Base URL for fixtures; overrides `fixtures_dir` when set
    pub fixtures_url: Option<String>,
    /// Roles seeded into the roster at startup
    pub seed_roles: BTreeSet<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Split a comma-separated role list, dropping blanks.
pub fn parse_roles(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("SITE_API_PSK").ok().filter(|psk| !psk.is_empty());

        let mode = var_or("SITE_STORAGE_MODE", "local");
        let storage_mode = mode.parse::<StorageMode>().map_err(|reason| ConfigError::Invalid {
            var: "SITE_STORAGE_MODE",
            value: mode.clone(),
            reason,
        })?;

        let bind = var_or("SITE_BIND_ADDR", "127.0.0.1:8080");
        let bind_addr = bind.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "SITE_BIND_ADDR",
            value: bind.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            api_psk,
            storage_mode,
            local_store_path: var_or("SITE_LOCAL_STORE_PATH", "./data/local-storage.json").into(),
            db_path: var_or("SITE_DB_PATH", "./data/documents.sqlite").into(),
            fixtures_dir: var_or("SITE_FIXTURES_DIR", "./assets/fixtures").into(),
            fixtures_url: env::var("SITE_FIXTURES_URL").ok().filter(|url| !url.is_empty()),
            seed_roles: parse_roles(&var_or("SITE_SEED_ROLES", DEFAULT_SEED_ROLES)),
            bind_addr,
            log_level: var_or("SITE_LOG_LEVEL", "info"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 9] = [
        "SITE_API_PSK",
        "SITE_STORAGE_MODE",
        "SITE_LOCAL_STORE_PATH",
        "SITE_DB_PATH",
        "SITE_FIXTURES_DIR",
        "SITE_FIXTURES_URL",
        "SITE_SEED_ROLES",
        "SITE_BIND_ADDR",
        "SITE_LOG_LEVEL",
    ];

    // Environment is process-global, so every case runs in this one test.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.storage_mode, StorageMode::Local);
        assert_eq!(config.local_store_path, PathBuf::from("./data/local-storage.json"));
        assert_eq!(config.db_path, PathBuf::from("./data/documents.sqlite"));
        assert_eq!(config.fixtures_dir, PathBuf::from("./assets/fixtures"));
        assert!(config.fixtures_url.is_none());
        assert_eq!(config.seed_roles.len(), 4);
        assert!(config.seed_roles.contains("Vice President"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");

        env::set_var("SITE_STORAGE_MODE", "remote");
        assert_eq!(Config::from_env().unwrap().storage_mode, StorageMode::Remote);

        env::set_var("SITE_STORAGE_MODE", "cloud");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { var: "SITE_STORAGE_MODE", .. })
        ));
        env::remove_var("SITE_STORAGE_MODE");

        env::set_var("SITE_BIND_ADDR", "not-an-address");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { var: "SITE_BIND_ADDR", .. })
        ));
        env::remove_var("SITE_BIND_ADDR");
    }

    #[test]
    fn test_parse_roles_trims_and_drops_blanks() {
        let roles = parse_roles(" President , ,Secretary,");
        assert_eq!(
            roles.into_iter().collect::<Vec<_>>(),
            vec!["President".to_string(), "Secretary".to_string()]
        );
    }
}
