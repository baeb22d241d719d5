use crate::infrastructure::security::TokenKeys;
use chrono::Duration;
use std::env;
use thiserror::Error;
use tracing::info;

const MIN_SECRET_LEN: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Mongo { uri: String, database: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub jwt_secret: String,
    pub jwt_previous_secrets: Vec<String>,
    pub jwt_ttl: Duration,
    pub cors_origins: Vec<String>,
    pub region_state: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| {
            get(key).unwrap_or_else(|| {
                info!("{key} not set, using default: {default}");
                default.to_string()
            })
        };

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        let ttl_raw = or_default("JWT_TTL_SECS", "3600");
        let ttl_secs: i64 = ttl_raw.parse().map_err(|e| ConfigError::Invalid {
            key: "JWT_TTL_SECS",
            reason: format!("{e}"),
        })?;
        if ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_SECS",
                reason: "must be positive".to_string(),
            });
        }

        let storage = match or_default("STORAGE", "memory").as_str() {
            "memory" => StorageBackend::Memory,
            "mongo" => StorageBackend::Mongo {
                uri: or_default("MONGODB_URI", "mongodb://localhost:27017"),
                database: or_default("MONGODB_DATABASE", "bloodlink"),
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE",
                    reason: format!("expected `memory` or `mongo`, got `{other}`"),
                });
            }
        };

        Ok(Self {
            bind_addr: or_default("BIND_ADDR", "127.0.0.1:3000"),
            storage,
            jwt_secret,
            jwt_previous_secrets: split_list(get("JWT_PREVIOUS_SECRETS")),
            jwt_ttl: Duration::seconds(ttl_secs),
            cors_origins: split_list(Some(or_default("CORS_ORIGINS", "http://localhost:5173"))),
            region_state: or_default("REGION_STATE", "Tripura"),
        })
    }

    pub fn token_keys(&self) -> TokenKeys {
        TokenKeys::new(
            self.jwt_secret.clone(),
            self.jwt_previous_secrets.clone(),
            self.jwt_ttl,
        )
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
