use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} is invalid: {1}")]
    Invalid(&'static str, String),
}

/// Which repository backs the catalog and the order ledger. Chosen once at
/// startup; business logic never falls back silently.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Postgres { database_url: String },
    Local { snapshot_path: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub gateway_key: String,
    pub gateway_secret: String,
    pub gateway_checkout_url: String,
    pub callback_url: String,
    pub online_discount_percent: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::Invalid("PORT", e.to_string()))?;

        let storage = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("postgres") => StorageBackend::Postgres {
                database_url: env::var("DATABASE_URL")
                    .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            },
            Ok("local") | Err(_) => StorageBackend::Local {
                snapshot_path: env::var("LOCAL_STORE_PATH").ok().map(PathBuf::from),
            },
            Ok(other) => {
                return Err(ConfigError::Invalid("STORAGE_BACKEND", other.to_string()))
            }
        };

        let online_discount_percent = match env::var("ONLINE_DISCOUNT_PERCENT") {
            Ok(raw) => raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid("ONLINE_DISCOUNT_PERCENT", e.to_string())
            })?,
            Err(_) => 10,
        };

        Ok(Self {
            host,
            port,
            storage,
            gateway_key: env::var("GATEWAY_KEY")
                .map_err(|_| ConfigError::Missing("GATEWAY_KEY"))?,
            gateway_secret: env::var("GATEWAY_SECRET")
                .map_err(|_| ConfigError::Missing("GATEWAY_SECRET"))?,
            gateway_checkout_url: env::var("GATEWAY_CHECKOUT_URL")
                .map_err(|_| ConfigError::Missing("GATEWAY_CHECKOUT_URL"))?,
            callback_url: env::var("CALLBACK_URL")
                .map_err(|_| ConfigError::Missing("CALLBACK_URL"))?,
            online_discount_percent,
        })
    }
}
