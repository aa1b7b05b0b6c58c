//! Connection parameters for the managed backend.
//!
//! Values come from the process environment first and fall back to whatever
//! was present when the binary was compiled (`option_env!`). Every required
//! key must be non-empty; otherwise the app refuses to start its normal
//! screens and shows a "not configured" state instead.

use std::env;

pub const REGION: &str = "FIELDNOTE_REGION";
pub const TABLE_NAME: &str = "FIELDNOTE_TABLE_NAME";
pub const BUCKET_NAME: &str = "FIELDNOTE_BUCKET_NAME";
pub const USER_POOL_ID: &str = "FIELDNOTE_USER_POOL_ID";
pub const CLIENT_ID: &str = "FIELDNOTE_CLIENT_ID";
pub const CLIENT_SECRET: &str = "FIELDNOTE_CLIENT_SECRET";

pub const REQUIRED_KEYS: [&str; 5] = [REGION, TABLE_NAME, BUCKET_NAME, USER_POOL_ID, CLIENT_ID];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub region: String,
    pub table_name: String,
    pub bucket_name: String,
    pub user_pool_id: String,
    pub client_id: String,
    /// App clients created without a secret leave this unset
    pub client_secret: Option<String>,
}

impl AppConfig {
    /// Runtime environment, then build-time environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok().or_else(|| build_time(key).map(str::to_string)))
    }

    /// Build from any key lookup; reports every missing required key at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<&'static str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| value(key).is_none())
            .collect();
        if !missing.is_empty() {
            tracing::warn!("Configuration incomplete, missing: {:?}", missing);
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            region: value(REGION).unwrap_or_default(),
            table_name: value(TABLE_NAME).unwrap_or_default(),
            bucket_name: value(BUCKET_NAME).unwrap_or_default(),
            user_pool_id: value(USER_POOL_ID).unwrap_or_default(),
            client_id: value(CLIENT_ID).unwrap_or_default(),
            client_secret: value(CLIENT_SECRET),
        })
    }
}

fn build_time(key: &str) -> Option<&'static str> {
    match key {
        REGION => option_env!("FIELDNOTE_REGION"),
        TABLE_NAME => option_env!("FIELDNOTE_TABLE_NAME"),
        BUCKET_NAME => option_env!("FIELDNOTE_BUCKET_NAME"),
        USER_POOL_ID => option_env!("FIELDNOTE_USER_POOL_ID"),
        CLIENT_ID => option_env!("FIELDNOTE_CLIENT_ID"),
        CLIENT_SECRET => option_env!("FIELDNOTE_CLIENT_SECRET"),
        _ => None,
    }
}
