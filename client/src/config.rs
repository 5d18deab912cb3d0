//! Configuration management for the Smart Farm client
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with FARM_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Backend REST API configuration
    pub backend: BackendConfig,

    /// Live feed configuration
    pub feed: FeedConfig,

    /// Durable client-state configuration
    pub state: StateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URI of the backend REST API
    pub base_uri: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// WebSocket endpoint for push subscriptions
    pub ws_uri: String,

    /// Base delay before a reconnect attempt, in seconds
    pub reconnect_delay_secs: u64,

    /// Maximum number of reconnect attempts before giving up
    pub max_reconnect_attempts: u32,

    /// Freshness window for persisted weather snapshots, in seconds
    pub weather_cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    /// Path of the JSON state file
    pub path: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("FARM_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("backend.base_uri", "http://localhost:8080/api")?
            .set_default("feed.ws_uri", "ws://localhost:8080/ws/feed")?
            .set_default("feed.reconnect_delay_secs", 5)?
            .set_default("feed.max_reconnect_attempts", 10)?
            .set_default("feed.weather_cache_ttl_secs", 600)?
            .set_default("state.path", "smart-farm-state.json")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FARM_ prefix)
            .add_source(
                Environment::with_prefix("FARM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
