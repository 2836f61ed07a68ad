use crate::schemas::AppState;
use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Runtime settings of the service.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Lifetime of cached occurrence previews.
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub request_timeout_secs: u64,
    /// When set, `POST /api/v1/recurring-patterns/generate` requires this
    /// value in the `X-Generation-Token` header.
    pub generation_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://hearth.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            cache_ttl_secs: 300,
            cache_capacity: 1000,
            request_timeout_secs: 30,
            generation_token: None,
        }
    }
}

impl AppConfig {
    /// Loads `.env`, then layers defaults, an optional `hearth.toml` and `HEARTH_*` variables.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            .add_source(File::with_name("hearth").required(false))
            .add_source(Environment::with_prefix("HEARTH"))
            .build()
            .context("Failed to read configuration")?;

        let loaded: AppConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;
        debug!("Configuration loaded: bind_address={}", loaded.bind_address);
        Ok(loaded)
    }

    /// A builder pre-seeded with the defaults.
    fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let defaults = AppConfig::default();
        let builder = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("cache_ttl_secs", defaults.cache_ttl_secs)?
            .set_default("cache_capacity", defaults.cache_capacity)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?;
        Ok(builder)
    }

    /// Applies command line overrides on top of file and environment values.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }
}

/// Connects to the database and builds the shared handler state.
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database_url))?;

    let cache = Cache::builder()
        .max_capacity(config.cache_capacity)
        .time_to_live(Duration::from_secs(config.cache_ttl_secs))
        .build();

    Ok(AppState {
        db,
        cache,
        config: Arc::new(config),
    })
}
