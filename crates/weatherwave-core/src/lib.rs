#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod app;
pub mod config;
pub mod error;

pub use app::App;
pub use config::{
    CacheConfig, Config, ConfigIssue, DatasetConfig, ForecastConfig, GeocodingConfig,
    HttpConfig, LocationConfig, ModelsConfig, Severity,
};
pub use error::{AppError, ConfigError, DatasetError, ForecastError, ModelError, NetworkError};

use anyhow::Result;

/// Initialize logging. Logs go to stderr so stdout carries only report output.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("WeatherWave core initialized");
    Ok(())
}
