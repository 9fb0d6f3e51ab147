use std::path::Path;

use crate::{AppError, Config};

/// Process-lifetime application state.
///
/// Built once at startup and handed by reference to every page; nothing in it
/// changes after construction.
pub struct App {
    config: Config,
}

impl App {
    /// Load and validate configuration, from `config_path` if given
    pub fn new(config_path: Option<&Path>) -> Result<Self, AppError> {
        let config = Config::load_validated(config_path)?;
        tracing::debug!("Configuration loaded from {}", config.config_dir.display());
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown(&self) {
        tracing::debug!("Shutting down application");
    }
}
