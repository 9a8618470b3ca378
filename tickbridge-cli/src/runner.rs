//! CLI runner: loads configuration and initializes logging.

use crate::error::CliError;
use std::path::{Path, PathBuf};
use tickbridge::config::{config_file_path, ConfigFile};
use tickbridge::logging::{init_logging, LoggingGuard};
use tracing::info;

/// Loads the configuration file, falling back to defaults when it is absent.
pub fn load_config(path: Option<&Path>) -> Result<(ConfigFile, PathBuf), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    let config = ConfigFile::load_from(&path)?;
    Ok((config, path))
}

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Keeps logging active while the runner exists
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Loads config from `config_path` (or the default path) and starts logging.
    pub fn new(config_path: Option<&Path>, stdout_logs: bool) -> Result<Self, CliError> {
        let (config, config_path) = load_config(config_path)?;

        let logging_guard = init_logging(&config.logging.file, stdout_logs)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Logs startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TickBridge v{}", tickbridge::VERSION);
        info!(
            config = %self.config_path.display(),
            log = %self.logging_guard.log_path().display(),
            "TickBridge CLI: {} command",
            command
        );
    }
}
