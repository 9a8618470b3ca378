//! Configuration for the bridge, loaded from `~/.tickbridge/config.ini`.
//!
//! # Example
//!
//! ```
//! use tickbridge::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.server.workers, 1);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    BridgeSettings, ClockSettings, ConfigFile, DeviceSettings, HarnessSettings, LoggingSettings,
    ServerSettings,
};
