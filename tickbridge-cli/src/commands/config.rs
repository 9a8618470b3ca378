//! Configuration management commands: `config path`, `config show`, `config init`.

use clap::Subcommand;
use std::path::Path;
use tickbridge::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a default configuration file if none exists
    Init,
}

/// Runs a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            let path = config_path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let (config, _) = load_config(config_path)?;
            print!("{}", config.to_config_string());
            Ok(())
        }
        ConfigCommands::Init => run_init(config_path),
    }
}

fn run_init(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    if ConfigFile::ensure_exists_at(&path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists, leaving it unchanged", path.display());
    }
    Ok(())
}
