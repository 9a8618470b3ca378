//! CLI error handling with user-friendly messages and exit codes.

use std::fmt;
use std::process;
use tickbridge::bridge::SupervisorError;
use tickbridge::config::ConfigFileError;
use tickbridge::server::{ClientError, ServerError};

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to build the async runtime
    Runtime(std::io::Error),
    /// Failed to install the Ctrl-C handler
    Signal(String),
    /// The bridge failed to start or run
    Bridge(SupervisorError),
    /// A remote call failed
    Call(ClientError),
    /// A result could not be rendered
    Output(String),
}

impl CliError {
    /// Exits the process with an error message and code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Bridge(SupervisorError::Server(ServerError::Bind { .. })) => {
                eprintln!();
                eprintln!("Is another bridge already listening on that address?");
                eprintln!("Pick another one with --address or in [server] of the config file.");
            }
            CliError::Call(ClientError::Transport(_)) => {
                eprintln!();
                eprintln!("Start the bridge first with: tickbridge serve");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Signal(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Bridge(e) => write!(f, "Bridge error: {}", e),
            CliError::Call(e) => write!(f, "Call failed: {}", e),
            CliError::Output(msg) => write!(f, "Failed to render output: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::Bridge(e) => Some(e),
            CliError::Call(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SupervisorError> for CliError {
    fn from(e: SupervisorError) -> Self {
        CliError::Bridge(e)
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Call(e)
    }
}
