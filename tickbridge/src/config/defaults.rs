//! Default values for every configuration setting, and `ConfigFile::default()`.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

// =============================================================================
// Server
// =============================================================================

/// Endpoint the remote-call service binds to.
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5000";

/// Connection handler threads. One keeps calls strictly serialized end to end.
pub const DEFAULT_SERVER_WORKERS: usize = 1;

/// Upper bound on connection handler threads.
pub const MAX_SERVER_WORKERS: usize = 64;

// =============================================================================
// Bridge
// =============================================================================

/// Request channel capacity; 0 means unbounded.
pub const DEFAULT_REQUEST_CAPACITY: usize = 0;

/// Call timeout in milliseconds; 0 means wait for the reply indefinitely.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 0;

// =============================================================================
// Clock / device / harness
// =============================================================================

/// Real-time period of one simulated clock cycle.
pub const DEFAULT_CLOCK_PERIOD_US: u64 = 100;

/// Operand width of the simulated adder.
pub const DEFAULT_DEVICE_WIDTH: u32 = crate::dut::DEFAULT_WIDTH;

/// Completed transactions after which `serve` stops; 0 runs until interrupted.
pub const DEFAULT_HARNESS_TRANSACTIONS: u64 = 10;

// =============================================================================
// Logging
// =============================================================================

/// Default log file name.
pub const DEFAULT_LOG_FILE_NAME: &str = "tickbridge.log";

/// Default log file (`~/.tickbridge/tickbridge.log`).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                address: DEFAULT_SERVER_ADDRESS.to_string(),
                workers: DEFAULT_SERVER_WORKERS,
            },
            bridge: BridgeSettings {
                request_capacity: DEFAULT_REQUEST_CAPACITY,
                call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            },
            clock: ClockSettings {
                period_us: DEFAULT_CLOCK_PERIOD_US,
            },
            device: DeviceSettings {
                width: DEFAULT_DEVICE_WIDTH,
            },
            harness: HarnessSettings {
                transactions: DEFAULT_HARNESS_TRANSACTIONS,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
