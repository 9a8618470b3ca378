//! INI serialization: `ConfigFile` → commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Converts a `ConfigFile` to the commented INI text written to config.ini.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[server]
; Endpoint the Add service listens on (host:port)
address = {}
; Connection handler threads (default: 1)
; Calls are serialized by the bridge regardless of this value
workers = {}

[bridge]
; Maximum queued requests before calls are rejected (0 = unbounded)
request_capacity = {}
; Milliseconds a call waits for its reply (0 = wait until shutdown)
call_timeout_ms = {}

[clock]
; Real-time length of one simulated clock cycle, in microseconds
period_us = {}

[device]
; Operand width of the simulated adder, in bits (1-63)
width = {}

[harness]
; Stop serving after this many completed transactions (0 = run until Ctrl-C)
transactions = {}

[logging]
; Log file (truncated on every start)
file = {}
"#,
        config.server.address,
        config.server.workers,
        config.bridge.request_capacity,
        config.bridge.call_timeout_ms,
        config.clock.period_us,
        config.device.width,
        config.harness.transactions,
        path_to_string(&config.logging.file),
    )
}

/// Formats a path for the config file, collapsing the home directory to `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
