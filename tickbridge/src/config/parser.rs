//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::MAX_SERVER_WORKERS;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::dut::MAX_WIDTH;

/// Parses an `Ini` into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("address") {
            let v = v.trim();
            if v.to_socket_addrs().is_err() {
                return Err(invalid("server", "address", v, "expected host:port"));
            }
            config.server.address = v.to_string();
        }
        if let Some(v) = section.get("workers") {
            let workers: usize = parse_number("server", "workers", v, "must be a positive integer")?;
            if workers == 0 || workers > MAX_SERVER_WORKERS {
                return Err(invalid(
                    "server",
                    "workers",
                    v,
                    &format!("must be between 1 and {}", MAX_SERVER_WORKERS),
                ));
            }
            config.server.workers = workers;
        }
    }

    // [bridge] section
    if let Some(section) = ini.section(Some("bridge")) {
        if let Some(v) = section.get("request_capacity") {
            config.bridge.request_capacity = parse_number(
                "bridge",
                "request_capacity",
                v,
                "must be a non-negative integer (0 = unbounded)",
            )?;
        }
        if let Some(v) = section.get("call_timeout_ms") {
            config.bridge.call_timeout_ms = parse_number(
                "bridge",
                "call_timeout_ms",
                v,
                "must be a non-negative integer (0 = no timeout)",
            )?;
        }
    }

    // [clock] section
    if let Some(section) = ini.section(Some("clock")) {
        if let Some(v) = section.get("period_us") {
            let period: u64 = parse_number("clock", "period_us", v, "must be a positive integer")?;
            if period == 0 {
                return Err(invalid("clock", "period_us", v, "must be a positive integer"));
            }
            config.clock.period_us = period;
        }
    }

    // [device] section
    if let Some(section) = ini.section(Some("device")) {
        if let Some(v) = section.get("width") {
            let reason = format!("must be between 1 and {}", MAX_WIDTH);
            let width: u32 = parse_number("device", "width", v, &reason)?;
            if width == 0 || width > MAX_WIDTH {
                return Err(invalid("device", "width", v, &reason));
            }
            config.device.width = width;
        }
    }

    // [harness] section
    if let Some(section) = ini.section(Some("harness")) {
        if let Some(v) = section.get("transactions") {
            config.harness.transactions = parse_number(
                "harness",
                "transactions",
                v,
                "must be a non-negative integer (0 = run until interrupted)",
            )?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use crate::config::defaults::*;
    use crate::config::file::ConfigFileError;
    use crate::config::settings::ConfigFile;
    use std::time::Duration;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_overlays_values_on_defaults() {
        let config = load(
            r#"
[server]
address = 127.0.0.1:6000
workers = 2

[bridge]
request_capacity = 8
call_timeout_ms = 1500

[clock]
period_us = 250
"#,
        )
        .unwrap();

        assert_eq!(config.server.address, "127.0.0.1:6000");
        assert_eq!(config.server.workers, 2);
        assert_eq!(config.bridge.request_capacity(), Some(8));
        assert_eq!(config.bridge.call_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.clock.period(), Duration::from_micros(250));
        // Untouched sections keep their defaults
        assert_eq!(config.device.width, DEFAULT_DEVICE_WIDTH);
        assert_eq!(config.harness.transactions, DEFAULT_HARNESS_TRANSACTIONS);
    }

    #[test]
    fn test_zero_means_unbounded_and_no_timeout() {
        let config = load("[bridge]\nrequest_capacity = 0\ncall_timeout_ms = 0\n").unwrap();
        assert_eq!(config.bridge.request_capacity(), None);
        assert_eq!(config.bridge.call_timeout(), None);
    }

    #[test]
    fn test_invalid_workers() {
        let err = load("[server]\nworkers = 0\n").unwrap_err();
        assert!(err.to_string().contains("server.workers"));
        assert!(err.to_string().contains("between 1 and"));

        assert!(load("[server]\nworkers = many\n").is_err());
    }

    #[test]
    fn test_invalid_device_width() {
        let err = load("[device]\nwidth = 64\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, value, .. } => {
                assert_eq!(section, "device");
                assert_eq!(key, "width");
                assert_eq!(value, "64");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_clock_period() {
        assert!(load("[clock]\nperiod_us = 0\n").is_err());
        assert!(load("[clock]\nperiod_us = -5\n").is_err());
    }

    #[test]
    fn test_invalid_address() {
        let err = load("[server]\naddress = not-an-address\n").unwrap_err();
        assert!(err.to_string().contains("host:port"));
    }

    #[test]
    fn test_logging_file_expands_tilde() {
        let config = load("[logging]\nfile = ~/logs/bridge.log\n").unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.logging.file, home.join("logs/bridge.log"));
        }
    }
}
