//! Settings structs, one per `[section]` of the INI file.
//!
//! Pure data; parsing lives in [`super::parser`], serialization in
//! [`super::writer`].

use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub bridge: BridgeSettings,
    pub clock: ClockSettings,
    pub device: DeviceSettings,
    pub harness: HarnessSettings,
    pub logging: LoggingSettings,
}

/// Remote-call endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// `host:port` to bind.
    pub address: String,
    /// Connection handler threads.
    pub workers: usize,
}

/// Cross-domain bridge tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Request channel capacity, 0 for unbounded.
    pub request_capacity: usize,
    /// Call timeout in milliseconds, 0 to wait indefinitely.
    pub call_timeout_ms: u64,
}

impl BridgeSettings {
    /// Capacity as the handoff channel expects it.
    pub fn request_capacity(&self) -> Option<usize> {
        (self.request_capacity > 0).then_some(self.request_capacity)
    }

    /// Timeout as the service front expects it.
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSettings {
    /// Microseconds per simulated cycle.
    pub period_us: u64,
}

impl ClockSettings {
    pub fn period(&self) -> Duration {
        Duration::from_micros(self.period_us)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Adder operand width in bits.
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Stop after this many transactions; 0 runs until interrupted.
    pub transactions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path.
    pub file: PathBuf,
}
