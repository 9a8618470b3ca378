//! TickBridge - a blocking remote-call service in front of a tick-driven simulation.
//!
//! A remote caller blocks until its reply is ready; the simulated device only
//! moves forward on clock edges and must never be blocked by a caller. The
//! [`bridge`] module connects the two domains through a pair of
//! [`handoff`] channels, polling for work once per edge from the cooperative
//! side and blocking on replies from the thread side.
//!
//! # Example
//!
//! ```ignore
//! use tickbridge::bridge::{BridgeSupervisor, StopCondition, SupervisorConfig};
//!
//! let mut bridge = BridgeSupervisor::start(SupervisorConfig::default())?;
//! let summary = bridge.run_until(StopCondition::Transactions(10)).await?;
//! bridge.shutdown();
//! ```

pub mod bridge;
pub mod config;
pub mod dut;
pub mod handoff;
pub mod logging;
pub mod message;
pub mod server;
pub mod sim;

/// Version of the library and CLI, injected from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
