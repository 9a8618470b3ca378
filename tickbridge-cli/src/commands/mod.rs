//! CLI command implementations.
//!
//! - [`add`] - Call `Add` on a running bridge
//! - [`config`] - Configuration management (path, show, init)
//! - [`serve`] - Run the bridge

pub mod add;
pub mod config;
pub mod serve;
