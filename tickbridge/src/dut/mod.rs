//! Simulated device under test.
//!
//! The bridge is agnostic to what the worker does with a request; this module
//! supplies the concrete operation served by the `Add` call: a registered
//! adder ([`Adder`]) and the [`AdderTransactor`] that drives it.

mod adder;
mod transactor;

pub use adder::{signal, Adder, DEFAULT_WIDTH, MAX_WIDTH};
pub use transactor::AdderTransactor;
