//! Request and response types carried across the bridge.
//!
//! ```text
//! ┌──────────────┐  Envelope<AddOperands>   ┌──────────────────┐
//! │ ServiceFront │ ───────────────────────► │ Cooperative      │
//! │ (thread)     │                          │ domain (ticks)   │
//! │              │ ◄─────────────────────── │                  │
//! └──────────────┘  Envelope<Reply<AddResult>> └───────────────┘
//! ```
//!
//! The bridge itself is generic over payloads; [`AddOperands`] and
//! [`AddResult`] are the payloads of the one remote operation the service
//! exposes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Add payloads
// =============================================================================

/// Operands of one remote `Add` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOperands {
    pub ina: u64,
    pub inb: u64,
}

impl AddOperands {
    pub fn new(ina: u64, inb: u64) -> Self {
        Self { ina, inb }
    }
}

impl fmt::Display for AddOperands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ina: {} inb: {}", self.ina, self.inb)
    }
}

/// Result of one remote `Add` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResult {
    pub res: u64,
}

impl fmt::Display for AddResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res: {}", self.res)
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Per-call sequence number assigned by the service front.
///
/// Calls are single-flight, so ordering alone pairs a reply with its request.
/// The ticket only lets the front recognise a reply to a call that already
/// gave up waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns the ticket that follows this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A payload tagged with the ticket of the call it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<T> {
    pub ticket: Ticket,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(ticket: Ticket, payload: T) -> Self {
        Self { ticket, payload }
    }

    /// Replaces the payload, keeping the ticket.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            ticket: self.ticket,
            payload: f(self.payload),
        }
    }
}

// =============================================================================
// Reply
// =============================================================================

/// Failure of the domain operation performed by the worker.
///
/// These never crash the cooperative domain; they travel back to the caller
/// as the reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The request could not be applied to the device as given.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The operation started but did not produce a result.
    #[error("operation failed: {0}")]
    Failed(String),
}

/// What the worker sends back for every request: a result or an error.
pub type Reply<R> = Result<R, OperationError>;
