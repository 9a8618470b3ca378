//! Bridge error types.

use crate::message::OperationError;
use crate::server::ServerError;
use std::time::Duration;
use thiserror::Error;

/// Why a call through the service front did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The bridge shut down while the call was waiting for its reply.
    #[error("call cancelled: bridge is shutting down")]
    Cancelled,

    /// The front no longer accepts calls.
    #[error("service unavailable: bridge is not accepting calls")]
    Unavailable,

    /// No reply arrived within the configured call timeout.
    #[error("no reply within {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The request queue is bounded and full.
    #[error("request queue is full ({capacity} pending)")]
    ResourceExhausted { capacity: usize },

    /// The cooperative domain processed the request and reported a failure.
    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl CallError {
    /// Stable machine-readable name, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            CallError::Cancelled => "cancelled",
            CallError::Unavailable => "unavailable",
            CallError::TimedOut(_) => "timed_out",
            CallError::ResourceExhausted { .. } => "resource_exhausted",
            CallError::Operation(OperationError::ProtocolViolation(_)) => "protocol_violation",
            CallError::Operation(OperationError::Failed(_)) => "failed",
        }
    }
}

/// Fatal errors of the bridge supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The service endpoint could not be started.
    #[error("service endpoint failed: {0}")]
    Server(#[from] ServerError),

    /// `run` was called a second time on the same supervisor.
    #[error("bridge has already been run")]
    AlreadyRun,

    /// The tick source died while cooperative tasks were waiting on it.
    #[error("tick source stopped while the bridge was running")]
    ClockStopped,

    /// A cooperative task ended abnormally.
    #[error("cooperative task '{task}' failed: {reason}")]
    TaskFailed { task: &'static str, reason: String },
}
