//! Completed-transaction counter.
//!
//! The counter has exactly one writer, the [`TransactionRecorder`] owned by the
//! response forwarder, and any number of read-only [`TransactionCount`]
//! views used by the harness to decide when to stop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Creates a fresh counter at zero, returning its writer and a reader.
pub fn transaction_counter() -> (TransactionRecorder, TransactionCount) {
    let value = Arc::new(AtomicU64::new(0));
    (
        TransactionRecorder {
            value: Arc::clone(&value),
        },
        TransactionCount { value },
    )
}

/// The single writer of the transaction counter.
///
/// Deliberately not `Clone`.
#[derive(Debug)]
pub struct TransactionRecorder {
    value: Arc<AtomicU64>,
}

impl TransactionRecorder {
    /// Records one completed request/response pair; returns the new total.
    ///
    /// A pair is complete once its reply is handed back to the front, whether
    /// or not the caller is still waiting for it. Error replies and late
    /// replies to timed-out calls both count.
    pub fn record(&mut self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// A read-only view of this counter.
    pub fn reader(&self) -> TransactionCount {
        TransactionCount {
            value: Arc::clone(&self.value),
        }
    }
}

/// Read-only view of the transaction counter.
#[derive(Debug, Clone)]
pub struct TransactionCount {
    value: Arc<AtomicU64>,
}

impl TransactionCount {
    /// Current number of completed transactions.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }
}
