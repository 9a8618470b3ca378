//! Cross-domain FIFO handoff between blocking threads and cooperative tasks.
//!
//! A [`HandoffChannel`] is the only structure shared between the thread domain
//! (the remote-call service) and the tick-driven cooperative domain. It offers
//! two ways to consume:
//!
//! | Consumer        | Operation                   | Blocks?                    |
//! |-----------------|-----------------------------|----------------------------|
//! | Thread domain   | [`HandoffChannel::blocking_pop`] | Yes, until an item or close |
//! | Tick domain     | [`HandoffChannel::try_pop`]      | Never                       |
//!
//! `push` never blocks and may be called from either side.
//!
//! # Example
//!
//! ```
//! use tickbridge::handoff::HandoffChannel;
//!
//! let channel = HandoffChannel::unbounded();
//! channel.push(1).unwrap();
//! channel.push(2).unwrap();
//!
//! assert_eq!(channel.try_pop(), Ok(Some(1)));
//! assert_eq!(channel.blocking_pop(), Ok(2));
//! assert_eq!(channel.try_pop(), Ok(None));
//! ```

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Error returned by [`HandoffChannel::push`].
///
/// The rejected value is handed back so the caller can report it.
#[derive(PartialEq, Eq)]
pub enum PushError<T> {
    /// The channel was closed by shutdown.
    Closed(T),

    /// The channel is bounded and already holds `capacity` items.
    Full { value: T, capacity: usize },
}

impl<T> PushError<T> {
    /// Recovers the value that could not be pushed.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Closed(value) | PushError::Full { value, .. } => value,
        }
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Closed(_) => f.write_str("Closed(..)"),
            PushError::Full { capacity, .. } => f
                .debug_struct("Full")
                .field("capacity", capacity)
                .finish_non_exhaustive(),
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Closed(_) => write!(f, "handoff channel is closed"),
            PushError::Full { capacity, .. } => {
                write!(f, "handoff channel is full ({} items)", capacity)
            }
        }
    }
}

impl<T> std::error::Error for PushError<T> {}

/// Error returned by the pop operations.
///
/// An empty [`HandoffChannel::try_pop`] is *not* an error; it is `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PopError {
    /// The channel was closed; pending and future pops are cancelled.
    #[error("handoff channel is closed")]
    Closed,

    /// No item arrived before the deadline.
    #[error("timed out waiting for handoff")]
    TimedOut,
}

// =============================================================================
// HandoffChannel
// =============================================================================

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    available: Condvar,
    capacity: Option<usize>,
}

/// Thread-safe FIFO used to hand values across the domain boundary.
///
/// Cloning produces another handle to the same queue. Each value is delivered
/// to exactly one consumer, in push order.
pub struct HandoffChannel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for HandoffChannel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for HandoffChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("HandoffChannel")
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .field("capacity", &self.shared.capacity)
            .finish()
    }
}

impl<T> HandoffChannel<T> {
    /// Creates a channel that grows without limit.
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// Creates a channel that rejects pushes beyond `capacity` queued items.
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity.max(1)))
    }

    /// Creates a channel with an optional bound.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    items: VecDeque::new(),
                    closed: false,
                }),
                available: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Enqueues a value at the tail. Never blocks.
    pub fn push(&self, value: T) -> Result<(), PushError<T>> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(PushError::Closed(value));
        }
        if let Some(capacity) = self.shared.capacity {
            if state.items.len() >= capacity {
                return Err(PushError::Full { value, capacity });
            }
        }
        state.items.push_back(value);
        drop(state);

        self.shared.available.notify_one();
        Ok(())
    }

    /// Removes the head value if one is queued.
    ///
    /// Returns `Ok(None)` immediately when the channel is empty. This is the
    /// only pop the cooperative domain may use.
    pub fn try_pop(&self) -> Result<Option<T>, PopError> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(PopError::Closed);
        }
        Ok(state.items.pop_front())
    }

    /// Blocks the calling thread until a value is available.
    ///
    /// Returns [`PopError::Closed`] as soon as the channel is closed, even if
    /// the caller was already waiting.
    pub fn blocking_pop(&self) -> Result<T, PopError> {
        let mut state = self.shared.state.lock();
        loop {
            if state.closed {
                return Err(PopError::Closed);
            }
            if let Some(value) = state.items.pop_front() {
                return Ok(value);
            }
            self.shared.available.wait(&mut state);
        }
    }

    /// Like [`blocking_pop`](Self::blocking_pop) but gives up after `timeout`.
    pub fn blocking_pop_timeout(&self, timeout: Duration) -> Result<T, PopError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if state.closed {
                return Err(PopError::Closed);
            }
            if let Some(value) = state.items.pop_front() {
                return Ok(value);
            }
            if self
                .shared
                .available
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                if state.closed {
                    return Err(PopError::Closed);
                }
                return state.items.pop_front().ok_or(PopError::TimedOut);
            }
        }
    }

    /// Closes the channel and wakes every blocked consumer.
    ///
    /// Queued values are dropped. Returns how many were discarded.
    pub fn close(&self) -> usize {
        let mut state = self.shared.state.lock();
        state.closed = true;
        let discarded = state.items.len();
        state.items.clear();
        drop(state);

        self.shared.available.notify_all();
        discarded
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Number of queued values.
    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Tests
// =============================================================================
