//! Tick-driven simulation primitives.
//!
//! The cooperative domain runs on a single thread (a tokio `LocalSet`) and
//! advances only when the [`Clock`] produces an edge. Tasks suspend on
//! [`Edges::next_edge`] rather than blocking, so a slow task never stalls the
//! clock.

mod clock;

pub use clock::{Clock, ClockSource, ClockStopped, ClockedDevice, Edges};
