//! Clock edges for the cooperative domain.
//!
//! [`Clock`] owns the device under test and is the only thing that advances
//! simulated time. Each [`Clock::step`] evaluates the device's rising edge and
//! then publishes the new cycle number; tasks holding an [`Edges`] handle wake
//! up after the device has already latched its new state.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// A device whose state only changes on a rising clock edge.
pub trait ClockedDevice {
    /// Latches inputs into registered outputs.
    fn rising_edge(&mut self);

    /// Drives the device's reset input.
    fn set_reset(&mut self, asserted: bool);
}

/// The clock was dropped, so no further edges will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("clock stopped")]
pub struct ClockStopped;

// =============================================================================
// Clock
// =============================================================================

/// Owner of simulated time and of the device it drives.
///
/// Not `Send`: the device lives in the cooperative domain for the lifetime
/// of the run.
pub struct Clock<D> {
    device: Rc<RefCell<D>>,
    cycle: u64,
    edges: watch::Sender<u64>,
}

impl<D: ClockedDevice> Clock<D> {
    /// Creates a clock at cycle 0 driving `device`.
    pub fn new(device: D) -> Self {
        let (edges, _) = watch::channel(0);
        Self {
            device: Rc::new(RefCell::new(device)),
            cycle: 0,
            edges,
        }
    }

    /// Shared handle to the device, for tasks in the same domain.
    pub fn device(&self) -> Rc<RefCell<D>> {
        Rc::clone(&self.device)
    }

    /// Subscribes to rising edges.
    pub fn edges(&self) -> Edges {
        Edges {
            rx: self.edges.subscribe(),
        }
    }

    /// Number of edges produced so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Produces one rising edge and returns the new cycle number.
    pub fn step(&mut self) -> u64 {
        self.device.borrow_mut().rising_edge();
        self.cycle += 1;
        self.edges.send_replace(self.cycle);
        trace!(cycle = self.cycle, "Rising edge");
        self.cycle
    }

    /// Holds reset asserted for `cycles` edges, then releases it.
    pub fn hold_reset(&mut self, cycles: u64) {
        self.device.borrow_mut().set_reset(true);
        for _ in 0..cycles.max(1) {
            self.step();
        }
        self.device.borrow_mut().set_reset(false);
        debug!(cycle = self.cycle, "Reset released");
    }
}

// =============================================================================
// Edges
// =============================================================================

/// Subscriber handle used by tasks to suspend until the next rising edge.
#[derive(Clone)]
pub struct Edges {
    rx: watch::Receiver<u64>,
}

impl Edges {
    /// Waits for the next rising edge after this call and returns its cycle.
    ///
    /// Edges that happened before the call are not counted.
    pub async fn next_edge(&mut self) -> Result<u64, ClockStopped> {
        self.rx.borrow_and_update();
        self.rx.changed().await.map_err(|_| ClockStopped)?;
        Ok(*self.rx.borrow_and_update())
    }

    /// Waits for `count` rising edges.
    pub async fn cycles(&mut self, count: u64) -> Result<u64, ClockStopped> {
        let mut cycle = self.current();
        for _ in 0..count {
            cycle = self.next_edge().await?;
        }
        Ok(cycle)
    }

    /// The most recently published cycle.
    pub fn current(&self) -> u64 {
        *self.rx.borrow()
    }
}

// =============================================================================
// ClockSource
// =============================================================================

/// Periodic tick generator driving a [`Clock`] in real time.
#[derive(Debug, Clone, Copy)]
pub struct ClockSource {
    period: Duration,
}

impl ClockSource {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_micros(1)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Steps `clock` once per period until `done` returns true or shutdown.
    ///
    /// `done` is evaluated after every edge, once the tasks woken by it have
    /// had a chance to run. Returns the final cycle number.
    pub async fn drive<D, F>(
        &self,
        clock: &mut Clock<D>,
        shutdown: &CancellationToken,
        mut done: F,
    ) -> u64
    where
        D: ClockedDevice,
        F: FnMut(u64) -> bool,
    {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(cycle = clock.cycle(), "Clock source stopped by shutdown");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let cycle = clock.step();
            tokio::task::yield_now().await;

            if done(cycle) {
                debug!(cycle, "Clock source stop condition reached");
                break;
            }
        }

        clock.cycle()
    }
}
