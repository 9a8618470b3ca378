//! Per-tick, non-blocking poll of the request channel.

use super::front::RequestChannel;
use crate::handoff::PopError;
use crate::message::Envelope;
use crate::sim::{ClockStopped, Edges};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Moves requests from the cross-domain channel into the cooperative domain.
///
/// Polls at most once per rising edge, so under load callers queue in the
/// handoff channel and drain one tick at a time.
pub struct TickPoller<Req> {
    requests: RequestChannel<Req>,
    internal: mpsc::UnboundedSender<Envelope<Req>>,
    edges: Edges,
}

impl<Req> TickPoller<Req> {
    pub fn new(
        requests: RequestChannel<Req>,
        internal: mpsc::UnboundedSender<Envelope<Req>>,
        edges: Edges,
    ) -> Self {
        Self {
            requests,
            internal,
            edges,
        }
    }

    /// Polls once per edge until shutdown, the front closes, or the worker
    /// goes away.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), ClockStopped> {
        loop {
            let cycle = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                edge = self.edges.next_edge() => edge?,
            };

            if !self.poll_once(cycle) {
                break;
            }
        }

        info!("Tick poller stopped");
        Ok(())
    }

    /// Performs one non-blocking poll. Returns false when polling should stop.
    fn poll_once(&self, cycle: u64) -> bool {
        match self.requests.try_pop() {
            Ok(Some(envelope)) => {
                debug!(cycle, ticket = %envelope.ticket, "Request drained into cooperative domain");
                self.internal.send(envelope).is_ok()
            }
            Ok(None) => true,
            Err(PopError::Closed) => {
                debug!(cycle, "Request channel closed");
                false
            }
            Err(PopError::TimedOut) => true,
        }
    }
}
