//! Hands completed replies back across the domain boundary.

use super::counter::TransactionRecorder;
use super::front::ResponseChannel;
use crate::message::{Envelope, Reply};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cooperative task moving replies onto the response handoff channel.
///
/// The push never blocks (the channel is unbounded and only briefly locked),
/// so forwarding never delays the tick source. Each successful push counts one
/// completed transaction. That includes the late reply to a call that already
/// timed out: the device did the work, even though the front discards the
/// reply instead of delivering it.
pub struct ResponseForwarder<Resp> {
    replies: mpsc::UnboundedReceiver<Envelope<Reply<Resp>>>,
    responses: ResponseChannel<Resp>,
    recorder: TransactionRecorder,
}

impl<Resp> ResponseForwarder<Resp> {
    pub fn new(
        replies: mpsc::UnboundedReceiver<Envelope<Reply<Resp>>>,
        responses: ResponseChannel<Resp>,
        recorder: TransactionRecorder,
    ) -> Self {
        Self {
            replies,
            responses,
            recorder,
        }
    }

    /// Forwards replies until shutdown, the worker goes away, or the front
    /// closes.
    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            let envelope = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.replies.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let ticket = envelope.ticket;
            if let Err(err) = self.responses.push(envelope) {
                warn!(ticket = %ticket, error = %err, "Could not return reply to service front");
                break;
            }

            let total = self.recorder.record();
            debug!(ticket = %ticket, transactions = total, "Reply handed back");
        }

        info!("Response forwarder stopped");
    }
}
