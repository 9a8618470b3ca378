//! The worker task that owns the domain operation.
//!
//! The worker takes one request at a time from the cooperative domain's
//! internal queue, drives it through a [`Transactor`] (which may suspend for
//! any number of ticks), and queues the reply for the forwarder. The next
//! request is not dequeued until the current one has a reply, so the device
//! never sees overlapping operations.

use crate::message::{Envelope, OperationError, Reply};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The domain operation performed for each request.
///
/// Implementations run in the cooperative domain and may hold `!Send` state.
/// They must suspend (await an edge or queue) rather than block.
pub trait Transactor {
    /// Request payload.
    type Request;

    /// Response payload.
    type Response;

    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Performs the operation for one request.
    fn drive<'a>(
        &'a mut self,
        request: Self::Request,
    ) -> LocalBoxFuture<'a, Reply<Self::Response>>;
}

/// Cooperative task running a [`Transactor`] over the internal request queue.
pub struct Worker<T: Transactor> {
    transactor: T,
    requests: mpsc::UnboundedReceiver<Envelope<T::Request>>,
    responses: mpsc::UnboundedSender<Envelope<Reply<T::Response>>>,
}

impl<T: Transactor> Worker<T> {
    pub fn new(
        transactor: T,
        requests: mpsc::UnboundedReceiver<Envelope<T::Request>>,
        responses: mpsc::UnboundedSender<Envelope<Reply<T::Response>>>,
    ) -> Self {
        Self {
            transactor,
            requests,
            responses,
        }
    }

    /// Processes requests until shutdown or until either queue closes.
    ///
    /// Returns the number of requests processed.
    pub async fn run(mut self, shutdown: CancellationToken) -> u64 {
        let mut processed = 0u64;

        loop {
            let envelope = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.requests.recv() => match next {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let ticket = envelope.ticket;
            debug!(
                ticket = %ticket,
                transactor = self.transactor.name(),
                "Driving request to device"
            );

            let operation = AssertUnwindSafe(self.transactor.drive(envelope.payload)).catch_unwind();
            let reply = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                outcome = operation => outcome.unwrap_or_else(|panic| {
                    Err(OperationError::Failed(format!(
                        "operation panicked: {}",
                        panic_message(panic.as_ref())
                    )))
                }),
            };

            if let Err(err) = &reply {
                warn!(ticket = %ticket, error = %err, "Operation failed, returning error reply");
            }

            processed += 1;
            if self.responses.send(Envelope::new(ticket, reply)).is_err() {
                debug!("Response queue closed");
                break;
            }
        }

        info!(processed, "Worker stopped");
        processed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Ticket;
    use crate::sim::{Clock, ClockedDevice, Edges};
    use tokio::task::LocalSet;

    struct Idle;

    impl ClockedDevice for Idle {
        fn rising_edge(&mut self) {}
        fn set_reset(&mut self, _asserted: bool) {}
    }

    /// Replies with the request after waiting `latency` edges; 0 is rejected.
    struct Delayed {
        edges: Edges,
        latency: u64,
    }

    impl Transactor for Delayed {
        type Request = u32;
        type Response = u32;

        fn name(&self) -> &str {
            "delayed"
        }

        fn drive<'a>(&'a mut self, request: u32) -> LocalBoxFuture<'a, Reply<u32>> {
            Box::pin(async move {
                if request == 0 {
                    return Err(OperationError::ProtocolViolation("zero".into()));
                }
                if request == 13 {
                    panic!("unlucky request");
                }
                self.edges
                    .cycles(self.latency)
                    .await
                    .map_err(|e| OperationError::Failed(e.to_string()))?;
                Ok(request)
            })
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_one_request_at_a_time_in_order() {
        LocalSet::new()
            .run_until(async {
                let mut clock = Clock::new(Idle);
                let (req_tx, req_rx) = mpsc::unbounded_channel();
                let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
                let worker = Worker::new(
                    Delayed {
                        edges: clock.edges(),
                        latency: 2,
                    },
                    req_rx,
                    resp_tx,
                );
                let shutdown = CancellationToken::new();
                let task = tokio::task::spawn_local(worker.run(shutdown.clone()));

                req_tx.send(Envelope::new(Ticket::new(1), 10)).unwrap();
                req_tx.send(Envelope::new(Ticket::new(2), 20)).unwrap();
                settle().await;

                clock.step();
                settle().await;
                assert!(resp_rx.try_recv().is_err());

                clock.step();
                settle().await;
                let first = resp_rx.try_recv().unwrap();
                assert_eq!(first.ticket, Ticket::new(1));
                assert_eq!(first.payload, Ok(10));
                assert!(resp_rx.try_recv().is_err(), "second must wait its own latency");

                clock.step();
                settle().await;
                clock.step();
                settle().await;
                let second = resp_rx.try_recv().unwrap();
                assert_eq!(second.payload, Ok(20));

                shutdown.cancel();
                assert_eq!(task.await.unwrap(), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn test_failures_become_error_replies() {
        LocalSet::new()
            .run_until(async {
                let mut clock = Clock::new(Idle);
                let (req_tx, req_rx) = mpsc::unbounded_channel();
                let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
                let worker = Worker::new(
                    Delayed {
                        edges: clock.edges(),
                        latency: 1,
                    },
                    req_rx,
                    resp_tx,
                );
                let task = tokio::task::spawn_local(worker.run(CancellationToken::new()));

                req_tx.send(Envelope::new(Ticket::new(1), 0)).unwrap();
                req_tx.send(Envelope::new(Ticket::new(2), 13)).unwrap();
                req_tx.send(Envelope::new(Ticket::new(3), 5)).unwrap();
                settle().await;
                clock.step();
                settle().await;

                let rejected = resp_rx.try_recv().unwrap();
                assert!(matches!(
                    rejected.payload,
                    Err(OperationError::ProtocolViolation(_))
                ));

                let panicked = resp_rx.try_recv().unwrap();
                match panicked.payload {
                    Err(OperationError::Failed(msg)) => assert!(msg.contains("unlucky request")),
                    other => panic!("expected failure reply, got {:?}", other),
                }

                // The worker survives and keeps serving.
                let ok = resp_rx.try_recv().unwrap();
                assert_eq!(ok.payload, Ok(5));

                drop(req_tx);
                assert_eq!(task.await.unwrap(), 3);
            })
            .await;
    }
}
