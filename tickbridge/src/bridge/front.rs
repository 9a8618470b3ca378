//! Blocking service front for the thread domain.
//!
//! [`ServiceFront::call`] is what a remote-call handler invokes. It pushes the
//! request onto the request [`HandoffChannel`], then blocks the calling thread
//! on the response channel until the cooperative domain answers.
//!
//! # Single flight
//!
//! Calls are serialized by a gate held for the whole call, so at most one
//! request is between the front and the cooperative domain at any time. That
//! is what lets replies be matched to requests by order alone.
//!
//! If calls are ever allowed to overlap, requests and replies need explicit
//! correlation. Tickets already travel with every envelope for that reason;
//! today they are only used to drop a reply whose call already timed out.

use super::error::CallError;
use crate::handoff::{HandoffChannel, PopError, PushError};
use crate::message::{Envelope, Reply, Ticket};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Channel carrying requests from the front into the cooperative domain.
pub type RequestChannel<Req> = HandoffChannel<Envelope<Req>>;

/// Channel carrying replies from the cooperative domain back to the front.
pub type ResponseChannel<Resp> = HandoffChannel<Envelope<Reply<Resp>>>;

/// Blocking call interface in front of the cooperative domain.
pub struct ServiceFront<Req, Resp> {
    requests: RequestChannel<Req>,
    responses: ResponseChannel<Resp>,
    /// Next ticket to issue; held for the duration of a call.
    gate: Mutex<Ticket>,
    accepting: AtomicBool,
    call_timeout: Option<Duration>,
}

impl<Req, Resp> ServiceFront<Req, Resp>
where
    Req: fmt::Debug,
    Resp: fmt::Debug,
{
    /// Creates a front over the given channel pair.
    ///
    /// With `call_timeout = None` a call waits for its reply until the reply
    /// arrives or the bridge shuts down.
    pub fn new(
        requests: RequestChannel<Req>,
        responses: ResponseChannel<Resp>,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            requests,
            responses,
            gate: Mutex::new(Ticket::new(1)),
            accepting: AtomicBool::new(true),
            call_timeout,
        }
    }

    /// Performs one call, blocking the calling thread until it completes.
    pub fn call(&self, request: Req) -> Result<Resp, CallError> {
        if !self.is_accepting() {
            return Err(CallError::Unavailable);
        }

        let mut next = self.gate.lock();

        // Shutdown may have happened while this call waited for the gate.
        if !self.is_accepting() {
            return Err(CallError::Unavailable);
        }

        let ticket = *next;
        *next = ticket.next();

        info!(ticket = %ticket, request = ?request, "Call received");
        let started = Instant::now();

        self.requests
            .push(Envelope::new(ticket, request))
            .map_err(|e| match e {
                PushError::Closed(_) => CallError::Cancelled,
                PushError::Full { capacity, .. } => {
                    warn!(ticket = %ticket, capacity, "Request queue full, rejecting call");
                    CallError::ResourceExhausted { capacity }
                }
            })?;
        debug!(ticket = %ticket, "Request handed off");

        let result = self.await_reply(ticket, started);
        drop(next);

        match &result {
            Ok(response) => info!(
                ticket = %ticket,
                response = ?response,
                duration_us = started.elapsed().as_micros() as u64,
                "Returning response"
            ),
            Err(err) => warn!(
                ticket = %ticket,
                error = %err,
                duration_us = started.elapsed().as_micros() as u64,
                "Call failed"
            ),
        }
        result
    }

    /// Waits for the reply carrying `ticket`, discarding stale ones.
    fn await_reply(&self, ticket: Ticket, started: Instant) -> Result<Resp, CallError> {
        loop {
            let popped = match self.call_timeout {
                None => self.responses.blocking_pop(),
                Some(timeout) => {
                    let remaining = timeout.saturating_sub(started.elapsed());
                    self.responses.blocking_pop_timeout(remaining)
                }
            };

            let envelope = popped.map_err(|e| match e {
                PopError::Closed => CallError::Cancelled,
                PopError::TimedOut => {
                    CallError::TimedOut(self.call_timeout.unwrap_or_default())
                }
            })?;

            if envelope.ticket == ticket {
                return envelope.payload.map_err(CallError::from);
            }

            warn!(
                expected = %ticket,
                received = %envelope.ticket,
                "Discarding reply for an abandoned call"
            );
        }
    }

    /// Stops accepting calls and cancels any call waiting for a reply.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        if self.accepting.swap(false, Ordering::AcqRel) {
            let dropped_requests = self.requests.close();
            let dropped_replies = self.responses.close();
            info!(
                dropped_requests,
                dropped_replies, "Service front shut down"
            );
        }
    }

    /// Returns true until [`shutdown`](Self::shutdown) is called.
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Configured call timeout, if any.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }
}

impl<Req, Resp> fmt::Debug for ServiceFront<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceFront")
            .field("accepting", &self.accepting.load(Ordering::Relaxed))
            .field("pending_requests", &self.requests.len())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::OperationError;
    use std::sync::Arc;
    use std::thread;

    type Front = ServiceFront<u32, u32>;

    fn front(timeout: Option<Duration>) -> (Arc<Front>, RequestChannel<u32>, ResponseChannel<u32>) {
        let requests = HandoffChannel::unbounded();
        let responses = HandoffChannel::unbounded();
        let front = Arc::new(ServiceFront::new(
            requests.clone(),
            responses.clone(),
            timeout,
        ));
        (front, requests, responses)
    }

    /// Echo loop standing in for the cooperative domain: replies `value * 2`.
    fn spawn_doubler(
        requests: RequestChannel<u32>,
        responses: ResponseChannel<u32>,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            while let Ok(env) = requests.blocking_pop() {
                let reply = env.map(|v| Ok(v * 2));
                if responses.push(reply).is_err() {
                    break;
                }
            }
        })
    }

    #[test]
    fn test_call_returns_matching_reply() {
        let (front, requests, responses) = front(None);
        let echo = spawn_doubler(requests, responses);

        assert_eq!(front.call(21), Ok(42));
        assert_eq!(front.call(5), Ok(10));

        front.shutdown();
        echo.join().unwrap();
    }

    #[test]
    fn test_operation_error_reaches_caller() {
        let (front, requests, responses) = front(None);
        let handle = thread::spawn(move || {
            let env = requests.blocking_pop().unwrap();
            responses
                .push(env.map(|_| Err(OperationError::ProtocolViolation("bad".into()))))
                .unwrap();
        });

        let err = front.call(1).unwrap_err();
        assert_eq!(
            err,
            CallError::Operation(OperationError::ProtocolViolation("bad".into()))
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_shutdown_cancels_blocked_call() {
        let (front, _requests, _responses) = front(None);
        let caller = {
            let front = Arc::clone(&front);
            thread::spawn(move || front.call(1))
        };

        thread::sleep(Duration::from_millis(30));
        front.shutdown();

        let start = Instant::now();
        assert_eq!(caller.join().unwrap(), Err(CallError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_calls_after_shutdown_are_unavailable() {
        let (front, _requests, _responses) = front(None);
        front.shutdown();
        front.shutdown();
        assert_eq!(front.call(1), Err(CallError::Unavailable));
    }

    #[test]
    fn test_timeout_then_stale_reply_is_discarded() {
        let (front, requests, responses) = front(Some(Duration::from_millis(20)));

        assert_eq!(
            front.call(1),
            Err(CallError::TimedOut(Duration::from_millis(20)))
        );

        // The abandoned request is answered late, then the next call is served.
        let late = requests.try_pop().unwrap().unwrap();
        responses.push(late.map(|v| Ok(v * 100))).unwrap();

        let echo = spawn_doubler(requests, responses);
        assert_eq!(front.call(3), Ok(6));

        front.shutdown();
        echo.join().unwrap();
    }

    #[test]
    fn test_full_request_queue_is_rejected() {
        let requests = HandoffChannel::bounded(1);
        let responses = HandoffChannel::unbounded();
        requests.push(Envelope::new(Ticket::new(0), 0u32)).unwrap();
        let front: Front = ServiceFront::new(requests, responses, None);

        assert_eq!(
            front.call(1),
            Err(CallError::ResourceExhausted { capacity: 1 })
        );
    }

    #[test]
    fn test_concurrent_callers_are_serialized() {
        let (front, requests, responses) = front(None);
        let in_flight = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let checker = {
            let in_flight = Arc::clone(&in_flight);
            thread::spawn(move || {
                while let Ok(env) = requests.blocking_pop() {
                    // A second request must never be queued behind this one.
                    assert!(requests.is_empty());
                    in_flight.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(1));
                    if responses.push(env.map(Ok)).is_err() {
                        break;
                    }
                }
            })
        };

        let callers: Vec<_> = (0..4u32)
            .map(|i| {
                let front = Arc::clone(&front);
                thread::spawn(move || {
                    for j in 0..5 {
                        let v = i * 100 + j;
                        assert_eq!(front.call(v), Ok(v));
                    }
                })
            })
            .collect();
        for c in callers {
            c.join().unwrap();
        }

        assert_eq!(in_flight.load(Ordering::SeqCst), 20);
        front.shutdown();
        checker.join().unwrap();
    }
}
