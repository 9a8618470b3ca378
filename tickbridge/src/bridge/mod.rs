//! The cross-domain request/response bridge.
//!
//! ```text
//!  thread domain                    │  cooperative domain (one thread, LocalSet)
//!                                   │
//!  ServiceFront::call ──push──► [requests] ──try_pop/tick──► TickPoller
//!        ▲                          │                            │ mpsc
//!        │                          │                            ▼
//!        └──blocking_pop── [responses] ◄──push── ResponseForwarder ◄─mpsc─ Worker
//! ```
//!
//! The front serializes calls, so at most one request is in flight and
//! replies match requests by order. [`BridgeSupervisor`] wires the pieces
//! together and owns shutdown.

mod counter;
mod error;
mod forwarder;
mod front;
mod poller;
mod supervisor;
mod worker;

pub use counter::{transaction_counter, TransactionCount, TransactionRecorder};
pub use error::{CallError, SupervisorError};
pub use forwarder::ResponseForwarder;
pub use front::{RequestChannel, ResponseChannel, ServiceFront};
pub use poller::TickPoller;
pub use supervisor::{
    BridgeSupervisor, RunSummary, StopCondition, StopReason, SupervisorConfig, RESET_CYCLES,
    WARMUP_CYCLES,
};
pub use worker::{Transactor, Worker};
