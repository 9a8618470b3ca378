//! Bridge lifecycle: wiring, the tick-driven run, and ordered shutdown.
//!
//! # Lifecycle
//!
//! ```text
//! start()      thread domain up: channels, front, gRPC service runtime
//! run_until()  cooperative domain: warm-up, reset, spawn tasks, drive clock
//! shutdown()   stop accepting → cancel blocked calls → stop tasks → join service thread
//! ```
//!
//! `run_until` must be awaited on a current-thread runtime (or any runtime,
//! as long as nothing else needs the thread); it builds its own
//! [`LocalSet`] so the device can stay `!Send`.

use super::counter::{transaction_counter, TransactionCount, TransactionRecorder};
use super::error::SupervisorError;
use super::forwarder::ResponseForwarder;
use super::front::{RequestChannel, ResponseChannel, ServiceFront};
use super::poller::TickPoller;
use super::worker::Worker;
use crate::config::{ConfigFile, DEFAULT_SERVER_ADDRESS, DEFAULT_SERVER_WORKERS};
use crate::dut::{Adder, AdderTransactor, DEFAULT_WIDTH};
use crate::handoff::HandoffChannel;
use crate::message::{AddOperands, AddResult};
use crate::server::{AddFront, ServiceServer};
use crate::sim::{Clock, ClockSource};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, LocalSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Cycles to let the device settle before reset.
pub const WARMUP_CYCLES: u64 = 2;

/// Cycles reset is held asserted.
pub const RESET_CYCLES: u64 = 1;

/// Everything the supervisor needs to start.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub address: String,
    pub workers: usize,
    pub request_capacity: Option<usize>,
    pub call_timeout: Option<Duration>,
    pub clock_period: Duration,
    pub device_width: u32,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_SERVER_ADDRESS.to_string(),
            workers: DEFAULT_SERVER_WORKERS,
            request_capacity: None,
            call_timeout: None,
            clock_period: Duration::from_micros(100),
            device_width: DEFAULT_WIDTH,
        }
    }
}

impl From<&ConfigFile> for SupervisorConfig {
    fn from(config: &ConfigFile) -> Self {
        Self {
            address: config.server.address.clone(),
            workers: config.server.workers,
            request_capacity: config.bridge.request_capacity(),
            call_timeout: config.bridge.call_timeout(),
            clock_period: config.clock.period(),
            device_width: config.device.width,
        }
    }
}

/// When `run_until` returns of its own accord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Once this many transactions have completed.
    Transactions(u64),
    /// Only on shutdown.
    Forever,
}

impl StopCondition {
    /// Maps the harness setting, where 0 means no limit.
    pub fn from_limit(transactions: u64) -> Self {
        if transactions == 0 {
            StopCondition::Forever
        } else {
            StopCondition::Transactions(transactions)
        }
    }

    pub fn is_met(&self, completed: u64) -> bool {
        match self {
            StopCondition::Transactions(n) => completed >= *n,
            StopCondition::Forever => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ConditionMet,
    Shutdown,
}

/// Outcome of [`BridgeSupervisor::run_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Clock cycles simulated, including warm-up and reset.
    pub cycles: u64,
    pub transactions: u64,
    pub reason: StopReason,
}

/// Owns both domains of the bridge.
pub struct BridgeSupervisor {
    config: SupervisorConfig,
    front: Arc<AddFront>,
    requests: RequestChannel<AddOperands>,
    responses: ResponseChannel<AddResult>,
    recorder: Option<TransactionRecorder>,
    transactions: TransactionCount,
    server: Option<ServiceServer>,
    shutdown: CancellationToken,
}

impl BridgeSupervisor {
    /// Brings up the thread domain: channels, front and the gRPC service.
    ///
    /// Calls accepted before [`run_until`](Self::run_until) queue in the
    /// request channel.
    pub fn start(config: SupervisorConfig) -> Result<Self, SupervisorError> {
        let requests = HandoffChannel::with_capacity(config.request_capacity);
        let responses = HandoffChannel::unbounded();
        let front = Arc::new(ServiceFront::new(
            requests.clone(),
            responses.clone(),
            config.call_timeout,
        ));
        let (recorder, transactions) = transaction_counter();

        let server = ServiceServer::bind(&config.address, config.workers, Arc::clone(&front))?;

        info!(
            address = %server.local_addr(),
            workers = config.workers,
            request_capacity = ?config.request_capacity,
            call_timeout_ms = config.call_timeout.map(|t| t.as_millis() as u64),
            "Bridge started"
        );

        Ok(Self {
            config,
            front,
            requests,
            responses,
            recorder: Some(recorder),
            transactions,
            server: Some(server),
            shutdown: CancellationToken::new(),
        })
    }

    /// Address the service is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(ServiceServer::local_addr)
    }

    /// Read-only view of the completed-transaction counter.
    pub fn transactions(&self) -> TransactionCount {
        self.transactions.clone()
    }

    /// The blocking front, for in-process callers.
    pub fn front(&self) -> Arc<AddFront> {
        Arc::clone(&self.front)
    }

    /// Token that stops `run_until` when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Configuration the bridge was started with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Runs the cooperative domain until `stop` is met or shutdown.
    ///
    /// Can be called once per supervisor.
    pub async fn run_until(&mut self, stop: StopCondition) -> Result<RunSummary, SupervisorError> {
        let recorder = self.recorder.take().ok_or(SupervisorError::AlreadyRun)?;
        LocalSet::new().run_until(self.run_cooperative(recorder, stop)).await
    }

    async fn run_cooperative(
        &self,
        recorder: TransactionRecorder,
        stop: StopCondition,
    ) -> Result<RunSummary, SupervisorError> {
        let mut clock = Clock::new(Adder::new(self.config.device_width));
        let source = ClockSource::new(self.config.clock_period);

        let warmed = source
            .drive(&mut clock, &self.shutdown, |cycle| cycle >= WARMUP_CYCLES)
            .await;
        if self.shutdown.is_cancelled() {
            return Ok(RunSummary {
                cycles: warmed,
                transactions: self.transactions.get(),
                reason: StopReason::Shutdown,
            });
        }
        clock.hold_reset(RESET_CYCLES);
        debug!(cycle = clock.cycle(), "Device reset released");

        let tasks = self.shutdown.child_token();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();

        let poller = TickPoller::new(self.requests.clone(), internal_tx, clock.edges());
        let worker = Worker::new(
            AdderTransactor::new(clock.device(), clock.edges()),
            internal_rx,
            reply_tx,
        );
        let forwarder = ResponseForwarder::new(reply_rx, self.responses.clone(), recorder);

        let poller_task = tokio::task::spawn_local(poller.run(tasks.clone()));
        let worker_task = tokio::task::spawn_local(worker.run(tasks.clone()));
        let forwarder_task = tokio::task::spawn_local(forwarder.run(tasks.clone()));
        info!(cycle = clock.cycle(), stop = ?stop, "Cooperative tasks running");

        let transactions = self.transactions.clone();
        let cycles = source
            .drive(&mut clock, &self.shutdown, |_| {
                stop.is_met(transactions.get())
                    || poller_task.is_finished()
                    || worker_task.is_finished()
                    || forwarder_task.is_finished()
            })
            .await;

        tasks.cancel();
        let polled = join("poller", poller_task).await?;
        let processed = join("worker", worker_task).await?;
        join("forwarder", forwarder_task).await?;

        if polled.is_err() {
            error!(cycle = cycles, "Tick source stopped under the poller");
            return Err(SupervisorError::ClockStopped);
        }

        let completed = self.transactions.get();
        let reason = if stop.is_met(completed) {
            StopReason::ConditionMet
        } else {
            StopReason::Shutdown
        };
        info!(cycles, transactions = completed, processed, reason = ?reason, "Bridge run finished");

        Ok(RunSummary {
            cycles,
            transactions: completed,
            reason,
        })
    }

    /// Shuts the bridge down in order and joins the service threads.
    ///
    /// 1. the front stops accepting calls
    /// 2. calls blocked on a reply return `CallError::Cancelled`
    /// 3. cooperative tasks stop at their next suspension point
    /// 4. the service thread pool is released
    pub fn shutdown(mut self) {
        self.front.shutdown();
        self.shutdown.cancel();
        if let Some(server) = self.server.take() {
            server.shutdown();
        }
        info!(transactions = self.transactions.get(), "Bridge shut down");
    }
}

async fn join<T>(task: &'static str, handle: JoinHandle<T>) -> Result<T, SupervisorError> {
    handle.await.map_err(|e: JoinError| {
        error!(task, error = %e, "Cooperative task ended abnormally");
        SupervisorError::TaskFailed {
            task,
            reason: e.to_string(),
        }
    })
}
