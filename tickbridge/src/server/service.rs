//! gRPC `AddNumbers` service on a dedicated runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐  per RPC   ┌──────────────────────────────┐
//! │ tonic server           │ ─────────► │ blocking pool (workers)      │
//! │ (service-runtime       │            │  ServiceFront::call (blocks) │
//! │  thread, own runtime)  │ ◄───────── │                              │
//! └────────────────────────┘  Status    └──────────────────────────────┘
//! ```
//!
//! Everything here runs in the thread domain. The runtime is separate from
//! the cooperative domain's, so a handler blocked in a call never stalls the
//! clock. Calls are dispatched per RPC rather than per connection: an idle
//! client holds no pool thread. The pool size only bounds how many calls may
//! wait in the front at once; the front serializes them regardless.

use super::proto::add_numbers_server::{AddNumbers, AddNumbersServer};
use super::proto;
use crate::bridge::ServiceFront;
use crate::message::{AddOperands, AddResult};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, warn};

/// The front served by this transport.
pub type AddFront = ServiceFront<AddOperands, AddResult>;

/// Largest request message the service decodes. An `AddOperands` needs at
/// most 22 bytes; anything bigger is rejected before it reaches the front.
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// How long in-flight RPCs may take to drain after shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Transport errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The service runtime could not be built.
    #[error("failed to build service runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The service thread could not be spawned.
    #[error("failed to spawn service thread: {0}")]
    Spawn(#[source] io::Error),

    /// The bound socket could not be inspected.
    #[error("socket setup failed: {0}")]
    Socket(#[source] io::Error),

    /// The service thread ended before reporting its address.
    #[error("service thread exited during startup")]
    Stopped,
}

// =============================================================================
// RPC handler
// =============================================================================

/// `AddNumbers` implementation backed by the blocking service front.
pub struct AddService {
    front: Arc<AddFront>,
}

impl AddService {
    pub fn new(front: Arc<AddFront>) -> Self {
        Self { front }
    }
}

#[tonic::async_trait]
impl AddNumbers for AddService {
    async fn add(
        &self,
        request: Request<proto::AddOperands>,
    ) -> Result<Response<proto::AddResult>, Status> {
        let operands = AddOperands::from(request.into_inner());
        let front = Arc::clone(&self.front);

        let outcome = tokio::task::spawn_blocking(move || front.call(operands))
            .await
            .map_err(|e| Status::internal(format!("call handler failed: {}", e)))?;

        match outcome {
            Ok(result) => Ok(Response::new(result.into())),
            Err(err) => {
                debug!(kind = err.kind(), error = %err, "Call failed");
                Err(err.into())
            }
        }
    }
}

// =============================================================================
// Server lifecycle
// =============================================================================

/// Running gRPC service.
pub struct ServiceServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl ServiceServer {
    /// Binds `address` and serves `AddNumbers` on a dedicated runtime whose
    /// blocking pool holds at most `workers` calls.
    pub fn bind(address: &str, workers: usize, front: Arc<AddFront>) -> Result<Self, ServerError> {
        let workers = workers.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("service-worker")
            .enable_all()
            .build()
            .map_err(ServerError::Runtime)?;

        let shutdown = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = {
            let address = address.to_string();
            let shutdown = shutdown.clone();
            thread::Builder::new()
                .name("service-runtime".to_string())
                .spawn(move || {
                    runtime.block_on(serve(address, workers, front, shutdown, ready_tx));
                    runtime.shutdown_timeout(SHUTDOWN_GRACE);
                })
                .map_err(ServerError::Spawn)?
        };

        let startup = futures::executor::block_on(ready_rx);
        let local_addr = match startup {
            Ok(Ok(addr)) => addr,
            Ok(Err(e)) => {
                join_service_thread(thread);
                return Err(e);
            }
            Err(_) => {
                join_service_thread(thread);
                return Err(ServerError::Stopped);
            }
        };

        Ok(Self {
            local_addr,
            shutdown,
            thread: Some(thread),
        })
    }

    /// Address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops serving and joins the service thread.
    ///
    /// The front must already be shut down, or an RPC blocked in a call holds
    /// the server open until [`SHUTDOWN_GRACE`] runs out.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.thread.take() {
            join_service_thread(thread);
            debug!(address = %self.local_addr, "Service thread joined");
        }
    }
}

impl Drop for ServiceServer {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn join_service_thread(thread: JoinHandle<()>) {
    if thread.join().is_err() {
        error!("Service thread panicked");
    }
}

/// Binds, reports the outcome on `ready`, then serves until `shutdown`.
async fn serve(
    address: String,
    workers: usize,
    front: Arc<AddFront>,
    shutdown: CancellationToken,
    ready: oneshot::Sender<Result<SocketAddr, ServerError>>,
) {
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(source) => {
            let _ = ready.send(Err(ServerError::Bind { address, source }));
            return;
        }
    };
    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            let _ = ready.send(Err(ServerError::Socket(e)));
            return;
        }
    };
    if ready.send(Ok(local_addr)).is_err() {
        return;
    }

    info!(address = %local_addr, workers, "Service listening");

    let service =
        AddNumbersServer::new(AddService::new(front)).max_decoding_message_size(MAX_MESSAGE_BYTES);
    let signal = shutdown.clone();
    let server = Server::builder()
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            signal.cancelled().await
        });

    tokio::select! {
        result = server => match result {
            Ok(()) => debug!(address = %local_addr, "Service stopped"),
            Err(e) => error!(address = %local_addr, error = %e, "Service transport failed"),
        },
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(SHUTDOWN_GRACE).await;
        } => {
            warn!(address = %local_addr, "In-flight calls did not drain, abandoning them");
        }
    }
}
