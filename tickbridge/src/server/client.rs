//! Blocking client for the `AddNumbers` service.

use super::proto;
use super::proto::add_numbers_client::AddNumbersClient;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Runtime;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Status};

/// Errors returned by [`RemoteClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to start client runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("invalid service address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("connection error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("no response within {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The service answered with an error status.
    #[error("remote error ({:?}): {}", .0.code(), .0.message())]
    Remote(#[from] Status),
}

impl ClientError {
    /// Status code when the service answered with an error.
    pub fn code(&self) -> Option<Code> {
        match self {
            ClientError::Remote(status) => Some(status.code()),
            _ => None,
        }
    }
}

/// One channel to a running service, driven by a private runtime so it can
/// be used from plain threads. Calls on it are sequential.
///
/// Must not be used from inside an async context.
pub struct RemoteClient {
    runtime: Runtime,
    client: AddNumbersClient<Channel>,
    timeout: Option<Duration>,
}

impl RemoteClient {
    /// Connects to the service at `host:port`.
    pub fn connect(address: &str) -> Result<Self, ClientError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClientError::Runtime)?;

        let endpoint = Endpoint::from_shared(format!("http://{}", address)).map_err(|e| {
            ClientError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            }
        })?;
        let channel = runtime.block_on(endpoint.connect())?;

        Ok(Self {
            runtime,
            client: AddNumbersClient::new(channel),
            timeout: None,
        })
    }

    /// Limits how long a call waits for its response. `None` waits forever.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Calls `Add(ina, inb)` and returns `res`.
    pub fn add(&mut self, ina: u64, inb: u64) -> Result<u64, ClientError> {
        let request = Request::new(proto::AddOperands { ina, inb });
        let call = self.client.add(request);

        let response = match self.timeout {
            Some(limit) => self
                .runtime
                .block_on(async { tokio::time::timeout(limit, call).await })
                .map_err(|_| ClientError::TimedOut(limit))??,
            None => self.runtime.block_on(call)?,
        };
        Ok(response.into_inner().res)
    }
}
