//! Remote-call transport for the `Add` service.
//!
//! `AddNumbers.Add(AddOperands) -> AddResult` over gRPC, generated from
//! `proto/tickbridge/v1/add_numbers.proto`. The server runs on its own
//! runtime and hands each RPC to the blocking
//! [`ServiceFront`](crate::bridge::ServiceFront).

mod client;
pub mod proto;
mod service;

pub use client::{ClientError, RemoteClient};
pub use service::{
    AddFront, AddService, ServerError, ServiceServer, MAX_MESSAGE_BYTES, SHUTDOWN_GRACE,
};
