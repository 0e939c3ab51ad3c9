#![deny(unsafe_code)]

//! RPC transport and service layer.
//!
//! Turns TCP byte streams (via RFC 1057 §10 record marking) and UDP
//! datagrams into complete request messages, dispatches them against a
//! per-service procedure table, and writes the framed replies back.
//! [`RpcService`] owns the listener lifecycle: bind, serve concurrently,
//! shut down cooperatively, drain.

mod dispatch;
mod framing;
mod service;

pub use dispatch::{dispatch, DispatchError, HandlerError, ProcedureTable};
pub use framing::{read_message, write_message, FrameError, MAX_FRAGMENT_BYTES};
pub use service::{RpcService, ShutdownHandle, Transport};
