//! CALL parsing, procedure lookup, and reply construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use reef_wire::{AcceptedReply, Call, CallError, DeniedReply, Reply, RPC_VERSION};
use reef_xdr::{self as xdr, Encode};
use tracing::{debug, warn};

/// How a procedure handler failed.
#[derive(Debug)]
pub enum HandlerError {
    /// The argument bytes did not decode; the client sent garbage.
    Garbage(xdr::Error),
    /// The handler failed after decoding its arguments.
    Internal(String),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Garbage(error) => write!(f, "argument decode failed: {error}"),
            HandlerError::Internal(reason) => write!(f, "handler fault: {reason}"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<xdr::Error> for HandlerError {
    fn from(error: xdr::Error) -> Self {
        HandlerError::Garbage(error)
    }
}

/// A procedure handler: argument bytes in, an XDR-encodable result out.
///
/// Handlers are stateless with respect to the service; anything shared
/// must be internally synchronized.
pub type ProcedureHandler =
    Arc<dyn Fn(&[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> + Send + Sync>;

/// Procedure number → handler. Built while the service is constructed,
/// frozen once serving starts.
#[derive(Clone, Default)]
pub struct ProcedureTable {
    handlers: HashMap<u32, ProcedureHandler>,
}

impl ProcedureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Re-registering a procedure number replaces the
    /// previous handler.
    pub fn register<F>(&mut self, procedure: u32, handler: F)
    where
        F: Fn(&[u8]) -> Result<Box<dyn Encode + Send>, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(procedure, Arc::new(handler));
    }

    pub fn get(&self, procedure: u32) -> Option<&ProcedureHandler> {
        self.handlers.get(&procedure)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ProcedureTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut procedures: Vec<u32> = self.handlers.keys().copied().collect();
        procedures.sort_unstable();
        f.debug_struct("ProcedureTable")
            .field("procedures", &procedures)
            .finish()
    }
}

/// The request could not be turned into any reply; the transport should
/// drop the connection (TCP) or the datagram (UDP).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError;

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unreplyable request")
    }
}

impl std::error::Error for DispatchError {}

/// Process one complete request message into one complete reply message.
///
/// Every recoverable fault maps to the RFC 1057 reply that describes it;
/// the reply always echoes the request xid.
pub fn dispatch(
    message: &[u8],
    program: u32,
    version: u32,
    table: &ProcedureTable,
) -> Result<Vec<u8>, DispatchError> {
    let (call, args_offset) = match Call::parse(message) {
        Ok(parsed) => parsed,
        Err(CallError::OversizeAuth { xid }) => {
            debug!(xid, "oversize auth body, replying garbage args");
            return Ok(Reply::Accepted(AcceptedReply::GarbageArgs).serialize(xid));
        }
        Err(error) => {
            debug!(%error, "unparseable request");
            return Err(DispatchError);
        }
    };

    debug!(
        xid = call.xid,
        program = call.program,
        version = call.version,
        procedure = call.procedure,
        "call"
    );

    if call.rpc_version != RPC_VERSION {
        let denied = DeniedReply::RpcMismatch {
            low: RPC_VERSION,
            high: RPC_VERSION,
        };
        return Ok(Reply::Denied(denied).serialize(call.xid));
    }

    if call.program != program {
        return Ok(Reply::Accepted(AcceptedReply::ProgUnavail).serialize(call.xid));
    }

    if call.version != version {
        let mismatch = AcceptedReply::ProgMismatch {
            low: version,
            high: version,
        };
        return Ok(Reply::Accepted(mismatch).serialize(call.xid));
    }

    let Some(handler) = table.get(call.procedure) else {
        return Ok(Reply::Accepted(AcceptedReply::ProcUnavail).serialize(call.xid));
    };

    let reply = match handler(&message[args_offset..]) {
        Ok(value) => match xdr::to_bytes(value.as_ref()) {
            Ok(results) => Reply::success(results),
            Err(error) => {
                warn!(xid = call.xid, procedure = call.procedure, %error, "result encode failed");
                Reply::Accepted(AcceptedReply::SystemErr)
            }
        },
        Err(HandlerError::Garbage(error)) => {
            debug!(xid = call.xid, procedure = call.procedure, %error, "garbage arguments");
            Reply::Accepted(AcceptedReply::GarbageArgs)
        }
        Err(HandlerError::Internal(reason)) => {
            warn!(xid = call.xid, procedure = call.procedure, %reason, "handler fault");
            Reply::Accepted(AcceptedReply::SystemErr)
        }
    };

    Ok(reply.serialize(call.xid))
}
