#![deny(unsafe_code)]

//! ONC RPC v2 (RFC 1057) message types.
//!
//! The call envelope, the full reply taxonomy, and the constants both
//! sides of the wire agree on. Byte-level work is delegated to
//! [`reef_xdr`].

mod call;
mod reply;

pub use call::{Call, CallError, OpaqueAuth};
pub use reply::{AcceptedReply, DeniedReply, Reply};

/// The only RPC version this server speaks.
pub const RPC_VERSION: u32 = 2;

/// Message types (RFC 1057 `enum msg_type`).
pub const CALL: u32 = 0;
pub const REPLY: u32 = 1;

/// Reply stats (RFC 1057 `enum reply_stat`).
pub const MSG_ACCEPTED: u32 = 0;
pub const MSG_DENIED: u32 = 1;

/// Accept stats (RFC 1057 `enum accept_stat`).
pub const SUCCESS: u32 = 0;
pub const PROG_UNAVAIL: u32 = 1;
pub const PROG_MISMATCH: u32 = 2;
pub const PROC_UNAVAIL: u32 = 3;
pub const GARBAGE_ARGS: u32 = 4;
pub const SYSTEM_ERR: u32 = 5;

/// Reject stats (RFC 1057 `enum reject_stat`).
pub const RPC_MISMATCH: u32 = 0;
pub const AUTH_ERROR: u32 = 1;

/// Authentication flavors (RFC 1057 `enum auth_flavor`). Bodies are
/// carried opaquely and never validated.
pub const AUTH_NULL: u32 = 0;
pub const AUTH_UNIX: u32 = 1;
pub const AUTH_SHORT: u32 = 2;
pub const AUTH_DES: u32 = 3;

/// Upper bound on credential and verifier bodies (RFC 1057 §7.2).
pub const MAX_AUTH_BYTES: usize = 400;
