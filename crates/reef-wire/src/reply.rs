use reef_xdr::Encoder;

use crate::{
    AUTH_ERROR, AUTH_NULL, GARBAGE_ARGS, MSG_ACCEPTED, MSG_DENIED, PROC_UNAVAIL, PROG_MISMATCH,
    PROG_UNAVAIL, REPLY, RPC_MISMATCH, SUCCESS, SYSTEM_ERR,
};

/// The reply taxonomy of RFC 1057 §8: a reply is either accepted or
/// denied, and each side carries its own discriminated detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Accepted(AcceptedReply),
    Denied(DeniedReply),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedReply {
    /// The procedure ran; `0` holds its XDR-encoded results.
    Success(Vec<u8>),
    ProgUnavail,
    ProgMismatch { low: u32, high: u32 },
    ProcUnavail,
    GarbageArgs,
    SystemErr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeniedReply {
    RpcMismatch { low: u32, high: u32 },
    AuthError { stat: u32 },
}

impl Reply {
    pub fn success(results: Vec<u8>) -> Self {
        Reply::Accepted(AcceptedReply::Success(results))
    }

    /// Serialize the complete reply message for the given request xid.
    ///
    /// Accepted replies carry an AUTH_NULL verifier with an empty body.
    pub fn serialize(&self, xid: u32) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.put_u32(xid);
        enc.put_u32(REPLY);

        match self {
            Reply::Accepted(accepted) => {
                enc.put_u32(MSG_ACCEPTED);
                enc.put_u32(AUTH_NULL);
                enc.put_u32(0); // empty verifier body
                match accepted {
                    AcceptedReply::Success(results) => {
                        enc.put_u32(SUCCESS);
                        enc.put_fixed_opaque(results);
                    }
                    AcceptedReply::ProgUnavail => enc.put_u32(PROG_UNAVAIL),
                    AcceptedReply::ProgMismatch { low, high } => {
                        enc.put_u32(PROG_MISMATCH);
                        enc.put_u32(*low);
                        enc.put_u32(*high);
                    }
                    AcceptedReply::ProcUnavail => enc.put_u32(PROC_UNAVAIL),
                    AcceptedReply::GarbageArgs => enc.put_u32(GARBAGE_ARGS),
                    AcceptedReply::SystemErr => enc.put_u32(SYSTEM_ERR),
                }
            }
            Reply::Denied(denied) => {
                enc.put_u32(MSG_DENIED);
                match denied {
                    DeniedReply::RpcMismatch { low, high } => {
                        enc.put_u32(RPC_MISMATCH);
                        enc.put_u32(*low);
                        enc.put_u32(*high);
                    }
                    DeniedReply::AuthError { stat } => {
                        enc.put_u32(AUTH_ERROR);
                        enc.put_u32(*stat);
                    }
                }
            }
        }

        enc.into_bytes()
    }
}
