use std::fmt;

use reef_xdr::{Decoder, Encoder};

use crate::{AUTH_NULL, CALL, MAX_AUTH_BYTES};

/// Credential or verifier: a flavor plus an opaque body the server
/// carries but does not interpret (RFC 1057 `struct opaque_auth`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpaqueAuth {
    pub flavor: u32,
    pub body: Vec<u8>,
}

impl OpaqueAuth {
    /// AUTH_NULL with an empty body.
    pub fn null() -> Self {
        Self {
            flavor: AUTH_NULL,
            body: Vec::new(),
        }
    }
}

/// A parsed CALL envelope (RFC 1057 `struct call_body` plus the xid).
///
/// Procedure arguments are not part of the envelope; [`Call::parse`]
/// reports where they begin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub xid: u32,
    /// Carried as-is so the dispatcher can deny non-v2 calls itself.
    pub rpc_version: u32,
    pub program: u32,
    pub version: u32,
    pub procedure: u32,
    pub credentials: OpaqueAuth,
    pub verifier: OpaqueAuth,
}

/// Why a request could not be parsed into a [`Call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The envelope ended early; there is not enough to reply to.
    Truncated,
    /// The message parses but is not a CALL.
    NotACall { xid: u32 },
    /// A credential or verifier body exceeds 400 bytes. The xid is
    /// recoverable, so the caller can still send a fault reply.
    OversizeAuth { xid: u32 },
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Truncated => write!(f, "truncated call envelope"),
            CallError::NotACall { xid } => write!(f, "message {xid:#010x} is not a call"),
            CallError::OversizeAuth { xid } => {
                write!(f, "call {xid:#010x} carries an oversize auth body")
            }
        }
    }
}

impl std::error::Error for CallError {}

impl Call {
    /// Parse the CALL envelope from the front of a request message.
    ///
    /// Returns the call and the offset at which procedure arguments
    /// start; on TCP, bytes past the arguments belong to the next
    /// request.
    pub fn parse(message: &[u8]) -> Result<(Call, usize), CallError> {
        let mut dec = Decoder::new(message);

        let xid = dec.take_u32().map_err(|_| CallError::Truncated)?;
        let message_type = dec.take_u32().map_err(|_| CallError::Truncated)?;
        if message_type != CALL {
            return Err(CallError::NotACall { xid });
        }

        let rpc_version = dec.take_u32().map_err(|_| CallError::Truncated)?;
        let program = dec.take_u32().map_err(|_| CallError::Truncated)?;
        let version = dec.take_u32().map_err(|_| CallError::Truncated)?;
        let procedure = dec.take_u32().map_err(|_| CallError::Truncated)?;

        let credentials = parse_auth(&mut dec, xid)?;
        let verifier = parse_auth(&mut dec, xid)?;

        let call = Call {
            xid,
            rpc_version,
            program,
            version,
            procedure,
            credentials,
            verifier,
        };
        Ok((call, dec.consumed()))
    }

    /// Serialize the envelope; procedure arguments are appended by the
    /// caller.
    pub fn serialize(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.put_u32(self.xid);
        enc.put_u32(CALL);
        enc.put_u32(self.rpc_version);
        enc.put_u32(self.program);
        enc.put_u32(self.version);
        enc.put_u32(self.procedure);
        enc.put_u32(self.credentials.flavor);
        enc.put_opaque(&self.credentials.body);
        enc.put_u32(self.verifier.flavor);
        enc.put_opaque(&self.verifier.body);
        enc.into_bytes()
    }
}

fn parse_auth(dec: &mut Decoder<'_>, xid: u32) -> Result<OpaqueAuth, CallError> {
    let flavor = dec.take_u32().map_err(|_| CallError::Truncated)?;
    let length = dec.take_u32().map_err(|_| CallError::Truncated)?;
    if length as usize > MAX_AUTH_BYTES {
        return Err(CallError::OversizeAuth { xid });
    }
    let body = dec
        .take_fixed_opaque(length as usize)
        .map_err(|_| CallError::Truncated)?;
    Ok(OpaqueAuth {
        flavor,
        body: body.to_vec(),
    })
}
