#![deny(unsafe_code)]

//! XDR (External Data Representation, RFC 1014) codec.
//!
//! Values encode to big-endian, 4-byte-aligned byte sequences. Composite
//! types implement [`Encode`]/[`Decode`], usually through the
//! [`xdr_struct!`] macro, which understands the discriminated-union field
//! tags (`switch`, `case(..)`, `default`, `skip`) used throughout the
//! MOUNT and NFS wire structures.

mod decode;
mod encode;
mod error;
mod switch;

#[macro_use]
mod macros;

pub use decode::{Decode, Decoder};
pub use encode::{Encode, Encoder};
pub use error::{Error, Result};
pub use switch::SwitchState;

/// Encode a value to its XDR byte representation.
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut enc = Encoder::new();
    value.encode(&mut enc)?;
    Ok(enc.into_bytes())
}

/// Decode a value from the front of `data`.
///
/// Returns the value together with the number of bytes consumed; trailing
/// bytes belong to the caller (on a TCP stream they are the next request).
pub fn from_bytes<T: Decode>(data: &[u8]) -> Result<(T, usize)> {
    let mut dec = Decoder::new(data);
    let value = T::decode(&mut dec)?;
    Ok((value, dec.consumed()))
}
