use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Cursor over an XDR-encoded buffer.
///
/// Reads consume from the front and keep a byte count so callers can tell
/// where a value ends inside a larger message.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take_u32(&mut self) -> Result<u32> {
        let bytes = self.take_bytes(4)?;
        Ok(BigEndian::read_u32(bytes))
    }

    pub fn take_u64(&mut self) -> Result<u64> {
        let bytes = self.take_bytes(8)?;
        Ok(BigEndian::read_u64(bytes))
    }

    /// Exactly `n` raw bytes, no padding handling.
    pub fn take_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Fixed-length opaque data: `n` bytes plus their alignment padding.
    pub fn take_fixed_opaque(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = self.take_bytes(n)?;
        self.skip_padding(n)?;
        Ok(bytes)
    }

    /// Variable-length opaque data with no declared bound beyond the
    /// buffer itself.
    pub fn take_opaque(&mut self) -> Result<&'a [u8]> {
        self.take_opaque_bounded(u32::MAX as usize)
    }

    /// Variable-length opaque data whose length must not exceed `limit`.
    pub fn take_opaque_bounded(&mut self, limit: usize) -> Result<&'a [u8]> {
        let length = self.take_u32()?;
        if length as usize > limit || length as usize > self.remaining() {
            return Err(Error::OversizeLength {
                length,
                limit: limit.min(self.remaining()),
            });
        }
        self.take_fixed_opaque(length as usize)
    }

    /// Everything after the current position; consumes it.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    fn skip_padding(&mut self, len: usize) -> Result<()> {
        let pad = (4 - len % 4) % 4;
        self.take_bytes(pad)?;
        Ok(())
    }
}

/// A value readable from its XDR wire representation.
///
/// Union arms that the discriminator does not select are left at their
/// [`Default`] value, so every decodable field type must also be
/// `Default`.
pub trait Decode: Sized {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self>;
}

impl Decode for u32 {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        dec.take_u32()
    }
}

impl Decode for u64 {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        dec.take_u64()
    }
}

impl Decode for bool {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        match dec.take_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidDiscriminator(other)),
        }
    }
}

impl<const N: usize> Decode for [u8; N] {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let bytes = dec.take_fixed_opaque(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}

impl Decode for Vec<u8> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(dec.take_opaque()?.to_vec())
    }
}

impl Decode for Vec<u32> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let length = dec.take_u32()?;
        if (length as usize).saturating_mul(4) > dec.remaining() {
            return Err(Error::OversizeLength {
                length,
                limit: dec.remaining() / 4,
            });
        }
        let mut out = Vec::with_capacity(length as usize);
        for _ in 0..length {
            out.push(dec.take_u32()?);
        }
        Ok(out)
    }
}

impl Decode for String {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let bytes = dec.take_opaque()?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

impl Decode for () {
    fn decode(_dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(())
    }
}

/// Pointer position: the pointee is decoded in place. The decoder only
/// reaches a pointer field when the enclosing union selected it, so the
/// result is always `Some`; unselected pointers default to `None`.
impl<T: Decode> Decode for Option<Box<T>> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        Ok(Some(Box::new(T::decode(dec)?)))
    }
}
