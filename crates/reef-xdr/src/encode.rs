use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// Accumulates the big-endian, 4-byte-aligned output of an encode pass.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, value: u32) {
        let mut word = [0u8; 4];
        BigEndian::write_u32(&mut word, value);
        self.buf.extend_from_slice(&word);
    }

    pub fn put_u64(&mut self, value: u64) {
        let mut word = [0u8; 8];
        BigEndian::write_u64(&mut word, value);
        self.buf.extend_from_slice(&word);
    }

    /// Fixed-length opaque data: the bytes themselves, padded to a
    /// multiple of 4. No length prefix.
    pub fn put_fixed_opaque(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.put_padding(bytes.len());
    }

    /// Variable-length opaque data: u32 length, the bytes, padding.
    pub fn put_opaque(&mut self, bytes: &[u8]) {
        self.put_u32(bytes.len() as u32);
        self.put_fixed_opaque(bytes);
    }

    /// Zero bytes bringing a field of `len` bytes up to 4-byte alignment.
    pub fn put_padding(&mut self, len: usize) {
        let pad = (4 - len % 4) % 4;
        self.buf.extend_from_slice(&[0u8; 3][..pad]);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// A value with an XDR wire representation.
///
/// Object-safe so procedure handlers can return `Box<dyn Encode>`.
pub trait Encode {
    fn encode(&self, enc: &mut Encoder) -> Result<()>;
}

impl Encode for u32 {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_u32(*self);
        Ok(())
    }
}

impl Encode for u64 {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_u64(*self);
        Ok(())
    }
}

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_u32(u32::from(*self));
        Ok(())
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_fixed_opaque(self);
        Ok(())
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_opaque(self);
        Ok(())
    }
}

impl Encode for [u8] {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_opaque(self);
        Ok(())
    }
}

impl Encode for Vec<u32> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_u32(self.len() as u32);
        for value in self {
            enc.put_u32(*value);
        }
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_opaque(self.as_bytes());
        Ok(())
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        enc.put_opaque(self.as_bytes());
        Ok(())
    }
}

impl Encode for () {
    fn encode(&self, _enc: &mut Encoder) -> Result<()> {
        Ok(())
    }
}

/// Pointer position: the pointee is encoded in place. A pointer that is
/// reached by the encoder must not be null; optional presence is expressed
/// through the enclosing union discriminator, not through the pointer.
impl<T: Encode> Encode for Option<Box<T>> {
    fn encode(&self, enc: &mut Encoder) -> Result<()> {
        match self {
            Some(inner) => inner.encode(enc),
            None => Err(Error::SchemaMismatch("null pointer in encoded position")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_bytes;

    #[test]
    fn u32_is_big_endian() {
        assert_eq!(to_bytes(&0x12345678u32).unwrap(), [0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn u64_is_big_endian() {
        assert_eq!(
            to_bytes(&0x0102030405060708u64).unwrap(),
            [1, 2, 3, 4, 5, 6, 7, 8],
        );
    }

    #[test]
    fn string_padding_vector() {
        let bytes = to_bytes("Gopher").unwrap();
        assert_eq!(
            bytes,
            [
                0x00, 0x00, 0x00, 0x06, // length
                0x47, 0x6F, 0x70, 0x68, 0x65, 0x72, // "Gopher"
                0x00, 0x00, // pad
            ],
        );
    }

    #[test]
    fn opaque_multiple_of_four_gets_no_pad() {
        assert_eq!(to_bytes(&vec![1u8, 2, 3, 4]).unwrap().len(), 8);
        assert_eq!(to_bytes(&Vec::<u8>::new()).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn u32_vector_has_length_prefix_and_no_pad() {
        assert_eq!(
            to_bytes(&vec![1u32, 2]).unwrap(),
            [0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2],
        );
    }

    #[test]
    fn fixed_opaque_pads_to_alignment() {
        assert_eq!(to_bytes(&[0xAAu8; 6]).unwrap().len(), 8);
        assert_eq!(to_bytes(&[0xAAu8; 8]).unwrap().len(), 8);
    }

    #[test]
    fn null_pointer_in_encoded_position_is_an_error() {
        let absent: Option<Box<u32>> = None;
        assert_eq!(
            to_bytes(&absent).unwrap_err(),
            Error::SchemaMismatch("null pointer in encoded position"),
        );
    }
}
