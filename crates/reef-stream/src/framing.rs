//! Record marking for RPC over TCP (RFC 1057 §10).
//!
//! A message travels as one or more fragments. Each fragment starts with
//! a 4-byte big-endian header: bit 31 flags the last fragment, bits 30..0
//! hold the payload length. The reader concatenates fragment payloads
//! until the last-fragment bit is set; the writer always produces a
//! single-fragment message.

use std::fmt;
use std::io;

use byteorder::{BigEndian, ByteOrder};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const LAST_FRAGMENT: u32 = 1 << 31;

/// Policy cap on a single fragment; anything larger is hostile or broken.
pub const MAX_FRAGMENT_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Debug)]
pub enum FrameError {
    /// The peer closed the connection inside a fragment header or payload.
    Truncated,
    /// A fragment header announced more than [`MAX_FRAGMENT_BYTES`].
    OversizedFragment { length: u32 },
    Io(io::Error),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Truncated => write!(f, "connection closed mid-fragment"),
            FrameError::OversizedFragment { length } => {
                write!(f, "fragment of {length} bytes exceeds {MAX_FRAGMENT_BYTES}")
            }
            FrameError::Io(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<io::Error> for FrameError {
    fn from(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            FrameError::Truncated
        } else {
            FrameError::Io(error)
        }
    }
}

/// Read one complete request message.
///
/// Returns `Ok(None)` when the connection closes cleanly at a message
/// boundary (nothing buffered, zero bytes of the next header read).
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut message = Vec::new();
    loop {
        let mut header = [0u8; 4];
        let first = reader.read(&mut header).await.map_err(FrameError::Io)?;
        if first == 0 {
            if message.is_empty() {
                return Ok(None);
            }
            // EOF between fragments of one message.
            return Err(FrameError::Truncated);
        }
        reader.read_exact(&mut header[first..]).await?;

        let word = BigEndian::read_u32(&header);
        let last = word & LAST_FRAGMENT != 0;
        let length = word & !LAST_FRAGMENT;
        if length > MAX_FRAGMENT_BYTES {
            return Err(FrameError::OversizedFragment { length });
        }

        let start = message.len();
        message.resize(start + length as usize, 0);
        reader.read_exact(&mut message[start..]).await?;

        if last {
            return Ok(Some(message));
        }
    }
}

/// Write a reply as a single last-fragment record.
pub async fn write_message<W>(writer: &mut W, message: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut header = [0u8; 4];
    BigEndian::write_u32(&mut header, LAST_FRAGMENT | message.len() as u32);
    writer.write_all(&header).await?;
    writer.write_all(message).await?;
    writer.flush().await
}
