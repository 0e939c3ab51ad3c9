use std::fmt;

/// Codec failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The buffer ended before the value did.
    Truncated { needed: usize, remaining: usize },
    /// A length field implies more bytes than are available or allowed.
    OversizeLength { length: u32, limit: usize },
    /// A union tag was used in a position the schema does not allow, or a
    /// required pointee was absent.
    SchemaMismatch(&'static str),
    /// A discriminator held a value outside its domain.
    InvalidDiscriminator(u32),
    /// The value kind has no XDR representation.
    UnsupportedType(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated { needed, remaining } => {
                write!(f, "xdr: truncated input: need {needed} bytes, {remaining} remain")
            }
            Error::OversizeLength { length, limit } => {
                write!(f, "xdr: length field {length} exceeds limit {limit}")
            }
            Error::SchemaMismatch(what) => write!(f, "xdr: schema mismatch: {what}"),
            Error::InvalidDiscriminator(value) => {
                write!(f, "xdr: invalid discriminator value {value}")
            }
            Error::UnsupportedType(what) => write!(f, "xdr: unsupported type: {what}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
