use std::fmt;

/// Errors that can surface while decoding a PNG datastream.
///
/// Every variant maps to one of the four kinds in the decoder's error
/// taxonomy: a bad signature, malformed or inconsistent data, a valid but
/// unimplemented combination, or an allocation that was rejected up front.
#[derive(Debug)]
pub enum PngError {
    /// The input did not start with the PNG signature.
    NotAnImageOfThisFormat,
    /// CRC failure, malformed chunk, illegal field, bad filter byte, IDAT
    /// length mismatch, zlib failure, or an ordering/cardinality violation.
    InvalidData(String),
    /// The input is a valid PNG but uses a combination this crate does not
    /// implement (e.g. a pixel destination variant with no unpacker).
    Unsupported(String),
    /// An allocation was rejected before being attempted, because the
    /// requested size was known in advance to be too large.
    OutOfMemory,
}

impl fmt::Display for PngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PngError::NotAnImageOfThisFormat => write!(f, "not a PNG image"),
            PngError::InvalidData(reason) => write!(f, "invalid PNG data: {reason}"),
            PngError::Unsupported(reason) => write!(f, "unsupported PNG feature: {reason}"),
            PngError::OutOfMemory => write!(f, "allocation rejected: image too large"),
        }
    }
}

impl std::error::Error for PngError {}

impl From<std::io::Error> for PngError {
    fn from(err: std::io::Error) -> Self {
        PngError::InvalidData(format!("io error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PngError>;

pub(crate) fn invalid<S: Into<String>>(reason: S) -> PngError {
    PngError::InvalidData(reason.into())
}

pub(crate) fn unsupported<S: Into<String>>(reason: S) -> PngError {
    PngError::Unsupported(reason.into())
}
