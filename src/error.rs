use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes, {available} available")]
    ShortBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("malformed compressed stream: {0}")]
    MalformedCompressedStream(String),

    #[error("LZMA-compressed containers (ZWS) are not supported")]
    UnsupportedCompression,

    #[error("signature mismatch: expected {expected}, found {found}")]
    SignatureMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("implausible {what} count {count} (max {max})")]
    ImplausibleCount {
        what: &'static str,
        count: usize,
        max: usize,
    },

    #[error("at least 2 samples are required, got {0}")]
    NotEnoughSamples(usize),
}

pub type Result<T> = std::result::Result<T, InspectError>;
