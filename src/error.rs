//! Errors surfaced by rope operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RopeError>;

/// Recoverable failures. Malformed bytes are not among them: a rope whose
/// code range is `Broken` is a perfectly good rope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RopeError {
    /// The two encodings cannot be reconciled for concatenation.
    #[error("incompatible character encodings: {left} and {right}")]
    IncompatibleEncoding {
        left: &'static str,
        right: &'static str,
    },

    /// A byte range reaches past the end of the rope.
    #[error("byte range {offset}+{len} out of range for rope of {byte_len} bytes")]
    OutOfRange {
        offset: usize,
        len: usize,
        byte_len: usize,
    },

    /// The length of a concat or repeat does not fit in `usize`.
    #[error("resulting string length exceeds the system maximum")]
    TooLong,

    /// No valid character starts at this byte offset.
    #[error("invalid byte sequence in {encoding} at byte {index}")]
    InvalidByteSequence { index: usize, encoding: &'static str },
}
