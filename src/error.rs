//! Error types for buffer, codec, and search operations.
//!
//! All errors in this crate are programming-contract violations surfaced
//! to the caller: nothing here is retried internally, and a failing
//! operation validates its arguments before mutating any chain state, so
//! an `Err` always leaves the buffer exactly as it was.

use thiserror::Error;

/// Error type for buffer and codec operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A sequential read reached the end of the chain before the
    /// requested width was satisfied.
    #[error("buffer underflow: need {needed} more bytes, have {available}")]
    Underflow {
        /// Bytes still required to complete the read.
        needed: usize,
        /// Bytes that were actually available.
        available: usize,
    },

    /// An indexed access resolved outside `[0, size())`.
    #[error("index out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The offending index.
        index: usize,
        /// The buffer size at the time of the access.
        size: usize,
    },

    /// An invalid width/offset/length combination, caught before any
    /// mutation occurs.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Structural misuse, e.g. prepending after the cursor has advanced.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Result alias for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BufferError::Underflow {
            needed: 4,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "buffer underflow: need 4 more bytes, have 1"
        );

        let err = BufferError::OutOfBounds { index: 9, size: 5 };
        assert_eq!(err.to_string(), "index out of bounds: index 9, size 5");
    }

    #[test]
    fn test_error_is_copy_and_eq() {
        let a = BufferError::InvalidArgument("split past end");
        let b = a;
        assert_eq!(a, b);
    }
}
