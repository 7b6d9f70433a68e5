//! Codec error types

/// Errors produced while compressing or decompressing a buffer
///
/// Every variant describes recoverable bad data. None of them indicate a bug
/// in the caller, so the server turns all of them into a FAILURE response.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported algorithm selector: {0}")]
    UnsupportedAlgorithm(u8),

    #[error("Unknown algorithm name: {0}")]
    UnknownAlgorithmName(String),

    #[error("Input too large: {size} bytes (max {max})")]
    InputTooLarge { size: usize, max: usize },

    #[error("Truncated {section}: need {needed} bytes, {available} available")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid tree marker {marker:#04x} at offset {offset}")]
    InvalidTreeMarker { marker: u8, offset: usize },

    #[error("Tree size mismatch: header says {declared} bytes, tree used {consumed}")]
    TreeSizeMismatch { declared: usize, consumed: usize },

    #[error("Tree nesting exceeds {max} levels")]
    TreeTooDeep { max: usize },

    #[error("Code length {length} exceeds maximum {max}")]
    CodeTooLong { length: usize, max: usize },

    #[error("Invalid padding bit count: {0}")]
    InvalidPadding(u8),

    #[error("Bitstream exhausted after {produced} of {expected} bytes")]
    BitstreamExhausted { produced: usize, expected: usize },

    #[error("Odd-length run-length stream: {0} bytes")]
    OddLength(usize),

    #[error("Unexpected end of bit stream")]
    UnexpectedEof,

    #[error("Invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Result type alias using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unsupported() {
        let err = CodecError::UnsupportedAlgorithm(7);
        assert_eq!(err.to_string(), "Unsupported algorithm selector: 7");
    }

    #[test]
    fn test_error_display_truncated() {
        let err = CodecError::Truncated {
            section: "tree size",
            needed: 4,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Truncated tree size: need 4 bytes, 2 available"
        );
    }

    #[test]
    fn test_error_display_odd_length() {
        assert_eq!(
            CodecError::OddLength(3).to_string(),
            "Odd-length run-length stream: 3 bytes"
        );
    }

    #[test]
    fn test_error_display_exhausted() {
        let err = CodecError::BitstreamExhausted {
            produced: 3,
            expected: 10,
        };
        assert!(err.to_string().contains("3 of 10"));
    }
}
