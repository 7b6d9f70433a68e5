//! Protocol errors

use std::fmt;

/// Framing and transport failures
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Peer closed connection after {received} of {expected} bytes")]
    PeerClosed { received: usize, expected: usize },

    #[error("{section} too large: {size} bytes (max {max})")]
    SectionTooLarge {
        section: &'static str,
        size: usize,
        max: usize,
    },

    #[error("Unknown message type: {0}")]
    UnknownMessageType(u8),

    #[error("Unknown operation status: {0}")]
    UnknownStatus(u8),

    #[error("Unsupported algorithm selector: {0}")]
    UnsupportedAlgorithm(u8),
}

impl ProtocolError {
    /// True when the peer went away (cleanly or not) rather than sending garbage
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::PeerClosed { .. } => true,
            ProtocolError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

/// Result type alias using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// How far `read_request` got before failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStage {
    Header,
    Body,
}

impl fmt::Display for ReadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStage::Header => f.write_str("reading request header"),
            ReadStage::Body => f.write_str("reading request body"),
        }
    }
}

/// A request that could not be fully received
#[derive(Debug, thiserror::Error)]
#[error("{stage}: {source}")]
pub struct RequestReadError {
    pub stage: ReadStage,
    #[source]
    pub source: ProtocolError,
}

impl RequestReadError {
    pub fn header(source: ProtocolError) -> Self {
        Self {
            stage: ReadStage::Header,
            source,
        }
    }

    pub fn body(source: ProtocolError) -> Self {
        Self {
            stage: ReadStage::Body,
            source,
        }
    }

    /// Whether the fixed header arrived before the failure
    pub fn header_received(&self) -> bool {
        self.stage == ReadStage::Body
    }
}
