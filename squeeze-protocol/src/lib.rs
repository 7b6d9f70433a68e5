//! squeeze-protocol: request/response framing for the compression service
//!
//! One TCP connection carries exactly one request followed by one response.
//! Every frame is a fixed little-endian header followed by raw variable
//! sections whose lengths the header declares:
//!
//! ```text
//! request:  type u8 | algorithm u8 | dataSize u32 | fileNameLength u32
//!           filename | payload
//! response: status u8 | dataSize u32 | fileNameLength u32 | messageLength u32
//!           filename | message | payload
//! ```
//!
//! There is no magic number, version byte or checksum.
//!
//! [`transport`] reads and writes frames over blocking `std::io` streams,
//! [`codec`] does the same for `tokio_util::codec::Framed`.

pub mod codec;
pub mod error;
pub mod messages;
pub mod transport;
pub mod types;

pub use codec::{ClientCodec, ServerCodec};
pub use error::{ProtocolError, ReadStage, RequestReadError, Result};
pub use messages::{
    RequestHeader, RequestMessage, ResponseHeader, ResponseMessage, REQUEST_HEADER_LEN,
    RESPONSE_HEADER_LEN,
};
pub use squeeze_codec::AlgorithmType;
pub use types::{MessageType, OperationStatus};
