//! Selector enums carried in frame headers

use std::fmt;

use crate::error::ProtocolError;

/// Request kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    CompressRequest = 1,
    DecompressRequest = 2,
}

impl TryFrom<u8> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::CompressRequest),
            2 => Ok(MessageType::DecompressRequest),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value as u8
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageType::CompressRequest => "COMPRESS_REQUEST",
            MessageType::DecompressRequest => "DECOMPRESS_REQUEST",
        })
    }
}

/// Outcome reported in a response header
///
/// `InProgress` is reserved; the server only ever sends `Success` or `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationStatus {
    Success = 0,
    Failure = 1,
    InProgress = 2,
}

impl OperationStatus {
    pub fn is_success(self) -> bool {
        self == OperationStatus::Success
    }
}

impl TryFrom<u8> for OperationStatus {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OperationStatus::Success),
            1 => Ok(OperationStatus::Failure),
            2 => Ok(OperationStatus::InProgress),
            other => Err(ProtocolError::UnknownStatus(other)),
        }
    }
}

impl From<OperationStatus> for u8 {
    fn from(value: OperationStatus) -> Self {
        value as u8
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationStatus::Success => "SUCCESS",
            OperationStatus::Failure => "FAILURE",
            OperationStatus::InProgress => "IN_PROGRESS",
        })
    }
}
