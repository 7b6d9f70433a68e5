//! Request and response frames

use bytes::{BufMut, BytesMut};

use squeeze_codec::AlgorithmType;

use crate::error::{ProtocolError, Result};
use crate::types::{MessageType, OperationStatus};

/// Bytes in an encoded request header
pub const REQUEST_HEADER_LEN: usize = 10;

/// Bytes in an encoded response header
pub const RESPONSE_HEADER_LEN: usize = 13;

const MAX_SECTION: usize = u32::MAX as usize;

fn section_len(section: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| ProtocolError::SectionTooLarge {
        section,
        size: len,
        max: MAX_SECTION,
    })
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Fixed request header; selectors stay raw until dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub message_type: u8,
    pub algorithm: u8,
    pub data_size: u32,
    pub file_name_length: u32,
}

impl RequestHeader {
    pub fn to_bytes(&self) -> [u8; REQUEST_HEADER_LEN] {
        let mut out = [0u8; REQUEST_HEADER_LEN];
        out[0] = self.message_type;
        out[1] = self.algorithm;
        out[2..6].copy_from_slice(&self.data_size.to_le_bytes());
        out[6..10].copy_from_slice(&self.file_name_length.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; REQUEST_HEADER_LEN]) -> Self {
        Self {
            message_type: bytes[0],
            algorithm: bytes[1],
            data_size: le_u32(&bytes[2..6]),
            file_name_length: le_u32(&bytes[6..10]),
        }
    }

    /// Bytes following the header
    pub fn body_len(&self) -> usize {
        self.file_name_length as usize + self.data_size as usize
    }
}

/// Fixed response header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: u8,
    pub data_size: u32,
    pub file_name_length: u32,
    pub message_length: u32,
}

impl ResponseHeader {
    pub fn to_bytes(&self) -> [u8; RESPONSE_HEADER_LEN] {
        let mut out = [0u8; RESPONSE_HEADER_LEN];
        out[0] = self.status;
        out[1..5].copy_from_slice(&self.data_size.to_le_bytes());
        out[5..9].copy_from_slice(&self.file_name_length.to_le_bytes());
        out[9..13].copy_from_slice(&self.message_length.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; RESPONSE_HEADER_LEN]) -> Self {
        Self {
            status: bytes[0],
            data_size: le_u32(&bytes[1..5]),
            file_name_length: le_u32(&bytes[5..9]),
            message_length: le_u32(&bytes[9..13]),
        }
    }

    pub fn body_len(&self) -> usize {
        self.file_name_length as usize + self.message_length as usize + self.data_size as usize
    }
}

/// A client request: one file plus what to do with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMessage {
    message_type: u8,
    algorithm: u8,
    filename: String,
    payload: Vec<u8>,
}

impl RequestMessage {
    pub fn new(
        message_type: MessageType,
        algorithm: AlgorithmType,
        filename: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self::from_raw(message_type.into(), algorithm.into(), filename, payload)
    }

    pub fn compress(algorithm: AlgorithmType, filename: impl Into<String>, payload: Vec<u8>) -> Self {
        Self::new(MessageType::CompressRequest, algorithm, filename, payload)
    }

    pub fn decompress(
        algorithm: AlgorithmType,
        filename: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self::new(MessageType::DecompressRequest, algorithm, filename, payload)
    }

    /// Build a request from unchecked selector bytes
    pub fn from_raw(
        message_type: u8,
        algorithm: u8,
        filename: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            message_type,
            algorithm,
            filename: filename.into(),
            payload,
        }
    }

    pub fn message_type(&self) -> Result<MessageType> {
        MessageType::try_from(self.message_type)
    }

    pub fn algorithm(&self) -> Result<AlgorithmType> {
        AlgorithmType::try_from(self.algorithm)
            .map_err(|_| ProtocolError::UnsupportedAlgorithm(self.algorithm))
    }

    pub fn raw_message_type(&self) -> u8 {
        self.message_type
    }

    pub fn raw_algorithm(&self) -> u8 {
        self.algorithm
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn header(&self) -> Result<RequestHeader> {
        Ok(RequestHeader {
            message_type: self.message_type,
            algorithm: self.algorithm,
            data_size: section_len("payload", self.payload.len())?,
            file_name_length: section_len("filename", self.filename.len())?,
        })
    }

    /// Append the complete frame to `dst`
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let header = self.header()?;
        dst.reserve(REQUEST_HEADER_LEN + header.body_len());
        dst.put_slice(&header.to_bytes());
        dst.put_slice(self.filename.as_bytes());
        dst.put_slice(&self.payload);
        Ok(())
    }

    /// Rebuild a request from a header and exactly `header.body_len()` bytes
    pub(crate) fn from_parts(header: &RequestHeader, body: &[u8]) -> Self {
        let (name, payload) = body.split_at(header.file_name_length as usize);
        Self::from_raw(
            header.message_type,
            header.algorithm,
            String::from_utf8_lossy(name),
            payload.to_vec(),
        )
    }
}

/// The server's answer to one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    pub status: OperationStatus,
    pub filename: String,
    pub message: String,
    pub payload: Vec<u8>,
}

impl ResponseMessage {
    pub fn success(
        filename: impl Into<String>,
        message: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            status: OperationStatus::Success,
            filename: filename.into(),
            message: message.into(),
            payload,
        }
    }

    /// FAILURE with a diagnostic and no filename or payload
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Failure,
            filename: String::new(),
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header(&self) -> Result<ResponseHeader> {
        Ok(ResponseHeader {
            status: self.status.into(),
            data_size: section_len("payload", self.payload.len())?,
            file_name_length: section_len("filename", self.filename.len())?,
            message_length: section_len("message", self.message.len())?,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let header = self.header()?;
        dst.reserve(RESPONSE_HEADER_LEN + header.body_len());
        dst.put_slice(&header.to_bytes());
        dst.put_slice(self.filename.as_bytes());
        dst.put_slice(self.message.as_bytes());
        dst.put_slice(&self.payload);
        Ok(())
    }

    /// Rebuild a response from a header and exactly `header.body_len()` bytes
    pub(crate) fn from_parts(header: &ResponseHeader, body: &[u8]) -> Result<Self> {
        let status = OperationStatus::try_from(header.status)?;
        let (name, rest) = body.split_at(header.file_name_length as usize);
        let (message, payload) = rest.split_at(header.message_length as usize);
        Ok(Self {
            status,
            filename: String::from_utf8_lossy(name).into_owned(),
            message: String::from_utf8_lossy(message).into_owned(),
            payload: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_header_layout_is_little_endian() {
        let header = RequestHeader {
            message_type: 1,
            algorithm: 2,
            data_size: 0x0403_0201,
            file_name_length: 5,
        };
        assert_eq!(header.to_bytes(), [1, 2, 0x01, 0x02, 0x03, 0x04, 5, 0, 0, 0]);
        assert_eq!(RequestHeader::from_bytes(&header.to_bytes()), header);
    }

    #[test]
    fn test_response_header_layout_is_little_endian() {
        let header = ResponseHeader {
            status: 1,
            data_size: 0,
            file_name_length: 0x0102,
            message_length: 7,
        };
        assert_eq!(
            header.to_bytes(),
            [1, 0, 0, 0, 0, 0x02, 0x01, 0, 0, 7, 0, 0, 0]
        );
        assert_eq!(ResponseHeader::from_bytes(&header.to_bytes()), header);
        assert_eq!(header.body_len(), 0x0102 + 7);
    }

    #[test]
    fn test_request_encode_exact_bytes() {
        let request = RequestMessage::compress(AlgorithmType::Huffman, "a.txt", vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        request.encode(&mut buf).unwrap();

        let mut expected = vec![1, 1, 3, 0, 0, 0, 5, 0, 0, 0];
        expected.extend_from_slice(b"a.txt");
        expected.extend_from_slice(&[1, 2, 3]);
        assert_eq!(&buf[..], &expected[..]);
    }

    #[test]
    fn test_response_encode_exact_bytes() {
        let response = ResponseMessage::success("x", "ok", vec![9]);
        let mut buf = BytesMut::new();
        response.encode(&mut buf).unwrap();

        let expected = [0, 1, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, b'x', b'o', b'k', 9];
        assert_eq!(&buf[..], &expected[..]);
    }

    #[test]
    fn test_empty_sections_contribute_no_bytes() {
        let mut buf = BytesMut::new();
        RequestMessage::decompress(AlgorithmType::Rle, "", Vec::new())
            .encode(&mut buf)
            .unwrap();
        assert_eq!(buf.len(), REQUEST_HEADER_LEN);
    }

    #[test]
    fn test_raw_selectors_are_preserved() {
        let request = RequestMessage::from_raw(7, 42, "f", vec![]);
        assert_eq!(request.raw_message_type(), 7);
        assert_eq!(request.raw_algorithm(), 42);
        assert!(matches!(
            request.message_type(),
            Err(ProtocolError::UnknownMessageType(7))
        ));
        assert!(matches!(
            request.algorithm(),
            Err(ProtocolError::UnsupportedAlgorithm(42))
        ));
    }

    #[test]
    fn test_from_parts_splits_sections() {
        let header = ResponseHeader {
            status: 0,
            data_size: 2,
            file_name_length: 3,
            message_length: 4,
        };
        let response = ResponseMessage::from_parts(&header, b"abcdefg\x01\x02").unwrap();
        assert_eq!(response.filename, "abc");
        assert_eq!(response.message, "defg");
        assert_eq!(response.payload, vec![1, 2]);
    }

    #[test]
    fn test_invalid_utf8_filename_is_replaced() {
        let header = RequestHeader {
            message_type: 1,
            algorithm: 1,
            data_size: 0,
            file_name_length: 2,
        };
        let request = RequestMessage::from_parts(&header, &[b'a', 0xFF]);
        assert_eq!(request.filename(), "a\u{FFFD}");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let header = ResponseHeader {
            status: 9,
            data_size: 0,
            file_name_length: 0,
            message_length: 0,
        };
        assert!(matches!(
            ResponseMessage::from_parts(&header, &[]),
            Err(ProtocolError::UnknownStatus(9))
        ));
    }

    #[test]
    fn test_failure_has_empty_filename_and_payload() {
        let response = ResponseMessage::failure("boom");
        assert_eq!(response.status, OperationStatus::Failure);
        assert!(response.filename.is_empty());
        assert!(response.payload.is_empty());
        assert!(!response.is_success());
    }
}
