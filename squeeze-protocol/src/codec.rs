//! Frame codecs for `tokio_util::codec::Framed`

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::messages::{
    RequestHeader, RequestMessage, ResponseHeader, ResponseMessage, REQUEST_HEADER_LEN,
    RESPONSE_HEADER_LEN,
};
use crate::transport::RECV_CHUNK;

/// Grow the buffer toward `total` by at most one receive chunk
///
/// The header lengths come from the peer, so the full body is never
/// allocated up front.
fn reserve_step(src: &mut BytesMut, total: usize) {
    let missing = total - src.len();
    src.reserve(missing.min(RECV_CHUNK));
}

/// Encodes requests and decodes responses
/// Used by the client side
#[derive(Debug, Default)]
pub struct ClientCodec;

impl ClientCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ClientCodec {
    type Item = ResponseMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < RESPONSE_HEADER_LEN {
            return Ok(None);
        }

        let mut raw = [0u8; RESPONSE_HEADER_LEN];
        raw.copy_from_slice(&src[..RESPONSE_HEADER_LEN]);
        let header = ResponseHeader::from_bytes(&raw);

        let total = RESPONSE_HEADER_LEN + header.body_len();
        if src.len() < total {
            reserve_step(src, total);
            return Ok(None);
        }

        src.advance(RESPONSE_HEADER_LEN);
        let body = src.split_to(header.body_len());
        ResponseMessage::from_parts(&header, &body).map(Some)
    }
}

impl Encoder<RequestMessage> for ClientCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: RequestMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst)
    }
}

/// Decodes requests and encodes responses
/// Used by the server side
#[derive(Debug, Default)]
pub struct ServerCodec;

impl ServerCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ServerCodec {
    type Item = RequestMessage;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < REQUEST_HEADER_LEN {
            return Ok(None);
        }

        let mut raw = [0u8; REQUEST_HEADER_LEN];
        raw.copy_from_slice(&src[..REQUEST_HEADER_LEN]);
        let header = RequestHeader::from_bytes(&raw);

        let total = REQUEST_HEADER_LEN + header.body_len();
        if src.len() < total {
            reserve_step(src, total);
            return Ok(None);
        }

        src.advance(REQUEST_HEADER_LEN);
        let body = src.split_to(header.body_len());
        Ok(Some(RequestMessage::from_parts(&header, &body)))
    }
}

impl Encoder<ResponseMessage> for ServerCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: ResponseMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationStatus;
    use squeeze_codec::AlgorithmType;

    #[test]
    fn test_request_roundtrip() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();

        let request = RequestMessage::compress(AlgorithmType::Huffman, "a.txt", vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        client.encode(request.clone(), &mut buf).unwrap();

        let decoded = server.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, request);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_response_roundtrip() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();

        let response = ResponseMessage::failure("Odd-length run-length stream: 3 bytes");
        let mut buf = BytesMut::new();
        server.encode(response.clone(), &mut buf).unwrap();

        let decoded = client.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.status, OperationStatus::Failure);
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_partial_header() {
        let mut server = ServerCodec::new();
        let mut buf = BytesMut::from(&[1u8, 1, 0][..]);
        assert!(server.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_partial_body() {
        let mut client = ClientCodec::new();
        let mut server = ServerCodec::new();

        let mut buf = BytesMut::new();
        client
            .encode(
                RequestMessage::decompress(AlgorithmType::Rle, "f.rle", vec![3, b'a']),
                &mut buf,
            )
            .unwrap();

        let rest = buf.split_off(REQUEST_HEADER_LEN + 2);
        assert!(server.decode(&mut buf).unwrap().is_none());

        buf.unsplit(rest);
        let decoded = server.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.payload(), &[3, b'a']);
    }

    #[test]
    fn test_unknown_status_is_error() {
        let mut client = ClientCodec::new();
        let mut buf = BytesMut::from(&[5u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0][..]);
        assert!(matches!(
            client.decode(&mut buf),
            Err(ProtocolError::UnknownStatus(5))
        ));
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let mut server = ServerCodec::new();
        let mut buf = BytesMut::new();
        server
            .encode(ResponseMessage::success("a", "one", vec![1]), &mut buf)
            .unwrap();
        server
            .encode(ResponseMessage::failure("two"), &mut buf)
            .unwrap();

        let mut client = ClientCodec::new();
        assert_eq!(client.decode(&mut buf).unwrap().unwrap().message, "one");
        assert_eq!(client.decode(&mut buf).unwrap().unwrap().message, "two");
        assert!(client.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_huge_declared_response_is_not_preallocated() {
        let mut client = ClientCodec::new();
        let mut raw = vec![1u8];
        raw.extend_from_slice(&[0xff; 12]);
        let mut buf = BytesMut::from(&raw[..]);

        assert!(client.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), RESPONSE_HEADER_LEN);
        assert!(buf.capacity() <= RESPONSE_HEADER_LEN + 2 * RECV_CHUNK);
    }

    #[test]
    fn test_huge_declared_request_is_not_preallocated() {
        let mut server = ServerCodec::new();
        let mut raw = vec![1u8, 1];
        raw.extend_from_slice(&[0xff; 8]);
        let mut buf = BytesMut::from(&raw[..]);

        assert!(server.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), REQUEST_HEADER_LEN);
        assert!(buf.capacity() <= REQUEST_HEADER_LEN + 2 * RECV_CHUNK);
    }

    #[tokio::test]
    async fn test_framed_exchange() {
        use futures::{SinkExt, StreamExt};
        use tokio_util::codec::Framed;

        let (client_io, server_io) = tokio::io::duplex(64);
        let mut client = Framed::new(client_io, ClientCodec::new());
        let mut server = Framed::new(server_io, ServerCodec::new());

        let payload: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        let send = tokio::spawn(async move {
            client
                .send(RequestMessage::compress(
                    AlgorithmType::Rle,
                    "blob",
                    payload.clone(),
                ))
                .await
                .unwrap();
            let reply = client.next().await.unwrap().unwrap();
            (reply, payload)
        });

        let request = server.next().await.unwrap().unwrap();
        server
            .send(ResponseMessage::success(
                request.filename(),
                "done",
                request.payload().to_vec(),
            ))
            .await
            .unwrap();

        let (reply, payload) = send.await.unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.filename, "blob");
        assert_eq!(reply.payload, payload);
    }
}
