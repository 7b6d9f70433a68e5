//! Blocking frame I/O over `std::io` streams
//!
//! `recv_exact` and `send_all` never return short: they loop until the whole
//! buffer has moved, retry `Interrupted`, and treat a zero-byte read as the
//! peer closing the connection.

use std::io::{ErrorKind, Read, Write};

use tracing::trace;

use crate::error::{ProtocolError, RequestReadError, Result};
use crate::messages::{
    RequestHeader, RequestMessage, ResponseHeader, ResponseMessage, REQUEST_HEADER_LEN,
    RESPONSE_HEADER_LEN,
};

/// Largest step by which a body buffer grows while receiving
pub(crate) const RECV_CHUNK: usize = 64 * 1024;

/// Write every byte of `buf`
pub fn send_all<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => return Err(ProtocolError::Io(ErrorKind::WriteZero.into())),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Fill `buf` completely
pub fn recv_exact<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut received = 0;
    while received < buf.len() {
        match reader.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(ProtocolError::PeerClosed {
                    received,
                    expected: buf.len(),
                })
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Receive exactly `len` bytes into a new buffer
///
/// The buffer grows as data arrives, so a header that declares a huge
/// section does not allocate it up front.
pub fn recv_vec<R: Read + ?Sized>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(RECV_CHUNK));
    while buf.len() < len {
        let start = buf.len();
        let step = (len - start).min(RECV_CHUNK);
        buf.resize(start + step, 0);
        recv_exact(reader, &mut buf[start..]).map_err(|e| match e {
            ProtocolError::PeerClosed { received, .. } => ProtocolError::PeerClosed {
                received: start + received,
                expected: len,
            },
            other => other,
        })?;
    }
    Ok(buf)
}

pub fn write_request<W: Write + ?Sized>(writer: &mut W, request: &RequestMessage) -> Result<()> {
    let header = request.header()?;
    send_all(writer, &header.to_bytes())?;
    send_all(writer, request.filename().as_bytes())?;
    send_all(writer, request.payload())?;
    writer.flush()?;
    Ok(())
}

/// Read one request, reporting whether the header had arrived on failure
pub fn read_request<R: Read + ?Sized>(
    reader: &mut R,
) -> std::result::Result<RequestMessage, RequestReadError> {
    let mut raw = [0u8; REQUEST_HEADER_LEN];
    recv_exact(reader, &mut raw).map_err(RequestReadError::header)?;
    let header = RequestHeader::from_bytes(&raw);
    trace!(
        message_type = header.message_type,
        algorithm = header.algorithm,
        data_size = header.data_size,
        file_name_length = header.file_name_length,
        "request header received"
    );

    let body = recv_vec(reader, header.body_len()).map_err(RequestReadError::body)?;
    Ok(RequestMessage::from_parts(&header, &body))
}

pub fn write_response<W: Write + ?Sized>(writer: &mut W, response: &ResponseMessage) -> Result<()> {
    let header = response.header()?;
    send_all(writer, &header.to_bytes())?;
    send_all(writer, response.filename.as_bytes())?;
    send_all(writer, response.message.as_bytes())?;
    send_all(writer, &response.payload)?;
    writer.flush()?;
    Ok(())
}

pub fn read_response<R: Read + ?Sized>(reader: &mut R) -> Result<ResponseMessage> {
    let mut raw = [0u8; RESPONSE_HEADER_LEN];
    recv_exact(reader, &mut raw)?;
    let header = ResponseHeader::from_bytes(&raw);
    let body = recv_vec(reader, header.body_len())?;
    ResponseMessage::from_parts(&header, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationStatus;
    use squeeze_codec::AlgorithmType;
    use std::io::Cursor;

    /// Hands out at most `step` bytes per read and fails once with `Interrupted`
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
        interrupted: bool,
    }

    impl Trickle {
        fn new(data: Vec<u8>, step: usize) -> Self {
            Self {
                data,
                pos: 0,
                step,
                interrupted: false,
            }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(ErrorKind::Interrupted.into());
            }
            let n = buf.len().min(self.step).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Accepts at most `step` bytes per write
    struct ShortWriter {
        out: Vec<u8>,
        step: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.step);
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_request_roundtrip() {
        let request = RequestMessage::compress(AlgorithmType::Huffman, "a.txt", vec![1, 2, 3]);
        let mut wire: Vec<u8> = Vec::new();
        write_request(&mut wire, &request).unwrap();

        let decoded = read_request(&mut Cursor::new(wire)).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.filename(), "a.txt");
        assert_eq!(decoded.algorithm().unwrap(), AlgorithmType::Huffman);
        assert_eq!(decoded.payload(), &[1, 2, 3]);
    }

    #[test]
    fn test_failure_response_roundtrip() {
        let response = ResponseMessage::failure("Unsupported algorithm selector: 9");
        let mut wire: Vec<u8> = Vec::new();
        write_response(&mut wire, &response).unwrap();

        let decoded = read_response(&mut Cursor::new(wire)).unwrap();
        assert_eq!(decoded.status, OperationStatus::Failure);
        assert_eq!(decoded.message, "Unsupported algorithm selector: 9");
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_recv_exact_loops_over_short_reads() {
        let mut reader = Trickle::new((0..50).collect(), 7);
        let mut buf = [0u8; 50];
        recv_exact(&mut reader, &mut buf).unwrap();
        assert_eq!(buf.to_vec(), (0..50).collect::<Vec<u8>>());
    }

    #[test]
    fn test_recv_exact_peer_closed() {
        let mut reader = Cursor::new(vec![1, 2, 3]);
        let mut buf = [0u8; 5];
        let err = recv_exact(&mut reader, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PeerClosed {
                received: 3,
                expected: 5
            }
        ));
    }

    #[test]
    fn test_recv_vec_reports_total_progress() {
        let len = RECV_CHUNK + 10;
        let mut reader = Cursor::new(vec![0u8; RECV_CHUNK + 4]);
        let err = recv_vec(&mut reader, len).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PeerClosed { received, expected }
                if received == RECV_CHUNK + 4 && expected == len
        ));
    }

    #[test]
    fn test_send_all_loops_over_short_writes() {
        let mut writer = ShortWriter {
            out: Vec::new(),
            step: 3,
        };
        send_all(&mut writer, b"hello world").unwrap();
        assert_eq!(writer.out, b"hello world");
    }

    #[test]
    fn test_send_all_write_zero() {
        let err = send_all(&mut ClosedWriter, b"x").unwrap_err();
        assert!(matches!(err, ProtocolError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn test_trickled_request_decodes() {
        let request = RequestMessage::decompress(AlgorithmType::Rle, "data.bin", vec![4, 9, 2, 1]);
        let mut wire: Vec<u8> = Vec::new();
        write_request(&mut wire, &request).unwrap();

        let decoded = read_request(&mut Trickle::new(wire, 2)).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_truncated_header_is_header_stage() {
        let err = read_request(&mut Cursor::new(vec![1, 1, 3])).unwrap_err();
        assert!(!err.header_received());
        assert!(err.source.is_disconnect());
    }

    #[test]
    fn test_truncated_body_is_body_stage() {
        let request = RequestMessage::compress(AlgorithmType::Rle, "a.txt", vec![0; 100]);
        let mut wire: Vec<u8> = Vec::new();
        write_request(&mut wire, &request).unwrap();
        wire.truncate(wire.len() - 10);

        let err = read_request(&mut Cursor::new(wire)).unwrap_err();
        assert!(err.header_received());
        assert!(matches!(
            err.source,
            ProtocolError::PeerClosed {
                received: 95,
                expected: 105
            }
        ));
    }

    #[test]
    fn test_unknown_selectors_survive_decoding() {
        let mut wire = RequestHeader {
            message_type: 1,
            algorithm: 9,
            data_size: 1,
            file_name_length: 0,
        }
        .to_bytes()
        .to_vec();
        wire.push(0xAB);

        let request = read_request(&mut Cursor::new(wire)).unwrap();
        assert_eq!(request.raw_algorithm(), 9);
        assert_eq!(request.payload(), &[0xAB]);
    }

    #[test]
    fn test_over_tcp() {
        use std::net::{TcpListener, TcpStream};

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream).unwrap();
            let reply = ResponseMessage::success(
                request.filename(),
                "echo",
                request.payload().to_vec(),
            );
            write_response(&mut stream, &reply).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        write_request(
            &mut stream,
            &RequestMessage::compress(AlgorithmType::Rle, "big.bin", payload.clone()),
        )
        .unwrap();
        let response = read_response(&mut stream).unwrap();
        server.join().unwrap();

        assert!(response.is_success());
        assert_eq!(response.filename, "big.bin");
        assert_eq!(response.payload, payload);
    }
}
