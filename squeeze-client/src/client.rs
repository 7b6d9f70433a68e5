//! Connection to the squeeze server
//!
//! The server answers exactly one request per connection, so every call to
//! [`Client::request`] opens a fresh TCP stream and drops it afterwards.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::debug;

use squeeze_protocol::{ClientCodec, RequestMessage, ResponseMessage};
use squeeze_utils::{Result, SqueezeError};

/// Client for the squeeze server
#[derive(Debug, Clone)]
pub struct Client {
    addr: String,
    timeout: Duration,
}

impl Client {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send one request and wait for its response
    pub async fn request(&self, request: RequestMessage) -> Result<ResponseMessage> {
        let mut framed = self.connect().await?;

        debug!(
            "Sending {} bytes of {} to {}",
            request.payload().len(),
            request.filename(),
            self.addr
        );
        framed.send(request).await.map_err(|e| {
            if e.is_disconnect() {
                SqueezeError::ConnectionClosed
            } else {
                SqueezeError::connection(format!("Failed to send: {}", e))
            }
        })?;

        self.recv(&mut framed).await
    }

    async fn connect(&self) -> Result<Framed<TcpStream, ClientCodec>> {
        let stream = match timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(SqueezeError::connection(format!(
                    "Failed to connect to {}: {}",
                    self.addr, e
                )))
            }
            Err(_) => {
                return Err(SqueezeError::ConnectionTimeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        };
        Ok(Framed::new(stream, ClientCodec::new()))
    }

    async fn recv(&self, framed: &mut Framed<TcpStream, ClientCodec>) -> Result<ResponseMessage> {
        match timeout(self.timeout, framed.next()).await {
            Ok(Some(Ok(msg))) => Ok(msg),
            Ok(Some(Err(e))) if e.is_disconnect() => Err(SqueezeError::ConnectionClosed),
            Ok(Some(Err(e))) => Err(SqueezeError::protocol(e.to_string())),
            Ok(None) => Err(SqueezeError::ConnectionClosed),
            Err(_) => Err(SqueezeError::ConnectionTimeout {
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squeeze_codec::AlgorithmType;
    use squeeze_protocol::{OperationStatus, ServerCodec};
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[tokio::test]
    async fn test_request_response() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, ServerCodec::new());
            let request = framed.next().await.unwrap().unwrap();
            let mut payload = request.payload().to_vec();
            payload.reverse();
            framed
                .send(ResponseMessage::success(request.filename(), "ok", payload))
                .await
                .unwrap();
        });

        let client = Client::new(addr, Duration::from_secs(5));
        let response = client
            .request(RequestMessage::compress(
                AlgorithmType::Rle,
                "a.bin",
                vec![1, 2, 3],
            ))
            .await
            .unwrap();

        assert_eq!(response.status, OperationStatus::Success);
        assert_eq!(response.filename, "a.bin");
        assert_eq!(response.payload, vec![3, 2, 1]);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_server_closes_without_reply() {
        let (listener, addr) = listener().await;
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let client = Client::new(addr, Duration::from_secs(5));
        let err = client
            .request(RequestMessage::compress(AlgorithmType::Huffman, "a", vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, SqueezeError::ConnectionClosed), "{:?}", err);
    }

    #[tokio::test]
    async fn test_response_timeout() {
        let (listener, addr) = listener().await;
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
            drop(stream);
        });

        let client = Client::new(addr, Duration::from_millis(200));
        let err = client
            .request(RequestMessage::compress(AlgorithmType::Rle, "a", vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, SqueezeError::ConnectionTimeout { .. }));
        assert!(err.is_retryable());
        server.abort();
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nothing listens on
        let (listener, addr) = listener().await;
        drop(listener);

        let client = Client::new(addr, Duration::from_secs(2));
        let err = client
            .request(RequestMessage::compress(AlgorithmType::Rle, "a", vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, SqueezeError::Connection(_)));
    }
}
