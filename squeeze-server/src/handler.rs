//! Per-connection request lifecycle
//!
//! ```text
//! AwaitRequest -> HeaderReceived -> BodyReceived -> Dispatched -> Responded -> Closed
//! ```
//!
//! A connection that fails before `BodyReceived` is closed without a reply:
//! the request was never fully understood. From `Dispatched` on, every
//! failure becomes a FAILURE response carrying a diagnostic message.

use std::fmt;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use squeeze_codec::{compression_ratio, Codec, CodecError, Compression};
use squeeze_protocol::transport::{read_request, write_response};
use squeeze_protocol::{
    MessageType, ProtocolError, RequestMessage, ResponseMessage, REQUEST_HEADER_LEN,
    RESPONSE_HEADER_LEN,
};
use squeeze_utils::SqueezeError;

use crate::observability::ServerMetrics;
use crate::storage::{ArtifactStore, Operation};

/// Where a connection is in its single request/response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitRequest,
    HeaderReceived,
    BodyReceived,
    Dispatched,
    Responded,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::AwaitRequest => "AWAIT_REQUEST",
            ConnectionState::HeaderReceived => "HEADER_RECEIVED",
            ConnectionState::BodyReceived => "BODY_RECEIVED",
            ConnectionState::Dispatched => "DISPATCHED",
            ConnectionState::Responded => "RESPONDED",
            ConnectionState::Closed => "CLOSED",
        })
    }
}

/// Why a fully received request could not be served
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Unknown message type or algorithm selector
    #[error(transparent)]
    Selector(#[from] ProtocolError),

    #[error("Compression failed: {0}")]
    Compress(#[source] CodecError),

    #[error("Decompression failed: {0}")]
    Decompress(#[source] CodecError),

    #[error("Failed to save {} file: {source}", .op.past_tense())]
    Save {
        op: Operation,
        #[source]
        source: SqueezeError,
    },
}

/// Serves one connection at a time on the calling worker thread
pub struct RequestHandler {
    store: Arc<dyn ArtifactStore>,
    metrics: Arc<ServerMetrics>,
    io_timeout: Option<Duration>,
}

impl RequestHandler {
    pub fn new(store: Arc<dyn ArtifactStore>, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            store,
            metrics,
            io_timeout: None,
        }
    }

    /// Apply read/write timeouts to every connection
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }

    /// Run a connection through its whole lifecycle, then close it
    pub fn handle_connection(&self, worker: usize, mut stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".into());
        let mut state = ConnectionState::AwaitRequest;
        trace!(worker, %peer, %state, "connection state");

        if let Some(timeout) = self.io_timeout {
            if let Err(e) = stream
                .set_read_timeout(Some(timeout))
                .and_then(|_| stream.set_write_timeout(Some(timeout)))
            {
                warn!("Failed to set socket timeout for {}: {}", peer, e);
            }
        }

        let request = match read_request(&mut stream) {
            Ok(request) => request,
            Err(e) => {
                if e.header_received() {
                    advance(&mut state, ConnectionState::HeaderReceived, worker, &peer);
                }
                self.metrics.record_dropped();
                if e.source.is_disconnect() {
                    debug!("Dropping connection from {} in {}: {}", peer, state, e);
                } else {
                    warn!("Dropping connection from {} in {}: {}", peer, state, e);
                }
                advance(&mut state, ConnectionState::Closed, worker, &peer);
                return;
            }
        };
        advance(&mut state, ConnectionState::HeaderReceived, worker, &peer);
        advance(&mut state, ConnectionState::BodyReceived, worker, &peer);
        self.metrics.record_received(
            (REQUEST_HEADER_LEN + request.filename().len() + request.payload().len()) as u64,
        );

        info!(
            worker,
            %peer,
            message_type = request.raw_message_type(),
            algorithm = request.raw_algorithm(),
            filename = request.filename(),
            size = request.payload().len(),
            "Processing request"
        );

        advance(&mut state, ConnectionState::Dispatched, worker, &peer);
        let response = self.process(&request);

        match write_response(&mut stream, &response) {
            Ok(()) => {
                advance(&mut state, ConnectionState::Responded, worker, &peer);
                self.metrics.record_sent(
                    (RESPONSE_HEADER_LEN
                        + response.filename.len()
                        + response.message.len()
                        + response.payload.len()) as u64,
                );
            }
            Err(e) => warn!("Failed to send response to {}: {}", peer, e),
        }

        let _ = stream.shutdown(Shutdown::Both);
        advance(&mut state, ConnectionState::Closed, worker, &peer);
    }

    /// Turn a request into its response, recording the outcome
    pub fn process(&self, request: &RequestMessage) -> ResponseMessage {
        match self.dispatch(request) {
            Ok(response) => {
                self.metrics.record_success();
                info!("{} -> {}", request.filename(), response.message);
                response
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!("Request for {:?} failed: {}", request.filename(), e);
                ResponseMessage::failure(e.to_string())
            }
        }
    }

    fn dispatch(&self, request: &RequestMessage) -> Result<ResponseMessage, DispatchError> {
        let message_type = request.message_type()?;
        let algorithm = request.algorithm()?;
        let codec = Codec::for_algorithm(algorithm);
        let op = Operation::from(message_type);

        let (output, message) = match message_type {
            MessageType::CompressRequest => {
                let output = codec
                    .compress(request.payload())
                    .map_err(DispatchError::Compress)?;
                let ratio = compression_ratio(request.payload().len(), output.len());
                (output, format!("Compression successful. Ratio: {:.2}%", ratio))
            }
            MessageType::DecompressRequest => {
                let output = codec
                    .decompress(request.payload())
                    .map_err(DispatchError::Decompress)?;
                let message = format!("Decompression successful. Size: {} bytes", output.len());
                (output, message)
            }
        };

        let name = self.store.output_name(op, request.filename(), algorithm);
        self.store
            .save(op, &name, &output)
            .map_err(|source| DispatchError::Save { op, source })?;

        Ok(ResponseMessage::success(name, message, output))
    }
}

fn advance(state: &mut ConnectionState, next: ConnectionState, worker: usize, peer: &str) {
    trace!(worker, peer, from = %state, to = %next, "connection state");
    *state = next;
}
