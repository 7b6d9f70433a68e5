//! TCP accept loop

use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::observability::ServerMetrics;
use crate::pool::WorkQueue;

/// Pause after a failed accept so a persistent error cannot spin the thread
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Accept connections and queue them until `running` is cleared
///
/// `accept` has no cancellation of its own: whoever clears `running` must
/// also open one connection to the listener so this loop wakes and notices.
pub(crate) fn run_accept_loop(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    queue: Arc<WorkQueue<TcpStream>>,
    metrics: Arc<ServerMetrics>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!("TCP listener bound to {}", addr);
    }

    loop {
        let result = listener.accept();

        if !running.load(Ordering::SeqCst) {
            debug!("Shutdown requested, stopping accept loop");
            break;
        }

        match result {
            Ok((stream, peer_addr)) => {
                debug!("New TCP connection from {}", peer_addr);
                metrics.record_accepted();
                if queue.push(stream).is_err() {
                    debug!("Work queue closed, dropping connection from {}", peer_addr);
                    break;
                }
            }
            Err(e) => {
                error!("TCP accept error: {}", e);
                std::thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
}
