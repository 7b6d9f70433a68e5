//! Server lifecycle: bind, start, stop

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use squeeze_utils::{Result, SqueezeError};

use crate::config::AppConfig;
use crate::handler::RequestHandler;
use crate::observability::{MetricsSnapshot, ServerMetrics};
use crate::pool::{WorkQueue, WorkerPool};
use crate::storage::ArtifactStore;
use crate::tcp::run_accept_loop;

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// A bound but not yet serving server
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: AppConfig,
    store: Arc<dyn ArtifactStore>,
    metrics: Arc<ServerMetrics>,
}

impl Server {
    /// Bind the listening socket described by `config.server`
    pub fn bind(config: AppConfig, store: Arc<dyn ArtifactStore>) -> Result<Self> {
        let addr = config.server.listen_addr();
        let listener = TcpListener::bind(&addr)
            .map_err(|e| SqueezeError::connection(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            config,
            store,
            metrics: Arc::new(ServerMetrics::new()),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawn the worker pool and the accept thread
    pub fn start(self) -> Result<ServerHandle> {
        let workers = self.config.server.worker_count();
        let running = Arc::new(AtomicBool::new(true));
        let queue: Arc<WorkQueue<TcpStream>> = Arc::new(WorkQueue::new());

        let handler = Arc::new(
            RequestHandler::new(Arc::clone(&self.store), Arc::clone(&self.metrics))
                .with_io_timeout(self.config.server.io_timeout()),
        );
        let pool = WorkerPool::spawn(workers, Arc::clone(&queue), move |id, stream| {
            handler.handle_connection(id, stream)
        })?;

        let accept = {
            let running = Arc::clone(&running);
            let queue = Arc::clone(&queue);
            let metrics = Arc::clone(&self.metrics);
            let listener = self.listener;
            thread::Builder::new()
                .name("squeeze-accept".into())
                .spawn(move || run_accept_loop(listener, running, queue, metrics))
        };
        let accept = match accept {
            Ok(handle) => handle,
            Err(e) => {
                queue.close();
                pool.join();
                return Err(e.into());
            }
        };

        info!(
            "Server listening on {} with {} workers",
            self.local_addr, workers
        );

        Ok(ServerHandle {
            local_addr: self.local_addr,
            running,
            queue,
            accept: Some(accept),
            pool: Some(pool),
            metrics: self.metrics,
        })
    }
}

/// Control handle for a running server
///
/// Dropping the handle stops the server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    queue: Arc<WorkQueue<TcpStream>>,
    accept: Option<JoinHandle<()>>,
    pool: Option<WorkerPool>,
    metrics: Arc<ServerMetrics>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop accepting, let workers finish queued connections, join all threads
    pub fn stop(mut self) -> MetricsSnapshot {
        self.shutdown();
        self.metrics.snapshot()
    }

    fn shutdown(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Server shutting down");

        if let Some(accept) = self.accept.take() {
            if self.wake_accept_loop() {
                if accept.join().is_err() {
                    warn!("Accept thread panicked");
                }
            } else {
                warn!("Could not wake accept loop; leaving it detached");
            }
        }

        self.queue.close();
        if let Some(pool) = self.pool.take() {
            pool.join();
        }

        let snapshot = self.metrics.snapshot();
        info!(
            accepted = snapshot.connections_accepted,
            succeeded = snapshot.requests_succeeded,
            failed = snapshot.requests_failed,
            dropped = snapshot.connections_dropped,
            bytes_received = snapshot.bytes_received,
            bytes_sent = snapshot.bytes_sent,
            "Server stopped"
        );
    }

    /// Open one loopback connection so a blocked `accept` returns
    fn wake_accept_loop(&self) -> bool {
        let target = wake_address(self.local_addr);
        match TcpStream::connect_timeout(&target, WAKE_TIMEOUT) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to wake accept loop at {}: {}", target, e);
                false
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Loopback equivalent of a wildcard bind address
fn wake_address(local: SocketAddr) -> SocketAddr {
    let ip = match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, local.port())
}
