//! squeeze-server: multi-threaded compression server
//!
//! One accept thread pushes connections onto a shared FIFO; a fixed pool of
//! worker threads pops them and serves each one start to finish: read the
//! request, run the codec, persist the artifact, send the response, close.
//!
//! ```no_run
//! use std::sync::Arc;
//! use squeeze_server::{AppConfig, FsArtifactStore, Server};
//!
//! let config = AppConfig::default();
//! let store = Arc::new(FsArtifactStore::from_config(&config.storage));
//! let handle = Server::bind(config, store)?.start()?;
//! println!("listening on {}", handle.local_addr());
//! handle.stop();
//! # Ok::<(), squeeze_utils::SqueezeError>(())
//! ```

pub mod config;
pub mod handler;
pub mod observability;
pub mod pool;
pub mod server;
pub mod signals;
pub mod storage;
mod tcp;

pub use config::{AppConfig, ConfigLoader, ServerConfig, StorageConfig};
pub use handler::{ConnectionState, DispatchError, RequestHandler};
pub use observability::{MetricsSnapshot, ServerMetrics};
pub use server::{Server, ServerHandle};
pub use signals::ShutdownSignals;
pub use storage::{ArtifactStore, FsArtifactStore, Operation};
