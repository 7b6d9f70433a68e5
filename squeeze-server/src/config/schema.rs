//! Configuration schema structs

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

/// Listener and worker pool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind (default: all interfaces)
    pub bind: String,
    /// TCP port; 0 picks an ephemeral port
    pub port: u16,
    /// Worker threads; 0 means available parallelism
    pub workers: usize,
    /// Socket read/write timeout per connection
    pub io_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            workers: 0,
            io_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `bind:port`, bracketing IPv6 literals
    pub fn listen_addr(&self) -> String {
        if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }

    /// Resolved worker count, never zero
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

/// Where artifacts are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub compressed_dir: PathBuf,
    pub decompressed_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            compressed_dir: PathBuf::from("./compressed"),
            decompressed_dir: PathBuf::from("./decompressed"),
        }
    }
}
