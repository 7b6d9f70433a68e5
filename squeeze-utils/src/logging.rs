//! Logging infrastructure for squeeze
//!
//! Provides unified logging setup using the tracing ecosystem.

use std::path::PathBuf;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, Result, SqueezeError};

/// Environment variable that overrides the default filter
pub const LOG_ENV: &str = "SQUEEZE_LOG";

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// Append to a file under the log directory
    File,
    Both,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub output: LogOutput,
    /// Filter directive (e.g. "info", "squeeze_server=debug")
    pub filter: String,
    /// Include span events (enter/exit)
    pub span_events: bool,
    /// Include file/line in logs
    pub file_line: bool,
    /// Include thread names (worker threads are named)
    pub thread_names: bool,
    /// Log file name, defaults to "squeeze.log"
    pub file_name: Option<String>,
    /// Log directory, defaults to [`paths::log_dir`]
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            span_events: false,
            file_line: false,
            thread_names: false,
            file_name: None,
            log_dir: None,
        }
    }
}

fn resolve_filter(from_env: Option<String>, default: &str) -> String {
    from_env
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| default.into())
}

impl LogConfig {
    /// Config for the command-line client: quiet stderr
    pub fn client() -> Self {
        Self {
            filter: resolve_filter(std::env::var(LOG_ENV).ok(), "warn"),
            ..Self::default()
        }
    }

    /// Config for the server: stderr with worker thread names
    pub fn server() -> Self {
        Self {
            filter: resolve_filter(std::env::var(LOG_ENV).ok(), "info"),
            thread_names: true,
            file_name: Some("squeeze-server.log".into()),
            ..Self::default()
        }
    }

    /// Config for development (verbose stderr)
    pub fn development() -> Self {
        Self {
            filter: "debug".into(),
            span_events: true,
            file_line: true,
            thread_names: true,
            ..Self::default()
        }
    }

    /// Replace the filter directive
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Path the file writer appends to
    pub fn log_path(&self) -> PathBuf {
        let dir = self.log_dir.clone().unwrap_or_else(paths::log_dir);
        dir.join(self.file_name.as_deref().unwrap_or("squeeze.log"))
    }
}

fn open_log_file(config: &LogConfig) -> Result<std::fs::File> {
    let log_path = config.log_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SqueezeError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| SqueezeError::FileWrite {
            path: log_path,
            source: e,
        })
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| SqueezeError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(config.thread_names);

    let fmt_layer = if config.span_events {
        fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    } else {
        fmt_layer
    };

    let fmt_layer = if config.file_line {
        fmt_layer.with_file(true).with_line_number(true)
    } else {
        fmt_layer.with_file(false).with_line_number(false)
    };

    match config.output {
        LogOutput::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| SqueezeError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::File => {
            let file = open_log_file(&config)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(file).with_ansi(false))
                .try_init()
                .map_err(|e| SqueezeError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::Both => {
            let file = open_log_file(&config)?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(config.thread_names);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .with(file_layer)
                .try_init()
                .map_err(|e| SqueezeError::internal(format!("Failed to init logging: {}", e)))?;
        }
    }

    Ok(())
}
