//! squeeze-server binary

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use squeeze_server::{ConfigLoader, FsArtifactStore, Server, ShutdownSignals};
use squeeze_utils::{init_logging_with_config, LogConfig, LogOutput, Result, SqueezeError};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::load()?,
    };
    cli.apply(&mut config);
    ConfigLoader::validate(&config)?;

    if cli.print_config {
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| SqueezeError::internal(format!("Failed to render config: {}", e)))?;
        print!("{}", rendered);
        return Ok(());
    }

    let mut log_config = LogConfig::server();
    if let Some(level) = &cli.log_level {
        log_config = log_config.with_filter(level.clone());
    }
    if cli.log_file {
        log_config = log_config.with_output(LogOutput::Both);
    }
    init_logging_with_config(log_config)?;

    info!("squeeze server starting");

    let mut signals = ShutdownSignals::register()?;
    let store = Arc::new(FsArtifactStore::from_config(&config.storage));
    let handle = Server::bind(config, store)?.start()?;

    let signal = signals.wait().await?;
    info!("{} received, shutting down", signal);

    // Joining worker threads blocks
    let snapshot = tokio::task::spawn_blocking(move || handle.stop())
        .await
        .map_err(|e| SqueezeError::internal(format!("Shutdown task failed: {}", e)))?;

    info!("squeeze server stopped ({})", snapshot);
    Ok(())
}
