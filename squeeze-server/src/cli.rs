//! Command-line arguments for the server binary

use std::path::PathBuf;

use clap::Parser;

use squeeze_server::AppConfig;

/// Multi-threaded file compression server
#[derive(Parser, Debug)]
#[command(name = "squeeze-server")]
#[command(about = "Compress and decompress files for squeeze clients over TCP")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/squeeze/server.toml)
    #[arg(short, long, env = "SQUEEZE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    pub bind: Option<String>,

    /// Worker threads; 0 means one per CPU (overrides the config file)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log filter, e.g. "debug" or "squeeze_server=trace"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also append logs to the log file under the state directory
    #[arg(long)]
    pub log_file: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }
    }
}
