//! squeeze: command-line client for the squeeze compression server
//!
//! Sends one file per connection and stores the returned artifact under the
//! output directory. Without a subcommand an interactive menu is started.

mod cli;
mod client;
mod commands;

use clap::Parser;
use cli::Cli;
use squeeze_utils::{init_logging_with_config, LogConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Quiet by default, SQUEEZE_LOG raises the level
    if let Err(e) = init_logging_with_config(LogConfig::client()) {
        eprintln!("{}", e);
    }

    let exit_code = match commands::execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    std::process::exit(exit_code);
}
