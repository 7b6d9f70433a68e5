//! CLI argument parsing for the squeeze client

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use squeeze_codec::AlgorithmType;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Compress and decompress files on a squeeze server
#[derive(Parser, Debug)]
#[command(name = "squeeze")]
#[command(about = "Client for the squeeze compression server")]
#[command(version)]
pub struct Cli {
    /// Server address (host:port)
    #[arg(long, env = "SQUEEZE_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Directory that receives returned artifacts
    #[arg(short, long, default_value = "./client_output")]
    pub output_dir: PathBuf,

    /// Seconds to wait for the connection and for the response
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Without a subcommand the interactive menu is started
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send a file to be compressed
    Compress {
        file: PathBuf,

        /// huffman or rle
        #[arg(short, long, default_value = "huffman")]
        algorithm: AlgorithmType,
    },

    /// Send a compressed artifact to be restored
    Decompress {
        file: PathBuf,

        /// Must match the algorithm used to compress
        #[arg(short, long, default_value = "huffman")]
        algorithm: AlgorithmType,
    },

    /// Menu-driven session on stdin
    Interactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["squeeze", "compress", "notes.txt"]).unwrap();
        assert_eq!(cli.output_dir, PathBuf::from("./client_output"));
        assert_eq!(cli.timeout(), Duration::from_secs(30));
        assert_eq!(
            cli.command,
            Some(Command::Compress {
                file: PathBuf::from("notes.txt"),
                algorithm: AlgorithmType::Huffman,
            })
        );
    }

    #[test]
    fn test_algorithm_flag() {
        let cli = Cli::try_parse_from([
            "squeeze",
            "--addr",
            "10.0.0.5:9000",
            "decompress",
            "-a",
            "RLE",
            "notes_RLE.compressed",
        ])
        .unwrap();
        assert_eq!(cli.addr, "10.0.0.5:9000");
        assert_eq!(
            cli.command,
            Some(Command::Decompress {
                file: PathBuf::from("notes_RLE.compressed"),
                algorithm: AlgorithmType::Rle,
            })
        );
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        assert!(Cli::try_parse_from(["squeeze", "compress", "-a", "lzw", "f"]).is_err());
    }

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["squeeze", "--timeout-secs", "0"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.timeout(), Duration::from_secs(1));
    }
}
