//! Command execution for the squeeze client

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

use squeeze_codec::AlgorithmType;
use squeeze_protocol::{MessageType, RequestMessage};
use squeeze_utils::{ensure_dir, Result, SqueezeError};

use crate::cli::{Cli, Command};
use crate::client::Client;

/// Run the parsed command line and return the process exit code
pub async fn execute(cli: Cli) -> Result<i32> {
    let client = Client::new(cli.addr.clone(), cli.timeout());
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    let (kind, file, algorithm) = match cli.command {
        Some(Command::Compress { file, algorithm }) => {
            (MessageType::CompressRequest, file, algorithm)
        }
        Some(Command::Decompress { file, algorithm }) => {
            (MessageType::DecompressRequest, file, algorithm)
        }
        Some(Command::Interactive) | None => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interactive(&client, &cli.output_dir, stdin, &mut stdout, &mut stderr).await?;
            return Ok(0);
        }
    };

    let succeeded = transfer(
        &client,
        kind,
        &file,
        algorithm,
        &cli.output_dir,
        &mut stdout,
        &mut stderr,
    )
    .await?;

    Ok(if succeeded { 0 } else { 1 })
}

fn noun(kind: MessageType) -> &'static str {
    match kind {
        MessageType::CompressRequest => "Compression",
        MessageType::DecompressRequest => "Decompression",
    }
}

fn adjective(kind: MessageType) -> &'static str {
    match kind {
        MessageType::CompressRequest => "Compressed",
        MessageType::DecompressRequest => "Decompressed",
    }
}

/// Final path component of a name returned by the server
fn local_name(name: &str) -> &str {
    match name.rsplit(['/', '\\']).next().unwrap_or("") {
        "" | "." | ".." => "output",
        base => base,
    }
}

/// Write a returned artifact into `output_dir`, creating it if needed
pub fn save_artifact(output_dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    ensure_dir(output_dir).map_err(|e| SqueezeError::FileWrite {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let path = output_dir.join(local_name(name));
    fs::write(&path, bytes).map_err(|e| SqueezeError::FileWrite {
        path: path.clone(),
        source: e,
    })?;
    Ok(path)
}

/// Send one file to the server and save what comes back
///
/// Returns `Ok(false)` when the server answered with FAILURE. Local and
/// transport errors are returned as `Err`.
pub async fn transfer<O: Write, E: Write>(
    client: &Client,
    kind: MessageType,
    file: &Path,
    algorithm: AlgorithmType,
    output_dir: &Path,
    out: &mut O,
    err: &mut E,
) -> Result<bool> {
    writeln!(out, "Reading file: {}", file.display())?;
    let data = fs::read(file).map_err(|e| SqueezeError::FileRead {
        path: file.to_path_buf(),
        source: e,
    })?;

    writeln!(out, "File size: {} bytes", data.len())?;
    writeln!(out, "Algorithm: {}", algorithm)?;
    writeln!(out, "Connecting to server {}...", client.addr())?;

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let request = RequestMessage::new(kind, algorithm, filename, data);
    let response = client.request(request).await?;

    if !response.is_success() {
        warn!("{} rejected: {}", noun(kind), response.message);
        writeln!(err, "\n{} failed!", noun(kind))?;
        writeln!(err, "Error: {}", response.message)?;
        return Ok(false);
    }

    writeln!(out, "\n{} successful!", noun(kind))?;
    writeln!(out, "Message: {}", response.message)?;
    writeln!(out, "Output file: {}", response.filename)?;
    writeln!(
        out,
        "{} size: {} bytes",
        adjective(kind),
        response.payload.len()
    )?;

    let path = save_artifact(output_dir, &response.filename, &response.payload)?;
    debug!("Saved {} bytes to {}", response.payload.len(), path.display());
    writeln!(out, "{} file saved to: {}", adjective(kind), path.display())?;
    Ok(true)
}

/// Read one trimmed line, `None` at end of input
async fn prompt<R, O>(input: &mut R, out: &mut O, text: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    O: Write,
{
    write!(out, "{}", text)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Menu loop: compress, decompress or exit
///
/// Errors from a single operation are reported and the menu continues. End of
/// input behaves like choosing exit.
pub async fn interactive<R, O, E>(
    client: &Client,
    output_dir: &Path,
    mut input: R,
    out: &mut O,
    err: &mut E,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    writeln!(out, "========================================")?;
    writeln!(out, "  Distributed File Compression Client")?;
    writeln!(out, "========================================")?;
    writeln!(out, "Server: {}", client.addr())?;

    loop {
        writeln!(out, "\nOptions:")?;
        writeln!(out, "1. Compress a file")?;
        writeln!(out, "2. Decompress a file")?;
        writeln!(out, "3. Exit")?;

        let Some(choice) = prompt(&mut input, out, "\nEnter your choice (1-3): ").await? else {
            break;
        };
        let kind = match choice.as_str() {
            "1" => MessageType::CompressRequest,
            "2" => MessageType::DecompressRequest,
            "3" => break,
            _ => {
                writeln!(out, "Invalid choice. Please try again.")?;
                continue;
            }
        };

        let Some(path) = prompt(&mut input, out, "Enter file path: ").await? else {
            break;
        };

        writeln!(out, "Select algorithm:")?;
        writeln!(out, "1. Huffman")?;
        writeln!(out, "2. RLE")?;
        let Some(algo) = prompt(&mut input, out, "Enter choice (1-2): ").await? else {
            break;
        };
        let algorithm = match algo.as_str() {
            "1" => AlgorithmType::Huffman,
            "2" => AlgorithmType::Rle,
            _ => {
                writeln!(out, "Invalid algorithm choice. Please try again.")?;
                continue;
            }
        };

        writeln!(out, "\n----- Processing -----")?;
        let file = PathBuf::from(path);
        if let Err(e) = transfer(client, kind, &file, algorithm, output_dir, out, err).await {
            writeln!(err, "Error: {}", e)?;
        }
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}
