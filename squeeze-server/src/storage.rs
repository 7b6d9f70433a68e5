//! Artifact persistence
//!
//! Workers hand finished artifacts to an [`ArtifactStore`]. The store owns
//! both the naming policy and the choice of output directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use squeeze_codec::AlgorithmType;
use squeeze_protocol::MessageType;
use squeeze_utils::{ensure_dir, Result, SqueezeError};

use crate::config::StorageConfig;

/// Name used when the client sends no usable filename
const FALLBACK_NAME: &str = "unnamed";

/// What produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Compress,
    Decompress,
}

impl Operation {
    /// Human-readable adjective for messages ("compressed" / "decompressed")
    pub fn past_tense(self) -> &'static str {
        match self {
            Operation::Compress => "compressed",
            Operation::Decompress => "decompressed",
        }
    }
}

impl From<MessageType> for Operation {
    fn from(value: MessageType) -> Self {
        match value {
            MessageType::CompressRequest => Operation::Compress,
            MessageType::DecompressRequest => Operation::Decompress,
        }
    }
}

/// Persists artifacts produced by workers
pub trait ArtifactStore: Send + Sync {
    /// Name under which the result of `op` on `input_name` is stored
    fn output_name(&self, op: Operation, input_name: &str, algorithm: AlgorithmType) -> String {
        derive_output_name(op, input_name, algorithm)
    }

    /// Write `bytes` and return where they went
    fn save(&self, op: Operation, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Final path component of a client-supplied name
///
/// Both `/` and `\` count as separators; `.`/`..` and empty names map to a
/// fixed fallback so nothing is written outside the output directory.
pub fn sanitize_file_name(name: &str) -> &str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    match base {
        "" | "." | ".." => FALLBACK_NAME,
        other => other,
    }
}

/// Default naming policy
///
/// - compress: `report.txt` with Huffman becomes `report_Huffman.compressed`
/// - decompress: the stem is cut at its last `_` and `_decompressed` plus the
///   input's extension is appended, so `report_Huffman.compressed` becomes
///   `report_decompressed.compressed`
pub fn derive_output_name(op: Operation, input_name: &str, algorithm: AlgorithmType) -> String {
    let base = Path::new(sanitize_file_name(input_name));
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| FALLBACK_NAME.to_string());
    let extension = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    match op {
        Operation::Compress => format!("{}_{}.compressed", stem, algorithm.name()),
        Operation::Decompress => {
            let trimmed = match stem.rfind('_') {
                Some(pos) => &stem[..pos],
                None => stem.as_str(),
            };
            format!("{}_decompressed{}", trimmed, extension)
        }
    }
}

/// Stores artifacts as files in two directories
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    compressed_dir: PathBuf,
    decompressed_dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new(compressed_dir: impl Into<PathBuf>, decompressed_dir: impl Into<PathBuf>) -> Self {
        Self {
            compressed_dir: compressed_dir.into(),
            decompressed_dir: decompressed_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.compressed_dir, &config.decompressed_dir)
    }

    pub fn dir_for(&self, op: Operation) -> &Path {
        match op {
            Operation::Compress => &self.compressed_dir,
            Operation::Decompress => &self.decompressed_dir,
        }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, op: Operation, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.dir_for(op);
        if !dir.exists() {
            ensure_dir(dir).map_err(|e| SqueezeError::FileWrite {
                path: dir.to_path_buf(),
                source: e,
            })?;
            info!("Created directory: {}", dir.display());
        }

        // Readers only ever see a complete artifact, even with concurrent saves
        let path = dir.join(sanitize_file_name(name));
        let mut staged = NamedTempFile::new_in(dir).map_err(|e| SqueezeError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
        staged.write_all(bytes).map_err(|e| SqueezeError::FileWrite {
            path: staged.path().to_path_buf(),
            source: e,
        })?;
        staged.persist(&path).map_err(|e| {
            SqueezeError::storage(format!(
                "Failed to move artifact into {}: {}",
                path.display(),
                e.error
            ))
        })?;

        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}
