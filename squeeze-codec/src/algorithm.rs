use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Compression algorithm selector as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlgorithmType {
    Huffman = 1,
    Rle = 2,
}

impl AlgorithmType {
    pub const ALL: [AlgorithmType; 2] = [AlgorithmType::Huffman, AlgorithmType::Rle];

    /// Name used in artifact filenames and CLI output
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmType::Huffman => "Huffman",
            AlgorithmType::Rle => "RLE",
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AlgorithmType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AlgorithmType::Huffman),
            2 => Ok(AlgorithmType::Rle),
            other => Err(CodecError::UnsupportedAlgorithm(other)),
        }
    }
}

impl From<AlgorithmType> for u8 {
    fn from(algorithm: AlgorithmType) -> Self {
        algorithm.as_u8()
    }
}

impl FromStr for AlgorithmType {
    type Err = CodecError;

    /// Case-insensitive; anything other than huffman or rle is an error
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huffman" => Ok(AlgorithmType::Huffman),
            "rle" => Ok(AlgorithmType::Rle),
            _ => Err(CodecError::UnknownAlgorithmName(s.to_string())),
        }
    }
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
