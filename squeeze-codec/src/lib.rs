//! Compression algorithms for squeeze
//!
//! Two lossless codecs share the [`Compression`] trait:
//!
//! - [`HuffmanCodec`]: entropy coding with a self-describing artifact
//! - [`RunLengthCodec`]: `(count, value)` pairs
//!
//! [`Codec`] selects one of them from an [`AlgorithmType`] or a raw wire
//! selector byte. Codecs hold no state, so one value can serve any number of
//! threads.

pub mod algorithm;
pub mod bitio;
pub mod error;
pub mod huffman;
pub mod rle;

pub use algorithm::AlgorithmType;
pub use error::{CodecError, Result};
pub use huffman::HuffmanCodec;
pub use rle::RunLengthCodec;

/// A lossless transform: `decompress(compress(x)) == x`
pub trait Compression {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// The closed set of supported codecs
#[derive(Debug, Clone, Copy)]
pub enum Codec {
    Huffman(HuffmanCodec),
    RunLength(RunLengthCodec),
}

impl Codec {
    pub fn for_algorithm(algorithm: AlgorithmType) -> Self {
        match algorithm {
            AlgorithmType::Huffman => Codec::Huffman(HuffmanCodec::new()),
            AlgorithmType::Rle => Codec::RunLength(RunLengthCodec::new()),
        }
    }

    /// Resolve a wire selector, failing with `UnsupportedAlgorithm`
    pub fn from_selector(selector: u8) -> Result<Self> {
        AlgorithmType::try_from(selector).map(Self::for_algorithm)
    }

    pub fn algorithm(&self) -> AlgorithmType {
        match self {
            Codec::Huffman(_) => AlgorithmType::Huffman,
            Codec::RunLength(_) => AlgorithmType::Rle,
        }
    }
}

impl Compression for Codec {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            Codec::Huffman(codec) => codec.compress(input),
            Codec::RunLength(codec) => codec.compress(input),
        }
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            Codec::Huffman(codec) => codec.decompress(input),
            Codec::RunLength(codec) => codec.decompress(input),
        }
    }
}

/// Space saved as a percentage of the original size
///
/// `0.0` for empty input; negative when the artifact is larger than the input.
pub fn compression_ratio(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - compressed as f64 / original as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_from_selector() {
        assert_eq!(
            Codec::from_selector(1).unwrap().algorithm(),
            AlgorithmType::Huffman
        );
        assert_eq!(
            Codec::from_selector(2).unwrap().algorithm(),
            AlgorithmType::Rle
        );
        assert!(matches!(
            Codec::from_selector(9),
            Err(CodecError::UnsupportedAlgorithm(9))
        ));
    }

    #[test]
    fn test_every_codec_roundtrips() {
        let data = b"the quick brown fox jumps over the lazy dog. aaaaaaaaaaaaaaaa";
        for algorithm in AlgorithmType::ALL {
            let codec = Codec::for_algorithm(algorithm);
            let compressed = codec.compress(data).unwrap();
            assert_eq!(codec.decompress(&compressed).unwrap(), data, "{algorithm}");
        }
    }

    #[test]
    fn test_codecs_are_shareable_across_threads() {
        let codec = Codec::for_algorithm(AlgorithmType::Huffman);
        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                std::thread::spawn(move || {
                    let data = vec![i; 100 + i as usize];
                    let out = codec.decompress(&codec.compress(&data).unwrap()).unwrap();
                    assert_eq!(out, data);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_compression_ratio() {
        assert_eq!(compression_ratio(0, 0), 0.0);
        assert_eq!(compression_ratio(200, 50), 75.0);
        assert_eq!(compression_ratio(100, 200), -100.0);
        assert!((compression_ratio(10_000, 80) - 99.2).abs() < 1e-9);
    }
}
