//! Run-length coder
//!
//! The artifact is a flat sequence of `(count, value)` byte pairs. Runs longer
//! than 255 are split, so a run of 1000 identical bytes becomes four pairs.
//! Worst case output is twice the input size.

use tracing::debug;

use crate::error::{CodecError, Result};
use crate::Compression;

/// Longest run a single pair can describe
pub const MAX_RUN: usize = u8::MAX as usize;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunLengthCodec;

impl RunLengthCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Compression for RunLengthCodec {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut rest = input;

        while let Some(&value) = rest.first() {
            let run = rest
                .iter()
                .take(MAX_RUN)
                .take_while(|&&b| b == value)
                .count();
            out.push(run as u8);
            out.push(value);
            rest = &rest[run..];
        }

        debug!(input = input.len(), output = out.len(), "rle compress");
        Ok(out)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() % 2 != 0 {
            return Err(CodecError::OddLength(input.len()));
        }

        let total: usize = input.chunks_exact(2).map(|pair| pair[0] as usize).sum();
        let mut out = Vec::with_capacity(total);
        for pair in input.chunks_exact(2) {
            out.extend(std::iter::repeat(pair[1]).take(pair[0] as usize));
        }

        debug!(input = input.len(), output = out.len(), "rle decompress");
        Ok(out)
    }
}
