//! MSB-first bit packing
//!
//! `BitWriter` appends variable-length codes and zero-pads the final byte;
//! `BitReader` walks a packed buffer one bit at a time and stops at a caller
//! supplied bit limit so padding is never mistaken for data.

use crate::error::{CodecError, Result};

/// Longest code `BitWriter::write_code` accepts
pub const MAX_CODE_BITS: usize = 64;

/// Packs bits most-significant-first into a byte buffer
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Partial byte, filled from bit 7 downwards
    current: u8,
    /// Bits used in `current` (0-7)
    filled: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the output for roughly `bits` bits
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            current: 0,
            filled: 0,
        }
    }

    pub fn push_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 0x80 >> self.filled;
        }
        self.filled += 1;
        if self.filled == 8 {
            self.bytes.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    /// Append the low `len` bits of `code`, highest of those bits first
    pub fn write_code(&mut self, code: u64, len: usize) -> Result<()> {
        if len > MAX_CODE_BITS {
            return Err(CodecError::InvalidBitCount(len));
        }
        for shift in (0..len).rev() {
            self.push_bit((code >> shift) & 1 == 1);
        }
        Ok(())
    }

    /// Total bits written so far
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.filled as usize
    }

    /// Flush the partial byte and return `(packed, padding_bits)`
    pub fn finish(mut self) -> (Vec<u8>, u8) {
        let padding = if self.filled == 0 { 0 } else { 8 - self.filled };
        if self.filled > 0 {
            self.bytes.push(self.current);
        }
        (self.bytes, padding)
    }
}

/// Reads bits most-significant-first, refusing to read past `limit` bits
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    limit: usize,
}

impl<'a> BitReader<'a> {
    /// Reader over every bit of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            limit: data.len() * 8,
        }
    }

    /// Reader that ignores the last `padding` bits of `data`
    pub fn with_padding(data: &'a [u8], padding: u8) -> Self {
        let total = data.len() * 8;
        Self {
            data,
            position: 0,
            limit: total.saturating_sub(padding as usize),
        }
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        if self.position >= self.limit {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.position / 8];
        let bit = byte & (0x80 >> (self.position % 8)) != 0;
        self.position += 1;
        Ok(bit)
    }

    pub fn bits_remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.limit
    }
}
