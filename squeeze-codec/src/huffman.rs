//! Huffman entropy coder
//!
//! # Artifact layout
//!
//! ```text
//! +--------------------+
//! | tree_size (4)      |  u32 little-endian
//! +--------------------+
//! | tree (tree_size)   |  pre-order: 0x00 = internal, 0x01 <byte> = leaf
//! +--------------------+
//! | original_size (4)  |  u32 little-endian, exact decompressed length
//! +--------------------+
//! | padding_bits (1)   |  zero bits appended to the last packed byte
//! +--------------------+
//! | packed bits        |  codes concatenated MSB-first
//! +--------------------+
//! ```
//!
//! Frequencies are not stored; the decoder only needs the tree's shape.
//!
//! Equal frequencies are broken by an order key so the same input always
//! produces the same artifact: a leaf's key is its byte value, an internal
//! node's key is `256 + n` where `n` counts internal nodes created so far.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::bitio::{BitReader, BitWriter, MAX_CODE_BITS};
use crate::error::{CodecError, Result};
use crate::Compression;

const INTERNAL_MARKER: u8 = 0;
const LEAF_MARKER: u8 = 1;

/// Deepest tree `HuffmanTree::deserialize` will rebuild
pub const MAX_TREE_DEPTH: usize = 256;

/// Occurrence count of every byte value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut counts = [0u64; 256];
        for &byte in data {
            counts[byte as usize] += 1;
        }
        Self { counts }
    }

    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// Number of byte values that occur at least once
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    fn present(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(byte, &count)| (byte as u8, count))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Leaf(u8),
    Internal { left: usize, right: usize },
}

/// Huffman tree stored as an arena of nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
}

impl HuffmanTree {
    /// Build a tree by repeatedly merging the two lightest nodes
    ///
    /// Returns `None` when no byte value occurs.
    pub fn from_frequencies(freqs: &FrequencyTable) -> Option<Self> {
        let mut nodes = Vec::with_capacity(freqs.distinct() * 2);
        let mut heap = BinaryHeap::new();

        for (byte, count) in freqs.present() {
            heap.push(Reverse((count, u32::from(byte), nodes.len())));
            nodes.push(Node::Leaf(byte));
        }

        let mut internal_key = 256u32;
        while heap.len() > 1 {
            let (Some(Reverse((left_freq, _, left))), Some(Reverse((right_freq, _, right)))) =
                (heap.pop(), heap.pop())
            else {
                break;
            };

            heap.push(Reverse((left_freq + right_freq, internal_key, nodes.len())));
            nodes.push(Node::Internal { left, right });
            internal_key += 1;
        }

        let Reverse((_, _, root)) = heap.pop()?;
        Some(Self { nodes, root })
    }

    /// True when the tree is a lone leaf (input had one distinct byte)
    pub fn is_single_leaf(&self) -> bool {
        matches!(self.nodes[self.root], Node::Leaf(_))
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf(_)))
            .count()
    }

    /// Derive every leaf's code (left edge = 0, right edge = 1)
    ///
    /// A lone root leaf gets the one-bit code `0`.
    pub fn code_table(&self) -> Result<CodeTable> {
        let mut table = CodeTable::empty();

        if let Node::Leaf(byte) = self.nodes[self.root] {
            table.codes[byte as usize] = Code { bits: 0, len: 1 };
            return Ok(table);
        }

        let mut stack = vec![(self.root, 0u64, 0usize)];
        while let Some((index, bits, len)) = stack.pop() {
            match self.nodes[index] {
                Node::Leaf(byte) => {
                    table.codes[byte as usize] = Code {
                        bits,
                        len: len as u8,
                    };
                }
                Node::Internal { left, right } => {
                    if len + 1 > MAX_CODE_BITS {
                        return Err(CodecError::CodeTooLong {
                            length: len + 1,
                            max: MAX_CODE_BITS,
                        });
                    }
                    stack.push((right, (bits << 1) | 1, len + 1));
                    stack.push((left, bits << 1, len + 1));
                }
            }
        }

        Ok(table)
    }

    /// Pre-order serialization of shape and leaf values
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.nodes.len() + self.leaf_count());
        self.write_node(self.root, &mut out);
        out
    }

    fn write_node(&self, index: usize, out: &mut Vec<u8>) {
        match self.nodes[index] {
            Node::Leaf(byte) => {
                out.push(LEAF_MARKER);
                out.push(byte);
            }
            Node::Internal { left, right } => {
                out.push(INTERNAL_MARKER);
                self.write_node(left, out);
                self.write_node(right, out);
            }
        }
    }

    /// Rebuild a tree from exactly `bytes`
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut nodes = Vec::new();
        let mut offset = 0;
        let root = Self::read_node(bytes, &mut offset, &mut nodes, 0)?;

        if offset != bytes.len() {
            return Err(CodecError::TreeSizeMismatch {
                declared: bytes.len(),
                consumed: offset,
            });
        }

        Ok(Self { nodes, root })
    }

    fn read_node(
        bytes: &[u8],
        offset: &mut usize,
        nodes: &mut Vec<Node>,
        depth: usize,
    ) -> Result<usize> {
        if depth > MAX_TREE_DEPTH {
            return Err(CodecError::TreeTooDeep {
                max: MAX_TREE_DEPTH,
            });
        }

        let marker = *bytes.get(*offset).ok_or(CodecError::Truncated {
            section: "tree",
            needed: *offset + 1,
            available: bytes.len(),
        })?;

        match marker {
            LEAF_MARKER => {
                let byte = *bytes.get(*offset + 1).ok_or(CodecError::Truncated {
                    section: "tree leaf",
                    needed: *offset + 2,
                    available: bytes.len(),
                })?;
                *offset += 2;
                nodes.push(Node::Leaf(byte));
                Ok(nodes.len() - 1)
            }
            INTERNAL_MARKER => {
                *offset += 1;
                let index = nodes.len();
                nodes.push(Node::Internal { left: 0, right: 0 });
                let left = Self::read_node(bytes, offset, nodes, depth + 1)?;
                let right = Self::read_node(bytes, offset, nodes, depth + 1)?;
                nodes[index] = Node::Internal { left, right };
                Ok(index)
            }
            other => Err(CodecError::InvalidTreeMarker {
                marker: other,
                offset: *offset,
            }),
        }
    }

    /// Walk the tree bit by bit until `expected` bytes are produced
    fn decode(&self, reader: &mut BitReader<'_>, expected: usize) -> Result<Vec<u8>> {
        let exhausted = |produced: usize| CodecError::BitstreamExhausted { produced, expected };
        let mut out = Vec::with_capacity(expected.min(reader.bits_remaining()));

        if let Node::Leaf(byte) = self.nodes[self.root] {
            while out.len() < expected {
                reader.read_bit().map_err(|_| exhausted(out.len()))?;
                out.push(byte);
            }
            return Ok(out);
        }

        let mut current = self.root;
        while out.len() < expected {
            let bit = reader.read_bit().map_err(|_| exhausted(out.len()))?;
            current = match self.nodes[current] {
                Node::Internal { left, right } => {
                    if bit {
                        right
                    } else {
                        left
                    }
                }
                Node::Leaf(_) => current,
            };
            if let Node::Leaf(byte) = self.nodes[current] {
                out.push(byte);
                current = self.root;
            }
        }

        Ok(out)
    }
}

/// A single variable-length code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Code {
    /// Code bits, right-aligned
    pub bits: u64,
    pub len: u8,
}

/// Byte value to code mapping derived from one tree
#[derive(Debug, Clone)]
pub struct CodeTable {
    codes: [Code; 256],
}

impl CodeTable {
    fn empty() -> Self {
        Self {
            codes: [Code::default(); 256],
        }
    }

    /// Code assigned to `byte`, if it appeared in the input
    pub fn code(&self, byte: u8) -> Option<Code> {
        let code = self.codes[byte as usize];
        (code.len > 0).then_some(code)
    }
}

/// Huffman codec producing self-describing artifacts
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCodec;

impl HuffmanCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Compression for HuffmanCodec {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let original_size = u32::try_from(input.len()).map_err(|_| CodecError::InputTooLarge {
            size: input.len(),
            max: u32::MAX as usize,
        })?;

        let freqs = FrequencyTable::from_bytes(input);
        let Some(tree) = HuffmanTree::from_frequencies(&freqs) else {
            return Ok(Vec::new());
        };
        let codes = tree.code_table()?;

        let total_bits: usize = (0..=255u8)
            .filter_map(|b| codes.code(b).map(|c| c.len as usize * freqs.count(b) as usize))
            .sum();
        let mut writer = BitWriter::with_capacity(total_bits);
        for &byte in input {
            let code = codes.codes[byte as usize];
            writer.write_code(code.bits, code.len as usize)?;
        }

        let tree_bytes = tree.serialize();
        let (packed, padding) = writer.finish();

        let mut out = Vec::with_capacity(4 + tree_bytes.len() + 4 + 1 + packed.len());
        out.extend_from_slice(&(tree_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&tree_bytes);
        out.extend_from_slice(&original_size.to_le_bytes());
        out.push(padding);
        out.extend_from_slice(&packed);

        debug!(
            input = input.len(),
            output = out.len(),
            symbols = freqs.distinct(),
            "huffman compress"
        );
        Ok(out)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut cursor = 0;
        let tree_size = read_u32(input, &mut cursor, "tree size")? as usize;
        let tree_bytes = take(input, &mut cursor, tree_size, "tree")?;
        let tree = HuffmanTree::deserialize(tree_bytes)?;
        let original_size = read_u32(input, &mut cursor, "original size")? as usize;
        let padding = take(input, &mut cursor, 1, "padding")?[0];
        if padding > 7 {
            return Err(CodecError::InvalidPadding(padding));
        }

        let packed = &input[cursor..];
        let mut reader = BitReader::with_padding(packed, padding);
        let out = tree.decode(&mut reader, original_size)?;

        debug!(input = input.len(), output = out.len(), "huffman decompress");
        Ok(out)
    }
}

fn take<'a>(
    input: &'a [u8],
    cursor: &mut usize,
    len: usize,
    section: &'static str,
) -> Result<&'a [u8]> {
    let available = input.len() - *cursor;
    if len > available {
        return Err(CodecError::Truncated {
            section,
            needed: len,
            available,
        });
    }
    let slice = &input[*cursor..*cursor + len];
    *cursor += len;
    Ok(slice)
}

fn read_u32(input: &[u8], cursor: &mut usize, section: &'static str) -> Result<u32> {
    let bytes = take(input, cursor, 4, section)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
