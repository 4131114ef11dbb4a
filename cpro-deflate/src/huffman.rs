//! Canonical Huffman coding.
//!
//! Code lengths come from a frequency-built Huffman tree, then codes are
//! assigned canonically: symbols sorted by (length, symbol) receive
//! consecutive code values, stepping to the next length with a left shift.
//! Only the lengths need to be transmitted; the decoder rebuilds the same
//! codes from them.
//!
//! # Length tables
//!
//! Length tables are run-length coded with the Deflate code-length alphabet:
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | 0-15   | literal code length |
//! | 16     | repeat previous length 3-6 times (2 extra bits) |
//! | 17     | 3-10 zero lengths (3 extra bits) |
//! | 18     | 11-138 zero lengths (7 extra bits) |
//!
//! Those symbols are Huffman coded in turn, by a 19-symbol code whose
//! lengths are sent as 3-bit fields in [`CODE_LENGTH_ORDER`] order.

use crate::tables::CODE_LENGTH_ORDER;
use cpro_core::bitstream::{BitReader, BitWriter};
use cpro_core::error::{CodecError, Result};
use cpro_core::traits::Codec;
use log::debug;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Maximum code length for data alphabets (15 bits).
pub const MAX_CODE_LENGTH: u8 = 15;

/// Size of the byte alphabet coded by [`HuffmanCodec`].
pub const BYTE_ALPHABET_SIZE: usize = 256;

/// Size of the code-length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// Maximum code length within the code-length alphabet.
pub const MAX_CODELEN_CODE_LENGTH: u8 = 7;

/// A node of the Huffman tree, stored in an arena and addressed by index.
#[derive(Debug, Clone, Copy)]
struct HuffmanNode {
    /// Symbol carried by a leaf; `None` for internal nodes.
    symbol: Option<u16>,
    /// Combined frequency of every leaf below this node.
    frequency: u64,
    /// Left and right child indices; `None` for leaves.
    children: Option<(usize, usize)>,
}

impl HuffmanNode {
    fn leaf(symbol: u16, frequency: u64) -> Self {
        Self {
            symbol: Some(symbol),
            frequency,
            children: None,
        }
    }

    fn internal(left: usize, right: usize, frequency: u64) -> Self {
        Self {
            symbol: None,
            frequency,
            children: Some((left, right)),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Build a Huffman tree over the non-zero frequencies.
///
/// Returns the node arena and the root index, or `None` if no symbol is used.
/// Ties are broken by arena index: leaves in symbol order, then merged nodes
/// in creation order, so the tree is fully deterministic.
fn build_tree(frequencies: &[u64]) -> Option<(Vec<HuffmanNode>, usize)> {
    let mut nodes = Vec::with_capacity(frequencies.len() * 2);
    let mut heap = BinaryHeap::new();

    for (symbol, &frequency) in frequencies.iter().enumerate() {
        if frequency > 0 {
            heap.push(Reverse((frequency, nodes.len())));
            nodes.push(HuffmanNode::leaf(symbol as u16, frequency));
        }
    }

    while heap.len() > 1 {
        let (Some(Reverse((_, left))), Some(Reverse((_, right)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let frequency = nodes[left].frequency.saturating_add(nodes[right].frequency);
        heap.push(Reverse((frequency, nodes.len())));
        nodes.push(HuffmanNode::internal(left, right, frequency));
    }

    let Reverse((_, root)) = heap.pop()?;
    Some((nodes, root))
}

/// Write the depth of every leaf into `lengths`; returns the deepest leaf.
fn leaf_depths(nodes: &[HuffmanNode], root: usize, lengths: &mut [usize]) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0usize)];

    while let Some((index, depth)) = stack.pop() {
        let node = &nodes[index];
        match node.children {
            Some((left, right)) => {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
            None => {
                debug_assert!(node.is_leaf());
                if let Some(symbol) = node.symbol {
                    lengths[usize::from(symbol)] = depth;
                    deepest = deepest.max(depth);
                }
            }
        }
    }

    deepest
}

/// Compute Huffman code lengths for an alphabet, limited to `max_length` bits.
///
/// Unused symbols get length 0. A single used symbol gets a 1-bit code.
/// If the optimal tree is deeper than `max_length`, frequencies are flattened
/// (`f -> 1 + f / 2`) and the tree is rebuilt until it fits.
pub fn build_code_lengths(frequencies: &[u64], max_length: u8) -> Vec<u8> {
    let mut lengths = vec![0u8; frequencies.len()];
    let used = frequencies.iter().filter(|&&f| f > 0).count();

    match used {
        0 => return lengths,
        1 => {
            if let Some(symbol) = frequencies.iter().position(|&f| f > 0) {
                lengths[symbol] = 1;
            }
            return lengths;
        }
        _ => {}
    }
    debug_assert!(used <= 1 << max_length, "Alphabet too large for length limit");

    let mut working = frequencies.to_vec();
    let mut depths = vec![0usize; frequencies.len()];
    loop {
        let Some((nodes, root)) = build_tree(&working) else {
            return lengths;
        };
        depths.fill(0);
        if leaf_depths(&nodes, root, &mut depths) <= usize::from(max_length) {
            for (length, &depth) in lengths.iter_mut().zip(&depths) {
                *length = depth as u8;
            }
            return lengths;
        }

        for frequency in working.iter_mut().filter(|f| **f > 0) {
            *frequency = 1 + *frequency / 2;
        }
    }
}

/// Count the codes of each length and check that they form a prefix code.
fn count_lengths(lengths: &[u8]) -> Result<[u32; MAX_CODE_LENGTH as usize + 1]> {
    let mut counts = [0u32; MAX_CODE_LENGTH as usize + 1];
    for &length in lengths {
        if length > MAX_CODE_LENGTH {
            return Err(CodecError::corrupted(
                0,
                format!("Code length {length} exceeds maximum {MAX_CODE_LENGTH}"),
            ));
        }
        counts[usize::from(length)] += 1;
    }
    counts[0] = 0;

    // Kraft inequality: each extra bit doubles the code space.
    let mut left = 1i64;
    for &count in &counts[1..] {
        left = (left << 1) - i64::from(count);
        if left < 0 {
            return Err(CodecError::corrupted(0, "Over-subscribed Huffman code"));
        }
    }

    Ok(counts)
}

/// First canonical code of each length.
fn first_codes(counts: &[u32; MAX_CODE_LENGTH as usize + 1]) -> [u32; MAX_CODE_LENGTH as usize + 1] {
    let mut first = [0u32; MAX_CODE_LENGTH as usize + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_CODE_LENGTH as usize {
        code = (code + counts[bits - 1]) << 1;
        first[bits] = code;
    }
    first
}

/// Canonical codes for encoding: `(code, length)` per symbol.
#[derive(Debug, Clone)]
pub struct HuffmanEncoder {
    codes: Vec<(u32, u8)>,
}

impl HuffmanEncoder {
    /// Assign canonical codes to a table of code lengths.
    pub fn from_lengths(lengths: &[u8]) -> Result<Self> {
        let counts = count_lengths(lengths)?;
        let mut next_code = first_codes(&counts);

        let codes = lengths
            .iter()
            .map(|&length| {
                if length == 0 {
                    return (0, 0);
                }
                let code = next_code[usize::from(length)];
                next_code[usize::from(length)] += 1;
                (code, length)
            })
            .collect();

        Ok(Self { codes })
    }

    /// Code and length of `symbol`; length 0 means the symbol has no code.
    pub fn code(&self, symbol: usize) -> (u32, u8) {
        self.codes.get(symbol).copied().unwrap_or((0, 0))
    }

    /// Write the code for `symbol`.
    #[inline]
    pub fn write_symbol(&self, writer: &mut BitWriter, symbol: usize) -> Result<()> {
        let (code, length) = self.code(symbol);
        if length == 0 {
            return Err(CodecError::corrupted(
                writer.bits_written(),
                format!("Symbol {symbol} has no code"),
            ));
        }
        writer.write_bits(code, length);
        Ok(())
    }
}

/// Table-driven canonical Huffman decoder.
///
/// For each length the decoder keeps the first canonical code, the number of
/// codes, and where those symbols start in a (length, symbol)-sorted list.
/// Decoding reads one bit at a time and stops at the first length whose code
/// range contains the accumulated value, so no tree is walked.
#[derive(Debug, Clone)]
pub struct HuffmanDecoder {
    counts: [u32; MAX_CODE_LENGTH as usize + 1],
    first_codes: [u32; MAX_CODE_LENGTH as usize + 1],
    offsets: [usize; MAX_CODE_LENGTH as usize + 1],
    symbols: Vec<u16>,
    max_length: u8,
}

impl HuffmanDecoder {
    /// Rebuild the canonical code from a table of code lengths.
    pub fn from_lengths(lengths: &[u8]) -> Result<Self> {
        let counts = count_lengths(lengths)?;
        let first_codes = first_codes(&counts);

        let mut offsets = [0usize; MAX_CODE_LENGTH as usize + 1];
        let mut total = 0usize;
        for bits in 1..=MAX_CODE_LENGTH as usize {
            offsets[bits] = total;
            total += counts[bits] as usize;
        }

        let mut symbols = vec![0u16; total];
        let mut next = offsets;
        for (symbol, &length) in lengths.iter().enumerate() {
            if length > 0 {
                symbols[next[usize::from(length)]] = symbol as u16;
                next[usize::from(length)] += 1;
            }
        }

        let max_length = lengths.iter().copied().max().unwrap_or(0);

        Ok(Self {
            counts,
            first_codes,
            offsets,
            symbols,
            max_length,
        })
    }

    /// Decode one symbol.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let start = reader.bit_position();
        let mut code = 0u32;

        for bits in 1..=usize::from(self.max_length) {
            code = (code << 1) | reader.read_bits(1)?;
            let first = self.first_codes[bits];
            if code >= first && code - first < self.counts[bits] {
                return Ok(self.symbols[self.offsets[bits] + (code - first) as usize]);
            }
        }

        Err(CodecError::corrupted(start, "Invalid Huffman code"))
    }
}

/// One code-length alphabet symbol with its extra bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LengthSymbol {
    symbol: u8,
    extra: u8,
    extra_bits: u8,
}

impl LengthSymbol {
    fn plain(symbol: u8) -> Self {
        Self {
            symbol,
            extra: 0,
            extra_bits: 0,
        }
    }

    fn repeat(symbol: u8, extra: usize, extra_bits: u8) -> Self {
        Self {
            symbol,
            extra: extra as u8,
            extra_bits,
        }
    }
}

/// Run-length code a length table with symbols 0-18.
fn run_length_lengths(lengths: &[u8]) -> Vec<LengthSymbol> {
    let mut symbols = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let length = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == length).count();
        i += run;

        let mut count = run;
        if length == 0 {
            while count >= 11 {
                let take = count.min(138);
                symbols.push(LengthSymbol::repeat(18, take - 11, 7));
                count -= take;
            }
            if count >= 3 {
                symbols.push(LengthSymbol::repeat(17, count - 3, 3));
                count = 0;
            }
        } else {
            symbols.push(LengthSymbol::plain(length));
            count -= 1;
            while count >= 3 {
                let take = count.min(6);
                symbols.push(LengthSymbol::repeat(16, take - 3, 2));
                count -= take;
            }
        }
        symbols.extend(std::iter::repeat_n(LengthSymbol::plain(length), count));
    }

    symbols
}

/// Serialize a code-length table.
///
/// The decoder must be told the alphabet size; it is not transmitted.
pub fn write_code_lengths(writer: &mut BitWriter, lengths: &[u8]) -> Result<()> {
    let symbols = run_length_lengths(lengths);

    let mut frequencies = [0u64; CODELEN_ALPHABET_SIZE];
    for entry in &symbols {
        frequencies[usize::from(entry.symbol)] += 1;
    }
    let codelen_lengths = build_code_lengths(&frequencies, MAX_CODELEN_CODE_LENGTH);
    let encoder = HuffmanEncoder::from_lengths(&codelen_lengths)?;

    // Trailing zero lengths in transmission order are left out.
    let sent = CODE_LENGTH_ORDER
        .iter()
        .rposition(|&symbol| codelen_lengths[symbol] > 0)
        .map_or(0, |last| last + 1)
        .max(4);

    writer.write_bits((sent - 4) as u32, 4);
    for &symbol in &CODE_LENGTH_ORDER[..sent] {
        writer.write_bits(u32::from(codelen_lengths[symbol]), 3);
    }

    for entry in symbols {
        encoder.write_symbol(writer, usize::from(entry.symbol))?;
        writer.write_bits(u32::from(entry.extra), entry.extra_bits);
    }

    Ok(())
}

/// Read a code-length table of `alphabet_size` entries.
pub fn read_code_lengths(reader: &mut BitReader<'_>, alphabet_size: usize) -> Result<Vec<u8>> {
    let sent = reader.read_bits(4)? as usize + 4;
    let mut codelen_lengths = [0u8; CODELEN_ALPHABET_SIZE];
    for &symbol in &CODE_LENGTH_ORDER[..sent] {
        codelen_lengths[symbol] = reader.read_bits(3)? as u8;
    }
    let decoder = HuffmanDecoder::from_lengths(&codelen_lengths)?;

    let mut lengths = Vec::with_capacity(alphabet_size);
    while lengths.len() < alphabet_size {
        let position = reader.bit_position();
        let (value, repeat) = match decoder.decode(reader)? {
            symbol @ 0..=15 => (symbol as u8, 1),
            16 => {
                let Some(&previous) = lengths.last() else {
                    return Err(CodecError::corrupted(
                        position,
                        "Repeat code at start of lengths",
                    ));
                };
                (previous, reader.read_bits(2)? as usize + 3)
            }
            17 => (0, reader.read_bits(3)? as usize + 3),
            18 => (0, reader.read_bits(7)? as usize + 11),
            symbol => {
                return Err(CodecError::corrupted(
                    position,
                    format!("Invalid code length symbol {symbol}"),
                ));
            }
        };

        if lengths.len() + repeat > alphabet_size {
            return Err(CodecError::corrupted(position, "Code length overflow"));
        }
        lengths.extend(std::iter::repeat_n(value, repeat));
    }

    Ok(lengths)
}

/// Byte-oriented canonical Huffman codec.
///
/// Payload: symbol count (64 bits), code-length table for the 256 byte
/// values, then one codeword per byte. Empty input gives an empty payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCodec;

impl HuffmanCodec {
    /// Create a Huffman codec.
    pub fn new() -> Self {
        Self
    }
}

impl Codec for HuffmanCodec {
    fn name(&self) -> &'static str {
        "huffman"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut frequencies = [0u64; BYTE_ALPHABET_SIZE];
        for &byte in input {
            frequencies[usize::from(byte)] += 1;
        }
        let lengths = build_code_lengths(&frequencies, MAX_CODE_LENGTH);
        let encoder = HuffmanEncoder::from_lengths(&lengths)?;

        let mut writer = BitWriter::with_capacity(input.len() + 64);
        writer.write_u64(input.len() as u64);
        write_code_lengths(&mut writer, &lengths)?;
        for &byte in input {
            encoder.write_symbol(&mut writer, usize::from(byte))?;
        }

        let output = writer.flush();
        debug!(
            "huffman: {} bytes -> {} bytes, {} distinct symbols",
            input.len(),
            output.len(),
            lengths.iter().filter(|&&l| l > 0).count()
        );
        Ok(output)
    }

    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>> {
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = BitReader::new(payload);
        let count = reader.read_u64()?;
        if count > max_output as u64 {
            return Err(CodecError::overflow(format!(
                "Symbol count {count} exceeds output limit {max_output}"
            )));
        }

        let lengths = read_code_lengths(&mut reader, BYTE_ALPHABET_SIZE)?;
        let decoder = HuffmanDecoder::from_lengths(&lengths)?;

        // Every codeword is at least one bit long.
        if count > reader.bits_remaining() {
            return Err(CodecError::truncated(count, reader.bits_remaining()));
        }

        let mut output = Vec::with_capacity(count as usize);
        for _ in 0..count {
            output.push(decoder.decode(&mut reader)? as u8);
        }
        reader.finish()?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kraft_sum(lengths: &[u8]) -> f64 {
        lengths
            .iter()
            .filter(|&&l| l > 0)
            .map(|&l| 2f64.powi(-i32::from(l)))
            .sum()
    }

    fn is_prefix_free(encoder: &HuffmanEncoder, alphabet: usize) -> bool {
        let codes: Vec<(u32, u8)> = (0..alphabet)
            .map(|s| encoder.code(s))
            .filter(|&(_, len)| len > 0)
            .collect();
        for (i, &(a, la)) in codes.iter().enumerate() {
            for (j, &(b, lb)) in codes.iter().enumerate() {
                if i != j && la <= lb && (b >> (lb - la)) == a {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_build_code_lengths_ordering() {
        let lengths = build_code_lengths(&[100, 50, 25, 25], MAX_CODE_LENGTH);
        assert_eq!(lengths, vec![1, 2, 3, 3]);
        assert_eq!(kraft_sum(&lengths), 1.0);
    }

    #[test]
    fn test_build_code_lengths_degenerate() {
        assert_eq!(build_code_lengths(&[0, 0, 0], 15), vec![0, 0, 0]);
        assert_eq!(build_code_lengths(&[0, 7, 0], 15), vec![0, 1, 0]);
    }

    #[test]
    fn test_build_code_lengths_respects_limit() {
        // Fibonacci frequencies produce a maximally skewed tree.
        let mut frequencies = vec![1u64, 1];
        while frequencies.len() < 30 {
            let n = frequencies.len();
            frequencies.push(frequencies[n - 1] + frequencies[n - 2]);
        }
        let unlimited = build_code_lengths(&frequencies, 32);
        assert!(unlimited.iter().any(|&l| l > 15));

        let lengths = build_code_lengths(&frequencies, 15);
        assert!(lengths.iter().all(|&l| (1..=15).contains(&l)));
        assert_eq!(kraft_sum(&lengths), 1.0);
    }

    #[test]
    fn test_canonical_codes() {
        // A=1, B=2, C=3, D=3 -> 0, 10, 110, 111
        let encoder = HuffmanEncoder::from_lengths(&[1, 2, 3, 3]).unwrap();
        assert_eq!(encoder.code(0), (0b0, 1));
        assert_eq!(encoder.code(1), (0b10, 2));
        assert_eq!(encoder.code(2), (0b110, 3));
        assert_eq!(encoder.code(3), (0b111, 3));
    }

    #[test]
    fn test_canonical_codes_prefix_free() {
        let frequencies: Vec<u64> = (0..256u64).map(|i| (i * 7919) % 1000 + 1).collect();
        let lengths = build_code_lengths(&frequencies, MAX_CODE_LENGTH);
        assert_eq!(kraft_sum(&lengths), 1.0);

        let encoder = HuffmanEncoder::from_lengths(&lengths).unwrap();
        assert!(is_prefix_free(&encoder, 256));
    }

    #[test]
    fn test_over_subscribed_rejected() {
        assert!(matches!(
            HuffmanDecoder::from_lengths(&[1, 1, 1]),
            Err(CodecError::CorruptedData { .. })
        ));
        assert!(HuffmanEncoder::from_lengths(&[16, 1]).is_err());
    }

    #[test]
    fn test_decoder_simple() {
        // A=0, B=10, C=11
        let decoder = HuffmanDecoder::from_lengths(&[1, 2, 2]).unwrap();

        // A B C A -> 0 10 11 0, padded
        let data = [0b0101_1000u8];
        let mut reader = BitReader::new(&data);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 0);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 1);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 2);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 0);
    }

    #[test]
    fn test_decoder_rejects_unassigned_code() {
        // Single symbol: only code 0 exists.
        let decoder = HuffmanDecoder::from_lengths(&[0, 1]).unwrap();
        let data = [0b0100_0000u8];
        let mut reader = BitReader::new(&data);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 1);
        assert!(matches!(
            decoder.decode(&mut reader),
            Err(CodecError::CorruptedData { offset: 1, .. })
        ));
    }

    #[test]
    fn test_run_length_lengths() {
        let mut lengths = vec![0u8; 150];
        lengths.extend([8; 8]);
        lengths.extend([0, 0, 5]);

        let symbols: Vec<u8> = run_length_lengths(&lengths)
            .iter()
            .map(|s| s.symbol)
            .collect();
        // 138 zeros, 12 zeros, 8, 6 repeats, 1 repeat, 0, 0, 5
        assert_eq!(symbols, vec![18, 18, 8, 16, 8, 0, 0, 5]);
    }

    #[test]
    fn test_code_length_table_roundtrip() {
        let mut lengths = vec![0u8; 286];
        for (i, length) in lengths.iter_mut().enumerate().take(200).step_by(3) {
            *length = (i % 9 + 4) as u8;
        }
        lengths[256] = 7;

        let mut writer = BitWriter::new();
        write_code_lengths(&mut writer, &lengths).unwrap();
        let data = writer.flush();

        let mut reader = BitReader::new(&data);
        assert_eq!(read_code_lengths(&mut reader, 286).unwrap(), lengths);
    }

    #[test]
    fn test_codec_roundtrip() {
        let codec = HuffmanCodec::new();
        let input = b"this is an example of a huffman tree";
        let payload = codec.compress(input).unwrap();
        assert!(payload.len() < input.len() + 40);
        assert_eq!(codec.decompress(&payload, input.len()).unwrap(), input);
    }

    #[test]
    fn test_codec_single_symbol() {
        let codec = HuffmanCodec::new();
        let input = vec![b'z'; 1000];
        let payload = codec.compress(&input).unwrap();
        // One bit per symbol plus the tables.
        assert!(payload.len() < 1000 / 8 + 32);
        assert_eq!(codec.decompress(&payload, usize::MAX).unwrap(), input);
    }

    #[test]
    fn test_codec_empty() {
        let codec = HuffmanCodec::new();
        assert!(codec.compress(b"").unwrap().is_empty());
        assert!(codec.decompress(b"", 0).unwrap().is_empty());
    }

    #[test]
    fn test_codec_output_limit() {
        let codec = HuffmanCodec::new();
        let payload = codec.compress(b"abcdef").unwrap();
        assert!(matches!(
            codec.decompress(&payload, 5),
            Err(CodecError::Overflow { .. })
        ));
    }

    #[test]
    fn test_codec_truncated_payload() {
        let codec = HuffmanCodec::new();
        let payload = codec.compress(b"truncate me, please").unwrap();
        let err = codec
            .decompress(&payload[..payload.len() - 3], usize::MAX)
            .unwrap_err();
        assert!(err.is_payload_damage());
    }
}
