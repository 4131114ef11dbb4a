//! LZ77 sliding-window match finding.
//!
//! For every position the encoder looks back up to `window_size` bytes for
//! the longest earlier occurrence of the upcoming bytes. The search is exact:
//! every earlier position with the same 3-byte prefix is visited through hash
//! chains, nearest first, and a candidate only replaces the current best when
//! it is strictly longer. The chosen match is therefore the longest one, and
//! among equally long ones the nearest. Parsing is greedy.
//!
//! Matches may overlap the bytes they produce (distance < length), which is
//! how runs are coded, but never reach the current position or beyond.

use cpro_core::bitstream::{BitReader, BitWriter};
use cpro_core::error::{CodecError, Result};
use cpro_core::traits::Codec;
use log::debug;

/// Largest supported window (32KB).
pub const MAX_WINDOW_SIZE: usize = 32768;

/// Smallest supported minimum match length.
pub const MIN_MATCH: usize = 3;

/// Largest supported maximum match length.
pub const MAX_MATCH: usize = 258;

/// Bits of the 3-byte prefix hash.
const HASH_BITS: u32 = 15;

/// Size of the hash table.
const HASH_SIZE: usize = 1 << HASH_BITS;

/// Chain terminator.
const NO_POSITION: usize = usize::MAX;

/// LZ77 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lz77Config {
    /// How far back a match may start (1-32768).
    pub window_size: usize,
    /// Shortest match worth emitting (at least 3).
    pub min_match: usize,
    /// Longest match to emit (at most 258).
    pub max_match: usize,
}

impl Default for Lz77Config {
    fn default() -> Self {
        Self {
            window_size: MAX_WINDOW_SIZE,
            min_match: MIN_MATCH,
            max_match: MAX_MATCH,
        }
    }
}

impl Lz77Config {
    /// Create a configuration.
    pub fn new(window_size: usize, min_match: usize, max_match: usize) -> Self {
        Self {
            window_size,
            min_match,
            max_match,
        }
    }

    /// Set the window size.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the minimum match length.
    pub fn with_min_match(mut self, min_match: usize) -> Self {
        self.min_match = min_match;
        self
    }

    /// Set the maximum match length.
    pub fn with_max_match(mut self, max_match: usize) -> Self {
        self.max_match = max_match;
        self
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WINDOW_SIZE).contains(&self.window_size) {
            return Err(CodecError::invalid_config(format!(
                "window size {} outside 1..={MAX_WINDOW_SIZE}",
                self.window_size
            )));
        }
        if self.min_match < MIN_MATCH {
            return Err(CodecError::invalid_config(format!(
                "minimum match {} below {MIN_MATCH}",
                self.min_match
            )));
        }
        if self.max_match > MAX_MATCH {
            return Err(CodecError::invalid_config(format!(
                "maximum match {} above {MAX_MATCH}",
                self.max_match
            )));
        }
        if self.min_match > self.max_match {
            return Err(CodecError::invalid_config(format!(
                "minimum match {} exceeds maximum match {}",
                self.min_match, self.max_match
            )));
        }
        Ok(())
    }
}

/// A symbol of the LZ77 stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Symbol {
    /// A literal byte.
    Literal(u8),
    /// A back-reference to previously produced data.
    Match {
        /// Distance back from the current position (1-32768).
        distance: u16,
        /// Number of bytes to copy (3-258).
        length: u16,
    },
}

impl Lz77Symbol {
    /// Number of bytes this symbol expands to.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Literal(_) => 1,
            Self::Match { length, .. } => usize::from(*length),
        }
    }
}

/// A candidate match found during the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Distance back from the current position.
    pub distance: usize,
    /// Match length in bytes.
    pub length: usize,
}

/// Hash chains over 3-byte prefixes of one input buffer.
struct MatchFinder<'a> {
    input: &'a [u8],
    /// Most recent position for each hash.
    head: Vec<usize>,
    /// Previous position with the same hash, per position.
    prev: Vec<usize>,
}

impl<'a> MatchFinder<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            head: vec![NO_POSITION; HASH_SIZE],
            prev: vec![NO_POSITION; input.len()],
        }
    }

    #[inline(always)]
    fn hash(&self, pos: usize) -> usize {
        let key = (u32::from(self.input[pos]) << 16)
            | (u32::from(self.input[pos + 1]) << 8)
            | u32::from(self.input[pos + 2]);
        (key.wrapping_mul(2654435761) >> (32 - HASH_BITS)) as usize
    }

    /// Record `pos` as the newest position for its prefix.
    fn insert(&mut self, pos: usize) {
        if pos + MIN_MATCH <= self.input.len() {
            let h = self.hash(pos);
            self.prev[pos] = self.head[h];
            self.head[h] = pos;
        }
    }

    /// Longest, then nearest, match for `pos` among inserted positions.
    fn find(&self, pos: usize, config: &Lz77Config) -> Option<Match> {
        let limit = config.max_match.min(self.input.len() - pos);
        if limit < config.min_match {
            return None;
        }

        let target = &self.input[pos..pos + limit];
        let mut best = Match {
            distance: 0,
            length: 0,
        };
        let mut candidate = self.head[self.hash(pos)];

        while candidate != NO_POSITION {
            let distance = pos - candidate;
            if distance > config.window_size {
                break;
            }

            let length = target
                .iter()
                .zip(&self.input[candidate..])
                .take_while(|(a, b)| a == b)
                .count();

            if length > best.length {
                best = Match { distance, length };
                if length == limit {
                    break;
                }
            }
            candidate = self.prev[candidate];
        }

        (best.length >= config.min_match).then_some(best)
    }
}

/// Greedy LZ77 parser.
#[derive(Debug, Clone)]
pub struct Lz77Encoder {
    config: Lz77Config,
}

impl Default for Lz77Encoder {
    fn default() -> Self {
        Self {
            config: Lz77Config::default(),
        }
    }
}

impl Lz77Encoder {
    /// Create an encoder, rejecting out-of-range parameters.
    pub fn new(config: Lz77Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The encoder's parameters.
    pub fn config(&self) -> &Lz77Config {
        &self.config
    }

    /// Split `input` into literals and matches.
    pub fn tokenize(&self, input: &[u8]) -> Vec<Lz77Symbol> {
        let mut finder = MatchFinder::new(input);
        let mut symbols = Vec::with_capacity(input.len() / 2);
        let mut pos = 0;

        while pos < input.len() {
            match finder.find(pos, &self.config) {
                Some(found) => {
                    symbols.push(Lz77Symbol::Match {
                        distance: found.distance as u16,
                        length: found.length as u16,
                    });
                    for p in pos..pos + found.length {
                        finder.insert(p);
                    }
                    pos += found.length;
                }
                None => {
                    symbols.push(Lz77Symbol::Literal(input[pos]));
                    finder.insert(pos);
                    pos += 1;
                }
            }
        }

        symbols
    }
}

/// Number of bits needed to represent `value`.
fn bit_width(value: usize) -> u8 {
    (usize::BITS - value.leading_zeros()) as u8
}

/// Standalone LZ77 codec with fixed-width fields.
///
/// Payload: symbol count (64 bits), distance field width (5 bits), length
/// field width (4 bits), minimum match (9 bits), then per symbol a flag bit
/// followed by either the literal byte or `distance - 1` and
/// `length - min_match` in their field widths.
#[derive(Debug, Clone, Default)]
pub struct Lz77Codec {
    encoder: Lz77Encoder,
}

impl Lz77Codec {
    /// Create a codec, rejecting out-of-range parameters.
    pub fn new(config: Lz77Config) -> Result<Self> {
        Ok(Self {
            encoder: Lz77Encoder::new(config)?,
        })
    }
}

impl Codec for Lz77Codec {
    fn name(&self) -> &'static str {
        "lz77"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let config = self.encoder.config();
        let symbols = self.encoder.tokenize(input);

        let distance_bits = bit_width(config.window_size - 1);
        let length_bits = bit_width(config.max_match - config.min_match);

        let mut writer = BitWriter::with_capacity(input.len() + 16);
        writer.write_u64(symbols.len() as u64);
        writer.write_bits(u32::from(distance_bits), 5);
        writer.write_bits(u32::from(length_bits), 4);
        writer.write_bits(config.min_match as u32, 9);

        for symbol in &symbols {
            match *symbol {
                Lz77Symbol::Literal(byte) => {
                    writer.write_bit(false);
                    writer.write_bits(u32::from(byte), 8);
                }
                Lz77Symbol::Match { distance, length } => {
                    writer.write_bit(true);
                    writer.write_bits(u32::from(distance) - 1, distance_bits);
                    writer.write_bits(
                        u32::from(length) - config.min_match as u32,
                        length_bits,
                    );
                }
            }
        }

        let output = writer.flush();
        debug!(
            "lz77: {} bytes -> {} symbols, {} bytes",
            input.len(),
            symbols.len(),
            output.len()
        );
        Ok(output)
    }

    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(payload);
        let count = reader.read_u64()?;
        let distance_bits = reader.read_bits(5)? as u8;
        let length_bits = reader.read_bits(4)? as u8;
        let min_match = reader.read_bits(9)? as usize;

        if distance_bits > 15 || length_bits > 8 || min_match < MIN_MATCH {
            return Err(CodecError::corrupted(
                reader.bit_position(),
                format!(
                    "Invalid field widths: distance {distance_bits}, length {length_bits}, minimum match {min_match}"
                ),
            ));
        }
        // Every symbol yields at least one byte and takes at least one bit.
        if count > max_output as u64 {
            return Err(CodecError::overflow(format!(
                "Symbol count {count} exceeds output limit {max_output}"
            )));
        }
        if count > reader.bits_remaining() {
            return Err(CodecError::truncated(count, reader.bits_remaining()));
        }

        let mut output = Vec::with_capacity((count as usize).min(max_output));
        for _ in 0..count {
            let position = reader.bit_position();
            if !reader.read_bit()? {
                let byte = reader.read_bits(8)? as u8;
                if output.len() >= max_output {
                    return Err(CodecError::overflow("Output exceeds size limit"));
                }
                output.push(byte);
                continue;
            }

            let distance = reader.read_bits(distance_bits)? as usize + 1;
            let length = reader.read_bits(length_bits)? as usize + min_match;
            if distance > output.len() {
                return Err(CodecError::corrupted(
                    position,
                    format!(
                        "Distance {distance} reaches before start of output ({} bytes)",
                        output.len()
                    ),
                ));
            }
            if length > max_output - output.len() {
                return Err(CodecError::overflow("Output exceeds size limit"));
            }
            copy_match(&mut output, distance, length);
        }
        reader.finish()?;

        Ok(output)
    }
}

/// Append `length` bytes copied from `distance` bytes back; overlap repeats.
pub(crate) fn copy_match(output: &mut Vec<u8>, distance: usize, length: usize) {
    let start = output.len() - distance;
    for i in 0..length {
        let byte = output[start + i];
        output.push(byte);
    }
}
