//! Run-Length Encoding.
//!
//! Bytes pass through unchanged until `threshold` equal bytes in a row have
//! been written. Those are followed by a count field, `count_bits` wide,
//! holding how many more copies of the byte follow. Runs shorter than the
//! threshold cost nothing extra, so non-repetitive data does not expand
//! beyond the two-byte prelude. Runs longer than the widest count are split.
//!
//! Payload layout (MSB-first):
//!
//! ```text
//! threshold (8 bits) | count_bits (8 bits) | bytes and count fields ...
//! ```

use cpro_core::bitstream::{BitReader, BitWriter};
use cpro_core::error::{CodecError, Result};
use cpro_core::traits::Codec;
use log::debug;

/// Smallest accepted run threshold.
pub const MIN_THRESHOLD: u8 = 2;

/// Widest accepted count field.
pub const MAX_COUNT_BITS: u8 = 16;

/// Run-length parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RleConfig {
    /// Equal bytes written before a count field follows (2-255).
    pub threshold: u8,
    /// Width of the count field in bits (1-16).
    pub count_bits: u8,
}

impl Default for RleConfig {
    fn default() -> Self {
        Self {
            threshold: 4,
            count_bits: 8,
        }
    }
}

impl RleConfig {
    /// Create a configuration.
    pub fn new(threshold: u8, count_bits: u8) -> Self {
        Self {
            threshold,
            count_bits,
        }
    }

    /// Set the run threshold.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the count field width.
    pub fn with_count_bits(mut self, count_bits: u8) -> Self {
        self.count_bits = count_bits;
        self
    }

    /// Largest number of extra repeats one count field can hold.
    pub fn max_count(&self) -> usize {
        (1usize << self.count_bits) - 1
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.threshold < MIN_THRESHOLD {
            return Err(CodecError::invalid_config(format!(
                "run threshold {} below {MIN_THRESHOLD}",
                self.threshold
            )));
        }
        if !(1..=MAX_COUNT_BITS).contains(&self.count_bits) {
            return Err(CodecError::invalid_config(format!(
                "count width {} outside 1..={MAX_COUNT_BITS}",
                self.count_bits
            )));
        }
        Ok(())
    }
}

/// A unit of the run-length stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RleSymbol {
    /// A byte passed through as is.
    Literal(u8),
    /// `count` copies of `byte`, with `count >= threshold`.
    Run {
        /// Repeated byte.
        byte: u8,
        /// Total length of the run.
        count: usize,
    },
}

/// Split `data` into literals and runs no longer than one count field allows.
pub fn tokenize(data: &[u8], config: &RleConfig) -> Vec<RleSymbol> {
    let threshold = usize::from(config.threshold);
    let longest = threshold + config.max_count();
    let mut symbols = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        let mut run = data[i..].iter().take_while(|&&b| b == byte).count();
        i += run;

        while run >= threshold {
            let count = run.min(longest);
            symbols.push(RleSymbol::Run { byte, count });
            run -= count;
        }
        symbols.extend(std::iter::repeat_n(RleSymbol::Literal(byte), run));
    }

    symbols
}

/// Serialize symbols, prelude included.
///
/// A run longer than one count field can express is rejected with
/// [`CodecError::Overflow`]; a run shorter than the threshold with
/// [`CodecError::InvalidConfiguration`].
pub fn encode_symbols(symbols: &[RleSymbol], config: &RleConfig) -> Result<Vec<u8>> {
    config.validate()?;
    let threshold = usize::from(config.threshold);

    let mut writer = BitWriter::with_capacity(symbols.len() + 2);
    writer.write_bits(u32::from(config.threshold), 8);
    writer.write_bits(u32::from(config.count_bits), 8);

    for symbol in symbols {
        match *symbol {
            RleSymbol::Literal(byte) => writer.write_bits(u32::from(byte), 8),
            RleSymbol::Run { byte, count } => {
                if count < threshold {
                    return Err(CodecError::invalid_config(format!(
                        "run of {count} is shorter than threshold {threshold}"
                    )));
                }
                let extra = count - threshold;
                if extra > config.max_count() {
                    return Err(CodecError::overflow(format!(
                        "run of {count} needs {extra} extra repeats, {}-bit count holds {}",
                        config.count_bits,
                        config.max_count()
                    )));
                }
                for _ in 0..threshold {
                    writer.write_bits(u32::from(byte), 8);
                }
                writer.write_bits(extra as u32, config.count_bits);
            }
        }
    }

    Ok(writer.flush())
}

/// Run-length codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct RleCodec {
    config: RleConfig,
}

impl RleCodec {
    /// Create a codec, rejecting out-of-range parameters.
    pub fn new(config: RleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The codec's parameters.
    pub fn config(&self) -> &RleConfig {
        &self.config
    }
}

impl Codec for RleCodec {
    fn name(&self) -> &'static str {
        "rle"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let symbols = tokenize(input, &self.config);
        let output = encode_symbols(&symbols, &self.config)?;
        debug!("rle: {} bytes -> {} bytes", input.len(), output.len());
        Ok(output)
    }

    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(payload);
        let threshold = reader.read_bits(8)? as usize;
        let count_bits = reader.read_bits(8)? as u8;
        if threshold < usize::from(MIN_THRESHOLD) || !(1..=MAX_COUNT_BITS).contains(&count_bits) {
            return Err(CodecError::corrupted(
                0,
                format!("Invalid prelude: threshold {threshold}, count width {count_bits}"),
            ));
        }

        let mut output = Vec::with_capacity((payload.len() * 2).min(max_output));
        let mut previous = None;
        let mut run = 0usize;

        while reader.bits_remaining() >= 8 {
            let byte = reader.read_bits(8)? as u8;
            if output.len() >= max_output {
                return Err(CodecError::overflow("Output exceeds size limit"));
            }
            output.push(byte);

            if previous == Some(byte) {
                run += 1;
            } else {
                previous = Some(byte);
                run = 1;
            }

            if run == threshold {
                let extra = reader.read_bits(count_bits)? as usize;
                if extra > max_output - output.len() {
                    return Err(CodecError::overflow("Output exceeds size limit"));
                }
                output.resize(output.len() + extra, byte);
                previous = None;
                run = 0;
            }
        }
        reader.finish()?;

        Ok(output)
    }
}
