//! Block-sorting codec: BWT, then Move-to-Front, then run-length coding,
//! then an optional Huffman stage.
//!
//! Input is cut into blocks of at most `block_size` bytes so suffix sorting
//! memory stays bounded. Each block is self-contained:
//!
//! ```text
//! raw length (32) | primary index (32) | flags (8) | stage length (32) | stage bytes
//! ```
//!
//! Flag bit 0 records that the run-length output went through the Huffman
//! stage. That stage is kept only when it is smaller. All other flag bits
//! must be zero.

use crate::rle::{RleCodec, RleConfig};
use crate::{bwt, mtf};
use cpro_core::bitstream::{BitReader, BitWriter};
use cpro_core::error::{CodecError, Result};
use cpro_core::traits::Codec;
use cpro_deflate::HuffmanCodec;
use log::{debug, trace};

/// Default block size (1 MiB).
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20;

/// Flag: the stage bytes are a Huffman payload.
const FLAG_ENTROPY: u8 = 0x01;

/// Block-sorting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BwtConfig {
    /// Largest block handed to the suffix sorter.
    pub block_size: usize,
    /// Try a Huffman stage after run-length coding.
    pub entropy_stage: bool,
    /// Run-length parameters.
    pub rle: RleConfig,
}

impl Default for BwtConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            entropy_stage: true,
            rle: RleConfig::default(),
        }
    }
}

impl BwtConfig {
    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Enable or disable the Huffman stage.
    pub fn with_entropy_stage(mut self, entropy_stage: bool) -> Self {
        self.entropy_stage = entropy_stage;
        self
    }

    /// Set the run-length parameters.
    pub fn with_rle(mut self, rle: RleConfig) -> Self {
        self.rle = rle;
        self
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size as u64 > u64::from(u32::MAX) {
            return Err(CodecError::invalid_config(format!(
                "block size {} outside 1..={}",
                self.block_size,
                u32::MAX
            )));
        }
        self.rle.validate()
    }
}

/// Block-sorting compressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct BwtCodec {
    config: BwtConfig,
    rle: RleCodec,
}

impl BwtCodec {
    /// Create a codec, rejecting out-of-range parameters.
    pub fn new(config: BwtConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rle: RleCodec::new(config.rle)?,
        })
    }

    /// The codec's parameters.
    pub fn config(&self) -> &BwtConfig {
        &self.config
    }

    fn write_block(&self, writer: &mut BitWriter, block: &[u8]) -> Result<()> {
        let (transformed, primary) = bwt::transform(block);
        let ranks = mtf::transform(&transformed);
        let mut stage = self.rle.compress(&ranks)?;
        let mut flags = 0u8;

        if self.config.entropy_stage {
            let coded = HuffmanCodec::new().compress(&stage)?;
            if coded.len() < stage.len() {
                stage = coded;
                flags |= FLAG_ENTROPY;
            }
        }

        trace!(
            "bwt block: {} bytes, primary {}, stage {} bytes, flags {:#04x}",
            block.len(),
            primary,
            stage.len(),
            flags
        );

        writer.write_bits(block.len() as u32, 32);
        writer.write_bits(primary, 32);
        writer.write_bits(u32::from(flags), 8);
        writer.write_bits(stage.len() as u32, 32);
        writer.write_bytes(&stage);
        Ok(())
    }

    fn read_block(reader: &mut BitReader<'_>, max_len: usize) -> Result<Vec<u8>> {
        let start = reader.bit_position();
        let raw_len = reader.read_bits(32)? as usize;
        let primary = reader.read_bits(32)?;
        let flags = reader.read_bits(8)? as u8;
        let stage_len = reader.read_bits(32)? as usize;

        if raw_len == 0 {
            return Err(CodecError::corrupted(start, "Empty block"));
        }
        if raw_len > max_len {
            return Err(CodecError::overflow(format!(
                "Block of {raw_len} bytes exceeds remaining output limit {max_len}"
            )));
        }
        if flags & !FLAG_ENTROPY != 0 {
            return Err(CodecError::corrupted(
                start,
                format!("Unknown block flags {flags:#04x}"),
            ));
        }

        let stage = reader.read_bytes(stage_len)?;
        let rle_payload = if flags & FLAG_ENTROPY != 0 {
            HuffmanCodec::new().decompress(&stage, usize::MAX)?
        } else {
            stage
        };

        // The run-length prelude in the block carries its own parameters.
        let ranks = RleCodec::default().decompress(&rle_payload, raw_len)?;
        if ranks.len() != raw_len {
            return Err(CodecError::corrupted(
                start,
                format!("Block decoded to {} bytes, expected {raw_len}", ranks.len()),
            ));
        }

        let transformed = mtf::inverse_transform(&ranks);
        bwt::inverse_transform(&transformed, primary)
    }
}

impl Codec for BwtCodec {
    fn name(&self) -> &'static str {
        "bwt"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut writer = BitWriter::with_capacity(input.len() / 2 + 16);
        for block in input.chunks(self.config.block_size) {
            self.write_block(&mut writer, block)?;
        }

        let output = writer.flush();
        debug!(
            "bwt: {} bytes in {} blocks -> {} bytes",
            input.len(),
            input.len().div_ceil(self.config.block_size),
            output.len()
        );
        Ok(output)
    }

    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(payload);
        let mut output = Vec::new();

        while !reader.is_empty() {
            let block = Self::read_block(&mut reader, max_output - output.len())?;
            output.extend_from_slice(&block);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_banana() {
        let codec = BwtCodec::default();
        let payload = codec.compress(b"banana").unwrap();
        assert_eq!(codec.decompress(&payload, 6).unwrap(), b"banana");
    }

    #[test]
    fn test_banana_pipeline_is_deterministic() {
        let codec = BwtCodec::new(BwtConfig::default().with_entropy_stage(false)).unwrap();
        let payload = codec.compress(b"banana").unwrap();

        let mut expected = vec![
            0, 0, 0, 6, // raw length
            0, 0, 0, 3, // primary index
            0, // flags
            0, 0, 0, 8, // stage length
            4, 8, // run-length prelude
        ];
        expected.extend_from_slice(&[110, 0, 99, 99, 0, 0]);
        assert_eq!(payload, expected);
        assert_eq!(codec.decompress(&payload, 6).unwrap(), b"banana");
    }

    #[test]
    fn test_empty() {
        let codec = BwtCodec::default();
        let payload = codec.compress(b"").unwrap();
        assert!(payload.is_empty());
        assert!(codec.decompress(&payload, 0).unwrap().is_empty());
    }

    #[test]
    fn test_multiple_blocks() {
        let codec = BwtCodec::new(BwtConfig::default().with_block_size(100)).unwrap();
        let input: Vec<u8> = (0..1050u32).map(|i| b"abracadabra"[(i % 11) as usize]).collect();
        let payload = codec.compress(&input).unwrap();
        assert_eq!(codec.decompress(&payload, input.len()).unwrap(), input);
    }

    #[test]
    fn test_entropy_stage_used_on_text() {
        let codec = BwtCodec::default();
        let input = b"she sells sea shells by the sea shore, ".repeat(50);
        let payload = codec.compress(&input).unwrap();
        assert_eq!(payload[8] & FLAG_ENTROPY, FLAG_ENTROPY);
        assert!(payload.len() < input.len() / 4);
        assert_eq!(codec.decompress(&payload, input.len()).unwrap(), input);
    }

    #[test]
    fn test_unknown_flags_rejected() {
        let codec = BwtCodec::new(BwtConfig::default().with_entropy_stage(false)).unwrap();
        let mut payload = codec.compress(b"banana").unwrap();
        payload[8] |= 0x80;
        assert!(matches!(
            codec.decompress(&payload, 6),
            Err(CodecError::CorruptedData { .. })
        ));
    }

    #[test]
    fn test_output_limit() {
        let codec = BwtCodec::default();
        let payload = codec.compress(b"banana").unwrap();
        assert!(matches!(
            codec.decompress(&payload, 5),
            Err(CodecError::Overflow { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        assert!(BwtCodec::new(BwtConfig::default().with_block_size(0)).is_err());
        assert!(BwtCodec::new(BwtConfig::default().with_rle(RleConfig::new(0, 8))).is_err());
    }
}
