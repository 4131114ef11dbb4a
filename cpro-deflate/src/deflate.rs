//! Deflate-style codec: LZ77 symbols coded with two canonical Huffman tables.
//!
//! Literals and match lengths share one alphabet (0-255 literals, 256 end
//! of block, 257-285 length codes); distances use a second alphabet of 30
//! codes. Lengths and distances carry raw extra bits after their code, as in
//! RFC 1951.
//!
//! Payload layout (MSB-first):
//!
//! ```text
//! literal/length code lengths (286 entries)
//! distance code lengths (30 entries)
//! symbols ... end-of-block
//! ```

use crate::huffman::{
    HuffmanDecoder, HuffmanEncoder, MAX_CODE_LENGTH, build_code_lengths, read_code_lengths,
    write_code_lengths,
};
use crate::lz77::{Lz77Config, Lz77Encoder, Lz77Symbol, copy_match};
use crate::tables::{
    DISTANCE_ALPHABET_SIZE, DISTANCE_EXTRA_BITS, END_OF_BLOCK, FIRST_LENGTH_CODE,
    LENGTH_EXTRA_BITS, LITERAL_COUNT, LITLEN_ALPHABET_SIZE, MAX_LENGTH, MAX_LENGTH_CODE,
    decode_distance, decode_length, distance_to_code,
    length_to_code,
};
use cpro_core::bitstream::{BitReader, BitWriter};
use cpro_core::error::{CodecError, Result};
use cpro_core::traits::Codec;
use log::debug;

/// Deflate-style compressor.
#[derive(Debug, Clone, Default)]
pub struct DeflateCodec {
    lz77: Lz77Encoder,
}

impl DeflateCodec {
    /// Create a codec whose match search uses `config`.
    pub fn new(config: Lz77Config) -> Result<Self> {
        Ok(Self {
            lz77: Lz77Encoder::new(config)?,
        })
    }

    /// Count how often each literal/length and distance code is used.
    fn count_frequencies(
        symbols: &[Lz77Symbol],
    ) -> ([u64; LITLEN_ALPHABET_SIZE], [u64; DISTANCE_ALPHABET_SIZE]) {
        let mut litlen = [0u64; LITLEN_ALPHABET_SIZE];
        let mut distance = [0u64; DISTANCE_ALPHABET_SIZE];

        for symbol in symbols {
            match *symbol {
                Lz77Symbol::Literal(byte) => litlen[usize::from(byte)] += 1,
                Lz77Symbol::Match {
                    distance: dist,
                    length,
                } => {
                    let (length_code, _, _) = length_to_code(length);
                    litlen[usize::from(length_code)] += 1;
                    let (distance_code, _, _) = distance_to_code(dist);
                    distance[usize::from(distance_code)] += 1;
                }
            }
        }
        litlen[usize::from(END_OF_BLOCK)] += 1;

        (litlen, distance)
    }

    fn write_symbols(
        writer: &mut BitWriter,
        symbols: &[Lz77Symbol],
        litlen: &HuffmanEncoder,
        distance: &HuffmanEncoder,
    ) -> Result<()> {
        for symbol in symbols {
            match *symbol {
                Lz77Symbol::Literal(byte) => litlen.write_symbol(writer, usize::from(byte))?,
                Lz77Symbol::Match {
                    distance: dist,
                    length,
                } => {
                    let (code, extra_bits, extra) = length_to_code(length);
                    litlen.write_symbol(writer, usize::from(code))?;
                    writer.write_bits(u32::from(extra), extra_bits);

                    let (code, extra_bits, extra) = distance_to_code(dist);
                    distance.write_symbol(writer, usize::from(code))?;
                    writer.write_bits(u32::from(extra), extra_bits);
                }
            }
        }
        litlen.write_symbol(writer, usize::from(END_OF_BLOCK))
    }
}

impl Codec for DeflateCodec {
    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let symbols = self.lz77.tokenize(input);
        let (litlen_freq, distance_freq) = Self::count_frequencies(&symbols);

        let litlen_lengths = build_code_lengths(&litlen_freq, MAX_CODE_LENGTH);
        let distance_lengths = build_code_lengths(&distance_freq, MAX_CODE_LENGTH);
        let litlen = HuffmanEncoder::from_lengths(&litlen_lengths)?;
        let distance = HuffmanEncoder::from_lengths(&distance_lengths)?;

        let mut writer = BitWriter::with_capacity(input.len() / 2 + 64);
        write_code_lengths(&mut writer, &litlen_lengths)?;
        write_code_lengths(&mut writer, &distance_lengths)?;
        Self::write_symbols(&mut writer, &symbols, &litlen, &distance)?;

        let output = writer.flush();
        debug!(
            "deflate: {} bytes -> {} symbols, {} bytes",
            input.len(),
            symbols.len(),
            output.len()
        );
        Ok(output)
    }

    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(payload);

        let litlen_lengths = read_code_lengths(&mut reader, LITLEN_ALPHABET_SIZE)?;
        let distance_lengths = read_code_lengths(&mut reader, DISTANCE_ALPHABET_SIZE)?;
        let litlen = HuffmanDecoder::from_lengths(&litlen_lengths)?;
        let distance = HuffmanDecoder::from_lengths(&distance_lengths)?;

        let mut output = Vec::new();
        loop {
            let position = reader.bit_position();
            let code = litlen.decode(&mut reader)?;

            if usize::from(code) < LITERAL_COUNT {
                if output.len() >= max_output {
                    return Err(CodecError::overflow("Output exceeds size limit"));
                }
                output.push(code as u8);
                continue;
            }
            if code == END_OF_BLOCK {
                break;
            }

            let index = usize::from(code - FIRST_LENGTH_CODE);
            let extra = reader.read_bits(LENGTH_EXTRA_BITS[index])? as u16;
            let length = usize::from(decode_length(code, extra));
            // Only code 285 may produce the maximum length.
            if length == usize::from(MAX_LENGTH) && code != MAX_LENGTH_CODE {
                return Err(CodecError::corrupted(
                    position,
                    format!("Length code {code} with extra {extra} exceeds its range"),
                ));
            }

            let distance_code = distance.decode(&mut reader)?;
            let extra = reader.read_bits(DISTANCE_EXTRA_BITS[usize::from(distance_code)])? as u16;
            let dist = usize::from(decode_distance(distance_code, extra));

            if dist > output.len() {
                return Err(CodecError::corrupted(
                    position,
                    format!(
                        "Distance {dist} reaches before start of output ({} bytes)",
                        output.len()
                    ),
                ));
            }
            if length > max_output - output.len() {
                return Err(CodecError::overflow("Output exceeds size limit"));
            }
            copy_match(&mut output, dist, length);
        }
        reader.finish()?;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_text() {
        let codec = DeflateCodec::default();
        let input = b"It was the best of times, it was the worst of times, it was the age of wisdom";
        let payload = codec.compress(input).unwrap();
        assert_eq!(codec.decompress(&payload, input.len()).unwrap(), input);
    }

    #[test]
    fn test_repetitive_input_shrinks() {
        let codec = DeflateCodec::default();
        let input: Vec<u8> = b"abcdefgh".iter().cycle().take(10_000).copied().collect();
        let payload = codec.compress(&input).unwrap();
        assert!(payload.len() < input.len() / 20);
        assert_eq!(codec.decompress(&payload, usize::MAX).unwrap(), input);
    }

    #[test]
    fn test_empty() {
        let codec = DeflateCodec::default();
        let payload = codec.compress(b"").unwrap();
        assert!(!payload.is_empty());
        assert!(codec.decompress(&payload, 0).unwrap().is_empty());
    }

    #[test]
    fn test_long_distances() {
        let codec = DeflateCodec::default();
        let mut input: Vec<u8> = (0..30_000u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
            .collect();
        let head = input[..500].to_vec();
        input.extend_from_slice(&head);
        let payload = codec.compress(&input).unwrap();
        assert_eq!(codec.decompress(&payload, input.len()).unwrap(), input);
    }

    #[test]
    fn test_output_limit() {
        let codec = DeflateCodec::default();
        let payload = codec.compress(&[1u8; 300]).unwrap();
        assert!(matches!(
            codec.decompress(&payload, 299),
            Err(CodecError::Overflow { .. })
        ));
    }

    #[test]
    fn test_length_258_only_from_code_285() {
        // Literal 'a', then code 284 with all extra bits set (227 + 31).
        let mut litlen_lengths = vec![0u8; LITLEN_ALPHABET_SIZE];
        litlen_lengths[usize::from(b'a')] = 2;
        litlen_lengths[usize::from(END_OF_BLOCK)] = 2;
        litlen_lengths[284] = 1;
        let mut distance_lengths = vec![0u8; DISTANCE_ALPHABET_SIZE];
        distance_lengths[0] = 1;

        let litlen = HuffmanEncoder::from_lengths(&litlen_lengths).unwrap();
        let distance = HuffmanEncoder::from_lengths(&distance_lengths).unwrap();

        let mut writer = BitWriter::new();
        write_code_lengths(&mut writer, &litlen_lengths).unwrap();
        write_code_lengths(&mut writer, &distance_lengths).unwrap();
        litlen.write_symbol(&mut writer, usize::from(b'a')).unwrap();
        litlen.write_symbol(&mut writer, 284).unwrap();
        writer.write_bits(31, 5);
        distance.write_symbol(&mut writer, 0).unwrap();
        litlen.write_symbol(&mut writer, usize::from(END_OF_BLOCK)).unwrap();
        let payload = writer.flush();

        assert!(matches!(
            DeflateCodec::default().decompress(&payload, usize::MAX),
            Err(CodecError::CorruptedData { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = Lz77Config::default().with_max_match(1000);
        assert!(matches!(
            DeflateCodec::new(config),
            Err(CodecError::InvalidConfiguration { .. })
        ));
    }
}
