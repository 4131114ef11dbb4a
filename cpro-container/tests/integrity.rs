//! Container round-trips and tamper detection across every codec.

use cpro_container::{CompressorId, HEADER_SIZE, compress, decompress, read_header};
use cpro_core::CodecError;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// Text with repeated phrases and a few long runs, so every codec has
/// matches, runs and a skewed byte distribution to work with.
fn sample_text() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..12 {
        data.extend_from_slice(b"It was the best of times, it was the worst of times. ");
        data.extend(std::iter::repeat_n(b'-', 5 + i));
        data.push(b'\n');
    }
    data
}

fn repetitive_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(len);
    while data.len() < len {
        let byte = b"xyz"[rng.gen_range(0..3)];
        data.extend(std::iter::repeat_n(byte, rng.gen_range(1..20)));
    }
    data.truncate(len);
    data
}

#[test]
fn test_roundtrip_all_codecs() {
    let inputs = [
        Vec::new(),
        vec![0x5A],
        vec![7u8; 4000],
        sample_text(),
        repetitive_bytes(20_000, 1),
        random_bytes(5000, 2),
        (0..=255u8).collect(),
    ];

    for id in CompressorId::ALL {
        for input in &inputs {
            let file = compress(input, id).unwrap();
            let header = read_header(&file).unwrap();
            assert_eq!(header.compressor, id);
            assert_eq!(header.original_size, input.len() as u64);
            assert_eq!(decompress(&file).unwrap(), *input, "{id} failed");
        }
    }
}

#[test]
fn test_empty_input_header() {
    let file = compress(b"", CompressorId::Deflate).unwrap();
    let header = read_header(&file).unwrap();
    assert_eq!(header.original_size, 0);
    assert_eq!(file.len(), HEADER_SIZE + header.compressed_size as usize);
    assert!(decompress(&file).unwrap().is_empty());
}

#[test]
fn test_rle_ten_identical_bytes() {
    let file = compress(b"aaaaaaaaaa", CompressorId::Rle).unwrap();
    let header = read_header(&file).unwrap();
    assert!(header.compressed_size < 10);
    assert_eq!(decompress(&file).unwrap(), b"aaaaaaaaaa");
}

#[test]
fn test_huffman_random_data_bounded_growth() {
    let data = random_bytes(1000, 3);
    let file = compress(&data, CompressorId::Huffman).unwrap();
    let header = read_header(&file).unwrap();
    // Count field plus code-length table; codewords are at most 8 bits for
    // near-uniform data.
    assert!(header.compressed_size <= 1000 + 300);
    assert_eq!(decompress(&file).unwrap(), data);
}

/// Flip every payload byte of `data`'s encoding with each mask.
fn assert_flips_detected(data: &[u8], masks: &[u8]) {
    for id in CompressorId::ALL {
        let file = compress(data, id).unwrap();
        for position in HEADER_SIZE..file.len() {
            for &mask in masks {
                let mut tampered = file.clone();
                tampered[position] ^= mask;
                let result = decompress(&tampered);
                assert!(
                    matches!(result, Err(CodecError::ChecksumMismatch { .. })),
                    "{id}: flipping byte {position} with {mask:#04x} gave {result:?}"
                );
            }
        }
    }
}

#[test]
fn test_single_byte_flip_detected() {
    assert_flips_detected(&sample_text(), &[0xFF, 0x01, 0x80]);
}

#[test]
fn test_single_byte_flip_detected_on_binary() {
    assert_flips_detected(&repetitive_bytes(600, 9), &[0xFF]);
}

#[test]
fn test_flips_detected_without_runs_or_matches() {
    // Every byte value once: no runs for RLE, no matches for LZ77, so the
    // prelude fields and most table entries go unused by the decoder.
    let data: Vec<u8> = (0..=255u8).collect();
    let masks: Vec<u8> = (0..8).map(|bit| 1u8 << bit).chain([0xFF]).collect();
    assert_flips_detected(&data, &masks);
}

#[test]
fn test_flips_detected_on_random_data() {
    assert_flips_detected(&random_bytes(1000, 4), &[0x01, 0x10, 0xFF]);
}

#[test]
fn test_unknown_compressor_id() {
    let mut file = compress(b"payload", CompressorId::Null).unwrap();
    file[6] = 42;
    assert!(matches!(
        decompress(&file),
        Err(CodecError::UnsupportedFormat { .. })
    ));
    assert!(read_header(&file).is_err());
}

#[test]
fn test_bad_magic_and_version() {
    let file = compress(b"payload", CompressorId::Rle).unwrap();

    let mut bad_magic = file.clone();
    bad_magic[..4].copy_from_slice(b"PKZP");
    assert!(matches!(
        decompress(&bad_magic),
        Err(CodecError::UnsupportedFormat { .. })
    ));

    let mut bad_version = file;
    bad_version[5] = 1;
    assert!(matches!(
        decompress(&bad_version),
        Err(CodecError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_header_size_mismatch_detected() {
    let data = sample_text();
    let file = compress(&data, CompressorId::Bwt).unwrap();

    // Claim one byte fewer than the payload decodes to.
    let mut shorter = file.clone();
    let original = data.len() as u64 - 1;
    shorter[7..15].copy_from_slice(&original.to_le_bytes());
    assert!(matches!(
        decompress(&shorter),
        Err(CodecError::ChecksumMismatch { .. })
    ));

    // Claim one byte more.
    let mut longer = file;
    let original = data.len() as u64 + 1;
    longer[7..15].copy_from_slice(&original.to_le_bytes());
    assert!(matches!(
        decompress(&longer),
        Err(CodecError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_garbage_never_panics() {
    for seed in 0..32 {
        let mut file = random_bytes(200, 100 + seed);
        file[..4].copy_from_slice(b"CPRO");
        file[4..6].copy_from_slice(&1u16.to_le_bytes());
        file[6] = (seed % 6) as u8;
        file[7..15].copy_from_slice(&1000u64.to_le_bytes());
        file[15..23].copy_from_slice(&((200 - HEADER_SIZE) as u64).to_le_bytes());
        assert!(decompress(&file).is_err());
    }
}
