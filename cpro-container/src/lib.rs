//! # CPRO Container
//!
//! Self-describing container around the CPRO codecs.
//!
//! A compressed file is a fixed [`FileHeader`] followed by the payload of the
//! codec named in the header. The header records the original size and the
//! CRC-32 of the original bytes; both are checked against the reconstructed
//! buffer before it is returned.
//!
//! - [`header`]: header layout and compressor identifiers
//! - [`compressor`]: dispatch from identifier to codec
//! - [`null`]: the identity codec
//!
//! ## Example
//!
//! ```rust
//! use cpro_container::{CompressorId, compress, decompress, read_header};
//!
//! let data = b"abracadabra abracadabra";
//! let file = compress(data, CompressorId::Bwt).unwrap();
//!
//! let header = read_header(&file).unwrap();
//! assert_eq!(header.compressor, CompressorId::Bwt);
//! assert_eq!(header.original_size, data.len() as u64);
//!
//! assert_eq!(decompress(&file).unwrap(), data);
//! ```
//!
//! ## Integrity
//!
//! Header fields are validated before any payload decoding starts. A payload
//! that fails to decode, decodes to bytes whose length or CRC-32 differ from
//! the header, or is not exactly what the codec's default configuration
//! produces for those bytes, is reported as [`CodecError::ChecksumMismatch`].
//! No partial output is ever returned.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod compressor;
pub mod header;
pub mod null;

// Re-exports
pub use compressor::Compressor;
pub use header::{CompressorId, FileHeader, HEADER_SIZE, MAGIC, VERSION};
pub use null::NullCodec;

use cpro_core::crc::Crc32;
use cpro_core::error::{CodecError, Result};
use cpro_core::traits::Codec;
use log::{debug, warn};

/// Compress `data` with the default configuration of the codec `id`.
pub fn compress(data: &[u8], id: CompressorId) -> Result<Vec<u8>> {
    let compressor = Compressor::for_id(id);
    let crc = Crc32::compute(data);
    let payload = compressor.compress(data)?;
    let header = FileHeader::new(
        compressor.id(),
        data.len() as u64,
        payload.len() as u64,
        crc,
    );

    debug!(
        "compress: {} {} bytes -> {} byte payload, crc {:#010x}",
        header.compressor,
        data.len(),
        payload.len(),
        crc
    );

    let mut output = Vec::with_capacity(HEADER_SIZE + payload.len());
    header.write(&mut output)?;
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Parse and validate the header of a compressed file without decoding the
/// payload.
pub fn read_header(data: &[u8]) -> Result<FileHeader> {
    FileHeader::parse(data)
}

/// Decompress a complete CPRO file, verifying its size and CRC-32.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let header = FileHeader::parse(data)?;
    let payload = &data[HEADER_SIZE..];

    let expected_len = usize::try_from(header.compressed_size).unwrap_or(usize::MAX);
    if payload.len() < expected_len {
        return Err(CodecError::truncated(
            header.compressed_size.saturating_mul(8),
            (payload.len() as u64) * 8,
        ));
    }
    if payload.len() > expected_len {
        return Err(CodecError::unsupported(format!(
            "{} trailing bytes after payload",
            payload.len() - expected_len
        )));
    }
    let max_output = usize::try_from(header.original_size).map_err(|_| {
        CodecError::overflow(format!(
            "original size {} does not fit in memory",
            header.original_size
        ))
    })?;

    let compressor = Compressor::for_id(header.compressor);
    let output = compressor
        .decompress(payload, max_output)
        .map_err(|err| {
            if err.is_payload_damage() {
                debug!("{} payload failed to decode: {err}", header.compressor);
                CodecError::undecodable_payload(header.crc)
            } else {
                err
            }
        })?;

    let computed = Crc32::compute(&output);
    if output.len() != max_output || computed != header.crc {
        warn!(
            "{} payload decoded to {} bytes with crc {:#010x}, header says {} bytes with crc {:#010x}",
            header.compressor,
            output.len(),
            computed,
            header.original_size,
            header.crc
        );
        return Err(CodecError::checksum_mismatch(header.crc, computed));
    }

    // Payloads are produced by the default configuration of each codec, so
    // the only valid payload for `output` is the one compression gives.
    if compressor.compress(&output)? != payload {
        warn!(
            "{} payload decodes correctly but is not the encoding of its output",
            header.compressor
        );
        return Err(CodecError::undecodable_payload(header.crc));
    }

    debug!(
        "decompress: {} {} byte payload -> {} bytes",
        header.compressor,
        payload.len(),
        output.len()
    );
    Ok(output)
}
