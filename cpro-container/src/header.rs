//! CPRO file header parsing and writing.
//!
//! Every compressed file starts with a fixed 27-byte header. Integers are
//! little-endian:
//!
//! ```text
//! offset  size  field
//!      0     4  magic "CPRO"
//!      4     2  format version
//!      6     1  compressor identifier
//!      7     8  original size
//!     15     8  compressed payload size
//!     23     4  CRC-32 of the original bytes
//! ```

use cpro_core::error::{CodecError, Result};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// CPRO magic bytes.
pub const MAGIC: [u8; 4] = *b"CPRO";

/// Current format version.
pub const VERSION: u16 = 1;

/// Encoded header length in bytes.
pub const HEADER_SIZE: usize = 27;

/// Identifier of the codec that produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressorId {
    /// Identity transform.
    Null = 0,
    /// Run-length coding.
    Rle = 1,
    /// Canonical Huffman coding.
    Huffman = 2,
    /// LZ77 sliding-window matching.
    Lz77 = 3,
    /// LZ77 followed by two Huffman tables.
    Deflate = 4,
    /// Burrows-Wheeler block sorting.
    Bwt = 5,
}

impl CompressorId {
    /// Every identifier, in wire order.
    pub const ALL: [CompressorId; 6] = [
        Self::Null,
        Self::Rle,
        Self::Huffman,
        Self::Lz77,
        Self::Deflate,
        Self::Bwt,
    ];

    /// Lowercase algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Rle => "rle",
            Self::Huffman => "huffman",
            Self::Lz77 => "lz77",
            Self::Deflate => "deflate",
            Self::Bwt => "bwt",
        }
    }
}

impl fmt::Display for CompressorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for CompressorId {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| *id as u8 == value)
            .ok_or_else(|| CodecError::unsupported(format!("unknown compressor id {value}")))
    }
}

impl FromStr for CompressorId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.name() == lower)
            .ok_or_else(|| CodecError::unsupported(format!("unknown algorithm '{s}'")))
    }
}

/// CPRO file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format version.
    pub version: u16,
    /// Codec that produced the payload.
    pub compressor: CompressorId,
    /// Byte length before compression.
    pub original_size: u64,
    /// Byte length of the payload following the header.
    pub compressed_size: u64,
    /// CRC-32 of the original bytes.
    pub crc: u32,
}

impl FileHeader {
    /// Create a current-version header.
    pub fn new(compressor: CompressorId, original_size: u64, compressed_size: u64, crc: u32) -> Self {
        Self {
            version: VERSION,
            compressor,
            original_size,
            compressed_size,
            crc,
        }
    }

    /// Encode the header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6] = self.compressor as u8;
        buf[7..15].copy_from_slice(&self.original_size.to_le_bytes());
        buf[15..23].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[23..27].copy_from_slice(&self.crc.to_le_bytes());
        buf
    }

    /// Write the header to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Parse and validate a header from the start of `data`.
    ///
    /// Fails with [`CodecError::DataTruncated`] if fewer than
    /// [`HEADER_SIZE`] bytes are present, and with
    /// [`CodecError::UnsupportedFormat`] on a bad magic, version or
    /// compressor identifier.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(CodecError::truncated(
                (HEADER_SIZE * 8) as u64,
                (data.len() * 8) as u64,
            ));
        }

        if data[0..4] != MAGIC {
            return Err(CodecError::unsupported(format!(
                "bad magic {:02x?}, expected {:02x?}",
                &data[0..4],
                MAGIC
            )));
        }

        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != VERSION {
            return Err(CodecError::unsupported(format!(
                "format version {version}, expected {VERSION}"
            )));
        }

        let compressor = CompressorId::try_from(data[6])?;
        let original_size = u64::from_le_bytes(le_array(&data[7..15]));
        let compressed_size = u64::from_le_bytes(le_array(&data[15..23]));
        let crc = u32::from_le_bytes(le_array(&data[23..27]));

        Ok(Self {
            version,
            compressor,
            original_size,
            compressed_size,
            crc,
        })
    }
}

/// Copy a slice of known length into an array.
fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(bytes);
    buf
}
