//! # CPRO Core
//!
//! Core components shared by every CPRO codec.
//!
//! - [`bitstream`]: MSB-first bit-level I/O over in-memory buffers
//! - [`crc`]: CRC-32 integrity checksum
//! - [`traits`]: the [`Codec`] contract
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! CPRO is a layered stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Container                                           │
//! │     FileHeader, CRC-32 envelope, codec dispatch, CLI    │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Huffman, LZ77, Deflate, BWT pipeline, RLE, Null     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader/BitWriter, CRC-32, Codec trait            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cpro_core::bitstream::{BitReader, BitWriter};
//! use cpro_core::crc::Crc32;
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0xABC, 12);
//! let data = writer.flush();
//!
//! let mut reader = BitReader::new(&data);
//! assert_eq!(reader.read_bits(12).unwrap(), 0xABC);
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod traits;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use crc::Crc32;
pub use error::{CodecError, Result};
pub use traits::Codec;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitReader, BitWriter};
    pub use crate::crc::Crc32;
    pub use crate::error::{CodecError, Result};
    pub use crate::traits::Codec;
}
