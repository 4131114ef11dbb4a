//! # CPRO Deflate
//!
//! Dictionary and entropy codecs for CPRO: canonical Huffman coding, LZ77
//! match finding, and the Deflate-style composition of the two.
//!
//! ## Codecs
//!
//! - [`HuffmanCodec`]: order-0 canonical Huffman over bytes
//! - [`Lz77Codec`]: LZ77 symbols in fixed-width fields
//! - [`DeflateCodec`]: LZ77 symbols coded with a literal/length and a
//!   distance Huffman table
//!
//! All three implement [`cpro_core::Codec`].
//!
//! ## Example
//!
//! ```rust
//! use cpro_core::Codec;
//! use cpro_deflate::DeflateCodec;
//!
//! let codec = DeflateCodec::default();
//! let original = b"Hello, World! Hello, World!";
//! let compressed = codec.compress(original).unwrap();
//!
//! let decompressed = codec.decompress(&compressed, original.len()).unwrap();
//! assert_eq!(&decompressed, original);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod deflate;
pub mod huffman;
pub mod lz77;
pub mod tables;

// Re-exports
pub use deflate::DeflateCodec;
pub use huffman::{HuffmanCodec, HuffmanDecoder, HuffmanEncoder, build_code_lengths};
pub use lz77::{Lz77Codec, Lz77Config, Lz77Encoder, Lz77Symbol, Match};
