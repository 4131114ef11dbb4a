//! Block-sorting compression for CPRO.
//!
//! The [`BwtCodec`] runs a pipeline of transformations over each block:
//! 1. Burrows-Wheeler Transform (BWT) - block sorting over cyclic rotations
//! 2. Move-to-Front Transform (MTF) - turns local clusters into small ranks
//! 3. Run-Length Encoding (RLE) - collapses the resulting runs
//! 4. Huffman Coding - optional, kept only when it helps
//!
//! Each stage is also usable on its own; [`RleCodec`] is one of the
//! container's codecs in its own right.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Burrows-Wheeler Transform implementation.
pub mod bwt;
pub mod codec;
pub mod mtf;
pub mod rle;
pub mod suffix;

pub use codec::{BwtCodec, BwtConfig, DEFAULT_BLOCK_SIZE};
pub use mtf::MoveToFront;
pub use rle::{RleCodec, RleConfig, RleSymbol};
pub use suffix::SuffixArray;
