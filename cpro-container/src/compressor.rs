//! Dispatch from a stored compressor identifier to its codec.

use crate::header::CompressorId;
use crate::null::NullCodec;
use cpro_bwt::{BwtCodec, RleCodec};
use cpro_core::error::Result;
use cpro_core::traits::Codec;
use cpro_deflate::{DeflateCodec, HuffmanCodec, Lz77Codec};

/// The closed set of codecs a container can hold, each with its default
/// configuration.
#[derive(Debug, Clone)]
pub enum Compressor {
    /// Identity.
    Null(NullCodec),
    /// Run-length coding.
    Rle(RleCodec),
    /// Canonical Huffman.
    Huffman(HuffmanCodec),
    /// LZ77.
    Lz77(Lz77Codec),
    /// LZ77 + Huffman.
    Deflate(DeflateCodec),
    /// Block sorting.
    Bwt(BwtCodec),
}

impl Compressor {
    /// The codec stored under `id`.
    pub fn for_id(id: CompressorId) -> Self {
        match id {
            CompressorId::Null => Self::Null(NullCodec),
            CompressorId::Rle => Self::Rle(RleCodec::default()),
            CompressorId::Huffman => Self::Huffman(HuffmanCodec::new()),
            CompressorId::Lz77 => Self::Lz77(Lz77Codec::default()),
            CompressorId::Deflate => Self::Deflate(DeflateCodec::default()),
            CompressorId::Bwt => Self::Bwt(BwtCodec::default()),
        }
    }

    /// Identifier written to the header for this codec.
    pub fn id(&self) -> CompressorId {
        match self {
            Self::Null(_) => CompressorId::Null,
            Self::Rle(_) => CompressorId::Rle,
            Self::Huffman(_) => CompressorId::Huffman,
            Self::Lz77(_) => CompressorId::Lz77,
            Self::Deflate(_) => CompressorId::Deflate,
            Self::Bwt(_) => CompressorId::Bwt,
        }
    }

    fn codec(&self) -> &dyn Codec {
        match self {
            Self::Null(c) => c,
            Self::Rle(c) => c,
            Self::Huffman(c) => c,
            Self::Lz77(c) => c,
            Self::Deflate(c) => c,
            Self::Bwt(c) => c,
        }
    }
}

impl From<CompressorId> for Compressor {
    fn from(id: CompressorId) -> Self {
        Self::for_id(id)
    }
}

impl Codec for Compressor {
    fn name(&self) -> &'static str {
        self.codec().name()
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.codec().compress(input)
    }

    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>> {
        self.codec().decompress(payload, max_output)
    }
}
