//! Core trait shared by every codec.
//!
//! A codec turns a whole in-memory buffer into a payload and back. It keeps no
//! state between calls: every frequency table, suffix array, bit cursor and
//! recency list lives only for the duration of one call, so a single codec
//! value can be used from several threads at once.

use crate::error::Result;

/// A one-shot, in-memory compression algorithm.
///
/// Implementations are pure functions of their input and configuration.
/// The payload they produce carries every parameter the decoder needs, so
/// `decompress` never depends on out-of-band configuration.
pub trait Codec {
    /// Short lowercase name of the algorithm (e.g. `"deflate"`).
    fn name(&self) -> &'static str;

    /// Compress `input` into a codec-specific payload.
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Reconstruct the original bytes from `payload`.
    ///
    /// `max_output` is an upper bound on the number of bytes to produce; a
    /// payload that would decode to more fails with
    /// [`CodecError::Overflow`](crate::error::CodecError::Overflow). Callers
    /// that do not know the size can pass `usize::MAX`.
    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>>;
}
