//! Identity codec.

use cpro_core::error::{CodecError, Result};
use cpro_core::traits::Codec;

/// Stores its input unchanged.
///
/// Useful as a baseline for incompressible data and as a control when
/// testing the container envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl Codec for NullCodec {
    fn name(&self) -> &'static str {
        "null"
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }

    fn decompress(&self, payload: &[u8], max_output: usize) -> Result<Vec<u8>> {
        if payload.len() > max_output {
            return Err(CodecError::overflow(format!(
                "payload of {} bytes exceeds output limit {max_output}",
                payload.len()
            )));
        }
        Ok(payload.to_vec())
    }
}
