//! Error types for CPRO codec operations.
//!
//! Every codec, the container, and the command-line front end report failures
//! through [`CodecError`]. Payload-level failures (truncation, overflow,
//! corruption) are distinguished from configuration and format errors by
//! [`CodecError::is_payload_damage`].

use std::io;
use thiserror::Error;

/// The main error type for CPRO operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bit stream ended before the requested number of bits was available.
    #[error("Data truncated: needed {needed_bits} more bits, {available_bits} available")]
    DataTruncated {
        /// Number of bits requested.
        needed_bits: u64,
        /// Number of bits that were left in the stream.
        available_bits: u64,
    },

    /// The reconstructed bytes do not match the stored CRC-32.
    #[error(
        "Checksum mismatch: expected {expected:#010x}, {}",
        describe_computed(.computed)
    )]
    ChecksumMismatch {
        /// CRC-32 stored in the container header.
        expected: u32,
        /// CRC-32 of the reconstructed bytes, or `None` when the payload
        /// could not be decoded far enough to produce a buffer.
        computed: Option<u32>,
    },

    /// Bad magic, unknown version, or unknown compressor identifier.
    #[error("Unsupported format: {message}")]
    UnsupportedFormat {
        /// Description of what was not recognized.
        message: String,
    },

    /// Codec parameters outside their allowed range.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the offending parameter.
        message: String,
    },

    /// A count or length exceeds the width it is encoded with.
    #[error("Overflow: {message}")]
    Overflow {
        /// Description of the overflowing value.
        message: String,
    },

    /// Payload structure is self-inconsistent (invalid prefix code,
    /// out-of-window back-reference, bad primary index, ...).
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Bit or byte offset where the problem was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// I/O error from the front end reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn describe_computed(computed: &Option<u32>) -> String {
    match computed {
        Some(crc) => format!("computed {crc:#010x}"),
        None => "payload could not be decoded".to_string(),
    }
}

/// Result type alias for CPRO operations.
pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Create a data truncated error.
    pub fn truncated(needed_bits: u64, available_bits: u64) -> Self {
        Self::DataTruncated {
            needed_bits,
            available_bits,
        }
    }

    /// Create a checksum mismatch error for a fully decoded buffer.
    pub fn checksum_mismatch(expected: u32, computed: u32) -> Self {
        Self::ChecksumMismatch {
            expected,
            computed: Some(computed),
        }
    }

    /// Create a checksum mismatch error for a payload that could not be decoded.
    pub fn undecodable_payload(expected: u32) -> Self {
        Self::ChecksumMismatch {
            expected,
            computed: None,
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an overflow error.
    pub fn overflow(message: impl Into<String>) -> Self {
        Self::Overflow {
            message: message.into(),
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Whether this error describes damage to an encoded payload, as opposed
    /// to a configuration or environment problem.
    pub fn is_payload_damage(&self) -> bool {
        matches!(
            self,
            Self::DataTruncated { .. } | Self::Overflow { .. } | Self::CorruptedData { .. }
        )
    }
}
