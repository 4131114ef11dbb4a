//! CRC-32 integrity checksum.
//!
//! The container stores the CRC-32 (ISO 3309, the ZIP/GZIP/PNG variant) of
//! the original bytes and recomputes it over the reconstructed bytes on
//! decompression. It detects accidental corruption only; it is not a
//! cryptographic digest.
//!
//! The lookup table is built at compile time, so it is process-wide,
//! immutable, and never recomputed.

/// CRC-32 reflected polynomial.
const POLYNOMIAL: u32 = 0xEDB88320;

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
/// - Reflected input and output
///
/// # Example
///
/// ```
/// use cpro_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Resume from a previously finalized CRC value.
    pub fn resume(value: u32) -> Self {
        Self {
            crc: value ^ 0xFFFFFFFF,
        }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for &byte in data {
            crc = CRC32_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
        }
        self.crc = crc;
    }

    /// Get the current CRC value (without finalizing).
    #[inline]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Finalize and return the CRC value.
    #[inline]
    pub fn finalize(self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        update(0, data)
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Extend a running CRC-32 value with `data`.
///
/// Start from `0` for a fresh checksum. Calls are order-dependent:
/// `update(update(0, a), b) == Crc32::compute(a ++ b)`.
pub fn update(running: u32, data: &[u8]) -> u32 {
    let mut crc = Crc32::resume(running);
    crc.update(data);
    crc.finalize()
}
