//! Bit-level I/O over in-memory byte buffers.
//!
//! This module provides `BitWriter` and `BitReader` for writing and reading
//! data at the bit level. Every codec in CPRO serializes its payload through
//! these two types, so they fix the bit order for the whole format.
//!
//! # Bit Ordering
//!
//! All CPRO payloads use MSB-first (Most Significant Bit first) ordering:
//! the first bit written lands in bit 7 of the first byte, and a multi-bit
//! value is emitted from its most significant bit downwards. The final byte
//! of a stream is padded with zero bits.
//!
//! # Example
//!
//! ```
//! use cpro_core::bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3);
//! writer.write_bits(0b1100, 4);
//! let bytes = writer.flush();
//! assert_eq!(bytes, vec![0b1011_1000]);
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
//! ```

use crate::error::{CodecError, Result};

/// A bit-level writer that owns its output buffer.
///
/// Bits accumulate in a small register and complete bytes are moved into the
/// output vector. Call [`flush`](Self::flush) to pad the last byte and take
/// the finished buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// Completed bytes.
    output: Vec<u8>,
    /// Pending bits (right-aligned, fewer than 8 between calls).
    buffer: u64,
    /// Number of valid bits in `buffer`.
    bits_in_buffer: u8,
    /// Total bits written.
    total_bits_written: u64,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `bytes` bytes of output.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            output: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Get the total number of bits written so far.
    pub fn bits_written(&self) -> u64 {
        self.total_bits_written
    }

    /// Append the `count` low-order bits of `value`, most significant first.
    ///
    /// Bits of `value` above `count` are ignored.
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32, "Cannot write more than 32 bits at once");

        if count == 0 {
            return;
        }

        let mask = if count == 32 {
            u32::MAX
        } else {
            (1u32 << count) - 1
        };

        self.buffer = (self.buffer << count) | u64::from(value & mask);
        self.bits_in_buffer += count;
        self.total_bits_written += u64::from(count);

        while self.bits_in_buffer >= 8 {
            self.bits_in_buffer -= 8;
            self.output.push((self.buffer >> self.bits_in_buffer) as u8);
        }
        self.buffer &= (1u64 << self.bits_in_buffer) - 1;
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// Write a 64-bit value as two 32-bit halves, high half first.
    pub fn write_u64(&mut self, value: u64) {
        self.write_bits((value >> 32) as u32, 32);
        self.write_bits(value as u32, 32);
    }

    /// Write whole bytes. Works at any bit alignment.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bits_in_buffer == 0 {
            self.output.extend_from_slice(bytes);
            self.total_bits_written += bytes.len() as u64 * 8;
        } else {
            for &byte in bytes {
                self.write_bits(u32::from(byte), 8);
            }
        }
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        if self.bits_in_buffer > 0 {
            let padding = 8 - self.bits_in_buffer;
            self.write_bits(0, padding);
        }
    }

    /// Zero-pad the final byte and return the finished buffer.
    pub fn flush(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output
    }
}

/// A bit-level reader over a borrowed byte slice.
///
/// The reader consumes bits in the same MSB-first order that [`BitWriter`]
/// produces them. Requests past the end of the slice fail with
/// [`CodecError::DataTruncated`] and leave the cursor untouched.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    /// Input data.
    data: &'a [u8],
    /// Absolute bit cursor into `data`.
    bit_pos: u64,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Number of unread bits, including trailing padding.
    pub fn bits_remaining(&self) -> u64 {
        self.data.len() as u64 * 8 - self.bit_pos
    }

    /// Whether every bit has been consumed.
    pub fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    fn ensure(&self, count: u64) -> Result<()> {
        let available = self.bits_remaining();
        if available < count {
            return Err(CodecError::truncated(count, available));
        }
        Ok(())
    }

    /// Read up to 32 bits; the first bit read ends up most significant.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }
        self.ensure(u64::from(count))?;

        let mut value = 0u32;
        let mut remaining = count;
        while remaining > 0 {
            let byte = self.data[(self.bit_pos >> 3) as usize];
            let available = 8 - (self.bit_pos & 7) as u8;
            let take = available.min(remaining);
            let bits = (byte >> (available - take)) & (((1u16 << take) - 1) as u8);

            value = (value << take) | u32::from(bits);
            remaining -= take;
            self.bit_pos += u64::from(take);
        }

        Ok(value)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read a 64-bit value written by [`BitWriter::write_u64`].
    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(64)?;
        let high = self.read_bits(32)?;
        let low = self.read_bits(32)?;
        Ok((u64::from(high) << 32) | u64::from(low))
    }

    /// Read `len` whole bytes at the current alignment.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        self.ensure(len as u64 * 8)?;

        if self.bit_pos & 7 == 0 {
            let start = (self.bit_pos >> 3) as usize;
            self.bit_pos += len as u64 * 8;
            return Ok(self.data[start..start + len].to_vec());
        }

        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(self.read_bits(8)? as u8);
        }
        Ok(bytes)
    }

    /// Skip to the next byte boundary, discarding padding bits.
    pub fn align_to_byte(&mut self) {
        let remainder = self.bit_pos & 7;
        if remainder != 0 {
            self.bit_pos += 8 - remainder;
        }
    }

    /// Consume the padding that [`BitWriter::flush`] appended.
    ///
    /// Fails with [`CodecError::CorruptedData`] if a whole byte or more is
    /// left, or if any of the remaining bits is set.
    pub fn finish(&mut self) -> Result<()> {
        let remaining = self.bits_remaining();
        if remaining >= 8 {
            return Err(CodecError::corrupted(
                self.bit_pos,
                format!("{} trailing bytes after end of stream", remaining / 8),
            ));
        }
        let position = self.bit_pos;
        if self.read_bits(remaining as u8)? != 0 {
            return Err(CodecError::corrupted(position, "non-zero padding bits"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitreader_basic() {
        // 0b10110101 = 0xB5
        let data = [0xB5];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(1).unwrap(), 1); // MSB first
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_bitreader_multi_byte() {
        let data = [0xF0, 0x0F];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(4).unwrap(), 0xF);
        assert_eq!(reader.read_bits(8).unwrap(), 0x00); // Crosses byte boundary
        assert_eq!(reader.read_bits(4).unwrap(), 0xF);
    }

    #[test]
    fn test_bitreader_truncated() {
        let data = [0xAB];
        let mut reader = BitReader::new(&data);

        reader.read_bits(5).unwrap();
        let err = reader.read_bits(4).unwrap_err();
        assert!(matches!(
            err,
            CodecError::DataTruncated {
                needed_bits: 4,
                available_bits: 3
            }
        ));
        // Cursor is untouched by the failed read.
        assert_eq!(reader.read_bits(3).unwrap(), 0b011);
    }

    #[test]
    fn test_bitwriter_basic() {
        let mut writer = BitWriter::new();
        for bit in [true, false, true, true, false, true, false, true] {
            writer.write_bit(bit);
        }
        assert_eq!(writer.flush(), vec![0xB5]);
    }

    #[test]
    fn test_bitwriter_padding() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b11, 2);
        assert_eq!(writer.bits_written(), 2);
        assert_eq!(writer.flush(), vec![0b1100_0000]);

        assert!(BitWriter::new().flush().is_empty());
    }

    #[test]
    fn test_bitwriter_masks_high_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xFFFF_FF01, 4);
        writer.write_bits(0, 4);
        assert_eq!(writer.flush(), vec![0x10]);
    }

    #[test]
    fn test_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3);
        writer.write_bits(0b1111, 4);
        writer.write_bits(0b10, 2);
        writer.write_bits(0b110011, 6);
        writer.write_bits(0xDEAD_BEEF, 32);
        writer.write_u64(0x0123_4567_89AB_CDEF);
        let output = writer.flush();

        let mut reader = BitReader::new(&output);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1111);
        assert_eq!(reader.read_bits(2).unwrap(), 0b10);
        assert_eq!(reader.read_bits(6).unwrap(), 0b110011);
        assert_eq!(reader.read_bits(32).unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_u64().unwrap(), 0x0123_4567_89AB_CDEF);
        assert!(reader.bits_remaining() < 8);
    }

    #[test]
    fn test_finish_checks_padding() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3);
        let output = writer.flush();

        let mut reader = BitReader::new(&output);
        reader.read_bits(3).unwrap();
        reader.finish().unwrap();

        // Set a padding bit.
        let tampered = [output[0] | 0x01];
        let mut reader = BitReader::new(&tampered);
        reader.read_bits(3).unwrap();
        assert!(matches!(
            reader.finish(),
            Err(CodecError::CorruptedData { offset: 3, .. })
        ));

        // An extra byte is not padding.
        let longer = [output[0], 0];
        let mut reader = BitReader::new(&longer);
        reader.read_bits(3).unwrap();
        assert!(reader.finish().is_err());
    }

    #[test]
    fn test_unaligned_bytes() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bytes(&[0x12, 0x34]);
        writer.align_to_byte();
        writer.write_bytes(&[0x56]);
        let output = writer.flush();
        assert_eq!(output.len(), 4);

        let mut reader = BitReader::new(&output);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bytes(2).unwrap(), vec![0x12, 0x34]);
        reader.align_to_byte();
        assert_eq!(reader.read_bytes(1).unwrap(), vec![0x56]);
        assert!(reader.is_empty());
    }
}
