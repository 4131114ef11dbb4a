//! Burrows-Wheeler Transform.
//!
//! The BWT is a reversible transformation that groups similar bytes together,
//! making the data more compressible. Rotations are sorted cyclically (see
//! [`SuffixArray`]); the output is the last column of the sorted rotation
//! matrix plus the row holding the original block.

use crate::suffix::SuffixArray;
use cpro_core::error::{CodecError, Result};

/// Perform the Burrows-Wheeler Transform.
///
/// Returns the transformed data and the primary index: the sorted row whose
/// rotation is the untransformed input.
pub fn transform(data: &[u8]) -> (Vec<u8>, u32) {
    let n = data.len();
    let sa = SuffixArray::build(data);

    let mut primary = 0u32;
    let mut transformed = Vec::with_capacity(n);
    for (row, &offset) in sa.as_slice().iter().enumerate() {
        if offset == 0 {
            primary = row as u32;
        }
        transformed.push(data[(offset + n - 1) % n]);
    }

    (transformed, primary)
}

/// Perform inverse Burrows-Wheeler Transform with the LF-mapping.
///
/// Fails with [`CodecError::CorruptedData`] if `primary` is not a row of a
/// block this long.
pub fn inverse_transform(data: &[u8], primary: u32) -> Result<Vec<u8>> {
    let n = data.len();
    if n == 0 {
        return if primary == 0 {
            Ok(Vec::new())
        } else {
            Err(CodecError::corrupted(0, "Primary index in empty block"))
        };
    }
    if primary as usize >= n {
        return Err(CodecError::corrupted(
            0,
            format!("Primary index {primary} outside block of {n} bytes"),
        ));
    }

    // Row where each byte value first appears in the sorted first column.
    let mut counts = [0usize; 256];
    for &byte in data {
        counts[usize::from(byte)] += 1;
    }
    let mut starts = [0usize; 256];
    let mut total = 0;
    for (start, &count) in starts.iter_mut().zip(&counts) {
        *start = total;
        total += count;
    }

    // next[row of first column] = row whose last byte is that occurrence.
    let mut next = vec![0usize; n];
    for (row, &byte) in data.iter().enumerate() {
        let slot = &mut starts[usize::from(byte)];
        next[*slot] = row;
        *slot += 1;
    }

    let mut result = Vec::with_capacity(n);
    let mut row = next[primary as usize];
    for _ in 0..n {
        result.push(data[row]);
        row = next[row];
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bwt_empty() {
        let (transformed, ptr) = transform(b"");
        assert!(transformed.is_empty());
        assert_eq!(ptr, 0);
        assert!(inverse_transform(b"", 0).unwrap().is_empty());
    }

    #[test]
    fn test_bwt_single() {
        let (transformed, ptr) = transform(b"a");
        assert_eq!(transformed, b"a");
        assert_eq!(ptr, 0);
        assert_eq!(inverse_transform(b"a", 0).unwrap(), b"a");
    }

    #[test]
    fn test_bwt_banana() {
        let (transformed, ptr) = transform(b"banana");
        assert_eq!(transformed, b"nnbaaa");
        assert_eq!(ptr, 3);
        assert_eq!(inverse_transform(&transformed, ptr).unwrap(), b"banana");
    }

    #[test]
    fn test_bwt_roundtrip() {
        let test_cases = [
            b"hello world".as_slice(),
            b"abracadabra",
            b"mississippi",
            b"aaaaa",
            b"abab",
            b"abcabcabc",
            b"abcde",
            b"the quick brown fox jumps over the lazy dog",
        ];

        for data in test_cases {
            let (transformed, ptr) = transform(data);
            let recovered = inverse_transform(&transformed, ptr).unwrap();
            assert_eq!(recovered, data, "Failed for: {:?}", data);
        }
    }

    #[test]
    fn test_bwt_every_byte_value() {
        let data: Vec<u8> = (0..=255u8).rev().chain(0..=255).collect();
        let (transformed, ptr) = transform(&data);
        assert_eq!(inverse_transform(&transformed, ptr).unwrap(), data);
    }

    #[test]
    fn test_bwt_groups_similar() {
        let (transformed, _) = transform(b"abababab");
        let runs = 1 + transformed.windows(2).filter(|w| w[0] != w[1]).count();
        assert!(runs <= 4, "BWT should group similar bytes");
    }

    #[test]
    fn test_bad_primary_index() {
        assert!(matches!(
            inverse_transform(b"nnbaaa", 6),
            Err(CodecError::CorruptedData { .. })
        ));
        assert!(inverse_transform(b"", 1).is_err());
    }
}
