//! Move-to-Front Transform.
//!
//! MTF transforms a stream by replacing each byte with its position
//! in a dynamic list. After each byte, that byte is moved to the front
//! of the list. This converts local byte clusters into many zeros.
//!
//! The list starts in ascending order at the beginning of every call; no
//! state survives between calls.

/// The recency list of all 256 byte values.
#[derive(Debug, Clone)]
pub struct MoveToFront {
    list: [u8; 256],
}

impl Default for MoveToFront {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveToFront {
    /// A list in identity order: value `i` at rank `i`.
    pub fn new() -> Self {
        let mut list = [0u8; 256];
        for (rank, slot) in list.iter_mut().enumerate() {
            *slot = rank as u8;
        }
        Self { list }
    }

    /// Move the value at `rank` to the front.
    #[inline]
    fn promote(&mut self, rank: usize) {
        let value = self.list[rank];
        self.list.copy_within(0..rank, 1);
        self.list[0] = value;
    }

    /// Return the current rank of `byte` and move it to the front.
    #[inline]
    pub fn encode_byte(&mut self, byte: u8) -> u8 {
        let mut rank = 0;
        while self.list[rank] != byte {
            rank += 1;
        }
        self.promote(rank);
        rank as u8
    }

    /// Return the value at `rank` and move it to the front.
    #[inline]
    pub fn decode_rank(&mut self, rank: u8) -> u8 {
        let value = self.list[usize::from(rank)];
        self.promote(usize::from(rank));
        value
    }
}

/// Perform Move-to-Front transform.
pub fn transform(data: &[u8]) -> Vec<u8> {
    let mut mtf = MoveToFront::new();
    data.iter().map(|&byte| mtf.encode_byte(byte)).collect()
}

/// Perform inverse Move-to-Front transform.
pub fn inverse_transform(data: &[u8]) -> Vec<u8> {
    let mut mtf = MoveToFront::new();
    data.iter().map(|&rank| mtf.decode_rank(rank)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mtf_empty() {
        assert!(transform(b"").is_empty());
        assert!(inverse_transform(b"").is_empty());
    }

    #[test]
    fn test_mtf_single() {
        assert_eq!(transform(b"a"), vec![b'a']); // 'a' is at position 97
    }

    #[test]
    fn test_mtf_repeated() {
        assert_eq!(transform(b"aaaa"), vec![b'a', 0, 0, 0]);
    }

    #[test]
    fn test_mtf_banana_bwt() {
        assert_eq!(transform(b"nnbaaa"), vec![110, 0, 99, 99, 0, 0]);
    }

    #[test]
    fn test_mtf_state_not_shared_between_calls() {
        let first = transform(b"zebra");
        let second = transform(b"zebra");
        assert_eq!(first, second);
    }

    #[test]
    fn test_mtf_roundtrip() {
        let test_cases = [
            b"hello".as_slice(),
            b"banana",
            b"abracadabra",
            b"the quick brown fox",
            b"\xff\x00\xff\x00\x80",
        ];

        for data in test_cases {
            let transformed = transform(data);
            let recovered = inverse_transform(&transformed);
            assert_eq!(recovered, data, "Failed for: {:?}", data);
        }

        // Every rank sequence decodes and re-encodes to itself.
        let ranks: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        assert_eq!(transform(&inverse_transform(&ranks)), ranks);
    }

    #[test]
    fn test_mtf_produces_low_values() {
        let data = b"bbbbbaaaacccc";
        let transformed = transform(data);
        let zeros = transformed.iter().filter(|&&b| b == 0).count();
        assert!(
            zeros > data.len() / 2,
            "MTF should produce many zeros for runs"
        );
    }
}
