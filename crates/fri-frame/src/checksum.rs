/// CRC-32 (ISO-3309 / IEEE 802.3) of `bytes`.
///
/// Reflected polynomial `0xEDB88320`, initial value all-ones, final
/// complement. Any span, including an empty one, is valid input.
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn empty_span() {
        assert_eq!(checksum(b""), 0);
    }

    #[test]
    fn single_bit_changes_checksum() {
        let original = checksum(b"joint-values");
        let mut flipped = *b"joint-values";
        flipped[3] ^= 0x01;
        assert_ne!(checksum(&flipped), original);
    }
}
