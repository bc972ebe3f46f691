//! Additive key hash
//!
//! The home slot of a key is the sum of its UTF-16 code units modulo the
//! table capacity. Keys that are anagrams of each other always collide.
//! Characters outside the Basic Multilingual Plane contribute both halves of
//! their surrogate pair.

/// Home slot for `key` in a table of `capacity` cells
///
/// `capacity` must be non-zero.
pub fn char_sum_hash(key: &str, capacity: usize) -> usize {
    let sum: u64 = key.encode_utf16().map(u64::from).sum();
    (sum % capacity as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        // 'A'(65) + '-'(45) + '1'(49) + '0'(48) + '0'(48) = 255
        assert_eq!(char_sum_hash("A-100", 20), 15);
        // 'K'(75) + '-'(45) + '1'(49) + '0'(48) + '6'(54) = 271
        assert_eq!(char_sum_hash("K-106", 20), 11);
        assert_eq!(char_sum_hash("", 20), 0);
    }

    #[test]
    fn test_anagrams_collide() {
        assert_eq!(char_sum_hash("A-100", 20), char_sum_hash("A-010", 20));
        assert_eq!(char_sum_hash("K-106", 7), char_sum_hash("K-601", 7));
    }

    #[test]
    fn test_capacity_one() {
        assert_eq!(char_sum_hash("anything", 1), 0);
    }

    #[test]
    fn test_non_ascii() {
        // 'é' is U+00E9 (233)
        assert_eq!(char_sum_hash("é", 1000), 233);
    }

    #[test]
    fn test_astral_chars_sum_surrogates() {
        // U+1F600 encodes as 0xD83D (55357) + 0xDE00 (56832) = 112189
        assert_eq!(char_sum_hash("\u{1F600}", 1_000_000), 112_189);
        assert_eq!(char_sum_hash("A\u{1F600}", 1000), (65 + 112_189) % 1000);
    }
}
