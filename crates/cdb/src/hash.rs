//! The canonical CDB hash function.

/// A hash function mapping a byte-string key to a 32-bit value.
///
/// The hash identity is part of the file format: a database must be read
/// with the same function it was built with. A mismatched hasher does not
/// error — lookups silently miss or return the wrong record.
pub type HashFn = fn(&[u8]) -> u32;

/// D. J. Bernstein's hash: `h = 5381; h = (h * 33) ^ byte`, with 32-bit
/// wrap-around.
pub fn cdb_hash(data: &[u8]) -> u32 {
    let mut h: u32 = 5381;
    for &b in data {
        h = h.wrapping_mul(33) ^ u32::from(b);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_the_seed() {
        assert_eq!(cdb_hash(b""), 5381);
    }

    #[test]
    fn known_vector() {
        assert_eq!(cdb_hash(b"hello"), 0x0a9c_ede7);
    }

    #[test]
    fn long_input_wraps_without_panic() {
        let data = vec![0xffu8; 4096];
        let h = cdb_hash(&data);
        assert_eq!(h, cdb_hash(&data));
    }

    #[test]
    fn nearby_keys_differ() {
        assert_ne!(cdb_hash(b"key0000"), cdb_hash(b"key0001"));
    }
}
