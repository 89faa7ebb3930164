//! On-disk layout constants and the little-endian pair codec.
//!
//! Every multi-byte integer in the file is an unsigned little-endian u32,
//! and every structural unit — primary-index entry, table slot, record
//! header — is a pair of them.

use byteorder::{ByteOrder, LittleEndian};

/// Number of secondary hash tables (and of primary-index entries).
pub const TABLE_COUNT: usize = 256;

/// Size of one `(u32, u32)` pair: index entry, slot, or record header.
pub const PAIR_BYTES: usize = 8;

/// Size of the primary index at the head of the file.
pub const INDEX_BYTES: usize = TABLE_COUNT * PAIR_BYTES;

/// Decodes a little-endian `(u32, u32)` pair from the start of `buf`.
pub fn read_pair(buf: &[u8]) -> (u32, u32) {
    (
        LittleEndian::read_u32(&buf[..4]),
        LittleEndian::read_u32(&buf[4..8]),
    )
}
