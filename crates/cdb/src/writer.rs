use std::fs::{rename, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::format::{INDEX_BYTES, PAIR_BYTES, TABLE_COUNT};
use crate::hash::{cdb_hash, HashFn};

/// Builds a constant database offline.
///
/// Records stream to a temporary file behind a zeroed index placeholder;
/// each key's `(hash, offset)` pair is bucketed in memory by the hash's low
/// 8 bits. [`finish`](CdbWriter::finish) then emits the 256 secondary
/// tables after the records, rewrites the primary index, fsyncs, and
/// atomically renames the temp file into place. A crash mid-build leaves
/// only the temp file behind — never a half-written database.
///
/// Each secondary table gets `2 × count` slots, so every probe the reader
/// runs is guaranteed an empty terminator.
pub struct CdbWriter {
    file: BufWriter<File>,
    tmp_path: PathBuf,
    path: PathBuf,
    hasher: HashFn,
    offset: u64,
    buckets: [Vec<(u32, u32)>; TABLE_COUNT],
}

impl CdbWriter {
    /// Starts a new database at `path` using the canonical CDB hash.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_hasher(path, cdb_hash)
    }

    /// Starts a new database at `path` using `hasher`.
    ///
    /// Readers of the finished file must be given the same function.
    pub fn create_with_hasher<P: AsRef<Path>>(path: P, hasher: HashFn) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tmp_path = path.with_extension("cdb.tmp");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(file);

        // Zeroed placeholder; the real index lands here during finish().
        file.write_all(&[0u8; INDEX_BYTES])?;

        Ok(Self {
            file,
            tmp_path,
            path,
            hasher,
            offset: INDEX_BYTES as u64,
            buckets: std::array::from_fn(|_| Vec::new()),
        })
    }

    /// Appends one record.
    ///
    /// Duplicate keys are legal; lookups return the first record written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroHashKey`] if the key hashes to the reserved
    /// empty-slot sentinel, [`Error::TooLarge`] once offsets no longer fit
    /// the format's u32 fields, or the underlying I/O error.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let hash = (self.hasher)(key);
        if hash == 0 {
            return Err(Error::ZeroHashKey);
        }
        let record_offset = u32::try_from(self.offset).map_err(|_| Error::TooLarge)?;
        let key_len = u32::try_from(key.len()).map_err(|_| Error::TooLarge)?;
        let val_len = u32::try_from(value.len()).map_err(|_| Error::TooLarge)?;

        self.file.write_u32::<LittleEndian>(key_len)?;
        self.file.write_u32::<LittleEndian>(val_len)?;
        self.file.write_all(key)?;
        self.file.write_all(value)?;

        self.offset += (PAIR_BYTES + key.len() + value.len()) as u64;
        self.buckets[(hash & 0xff) as usize].push((hash, record_offset));
        Ok(())
    }

    /// Writes the secondary tables and the primary index, then atomically
    /// moves the database into place.
    pub fn finish(mut self) -> Result<()> {
        let mut index = [(0u32, 0u32); TABLE_COUNT];

        for (i, bucket) in self.buckets.iter().enumerate() {
            let length = u32::try_from(bucket.len() * 2).map_err(|_| Error::TooLarge)?;
            let table_offset = u32::try_from(self.offset).map_err(|_| Error::TooLarge)?;
            index[i] = (table_offset, length);
            if bucket.is_empty() {
                continue;
            }

            let mut slots = vec![(0u32, 0u32); length as usize];
            for &(hash, record_offset) in bucket {
                let mut slot = ((hash >> 8) % length) as usize;
                // A zero record offset marks an empty slot: real records
                // always sit past the primary index.
                while slots[slot].1 != 0 {
                    slot = (slot + 1) % length as usize;
                }
                slots[slot] = (hash, record_offset);
            }

            for (slot_hash, record_offset) in slots {
                self.file.write_u32::<LittleEndian>(slot_hash)?;
                self.file.write_u32::<LittleEndian>(record_offset)?;
            }
            self.offset += u64::from(length) * PAIR_BYTES as u64;
        }

        let mut file = self.file.into_inner().map_err(|e| e.into_error())?;
        file.seek(SeekFrom::Start(0))?;
        for (table_offset, length) in index {
            file.write_u32::<LittleEndian>(table_offset)?;
            file.write_u32::<LittleEndian>(length)?;
        }
        file.sync_all()?;
        drop(file);

        rename(&self.tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::read_pair;
    use tempfile::tempdir;

    // -------------------- Layout --------------------

    #[test]
    fn empty_database_is_just_the_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.cdb");
        CdbWriter::create(&path).unwrap().finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), INDEX_BYTES);
        for i in 0..TABLE_COUNT {
            let (_, length) = read_pair(&bytes[i * PAIR_BYTES..]);
            assert_eq!(length, 0);
        }
    }

    #[test]
    fn record_region_starts_after_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.cdb");
        let mut w = CdbWriter::create(&path).unwrap();
        w.put(b"foo", b"bar").unwrap();
        w.finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let (key_len, val_len) = read_pair(&bytes[INDEX_BYTES..]);
        assert_eq!((key_len, val_len), (3, 3));
        assert_eq!(&bytes[INDEX_BYTES + 8..INDEX_BYTES + 11], b"foo");
        assert_eq!(&bytes[INDEX_BYTES + 11..INDEX_BYTES + 14], b"bar");
    }

    #[test]
    fn tables_have_twice_the_bucket_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("double.cdb");
        let mut w = CdbWriter::create(&path).unwrap();
        for i in 0..100u32 {
            w.put(format!("key{i}").as_bytes(), b"v").unwrap();
        }
        w.finish().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut slots = 0u64;
        for i in 0..TABLE_COUNT {
            let (_, length) = read_pair(&bytes[i * PAIR_BYTES..]);
            slots += u64::from(length);
        }
        assert_eq!(slots, 200);
    }

    // -------------------- Crash safety --------------------

    #[test]
    fn temp_file_is_gone_after_finish() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.cdb");
        let mut w = CdbWriter::create(&path).unwrap();
        w.put(b"k", b"v").unwrap();
        w.finish().unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("cdb.tmp").exists());
    }

    #[test]
    fn abandoned_writer_leaves_no_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.cdb");
        let mut w = CdbWriter::create(&path).unwrap();
        w.put(b"k", b"v").unwrap();
        drop(w);

        assert!(!path.exists());
    }

    // -------------------- Rejections --------------------

    #[test]
    fn zero_hash_key_is_rejected() {
        fn always_zero(_: &[u8]) -> u32 {
            0
        }

        let dir = tempdir().unwrap();
        let path = dir.path().join("zero.cdb");
        let mut w = CdbWriter::create_with_hasher(&path, always_zero).unwrap();
        assert!(matches!(w.put(b"k", b"v"), Err(Error::ZeroHashKey)));
    }
}
