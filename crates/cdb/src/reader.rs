use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;
use crate::format::{read_pair, INDEX_BYTES, PAIR_BYTES, TABLE_COUNT};
use crate::hash::{cdb_hash, HashFn};
use crate::source::ByteSource;

/// One primary-index entry: where a secondary hash table sits and how many
/// slots it has. A length of 0 means the bucket is empty.
#[derive(Debug, Clone, Copy, Default)]
struct Table {
    offset: u32,
    length: u32,
}

/// An open constant database, generic over its byte source.
///
/// On open the 2048-byte primary index is read once and decoded into a
/// fixed 256-entry array; that is the only state the reader keeps. Every
/// lookup then costs one or more 8-byte slot reads plus at most one record
/// fetch, all served by stateless positioned reads — a single handle is
/// safe for concurrent lookups from many threads.
///
/// The three stock backings are a [`File`] (via [`Cdb::open`]), a read-only
/// memory mapping (via [`Cdb::open_mmap`]), and any in-memory byte buffer
/// (via [`Cdb::new`] — `Vec<u8>` and `&[u8]` implement [`ByteSource`]).
pub struct Cdb<S> {
    source: S,
    hasher: HashFn,
    index: [Table; TABLE_COUNT],
}

impl Cdb<File> {
    /// Opens the database file at `path` with the canonical CDB hash.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl Cdb<Mmap> {
    /// Maps the file at `path` read-only and serves every lookup from the
    /// mapping — no per-query syscalls.
    pub fn open_mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::new(mmap)
    }
}

impl<S: ByteSource> Cdb<S> {
    /// Opens a database over an arbitrary byte source with the canonical
    /// CDB hash.
    ///
    /// # Errors
    ///
    /// Fails if the leading 2048-byte primary index cannot be read; no
    /// partially constructed database is returned.
    pub fn new(source: S) -> Result<Self> {
        Self::with_hasher(source, cdb_hash)
    }

    /// Opens a database over an arbitrary byte source with an injected
    /// hash function.
    ///
    /// `hasher` must be the function the database was built with. A
    /// mismatch does not error — lookups silently miss or return the wrong
    /// record. The caller is responsible for matching hashers.
    pub fn with_hasher(source: S, hasher: HashFn) -> Result<Self> {
        let mut buf = [0u8; INDEX_BYTES];
        source.read_at(&mut buf, 0)?;

        let mut index = [Table::default(); TABLE_COUNT];
        for (i, table) in index.iter_mut().enumerate() {
            let (offset, length) = read_pair(&buf[i * PAIR_BYTES..]);
            *table = Table { offset, length };
        }

        Ok(Self {
            source,
            hasher,
            index,
        })
    }

    /// Point lookup for a single key.
    ///
    /// Returns `Ok(Some(value))` if the key is present, `Ok(None)` if it is
    /// absent. Absence is a normal result, distinct from an empty value and
    /// from an error; `Err(_)` means the answer could not be determined.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.get_with_hash(key, (self.hasher)(key))
    }

    /// Point lookup using the canonical CDB hash regardless of the bound
    /// hasher.
    pub fn get_with_cdb_hash(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.get_with_hash(key, cdb_hash(key))
    }

    /// Point lookup with a precomputed hash, for callers reusing a hash
    /// across repeated lookups or bypassing the bound hasher.
    pub fn get_with_hash(&self, key: &[u8], hash: u32) -> Result<Option<Vec<u8>>> {
        let table = self.index[(hash & 0xff) as usize];
        if table.length == 0 {
            return Ok(None);
        }

        let start_slot = (hash >> 8) % table.length;
        let mut slot = start_slot;

        loop {
            let mut buf = [0u8; PAIR_BYTES];
            let slot_offset = u64::from(table.offset) + u64::from(slot) * PAIR_BYTES as u64;
            self.source.read_at(&mut buf, slot_offset)?;
            let (slot_hash, record_offset) = read_pair(&buf);

            // An empty slot ends the probe: the writer leaves no holes
            // before the terminator.
            if slot_hash == 0 {
                return Ok(None);
            }
            if slot_hash == hash {
                if let Some(value) = self.read_record(record_offset, key)? {
                    return Ok(Some(value));
                }
            }

            slot = (slot + 1) % table.length;
            if slot == start_slot {
                // Fully scanned. A conformant writer never fills a table,
                // but the guard bounds the probe on corrupt input.
                return Ok(None);
            }
        }
    }

    /// Fetches the record at `record_offset` and returns its value if its
    /// key is exactly `key`. A mismatch is a slot-hash collision on a
    /// different key, not an error.
    fn read_record(&self, record_offset: u32, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut header = [0u8; PAIR_BYTES];
        self.source.read_at(&mut header, u64::from(record_offset))?;
        let (key_len, val_len) = read_pair(&header);

        // Length check first: most colliding slots die in 8 bytes.
        if key_len as usize != key.len() {
            return Ok(None);
        }

        let mut buf = vec![0u8; key_len as usize + val_len as usize];
        self.source
            .read_at(&mut buf, u64::from(record_offset) + PAIR_BYTES as u64)?;
        if &buf[..key.len()] != key {
            return Ok(None);
        }
        Ok(Some(buf.split_off(key.len())))
    }

    /// Consumes the database and releases its byte source.
    ///
    /// Dropping the handle has the same effect; `close` exists to make the
    /// release explicit at call sites. Because it takes the database by
    /// value, lookups after close are rejected at compile time.
    pub fn close(self) -> Result<()> {
        drop(self.source);
        Ok(())
    }
}
