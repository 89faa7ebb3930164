//! # cdb — Constant Database
//!
//! A write-once, read-many on-disk key/value store in the style of
//! D. J. Bernstein's cdb. The file is built offline by [`CdbWriter`] and is
//! immutable thereafter; [`Cdb`] answers point lookups against it in O(1)
//! expected time with no locking and no per-query index state.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ PRIMARY INDEX (2048 bytes, always present)    │
//! │                                               │
//! │ 256 × [table_offset (u32) | table_len (u32)]  │
//! ├───────────────────────────────────────────────┤
//! │ RECORDS                                       │
//! │                                               │
//! │ key_len (u32) | val_len (u32) | key | value   │
//! │                                               │
//! │ ... repeated for each entry ...               │
//! ├───────────────────────────────────────────────┤
//! │ SECONDARY TABLES (256 hash tables)            │
//! │                                               │
//! │ table i: table_len_i slots of                 │
//! │   [slot_hash (u32) | record_offset (u32)]     │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. A key's hash selects a secondary table
//! by its low 8 bits; the remaining 24 bits pick the starting slot for a
//! linear probe. A `slot_hash` of 0 marks an empty slot and terminates the
//! probe.
//!
//! ## Example
//!
//! ```
//! use cdb::{Cdb, CdbWriter};
//!
//! # fn main() -> cdb::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("example.cdb");
//!
//! let mut writer = CdbWriter::create(&path)?;
//! writer.put(b"hello", b"world")?;
//! writer.finish()?;
//!
//! let db = Cdb::open(&path)?;
//! assert_eq!(db.get(b"hello")?, Some(b"world".to_vec()));
//! assert_eq!(db.get(b"missing")?, None);
//! # Ok(())
//! # }
//! ```

mod error;
mod format;
mod hash;
mod reader;
mod source;
mod writer;

pub use error::{Error, Result};
pub use hash::{cdb_hash, HashFn};
pub use reader::Cdb;
pub use source::ByteSource;
pub use writer::CdbWriter;
