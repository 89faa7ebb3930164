use std::io;

use thiserror::Error;

/// Errors surfaced by the database reader and writer.
///
/// A missing key is **not** an error — lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The records or tables grew past the format's u32 addressing range.
    #[error("database exceeds the format's 4 GiB addressing limit")]
    TooLarge,
    /// The key hashes to 0, which the format reserves as the empty-slot
    /// sentinel; a record stored under it could never be looked up again.
    #[error("key hashes to the reserved empty-slot sentinel (0)")]
    ZeroHashKey,
}

pub type Result<T> = std::result::Result<T, Error>;
