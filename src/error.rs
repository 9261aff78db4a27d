use std::io;
use thiserror::Error;

/// Failures raised while opening, reading or building a RES archive.
///
/// `TruncatedHeader` and `TruncatedIndex` are fatal to opening an archive.
/// `ShortRead` is local to one entry; batch extraction records it and moves
/// on to the next entry.
#[derive(Error, Debug)]
pub enum ResError {
    #[error("Truncated header: need 12 bytes, only {available} available")]
    TruncatedHeader { available: usize },

    #[error("Truncated index table at offset {offset}: need {expected} bytes, only {available} available")]
    TruncatedIndex { offset: i64, expected: i64, available: u64 },

    #[error("Short read for entry '{tag}': {size} bytes at offset {offset}, only {available} available")]
    ShortRead { tag: String, offset: i64, size: i64, available: u64 },

    #[error("Tag '{tag}' does not fit in 8 bytes")]
    TagTooLong { tag: String },

    #[error("Entry '{tag}' is too large for a 32-bit size field ({size} bytes)")]
    Oversize { tag: String, size: u64 },

    #[error("No entry tagged '{tag}'")]
    NotFound { tag: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ResError {
    /// True for errors that only affect one entry of an open archive.
    pub fn is_entry_local(&self) -> bool {
        matches!(self, ResError::ShortRead { .. } | ResError::NotFound { .. })
    }
}
