//! Index table records.
//!
//! The index is a contiguous run of 16-byte records located by the archive
//! header. Records keep their on-disk order; tags are not unique and
//! callers that look an entry up by tag take the first match.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::{self, Write};
use std::ops::Range;

use crate::error::ResError;

/// On-disk size of one [`IndexEntry`].
pub const INDEX_ENTRY_SIZE: usize = 16;
/// Width of the tag field.
pub const TAG_LEN: usize = 8;

// ── Tag ──────────────────────────────────────────────────────────────────────

/// 8-byte NUL-padded entry name. Not necessarily NUL-terminated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tag([u8; TAG_LEN]);

impl Tag {
    pub fn new(name: &str) -> Result<Self, ResError> {
        let bytes = name.as_bytes();
        if bytes.len() > TAG_LEN {
            return Err(ResError::TagTooLong { tag: name.to_owned() });
        }
        let mut raw = [0u8; TAG_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(raw))
    }

    pub fn from_bytes(raw: [u8; TAG_LEN]) -> Self {
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    /// The tag with every NUL byte dropped, wherever it sits.
    pub fn name(&self) -> String {
        let kept: Vec<u8> = self.0.iter().copied().filter(|&b| b != 0).collect();
        String::from_utf8_lossy(&kept).into_owned()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name() == name
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({:?})", self.name())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

// ── IndexEntry ───────────────────────────────────────────────────────────────

/// One 16-byte index record.
///
/// ```text
/// 0   8  tag
/// 8   4  data_offset  i32  absolute offset from archive start
/// 12  4  data_size    i32
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub tag:         Tag,
    pub data_offset: i32,
    pub data_size:   i32,
}

impl IndexEntry {
    pub fn new(tag: Tag, data_offset: i32, data_size: i32) -> Self {
        Self { tag, data_offset, data_size }
    }

    pub fn parse(buf: &[u8; INDEX_ENTRY_SIZE]) -> Self {
        let mut raw = [0u8; TAG_LEN];
        raw.copy_from_slice(&buf[0..8]);
        Self {
            tag:         Tag::from_bytes(raw),
            data_offset: LittleEndian::read_i32(&buf[8..12]),
            data_size:   LittleEndian::read_i32(&buf[12..16]),
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.tag.as_bytes())?;
        writer.write_i32::<LittleEndian>(self.data_offset)?;
        writer.write_i32::<LittleEndian>(self.data_size)?;
        Ok(())
    }

    /// `data_offset + data_size`, computed without overflow.
    pub fn end(&self) -> i64 {
        self.data_offset as i64 + self.data_size as i64
    }

    /// The payload's byte range, or `ShortRead` if it does not lie inside an
    /// archive of `total_len` bytes.
    pub fn byte_range(&self, total_len: u64) -> Result<Range<u64>, ResError> {
        if self.data_offset < 0 || self.data_size < 0 || self.end() as u64 > total_len {
            let available = if self.data_offset < 0 {
                0
            } else {
                total_len.saturating_sub(self.data_offset as u64)
            };
            return Err(ResError::ShortRead {
                tag:    self.tag.name(),
                offset: self.data_offset as i64,
                size:   self.data_size as i64,
                available,
            });
        }
        Ok(self.data_offset as u64..self.end() as u64)
    }
}

/// Decode the first `count` whole records from a raw index table.
pub fn parse_table(table: &[u8], count: usize) -> Vec<IndexEntry> {
    table
        .chunks_exact(INDEX_ENTRY_SIZE)
        .take(count)
        .map(|chunk| {
            let mut rec = [0u8; INDEX_ENTRY_SIZE];
            rec.copy_from_slice(chunk);
            IndexEntry::parse(&rec)
        })
        .collect()
}
