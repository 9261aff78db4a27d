use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::ResError;
use crate::index::INDEX_ENTRY_SIZE;
use crate::io_stream::read_full;

/// On-disk size of [`ArchiveHeader`].
pub const HEADER_SIZE: usize = 12;
/// Identifier written by [`crate::io_stream::ResWriter`] unless told otherwise.
pub const DEFAULT_ID: [u8; 4] = *b"RES\0";

/// Fixed 12-byte record at offset 0.
///
/// ```text
/// 0  4  id            raw bytes, never validated
/// 4  4  offset  i32   absolute offset of the index table
/// 8  4  size    i32   byte length of the index table
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub id:     [u8; 4],
    pub offset: i32,
    pub size:   i32,
}

impl ArchiveHeader {
    pub fn new(id: [u8; 4]) -> Self {
        Self { id, offset: HEADER_SIZE as i32, size: 0 }
    }

    /// Number of whole index records described by `size`.
    ///
    /// A trailing partial record is dropped, matching the engine's integer
    /// division. Negative sizes describe an empty table.
    pub fn item_count(&self) -> usize {
        if self.size <= 0 {
            0
        } else {
            self.size as usize / INDEX_ENTRY_SIZE
        }
    }

    /// True when `size` leaves a remainder that `item_count` discards.
    pub fn has_partial_entry(&self) -> bool {
        self.size > 0 && self.size as usize % INDEX_ENTRY_SIZE != 0
    }

    /// Identifier for display: printable ASCII as text, anything else as hex.
    pub fn id_display(&self) -> String {
        let trimmed: Vec<u8> = self.id.iter().copied().filter(|&b| b != 0).collect();
        if !trimmed.is_empty() && trimmed.iter().all(|b| (0x20..=0x7e).contains(b)) {
            String::from_utf8_lossy(&trimmed).into_owned()
        } else {
            format!("0x{}", hex::encode(self.id))
        }
    }

    /// Decode the header field by field from its on-disk bytes.
    pub fn parse(buf: &[u8; HEADER_SIZE]) -> Self {
        let mut id = [0u8; 4];
        id.copy_from_slice(&buf[0..4]);
        Self {
            id,
            offset: LittleEndian::read_i32(&buf[4..8]),
            size:   LittleEndian::read_i32(&buf[8..12]),
        }
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, ResError> {
        let mut buf = [0u8; HEADER_SIZE];
        let n = read_full(&mut reader, &mut buf)?;
        if n < HEADER_SIZE {
            return Err(ResError::TruncatedHeader { available: n });
        }
        Ok(Self::parse(&buf))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.id)?;
        writer.write_i32::<LittleEndian>(self.offset)?;
        writer.write_i32::<LittleEndian>(self.size)?;
        Ok(())
    }
}
