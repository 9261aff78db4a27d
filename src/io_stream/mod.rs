//! Streaming archive engine: reader and writer.
//!
//! # Reader
//! [`ResReader`] reads the 12-byte header at offset 0, then seeks to the
//! index table and decodes `header.size / 16` records. Header and index
//! failures abort the open. Entry payloads are read on demand; a payload
//! that runs past the end of the source fails with `ShortRead` for that
//! entry only, and batch extraction keeps going.
//!
//! Bytes are returned exactly as stored. Text entries are legacy-encoded
//! and are not transcoded here.
//!
//! # Writer
//! [`ResWriter`] reserves the header, appends payloads in call order,
//! writes the index table after the last payload, then patches the header
//! in place on `finalize()`.
//!
//! # Concurrency
//! A reader owns one cursor and is not shared. Parallel extraction opens
//! one source per worker; see [`crate::perf`].

use std::convert::Infallible;
use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, info, warn};

use crate::classify::{classify_tag, is_text_tag, ContentType};
use crate::error::ResError;
use crate::header::{ArchiveHeader, DEFAULT_ID, HEADER_SIZE};
use crate::index::{parse_table, IndexEntry, Tag, INDEX_ENTRY_SIZE};

/// Fill `buf` from `reader` until it is full or the source is exhausted.
/// Returns the number of bytes read; never pads.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ── Batch results ────────────────────────────────────────────────────────────

/// Result of extracting one entry during a batch. `T` is the payload for a
/// plain extraction, or whatever a visitor kept of it.
#[derive(Debug)]
pub struct EntryOutcome<T = Vec<u8>> {
    /// Position of the entry in the index table.
    pub position: usize,
    pub entry:    IndexEntry,
    pub result:   Result<T, ResError>,
}

impl<T> EntryOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn content_type(&self) -> ContentType {
        classify_tag(&self.entry.tag.name())
    }

    /// True when the payload should also be emitted to the text path.
    pub fn is_text(&self) -> bool {
        is_text_tag(&self.entry.tag.name())
    }
}

/// Per-entry outcomes of a batch extraction, in index order.
#[derive(Debug)]
pub struct BatchReport<T = Vec<u8>> {
    pub outcomes: Vec<EntryOutcome<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self { outcomes: Vec::new() }
    }
}

impl<T> BatchReport<T> {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn extracted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &EntryOutcome<T>> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    pub fn summary(&self) -> String {
        format!("{} of {} entries extracted", self.extracted(), self.total())
    }

    pub(crate) fn log_failures(&self) {
        for o in self.failed() {
            if let Err(e) = &o.result {
                warn!("entry #{} '{}': {}", o.position, o.entry.tag, e);
            }
        }
        info!("{}", self.summary());
    }
}

// ── Reader ───────────────────────────────────────────────────────────────────

pub struct ResReader<R: Read + Seek> {
    reader:        R,
    pub header:    ArchiveHeader,
    pub entries:   Vec<IndexEntry>,
    /// Byte length of the whole source, measured at open.
    pub total_len: u64,
}

impl<R: Read + Seek> ResReader<R> {
    /// Parse the header and index table. The identifier is not checked.
    pub fn open(mut reader: R) -> Result<Self, ResError> {
        let total_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let header = ArchiveHeader::read(&mut reader)?;
        debug!(
            "header id={} index_offset={} index_size={}",
            header.id_display(), header.offset, header.size
        );
        if header.has_partial_entry() {
            warn!(
                "index size {} is not a multiple of {}; trailing {} byte(s) ignored",
                header.size,
                INDEX_ENTRY_SIZE,
                header.size as usize % INDEX_ENTRY_SIZE
            );
        }

        let entries = Self::read_index(&mut reader, &header, total_len)?;
        debug!("read {} index entries", entries.len());

        Ok(Self { reader, header, entries, total_len })
    }

    fn read_index(
        reader:    &mut R,
        header:    &ArchiveHeader,
        total_len: u64,
    ) -> Result<Vec<IndexEntry>, ResError> {
        let truncated = |available: u64| ResError::TruncatedIndex {
            offset:   header.offset as i64,
            expected: header.size as i64,
            available,
        };
        if header.offset < 0 || header.size < 0 {
            return Err(truncated(0));
        }
        let available = total_len.saturating_sub(header.offset as u64);
        if (header.size as u64) > available {
            return Err(truncated(available));
        }

        reader.seek(SeekFrom::Start(header.offset as u64))?;
        let mut table = vec![0u8; header.size as usize];
        let n = read_full(reader, &mut table)?;
        if n < table.len() {
            // The source shrank after open.
            return Err(truncated(n as u64));
        }
        Ok(parse_table(&table, header.item_count()))
    }

    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    /// First entry carrying `tag`.
    pub fn find(&self, tag: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.tag.matches(tag))
    }

    /// Read one entry's payload into a fresh buffer.
    pub fn extract(&mut self, entry: &IndexEntry) -> Result<Vec<u8>, ResError> {
        let range = entry.byte_range(self.total_len)?;
        self.reader.seek(SeekFrom::Start(range.start))?;
        let mut buf = vec![0u8; (range.end - range.start) as usize];
        let n = read_full(&mut self.reader, &mut buf)?;
        if n < buf.len() {
            // The source shrank after open.
            return Err(ResError::ShortRead {
                tag:       entry.tag.name(),
                offset:    entry.data_offset as i64,
                size:      entry.data_size as i64,
                available: n as u64,
            });
        }
        Ok(buf)
    }

    pub fn extract_by_tag(&mut self, tag: &str) -> Result<Vec<u8>, ResError> {
        let entry = *self
            .find(tag)
            .ok_or_else(|| ResError::NotFound { tag: tag.to_owned() })?;
        self.extract(&entry)
    }

    /// Extract every entry. A failed entry never stops the batch.
    pub fn extract_all(&mut self) -> BatchReport {
        self.extract_matching(|_| true)
    }

    /// Extract the entries accepted by `select`, in index order.
    pub fn extract_matching<F>(&mut self, select: F) -> BatchReport
    where
        F: Fn(&IndexEntry) -> bool,
    {
        match self.visit_matching(select, |_, _, data| Ok::<_, Infallible>(data)) {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    /// Read the entries accepted by `select` one at a time and hand each
    /// payload to `visit`, which keeps what it needs. Only one payload is
    /// held at a time.
    ///
    /// Read failures are recorded per entry and the batch continues. An
    /// error returned by `visit` stops the batch and is returned.
    pub fn visit_matching<T, E, F, V>(&mut self, select: F, mut visit: V) -> Result<BatchReport<T>, E>
    where
        F: Fn(&IndexEntry) -> bool,
        V: FnMut(usize, &IndexEntry, Vec<u8>) -> Result<T, E>,
    {
        let entries = self.entries.clone();
        let mut outcomes = Vec::new();
        for (position, entry) in entries.into_iter().enumerate() {
            if !select(&entry) {
                continue;
            }
            let result = match self.extract(&entry) {
                Ok(data) => Ok(visit(position, &entry, data)?),
                Err(e) => Err(e),
            };
            outcomes.push(EntryOutcome { position, entry, result });
        }
        let report = BatchReport { outcomes };
        report.log_failures();
        Ok(report)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct ResWriter<W: Write + Seek> {
    writer:      W,
    pub header:  ArchiveHeader,
    pub entries: Vec<IndexEntry>,
}

impl<W: Write + Seek> ResWriter<W> {
    pub fn new(writer: W) -> io::Result<Self> {
        Self::with_id(writer, DEFAULT_ID)
    }

    pub fn with_id(mut writer: W, id: [u8; 4]) -> io::Result<Self> {
        writer.seek(SeekFrom::Start(0))?;
        writer.write_all(&[0u8; HEADER_SIZE])?; // reserved; overwritten on finalize
        Ok(Self { writer, header: ArchiveHeader::new(id), entries: Vec::new() })
    }

    /// Append a payload and record it under `tag`. Duplicate tags are kept.
    pub fn add_entry(&mut self, tag: &str, data: &[u8]) -> Result<(), ResError> {
        let tag_bytes = Tag::new(tag)?;
        let oversize = || ResError::Oversize { tag: tag.to_owned(), size: data.len() as u64 };

        let offset = self.writer.stream_position()?;
        let data_offset = i32::try_from(offset).map_err(|_| oversize())?;
        let data_size = i32::try_from(data.len()).map_err(|_| oversize())?;
        if data_offset.checked_add(data_size).is_none() {
            return Err(oversize());
        }

        self.writer.write_all(data)?;
        self.entries.push(IndexEntry::new(tag_bytes, data_offset, data_size));
        debug!("added '{}' ({} bytes at {})", tag, data_size, data_offset);
        Ok(())
    }

    /// Write the index table and patch the header. Must be called once.
    pub fn finalize(mut self) -> Result<W, ResError> {
        let index_offset = self.writer.stream_position()?;
        let index_size = self.entries.len() * INDEX_ENTRY_SIZE;
        let too_big = || ResError::Oversize { tag: "<index>".to_owned(), size: index_size as u64 };

        self.header.offset = i32::try_from(index_offset).map_err(|_| too_big())?;
        self.header.size = i32::try_from(index_size).map_err(|_| too_big())?;

        for entry in &self.entries {
            entry.write(&mut self.writer)?;
        }

        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write(&mut self.writer)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
