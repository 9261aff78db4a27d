//! High-level [`ResArchive`] API over a RES file on disk.
//!
//! ```no_run
//! use maxres::archive::ResArchive;
//!
//! let mut ar = ResArchive::open("MAX.RES")?;
//! for info in ar.list() {
//!     println!("{:<8} {:>8} {}", info.tag, info.size, info.content_type);
//! }
//! let tips = ar.read("TIPS")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::classify::{classify_tag, is_text_tag, ContentType};
use crate::error::ResError;
use crate::header::ArchiveHeader;
use crate::index::IndexEntry;
use crate::io_stream::{BatchReport, ResReader};
use crate::perf::VisitError;
use crate::report::OutputNames;

// ── ExtractOptions ───────────────────────────────────────────────────────────

/// Configuration for [`ResArchive::extract_to`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Also write text-tag payloads, unmodified, as `<tag>.txt`.
    pub text_siblings: bool,
    /// Only extract entries with this tag.
    pub only_tag:      Option<String>,
    /// Read payloads on worker threads, one file handle each.
    pub parallel:      bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { text_siblings: true, only_tag: None, parallel: false }
    }
}

// ── EntryInfo ────────────────────────────────────────────────────────────────

/// One row of the structure listing.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub position:     usize,
    pub tag:          String,
    pub offset:       i32,
    pub size:         i32,
    pub end:          i64,
    pub content_type: ContentType,
    pub is_text:      bool,
}

impl EntryInfo {
    pub fn new(position: usize, entry: &IndexEntry) -> Self {
        let tag = entry.tag.name();
        EntryInfo {
            position,
            content_type: classify_tag(&tag),
            is_text:      is_text_tag(&tag),
            offset:       entry.data_offset,
            size:         entry.data_size,
            end:          entry.end(),
            tag,
        }
    }
}

// ── ResArchive ───────────────────────────────────────────────────────────────

pub struct ResArchive {
    path:   PathBuf,
    reader: ResReader<BufReader<File>>,
}

impl ResArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ResError> {
        let path = path.as_ref().to_owned();
        let reader = ResReader::open(BufReader::new(File::open(&path)?))?;
        info!("opened {} ({} entries)", path.display(), reader.item_count());
        Ok(Self { path, reader })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn header(&self) -> &ArchiveHeader { &self.reader.header }

    pub fn entries(&self) -> &[IndexEntry] { &self.reader.entries }

    pub fn total_len(&self) -> u64 { self.reader.total_len }

    /// Archive file name with `.` replaced by `_`, used to prefix reports.
    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().replace('.', "_"))
            .unwrap_or_else(|| "archive".to_owned())
    }

    pub fn list(&self) -> Vec<EntryInfo> {
        self.reader
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| EntryInfo::new(i, e))
            .collect()
    }

    pub fn stat(&self, tag: &str) -> Option<EntryInfo> {
        self.list().into_iter().find(|e| e.tag == tag)
    }

    /// Payload of the first entry tagged `tag`.
    pub fn read(&mut self, tag: &str) -> Result<Vec<u8>, ResError> {
        self.reader.extract_by_tag(tag)
    }

    pub fn read_entry(&mut self, entry: &IndexEntry) -> Result<Vec<u8>, ResError> {
        self.reader.extract(entry)
    }

    pub fn extract_all(&mut self) -> BatchReport {
        self.reader.extract_all()
    }

    /// Entry counts per content type.
    pub fn type_counts(&self) -> BTreeMap<ContentType, usize> {
        let mut counts = BTreeMap::new();
        for info in self.list() {
            *counts.entry(info.content_type).or_insert(0) += 1;
        }
        counts
    }

    /// Groups of entry positions whose payloads are byte-identical.
    /// Unreadable entries are left out.
    pub fn duplicate_payloads(&mut self) -> Vec<Vec<usize>> {
        let digests = self
            .reader
            .visit_matching(|_| true, |_, _, data| Ok::<_, Infallible>(*blake3::hash(&data).as_bytes()));
        let report = match digests {
            Ok(report) => report,
            Err(never) => match never {},
        };

        let mut by_digest: BTreeMap<[u8; 32], Vec<usize>> = BTreeMap::new();
        for outcome in report.outcomes {
            if let Ok(digest) = outcome.result {
                by_digest.entry(digest).or_default().push(outcome.position);
            }
        }
        by_digest.into_values().filter(|group| group.len() > 1).collect()
    }

    /// Write every readable payload into `dest` as `<tag>.bin`, plus a
    /// `<tag>.txt` copy for text tags. Payloads are written as they are
    /// read; the report keeps the byte count of each. Per-entry read
    /// failures are recorded in the returned report; failures to write
    /// output are returned as errors.
    pub fn extract_to<P: AsRef<Path>>(
        &mut self,
        dest: P,
        opts: &ExtractOptions,
    ) -> Result<BatchReport<u64>, ResError> {
        let dest = dest.as_ref();
        if let Some(tag) = &opts.only_tag {
            if self.reader.find(tag).is_none() {
                return Err(ResError::NotFound { tag: tag.clone() });
            }
        }
        fs::create_dir_all(dest)?;

        let selected = |e: &IndexEntry| opts.only_tag.as_deref().map_or(true, |tag| e.tag.matches(tag));

        // Stems are claimed in index order so names do not depend on
        // which worker finishes first.
        let mut names = OutputNames::default();
        let stems: Vec<Option<String>> = self
            .reader
            .entries
            .iter()
            .map(|e| selected(e).then(|| names.claim(&e.tag.name())))
            .collect();

        let write = |position: usize, entry: &IndexEntry, data: Vec<u8>| -> Result<u64, ResError> {
            let stem = stems[position].as_deref().unwrap_or_default();
            File::create(dest.join(format!("{stem}.bin")))?.write_all(&data)?;
            if opts.text_siblings && is_text_tag(&entry.tag.name()) {
                let txt = dest.join(format!("{stem}.txt"));
                File::create(&txt)?.write_all(&data)?;
                info!("extracted text to {}", txt.display());
            }
            Ok(data.len() as u64)
        };

        if opts.parallel {
            crate::perf::visit_parallel(&self.path, selected, write).map_err(|e| match e {
                VisitError::Open(e) | VisitError::Visit(e) => e,
            })
        } else {
            self.reader.visit_matching(selected, write)
        }
    }
}
