//! Parallel batch extraction.
//!
//! [`visit_parallel`] reads the index once, then fans the entries out over
//! Rayon workers. A reader owns a single cursor, so each worker opens its
//! own handle on the archive file instead of sharing one. Outcomes come back
//! in index order, exactly as [`ResReader::visit_matching`] would produce
//! them.
//!
//! Without the `parallel` feature the same functions run sequentially on a
//! single handle.

use std::convert::Infallible;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ResError;
use crate::index::IndexEntry;
use crate::io_stream::{BatchReport, ResReader};

#[cfg(feature = "parallel")]
use crate::io_stream::EntryOutcome;

/// Extract every entry of the archive at `path`, keeping the payloads.
///
/// Only header and index failures are returned as errors; per-entry
/// failures are recorded in the report.
pub fn extract_parallel<P: AsRef<Path>>(path: P) -> Result<BatchReport, ResError> {
    visit_parallel(path, |_| true, |_, _, data| Ok::<_, Infallible>(data)).map_err(|e| match e {
        VisitError::Open(e) => e,
        VisitError::Visit(never) => match never {},
    })
}

/// Why [`visit_parallel`] stopped.
#[derive(Debug)]
pub enum VisitError<E> {
    /// The archive header or index could not be read.
    Open(ResError),
    /// The visitor failed.
    Visit(E),
}

/// Read the entries accepted by `select` on worker threads and hand each
/// payload to `visit`. Each worker holds one payload at a time.
pub fn visit_parallel<P, T, E, F, V>(path: P, select: F, visit: V) -> Result<BatchReport<T>, VisitError<E>>
where
    P: AsRef<Path>,
    T: Send,
    E: Send,
    F: Fn(&IndexEntry) -> bool + Sync,
    V: Fn(usize, &IndexEntry, Vec<u8>) -> Result<T, E> + Sync,
{
    let path = path.as_ref();
    let open = || -> Result<_, ResError> { ResReader::open(BufReader::new(File::open(path)?)) };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let entries = open().map_err(VisitError::Open)?.entries;

        let outcomes: Vec<EntryOutcome<T>> = entries
            .into_par_iter()
            .enumerate()
            .filter(|(_, entry)| select(entry))
            .map_init(
                open,
                |worker, (position, entry)| {
                    let read = match worker {
                        Ok(r) => r.extract(&entry),
                        Err(e) => Err(ResError::Io(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            e.to_string(),
                        ))),
                    };
                    let result = match read {
                        Ok(data) => Ok(visit(position, &entry, data).map_err(VisitError::Visit)?),
                        Err(e) => Err(e),
                    };
                    Ok(EntryOutcome { position, entry, result })
                },
            )
            .collect::<Result<_, VisitError<E>>>()?;

        let report = BatchReport { outcomes };
        report.log_failures();
        Ok(report)
    }

    #[cfg(not(feature = "parallel"))]
    {
        open()
            .map_err(VisitError::Open)?
            .visit_matching(select, visit)
            .map_err(VisitError::Visit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Tag;
    use crate::io_stream::ResWriter;
    use tempfile::tempdir;

    #[test]
    fn matches_sequential_extraction() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MAX.RES");
        let mut w = ResWriter::new(File::create(&path).unwrap()).unwrap();
        for i in 0..32u8 {
            w.add_entry(&format!("S_{i:02}"), &vec![i; i as usize * 7]).unwrap();
        }
        w.finalize().unwrap();

        let parallel = extract_parallel(&path).unwrap();
        let mut seq = ResReader::open(BufReader::new(File::open(&path).unwrap())).unwrap();
        let sequential = seq.extract_all();

        assert_eq!(parallel.total(), 32);
        assert_eq!(parallel.extracted(), 32);
        for (p, s) in parallel.outcomes.iter().zip(&sequential.outcomes) {
            assert_eq!(p.position, s.position);
            assert_eq!(p.result.as_ref().unwrap(), s.result.as_ref().unwrap());
        }
    }

    #[test]
    fn visitor_sees_selected_entries_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MAX.RES");
        let mut w = ResWriter::new(File::create(&path).unwrap()).unwrap();
        for i in 0..10u8 {
            let tag = if i % 2 == 0 { "S_EVEN" } else { "S_ODD" };
            w.add_entry(tag, &vec![i; 3]).unwrap();
        }
        w.finalize().unwrap();

        let report = visit_parallel(
            &path,
            |e| e.tag.matches("S_ODD"),
            |_, _, data| Ok::<_, ()>(data[0]),
        )
        .unwrap();
        let firsts: Vec<u8> = report.outcomes.iter().map(|o| *o.result.as_ref().unwrap()).collect();
        assert_eq!(firsts, vec![1, 3, 5, 7, 9]);

        let stopped = visit_parallel(&path, |_| true, |position, _, _| {
            if position == 4 { Err("no space") } else { Ok(()) }
        });
        assert!(matches!(stopped, Err(VisitError::Visit("no space"))));
    }

    #[test]
    fn failed_entry_does_not_stop_workers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("BAD.RES");
        let mut w = ResWriter::new(File::create(&path).unwrap()).unwrap();
        w.add_entry("A", b"alpha").unwrap();
        w.add_entry("B", b"beta").unwrap();
        w.finalize().unwrap();

        // Rewrite the index with an extra record pointing past the end.
        let reader = ResReader::open(BufReader::new(File::open(&path).unwrap())).unwrap();
        let mut entries = reader.entries.clone();
        entries.push(IndexEntry::new(Tag::new("GONE").unwrap(), 1_000_000, 4));
        let index_offset = reader.header.offset;
        drop(reader);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.truncate(index_offset as usize);
        for e in &entries {
            e.write(&mut bytes).unwrap();
        }
        let header = crate::header::ArchiveHeader {
            id:     crate::header::DEFAULT_ID,
            offset: index_offset,
            size:   (entries.len() * 16) as i32,
        };
        let mut head = Vec::new();
        header.write(&mut head).unwrap();
        bytes[..12].copy_from_slice(&head);
        std::fs::write(&path, bytes).unwrap();

        let report = extract_parallel(&path).unwrap();
        assert_eq!(report.summary(), "2 of 3 entries extracted");
        assert!(matches!(report.outcomes[2].result, Err(ResError::ShortRead { .. })));
    }
}
