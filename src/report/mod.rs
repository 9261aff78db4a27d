//! Human-readable artifacts: structure listing, per-entry hex dumps and raw
//! text siblings.
//!
//! Layout under the output directory:
//!
//! ```text
//! RES_Structure/<base>_Structure.md
//! RES_Dump/<base>_<tag>_Dump.md      (dump mode)
//! RES_TXT/<base>_<tag>.txt           (dump mode, text tags only)
//! ```
//!
//! `<base>` is the archive file name with `.` replaced by `_`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::archive::{EntryInfo, ResArchive};
use crate::error::ResError;
use crate::header::ArchiveHeader;

pub const STRUCTURE_DIR: &str = "RES_Structure";
pub const DUMP_DIR:      &str = "RES_Dump";
pub const TEXT_DIR:      &str = "RES_TXT";

const BYTES_PER_LINE: usize = 16;

// ── ReportOptions ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_dir: PathBuf,
    /// Also write a hex dump per entry and text siblings.
    pub dump:       bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("doc/specs"), dump: false }
    }
}

#[derive(Debug, Default)]
pub struct ReportSummary {
    pub structure_file: PathBuf,
    pub dump_files:     Vec<PathBuf>,
    pub text_files:     Vec<PathBuf>,
    /// Entries whose payload could not be read.
    pub failed:         usize,
}

// ── Naming ───────────────────────────────────────────────────────────────────

/// Replace every byte that is not ASCII alphanumeric, `_` or `-` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Hands out unique file stems for tags, which are not unique themselves.
#[derive(Debug, Default)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    pub fn claim(&mut self, tag: &str) -> String {
        let mut base = sanitize_filename(tag);
        if base.is_empty() {
            base = "untagged".to_owned();
        }
        let mut candidate = base.clone();
        let mut n = 0;
        while !self.used.insert(candidate.clone()) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        candidate
    }
}

// ── Formatting ───────────────────────────────────────────────────────────────

/// 16 bytes per line: offset, two groups of 8 hex bytes, ASCII column.
///
/// ```text
/// 00000000  48 65 6c 6c 6f 00 01 02  03 04 05 06 07 08 09 0a  |Hello...........|
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    data.chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(line, chunk)| hex_line(line * BYTES_PER_LINE, chunk))
        .collect()
}

fn hex_line(offset: usize, chunk: &[u8]) -> String {
    let mut hex = String::with_capacity(3 * BYTES_PER_LINE + 1);
    for j in 0..BYTES_PER_LINE {
        match chunk.get(j) {
            Some(b) => hex.push_str(&format!("{b:02x} ")),
            None    => hex.push_str("   "),
        }
        if j == 7 {
            hex.push(' ');
        }
    }
    let ascii: String = chunk
        .iter()
        .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
        .collect();
    format!("{offset:08x}  {hex} |{ascii}|\n")
}

pub fn structure_markdown(
    file_name: &str,
    path:      &Path,
    header:    &ArchiveHeader,
    entries:   &[EntryInfo],
) -> String {
    let mut out = format!(
        "# Structure of {file_name}\n\n\
         **File**: `{path}`\n\n\
         ## Header\n\n\
         *   **ID**: `{id}`\n\
         *   **Index Offset**: `{offset}` (0x{offset:x})\n\
         *   **Index Size**: `{size}` bytes\n\
         *   **Item Count**: `{count}`\n\n\
         ## Contents (Index Table)\n\n\
         | Tag | Offset | Size (bytes) | End | Type |\n\
         | :--- | :--- | :--- | :--- | :--- |\n",
        path   = path.display(),
        id     = header.id_display(),
        offset = header.offset,
        size   = header.size,
        count  = header.item_count(),
    );
    for e in entries {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            e.tag, e.offset, e.size, e.end, e.content_type
        ));
    }
    out.push('\n');
    out
}

pub fn entry_dump_markdown(
    file_name: &str,
    info:      &EntryInfo,
    payload:   &Result<Vec<u8>, ResError>,
) -> String {
    let mut out = format!(
        "# Dump of {tag}\n\n\
         *   **File**: {file_name}\n\
         *   **Tag**: `{tag}`\n\
         *   **Type**: {kind}\n\
         *   **Offset**: {offset}\n\
         *   **Size**: {size} bytes\n",
        tag    = info.tag,
        kind   = info.content_type,
        offset = info.offset,
        size   = info.size,
    );
    match payload {
        Ok(data) => {
            out.push_str(&format!("*   **BLAKE3**: `{}`\n\n", blake3::hash(data).to_hex()));
            out.push_str("## Hex Dump\n\n```text\n");
            out.push_str(&hex_dump(data));
            out.push_str("```\n");
        }
        Err(e) => out.push_str(&format!("\n**Error reading data**: {e}\n")),
    }
    out
}

// ── Writer ───────────────────────────────────────────────────────────────────

/// Write the structure report and, in dump mode, the per-entry artifacts.
///
/// An entry that cannot be read still gets a dump file noting the error;
/// the run carries on with the next entry.
pub fn write_reports(archive: &mut ResArchive, opts: &ReportOptions) -> Result<ReportSummary, ResError> {
    let base = archive.base_name();
    let file_name = archive
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let entries = archive.list();

    let structure_dir = opts.output_dir.join(STRUCTURE_DIR);
    fs::create_dir_all(&structure_dir)?;
    let structure_file = structure_dir.join(format!("{base}_Structure.md"));
    let md = structure_markdown(&file_name, archive.path(), archive.header(), &entries);
    fs::write(&structure_file, md)?;
    info!("generated structure file {}", structure_file.display());

    let mut summary = ReportSummary { structure_file, ..ReportSummary::default() };
    if !opts.dump {
        return Ok(summary);
    }

    let dump_dir = opts.output_dir.join(DUMP_DIR);
    let text_dir = opts.output_dir.join(TEXT_DIR);
    fs::create_dir_all(&dump_dir)?;
    fs::create_dir_all(&text_dir)?;
    info!("dumping {} entries to {}", entries.len(), dump_dir.display());

    let index: Vec<_> = archive.entries().to_vec();
    let mut names = OutputNames::default();
    for (info, entry) in entries.iter().zip(index.iter()) {
        let stem = names.claim(&info.tag);
        let payload = archive.read_entry(entry);
        if let Err(e) = &payload {
            warn!("entry #{} '{}': {}", info.position, info.tag, e);
            summary.failed += 1;
        }

        let dump_file = dump_dir.join(format!("{base}_{stem}_Dump.md"));
        fs::write(&dump_file, entry_dump_markdown(&file_name, info, &payload))?;
        summary.dump_files.push(dump_file);

        if let Ok(data) = &payload {
            if info.is_text {
                let txt = text_dir.join(format!("{base}_{stem}.txt"));
                fs::write(&txt, data)?;
                info!("extracted text to {}", txt.display());
                summary.text_files.push(txt);
            }
        }
    }
    info!("dump complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexEntry, Tag};

    #[test]
    fn hex_dump_full_and_partial_lines() {
        let data: Vec<u8> = b"Hello, world!\x00\x01\x7fXYZ".to_vec();
        let dump = hex_dump(&data);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "00000000  48 65 6c 6c 6f 2c 20 77  6f 72 6c 64 21 00 01 7f  |Hello, world!...|"
        );
        assert_eq!(
            lines[1],
            "00000010  58 59 5a                                          |XYZ|"
        );
    }

    #[test]
    fn hex_dump_empty() {
        assert_eq!(hex_dump(&[]), "");
    }

    #[test]
    fn sanitize_replaces_unsafe_chars() {
        assert_eq!(sanitize_filename("HELP_ENG"), "HELP_ENG");
        assert_eq!(sanitize_filename("A/B.C D"), "A_B_C_D");
        assert_eq!(sanitize_filename("snow-1"), "snow-1");
    }

    #[test]
    fn output_names_are_unique() {
        let mut names = OutputNames::default();
        assert_eq!(names.claim("P_X"), "P_X");
        assert_eq!(names.claim("P_X"), "P_X_1");
        assert_eq!(names.claim("P_X_1"), "P_X_1_1");
        assert_eq!(names.claim(""), "untagged");
    }

    #[test]
    fn structure_table_rows() {
        let header = ArchiveHeader { id: *b"MAXR", offset: 12, size: 32 };
        let entries = vec![
            EntryInfo::new(0, &IndexEntry::new(Tag::new("FONT_01").unwrap(), 44, 100)),
            EntryInfo::new(1, &IndexEntry::new(Tag::new("HELP_ENG").unwrap(), 144, 50)),
        ];
        let md = structure_markdown("MAX.RES", Path::new("/data/MAX.RES"), &header, &entries);
        assert!(md.contains("*   **ID**: `MAXR`"));
        assert!(md.contains("*   **Index Offset**: `12` (0xc)"));
        assert!(md.contains("*   **Item Count**: `2`"));
        assert!(md.contains("| `FONT_01` | 44 | 100 | 144 | Font |"));
        assert!(md.contains("| `HELP_ENG` | 144 | 50 | 194 | Text/Data |"));
    }

    #[test]
    fn dump_notes_read_errors() {
        let info = EntryInfo::new(0, &IndexEntry::new(Tag::new("S_BAD").unwrap(), 90, 20));
        let err = Err(ResError::ShortRead { tag: "S_BAD".into(), offset: 90, size: 20, available: 5 });
        let md = entry_dump_markdown("MAX.RES", &info, &err);
        assert!(md.contains("**Error reading data**"));
        assert!(!md.contains("Hex Dump"));

        let ok = entry_dump_markdown("MAX.RES", &info, &Ok(b"abc".to_vec()));
        assert!(md.starts_with("# Dump of S_BAD"));
        assert!(ok.contains("*   **Type**: Sound (Sfx)"));
        assert!(ok.contains("```text\n00000000  61 62 63"));
    }
}
