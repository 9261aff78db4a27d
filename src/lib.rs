pub mod archive;
pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod header;
pub mod index;
pub mod io_stream;
pub mod perf;
pub mod report;

pub use archive::{EntryInfo, ExtractOptions, ResArchive};
pub use classify::{classify_tag, is_text_tag, ContentType};
pub use codec::{count_codepoints, decode_to_legacy, transliterate_cyrillic};
pub use error::ResError;
pub use header::ArchiveHeader;
pub use index::{IndexEntry, Tag};
pub use io_stream::{BatchReport, EntryOutcome, ResReader, ResWriter};
