use clap::{Parser, Subcommand};
use log::info;
use maxres::archive::{ExtractOptions, ResArchive};
use maxres::codec::{decode_to_legacy, to_upper, transliterate_cyrillic};
use maxres::config;
use maxres::header::DEFAULT_ID;
use maxres::io_stream::ResWriter;
use maxres::report::{write_reports, ReportOptions};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "maxres", version, about = "Inspect, extract and build M.A.X. RES archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header fields, type counts and duplicated payloads
    Info {
        /// Archive path; located via settings.ini when omitted
        archive: Option<PathBuf>,
    },
    /// List the index table
    List {
        archive: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write the markdown structure report
    Dump {
        archive: Option<PathBuf>,
        #[arg(short = 'C', long, default_value = "doc/specs")]
        output_dir: PathBuf,
        /// Also write per-entry hex dumps and text files
        #[arg(long)]
        dump: bool,
    },
    /// Write raw entry payloads to a directory
    Extract {
        archive: Option<PathBuf>,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        /// Only extract entries with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Skip the .txt copies of text entries
        #[arg(long)]
        no_text: bool,
        /// Read entries on worker threads
        #[arg(short, long)]
        parallel: bool,
    },
    /// Convert a UTF-8 text file to code page 850
    Encode {
        input:  PathBuf,
        output: PathBuf,
        /// Spell Cyrillic letters in Latin first
        #[arg(short, long)]
        transliterate: bool,
    },
    /// Build an archive; each file is tagged with its upper-cased stem
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        /// Four-byte archive identifier
        #[arg(long, value_parser = parse_id)]
        id: Option<[u8; 4]>,
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { archive } => {
            let mut ar = open_archive(archive)?;
            let header = *ar.header();

            println!("── RES Archive ──────────────────────────────────────────");
            println!("  Path           {}", ar.path().display());
            println!("  Size           {} B", ar.total_len());
            println!("  ID             {}", header.id_display());
            println!("  Index offset   {} (0x{:x})", header.offset, header.offset);
            println!("  Index size     {} B", header.size);
            println!("  Entries        {}", header.item_count());
            println!("  Types:");
            for (kind, n) in ar.type_counts() {
                println!("    {:<14} {}", kind.label(), n);
            }

            let list = ar.list();
            let dups = ar.duplicate_payloads();
            println!("  Duplicated payloads ({}):", dups.len());
            for group in dups {
                let tags: Vec<&str> = group.iter().map(|&i| list[i].tag.as_str()).collect();
                println!("    {}", tags.join(", "));
            }
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { archive, json } => {
            let ar = open_archive(archive)?;
            let list = ar.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                println!("Archive: {}", ar.path().display());
                println!("{:<10} {:>10} {:>10} {:>10}  Type", "Tag", "Offset", "Size", "End");
                for e in &list {
                    println!("{:<10} {:>10} {:>10} {:>10}  {}",
                        e.tag, e.offset, e.size, e.end, e.content_type);
                }
            }
        }

        // ── Dump ─────────────────────────────────────────────────────────────
        Commands::Dump { archive, output_dir, dump } => {
            let mut ar = open_archive(archive)?;
            let summary = write_reports(&mut ar, &ReportOptions { output_dir, dump })?;
            println!("Structure: {}", summary.structure_file.display());
            if dump {
                println!("Dumps:     {} ({} unreadable)", summary.dump_files.len(), summary.failed);
                println!("Text:      {}", summary.text_files.len());
            }
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { archive, output_dir, tag, no_text, parallel } => {
            let mut ar = open_archive(archive)?;
            let opts = ExtractOptions { text_siblings: !no_text, only_tag: tag, parallel };
            match ar.extract_to(&output_dir, &opts) {
                Ok(report) => {
                    println!("{}", report.summary());
                    println!("Extracted to: {}", output_dir.display());
                }
                Err(e) if e.is_entry_local() => eprintln!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }

        // ── Encode ───────────────────────────────────────────────────────────
        Commands::Encode { input, output, transliterate } => {
            let raw = std::fs::read(&input)?;
            let bytes = if transliterate {
                decode_to_legacy(transliterate_cyrillic(&String::from_utf8_lossy(&raw)))
            } else {
                decode_to_legacy(&raw)
            };
            std::fs::write(&output, &bytes)?;
            println!("Encoded {} → {} ({} bytes)", input.display(), output.display(), bytes.len());
        }

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, id, input } => {
            let file = BufWriter::new(File::create(&output)?);
            let mut w = ResWriter::with_id(file, id.unwrap_or(DEFAULT_ID))?;
            for path in &input {
                let tag = tag_for(path);
                let data = std::fs::read(path)?;
                w.add_entry(&tag, &data)?;
                println!("  packed  {:<8} {}", tag, path.display());
            }
            w.finalize()?;
            println!("Created: {}", output.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn open_archive(path: Option<PathBuf>) -> Result<ResArchive, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p,
        None => {
            let found = config::locate_default_archive()?;
            info!("using {}", found.display());
            found
        }
    };
    Ok(ResArchive::open(path)?)
}

fn tag_for(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    to_upper(&stem)
}

fn parse_id(s: &str) -> Result<[u8; 4], String> {
    let bytes = s.as_bytes();
    if bytes.len() > 4 {
        return Err(format!("'{s}' is longer than 4 bytes"));
    }
    let mut id = [0u8; 4];
    id[..bytes.len()].copy_from_slice(bytes);
    Ok(id)
}
