//! Locating `MAX.RES` when no path is given.
//!
//! The lookup reads the game's `settings.ini` (section `[SETUP]`, key
//! `game_data`) and then probes a fixed list of archive locations. It is a
//! pure function of the two capabilities passed in, so tests drive it with
//! in-memory fakes.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

pub const ARCHIVE_NAME: &str = "MAX.RES";
const APP_DIR: &str = "max-port";
const SYSTEM_ARCHIVE: &str = "/usr/local/share/max-port/MAX.RES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MAX.RES not found; searched: {}", format_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Capabilities ─────────────────────────────────────────────────────────────

pub trait EnvLookup {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
pub struct RealFs;

impl FileProbe for RealFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

/// Settings files to try, in order. Relative entries are joined to `cwd`.
pub fn settings_candidates(env: &dyn EnvLookup, cwd: &Path) -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(4);
    let data_home = env
        .var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| env.var("HOME").map(|h| Path::new(&h).join(".local/share")));
    if let Some(dir) = data_home {
        out.push(dir.join(APP_DIR).join("settings.ini"));
    }
    out.push(cwd.join("assets/settings.ini"));
    out.push(cwd.join("settings.ini"));
    out.push(cwd.join("../assets/settings.ini"));
    out
}

/// Value of `game_data` in the `[SETUP]` section, if present and non-empty.
pub fn parse_game_data(ini: &str) -> Option<String> {
    let mut in_setup = false;
    for line in ini.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_setup = line == "[SETUP]";
            continue;
        }
        if !in_setup {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "game_data" {
                let value = value.trim();
                return (!value.is_empty()).then(|| value.to_owned());
            }
        }
    }
    None
}

/// The game data directory named by the first settings file that has one.
pub fn resolve_game_data(env: &dyn EnvLookup, fs: &dyn FileProbe, cwd: &Path) -> Option<PathBuf> {
    for candidate in settings_candidates(env, cwd) {
        if !fs.exists(&candidate) {
            continue;
        }
        let Ok(text) = fs.read_to_string(&candidate) else { continue };
        if let Some(value) = parse_game_data(&text) {
            debug!("game_data = {value} (from {})", candidate.display());
            return Some(if value == "." { cwd.to_owned() } else { cwd.join(value) });
        }
    }
    None
}

/// Archive locations to try, in order.
pub fn archive_candidates(game_data: Option<&Path>, cwd: &Path) -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(6);
    if let Some(dir) = game_data {
        out.push(dir.join(ARCHIVE_NAME));
        out.push(dir.join("assets").join(ARCHIVE_NAME));
    }
    out.push(cwd.join(ARCHIVE_NAME));
    out.push(cwd.join("..").join(ARCHIVE_NAME));
    out.push(cwd.join("../assets").join(ARCHIVE_NAME));
    out.push(PathBuf::from(SYSTEM_ARCHIVE));
    out
}

pub fn locate_archive(env: &dyn EnvLookup, fs: &dyn FileProbe, cwd: &Path) -> Result<PathBuf, ConfigError> {
    let game_data = resolve_game_data(env, fs, cwd);
    let searched = archive_candidates(game_data.as_deref(), cwd);
    match searched.iter().find(|p| fs.exists(p)) {
        Some(found) => {
            debug!("using archive {}", found.display());
            Ok(found.clone())
        }
        None => Err(ConfigError::NotFound { searched }),
    }
}

/// [`locate_archive`] against the real environment and working directory.
pub fn locate_default_archive() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir()?;
    locate_archive(&ProcessEnv, &RealFs, &cwd)
}
