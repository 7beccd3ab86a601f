//! Hashed asset folder cleanup
//!
//! Published assets land in per-bundle folders named with a short hash.
//! Cleanup removes exactly those folders and leaves everything else alone.

use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

/// Matches 7-8 character lowercase alphanumeric folder names
fn hashed_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]{7,8}$").unwrap())
}

/// Whether a directory entry name looks like a published asset hash
pub fn is_hashed_asset_name(name: &str) -> bool {
    hashed_name_pattern().is_match(name)
}

/// Remove every hashed asset folder directly under `dir`
///
/// Returns the number of entries removed.
pub fn purge_hashed_assets(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_hashed_asset_name(name) {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }

    Ok(removed)
}
