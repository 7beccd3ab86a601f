//! Settings file discovery and parsing

use crate::config::types::Settings;
use crate::error::{ConfigError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings file names to search for
const SETTINGS_FILE_NAMES: &[&str] = &["apptask.yml", "apptask.yaml"];

/// Find the settings file by searching the current and parent directories
pub fn find_settings_file() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .and_then(find_settings_file_from)
}

/// Find the settings file starting from a specific directory
pub fn find_settings_file_from(start_dir: PathBuf) -> Option<PathBuf> {
    let mut current_dir = start_dir;

    loop {
        for file_name in SETTINGS_FILE_NAMES {
            let path = current_dir.join(file_name);
            if path.is_file() {
                return Some(path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Parse a settings file from a path
pub fn parse_settings_file(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let settings: Settings = serde_yaml::from_str(&contents)?;
    Ok(settings)
}

/// Load settings with automatic discovery; missing file means defaults
///
/// Returns the settings and the directory they anchor the run to: the
/// settings file's directory when one was found, the current directory
/// otherwise.
pub fn load_settings(explicit: Option<&Path>) -> Result<(Settings, PathBuf)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_settings_file(),
    };

    match path {
        Some(path) => {
            let settings = parse_settings_file(&path)?;
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((settings, dir))
        }
        None => {
            let dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Ok((Settings::default(), dir))
        }
    }
}
