//! Playlist loading and track ordering
//!
//! A station's playlist is whatever supported audio files live under its
//! directory at scan time. Filesystem iteration order is not stable, so the
//! scan sorts results; two scans of an unchanged directory always yield the
//! same playlist.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported audio file extensions (lowercase)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac"];

/// Ordered list of playable tracks for one station
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<PathBuf>,
}

impl Playlist {
    /// Scan a directory recursively for supported audio files.
    ///
    /// Returns `DirectoryNotFound` when the directory is absent and an empty
    /// playlist when it exists but holds no supported files; callers decide
    /// whether an empty playlist is fatal.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut tracks = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error scanning {}: {}", dir.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && is_supported(entry.path()) {
                tracks.push(entry.path().to_path_buf());
            }
        }
        tracks.sort();

        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.tracks.get(index).map(PathBuf::as_path)
    }

    pub fn tracks(&self) -> &[PathBuf] {
        &self.tracks
    }
}

fn is_supported(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
