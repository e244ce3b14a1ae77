//! Filesystem-backed content index
//!
//! The desktop analog of a device media index: walks a music directory,
//! orders entries by file modification time (newest first, standing in
//! for date-added), and reads artist/duration tags with lofty. Row ids
//! are derived by hashing the file path, so an id stays stable across
//! rescans as long as the file does not move.

use super::{AudioRow, ContentIndex};
use harmonia_common::{Error, Result};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::prelude::Accessor;
use lofty::read_from_path;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;
use tracing::debug;

/// Opaque locator bases served by this index
const AUDIO_COLLECTION_URI: &str = "harmonia://media/audio";
const ALBUM_ART_URI: &str = "harmonia://media/albumart";

pub struct FsContentIndex {
    root: PathBuf,
    /// Row id -> file path, rebuilt on every query
    paths: RwLock<HashMap<i64, PathBuf>>,
}

impl FsContentIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            paths: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a row id back to its file path.
    ///
    /// Engine implementations that play from disk use this to turn the
    /// opaque content locator into something openable.
    pub fn resolve(&self, id: i64) -> Option<PathBuf> {
        self.paths.read().ok()?.get(&id).cloned()
    }

    fn collect_files(&self) -> Vec<(PathBuf, SystemTime, u64)> {
        let mut pending = vec![self.root.clone()];
        let mut files = Vec::new();

        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!("Failed to read directory {}: {}", dir.display(), err);
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let meta = match entry.metadata() {
                    Ok(meta) => meta,
                    Err(err) => {
                        debug!("Failed to stat {}: {}", path.display(), err);
                        continue;
                    }
                };
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, modified, meta.len()));
            }
        }

        // Newest first, standing in for date-added descending
        files.sort_by(|a, b| b.1.cmp(&a.1));
        files
    }
}

impl ContentIndex for FsContentIndex {
    fn authorized(&self) -> bool {
        std::fs::read_dir(&self.root).is_ok()
    }

    fn query(&self) -> Result<Vec<AudioRow>> {
        let files = self.collect_files();

        let mut rows = Vec::with_capacity(files.len());
        let mut paths = HashMap::with_capacity(files.len());

        for (path, _modified, size_bytes) in files {
            let display_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let id = path_id(&path);
            let album_id = path.parent().map(path_id).unwrap_or(0);

            let (artist, duration_ms) = match read_from_path(&path) {
                Ok(tagged) => {
                    let artist = tagged
                        .primary_tag()
                        .and_then(|tag| tag.artist().map(|a| a.into_owned()));
                    let duration_ms = tagged.properties().duration().as_millis() as u64;
                    (artist, duration_ms)
                }
                Err(err) => {
                    debug!("No readable tags in {}: {}", path.display(), err);
                    (None, 0)
                }
            };

            rows.push(AudioRow {
                id,
                display_name,
                artist,
                duration_ms,
                size_bytes,
                album_id,
            });
            paths.insert(id, path);
        }

        *self
            .paths
            .write()
            .map_err(|_| Error::Internal("content index path map poisoned".to_string()))? = paths;

        Ok(rows)
    }

    fn audio_collection_uri(&self) -> String {
        AUDIO_COLLECTION_URI.to_string()
    }

    fn album_art_uri(&self) -> String {
        ALBUM_ART_URI.to_string()
    }
}

/// Stable 64-bit FNV-1a hash of a path, reinterpreted as a row id
fn path_id(path: &Path) -> i64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in path.to_string_lossy().as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ids_are_stable_and_distinct() {
        let a = path_id(Path::new("/music/a.mp3"));
        let b = path_id(Path::new("/music/b.mp3"));
        assert_eq!(a, path_id(Path::new("/music/a.mp3")));
        assert_ne!(a, b);
    }

    #[test]
    fn unreadable_root_is_not_authorized() {
        let index = FsContentIndex::new("/nonexistent/harmonia-test-root");
        assert!(!index.authorized());
    }

    #[test]
    fn query_orders_newest_first_and_maps_ids_to_paths() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.mp3");
        let new = dir.path().join("new.mp3");
        std::fs::write(&old, b"not real audio").unwrap();
        std::fs::write(&new, b"not real audio").unwrap();

        let earlier = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        let file = std::fs::OpenOptions::new().write(true).open(&old).unwrap();
        file.set_modified(earlier).unwrap();

        let index = FsContentIndex::new(dir.path());
        let rows = index.query().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].display_name, "new.mp3");
        assert_eq!(rows[1].display_name, "old.mp3");

        let id = rows[0].id;
        assert_eq!(index.resolve(id).unwrap(), new);
    }
}
