//! Catalog scanning
//!
//! The scanner enumerates the device's audio index into `Track` records.
//! The index itself is a collaborator behind the `ContentIndex` trait;
//! the scanner owns the filtering rules (non-music name patterns,
//! playable extensions, result cap) and the field mapping.

pub mod fs_index;

pub use fs_index::FsContentIndex;

use harmonia_common::Track;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Most recently added tracks beyond this count are dropped to bound
/// memory and startup latency.
pub const SCAN_LIMIT: usize = 100;

/// Extensions accepted as playable audio
pub const PLAYABLE_EXTENSIONS: [&str; 7] = ["mp3", "wav", "ogg", "flac", "aac", "m4a", "opus"];

/// Display-name fragments of known non-music recordings (call
/// recordings, voice messages) that are excluded from the catalog.
const NON_MUSIC_PATTERNS: [&str; 3] = ["aud", "slack", "ptt"];

/// Catalog scan failures
#[derive(Error, Debug)]
pub enum ScanError {
    /// Storage/audio read authorization is missing; the index was not
    /// queried.
    #[error("storage read authorization missing")]
    PermissionRequired,

    /// The scan completed but zero tracks qualified
    #[error("no playable tracks found")]
    DiskEmpty,

    /// The underlying content index failed
    #[error("content index error: {0}")]
    Index(#[from] harmonia_common::Error),
}

impl ScanError {
    /// The user-facing message kind for this failure
    pub fn kind(&self) -> harmonia_common::ErrorKind {
        match self {
            ScanError::PermissionRequired => harmonia_common::ErrorKind::PermissionRequired,
            ScanError::DiskEmpty => harmonia_common::ErrorKind::DiskEmpty,
            ScanError::Index(_) => harmonia_common::ErrorKind::StoreFailure,
        }
    }
}

/// One row of the device audio index, in its fixed projection
#[derive(Debug, Clone)]
pub struct AudioRow {
    pub id: i64,
    pub display_name: String,
    pub artist: Option<String>,
    pub duration_ms: u64,
    pub size_bytes: u64,
    pub album_id: i64,
}

/// The device content index collaborator.
///
/// `query` returns rows ordered by date-added descending; the scanner
/// relies on that order when applying the result cap.
pub trait ContentIndex: Send + Sync {
    /// Whether storage/audio read authorization is currently held
    fn authorized(&self) -> bool;

    /// All audio rows, date-added descending
    fn query(&self) -> harmonia_common::Result<Vec<AudioRow>>;

    /// Base locator of the external audio collection; the scanner joins
    /// row ids onto this.
    fn audio_collection_uri(&self) -> String;

    /// Base locator of the album-art authority; joined with album ids.
    /// No existence check is made; consumers fall back to a placeholder.
    fn album_art_uri(&self) -> String;
}

/// Scans the content index into a capped, filtered track list
pub struct CatalogScanner {
    index: Arc<dyn ContentIndex>,
}

impl CatalogScanner {
    pub fn new(index: Arc<dyn ContentIndex>) -> Self {
        Self { index }
    }

    /// Run a full scan.
    ///
    /// Fails fast with `PermissionRequired` when authorization is not
    /// held. Bulk row iteration runs on the blocking pool so state reads
    /// stay responsive during a large scan.
    pub async fn scan(&self) -> Result<Vec<Track>, ScanError> {
        if !self.index.authorized() {
            return Err(ScanError::PermissionRequired);
        }

        let index = Arc::clone(&self.index);
        let tracks = tokio::task::spawn_blocking(move || scan_rows(index.as_ref()))
            .await
            .map_err(|e| {
                ScanError::Index(harmonia_common::Error::Internal(format!(
                    "scan task failed: {e}"
                )))
            })??;

        if tracks.is_empty() {
            return Err(ScanError::DiskEmpty);
        }

        info!("Catalog scan found {} tracks", tracks.len());
        Ok(tracks)
    }
}

fn scan_rows(index: &dyn ContentIndex) -> Result<Vec<Track>, ScanError> {
    let rows = index.query()?;
    let audio_base = index.audio_collection_uri();
    let art_base = index.album_art_uri();

    let mut tracks = Vec::new();
    for row in rows {
        if tracks.len() == SCAN_LIMIT {
            debug!("Scan cap reached, dropping remaining rows");
            break;
        }
        if is_non_music(&row.display_name) || !has_playable_extension(&row.display_name) {
            continue;
        }

        let artist = row
            .artist
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        tracks.push(Track {
            id: row.id,
            title: strip_extension(&row.display_name).to_string(),
            artist,
            content_uri: format!("{}/{}", audio_base, row.id),
            artwork_uri: format!("{}/{}", art_base, row.album_id),
            duration_ms: row.duration_ms,
            size_bytes: row.size_bytes,
        });
    }

    Ok(tracks)
}

fn is_non_music(display_name: &str) -> bool {
    let lower = display_name.to_lowercase();
    NON_MUSIC_PATTERNS.iter().any(|p| lower.contains(p))
}

fn has_playable_extension(display_name: &str) -> bool {
    match display_name.rsplit_once('.') {
        Some((_, ext)) => PLAYABLE_EXTENSIONS
            .iter()
            .any(|playable| ext.eq_ignore_ascii_case(playable)),
        None => false,
    }
}

fn strip_extension(display_name: &str) -> &str {
    display_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(display_name)
}
