//! Domain types shared across the Harmonia crates

use crate::time::format_duration;
use serde::{Deserialize, Serialize};

/// One playable audio item from the device catalog.
///
/// Identity is `id` (stable, assigned by the content index); two tracks
/// with the same id are the same track even if other fields differ
/// transiently between scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Stable integer id from the content index
    pub id: i64,
    /// Display name with the file extension stripped
    pub title: String,
    /// Artist name, "Unknown" when the index has none
    pub artist: String,
    /// Playable resource locator
    pub content_uri: String,
    /// Album artwork locator (may point at nothing; consumers fall back
    /// to a placeholder)
    pub artwork_uri: String,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// File size in bytes
    pub size_bytes: u64,
}

impl Track {
    /// Duration formatted for display (MM:SS, or HH:MM:SS from one hour)
    pub fn duration_display(&self) -> String {
        format_duration(self.duration_ms)
    }
}

/// One entry of the derived playable list: a track annotated with its
/// favorite membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub track: Track,
    pub is_favorite: bool,
}

impl Song {
    pub fn new(track: Track, is_favorite: bool) -> Self {
        Self { track, is_favorite }
    }

    pub fn id(&self) -> i64 {
        self.track.id
    }
}

/// Which subset of the catalog is presented as the playable list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayMode {
    All,
    OnlyFavorite,
}

impl PlayMode {
    /// String form used for persistence
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::All => "ALL",
            PlayMode::OnlyFavorite => "ONLY_FAVORITE",
        }
    }

    /// Parse a persisted value; anything unrecognized falls back to `All`
    pub fn from_stored(value: &str) -> Self {
        match value {
            "ONLY_FAVORITE" => PlayMode::OnlyFavorite,
            _ => PlayMode::All,
        }
    }
}

impl Default for PlayMode {
    fn default() -> Self {
        PlayMode::All
    }
}

impl std::fmt::Display for PlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted favorite record.
///
/// Keyed by track id, with a denormalized snapshot of the track fields
/// taken at favoriting time so the favorite list stays displayable
/// without a fresh catalog scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub uri: String,
    pub artwork_uri: String,
    pub duration_ms: u64,
}

impl FavoriteEntry {
    /// Snapshot a track into a persistable favorite record
    pub fn from_track(track: &Track) -> Self {
        Self {
            id: track.id,
            title: track.title.clone(),
            artist: track.artist.clone(),
            uri: track.content_uri.clone(),
            artwork_uri: track.artwork_uri.clone(),
            duration_ms: track.duration_ms,
        }
    }

    /// Duration formatted for display
    pub fn duration_display(&self) -> String {
        format_duration(self.duration_ms)
    }
}

/// User-facing error message kinds.
///
/// The session surfaces these on its error stream instead of free text
/// so the UI layer can localize them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Storage/audio read authorization is missing
    PermissionRequired,
    /// Scan completed but found zero qualifying tracks
    DiskEmpty,
    /// A persistence-layer write failed; in-memory state is unchanged
    StoreFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64) -> Track {
        Track {
            id,
            title: format!("Track {id}"),
            artist: "Unknown".to_string(),
            content_uri: format!("content://media/external/audio/media/{id}"),
            artwork_uri: format!("content://media/external/audio/albumart/{id}"),
            duration_ms: 180_000,
            size_bytes: 4_000_000,
        }
    }

    #[test]
    fn play_mode_round_trips_through_storage_form() {
        assert_eq!(PlayMode::from_stored(PlayMode::All.as_str()), PlayMode::All);
        assert_eq!(
            PlayMode::from_stored(PlayMode::OnlyFavorite.as_str()),
            PlayMode::OnlyFavorite
        );
    }

    #[test]
    fn play_mode_unknown_value_falls_back_to_all() {
        assert_eq!(PlayMode::from_stored("SHUFFLE"), PlayMode::All);
        assert_eq!(PlayMode::from_stored(""), PlayMode::All);
    }

    #[test]
    fn favorite_entry_snapshots_track_fields() {
        let t = track(7);
        let entry = FavoriteEntry::from_track(&t);
        assert_eq!(entry.id, 7);
        assert_eq!(entry.title, t.title);
        assert_eq!(entry.uri, t.content_uri);
        assert_eq!(entry.duration_ms, t.duration_ms);
    }
}
