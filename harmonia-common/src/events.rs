//! Event types for the Harmonia session event stream

use crate::types::{ErrorKind, PlayMode};
use serde::{Deserialize, Serialize};

/// Session event types.
///
/// Broadcast by the session manager whenever its observable state moves;
/// observers (UI layer, notification service) subscribe and render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Playing flag changed
    PlaybackStateChanged {
        playing: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Current track changed (or cleared, when both fields are None)
    CurrentTrackChanged {
        track_id: Option<i64>,
        index: Option<usize>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Play mode preference changed
    PlayModeChanged {
        mode: PlayMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Catalog scan finished and the playable list materialized
    CatalogLoaded {
        track_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Engine queue was cleared (mode change or shutdown)
    QueueCleared {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A user-facing error occurred
    ErrorOccurred {
        kind: ErrorKind,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SessionEvent::PlaybackStateChanged {
            playing: true,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"PlaybackStateChanged\""));
        assert!(json.contains("\"playing\":true"));
    }

    #[test]
    fn error_event_carries_message_kind() {
        let event = SessionEvent::ErrorOccurred {
            kind: ErrorKind::DiskEmpty,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("disk_empty"));
    }
}
