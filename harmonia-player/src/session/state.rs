//! Shared session state
//!
//! Observable state owned by the session manager. Each property rides a
//! `watch` channel (observers always see the latest snapshot); session
//! events and user-facing errors ride `broadcast` channels.
//!
//! Consistency rule: `current_index` and `current_track` always refer to
//! the same position of the current playable list. List and current-item
//! updates go through `publish_list_update`, which orders the channel
//! writes so an observer never sees an index past the end of the list it
//! has observed.

use harmonia_common::events::SessionEvent;
use harmonia_common::{ErrorKind, PlayMode, Song};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, watch};

pub struct SessionState {
    songs_tx: watch::Sender<Vec<Song>>,
    play_mode_tx: watch::Sender<PlayMode>,
    current_song_tx: watch::Sender<Option<Song>>,
    current_index_tx: watch::Sender<Option<usize>>,
    is_playing_tx: watch::Sender<bool>,
    is_loading_tx: watch::Sender<bool>,
    position_tx: watch::Sender<f64>,
    /// Set while the user drags the seek control; suspends poll writes
    scrubbing: AtomicBool,
    event_tx: broadcast::Sender<SessionEvent>,
    error_tx: broadcast::Sender<ErrorKind>,
}

impl SessionState {
    /// New session state: loading, nothing selected, not playing
    pub fn new(initial_mode: PlayMode) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (error_tx, _) = broadcast::channel(16);
        Self {
            songs_tx: watch::channel(Vec::new()).0,
            play_mode_tx: watch::channel(initial_mode).0,
            current_song_tx: watch::channel(None).0,
            current_index_tx: watch::channel(None).0,
            is_playing_tx: watch::channel(false).0,
            is_loading_tx: watch::channel(true).0,
            position_tx: watch::channel(0.0).0,
            scrubbing: AtomicBool::new(false),
            event_tx,
            error_tx,
        }
    }

    // --- subscriptions -------------------------------------------------

    pub fn subscribe_songs(&self) -> watch::Receiver<Vec<Song>> {
        self.songs_tx.subscribe()
    }

    pub fn subscribe_play_mode(&self) -> watch::Receiver<PlayMode> {
        self.play_mode_tx.subscribe()
    }

    pub fn subscribe_current_song(&self) -> watch::Receiver<Option<Song>> {
        self.current_song_tx.subscribe()
    }

    pub fn subscribe_current_index(&self) -> watch::Receiver<Option<usize>> {
        self.current_index_tx.subscribe()
    }

    pub fn subscribe_is_playing(&self) -> watch::Receiver<bool> {
        self.is_playing_tx.subscribe()
    }

    pub fn subscribe_is_loading(&self) -> watch::Receiver<bool> {
        self.is_loading_tx.subscribe()
    }

    pub fn subscribe_position(&self) -> watch::Receiver<f64> {
        self.position_tx.subscribe()
    }

    /// Subscribe to the session event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to the user-facing error stream
    pub fn subscribe_errors(&self) -> broadcast::Receiver<ErrorKind> {
        self.error_tx.subscribe()
    }

    // --- snapshots -----------------------------------------------------

    pub fn songs(&self) -> Vec<Song> {
        self.songs_tx.borrow().clone()
    }

    pub fn play_mode(&self) -> PlayMode {
        *self.play_mode_tx.borrow()
    }

    pub fn current_song(&self) -> Option<Song> {
        self.current_song_tx.borrow().clone()
    }

    pub fn current_index(&self) -> Option<usize> {
        *self.current_index_tx.borrow()
    }

    pub fn is_playing(&self) -> bool {
        *self.is_playing_tx.borrow()
    }

    pub fn is_loading(&self) -> bool {
        *self.is_loading_tx.borrow()
    }

    pub fn position(&self) -> f64 {
        *self.position_tx.borrow()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing.load(Ordering::Acquire)
    }

    // --- mutations (session manager only) ------------------------------

    /// Publish a recomputed playable list together with the reconciled
    /// current item.
    ///
    /// When the list grows the list is published first; when it shrinks
    /// the current item is published first. Either way no observer sees
    /// an index beyond the end of the list it has in hand.
    pub fn publish_list_update(&self, songs: Vec<Song>, current: Option<(usize, Song)>) {
        let grew = songs.len() > self.songs_tx.borrow().len();
        match current {
            None => {
                self.set_current_inner(None, None);
                self.songs_tx.send_replace(songs);
            }
            Some((index, song)) if grew => {
                self.songs_tx.send_replace(songs);
                self.set_current_inner(Some(index), Some(song));
            }
            Some((index, song)) => {
                self.set_current_inner(Some(index), Some(song));
                self.songs_tx.send_replace(songs);
            }
        }
    }

    pub fn set_play_mode(&self, mode: PlayMode) {
        if *self.play_mode_tx.borrow() == mode {
            return;
        }
        self.play_mode_tx.send_replace(mode);
        self.broadcast_event(SessionEvent::PlayModeChanged {
            mode,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Set the current item; index and track move together
    pub fn set_current(&self, index: usize, song: Song) {
        self.set_current_inner(Some(index), Some(song));
    }

    /// Clear the current item
    pub fn clear_current(&self) {
        self.set_current_inner(None, None);
    }

    pub fn set_playing(&self, playing: bool) {
        if *self.is_playing_tx.borrow() == playing {
            return;
        }
        self.is_playing_tx.send_replace(playing);
        self.broadcast_event(SessionEvent::PlaybackStateChanged {
            playing,
            timestamp: chrono::Utc::now(),
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.is_loading_tx.send_replace(loading);
    }

    pub fn set_position(&self, position_ms: f64) {
        self.position_tx.send_replace(position_ms);
    }

    pub fn set_scrubbing(&self, scrubbing: bool) {
        self.scrubbing.store(scrubbing, Ordering::Release);
    }

    /// Emit a user-facing error on the error stream (and the event
    /// stream, for observers that only follow events)
    pub fn emit_error(&self, kind: ErrorKind) {
        let _ = self.error_tx.send(kind);
        self.broadcast_event(SessionEvent::ErrorOccurred {
            kind,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Broadcast a session event to all listeners
    pub fn broadcast_event(&self, event: SessionEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    fn set_current_inner(&self, index: Option<usize>, song: Option<Song>) {
        let changed = {
            *self.current_index_tx.borrow() != index
                || self.current_song_tx.borrow().as_ref().map(Song::id)
                    != song.as_ref().map(Song::id)
        };
        let track_id = song.as_ref().map(Song::id);

        self.current_index_tx.send_replace(index);
        self.current_song_tx.send_replace(song);

        if changed {
            self.broadcast_event(SessionEvent::CurrentTrackChanged {
                track_id,
                index,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}
