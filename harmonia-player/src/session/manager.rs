//! Music session manager
//!
//! The coordination core: reconciles three asynchronously-changing
//! inputs (catalog scan result, favorite id set, play-mode preference)
//! into one derived playable list, drives the playback engine's queue
//! from it, and owns the observable session state.
//!
//! All state-mutating command sequences are serialized through one
//! internal lock, so current-index and current-track can never diverge
//! under concurrent commands. The derived list is recomputed by a
//! background task whenever any input changes; after every recompute the
//! current item is re-resolved against the new list (by track id) before
//! the list is published.

use crate::catalog::{CatalogScanner, ScanError};
use crate::db::favorites::FavoriteStore;
use crate::db::settings::PreferenceStore;
use crate::engine::{PlaybackEngine, QueueItem};
use crate::error::{Error, Result};
use crate::session::monitor;
use crate::session::state::SessionState;
use harmonia_common::events::SessionEvent;
use harmonia_common::{ErrorKind, PlayMode, Song, Track};
use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Poll step while waiting for the derived list to materialize at startup
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Startup poll attempts; caps the total wait at one second
const STARTUP_POLL_ATTEMPTS: u32 = 20;
/// Settle once the list materializes, absorbing trailing favorite-set
/// emissions before loading is declared finished
const STARTUP_SETTLE: Duration = Duration::from_millis(150);
/// Settle when switching mode while the favorite set is still empty, so
/// the old list does not flash before the filtered stream catches up
const MODE_CHANGE_SETTLE: Duration = Duration::from_millis(500);

pub struct SessionManager {
    scanner: CatalogScanner,
    favorites: FavoriteStore,
    prefs: PreferenceStore,
    engine: Arc<dyn PlaybackEngine>,
    state: Arc<SessionState>,
    catalog_tx: watch::Sender<Vec<Track>>,
    cmd_lock: Arc<Mutex<()>>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl SessionManager {
    /// Construct the manager and start its background tasks (derived-list
    /// recompute, engine event pump, position poll).
    ///
    /// The engine instance passed here must not be commanded by anyone
    /// else for the manager's lifetime.
    pub async fn new(
        scanner: CatalogScanner,
        favorites: FavoriteStore,
        prefs: PreferenceStore,
        engine: Arc<dyn PlaybackEngine>,
    ) -> Result<Self> {
        let mode = prefs.play_mode().await?;
        let state = Arc::new(SessionState::new(mode));
        let (catalog_tx, catalog_rx) = watch::channel(Vec::new());
        let cmd_lock = Arc::new(Mutex::new(()));

        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        engine.set_event_sender(engine_tx);

        let tasks = vec![
            tokio::spawn(recompute_loop(
                Arc::clone(&state),
                Arc::clone(&cmd_lock),
                catalog_rx,
                favorites.ids(),
                state.subscribe_play_mode(),
            )),
            monitor::start_engine_event_pump(Arc::clone(&state), Arc::clone(&engine), engine_rx),
            monitor::start_position_monitor(Arc::clone(&state), Arc::clone(&engine)),
        ];

        Ok(Self {
            scanner,
            favorites,
            prefs,
            engine,
            state,
            catalog_tx,
            cmd_lock,
            tasks: StdMutex::new(tasks),
        })
    }

    /// Observable session state (reactive properties, events, errors)
    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Start the session: scan the catalog and wait for the derived list
    /// to materialize.
    ///
    /// Scan failures are surfaced on the error stream, not returned; the
    /// session simply stays empty until retried (for instance after a
    /// permission grant).
    pub async fn load_session(&self) -> Result<()> {
        self.state.set_loading(true);

        let tracks = match self.scanner.scan().await {
            Ok(tracks) => tracks,
            Err(err) => {
                warn!("Catalog scan failed: {err}");
                self.state.set_loading(false);
                self.state.emit_error(err.kind());
                return Ok(());
            }
        };

        let track_count = tracks.len();
        self.catalog_tx.send_replace(tracks);

        // The favorite stream may not have delivered its first value yet
        // when the scan completes; poll briefly instead of waiting
        // unbounded, then proceed with the best-available snapshot.
        let mut attempts = 0;
        while self.state.songs().is_empty() && attempts < STARTUP_POLL_ATTEMPTS {
            sleep(STARTUP_POLL_INTERVAL).await;
            attempts += 1;
        }
        sleep(STARTUP_SETTLE).await;

        self.state.set_loading(false);
        self.state.broadcast_event(SessionEvent::CatalogLoaded {
            track_count,
            timestamp: chrono::Utc::now(),
        });
        info!("Session loaded: {} tracks in catalog", track_count);
        Ok(())
    }

    /// Select and play the song at `index` in the current playable list
    pub async fn select_by_index(&self, index: usize) -> Result<()> {
        let _guard = self.cmd_lock.lock().await;
        self.select_locked(index)
    }

    /// Select and play the song with the given track id.
    ///
    /// An id not present in the current (possibly filtered) list is
    /// tolerated silently; a search view may address tracks the active
    /// filter has hidden.
    pub async fn select_by_id(&self, id: i64) -> Result<()> {
        let _guard = self.cmd_lock.lock().await;
        let index = self.state.songs().iter().position(|s| s.id() == id);
        match index {
            Some(index) => self.select_locked(index),
            None => {
                debug!("Select ignored: track {id} not in the current list");
                Ok(())
            }
        }
    }

    fn select_locked(&self, index: usize) -> Result<()> {
        let songs = self.state.songs();
        if index >= songs.len() {
            return Err(Error::InvalidInput(format!(
                "song index {index} out of bounds ({} songs)",
                songs.len()
            )));
        }

        if self.engine.item_count() == 0 {
            debug!("Building engine queue: {} items, starting at {index}", songs.len());
            self.engine.set_queue(build_queue(&songs), index, 0);
        } else {
            if self.state.current_index() == Some(index) {
                // Repeated tap on the already-current item must not
                // restart it from zero
                return Ok(());
            }
            self.engine.pause();
            self.engine.seek_to_item(index, 0);
        }

        self.engine.prepare();
        self.engine.play();
        resume_from_engine(&self.state, self.engine.as_ref());
        Ok(())
    }

    /// Toggle the favorite flag of the song at `index`.
    ///
    /// Un-favoriting under `OnlyFavorite` removes the track from the
    /// playable list itself, so the engine item at that position is
    /// cleared and, when it was the current one, the current-track state
    /// is reset before the store mutation commits. The next poll tick
    /// therefore cannot re-assert position data for a vanished track.
    pub async fn toggle_favorite(&self, index: usize) -> Result<()> {
        let _guard = self.cmd_lock.lock().await;
        let songs = self.state.songs();
        let song = songs.get(index).cloned().ok_or_else(|| {
            Error::InvalidInput(format!("song index {index} out of bounds"))
        })?;

        if song.is_favorite {
            if self.state.play_mode() == PlayMode::OnlyFavorite {
                let was_current = self.state.current_index() == Some(index);
                self.engine.remove_item(index);
                if was_current {
                    self.state.set_playing(false);
                    self.state.clear_current();
                }
            }
            if let Err(err) = self.favorites.remove(song.id()).await {
                warn!("Favorite removal failed for {}: {err}", song.id());
                self.state.emit_error(ErrorKind::StoreFailure);
            }
        } else if let Err(err) = self.favorites.add(&song.track).await {
            warn!("Favorite add failed for {}: {err}", song.id());
            self.state.emit_error(ErrorKind::StoreFailure);
        }

        Ok(())
    }

    /// Switch between playing everything and playing favorites only.
    ///
    /// Stops playback and clears the engine queue; the queue is rebuilt
    /// lazily on the next select, not eagerly against a list that is
    /// about to change under the new mode.
    pub async fn change_play_mode(&self, mode: PlayMode) -> Result<()> {
        let _guard = self.cmd_lock.lock().await;
        if self.state.play_mode() == mode {
            return Ok(());
        }
        info!("Changing play mode to {mode}");

        let had_current = self.state.current_song().is_some();
        self.state.set_playing(false);
        self.state.clear_current();

        if let Err(err) = self.prefs.set_play_mode(mode).await {
            warn!("Play mode persistence failed: {err}");
            self.state.emit_error(ErrorKind::StoreFailure);
        }

        self.engine.clear_queue();
        self.state.broadcast_event(SessionEvent::QueueCleared {
            timestamp: chrono::Utc::now(),
        });

        if had_current && self.favorites.ids_snapshot().is_empty() {
            // Smooths the transition into an empty filtered list
            sleep(MODE_CHANGE_SETTLE).await;
        }

        self.state.set_play_mode(mode);
        Ok(())
    }

    pub fn play(&self) {
        self.engine.play();
    }

    pub fn pause(&self) {
        self.engine.pause();
    }

    /// Skip to the next queued item; a no-op at the end of the queue
    pub fn skip_next(&self) {
        if self.engine.has_next() {
            self.engine.skip_next();
            resume_from_engine(&self.state, self.engine.as_ref());
        }
    }

    /// Skip to the previous queued item; a no-op at the start
    pub fn skip_previous(&self) {
        if self.engine.has_previous() {
            self.engine.skip_previous();
            resume_from_engine(&self.state, self.engine.as_ref());
        }
    }

    /// Seek within the current item, reflecting the value immediately
    pub fn seek(&self, position_ms: f64) {
        self.engine.seek_to(position_ms as u64);
        self.state.set_position(position_ms);
    }

    /// While set, the position poll leaves the user-driven value alone
    pub fn set_scrubbing(&self, scrubbing: bool) {
        self.state.set_scrubbing(scrubbing);
    }

    /// Tear down the session: clear the engine queue, zero session state
    /// and cancel the background tasks. Safe to call more than once.
    pub async fn shutdown(&self) {
        let _guard = self.cmd_lock.lock().await;
        info!("Shutting down session");

        self.engine.clear_queue();
        self.state.set_playing(false);
        self.state.clear_current();
        self.state.set_position(0.0);
        self.state.set_loading(false);
        self.state.broadcast_event(SessionEvent::QueueCleared {
            timestamp: chrono::Utc::now(),
        });

        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        // No orphaned timers may keep writing to a torn-down session
        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
    }
}

/// Project the catalog through the favorite set and play mode.
///
/// Order-preserving: the relative order of the scan survives both modes.
pub fn derive_songs(catalog: &[Track], favorites: &HashSet<i64>, mode: PlayMode) -> Vec<Song> {
    match mode {
        PlayMode::All => catalog
            .iter()
            .map(|t| Song::new(t.clone(), favorites.contains(&t.id)))
            .collect(),
        PlayMode::OnlyFavorite => catalog
            .iter()
            .filter(|t| favorites.contains(&t.id))
            .map(|t| Song::new(t.clone(), true))
            .collect(),
    }
}

fn build_queue(songs: &[Song]) -> Vec<QueueItem> {
    songs
        .iter()
        .map(|song| QueueItem {
            track_id: song.id(),
            uri: song.track.content_uri.clone(),
            title: song.track.title.clone(),
            artwork_uri: song.track.artwork_uri.clone(),
        })
        .collect()
}

/// Fold the engine's current position into session state, but only when
/// the engine's view and the derived list agree on the item's identity.
/// During a list transition the views briefly disagree; the recompute
/// pass re-resolves the current item right after.
pub(crate) fn resume_from_engine(state: &SessionState, engine: &dyn PlaybackEngine) {
    let (Some(index), Some(item)) = (engine.current_index(), engine.current_item()) else {
        return;
    };
    let songs = state.songs();
    match songs.get(index) {
        Some(song) if song.id() == item.track_id => {
            state.set_playing(engine.is_playing());
            state.set_current(index, song.clone());
        }
        _ => debug!("Engine item {index} not reconcilable with the current list yet"),
    }
}

/// Recompute the derived list whenever any input changes, re-resolve the
/// current item against it, and publish both.
async fn recompute_loop(
    state: Arc<SessionState>,
    cmd_lock: Arc<Mutex<()>>,
    mut catalog_rx: watch::Receiver<Vec<Track>>,
    mut favorites_rx: watch::Receiver<HashSet<i64>>,
    mut mode_rx: watch::Receiver<PlayMode>,
) {
    loop {
        let changed = tokio::select! {
            r = catalog_rx.changed() => r,
            r = favorites_rx.changed() => r,
            r = mode_rx.changed() => r,
        };
        if changed.is_err() {
            // A sender dropped; the session is being torn down
            break;
        }

        let songs = {
            let catalog = catalog_rx.borrow_and_update();
            let favorites = favorites_rx.borrow_and_update();
            let mode = *mode_rx.borrow_and_update();
            derive_songs(&catalog, &favorites, mode)
        };

        let _guard = cmd_lock.lock().await;
        reconcile_and_publish(&state, songs);
    }
}

/// Re-resolve the current item against a freshly derived list and
/// publish the pair consistently.
fn reconcile_and_publish(state: &SessionState, songs: Vec<Song>) {
    let current = match (state.current_index(), state.current_song()) {
        (Some(index), Some(song)) => match songs.get(index) {
            // Same track at the same position; refresh its favorite flag
            Some(candidate) if candidate.id() == song.id() => {
                Some((index, candidate.clone()))
            }
            // The list shifted under the current track; follow it by id
            _ => songs
                .iter()
                .position(|s| s.id() == song.id())
                .map(|new_index| (new_index, songs[new_index].clone())),
        },
        _ => None,
    };

    if state.current_index().is_some() && current.is_none() {
        // The current track left the list entirely
        state.set_playing(false);
    }
    state.publish_list_update(songs, current);
}
