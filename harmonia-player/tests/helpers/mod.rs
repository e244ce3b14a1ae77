//! Shared test fixtures: an in-memory content index, a call-recording
//! engine and session construction helpers.
#![allow(dead_code)]

use harmonia_common::{Song, Track};
use harmonia_player::catalog::{AudioRow, CatalogScanner, ContentIndex};
use harmonia_player::db::create_tables;
use harmonia_player::db::favorites::FavoriteStore;
use harmonia_player::db::settings::PreferenceStore;
use harmonia_player::engine::{EngineEvent, NullEngine, PlaybackEngine, QueueItem};
use harmonia_player::session::{SessionManager, SessionState};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

/// A catalog row as the device index would surface it
pub fn row(id: i64, display_name: &str) -> AudioRow {
    AudioRow {
        id,
        display_name: display_name.to_string(),
        artist: Some(format!("Artist {id}")),
        duration_ms: 180_000,
        size_bytes: 4_000_000,
        album_id: id * 10,
    }
}

/// Content index serving a fixed row set
pub struct StaticContentIndex {
    authorized: AtomicBool,
    rows: Mutex<Vec<AudioRow>>,
    queries: AtomicUsize,
}

impl StaticContentIndex {
    pub fn new(rows: Vec<AudioRow>) -> Self {
        Self {
            authorized: AtomicBool::new(true),
            rows: Mutex::new(rows),
            queries: AtomicUsize::new(0),
        }
    }

    /// Rows for track ids 1..=n, newest first, all plain mp3 files
    pub fn with_tracks(n: usize) -> Self {
        Self::new(
            (1..=n as i64)
                .map(|id| row(id, &format!("Track {id}.mp3")))
                .collect(),
        )
    }

    pub fn set_authorized(&self, authorized: bool) {
        self.authorized.store(authorized, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl ContentIndex for StaticContentIndex {
    fn authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    fn query(&self) -> harmonia_common::Result<Vec<AudioRow>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().clone())
    }

    fn audio_collection_uri(&self) -> String {
        "content://media/external/audio/media".to_string()
    }

    fn album_art_uri(&self) -> String {
        "content://media/external/audio/albumart".to_string()
    }
}

/// Engine commands a test can assert on
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetQueue { len: usize, start_index: usize },
    Prepare,
    Play,
    Pause,
    SeekToItem(usize),
    SeekTo(u64),
    RemoveItem(usize),
    ClearQueue,
    SkipNext,
    SkipPrevious,
}

/// Delegates to a `NullEngine` while recording every command and
/// mirroring the queue contents.
pub struct RecordingEngine {
    inner: NullEngine,
    calls: Mutex<Vec<EngineCall>>,
    queue: Mutex<Vec<QueueItem>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            inner: NullEngine::new(),
            calls: Mutex::new(Vec::new()),
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn queued_track_ids(&self) -> Vec<i64> {
        self.queue.lock().unwrap().iter().map(|i| i.track_id).collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PlaybackEngine for RecordingEngine {
    fn set_queue(&self, items: Vec<QueueItem>, start_index: usize, start_offset_ms: u64) {
        self.record(EngineCall::SetQueue {
            len: items.len(),
            start_index,
        });
        *self.queue.lock().unwrap() = items.clone();
        self.inner.set_queue(items, start_index, start_offset_ms);
    }

    fn prepare(&self) {
        self.record(EngineCall::Prepare);
        self.inner.prepare();
    }

    fn play(&self) {
        self.record(EngineCall::Play);
        self.inner.play();
    }

    fn pause(&self) {
        self.record(EngineCall::Pause);
        self.inner.pause();
    }

    fn seek_to_item(&self, index: usize, offset_ms: u64) {
        self.record(EngineCall::SeekToItem(index));
        self.inner.seek_to_item(index, offset_ms);
    }

    fn seek_to(&self, offset_ms: u64) {
        self.record(EngineCall::SeekTo(offset_ms));
        self.inner.seek_to(offset_ms);
    }

    fn remove_item(&self, index: usize) {
        self.record(EngineCall::RemoveItem(index));
        let mut queue = self.queue.lock().unwrap();
        if index < queue.len() {
            queue.remove(index);
        }
        drop(queue);
        self.inner.remove_item(index);
    }

    fn clear_queue(&self) {
        self.record(EngineCall::ClearQueue);
        self.queue.lock().unwrap().clear();
        self.inner.clear_queue();
    }

    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn has_previous(&self) -> bool {
        self.inner.has_previous()
    }

    fn skip_next(&self) {
        self.record(EngineCall::SkipNext);
        self.inner.skip_next();
    }

    fn skip_previous(&self) {
        self.record(EngineCall::SkipPrevious);
        self.inner.skip_previous();
    }

    fn current_index(&self) -> Option<usize> {
        self.inner.current_index()
    }

    fn current_item(&self) -> Option<QueueItem> {
        self.inner.current_item()
    }

    fn position_ms(&self) -> u64 {
        self.inner.position_ms()
    }

    fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }

    fn item_count(&self) -> usize {
        self.inner.item_count()
    }

    fn set_event_sender(&self, tx: mpsc::UnboundedSender<EngineEvent>) {
        self.inner.set_event_sender(tx);
    }
}

/// One shared in-memory database with the schema applied.
///
/// A single connection keeps every handle on the same memory database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_tables(&pool).await.unwrap();
    pool
}

/// Build a session manager over the given index/engine/database
pub async fn build_session(
    pool: SqlitePool,
    index: Arc<StaticContentIndex>,
    engine: Arc<RecordingEngine>,
) -> SessionManager {
    let favorites = FavoriteStore::new(pool.clone()).await.unwrap();
    let prefs = PreferenceStore::new(pool);
    SessionManager::new(CatalogScanner::new(index), favorites, prefs, engine)
        .await
        .unwrap()
}

/// Wait until the playable list satisfies a predicate (2 s cap)
pub async fn wait_for_songs(
    rx: &mut watch::Receiver<Vec<Song>>,
    pred: impl Fn(&[Song]) -> bool,
) {
    timeout(Duration::from_secs(2), async {
        loop {
            if pred(&rx.borrow()) {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("playable list never reached the expected shape");
}

/// The central consistency invariant: index and track always reference
/// the same position of the current list.
pub fn assert_current_consistent(state: &SessionState) {
    let songs = state.songs();
    match (state.current_index(), state.current_song()) {
        (Some(index), Some(song)) => {
            assert!(index < songs.len(), "current index out of bounds");
            assert_eq!(songs[index].id(), song.id(), "index/track divergence");
        }
        (None, None) => {}
        (index, song) => panic!(
            "current index and track must be set together: {index:?} vs {song:?}"
        ),
    }
}

/// A track as the scanner would produce it from `StaticContentIndex`
pub fn scanned_track(id: i64) -> Track {
    Track {
        id,
        title: format!("Track {id}"),
        artist: format!("Artist {id}"),
        content_uri: format!("content://media/external/audio/media/{id}"),
        artwork_uri: format!("content://media/external/audio/albumart/{}", id * 10),
        duration_ms: 180_000,
        size_bytes: 4_000_000,
    }
}
