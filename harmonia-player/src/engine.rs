//! Playback engine boundary
//!
//! The media pipeline is an external collaborator behind the
//! `PlaybackEngine` trait: the session manager issues commands and the
//! engine reports asynchronous state changes on an event channel. The
//! engine instance is exclusively owned by the session manager; no other
//! component issues commands to it.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// One queued playable item: the track id plus the metadata the engine
/// surfaces to the system media session.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub track_id: i64,
    pub uri: String,
    pub title: String,
    pub artwork_uri: String,
}

/// Asynchronous engine notifications folded into session state
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The playing flag changed
    PlayingChanged(bool),
    /// The current item moved (seek, skip, removal, queue swap)
    CurrentItemChanged { index: Option<usize> },
}

/// Command surface of the media pipeline.
///
/// Commands are synchronous and non-blocking; implementations queue work
/// internally and report back through the event sender.
pub trait PlaybackEngine: Send + Sync {
    /// Replace the queue and position it at `start_index`/`start_offset_ms`
    fn set_queue(&self, items: Vec<QueueItem>, start_index: usize, start_offset_ms: u64);
    fn prepare(&self);
    fn play(&self);
    fn pause(&self);
    /// Seek the loaded queue to an item at an offset
    fn seek_to_item(&self, index: usize, offset_ms: u64);
    /// Seek within the current item
    fn seek_to(&self, offset_ms: u64);
    /// Remove one item; later items shift down by one
    fn remove_item(&self, index: usize);
    fn clear_queue(&self);
    fn has_next(&self) -> bool;
    fn has_previous(&self) -> bool;
    fn skip_next(&self);
    fn skip_previous(&self);
    fn current_index(&self) -> Option<usize>;
    /// The queued item at the current index, if any
    fn current_item(&self) -> Option<QueueItem>;
    fn position_ms(&self) -> u64;
    fn is_playing(&self) -> bool;
    fn item_count(&self) -> usize;
    /// Register the channel that receives engine notifications
    fn set_event_sender(&self, tx: mpsc::UnboundedSender<EngineEvent>);
}

/// In-memory engine with no audio output.
///
/// Maintains the queue/position/playing state machine and emits the same
/// notifications a real pipeline would. Used by the headless binary and
/// for soak runs without an audio device.
#[derive(Default)]
pub struct NullEngine {
    inner: Mutex<NullEngineInner>,
}

#[derive(Default)]
struct NullEngineInner {
    items: Vec<QueueItem>,
    current: Option<usize>,
    playing: bool,
    position_ms: u64,
    tx: Option<mpsc::UnboundedSender<EngineEvent>>,
}

impl NullEngineInner {
    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.tx {
            // No receiver is fine; the session may already be torn down
            let _ = tx.send(event);
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.emit(EngineEvent::PlayingChanged(playing));
        }
    }

    fn set_current(&mut self, current: Option<usize>) {
        if self.current != current {
            self.current = current;
            self.emit(EngineEvent::CurrentItemChanged { index: current });
        }
    }
}

impl NullEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackEngine for NullEngine {
    fn set_queue(&self, items: Vec<QueueItem>, start_index: usize, start_offset_ms: u64) {
        let mut inner = self.inner.lock().unwrap();
        debug!("Engine queue set: {} items, start {}", items.len(), start_index);
        inner.items = items;
        inner.position_ms = start_offset_ms;
        let start = (!inner.items.is_empty()).then_some(start_index.min(inner.items.len() - 1));
        inner.set_current(start);
    }

    fn prepare(&self) {}

    fn play(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.current.is_some() {
            inner.set_playing(true);
        }
    }

    fn pause(&self) {
        self.inner.lock().unwrap().set_playing(false);
    }

    fn seek_to_item(&self, index: usize, offset_ms: u64) {
        let mut inner = self.inner.lock().unwrap();
        if index < inner.items.len() {
            inner.position_ms = offset_ms;
            inner.set_current(Some(index));
        }
    }

    fn seek_to(&self, offset_ms: u64) {
        self.inner.lock().unwrap().position_ms = offset_ms;
    }

    fn remove_item(&self, index: usize) {
        let mut inner = self.inner.lock().unwrap();
        if index >= inner.items.len() {
            return;
        }
        inner.items.remove(index);
        match inner.current {
            Some(current) if current == index => {
                inner.position_ms = 0;
                inner.set_playing(false);
                inner.set_current(None);
            }
            Some(current) if current > index => {
                inner.set_current(Some(current - 1));
            }
            _ => {}
        }
    }

    fn clear_queue(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.items.clear();
        inner.position_ms = 0;
        inner.set_playing(false);
        inner.set_current(None);
    }

    fn has_next(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        matches!(inner.current, Some(c) if c + 1 < inner.items.len())
    }

    fn has_previous(&self) -> bool {
        matches!(self.inner.lock().unwrap().current, Some(c) if c > 0)
    }

    fn skip_next(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(current) = inner.current {
            if current + 1 < inner.items.len() {
                inner.position_ms = 0;
                inner.set_current(Some(current + 1));
            }
        }
    }

    fn skip_previous(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(current) = inner.current {
            if current > 0 {
                inner.position_ms = 0;
                inner.set_current(Some(current - 1));
            }
        }
    }

    fn current_index(&self) -> Option<usize> {
        self.inner.lock().unwrap().current
    }

    fn current_item(&self) -> Option<QueueItem> {
        let inner = self.inner.lock().unwrap();
        inner.current.and_then(|c| inner.items.get(c).cloned())
    }

    fn position_ms(&self) -> u64 {
        self.inner.lock().unwrap().position_ms
    }

    fn is_playing(&self) -> bool {
        self.inner.lock().unwrap().playing
    }

    fn item_count(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    fn set_event_sender(&self, tx: mpsc::UnboundedSender<EngineEvent>) {
        self.inner.lock().unwrap().tx = Some(tx);
    }
}
