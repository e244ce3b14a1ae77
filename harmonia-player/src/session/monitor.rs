//! Background monitoring tasks for the session
//!
//! Two tasks, both owned by the session manager and aborted together at
//! shutdown: the position poll and the engine event pump.

use crate::engine::{EngineEvent, PlaybackEngine};
use crate::session::manager::resume_from_engine;
use crate::session::state::SessionState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

/// Engine position poll interval
const POSITION_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Poll the engine position into session state.
///
/// Suspended while the user drags the seek control; the user-driven
/// value is reflected immediately by the seek path and must not be
/// overwritten by a stale engine read.
pub(crate) fn start_position_monitor(
    state: Arc<SessionState>,
    engine: Arc<dyn PlaybackEngine>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(POSITION_POLL_INTERVAL);
        debug!("Position poll started ({}ms interval)", POSITION_POLL_INTERVAL.as_millis());
        loop {
            interval.tick().await;
            if !state.is_scrubbing() {
                state.set_position(engine.position_ms() as f64);
            }
        }
    })
}

/// Fold asynchronous engine notifications into session state
pub(crate) fn start_engine_event_pump(
    state: Arc<SessionState>,
    engine: Arc<dyn PlaybackEngine>,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::PlayingChanged(playing) => state.set_playing(playing),
                EngineEvent::CurrentItemChanged { .. } => {
                    resume_from_engine(&state, engine.as_ref())
                }
            }
        }
        debug!("Engine event channel closed");
    })
}
