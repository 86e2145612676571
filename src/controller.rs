//! Drives the queue from transport commands and end-of-track signals.
//!
//! [`PlayerController`] is the only production caller of [`QueueEngine`]. It
//! hands whatever track the queue settles on to a [`PlaybackBackend`] and
//! moves state in and out of a [`SnapshotStore`] across restarts.

use crate::model::{RepeatMode, TrackId};
use crate::queue::QueueEngine;
use crate::store::SnapshotStore;
use anyhow::{Context, Result};
use rand::Rng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

pub trait PlaybackBackend {
    fn play(&mut self, track: TrackId) -> Result<()>;
    fn stop(&mut self);
    fn now_playing(&self) -> Option<TrackId>;
}

/// Backend that plays nothing and remembers what it was asked to play.
#[derive(Debug, Default)]
pub struct NullBackend {
    current: Option<TrackId>,
    history: Vec<TrackId>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[TrackId] {
        &self.history
    }
}

impl PlaybackBackend for NullBackend {
    fn play(&mut self, track: TrackId) -> Result<()> {
        self.current = Some(track);
        self.history.push(track);
        Ok(())
    }

    fn stop(&mut self) {
        self.current = None;
    }

    fn now_playing(&self) -> Option<TrackId> {
        self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Next,
    Previous,
    JumpTo(i64),
    ToggleShuffle,
    CycleRepeat,
    SetRepeat(RepeatMode),
    Stop,
}

/// What transport buttons should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportState {
    pub can_next: bool,
    pub can_previous: bool,
    pub current: Option<TrackId>,
    pub repeat_mode: RepeatMode,
    pub shuffled: bool,
}

pub struct PlayerController<B, R = SmallRng> {
    engine: QueueEngine<R>,
    backend: B,
    store: Option<SnapshotStore>,
    shuffle_on_load: bool,
}

impl<B: PlaybackBackend, R: Rng> PlayerController<B, R> {
    pub fn new(engine: QueueEngine<R>, backend: B) -> Self {
        Self {
            engine,
            backend,
            store: None,
            shuffle_on_load: false,
        }
    }

    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_shuffle_on_load(mut self, enabled: bool) -> Self {
        self.shuffle_on_load = enabled;
        self
    }

    pub fn engine(&self) -> &QueueEngine<R> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut QueueEngine<R> {
        &mut self.engine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn store(&self) -> Option<&SnapshotStore> {
        self.store.as_ref()
    }

    /// Makes `track_ids` the active queue and starts its first track.
    ///
    /// With shuffle on load the queue is shuffled first and playback starts
    /// at the head of the shuffled order.
    pub fn load_queue(&mut self, track_ids: Vec<TrackId>) -> Result<Option<TrackId>> {
        self.engine.set_queue(track_ids);
        if self.shuffle_on_load && !self.engine.is_empty() {
            self.engine.set_shuffle(true);
            self.engine.jump_to(0)?;
        }
        info!(
            tracks = self.engine.len(),
            shuffled = self.engine.is_shuffled(),
            "queue loaded"
        );

        match self.engine.current() {
            Some(track) => self.start(track),
            None => {
                self.backend.stop();
                Ok(None)
            }
        }
    }

    /// Applies a transport command and returns the track handed to the
    /// backend, if any.
    ///
    /// A move that has nowhere to go leaves playback alone.
    pub fn handle(&mut self, command: Transport) -> Result<Option<TrackId>> {
        debug!(?command, "transport");
        match command {
            Transport::Next => match self.engine.move_next() {
                Some(track) => self.start(track),
                None => Ok(None),
            },
            Transport::Previous => match self.engine.move_previous() {
                Some(track) => self.start(track),
                None => Ok(None),
            },
            Transport::JumpTo(index) => {
                let track = self
                    .engine
                    .jump_to(index)
                    .with_context(|| format!("cannot jump to position {index}"))?;
                self.start(track)
            }
            Transport::ToggleShuffle => {
                self.engine.toggle_shuffle();
                Ok(None)
            }
            Transport::CycleRepeat => {
                self.engine.cycle_repeat_mode();
                Ok(None)
            }
            Transport::SetRepeat(mode) => {
                self.engine.set_repeat_mode(mode);
                Ok(None)
            }
            Transport::Stop => {
                self.backend.stop();
                Ok(None)
            }
        }
    }

    /// The backend finished the current track.
    pub fn track_finished(&mut self) -> Result<Option<TrackId>> {
        match self.engine.move_next() {
            Some(track) => self.start(track),
            None => {
                info!("reached end of queue");
                self.backend.stop();
                Ok(None)
            }
        }
    }

    pub fn transport_state(&self) -> TransportState {
        TransportState {
            can_next: self.engine.has_next(),
            can_previous: self.engine.has_previous(),
            current: self.engine.current(),
            repeat_mode: self.engine.repeat_mode(),
            shuffled: self.engine.is_shuffled(),
        }
    }

    /// Restores the saved queue, if there is one. Playback is not started.
    pub fn resume(&mut self) -> bool {
        let Some(snapshot) = self.store.as_ref().and_then(SnapshotStore::load) else {
            return false;
        };

        self.engine.restore_state(&snapshot);
        info!(
            tracks = self.engine.len(),
            index = ?self.engine.current_index(),
            "resumed saved queue"
        );
        true
    }

    pub fn persist(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.save(&self.engine.state())
    }

    fn start(&mut self, track: TrackId) -> Result<Option<TrackId>> {
        self.backend
            .play(track)
            .with_context(|| format!("failed to play track {track}"))?;
        Ok(Some(track))
    }
}
