pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod queue;
pub mod store;

pub use controller::{NullBackend, PlaybackBackend, PlayerController, Transport, TransportState};
pub use error::QueueError;
pub use model::{QueueSnapshot, RepeatMode, TrackId};
pub use queue::QueueEngine;
pub use store::SnapshotStore;
