use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier for a track. The queue never looks inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TrackId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RepeatMode {
    #[default]
    None,
    One,
    All,
}

impl RepeatMode {
    pub fn next(self) -> Self {
        match self {
            Self::None => Self::All,
            Self::All => Self::One,
            Self::One => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::One => "one",
            Self::All => "all",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Some(Self::None),
            "one" | "single" => Some(Self::One),
            "all" | "loop" => Some(Self::All),
            _ => None,
        }
    }
}

/// Inert copy of the whole queue state, as written to the snapshot file.
///
/// `current_index` is `-1` when there is no current track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueSnapshot {
    pub original_order: Vec<TrackId>,
    pub play_order: Vec<TrackId>,
    pub current_index: i64,
    pub repeat_mode: RepeatMode,
    pub is_shuffled: bool,
}

impl Default for QueueSnapshot {
    fn default() -> Self {
        Self {
            original_order: Vec::new(),
            play_order: Vec::new(),
            current_index: -1,
            repeat_mode: RepeatMode::default(),
            is_shuffled: false,
        }
    }
}

pub fn track_ids(raw: &[i64]) -> Vec<TrackId> {
    raw.iter().copied().map(TrackId).collect()
}
