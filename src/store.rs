//! Durable storage for [`QueueSnapshot`]s.
//!
//! Writes go to a sibling `.tmp` file that is renamed over the real one, so
//! readers only ever see a complete snapshot. Reads never fail: anything
//! that cannot be turned back into a snapshot is reported as nothing saved.

use crate::model::QueueSnapshot;
use anyhow::{Context, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<QueueSnapshot> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved queue");
                return None;
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read saved queue");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable saved queue");
                None
            }
        }
    }

    pub fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.temp_path();
        write_synced(&tmp, json.as_bytes())
            .with_context(|| format!("failed to write {}", tmp.display()))?;

        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err)
                .with_context(|| format!("failed to replace {}", self.path.display()));
        }

        debug!(path = %self.path.display(), tracks = snapshot.play_order.len(), "queue saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove {}", self.path.display()))
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "queue.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
