use crate::model::RepeatMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "tune-queue";
const SETTINGS_FILE: &str = "settings.json";
const SNAPSHOT_FILE: &str = "queue.json";
pub const CONFIG_DIR_ENV: &str = "TUNE_QUEUE_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub default_repeat_mode: RepeatMode,
    #[serde(default)]
    pub shuffle_on_load: bool,
}

fn default_log_filter() -> String {
    String::from("tune_queue=info")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            log_filter: default_log_filter(),
            default_repeat_mode: RepeatMode::default(),
            shuffle_on_load: false,
        }
    }
}

impl Settings {
    pub fn snapshot_path(&self) -> Result<PathBuf> {
        match &self.snapshot_path {
            Some(path) => Ok(path.clone()),
            None => default_snapshot_path(),
        }
    }
}

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn default_snapshot_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SNAPSHOT_FILE))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let root = config_root()?;
    fs::create_dir_all(&root).with_context(|| format!("failed to create {}", root.display()))?;
    Ok(root)
}

pub fn load_settings() -> Result<Settings> {
    let path = settings_path()?;
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse settings file {}", path.display()))?;
    Ok(settings)
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    ensure_config_dir()?;
    let path = settings_path()?;
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
