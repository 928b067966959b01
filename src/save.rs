//! Save slots for the player record
//!
//! Every slot is one pretty-printed JSON file under the platform data dir.
//! Auto-saves are numbered files; only the newest few are kept.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ashen_game::{PersistenceError, PlayerRecord, PlayerStore};
use tracing::{debug, info};

const AUTOSAVE_PREFIX: &str = "autosave_";

/// Summary info for a save slot (for listing)
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSlotInfo {
    /// Filename (without extension)
    pub filename: String,
    pub character_name: String,
    pub level: u32,
    /// RFC 3339 timestamp of the save
    pub last_played: Option<String>,
    pub play_time_seconds: f64,
}

/// Get the default save directory path
pub fn default_save_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ashen")
        .join("saves")
}

/// Sanitize a slot name into a valid filename
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .to_lowercase()
}

fn stamp(record: &PlayerRecord) -> PlayerRecord {
    let mut record = record.clone();
    record.last_played = Some(chrono::Utc::now().to_rfc3339());
    record
}

fn write_record(path: &Path, record: &PlayerRecord) -> Result<()> {
    record.validate().context("Refusing to save invalid record")?;
    let json = record.to_json().context("Failed to serialize player record")?;
    fs::write(path, json).with_context(|| format!("Failed to write save file {:?}", path))?;
    Ok(())
}

fn read_record(path: &Path) -> Result<PlayerRecord> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read save file {:?}", path))?;
    let record = PlayerRecord::from_json(&json).context("Failed to load player record")?;
    Ok(record)
}

/// A directory of save files
#[derive(Debug, Clone)]
pub struct SaveSlots {
    dir: PathBuf,
}

impl SaveSlots {
    /// Use `dir`, creating it if it doesn't exist
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).context("Failed to create save directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, filename: &str) -> PathBuf {
        self.dir.join(format!("{}.json", filename))
    }

    /// A single named slot as a [`PlayerStore`]
    pub fn store(&self, slot_name: &str) -> JsonFileStore {
        JsonFileStore::new(self.slot_path(&sanitize_filename(slot_name)))
    }

    /// Save to a named slot
    pub fn save_to_slot(&self, slot_name: &str, record: &PlayerRecord) -> Result<()> {
        let path = self.slot_path(&sanitize_filename(slot_name));
        write_record(&path, &stamp(record))?;
        info!("Saved {} to {:?}", record.name, path);
        Ok(())
    }

    /// Load from a named slot (by filename, not display name)
    pub fn load_from_slot(&self, filename: &str) -> Result<PlayerRecord> {
        read_record(&self.slot_path(filename))
    }

    /// Delete a save slot
    pub fn delete_slot(&self, filename: &str) -> Result<()> {
        let path = self.slot_path(filename);
        if path.exists() {
            fs::remove_file(&path).context("Failed to delete save file")?;
        }
        Ok(())
    }

    fn json_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).context("Failed to read save directory")? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            files.push((stem.to_string(), path));
        }
        files.sort();
        Ok(files)
    }

    /// List named slots, newest first. Auto-saves and unreadable files are skipped.
    pub fn list_save_slots(&self) -> Result<Vec<SaveSlotInfo>> {
        let mut slots = Vec::new();
        for (filename, path) in self.json_files()? {
            if filename.starts_with(AUTOSAVE_PREFIX) {
                continue;
            }
            match read_record(&path) {
                Ok(record) => slots.push(SaveSlotInfo {
                    filename,
                    character_name: record.name,
                    level: record.level,
                    last_played: record.last_played,
                    play_time_seconds: record.play_time_seconds,
                }),
                Err(e) => debug!("Skipping {:?}: {:#}", path, e),
            }
        }

        // RFC 3339 in UTC sorts lexically
        slots.sort_by(|a, b| b.last_played.cmp(&a.last_played));
        Ok(slots)
    }

    fn autosaves(&self) -> Result<Vec<(u64, PathBuf)>> {
        Ok(self
            .json_files()?
            .into_iter()
            .filter_map(|(stem, path)| {
                let number = stem.strip_prefix(AUTOSAVE_PREFIX)?.parse().ok()?;
                Some((number, path))
            })
            .collect())
    }

    /// Write a new auto-save and delete all but the newest `keep`
    pub fn autosave(&self, record: &PlayerRecord, keep: usize) -> Result<PathBuf> {
        let mut existing = self.autosaves()?;
        existing.sort_by_key(|(number, _)| *number);
        let next = existing.last().map_or(1, |(number, _)| number + 1);

        let path = self.slot_path(&format!("{}{:06}", AUTOSAVE_PREFIX, next));
        write_record(&path, &stamp(record))?;
        existing.push((next, path.clone()));

        let excess = existing.len().saturating_sub(keep.max(1));
        for (_, old) in existing.drain(..excess) {
            fs::remove_file(&old).with_context(|| format!("Failed to prune auto-save {:?}", old))?;
            debug!("Pruned auto-save {:?}", old);
        }
        info!("Auto-saved to {:?}", path);
        Ok(path)
    }

    /// The most recent auto-save, if any
    pub fn latest_autosave(&self) -> Result<Option<PlayerRecord>> {
        let latest = self.autosaves()?.into_iter().max_by_key(|(number, _)| *number);
        latest.map(|(_, path)| read_record(&path)).transpose()
    }
}

/// One JSON file holding one player record
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlayerStore for JsonFileStore {
    fn load(&self) -> Result<Option<PlayerRecord>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path).map_err(|e| PersistenceError::Storage(e.to_string()))?;
        PlayerRecord::from_json(&json).map(Some)
    }

    fn save(&mut self, record: &PlayerRecord) -> Result<(), PersistenceError> {
        let record = stamp(record);
        record.validate()?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| PersistenceError::Storage(e.to_string()))?;
        }
        fs::write(&self.path, record.to_json()?).map_err(|e| PersistenceError::Storage(e.to_string()))
    }
}

/// Format play time as "Xh Ym" or "Ym Zs"
pub fn format_play_time(seconds: f64) -> String {
    let total_secs = seconds as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}
