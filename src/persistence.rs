//! Durable storage of a pending countdown finish time

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("finish time store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted record exists but cannot be decoded
    #[error("persisted finish time is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable single-slot store for the pending finish time.
///
/// Written on suspend, read and cleared on resume. Reading a slot that was
/// never written yields `None`. One countdown instance owns a given store
/// at a time; sharing a slot between engines is undefined.
pub trait FinishTimeStore: Send + Sync {
    /// Read the persisted finish time, if any
    fn get(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Persist `finish_time`, replacing any previous record
    fn set(&self, finish_time: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove the persisted record; clearing an empty slot is a no-op
    fn clear(&self) -> Result<(), StoreError>;
}

/// Process-local store, useful for tests and hosts that handle durability
/// elsewhere
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FinishTimeStore for MemoryStore {
    fn get(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(*self.slot.lock().expect("finish time slot lock poisoned"))
    }

    fn set(&self, finish_time: DateTime<Utc>) -> Result<(), StoreError> {
        *self.slot.lock().expect("finish time slot lock poisoned") = Some(finish_time);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().expect("finish time slot lock poisoned") = None;
        Ok(())
    }
}

/// On-disk schema for the persisted record
#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    finish_time: DateTime<Utc>,
}

/// Store backed by a single JSON file.
///
/// Writes go through a temporary file and an atomic rename so a crash
/// mid-write never leaves a truncated record behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store persisting to `path`; the file is created on the
    /// first `set`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone();
        path.set_extension("tmp");
        path
    }
}

impl FinishTimeStore for JsonFileStore {
    fn get(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let record: PersistedRecord = serde_json::from_str(&raw)?;
                Ok(Some(record.finish_time))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, finish_time: DateTime<Utc>) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&PersistedRecord { finish_time })?;
        let temp = self.temp_path();
        fs::write(&temp, raw)?;
        fs::rename(&temp, &self.path)?;
        debug!(path = %self.path.display(), %finish_time, "persisted finish time");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
