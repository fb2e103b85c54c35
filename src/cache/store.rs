//! On-disk persistence for the rate cache
//!
//! Provides a `RateStore` that saves the active snapshot and its refresh
//! instant to a versioned JSON file, so a restarted process can skip the
//! network until the snapshot goes stale.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use super::engine::{next_refresh_after, RateCache};
use crate::data::RateSnapshot;

/// Version written into every state file. Bump on incompatible layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// File name of the state file inside the store directory
const STATE_FILE: &str = "rates.json";

/// Errors from saving state
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// There is no snapshot to save
    #[error("Rate cache has no snapshot to save")]
    NothingToSave,

    /// Failed to encode the state
    #[error("Failed to encode rate cache: {0}")]
    Encode(#[from] serde_json::Error),

    /// Directory creation, temp file or rename failed
    #[error("Failed to write rate cache to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reasons a state file is ignored on load
#[derive(Debug, Error)]
enum CorruptState {
    #[error("unreadable: {0}")]
    Io(#[from] io::Error),

    #[error("malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("schema version {found} is not supported")]
    IncompatibleVersion { found: u32 },

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[from] crate::data::SnapshotError),

    #[error("saved for base {found}, configured base is {expected}")]
    OtherBase { found: String, expected: String },

    #[error("refresh instant {stored} does not match snapshot date {as_of}")]
    ScheduleMismatch {
        stored: NaiveDateTime,
        as_of: NaiveDate,
    },
}

/// Only the version tag, read before committing to the full layout
#[derive(Debug, Deserialize)]
struct VersionTag {
    schema_version: u32,
}

/// Layout of the state file, schema version 1
#[derive(Debug, Serialize, Deserialize)]
struct StoredState {
    schema_version: u32,
    base: String,
    as_of: NaiveDate,
    rates: HashMap<String, Decimal>,
    next_refresh_at: NaiveDateTime,
    /// When the file was written; informational only
    saved_at: DateTime<Utc>,
}

/// Reads and writes the rate cache state file
///
/// The state lives as JSON in an XDG-compliant cache directory
/// (`~/.cache/fxconv/` on Linux). Writes go to a temporary file in the same
/// directory which is then renamed over the old file, so a reader sees either
/// the previous state or the new one, never a partial write.
#[derive(Debug, Clone)]
pub struct RateStore {
    /// Directory where the state file is stored
    dir: PathBuf,
}

impl RateStore {
    /// Creates a RateStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "fxconv")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a RateStore in a specific directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Path of the state file
    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Loads the persisted cache
    ///
    /// Returns `None` when there is no usable prior state: the file is
    /// missing, unreadable, malformed, from another schema version, or holds
    /// values that fail validation. A snapshot quoted against a base other
    /// than `base` is also treated as absent. The caller starts with an
    /// empty cache.
    pub fn load(&self, base: &str) -> Option<RateCache> {
        let path = self.path();
        if !path.exists() {
            debug!(path = %path.display(), "No saved rate cache");
            return None;
        }

        match read_state(&path, base) {
            Ok(cache) => {
                debug!(path = %path.display(), "Restored rate cache");
                Some(cache)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring saved rate cache");
                None
            }
        }
    }

    /// Atomically writes the cache's snapshot and refresh instant
    ///
    /// Does not touch the dirty flag; the caller clears it on success.
    pub fn save(&self, cache: &RateCache) -> Result<(), PersistenceError> {
        let (snapshot, next_refresh_at) = cache
            .current()
            .zip(cache.next_refresh_at())
            .ok_or(PersistenceError::NothingToSave)?;

        let state = StoredState {
            schema_version: SCHEMA_VERSION,
            base: snapshot.base().to_string(),
            as_of: snapshot.as_of(),
            rates: snapshot.rates().clone(),
            next_refresh_at,
            saved_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&state)?;

        let io_err = |source: io::Error| PersistenceError::Io {
            path: self.path(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(self.path()).map_err(|e| io_err(e.error))?;

        debug!(path = %self.path().display(), "Saved rate cache");
        Ok(())
    }
}

fn read_state(path: &Path, base: &str) -> Result<RateCache, CorruptState> {
    let content = fs::read(path)?;

    let tag: VersionTag = serde_json::from_slice(&content)?;
    if tag.schema_version != SCHEMA_VERSION {
        return Err(CorruptState::IncompatibleVersion {
            found: tag.schema_version,
        });
    }

    let state: StoredState = serde_json::from_slice(&content)?;
    if state.base != base {
        return Err(CorruptState::OtherBase {
            found: state.base,
            expected: base.to_string(),
        });
    }
    let snapshot = RateSnapshot::new(state.base, state.as_of, state.rates)?;

    if state.next_refresh_at != next_refresh_after(state.as_of) {
        return Err(CorruptState::ScheduleMismatch {
            stored: state.next_refresh_at,
            as_of: state.as_of,
        });
    }

    Ok(RateCache::restore(snapshot, state.next_refresh_at))
}
