//! Snapshot file storage.
//!
//! The whole manager state is persisted as a single schema-versioned JSON
//! document under the data directory:
//!
//! ```text
//! .taskpad/                     # store.data_dir
//!   tasks.snapshot.json         # records, id counter, history order
//! ```
//!
//! History is stored as an ordered id list (least recently viewed first)
//! and replayed through the tracker on load, so the snapshot never carries
//! internal node state.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::task::{Epic, Subtask, Task, TaskId};

/// Snapshot document schema version
pub const SNAPSHOT_SCHEMA_VERSION: &str = "taskpad.tasks.v1";

/// Snapshot file name within the data directory
const SNAPSHOT_FILE: &str = "tasks.snapshot.json";

/// Serialized form of the whole manager state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub epics: Vec<Epic>,
    pub subtasks: Vec<Subtask>,
    /// Viewed ids, least recently viewed first.
    pub history: Vec<TaskId>,
    /// Next id the manager will hand out.
    pub next_id: TaskId,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: Vec::new(),
            epics: Vec::new(),
            subtasks: Vec::new(),
            history: Vec::new(),
            next_id: 0,
        }
    }
}

/// Storage manager for the snapshot file
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Create a storage manager rooted at the given data directory
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create a storage manager from configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.store.data_dir.clone())
    }

    /// Path to the data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Create the data directory if it does not exist
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Write a snapshot (atomic)
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.write_json(&self.snapshot_path(), snapshot)?;
        debug!(
            tasks = snapshot.tasks.len(),
            epics = snapshot.epics.len(),
            subtasks = snapshot.subtasks.len(),
            "snapshot written"
        );
        Ok(())
    }

    /// Read the snapshot, if one exists
    ///
    /// Rejects documents whose schema version this build does not know.
    pub fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }
        let snapshot: Snapshot = self.read_json(&path)?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(Error::SnapshotVersion(snapshot.schema_version));
        }
        Ok(Some(snapshot))
    }

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Write data atomically using temp file + rename
    ///
    /// Readers never see partial writes: the file is either fully written
    /// or not at all.
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;

        fs::rename(&temp_path, path)?;

        Ok(())
    }
}
