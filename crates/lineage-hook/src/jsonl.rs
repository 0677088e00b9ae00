//! Append-only JSON-lines lineage sink.
//!
//! Each `store` call appends one line holding every edge of the query, so
//! the file can be replayed or shipped elsewhere later:
//! ```text
//! {"batch_id":"…","recorded_at":"2024-01-15T10:00:00Z","edges":[…]}
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lineage_core::{Edge, EdgeStore, LineageConfig, StoreError};

/// One line of the file.
#[derive(Debug, Serialize, Deserialize)]
pub struct LineageRecord {
    pub batch_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub edges: Vec<Edge>,
}

pub struct JsonLinesEdgeStore {
    path: PathBuf,
    // Serializes appends from concurrent queries.
    write_lock: Mutex<()>,
}

impl JsonLinesEdgeStore {
    pub const NAME: &'static str = "jsonl";

    /// Create the store, creating parent directories of `path` if needed.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn from_config(config: &LineageConfig) -> Result<Self, StoreError> {
        Self::new(&config.jsonl.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EdgeStore for JsonLinesEdgeStore {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn store(&self, edges: &[Edge]) -> Result<(), StoreError> {
        let record = LineageRecord {
            batch_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            edges: edges.to_vec(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Write("jsonl writer lock poisoned".into()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        tracing::debug!(
            batch_id = %record.batch_id,
            edges = edges.len(),
            path = %self.path.display(),
            "Lineage appended"
        );
        Ok(())
    }
}
