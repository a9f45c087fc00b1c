//! File-based checkpoint state for resume capability.
//!
//! All job progress lives in one JSON document mapping job identifier
//! to progress record. The document is loaded wholesale at startup and
//! rewritten wholesale at shutdown; no partial reads or writes, so a
//! save never loses another job's record.

use crate::config::JobId;
use crate::error::{CloneError, Result};
use crate::item::Cursor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Progress state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Created but no page checkpointed yet.
    New,
    /// At least one page checkpointed; resumable.
    Running,
}

/// Progress record for one job.
///
/// Removed entirely from the collection on clean completion — there is
/// no terminal state kept on disk; absence means "never run" or "done".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Current state.
    pub state: JobState,

    /// When this attempt started.
    pub start_time: DateTime<Utc>,

    /// When the last page was checkpointed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Continuation token of the last durably written page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_cursor: Option<Cursor>,
}

impl JobRecord {
    /// Create a fresh record for a job starting from the beginning.
    pub fn fresh() -> Self {
        Self {
            state: JobState::New,
            start_time: Utc::now(),
            end_time: None,
            last_cursor: None,
        }
    }

    /// Record a successfully written page.
    pub fn checkpoint(&mut self, cursor: Cursor) {
        self.state = JobState::Running;
        self.last_cursor = Some(cursor);
        self.end_time = Some(Utc::now());
    }
}

/// The full mapping of job identifiers to progress records.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CheckpointCollection {
    jobs: HashMap<String, JobRecord>,
}

impl CheckpointCollection {
    /// Look up a job's record.
    pub fn get(&self, job_id: &JobId) -> Option<&JobRecord> {
        self.jobs.get(job_id.as_str())
    }

    /// Insert a fresh record for a job, replacing any existing one.
    pub fn insert_fresh(&mut self, job_id: &JobId) {
        self.jobs.insert(job_id.as_str().to_string(), JobRecord::fresh());
    }

    /// Checkpoint a written page for a job.
    pub fn checkpoint(&mut self, job_id: &JobId, cursor: Cursor) {
        self.jobs
            .entry(job_id.as_str().to_string())
            .or_insert_with(JobRecord::fresh)
            .checkpoint(cursor);
    }

    /// Remove a job's record (terminal completion).
    pub fn remove(&mut self, job_id: &JobId) {
        self.jobs.remove(job_id.as_str());
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether any jobs are tracked.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Parse a document, skipping individually malformed records.
    ///
    /// A bad entry (null, wrong shape) degrades to "no prior state" for
    /// that job only; records for other jobs are preserved.
    fn parse(content: &str) -> serde_json::Result<Self> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut jobs = HashMap::with_capacity(raw.len());
        for (job_id, value) in raw {
            match serde_json::from_value::<JobRecord>(value) {
                Ok(record) => {
                    jobs.insert(job_id, record);
                }
                Err(e) => {
                    warn!("Skipping malformed checkpoint record for job {}: {}", job_id, e);
                }
            }
        }
        Ok(Self { jobs })
    }
}

/// Loads and saves the checkpoint document.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Store at the default location under the user's home directory.
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CloneError::State("could not determine home directory".to_string()))?;
        Ok(Self::at(home.join(".aws_tools").join("dynamo_clone.json")))
    }

    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the checkpoint document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full collection.
    ///
    /// A missing file yields an empty collection (the containing
    /// directory is created so the final save can succeed). A corrupt
    /// or unreadable document is logged and degrades to an empty
    /// collection — corruption means "start fresh", never a crash.
    pub fn load(&self) -> Result<CheckpointCollection> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CheckpointCollection::default());
            }
            Err(e) => {
                warn!("Could not read checkpoint file {:?}: {}", self.path, e);
                return Ok(CheckpointCollection::default());
            }
        };

        match CheckpointCollection::parse(&content) {
            Ok(collection) => Ok(collection),
            Err(e) => {
                warn!(
                    "Checkpoint file {:?} is corrupt ({}); starting fresh",
                    self.path, e
                );
                Ok(CheckpointCollection::default())
            }
        }
    }

    /// Write the full collection back, overwriting the prior document.
    ///
    /// Atomic write: temp file then rename, so a crash mid-save never
    /// leaves a half-written document. A failure here is fatal to resume
    /// (the next run starts over) but does not touch either table.
    pub fn save(&self, collection: &CheckpointCollection) -> Result<()> {
        let content = serde_json::to_string_pretty(collection)?;

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CloneParams, EndpointConfig};
    use crate::item::{AttrValue, Item};
    use tempfile::tempdir;

    fn job_id() -> JobId {
        let endpoint = EndpointConfig {
            region: "us-east-1".to_string(),
            table: "orders".to_string(),
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
        };
        CloneParams {
            source: endpoint.clone(),
            destination: endpoint,
        }
        .job_id()
    }

    fn cursor(pk: &str) -> Cursor {
        let mut key = Item::new();
        key.insert("pk".to_string(), AttrValue::S(pk.to_string()));
        Cursor::new(key)
    }

    #[test]
    fn test_load_missing_file_yields_empty() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::at(dir.path().join("nested").join("state.json"));

        let collection = store.load().unwrap();
        assert!(collection.is_empty());
        // Containing directory was created so save can succeed.
        assert!(dir.path().join("nested").exists());
    }

    #[test]
    fn test_empty_collection_round_trip() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::at(dir.path().join("state.json"));

        store.save(&CheckpointCollection::default()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_record_round_trip_exact() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::at(dir.path().join("state.json"));
        let id = job_id();

        let mut collection = store.load().unwrap();
        collection.insert_fresh(&id);
        collection.checkpoint(&id, cursor("user#200"));
        let saved_record = collection.get(&id).unwrap().clone();
        store.save(&collection).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.get(&id), Some(&saved_record));
        assert_eq!(reloaded.get(&id).unwrap().state, JobState::Running);
        assert_eq!(
            reloaded.get(&id).unwrap().last_cursor,
            Some(cursor("user#200"))
        );
    }

    #[test]
    fn test_corrupt_document_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json at all").unwrap();

        let store = CheckpointStore::at(&path);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_record_skipped_others_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let id = job_id();

        let mut collection = CheckpointCollection::default();
        collection.checkpoint(&id, cursor("k1"));
        let mut doc: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&collection).unwrap()).unwrap();
        doc.as_object_mut()
            .unwrap()
            .insert("deadbeef".to_string(), serde_json::Value::Null);
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        let loaded = CheckpointStore::at(&path).load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(&id).is_some());
    }

    #[test]
    fn test_save_is_full_rewrite() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::at(dir.path().join("state.json"));
        let id = job_id();

        let mut collection = CheckpointCollection::default();
        collection.checkpoint(&id, cursor("k1"));
        store.save(&collection).unwrap();

        collection.remove(&id);
        store.save(&collection).unwrap();

        assert!(store.load().unwrap().get(&id).is_none());
    }

    #[test]
    fn test_document_is_pretty_json() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::at(dir.path().join("state.json"));
        let id = job_id();

        let mut collection = CheckpointCollection::default();
        collection.checkpoint(&id, cursor("k1"));
        store.save(&collection).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains('\n'));
        assert!(content.contains("\"RUNNING\""));
        assert!(content.contains("\"last_cursor\""));
    }
}
