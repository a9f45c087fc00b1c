//! Lifecycle controller: wires state loading, resume policy, the pump,
//! and the guaranteed final save.

use crate::config::{CloneParams, JobId};
use crate::error::Result;
use crate::resume::{self, AutoConfirm, ResumePrompt};
use crate::source::TableSource;
use crate::state::CheckpointStore;
use crate::target::TableTarget;
use crate::transfer::{NoopProgress, ProgressObserver, TransferEngine};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Result of a completed clone run.
#[derive(Debug, Clone, Serialize)]
pub struct CloneReport {
    /// Job identifier derived from the parameters.
    pub job_id: String,

    /// Items written to the destination in this run.
    pub items_copied: u64,

    /// Pages scanned in this run.
    pub pages: u64,

    /// Whether the run resumed from a recorded checkpoint.
    pub resumed: bool,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Average throughput.
    pub items_per_second: u64,
}

impl CloneReport {
    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Clone orchestrator.
///
/// Owns the checkpoint document for the duration of one run: load once
/// at start, mutate in memory, save exactly once on the way out —
/// success or failure. One process at a time per checkpoint file; two
/// concurrent runs against the same file clobber each other's saves.
pub struct Cloner {
    params: CloneParams,
    store: CheckpointStore,
    prompt: Box<dyn ResumePrompt>,
    progress: Box<dyn ProgressObserver>,
}

impl Cloner {
    /// Create an orchestrator for the given parameters.
    ///
    /// Validates the parameters up front and resolves the default
    /// checkpoint path; resumes are auto-confirmed and progress is
    /// unreported until overridden.
    pub fn new(params: CloneParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            store: CheckpointStore::new()?,
            prompt: Box::new(AutoConfirm),
            progress: Box::new(NoopProgress),
        })
    }

    /// Override the checkpoint document path.
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store = CheckpointStore::at(path);
        self
    }

    /// Set the resume prompt.
    pub fn with_prompt(mut self, prompt: Box<dyn ResumePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Set the progress observer.
    pub fn with_progress(mut self, progress: Box<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    /// Job identifier for these parameters.
    pub fn job_id(&self) -> JobId {
        self.params.job_id()
    }

    /// Run the clone: load state, apply the resume policy, pump pages,
    /// and persist the final state unconditionally.
    ///
    /// The save happens exactly once whether the pump succeeds or
    /// fails. A failed run leaves a resumable record on disk; a clean
    /// run leaves no record for this job.
    pub async fn run(
        &self,
        source: &dyn TableSource,
        target: &dyn TableTarget,
    ) -> Result<CloneReport> {
        let started_at = Utc::now();
        let job_id = self.params.job_id();
        info!(
            "Starting copy of {} ({}) to {} ({}), job {}",
            self.params.source.table,
            self.params.source.region,
            self.params.destination.table,
            self.params.destination.region,
            job_id
        );

        let mut collection = self.store.load()?;
        let start_cursor = resume::resolve(&mut collection, &job_id, self.prompt.as_ref())?;

        let outcome = TransferEngine::new(self.progress.as_ref())
            .execute(source, target, &job_id, &mut collection, start_cursor)
            .await;

        // Final save on every exit path. The pump error, if any, takes
        // precedence over a save failure in what we report.
        let saved = self.store.save(&collection);
        let stats = outcome?;
        saved?;

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let items_per_second = if duration_seconds > 0.0 {
            (stats.items_copied as f64 / duration_seconds) as u64
        } else {
            0
        };

        Ok(CloneReport {
            job_id: job_id.to_string(),
            items_copied: stats.items_copied,
            pages: stats.pages,
            resumed: stats.resumed,
            started_at,
            completed_at,
            duration_seconds,
            items_per_second,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::error::CloneError;
    use crate::item::{AttrValue, Item};
    use crate::memory::MemoryTable;
    use crate::state::JobState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn params() -> CloneParams {
        let endpoint = EndpointConfig {
            region: "us-east-1".to_string(),
            table: "orders".to_string(),
            access_key_id: "AKIA".to_string(),
            secret_access_key: "secret".to_string(),
        };
        CloneParams {
            source: endpoint.clone(),
            destination: EndpointConfig {
                table: "orders-copy".to_string(),
                ..endpoint
            },
        }
    }

    fn item(pk: u32) -> Item {
        let mut item = Item::new();
        item.insert("pk".to_string(), AttrValue::S(format!("user#{:05}", pk)));
        item
    }

    fn seeded_source(count: u32, page_size: usize) -> MemoryTable {
        let table = MemoryTable::new("pk", page_size);
        for i in 0..count {
            table.put(item(i));
        }
        table
    }

    /// Destination that starts failing from a given batch onwards,
    /// simulating a run killed partway through.
    struct FlakyTarget {
        inner: Arc<MemoryTable>,
        fail_from_batch: usize,
        batches: AtomicUsize,
    }

    #[async_trait]
    impl crate::target::TableTarget for FlakyTarget {
        async fn write_batch(&self, items: &[Item]) -> Result<()> {
            let batch = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
            if batch >= self.fail_from_batch {
                return Err(CloneError::target("injected write failure"));
            }
            self.inner.write_batch(items).await
        }
    }

    #[tokio::test]
    async fn test_invalid_params_rejected_before_any_io() {
        let mut p = params();
        p.source.table = "".to_string();
        assert!(matches!(Cloner::new(p), Err(CloneError::Config(_))));
    }

    #[tokio::test]
    async fn test_clean_run_leaves_no_record() {
        let dir = tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let source = seeded_source(42, 10);
        let target = MemoryTable::new("pk", 10);

        let cloner = Cloner::new(params()).unwrap().with_state_path(&state_path);
        let report = cloner.run(&source, &target).await.unwrap();

        assert_eq!(report.items_copied, 42);
        assert!(!report.resumed);
        assert_eq!(target.len(), 42);

        let reloaded = CheckpointStore::at(&state_path).load().unwrap();
        assert!(reloaded.get(&cloner.job_id()).is_none());
    }

    #[tokio::test]
    async fn test_failed_run_persists_last_good_checkpoint() {
        let dir = tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let source = seeded_source(250, 100);
        let destination = Arc::new(MemoryTable::new("pk", 100));
        let target = FlakyTarget {
            inner: destination.clone(),
            fail_from_batch: 3,
            batches: AtomicUsize::new(0),
        };

        let cloner = Cloner::new(params()).unwrap().with_state_path(&state_path);
        let err = cloner.run(&source, &target).await.unwrap_err();
        assert!(matches!(err, CloneError::Target(_)));

        // Pages 1-2 landed, page 3 did not.
        assert_eq!(destination.len(), 200);

        let reloaded = CheckpointStore::at(&state_path).load().unwrap();
        let record = reloaded.get(&cloner.job_id()).unwrap();
        assert_eq!(record.state, JobState::Running);
        assert!(record.last_cursor.is_some());
        assert!(record.end_time.is_some());
    }

    /// The end-to-end interrupt-and-resume scenario: 250 items at page
    /// size 100, run 1 dies after checkpointing 200, run 2 with
    /// identical parameters resumes and finishes. The destination ends
    /// with all 250 items exactly once and no record remains.
    #[tokio::test]
    async fn test_interrupted_run_resumes_to_completion() {
        let dir = tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let source = seeded_source(250, 100);
        let destination = Arc::new(MemoryTable::new("pk", 100));

        // Run 1: killed on page 3.
        let target = FlakyTarget {
            inner: destination.clone(),
            fail_from_batch: 3,
            batches: AtomicUsize::new(0),
        };
        let cloner = Cloner::new(params()).unwrap().with_state_path(&state_path);
        cloner.run(&source, &target).await.unwrap_err();
        assert_eq!(destination.len(), 200);

        // Run 2: identical parameters, confirmed resume.
        let cloner = Cloner::new(params()).unwrap().with_state_path(&state_path);
        let report = cloner.run(&source, destination.as_ref()).await.unwrap();

        assert!(report.resumed);
        assert_eq!(report.items_copied, 50);
        assert_eq!(destination.len(), 250);
        assert_eq!(destination.items().len(), 250);

        let reloaded = CheckpointStore::at(&state_path).load().unwrap();
        assert!(reloaded.get(&cloner.job_id()).is_none());
    }

    #[tokio::test]
    async fn test_declined_resume_restarts_from_beginning() {
        struct Decline;
        impl ResumePrompt for Decline {
            fn confirm_resume(&self, _at: Option<DateTime<Utc>>) -> Result<bool> {
                Ok(false)
            }
        }

        let dir = tempdir().unwrap();
        let state_path = dir.path().join("state.json");
        let source = seeded_source(250, 100);
        let destination = Arc::new(MemoryTable::new("pk", 100));

        let target = FlakyTarget {
            inner: destination.clone(),
            fail_from_batch: 3,
            batches: AtomicUsize::new(0),
        };
        let cloner = Cloner::new(params()).unwrap().with_state_path(&state_path);
        cloner.run(&source, &target).await.unwrap_err();

        let cloner = Cloner::new(params())
            .unwrap()
            .with_state_path(&state_path)
            .with_prompt(Box::new(Decline));
        let report = cloner.run(&source, destination.as_ref()).await.unwrap();

        // Full rescan: all 250 items written this run, upserts keep the
        // destination at exactly 250.
        assert!(!report.resumed);
        assert_eq!(report.items_copied, 250);
        assert_eq!(destination.len(), 250);
    }
}
