//! Resume-or-restart decision for a job with prior recorded state.

use crate::config::JobId;
use crate::error::Result;
use crate::item::Cursor;
use crate::state::{CheckpointCollection, JobState};
use chrono::{DateTime, Utc};
use tracing::info;

/// Yes/no query capability with a default answer of "yes".
///
/// The CLI supplies an interactive implementation; non-interactive
/// callers use [`AutoConfirm`].
pub trait ResumePrompt: Send + Sync {
    /// Ask whether to resume from the state recorded at
    /// `last_checkpoint`. Returning the default (true) resumes.
    fn confirm_resume(&self, last_checkpoint: Option<DateTime<Utc>>) -> Result<bool>;
}

/// Prompt that always answers the default (resume).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ResumePrompt for AutoConfirm {
    fn confirm_resume(&self, _last_checkpoint: Option<DateTime<Utc>>) -> Result<bool> {
        Ok(true)
    }
}

/// Decide the effective start cursor for a job.
///
/// - No record: insert a fresh one, scan from the beginning.
/// - `RUNNING` record with a cursor: prompt; confirmed resumes from the
///   recorded cursor, declined discards it and starts fresh.
/// - Anything else (a `NEW` leftover from a run that never
///   checkpointed, or a `RUNNING` record missing its cursor): treated
///   like no record. Malformed state never aborts a run.
pub fn resolve(
    collection: &mut CheckpointCollection,
    job_id: &JobId,
    prompt: &dyn ResumePrompt,
) -> Result<Option<Cursor>> {
    if let Some(record) = collection.get(job_id) {
        if record.state == JobState::Running {
            if let Some(cursor) = record.last_cursor.clone() {
                if prompt.confirm_resume(record.end_time)? {
                    info!(
                        "Resuming job {} from checkpoint at {:?}",
                        job_id, record.end_time
                    );
                    return Ok(Some(cursor));
                }
                info!("Resume declined for job {}; starting fresh", job_id);
            }
        }
    }

    collection.insert_fresh(job_id);
    Ok(None)
}
