//! The scan/write pump.
//!
//! Pages through the source, writes each page to the destination, and
//! only then advances the in-memory checkpoint. The write of page N
//! completes before the cursor moves to page N+1: the checkpoint record
//! is the sole durability anchor for "what has been migrated so far",
//! so a crash can re-process the in-flight page (at-least-once) but can
//! never skip one.

use crate::config::JobId;
use crate::error::Result;
use crate::item::Cursor;
use crate::source::TableSource;
use crate::state::CheckpointCollection;
use crate::target::TableTarget;
use tracing::{debug, info, warn};

/// Observability hook for the pump. Side effect only; never a
/// correctness input.
pub trait ProgressObserver: Send + Sync {
    /// Called once before the first scan. `total_hint` is approximate.
    fn begin(&self, total_hint: Option<u64>) {
        let _ = total_hint;
    }

    /// Called after each page is durably written.
    fn page_done(&self, items: u64) {
        let _ = items;
    }

    /// Called once after the final page.
    fn finish(&self) {}
}

/// Observer that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {}

/// Statistics from one pump run.
#[derive(Debug, Clone, Default)]
pub struct TransferStats {
    /// Items written to the destination.
    pub items_copied: u64,

    /// Pages scanned.
    pub pages: u64,

    /// Whether the run started from a recorded cursor.
    pub resumed: bool,
}

/// The scan/write loop over one job.
pub struct TransferEngine<'a> {
    progress: &'a dyn ProgressObserver,
}

impl<'a> TransferEngine<'a> {
    /// Create an engine reporting to the given observer.
    pub fn new(progress: &'a dyn ProgressObserver) -> Self {
        Self { progress }
    }

    /// Run the pump to completion.
    ///
    /// On success the job's record has been removed from `collection`
    /// (terminal completion has no persisted state). On error the
    /// collection still holds the checkpoint of the last fully written
    /// page; the caller persists it on the way out.
    pub async fn execute(
        &self,
        source: &dyn TableSource,
        target: &dyn TableTarget,
        job_id: &JobId,
        collection: &mut CheckpointCollection,
        start_cursor: Option<Cursor>,
    ) -> Result<TransferStats> {
        let mut stats = TransferStats {
            resumed: start_cursor.is_some(),
            ..Default::default()
        };

        let total_hint = match source.count_hint().await {
            Ok(hint) => hint,
            Err(e) => {
                warn!("Could not fetch source item count: {}", e);
                None
            }
        };
        self.progress.begin(total_hint);

        let mut cursor = start_cursor;
        loop {
            let page = source.scan(cursor.as_ref()).await?;
            stats.pages += 1;

            // The fetched page is always written before the cursor
            // advances, including the first page of a resumed run.
            if !page.items.is_empty() {
                target.write_batch(&page.items).await?;
                let written = page.items.len() as u64;
                stats.items_copied += written;
                self.progress.page_done(written);
                debug!("Page {}: wrote {} items", stats.pages, written);
            }

            match page.next_cursor {
                Some(next) => {
                    collection.checkpoint(job_id, next.clone());
                    cursor = Some(next);
                }
                None => {
                    // Sole terminal state: the record disappears. An
                    // empty final page lands here as a clean finish.
                    collection.remove(job_id);
                    break;
                }
            }
        }

        self.progress.finish();
        info!(
            "Copied {} items in {} pages{}",
            stats.items_copied,
            stats.pages,
            if stats.resumed { " (resumed)" } else { "" }
        );

        Ok(stats)
    }
}
