//! Source table capability consumed by the clone engine.

use crate::error::Result;
use crate::item::{Cursor, Item};
use async_trait::async_trait;

/// One page of a paginated scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Items in this page. May be empty on the final page.
    pub items: Vec<Item>,

    /// Continuation token for the next page, absent when the scan is
    /// exhausted.
    pub next_cursor: Option<Cursor>,
}

/// Read items from a source table via paginated scans.
///
/// Implementations wrap a concrete store client; the engine only ever
/// requests pages and replays cursors.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Fetch one page of items, continuing after `cursor` when given.
    async fn scan(&self, cursor: Option<&Cursor>) -> Result<ScanPage>;

    /// Approximate total item count, used only to size progress
    /// reporting. Never a scan boundary.
    async fn count_hint(&self) -> Result<Option<u64>> {
        Ok(None)
    }
}
