//! Destination table capability consumed by the clone engine.

use crate::error::Result;
use crate::item::Item;
use async_trait::async_trait;

/// Write items to a destination table.
///
/// Writes are assumed to upsert by key (overwrite on conflict), which
/// is what makes page replays after a resume idempotent.
#[async_trait]
pub trait TableTarget: Send + Sync {
    /// Durably write every item in the batch.
    ///
    /// Must not report success until the whole batch is accepted; a
    /// partial failure must surface as an error so the checkpoint never
    /// advances past unwritten items.
    async fn write_batch(&self, items: &[Item]) -> Result<()>;
}
