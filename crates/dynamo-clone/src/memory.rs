//! In-process table implementation.
//!
//! Backs both [`TableSource`] and [`TableTarget`] with an ordered
//! in-memory map, upserting by a configurable key attribute. Used by
//! the test suite and handy for local experiments with the engine.

use crate::error::{CloneError, Result};
use crate::item::{AttrValue, Cursor, Item};
use crate::source::{ScanPage, TableSource};
use crate::target::TableTarget;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

/// In-memory table with paginated scans and upsert-by-key writes.
pub struct MemoryTable {
    key_attr: String,
    page_size: usize,
    items: Mutex<BTreeMap<String, Item>>,
}

impl MemoryTable {
    /// Create an empty table keyed by `key_attr`, scanning `page_size`
    /// items per page.
    pub fn new(key_attr: impl Into<String>, page_size: usize) -> Self {
        Self {
            key_attr: key_attr.into(),
            page_size: page_size.max(1),
            items: Mutex::new(BTreeMap::new()),
        }
    }

    /// Upsert a single item.
    pub fn put(&self, item: Item) {
        let key = self.sort_key(&item);
        self.lock().insert(key, item);
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of all items in scan order.
    pub fn items(&self) -> Vec<Item> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Item>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stable ordering key for an item. Items without the key attribute
    /// fall back to whole-item identity so writes stay total.
    fn sort_key(&self, item: &Item) -> String {
        match item.get(&self.key_attr) {
            Some(attr) => encode(attr),
            None => serde_json::to_string(item).unwrap_or_default(),
        }
    }

    fn cursor_key(&self, cursor: &Cursor) -> Result<String> {
        cursor
            .key()
            .get(&self.key_attr)
            .map(encode)
            .ok_or_else(|| {
                CloneError::source(format!(
                    "cursor does not carry key attribute '{}'",
                    self.key_attr
                ))
            })
    }
}

fn encode(attr: &AttrValue) -> String {
    serde_json::to_string(attr).unwrap_or_default()
}

#[async_trait]
impl TableSource for MemoryTable {
    async fn scan(&self, cursor: Option<&Cursor>) -> Result<ScanPage> {
        let after = match cursor {
            Some(cursor) => Bound::Excluded(self.cursor_key(cursor)?),
            None => Bound::Unbounded,
        };

        let items = self.lock();
        let page: Vec<Item> = items
            .range::<String, _>((after, Bound::Unbounded))
            .take(self.page_size)
            .map(|(_, item)| item.clone())
            .collect();

        // A full page hands out a cursor even when it happens to be the
        // last one; the follow-up scan returns an empty page with no
        // cursor, which callers treat as clean termination.
        let next_cursor = if page.len() == self.page_size {
            page.last().and_then(|item| {
                item.get(&self.key_attr).map(|attr| {
                    let mut key = Item::new();
                    key.insert(self.key_attr.clone(), attr.clone());
                    Cursor::new(key)
                })
            })
        } else {
            None
        };

        Ok(ScanPage { items: page, next_cursor })
    }

    async fn count_hint(&self) -> Result<Option<u64>> {
        Ok(Some(self.len() as u64))
    }
}

#[async_trait]
impl TableTarget for MemoryTable {
    async fn write_batch(&self, items: &[Item]) -> Result<()> {
        let mut stored = self.lock();
        for item in items {
            let key = match item.get(&self.key_attr) {
                Some(attr) => encode(attr),
                None => serde_json::to_string(item).unwrap_or_default(),
            };
            stored.insert(key, item.clone());
        }
        Ok(())
    }
}
