//! Opaque item and cursor types.
//!
//! Items are schema-agnostic attribute maps passed through unmodified;
//! the engine never interprets their contents. Cursors are continuation
//! tokens returned by paginated scans — stored and replayed, never
//! constructed or inspected by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed attribute value, mirroring the store's value model.
///
/// Serializes in the store's JSON shape (`{"S": "x"}`, `{"N": "42"}`,
/// ...) so persisted cursors stay human-inspectable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// String.
    S(String),
    /// Number, kept as its decimal string form to avoid precision loss.
    N(String),
    /// Binary.
    B(Vec<u8>),
    /// Boolean.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null.
    #[serde(rename = "NULL")]
    Null(bool),
    /// List.
    L(Vec<AttrValue>),
    /// Map.
    M(BTreeMap<String, AttrValue>),
    /// String set.
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// Number set.
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    /// Binary set.
    #[serde(rename = "BS")]
    Bs(Vec<Vec<u8>>),
}

/// One table item: attribute name to typed value.
pub type Item = BTreeMap<String, AttrValue>;

/// Opaque continuation token from a paginated scan, meaning "resume
/// scanning after this point".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Item);

impl Cursor {
    /// Wrap a store-provided key into a cursor.
    pub fn new(key: Item) -> Self {
        Self(key)
    }

    /// Borrow the underlying key for replay to the store.
    pub fn key(&self) -> &Item {
        &self.0
    }

    /// Unwrap into the underlying key.
    pub fn into_key(self) -> Item {
        self.0
    }
}
