//! # dynamo-clone
//!
//! Resumable, idempotent copy of all items from one key-value table to
//! another, with support for:
//!
//! - **Checkpointed progress** persisted after every page, so a crash
//!   or manual stop never forces a full restart
//! - **Resume detection** via a job identity hashed from the clone
//!   parameters; re-running with identical parameters offers to
//!   continue
//! - **At-least-once delivery**: a retried page may rewrite items that
//!   were already written, relying on the destination's upsert-by-key
//!   semantics, but a page is never skipped
//! - **Pluggable stores** behind [`TableSource`]/[`TableTarget`], with
//!   a DynamoDB driver and an in-memory table included
//!
//! ## Example
//!
//! ```rust,no_run
//! use dynamo_clone::{CloneParams, Cloner, EndpointConfig};
//! use dynamo_clone::drivers::dynamo::{DynamoSource, DynamoTarget};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let params = CloneParams {
//!         source: EndpointConfig {
//!             region: "us-east-1".into(),
//!             table: "orders".into(),
//!             access_key_id: "...".into(),
//!             secret_access_key: "...".into(),
//!         },
//!         destination: EndpointConfig {
//!             region: "eu-west-1".into(),
//!             table: "orders-copy".into(),
//!             access_key_id: "...".into(),
//!             secret_access_key: "...".into(),
//!         },
//!     };
//!     let source = DynamoSource::new(&params.source);
//!     let target = DynamoTarget::new(&params.destination);
//!     let report = Cloner::new(params)?.run(&source, &target).await?;
//!     println!("Copied {} items", report.items_copied);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod drivers;
pub mod error;
pub mod item;
pub mod memory;
pub mod orchestrator;
pub mod resume;
pub mod source;
pub mod state;
pub mod target;
pub mod transfer;

// Re-exports for convenient access
pub use config::{CloneParams, EndpointConfig, JobId};
pub use error::{CloneError, Result};
pub use item::{AttrValue, Cursor, Item};
pub use memory::MemoryTable;
pub use orchestrator::{CloneReport, Cloner};
pub use resume::{AutoConfirm, ResumePrompt};
pub use source::{ScanPage, TableSource};
pub use state::{CheckpointCollection, CheckpointStore, JobRecord, JobState};
pub use target::TableTarget;
pub use transfer::{NoopProgress, ProgressObserver, TransferStats};
