//! # store
//!
//! The storage seam. Handlers talk to a [NoteStore]; [DynamoStore] is what
//! runs in Lambda and [MemoryStore] keeps the same semantics in-process for
//! tests and local runs.

mod dynamodb;
mod memory;

pub use dynamodb::DynamoStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Note, NotePage};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write found the stored item in a different state.
    #[error("condition check failed")]
    ConditionFailed,
    #[error("dynamodb {op}: {source}")]
    Dynamo {
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("item conversion: {0}")]
    Codec(#[from] serde_dynamo::Error),
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Write `note` at `(user_id, ts)`, replacing whatever is there.
    async fn put_note(&self, note: &Note) -> Result<(), StoreError>;
    /// Write `note` only if the item stored at `(user_id, ts)` still has this
    /// `ts` and this `note_id`; otherwise fail with
    /// [StoreError::ConditionFailed] and leave the stored item alone.
    async fn put_note_if_current(&self, note: &Note) -> Result<(), StoreError>;
    /// Look a note up through the `note_id` index. At most one item is read.
    async fn note_by_id(&self, note_id: &str) -> Result<Option<Note>, StoreError>;
    /// Up to `limit` of the user's notes, newest first, strictly older than
    /// `start` when given.
    async fn list_notes(
        &self,
        user_id: &str,
        limit: i32,
        start: Option<i64>,
    ) -> Result<NotePage, StoreError>;
    /// Delete `(user_id, ts)` if it exists.
    async fn delete_note(&self, user_id: &str, ts: i64) -> Result<(), StoreError>;
}
