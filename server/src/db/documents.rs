//! The snapshot document and the storage trait behind it.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stored snapshot of a bracket instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    /// Storage key of the document
    pub doc_id: String,
    /// Bracket instance the snapshot belongs to
    pub instance_id: String,
    /// Serialized bracket data
    pub raw: String,
    /// Last time `raw` was written
    pub updated_at: DateTime<Utc>,
}

/// A document database holding one snapshot per bracket instance.
///
/// Writes always replace the whole `raw` field.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// First document tagged with `instance_id`, if any.
    async fn find(&self, instance_id: &str) -> Result<Option<SnapshotDocument>>;

    /// Create a document for `instance_id` holding `raw`.
    async fn create(&self, instance_id: &str, raw: &str) -> Result<SnapshotDocument>;

    /// Overwrite the snapshot of an existing document.
    async fn write(&self, doc_id: &str, raw: &str) -> Result<()>;
}
