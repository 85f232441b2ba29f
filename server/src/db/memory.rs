//! In-process snapshot documents.
//!
//! Used when no database is configured, and by tests.

use super::{DocumentStore, SnapshotDocument};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Snapshot documents kept in a concurrent map, keyed by document id.
#[derive(Debug, Default)]
pub struct MemoryDocuments {
    documents: DashMap<String, (u64, SnapshotDocument)>,
    /// Creation counter, so `find` returns the oldest match
    created: AtomicU64,
}

impl MemoryDocuments {
    /// Create an empty document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document store wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn find(&self, instance_id: &str) -> Result<Option<SnapshotDocument>> {
        let document = self
            .documents
            .iter()
            .filter(|entry| entry.1.instance_id == instance_id)
            .min_by_key(|entry| entry.0)
            .map(|entry| entry.1.clone());

        Ok(document)
    }

    async fn create(&self, instance_id: &str, raw: &str) -> Result<SnapshotDocument> {
        let document = SnapshotDocument {
            doc_id: uuid::Uuid::new_v4().to_string(),
            instance_id: instance_id.to_string(),
            raw: raw.to_string(),
            updated_at: Utc::now(),
        };
        let order = self.created.fetch_add(1, Ordering::Relaxed);

        self.documents
            .insert(document.doc_id.clone(), (order, document.clone()));

        Ok(document)
    }

    async fn write(&self, doc_id: &str, raw: &str) -> Result<()> {
        let mut entry = self
            .documents
            .get_mut(doc_id)
            .ok_or_else(|| Error::DocumentNotFound(doc_id.to_string()))?;

        entry.1.raw = raw.to_string();
        entry.1.updated_at = Utc::now();

        Ok(())
    }
}
