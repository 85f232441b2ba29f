//! Open bracket stores, one per instance.

use crate::db::DocumentStore;
use crate::error::Result;
use crate::store::{BracketStore, WriteMode};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lazily opens and caches a [`BracketStore`] per instance id.
///
/// Opened stores stay cached for the life of the process. Handing out a
/// single store per instance is what keeps two writers off one document.
///
/// Thread-safe and can be shared across handlers via `Arc`.
pub struct Registry {
    documents: Arc<dyn DocumentStore>,
    mode: WriteMode,
    stores: DashMap<String, Arc<BracketStore>>,
    /// Per-instance locks held while opening, so one instance never gets
    /// two documents
    opening: DashMap<String, Arc<Mutex<()>>>,
}

impl Registry {
    /// Create a registry backed by `documents`.
    pub fn new(documents: Arc<dyn DocumentStore>, mode: WriteMode) -> Self {
        Self {
            documents,
            mode,
            stores: DashMap::new(),
            opening: DashMap::new(),
        }
    }

    /// Create a registry wrapped in Arc for sharing.
    pub fn new_shared(documents: Arc<dyn DocumentStore>, mode: WriteMode) -> Arc<Self> {
        Arc::new(Self::new(documents, mode))
    }

    /// The store for `instance_id`, opening it on first use.
    pub async fn get_or_open(&self, instance_id: &str) -> Result<Arc<BracketStore>> {
        if let Some(store) = self.stores.get(instance_id) {
            return Ok(store.value().clone());
        }

        let lock = self
            .opening
            .entry(instance_id.to_string())
            .or_default()
            .clone();
        let _opening = lock.lock().await;
        if let Some(store) = self.stores.get(instance_id) {
            return Ok(store.value().clone());
        }

        let store = Arc::new(
            BracketStore::open(
                Arc::clone(&self.documents),
                Some(instance_id.to_string()),
                self.mode,
            )
            .await?,
        );
        self.stores.insert(instance_id.to_string(), Arc::clone(&store));
        self.opening.remove(instance_id);

        tracing::debug!(instance_id = %instance_id, open = self.stores.len(), "Store ready");

        Ok(store)
    }

    /// Number of open stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// True when no store is open.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryDocuments, SnapshotDocument};
    use async_trait::async_trait;
    use brackets_engine::{Selector, Table};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn same_instance_shares_store() {
        let registry = Registry::new(MemoryDocuments::new_shared(), WriteMode::Awaited);

        let a = registry.get_or_open("cup").await.unwrap();
        let b = registry.get_or_open("cup").await.unwrap();
        let other = registry.get_or_open("league").await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(registry.len(), 2);
    }

    /// Documents whose lookup for one instance stalls.
    struct StalledFind {
        inner: MemoryDocuments,
        stalled: &'static str,
    }

    #[async_trait]
    impl DocumentStore for StalledFind {
        async fn find(&self, instance_id: &str) -> Result<Option<SnapshotDocument>> {
            if instance_id == self.stalled {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.inner.find(instance_id).await
        }

        async fn create(&self, instance_id: &str, raw: &str) -> Result<SnapshotDocument> {
            self.inner.create(instance_id, raw).await
        }

        async fn write(&self, doc_id: &str, raw: &str) -> Result<()> {
            self.inner.write(doc_id, raw).await
        }
    }

    #[tokio::test]
    async fn slow_open_does_not_block_other_instances() {
        let documents = Arc::new(StalledFind {
            inner: MemoryDocuments::new(),
            stalled: "slow",
        });
        let registry = Registry::new_shared(documents, WriteMode::Awaited);

        let slow = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_or_open("slow").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = tokio::time::timeout(Duration::from_secs(1), registry.get_or_open("fast"))
            .await
            .expect("opening another instance should not wait")
            .unwrap();
        fast.insert(Table::Participant, json!({"name": "A"}))
            .await
            .unwrap();

        assert_eq!(registry.len(), 1);
        slow.abort();
    }

    #[tokio::test]
    async fn concurrent_first_opens_share_one_document() {
        let documents = MemoryDocuments::new_shared();
        let registry = Registry::new_shared(documents.clone(), WriteMode::Awaited);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get_or_open("cup").await.unwrap() })
            })
            .collect();

        let mut stores = Vec::new();
        for task in tasks {
            stores.push(task.await.unwrap());
        }

        assert!(stores.iter().all(|s| Arc::ptr_eq(s, &stores[0])));
        assert_eq!(documents.len(), 1);
        assert_eq!(
            stores[0].select(Table::Participant, &Selector::All).await.len(),
            0
        );
    }
}
