//! Async bracket store mirrored to a document database.
//!
//! [`BracketStore`] owns an engine [`Store`] behind an async mutex and pushes
//! a full snapshot of it to a [`DocumentStore`] after every mutation. All
//! callers are serialized on the mutex, so id assignment never races.
//!
//! In [`WriteMode::Background`] snapshots go to one writer task per store
//! through a `watch` channel. The writer always picks up the newest snapshot,
//! so an older one never lands after a newer one.

use crate::db::DocumentStore;
use crate::error::{Error, Result};
use brackets_engine::{BracketData, InstanceId, Record, RecordId, Selector, Store, Table};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// How mutations wait for the remote snapshot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Return after the write settles; failures reach the caller.
    #[default]
    Awaited,
    /// Hand the snapshot to a writer task and return immediately; failures
    /// are only logged.
    Background,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "awaited" | "await" => Ok(WriteMode::Awaited),
            "background" => Ok(WriteMode::Background),
            other => Err(format!("unknown write mode: {}", other)),
        }
    }
}

/// Where snapshots of this store go.
struct Mirror {
    documents: Arc<dyn DocumentStore>,
    instance_id: InstanceId,
    doc_id: String,
    /// Latest snapshot for the background writer
    pending: Option<watch::Sender<String>>,
}

impl Mirror {
    fn new(
        documents: Arc<dyn DocumentStore>,
        instance_id: InstanceId,
        doc_id: String,
        mode: WriteMode,
    ) -> Self {
        let pending = match mode {
            WriteMode::Awaited => None,
            WriteMode::Background => Some(spawn_writer(
                Arc::clone(&documents),
                instance_id.clone(),
                doc_id.clone(),
            )),
        };

        Self {
            documents,
            instance_id,
            doc_id,
            pending,
        }
    }
}

/// Start the writer task for one document.
///
/// Snapshots sent while a write is in flight collapse into the newest one.
/// The task drains the last snapshot and exits once the sender is dropped.
fn spawn_writer(
    documents: Arc<dyn DocumentStore>,
    instance_id: InstanceId,
    doc_id: String,
) -> watch::Sender<String> {
    let (tx, mut rx) = watch::channel(String::new());

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let raw = rx.borrow_and_update().clone();
            match documents.write(&doc_id, &raw).await {
                Ok(()) => tracing::debug!(
                    instance_id = %instance_id,
                    bytes = raw.len(),
                    "Snapshot written"
                ),
                Err(e) => tracing::warn!(
                    instance_id = %instance_id,
                    error = %e,
                    "Background snapshot write failed"
                ),
            }
        }
    });

    tx
}

/// A bracket store whose every mutation is mirrored remotely.
pub struct BracketStore {
    inner: Mutex<Store>,
    mirror: Option<Mirror>,
    mode: WriteMode,
}

impl std::fmt::Debug for BracketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BracketStore")
            .field("instance_id", &self.instance_id())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl BracketStore {
    /// A store that lives in memory only and never persists.
    pub fn detached() -> Self {
        Self {
            inner: Mutex::new(Store::new()),
            mirror: None,
            mode: WriteMode::Awaited,
        }
    }

    /// Open the store for `instance_id`.
    ///
    /// Loads the instance's snapshot when a document for it exists, and
    /// creates an empty document otherwise. Without an instance id the store
    /// is [detached](Self::detached).
    pub async fn open(
        documents: Arc<dyn DocumentStore>,
        instance_id: Option<InstanceId>,
        mode: WriteMode,
    ) -> Result<Self> {
        let Some(instance_id) = instance_id else {
            tracing::debug!("No instance id given, running without persistence");
            return Ok(Self {
                mode,
                ..Self::detached()
            });
        };

        let (store, doc_id) = match documents.find(&instance_id).await? {
            Some(document) => {
                let data = BracketData::from_json(&document.raw)?;
                tracing::info!(
                    instance_id = %instance_id,
                    doc_id = %document.doc_id,
                    records = data.record_count(),
                    "Hydrated bracket from snapshot"
                );
                (Store::from_data(data), document.doc_id)
            }
            None => {
                let store = Store::new();
                let document = documents.create(&instance_id, &store.to_json()?).await?;
                tracing::info!(
                    instance_id = %instance_id,
                    doc_id = %document.doc_id,
                    "Created snapshot document"
                );
                (store, document.doc_id)
            }
        };

        Ok(Self {
            inner: Mutex::new(store),
            mirror: Some(Mirror::new(documents, instance_id, doc_id, mode)),
            mode,
        })
    }

    /// The instance this store mirrors, if any.
    pub fn instance_id(&self) -> Option<&str> {
        self.mirror.as_ref().map(|m| m.instance_id.as_str())
    }

    /// Whether mutations are persisted.
    pub fn is_persistent(&self) -> bool {
        self.mirror.is_some()
    }

    /// Insert one record and return its id.
    pub async fn insert(&self, table: Table, value: Value) -> Result<RecordId> {
        let mut store = self.inner.lock().await;
        let id = store.insert(table, value)?;
        self.persist(&store).await?;
        Ok(id)
    }

    /// Insert several records with consecutive ids.
    pub async fn insert_many(&self, table: Table, values: Vec<Value>) -> Result<Vec<RecordId>> {
        let mut store = self.inner.lock().await;
        let ids = store.insert_many(table, values)?;
        self.persist(&store).await?;
        Ok(ids)
    }

    /// Copy out the records matched by `selector`.
    pub async fn select(&self, table: Table, selector: &Selector) -> Vec<Record> {
        self.inner.lock().await.select(table, selector)
    }

    /// Copy out the first record matched by `selector`.
    pub async fn select_one(&self, table: Table, selector: &Selector) -> Option<Record> {
        self.inner.lock().await.select_one(table, selector)
    }

    /// Update the matched records and return how many changed.
    pub async fn update(&self, table: Table, selector: &Selector, value: Value) -> Result<usize> {
        let mut store = self.inner.lock().await;
        let updated = store.update(table, selector, value)?;
        self.persist(&store).await?;
        Ok(updated)
    }

    /// Remove the matched records and return how many went.
    ///
    /// Clearing a whole table is mirrored like any other delete.
    pub async fn delete(&self, table: Table, selector: &Selector) -> Result<usize> {
        let mut store = self.inner.lock().await;
        let deleted = store.delete(table, selector)?;
        self.persist(&store).await?;
        Ok(deleted)
    }

    /// Empty every table in memory. The remote snapshot is left as is.
    pub async fn reset(&self) {
        self.inner.lock().await.reset();
    }

    /// Replace the whole in-memory state without writing it remotely.
    ///
    /// Call [`flush`](Self::flush) to mirror the imported data.
    pub async fn set_data(&self, data: BracketData) {
        self.inner.lock().await.set_data(data);
    }

    /// Copy of the current state.
    pub async fn export_state(&self) -> BracketData {
        self.inner.lock().await.export_state()
    }

    /// Push the current state to the remote document.
    pub async fn flush(&self) -> Result<()> {
        let store = self.inner.lock().await;
        self.persist(&store).await
    }

    /// Write the snapshot of `store`. Called with the store lock held.
    async fn persist(&self, store: &Store) -> Result<()> {
        let Some(mirror) = &self.mirror else {
            return Ok(());
        };

        let raw = store.to_json()?;

        match &mirror.pending {
            None => {
                mirror
                    .documents
                    .write(&mirror.doc_id, &raw)
                    .await
                    .map_err(|e| Error::Persistence {
                        instance_id: mirror.instance_id.clone(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(
                    instance_id = %mirror.instance_id,
                    bytes = raw.len(),
                    "Snapshot written"
                );
            }
            Some(pending) => {
                pending.send_replace(raw);
            }
        }

        Ok(())
    }
}
