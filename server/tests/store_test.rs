//! Integration tests for snapshot mirroring.
//!
//! These run against in-process document stores; no database is needed.

use async_trait::async_trait;
use brackets_engine::{BracketData, Selector, Table};
use brackets_server::{
    BracketStore, DocumentStore, Error, MemoryDocuments, Result, SnapshotDocument, WriteMode,
};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wraps [`MemoryDocuments`] and fails writes while `failing` is set.
#[derive(Default)]
struct FlakyDocuments {
    inner: MemoryDocuments,
    failing: AtomicBool,
}

#[async_trait]
impl DocumentStore for FlakyDocuments {
    async fn find(&self, instance_id: &str) -> Result<Option<SnapshotDocument>> {
        self.inner.find(instance_id).await
    }

    async fn create(&self, instance_id: &str, raw: &str) -> Result<SnapshotDocument> {
        self.inner.create(instance_id, raw).await
    }

    async fn write(&self, doc_id: &str, raw: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::DocumentNotFound(doc_id.to_string()));
        }
        self.inner.write(doc_id, raw).await
    }
}

/// Wraps [`MemoryDocuments`] and holds the first write back for a while.
#[derive(Default)]
struct SlowFirstWrite {
    inner: Arc<MemoryDocuments>,
    writes: AtomicUsize,
}

#[async_trait]
impl DocumentStore for SlowFirstWrite {
    async fn find(&self, instance_id: &str) -> Result<Option<SnapshotDocument>> {
        self.inner.find(instance_id).await
    }

    async fn create(&self, instance_id: &str, raw: &str) -> Result<SnapshotDocument> {
        self.inner.create(instance_id, raw).await
    }

    async fn write(&self, doc_id: &str, raw: &str) -> Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.write(doc_id, raw).await
    }
}

async fn stored_data(documents: &MemoryDocuments, instance_id: &str) -> BracketData {
    let document = documents.find(instance_id).await.unwrap().unwrap();
    BracketData::from_json(&document.raw).unwrap()
}

async fn open(documents: &Arc<MemoryDocuments>, instance_id: &str) -> BracketStore {
    BracketStore::open(
        documents.clone(),
        Some(instance_id.to_string()),
        WriteMode::Awaited,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn open_creates_empty_document() {
    let documents = MemoryDocuments::new_shared();
    let store = open(&documents, "cup-2026").await;

    assert_eq!(store.instance_id(), Some("cup-2026"));
    assert_eq!(documents.len(), 1);
    assert!(stored_data(&documents, "cup-2026").await.is_empty());
}

#[tokio::test]
async fn every_mutation_is_mirrored() {
    let documents = MemoryDocuments::new_shared();
    let store = open(&documents, "cup").await;

    store
        .insert(Table::Participant, json!({"name": "A"}))
        .await
        .unwrap();
    store
        .insert(Table::Participant, json!({"name": "B"}))
        .await
        .unwrap();
    assert_eq!(stored_data(&documents, "cup").await.participant.len(), 2);

    store
        .delete(
            Table::Participant,
            &Selector::filter(json!({"id": 0})).unwrap(),
        )
        .await
        .unwrap();
    let data = stored_data(&documents, "cup").await;
    let values: Vec<_> = data.participant.iter().map(|r| r.to_value()).collect();
    assert_eq!(values, vec![json!({"id": 1, "name": "B"})]);

    store
        .update(
            Table::Participant,
            &Selector::Id(1),
            json!({"name": "B2"}),
        )
        .await
        .unwrap();
    assert_eq!(
        stored_data(&documents, "cup").await.participant[0].get("name"),
        Some(json!("B2"))
    );

    store.delete(Table::Participant, &Selector::All).await.unwrap();
    assert!(stored_data(&documents, "cup").await.is_empty());
}

#[tokio::test]
async fn reopen_hydrates_state() {
    let documents = MemoryDocuments::new_shared();
    {
        let store = open(&documents, "cup").await;
        store
            .insert_many(
                Table::Match,
                vec![
                    json!({"number": 1, "opponent1": {"score": 1}}),
                    json!({"number": 2, "opponent1": {"score": 0}}),
                ],
            )
            .await
            .unwrap();
    }

    let store = open(&documents, "cup").await;
    assert_eq!(documents.len(), 1);

    let matches = store.select(Table::Match, &Selector::All).await;
    assert_eq!(matches.len(), 2);

    let id = store.insert(Table::Match, json!({"number": 3})).await.unwrap();
    assert_eq!(id, 2);
}

#[tokio::test]
async fn instances_are_isolated() {
    let documents = MemoryDocuments::new_shared();
    let cup = open(&documents, "cup").await;
    let league = open(&documents, "league").await;

    cup.insert(Table::Stage, json!({"name": "Cup"})).await.unwrap();

    assert!(league.select(Table::Stage, &Selector::All).await.is_empty());
    assert!(stored_data(&documents, "league").await.is_empty());
}

#[tokio::test]
async fn reset_leaves_remote_untouched() {
    let documents = MemoryDocuments::new_shared();
    let store = open(&documents, "cup").await;
    store
        .insert(Table::Round, json!({"number": 1}))
        .await
        .unwrap();

    store.reset().await;

    assert!(store.export_state().await.is_empty());
    assert_eq!(stored_data(&documents, "cup").await.round.len(), 1);
}

#[tokio::test]
async fn set_data_is_mirrored_on_flush() {
    let documents = MemoryDocuments::new_shared();
    let store = open(&documents, "cup").await;

    let mut data = BracketData::new();
    data.stage.push(
        serde_json::from_value(json!({"id": 4, "name": "Imported"})).unwrap(),
    );

    store.set_data(data.clone()).await;
    assert!(stored_data(&documents, "cup").await.is_empty());

    store.flush().await.unwrap();
    assert_eq!(stored_data(&documents, "cup").await, data);
}

#[tokio::test]
async fn awaited_write_failure_reaches_caller() {
    let documents = Arc::new(FlakyDocuments::default());
    let store = BracketStore::open(
        documents.clone(),
        Some("cup".to_string()),
        WriteMode::Awaited,
    )
    .await
    .unwrap();

    documents.failing.store(true, Ordering::SeqCst);
    let result = store.insert(Table::Participant, json!({"name": "A"})).await;

    match result {
        Err(Error::Persistence { instance_id, .. }) => assert_eq!(instance_id, "cup"),
        other => panic!("expected persistence error, got {:?}", other),
    }

    // The in-memory mutation already happened
    assert_eq!(
        store.select(Table::Participant, &Selector::All).await.len(),
        1
    );
}

#[tokio::test]
async fn background_write_failure_is_not_observed() {
    let documents = Arc::new(FlakyDocuments::default());
    let store = BracketStore::open(
        documents.clone(),
        Some("cup".to_string()),
        WriteMode::Background,
    )
    .await
    .unwrap();

    documents.failing.store(true, Ordering::SeqCst);
    let id = store
        .insert(Table::Participant, json!({"name": "A"}))
        .await
        .unwrap();
    assert_eq!(id, 0);
}

#[tokio::test]
async fn background_write_lands_eventually() {
    let documents = MemoryDocuments::new_shared();
    let store = BracketStore::open(
        documents.clone(),
        Some("cup".to_string()),
        WriteMode::Background,
    )
    .await
    .unwrap();

    store
        .insert(Table::Participant, json!({"name": "A"}))
        .await
        .unwrap();

    let mut written = false;
    for _ in 0..50 {
        if stored_data(&documents, "cup").await.participant.len() == 1 {
            written = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(written);
}

#[tokio::test]
async fn background_writes_land_in_order() {
    let documents = Arc::new(SlowFirstWrite::default());
    let store = BracketStore::open(
        documents.clone(),
        Some("cup".to_string()),
        WriteMode::Background,
    )
    .await
    .unwrap();

    store
        .insert(Table::Participant, json!({"name": "A"}))
        .await
        .unwrap();
    store
        .insert(Table::Participant, json!({"name": "B"}))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(store.select(Table::Participant, &Selector::All).await.len(), 2);
    assert_eq!(
        stored_data(&documents.inner, "cup").await.participant.len(),
        2
    );
}

#[tokio::test]
async fn concurrent_inserts_get_distinct_ids() {
    let documents = MemoryDocuments::new_shared();
    let store = Arc::new(open(&documents, "cup").await);

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .insert(Table::MatchGame, json!({"number": i}))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort_unstable();

    assert_eq!(ids, (0..20).collect::<Vec<u64>>());
    assert_eq!(stored_data(&documents, "cup").await.match_game.len(), 20);
}

#[tokio::test]
async fn corrupt_snapshot_fails_open() {
    let documents = MemoryDocuments::new_shared();
    documents.create("cup", "{not json").await.unwrap();

    let result = BracketStore::open(
        documents.clone(),
        Some("cup".to_string()),
        WriteMode::Awaited,
    )
    .await;

    assert!(matches!(result, Err(Error::Engine(_))));
}
