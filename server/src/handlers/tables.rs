//! Table handlers - CRUD requests against one bracket instance.

use crate::error::{AppError, AppResult};
use crate::store::BracketStore;
use brackets_engine::{Filter, Record, RecordId, Selector, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response for an insert.
///
/// `id` is set for a single record, `ids` for a batch.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<RecordId>>,
}

/// Request body for a filtered merge update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    /// Records to update
    pub filter: Filter,
    /// Fields to merge into each match
    pub patch: Value,
}

/// Response for an update.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    /// Number of records changed
    pub updated: usize,
}

/// Response for a delete.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    /// Number of records removed
    pub deleted: usize,
}

/// Parse a table name from the path.
pub fn parse_table(name: &str) -> AppResult<Table> {
    Ok(name.parse::<Table>()?)
}

/// Insert one record (object body) or a batch (array body).
pub async fn handle_insert(
    store: &BracketStore,
    table: Table,
    body: Value,
) -> AppResult<InsertResponse> {
    match body {
        Value::Array(values) => {
            let ids = store.insert_many(table, values).await?;
            tracing::debug!(table = %table, count = ids.len(), "Inserted records");
            Ok(InsertResponse {
                id: None,
                ids: Some(ids),
            })
        }
        value => {
            let id = store.insert(table, value).await?;
            tracing::debug!(table = %table, id, "Inserted record");
            Ok(InsertResponse {
                id: Some(id),
                ids: None,
            })
        }
    }
}

/// Select a single record, or fail with not found.
pub async fn handle_select_one(
    store: &BracketStore,
    table: Table,
    selector: Selector,
) -> AppResult<Record> {
    store
        .select_one(table, &selector)
        .await
        .ok_or_else(|| AppError::NotFound(format!("{} in table '{}'", selector, table)))
}

/// Select every record matching `filter`.
pub async fn handle_query(
    store: &BracketStore,
    table: Table,
    filter: Value,
) -> AppResult<Vec<Record>> {
    let selector = Selector::filter(filter)
        .ok_or_else(|| AppError::BadRequest("filter must be a JSON object".to_string()))?;
    Ok(store.select(table, &selector).await)
}

/// Merge `patch` into every record matching `filter`.
pub async fn handle_update(
    store: &BracketStore,
    table: Table,
    request: UpdateRequest,
) -> AppResult<UpdateResponse> {
    let updated = store
        .update(table, &Selector::Filter(request.filter), request.patch)
        .await?;
    Ok(UpdateResponse { updated })
}

/// Delete the records matched by `selector`.
pub async fn handle_delete(
    store: &BracketStore,
    table: Table,
    selector: Selector,
) -> AppResult<DeleteResponse> {
    let deleted = store.delete(table, &selector).await?;
    tracing::debug!(table = %table, selector = %selector, deleted, "Deleted records");
    Ok(DeleteResponse { deleted })
}
