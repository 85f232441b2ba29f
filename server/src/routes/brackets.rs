//! Bracket CRUD routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use brackets_engine::{BracketData, Record, RecordId, Selector, SnapshotMetadata};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::handlers::{
    handle_delete, handle_insert, handle_query, handle_select_one, handle_update, parse_table,
    DeleteResponse, InsertResponse, UpdateRequest, UpdateResponse,
};
use crate::store::BracketStore;
use crate::AppState;

/// Create bracket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/brackets/{instance}",
            get(export_handler).put(import_handler),
        )
        .route("/brackets/{instance}/reset", post(reset_handler))
        .route(
            "/brackets/{instance}/{table}",
            get(list_handler)
                .post(insert_handler)
                .patch(update_handler)
                .delete(clear_handler),
        )
        .route("/brackets/{instance}/{table}/query", post(query_handler))
        .route("/brackets/{instance}/{table}/delete", post(delete_where_handler))
        .route(
            "/brackets/{instance}/{table}/at/{position}",
            get(position_handler),
        )
        .route(
            "/brackets/{instance}/{table}/{id}",
            get(get_handler)
                .put(replace_handler)
                .delete(delete_id_handler),
        )
}

async fn open(state: &AppState, instance: &str) -> AppResult<Arc<BracketStore>> {
    Ok(state.registry.get_or_open(instance).await?)
}

/// GET /brackets/{instance} - Export the whole bracket.
async fn export_handler(
    State(state): State<AppState>,
    Path(instance): Path<String>,
) -> AppResult<Json<BracketData>> {
    let store = open(&state, &instance).await?;
    Ok(Json(store.export_state().await))
}

/// PUT /brackets/{instance} - Replace the whole bracket and mirror it.
async fn import_handler(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    Json(data): Json<BracketData>,
) -> AppResult<Json<SnapshotMetadata>> {
    let store = open(&state, &instance).await?;
    let metadata = SnapshotMetadata::from(&data);

    store.set_data(data).await;
    store.flush().await?;

    tracing::info!(instance_id = %instance, records = metadata.record_count, "Imported bracket");
    Ok(Json(metadata))
}

/// POST /brackets/{instance}/reset - Clear the in-memory bracket.
async fn reset_handler(
    State(state): State<AppState>,
    Path(instance): Path<String>,
) -> AppResult<StatusCode> {
    open(&state, &instance).await?.reset().await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /brackets/{instance}/{table} - Every record of a table.
async fn list_handler(
    State(state): State<AppState>,
    Path((instance, table)): Path<(String, String)>,
) -> AppResult<Json<Vec<Record>>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    Ok(Json(store.select(table, &Selector::All).await))
}

/// POST /brackets/{instance}/{table} - Insert a record or a batch.
async fn insert_handler(
    State(state): State<AppState>,
    Path((instance, table)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<InsertResponse>)> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    let response = handle_insert(&store, table, body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH /brackets/{instance}/{table} - Merge a patch into matching records.
async fn update_handler(
    State(state): State<AppState>,
    Path((instance, table)): Path<(String, String)>,
    Json(request): Json<UpdateRequest>,
) -> AppResult<Json<UpdateResponse>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    Ok(Json(handle_update(&store, table, request).await?))
}

/// DELETE /brackets/{instance}/{table} - Empty a table.
async fn clear_handler(
    State(state): State<AppState>,
    Path((instance, table)): Path<(String, String)>,
) -> AppResult<Json<DeleteResponse>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    Ok(Json(handle_delete(&store, table, Selector::All).await?))
}

/// POST /brackets/{instance}/{table}/query - Records matching a filter.
async fn query_handler(
    State(state): State<AppState>,
    Path((instance, table)): Path<(String, String)>,
    Json(filter): Json<Value>,
) -> AppResult<Json<Vec<Record>>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    Ok(Json(handle_query(&store, table, filter).await?))
}

/// POST /brackets/{instance}/{table}/delete - Delete records matching a filter.
async fn delete_where_handler(
    State(state): State<AppState>,
    Path((instance, table)): Path<(String, String)>,
    Json(filter): Json<Value>,
) -> AppResult<Json<DeleteResponse>> {
    let table = parse_table(&table)?;
    let selector = Selector::filter(filter)
        .ok_or_else(|| AppError::BadRequest("filter must be a JSON object".to_string()))?;
    let store = open(&state, &instance).await?;
    Ok(Json(handle_delete(&store, table, selector).await?))
}

/// GET /brackets/{instance}/{table}/at/{position} - Record at an array position.
async fn position_handler(
    State(state): State<AppState>,
    Path((instance, table, position)): Path<(String, String, usize)>,
) -> AppResult<Json<Record>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    Ok(Json(
        handle_select_one(&store, table, Selector::Position(position)).await?,
    ))
}

/// GET /brackets/{instance}/{table}/{id} - Record by id.
async fn get_handler(
    State(state): State<AppState>,
    Path((instance, table, id)): Path<(String, String, RecordId)>,
) -> AppResult<Json<Record>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    Ok(Json(handle_select_one(&store, table, Selector::Id(id)).await?))
}

/// PUT /brackets/{instance}/{table}/{id} - Replace a record.
async fn replace_handler(
    State(state): State<AppState>,
    Path((instance, table, id)): Path<(String, String, RecordId)>,
    Json(value): Json<Value>,
) -> AppResult<Json<UpdateResponse>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    let updated = store.update(table, &Selector::Id(id), value).await?;
    Ok(Json(UpdateResponse { updated }))
}

/// DELETE /brackets/{instance}/{table}/{id} - Delete a record.
async fn delete_id_handler(
    State(state): State<AppState>,
    Path((instance, table, id)): Path<(String, String, RecordId)>,
) -> AppResult<Json<DeleteResponse>> {
    let table = parse_table(&table)?;
    let store = open(&state, &instance).await?;
    Ok(Json(handle_delete(&store, table, Selector::Id(id)).await?))
}
