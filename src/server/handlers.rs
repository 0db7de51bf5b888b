//! HTTP handlers for record collections

use super::params::{ListParams, stats_request};
use super::registry::CollectionRegistry;
use crate::config::PaginationConfig;
use crate::core::error::{RecordError, RecordbookError};
use crate::core::query::PaginatedResponse;
use crate::core::record::Record;
use crate::core::schema::SchemaSummary;
use crate::core::stats::GroupStats;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Shared state for the record handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CollectionRegistry>,
    pub pagination: PaginationConfig,
}

type Pairs = Query<Vec<(String, String)>>;

fn parse_id(raw: &str) -> Result<Uuid, RecordbookError> {
    Uuid::parse_str(raw).map_err(|_| {
        RecordError::InvalidId {
            value: raw.to_string(),
        }
        .into()
    })
}

/// List a collection: filter, search, sort and paginate
///
/// GET /api/{collection}
pub async fn list_records(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(pairs): Pairs,
) -> Result<Json<PaginatedResponse<Record>>, RecordbookError> {
    let service = state.registry.get(&collection)?;
    let query = ListParams::from_pairs(pairs)?.to_descriptor(service.schema(), &state.pagination)?;

    let result = service.query(&query).await?;
    debug!(
        %collection,
        page = result.page,
        total_matched = result.total_matched,
        "listed records"
    );

    Ok(Json(result.into()))
}

/// Get one record
///
/// GET /api/{collection}/{id}
pub async fn get_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Record>, RecordbookError> {
    let service = state.registry.get(&collection)?;
    let id = parse_id(&id)?;

    let record = service.get(&id).await?.ok_or_else(|| RecordError::NotFound {
        collection: service.schema().singular().to_string(),
        id,
    })?;

    Ok(Json(record))
}

/// Create a record
///
/// POST /api/{collection}
pub async fn create_record(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Record>), RecordbookError> {
    let service = state.registry.get(&collection)?;
    let record = service.create(payload).await?;

    info!(%collection, id = ?record.id(), "record created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// Partially update a record
///
/// PUT /api/{collection}/{id}
pub async fn update_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(changes): Json<Value>,
) -> Result<Json<Record>, RecordbookError> {
    let service = state.registry.get(&collection)?;
    let id = parse_id(&id)?;
    let record = service.update(&id, changes).await?;

    info!(%collection, %id, "record updated");
    Ok(Json(record))
}

/// Delete a record
///
/// DELETE /api/{collection}/{id}
pub async fn delete_record(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, RecordbookError> {
    let service = state.registry.get(&collection)?;
    let id = parse_id(&id)?;
    service.delete(&id).await?;

    info!(%collection, %id, "record deleted");
    Ok(Json(json!({
        "message": format!("{} deleted successfully", service.schema().singular()),
        "id": id.to_string()
    })))
}

/// Grouped aggregates
///
/// GET /api/{collection}/stats?group_by=..&average=..&flag=..
pub async fn record_stats(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<GroupStats>>, RecordbookError> {
    let service = state.registry.get(&collection)?;
    let request = stats_request(service.schema(), pairs)?;

    Ok(Json(service.stats(&request).await?))
}

#[derive(Debug, Serialize)]
pub struct CollectionInfo {
    #[serde(flatten)]
    pub schema: SchemaSummary,
    pub count: usize,
}

/// Describe every registered collection
///
/// GET /api/collections
pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionInfo>>, RecordbookError> {
    let mut collections = Vec::with_capacity(state.registry.len());
    for service in state.registry.services() {
        collections.push(CollectionInfo {
            schema: service.schema().summary(),
            count: service.count().await?,
        });
    }
    Ok(Json(collections))
}

/// Health check endpoint handler
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "recordbook"
    }))
}
