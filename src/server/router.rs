//! Route table for the REST API

use super::handlers::{
    AppState, create_record, delete_record, get_record, health_check, list_collections,
    list_records, record_stats, update_record,
};
use axum::{Router, routing::get};

/// Build the record routes
///
/// These routes are generic and work for every registered collection:
/// - GET /health - Health check
/// - GET /api/collections - Describe registered collections
/// - GET /api/{collection} - List with filters, search, sort and pagination
/// - POST /api/{collection} - Create a record
/// - GET /api/{collection}/stats - Grouped aggregates
/// - GET /api/{collection}/{id} - Get a record
/// - PUT /api/{collection}/{id} - Partially update a record
/// - DELETE /api/{collection}/{id} - Delete a record
pub fn build_record_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/collections", get(list_collections))
        .route(
            "/api/{collection}",
            get(list_records).post(create_record),
        )
        .route("/api/{collection}/stats", get(record_stats))
        .route(
            "/api/{collection}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(state)
}
