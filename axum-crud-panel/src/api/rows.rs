//! Row endpoints: paginated reads and single-row mutations

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::info;

use crate::api::{connection_provider, error::ApiError};
use crate::auth::CurrentUser;
use crate::connections::ConnectionId;
use crate::permissions::Permission;
use crate::schema::{
    CountResponse, DeleteRowRequest, InsertRowRequest, MutationResponse, RowQuery, RowsResponse,
    UpdateRowRequest, MAX_LIMIT,
};
use crate::state::PanelState;

/// Handler for GET /api/connections/{id}/tables/{name}/rows
///
/// Fetches rows from a table with pagination, sorting, and filtering.
///
/// Query parameters:
/// - offset: Starting row offset (default: 0)
/// - limit: Maximum rows to return (default: 100, max: 500)
/// - sortBy: Column name to sort by (optional)
/// - sortOrder: "ascending" or "descending" (optional, default: "ascending")
pub async fn get_rows_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path((id, table_name)): Path<(ConnectionId, String)>,
    Query(mut query): Query<RowQuery>,
) -> Result<Json<RowsResponse>, ApiError> {
    identity.require(Permission::Read)?;

    // Enforce maximum limit
    query.limit = query.limit.min(MAX_LIMIT);

    let provider = connection_provider(&state, &identity, id).await?;
    Ok(Json(provider.get_rows(&table_name, query).await?))
}

/// Handler for GET /api/connections/{id}/tables/{name}/count
///
/// Returns the total row count for a table.
pub async fn count_rows_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path((id, table_name)): Path<(ConnectionId, String)>,
    Query(query): Query<RowQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    identity.require(Permission::Read)?;
    let provider = connection_provider(&state, &identity, id).await?;
    Ok(Json(provider.count_rows(&table_name, &query).await?))
}

/// Handler for POST /api/connections/{id}/tables/{name}/rows
///
/// Request body:
/// ```json
/// { "values": { "name": "Ada", "email": "ada@example.com" } }
/// ```
///
/// Responds with `201 Created` and the inserted row.
pub async fn insert_row_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path((id, table_name)): Path<(ConnectionId, String)>,
    Json(request): Json<InsertRowRequest>,
) -> Result<Response, ApiError> {
    identity.require(Permission::Create)?;
    let provider = connection_provider(&state, &identity, id).await?;
    let row = provider.insert_row(&table_name, &request.values).await?;
    info!(table = %table_name, user = %identity.user_id, "row inserted");
    Ok((StatusCode::CREATED, Json(MutationResponse { row })).into_response())
}

/// Handler for PATCH /api/connections/{id}/tables/{name}/rows
///
/// Request body:
/// ```json
/// { "key": { "id": 7 }, "values": { "email": "new@example.com" } }
/// ```
pub async fn update_row_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path((id, table_name)): Path<(ConnectionId, String)>,
    Json(request): Json<UpdateRowRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    identity.require(Permission::Update)?;
    let provider = connection_provider(&state, &identity, id).await?;
    let row = provider
        .update_row(&table_name, &request.key, &request.values)
        .await?;
    info!(table = %table_name, user = %identity.user_id, "row updated");
    Ok(Json(MutationResponse { row }))
}

/// Handler for DELETE /api/connections/{id}/tables/{name}/rows
///
/// Request body:
/// ```json
/// { "key": { "id": 7 } }
/// ```
///
/// Responds with the deleted row.
pub async fn delete_row_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path((id, table_name)): Path<(ConnectionId, String)>,
    Json(request): Json<DeleteRowRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    identity.require(Permission::Delete)?;
    let provider = connection_provider(&state, &identity, id).await?;
    let row = provider.delete_row(&table_name, &request.key).await?;
    info!(table = %table_name, user = %identity.user_id, "row deleted");
    Ok(Json(MutationResponse { row }))
}
