//! Table listing, schema and generated UI endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::api::{connection_provider, error::ApiError};
use crate::auth::CurrentUser;
use crate::connections::ConnectionId;
use crate::permissions::Permission;
use crate::scaffold::scaffold_table_ui;
use crate::schema::{TableSchema, TablesResponse};
use crate::state::PanelState;
use crate::ui::element::UiTree;

/// Handler for GET /api/connections/{id}/tables
///
/// Returns a list of all tables in the database with row counts.
pub async fn list_tables_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<ConnectionId>,
) -> Result<Json<TablesResponse>, ApiError> {
    identity.require(Permission::Read)?;
    let provider = connection_provider(&state, &identity, id).await?;
    let tables = provider.list_tables().await?;
    Ok(Json(TablesResponse { tables }))
}

/// Handler for GET /api/connections/{id}/tables/{name}
///
/// Returns the schema information for a specific table including columns,
/// primary key and foreign keys.
pub async fn get_table_schema_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path((id, table_name)): Path<(ConnectionId, String)>,
) -> Result<Json<TableSchema>, ApiError> {
    identity.require(Permission::Read)?;
    let provider = connection_provider(&state, &identity, id).await?;
    let schema = provider.get_table_schema(&table_name).await?;
    Ok(Json(schema))
}

/// Handler for GET /api/connections/{id}/tables/{name}/ui
///
/// Returns the generated CRUD UI tree for the table. The tree reads the
/// document produced by `scaffold::initial_data`; sessions pair the two.
pub async fn get_table_ui_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path((id, table_name)): Path<(ConnectionId, String)>,
) -> Result<Json<UiTree>, ApiError> {
    identity.require(Permission::Read)?;
    let provider = connection_provider(&state, &identity, id).await?;
    let schema = provider.get_table_schema(&table_name).await?;
    Ok(Json(scaffold_table_ui(&schema)))
}
