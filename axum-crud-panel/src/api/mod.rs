//! REST API endpoints
//!
//! This module contains all API endpoint handlers for the panel.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::Identity;
use crate::connections::ConnectionId;
use crate::database::traits::DatabaseProvider;
use crate::state::PanelState;

pub mod connections;
pub mod error;
pub mod render;
pub mod rows;
pub mod sessions;
pub mod tables;

pub use error::ApiError;

// Re-export handlers for convenience
pub use connections::{create_connection_handler, delete_connection_handler, list_connections_handler};
pub use render::render_handler;
pub use rows::{
    count_rows_handler, delete_row_handler, get_rows_handler, insert_row_handler,
    update_row_handler,
};
pub use sessions::{
    close_session_handler, create_session_handler, get_session_data_handler,
    patch_session_data_handler, reset_session_data_handler, submit_action_handler,
};
pub use tables::{get_table_schema_handler, get_table_ui_handler, list_tables_handler};

/// Create the API router with all endpoints
///
/// # Arguments
///
/// * `state` - Shared panel state
///
/// # Returns
///
/// An Axum Router configured with all API routes
pub fn create_api_router(state: PanelState) -> Router {
    // Axum 0.8 uses {param} syntax instead of :param
    Router::new()
        .route(
            "/connections",
            get(list_connections_handler).post(create_connection_handler),
        )
        .route(
            "/connections/{id}",
            axum::routing::delete(delete_connection_handler),
        )
        .route("/connections/{id}/tables", get(list_tables_handler))
        .route("/connections/{id}/tables/{name}", get(get_table_schema_handler))
        .route("/connections/{id}/tables/{name}/ui", get(get_table_ui_handler))
        .route(
            "/connections/{id}/tables/{name}/rows",
            get(get_rows_handler)
                .post(insert_row_handler)
                .patch(update_row_handler)
                .delete(delete_row_handler),
        )
        .route("/connections/{id}/tables/{name}/count", get(count_rows_handler))
        .route("/sessions", post(create_session_handler))
        .route(
            "/sessions/{id}",
            axum::routing::delete(close_session_handler),
        )
        .route(
            "/sessions/{id}/data",
            get(get_session_data_handler)
                .put(reset_session_data_handler)
                .patch(patch_session_data_handler),
        )
        .route("/sessions/{id}/actions", post(submit_action_handler))
        .route("/render", post(render_handler))
        .with_state(state)
}

/// Resolve a connection of the caller's tenant
pub(crate) async fn connection_provider(
    state: &PanelState,
    identity: &Identity,
    id: ConnectionId,
) -> Result<Arc<dyn DatabaseProvider>, ApiError> {
    Ok(state.connections.provider(&identity.tenant, id).await?)
}
