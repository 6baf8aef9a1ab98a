//! UI session endpoints: open/close, data store access, actions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{connection_provider, error::ApiError};
use crate::auth::CurrentUser;
use crate::connections::ConnectionId;
use crate::permissions::Permission;
use crate::session::{SessionId, SessionInfo};
use crate::state::PanelState;
use crate::ui::action::Action;

/// Body of a create-session request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub connection_id: ConnectionId,
    pub table: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session: SessionInfo,
    pub data: Value,
}

/// Body of a batched data write
#[derive(Debug, Deserialize)]
pub struct DataPatch {
    /// Path -> value; applied as one update
    pub updates: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: Value,
}

/// Handler for POST /api/sessions
///
/// Loads the table's schema and first page, generates its UI tree and
/// returns the new session with its initial data document.
pub async fn create_session_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Json(request): Json<NewSession>,
) -> Result<Response, ApiError> {
    identity.require(Permission::Read)?;
    let provider = connection_provider(&state, &identity, request.connection_id).await?;
    let session = state
        .sessions
        .open(identity, request.connection_id, provider, &request.table)
        .await?;

    let body = SessionResponse {
        session: session.info(),
        data: Value::clone(&session.store().snapshot()),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Handler for DELETE /api/sessions/{id}
pub async fn close_session_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.sessions.close(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/sessions/{id}/data
pub async fn get_session_data_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<SessionId>,
) -> Result<Json<DataResponse>, ApiError> {
    let session = state.sessions.get(&identity, id).await?;
    Ok(Json(DataResponse {
        data: Value::clone(&session.store().snapshot()),
    }))
}

/// Handler for PUT /api/sessions/{id}/data
///
/// Replaces the whole document. A body that is not an object clears it.
pub async fn reset_session_data_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<SessionId>,
    Json(document): Json<Value>,
) -> Result<Json<DataResponse>, ApiError> {
    let session = state.sessions.get(&identity, id).await?;
    session.store().reset(Some(document));
    Ok(Json(DataResponse {
        data: Value::clone(&session.store().snapshot()),
    }))
}

/// Handler for PATCH /api/sessions/{id}/data
///
/// Request body:
/// ```json
/// { "updates": { "form.create.email": "ada@example.com", "form.create.name": "Ada" } }
/// ```
///
/// All paths are written as a single update.
pub async fn patch_session_data_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<SessionId>,
    Json(patch): Json<DataPatch>,
) -> Result<Json<DataResponse>, ApiError> {
    let session = state.sessions.get(&identity, id).await?;
    session.store().set_many(patch.updates);
    Ok(Json(DataResponse {
        data: Value::clone(&session.store().snapshot()),
    }))
}

/// Handler for POST /api/sessions/{id}/actions
///
/// Runs the action on the session's worker and returns the resulting
/// document. Failed actions also leave their message in `status.error`.
pub async fn submit_action_handler(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<SessionId>,
    Json(action): Json<Action>,
) -> Result<Json<DataResponse>, ApiError> {
    let session = state.sessions.get(&identity, id).await?;
    session.submit(action).await?;
    Ok(Json(DataResponse {
        data: Value::clone(&session.store().snapshot()),
    }))
}
