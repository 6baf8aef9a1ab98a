//! API error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::{debug, error};

use crate::actions::ActionError;
use crate::auth::AuthError;
use crate::connections::ConnectionError;
use crate::database::traits::DatabaseError;
use crate::session::SessionError;

/// Every failure a handler can return
///
/// Responses carry only `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

fn auth_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        AuthError::DuplicateToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn database_status(error: &DatabaseError) -> StatusCode {
    match error {
        DatabaseError::TableNotFound(_) | DatabaseError::RowNotFound(_) => StatusCode::NOT_FOUND,
        DatabaseError::InvalidColumn(_)
        | DatabaseError::InvalidKey(_)
        | DatabaseError::NoPrimaryKey(_)
        | DatabaseError::EmptyValues
        | DatabaseError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        DatabaseError::Timeout => StatusCode::REQUEST_TIMEOUT,
        DatabaseError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn connection_status(error: &ConnectionError) -> StatusCode {
    match error {
        ConnectionError::NotFound(_) => StatusCode::NOT_FOUND,
        ConnectionError::EmptyName => StatusCode::BAD_REQUEST,
        ConnectionError::DuplicateName(_) => StatusCode::CONFLICT,
        ConnectionError::Database(inner) => database_status(inner),
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(inner) => auth_status(inner),
            ApiError::Database(inner) => database_status(inner),
            ApiError::Connection(inner) => connection_status(inner),
            ApiError::Session(inner) => match inner {
                SessionError::NotFound(_) => StatusCode::NOT_FOUND,
                SessionError::Connection(inner) => connection_status(inner),
                SessionError::Database(inner) => database_status(inner),
            },
            ApiError::Action(inner) => match inner {
                ActionError::Unknown(_) | ActionError::Malformed(_) | ActionError::NotEditing => {
                    StatusCode::BAD_REQUEST
                }
                ActionError::Auth(inner) => auth_status(inner),
                ActionError::Database(inner) => database_status(inner),
                ActionError::SessionClosed => StatusCode::GONE,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        (
            status,
            Json(serde_json::json!({
                "error": self.to_string()
            })),
        )
            .into_response()
    }
}
