//! Request authentication
//!
//! Tokens are issued by an external identity provider; this module only maps
//! a presented token to the identity it was configured for.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;

use crate::api::error::ApiError;
use crate::permissions::{Permission, Role};

/// Cookie carrying the token for browser page loads
pub const TOKEN_COOKIE: &str = "panel_token";

/// An authenticated user within a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub tenant: String,
    pub role: Role,
}

impl Identity {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.can(permission)
    }

    /// Fail with [`AuthError::Forbidden`] unless the role grants `permission`
    pub fn require(&self, permission: Permission) -> Result<(), AuthError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(permission))
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingToken,

    #[error("Invalid credentials")]
    InvalidToken,

    #[error("Permission denied: {0}")]
    Forbidden(Permission),

    #[error("Duplicate token for user {0}")]
    DuplicateToken(String),
}

/// Static token table
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    tokens: HashMap<String, Identity>,
}

impl Authenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token; reusing a token is an error
    pub fn add_token(&mut self, token: impl Into<String>, identity: Identity) -> Result<(), AuthError> {
        let token = token.into();
        if self.tokens.contains_key(&token) {
            return Err(AuthError::DuplicateToken(identity.user_id));
        }
        self.tokens.insert(token, identity);
        Ok(())
    }

    /// Builder-style variant of [`add_token`](Self::add_token) that replaces duplicates
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    pub fn authenticate(&self, token: &str) -> Option<&Identity> {
        self.tokens.get(token)
    }

    /// Resolve the identity behind a request's headers
    pub fn authenticate_parts(&self, parts: &Parts) -> Result<Identity, AuthError> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or(AuthError::MissingToken)?;
        self.authenticate(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

fn cookie_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == TOKEN_COOKIE).then_some(value)
        })
}

/// Extractor for handlers that require a signed-in user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Arc<Authenticator>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<Authenticator>::from_ref(state);
        Ok(CurrentUser(authenticator.authenticate_parts(parts)?))
    }
}

/// Extractor that never rejects; `None` means signed out
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<Authenticator>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<Authenticator>::from_ref(state);
        Ok(MaybeUser(authenticator.authenticate_parts(parts).ok()))
    }
}
