//! Shared state behind every panel route

use axum::extract::FromRef;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::connections::ConnectionRegistry;
use crate::session::SessionRegistry;
use crate::ui::registry::ComponentRegistry;

#[derive(Clone)]
pub struct PanelState {
    pub base_path: Arc<String>,
    pub authenticator: Arc<Authenticator>,
    pub connections: Arc<ConnectionRegistry>,
    pub sessions: Arc<SessionRegistry>,
    pub components: Arc<ComponentRegistry>,
}

impl FromRef<PanelState> for Arc<Authenticator> {
    fn from_ref(state: &PanelState) -> Self {
        state.authenticator.clone()
    }
}
