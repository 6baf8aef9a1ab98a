//! Stateless rendering endpoint

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::MaybeUser;
use crate::state::PanelState;
use crate::ui::element::UiTree;
use crate::ui::renderer::{RenderDiagnostic, Renderer};

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Tree to render; absent or null renders nothing
    #[serde(default)]
    pub tree: Option<UiTree>,

    /// Data document the tree reads from
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub html: String,
    pub diagnostics: Vec<RenderDiagnostic>,
}

/// Handler for POST /api/render
///
/// Renders an arbitrary tree with the registered components. Requests
/// without valid credentials render as signed out.
///
/// Request body:
/// ```json
/// {
///   "tree": { "type": "Text", "props": { "path": "greeting" } },
///   "data": { "greeting": "hello" }
/// }
/// ```
pub async fn render_handler(
    State(state): State<PanelState>,
    MaybeUser(identity): MaybeUser,
    Json(request): Json<RenderRequest>,
) -> Json<RenderResponse> {
    let output = Renderer::new(&state.components)
        .authenticated(identity.is_some())
        .render(request.tree.as_ref(), &request.data);

    Json(RenderResponse {
        html: output.to_html(),
        diagnostics: output.diagnostics,
    })
}
