//! Server-rendered pages and embedded asset serving
//!
//! Pages are produced by the UI renderer; the embedded script only posts
//! form values and actions back to the API and reloads.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use include_dir::{include_dir, Dir};
use serde_json::json;

use crate::api::error::ApiError;
use crate::auth::{CurrentUser, MaybeUser, TOKEN_COOKIE};
use crate::session::SessionId;
use crate::state::PanelState;
use crate::ui::element::{UiElement, UiTree, VisibilityCondition};
use crate::ui::node::escape;
use crate::ui::renderer::Renderer;

// Embed the assets directory at compile time
static ASSETS: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets");

/// Create a router for pages and assets
///
/// This returns a Router that serves:
/// - GET / -> landing page
/// - GET /sessions/{id} -> the session's rendered UI
/// - GET /assets/* -> static assets with long-term caching
pub fn create_frontend_router(state: PanelState) -> Router {
    // Axum 0.8 uses {*wildcard} syntax for wildcard captures
    Router::new()
        .route("/", get(serve_landing_page))
        .route("/sessions/{id}", get(serve_session_page))
        .route("/assets/{*path}", get(serve_static_asset))
        .with_state(state)
}

/// Wrap rendered content in a full document
///
/// The `<base href>` makes relative asset paths work at any mount point.
fn page(base_path: &str, title: &str, session: Option<SessionId>, content: &str) -> String {
    let session_attribute = session
        .map(|id| format!(" data-session=\"{}\"", id))
        .unwrap_or_default();
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <base href="{base}/">
    <title>{title}</title>
    <link rel="stylesheet" href="assets/panel.css">
</head>
<body data-api="{base}/api"{session_attribute}>
<main>{content}</main>
<script src="assets/panel.js"></script>
</body>
</html>
"#,
        base = escape(base_path),
        title = escape(title),
        session_attribute = session_attribute,
        content = content,
    )
}

fn landing_tree() -> UiTree {
    UiTree::Element(
        UiElement::new("Stack")
            .child(UiElement::new("Heading").prop("text", "CRUD panel").prop("level", 1))
            .child(
                UiElement::new("Alert")
                    .prop(
                        "message",
                        format!("Sign in by presenting a bearer token or the {} cookie.", TOKEN_COOKIE),
                    )
                    .visible(VisibilityCondition::signed_out()),
            )
            .child(
                UiElement::new("Card")
                    .prop("title", "Signed in")
                    .visible(VisibilityCondition::signed_in())
                    .child(UiElement::new("Text").prop("prefix", "Email: ").prop("path", "user.email"))
                    .child(UiElement::new("Text").prop("prefix", "Tenant: ").prop("path", "user.tenant"))
                    .child(UiElement::new("Text").prop("prefix", "Role: ").prop("path", "user.role")),
            ),
    )
}

/// Landing page; shows who is signed in
async fn serve_landing_page(State(state): State<PanelState>, MaybeUser(identity): MaybeUser) -> Html<String> {
    let data = json!({ "user": identity });
    let output = Renderer::new(&state.components)
        .authenticated(identity.is_some())
        .render(Some(&landing_tree()), &data);
    Html(page(&state.base_path, "CRUD panel", None, &output.to_html()))
}

/// Render a session's UI tree against its current data
///
/// Caching: none, the page reflects live session state
async fn serve_session_page(
    State(state): State<PanelState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<SessionId>,
) -> Result<Response, ApiError> {
    let session = state.sessions.get(&identity, id).await?;
    let data = session.store().snapshot();

    let output = Renderer::new(&state.components)
        .authenticated(true)
        .actions(session.action_handle())
        .render(Some(&session.tree), &data);

    let html = page(&state.base_path, &session.table, Some(id), &output.to_html());
    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Html(html),
    )
        .into_response())
}

/// Serve static assets with proper MIME types
///
/// Caching: max-age=31536000 (1 year) for static assets
async fn serve_static_asset(Path(path): Path<String>) -> Response {
    let Some(file) = ASSETS.get_file(&path) else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Asset not found: {}", path),
        )
            .into_response();
    };

    let mime_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        file.contents(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_assets() {
        assert!(ASSETS.get_file("panel.js").is_some());
        assert!(ASSETS.get_file("panel.css").is_some());
    }

    #[test]
    fn page_sets_base_and_session() {
        let id = uuid::Uuid::nil();
        let html = page("/panel", "users <x>", Some(id), "<p>hi</p>");
        assert!(html.contains("<base href=\"/panel/\">"));
        assert!(html.contains("<title>users &lt;x&gt;</title>"));
        assert!(html.contains(&format!("data-session=\"{}\"", id)));
        assert!(html.contains("data-api=\"/panel/api\""));
        assert!(html.contains("<main><p>hi</p></main>"));
    }
}
