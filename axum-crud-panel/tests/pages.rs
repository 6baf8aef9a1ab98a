//! Server-rendered pages, embedded assets and mounting.

mod common;

use axum::http::{header, Method, StatusCode};
use common::*;
use serde_json::json;
use std::sync::Arc;

use axum_crud_panel::{Authenticator, CrudPanelLayer, Role};

#[tokio::test]
async fn landing_page_tracks_sign_in() {
    let panel = panel(MemoryDatabase::seeded(&[]));

    let anonymous = send(&panel.router, Method::GET, "/panel", None, None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    let html = anonymous.text();
    assert!(html.contains("<base href=\"/panel/\">"));
    assert!(html.contains("panel_token"));
    assert!(!html.contains("owner@example.com"));

    let signed_in = send(&panel.router, Method::GET, "/panel", Some(OWNER_TOKEN), None).await;
    let html = signed_in.text();
    assert!(html.contains("Email: owner@example.com"));
    assert!(html.contains("Role: OWNER"));
    assert!(!html.contains("panel_token"));
}

#[tokio::test]
async fn session_page_renders_the_table() {
    let panel = panel(MemoryDatabase::seeded(&["Ada", "Grace"]));
    let connection = register_connection(&panel).await;
    let (session, _) = open_session(&panel, &connection, OWNER_TOKEN).await;

    let response = send(
        &panel.router,
        Method::GET,
        &format!("/panel/sessions/{}", session),
        Some(OWNER_TOKEN),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-store");

    let html = response.text();
    assert!(html.contains(&format!("data-session=\"{}\"", session)));
    assert!(html.contains("data-api=\"/panel/api\""));
    assert!(html.contains("<td>ada@example.com</td>"));
    assert!(html.contains("New row"));
    assert!(html.contains(">Delete</button>"));
    assert!(html.contains("createRow"));
    assert!(html.contains("2 rows"));
}

#[tokio::test]
async fn session_page_hides_controls_from_viewers() {
    let panel = panel(MemoryDatabase::seeded(&["Ada"]));
    let connection = register_connection(&panel).await;
    let (session, _) = open_session(&panel, &connection, VIEWER_TOKEN).await;

    let response = send(
        &panel.router,
        Method::GET,
        &format!("/panel/sessions/{}", session),
        Some(VIEWER_TOKEN),
        None,
    )
    .await;
    let html = response.text();
    assert!(html.contains("<td>Ada</td>"));
    assert!(!html.contains("New row"));
    assert!(!html.contains(">Edit</button>"));
    assert!(!html.contains(">Delete</button>"));
}

#[tokio::test]
async fn session_page_shows_status_after_failure() {
    let panel = panel(MemoryDatabase::seeded(&["Ada"]));
    let connection = register_connection(&panel).await;
    let (session, _) = open_session(&panel, &connection, OWNER_TOKEN).await;

    send(
        &panel.router,
        Method::POST,
        &format!("/panel/api/sessions/{}/actions", session),
        Some(OWNER_TOKEN),
        Some(json!({ "name": "updateRow" })),
    )
    .await;

    let html = send(
        &panel.router,
        Method::GET,
        &format!("/panel/sessions/{}", session),
        Some(OWNER_TOKEN),
        None,
    )
    .await
    .text();
    assert!(html.contains("alert-error"));
    assert!(html.contains("No row is being edited"));
}

#[tokio::test]
async fn session_page_requires_sign_in() {
    let panel = panel(MemoryDatabase::seeded(&[]));
    let connection = register_connection(&panel).await;
    let (session, _) = open_session(&panel, &connection, OWNER_TOKEN).await;

    let response = send(
        &panel.router,
        Method::GET,
        &format!("/panel/sessions/{}", session),
        None,
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn assets_are_served_with_long_caching() {
    let panel = panel(MemoryDatabase::seeded(&[]));

    let script = send(&panel.router, Method::GET, "/panel/assets/panel.js", None, None).await;
    assert_eq!(script.status, StatusCode::OK);
    let content_type = script.headers[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.contains("javascript"), "{}", content_type);
    assert_eq!(
        script.headers[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );

    let style = send(&panel.router, Method::GET, "/panel/assets/panel.css", None, None).await;
    assert_eq!(style.headers[header::CONTENT_TYPE], "text/css");

    let missing = send(&panel.router, Method::GET, "/panel/assets/nope.js", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mounts_at_the_root_path() {
    let database = MemoryDatabase::seeded(&[]);
    let authenticator =
        Authenticator::new().with_token(OWNER_TOKEN, identity("owner", "acme", Role::Owner));
    let router = CrudPanelLayer::new("", Arc::new(MemoryConnector(database)), authenticator)
        .into_router();

    let api = send(&router, Method::GET, "/api/connections", Some(OWNER_TOKEN), None).await;
    assert_eq!(api.status, StatusCode::OK);

    let landing = send(&router, Method::GET, "/", None, None).await;
    assert_eq!(landing.status, StatusCode::OK);
    assert!(landing.text().contains("<base href=\"/\">"));
}
