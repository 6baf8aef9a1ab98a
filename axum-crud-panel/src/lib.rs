//! # axum-crud-panel
//!
//! A multi-tenant CRUD admin panel for SQL tables, mountable as an Axum layer.
//!
//! ## Features
//!
//! - Dynamic schema discovery and generated create/edit/delete UI per table
//! - Declarative UI trees (JSON component descriptors) rendered on the server
//! - Visibility conditions over a path-addressed, copy-on-write data store
//! - Token authentication with role-based permissions
//! - Connections and UI sessions isolated per tenant
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use axum_crud_panel::{Authenticator, CrudPanelLayer, Identity, Role};
//!
//! #[tokio::main]
//! async fn main() {
//!     let authenticator = Authenticator::new().with_token(
//!         "secret",
//!         Identity {
//!             user_id: "u1".into(),
//!             email: "ada@example.com".into(),
//!             tenant: "acme".into(),
//!             role: Role::Owner,
//!         },
//!     );
//!
//!     let app = Router::new()
//!         .route("/", get(|| async { "Hello, World!" }))
//!         .merge(CrudPanelLayer::postgres("/panel", authenticator).into_router());
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod actions;
pub mod api;
pub mod auth;
pub mod connections;
pub mod database;
pub mod frontend;
pub mod layer;
pub mod permissions;
pub mod scaffold;
pub mod schema;
pub mod session;
pub mod state;
pub mod ui;

// Public exports
pub use auth::{AuthError, Authenticator, Identity};
pub use connections::{ConnectionId, ConnectionRegistry, NewConnection};
pub use layer::CrudPanelLayer;
pub use permissions::{Permission, Role};
pub use schema::{ColumnInfo, ForeignKey, TableSchema};
pub use session::{SessionId, SessionRegistry};
pub use state::PanelState;

// Re-export database providers
pub use database::traits::{Connector, DatabaseError, DatabaseProvider};

#[cfg(feature = "postgres")]
pub use database::postgres::{PostgresConnector, PostgresProvider};
