//! CrudPanelLayer - Main Axum integration layer
//!
//! This module provides the main entry point for mounting the panel into an
//! Axum application.

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::create_api_router;
use crate::auth::Authenticator;
use crate::connections::ConnectionRegistry;
use crate::database::traits::Connector;
use crate::frontend::create_frontend_router;
use crate::session::{SessionRegistry, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS_PER_USER};
use crate::state::PanelState;
use crate::ui::registry::ComponentRegistry;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresConnector;

/// Rows loaded per page by table sessions unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Main layer for mounting the CRUD panel into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use axum_crud_panel::{Authenticator, CrudPanelLayer, Identity, Role};
///
/// # async fn example() {
/// let authenticator = Authenticator::new().with_token(
///     "secret",
///     Identity {
///         user_id: "u1".into(),
///         email: "ada@example.com".into(),
///         tenant: "acme".into(),
///         role: Role::Admin,
///     },
/// );
/// let panel = CrudPanelLayer::postgres("/panel", authenticator);
/// let app: Router = Router::new().merge(panel.into_router());
/// # }
/// ```
pub struct CrudPanelLayer {
    base_path: String,
    page_size: u64,
    idle_timeout: Duration,
    max_sessions_per_user: usize,
    state: PanelState,
}

impl CrudPanelLayer {
    /// Create a new panel at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the panel will be mounted (e.g., "/panel")
    /// * `connector` - Opens providers for registered connection URLs
    /// * `authenticator` - Maps bearer tokens to identities
    pub fn new(
        base_path: impl Into<String>,
        connector: Arc<dyn Connector>,
        authenticator: Authenticator,
    ) -> Self {
        let base_path = base_path.into().trim_end_matches('/').to_string();
        let state = PanelState {
            base_path: Arc::new(base_path.clone()),
            authenticator: Arc::new(authenticator),
            connections: Arc::new(ConnectionRegistry::new(connector)),
            sessions: Arc::new(SessionRegistry::new(DEFAULT_PAGE_SIZE)),
            components: Arc::new(ComponentRegistry::standard()),
        };
        Self {
            base_path,
            page_size: DEFAULT_PAGE_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_sessions_per_user: DEFAULT_MAX_SESSIONS_PER_USER,
            state,
        }
    }

    /// Rows per page for table sessions
    ///
    /// Call before any session is opened; sessions opened earlier are dropped.
    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self.rebuild_sessions();
        self
    }

    /// Idle expiry and per-user cap for table sessions
    ///
    /// Call before any session is opened; sessions opened earlier are dropped.
    pub fn session_limits(mut self, idle_timeout: Duration, max_per_user: usize) -> Self {
        self.idle_timeout = idle_timeout;
        self.max_sessions_per_user = max_per_user;
        self.rebuild_sessions();
        self
    }

    fn rebuild_sessions(&mut self) {
        self.state.sessions = Arc::new(
            SessionRegistry::new(self.page_size)
                .with_limits(self.idle_timeout, self.max_sessions_per_user),
        );
    }

    /// Replace the component registry used by every page and render request
    pub fn components(mut self, components: ComponentRegistry) -> Self {
        self.state.components = Arc::new(components);
        self
    }

    /// Shared state, e.g. to register connections before serving
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router includes:
    /// - Pages and assets at `{base_path}/`
    /// - API endpoints at `{base_path}/api/*`
    /// - Request tracing and permissive CORS
    pub fn into_router(self) -> Router {
        let api_router = create_api_router(self.state.clone());
        let frontend_router = create_frontend_router(self.state);

        // Router::nest panics on an empty or "/" prefix
        let router = if self.base_path.is_empty() {
            Router::new()
                .nest("/api", api_router)
                .merge(frontend_router)
        } else {
            Router::new()
                .nest(&format!("{}/api", self.base_path), api_router)
                .nest(&self.base_path, frontend_router)
        };

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    }
}

#[cfg(feature = "postgres")]
impl CrudPanelLayer {
    /// Create a new panel whose connections are PostgreSQL URLs
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the panel will be mounted
    /// * `authenticator` - Maps bearer tokens to identities
    pub fn postgres(base_path: impl Into<String>, authenticator: Authenticator) -> Self {
        Self::new(base_path, Arc::new(PostgresConnector::default()), authenticator)
    }
}
