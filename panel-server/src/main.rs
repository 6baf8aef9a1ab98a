use axum::{http::StatusCode, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use axum_crud_panel::{Authenticator, CrudPanelLayer, NewConnection, PostgresConnector};

mod config;

use config::PanelConfig;

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn build_authenticator(config: &PanelConfig) -> Result<Authenticator, String> {
    let mut authenticator = Authenticator::new();
    for user in &config.users {
        authenticator
            .add_token(user.token.clone(), user.identity())
            .map_err(|e| e.to_string())?;
    }
    Ok(authenticator)
}

async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Server is healthy")
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Parse before tracing so the log format comes from the config
    let config = PanelConfig::load().map_err(|e| e.to_string())?;
    init_tracing(config.log.json);

    let authenticator = build_authenticator(&config)?;
    let panel = CrudPanelLayer::new(
        config.server.base_path.clone(),
        Arc::new(PostgresConnector::default()),
        authenticator,
    )
    .page_size(config.panel.page_size)
    .session_limits(
        Duration::from_secs(config.panel.session_idle_secs),
        config.panel.max_sessions_per_user,
    );

    for connection in &config.connections {
        let request = NewConnection {
            name: connection.name.clone(),
            url: connection.url.clone(),
        };
        match panel
            .state()
            .connections
            .register_for(&connection.tenant, "config", request)
            .await
        {
            Ok(summary) => info!(
                tenant = %connection.tenant,
                connection = %summary.id,
                name = %summary.name,
                "registered configured connection"
            ),
            Err(e) => warn!(
                tenant = %connection.tenant,
                name = %connection.name,
                error = %e,
                "failed to register configured connection"
            ),
        }
    }

    // Abandoned sessions are also dropped whenever the registry is used
    let sessions = panel.state().sessions.clone();
    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(Duration::from_secs(60));
        loop {
            sweep.tick().await;
            sessions.expire().await;
        }
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .merge(panel.into_router());

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", config.server.bind))?;

    info!(
        bind = %config.server.bind,
        base_path = %config.server.base_path,
        users = config.users.len(),
        "panel server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "server failed");
            format!("server failed: {e}")
        })
}
