use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::api::{self, AppState, SharedState};
use crate::site_config::SiteConfig;

/// Configuration for the site server.
pub struct ServerConfig {
    pub site: SiteConfig,
    pub dev_mode: bool,
}

/// Build the full application router: pages, admin endpoints and images.
pub fn build_router(state: SharedState) -> Router {
    api::api_router(state.config.pages())
        .route("/images/{*path}", get(image_handler))
        .fallback(api::slug_page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve a file from `public/images`.
async fn image_handler(State(state): State<SharedState>, Path(path): Path<String>) -> Response {
    match state.store.read_public(&format!("images/{path}")).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "image lookup failed");
            (StatusCode::NOT_FOUND, "Image not found").into_response()
        }
    }
}

/// Start the site server and run until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let host = if config.dev_mode {
        "0.0.0.0".to_string()
    } else {
        config.site.host()
    };
    let addr = format!("{}:{}", host, config.site.port());

    let state = Arc::new(
        AppState::load(config.site)
            .await
            .context("Failed to load site")?,
    );

    let mut app = build_router(state);
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, "site running at http://{} (admin at /admin)", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
