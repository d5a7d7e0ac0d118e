use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/ingest", post(handlers::ingest))
        .route("/api/select-articles", post(handlers::select_articles))
        .route("/api/selected", get(handlers::selected))
        .route("/api/digest", get(handlers::digest))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Serve the app until the process is stopped.
pub async fn serve(state: AppState, bind: &str) -> sn_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("🌐 Listening on {}", bind);
    axum::serve(listener, create_app(state)).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use sn_core::{Article, Error, Result};
}
