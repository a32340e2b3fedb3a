//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Both paths are served by the same export handler
        .route("/gdrive/export", get(handlers::export_file))
        .route("/gdrive/exportFile", get(handlers::export_file))
        .route("/gdrive/folderList", get(handlers::list_folder))
        .route("/gdrive/exportFolder", get(handlers::export_folder))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
