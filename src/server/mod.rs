//! HTTP endpoints for exporting Drive documents.
//!
//! All routes live under `/gdrive`:
//! - `export` / `exportFile`: export one document, respond with its local path
//! - `folderList`: list a folder's children as JSON
//! - `exportFolder`: export every child of a folder as DOCX

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;

use crate::service::ExportService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: ExportService,
}

impl AppState {
    pub fn new(service: ExportService) -> Self {
        Self { service }
    }
}

/// Start the web server.
pub async fn serve(service: ExportService, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(AppState::new(service));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
