//! drive_export - Export Google Docs to local PDF or DOCX files.
//!
//! This library provides functionality to:
//! - Export a single document to PDF or DOCX in a local download folder
//! - List the children of a Drive folder
//! - Export every child of a folder to DOCX
//! - Serve the above over HTTP under `/gdrive`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use drive_export::{Authenticator, DriveClient, ExportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth = Authenticator::from_file("service-account.json")?;
//!     let service = ExportService::new(Arc::new(DriveClient::new(auth)), "/tmp");
//!
//!     let path = service.export_file("file-id", Some("application/pdf")).await?;
//!     println!("{}", path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod server;
pub mod service;
pub mod url_parser;

// Re-exports for convenience
pub use auth::Authenticator;
pub use client::{DriveApi, DriveClient};
pub use error::{DriveError, Result};
pub use export::ExportFormat;
pub use models::{ChildReference, DocumentRef, FolderExportReport};
pub use service::ExportService;
pub use url_parser::extract_id;
