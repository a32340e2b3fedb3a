//! Command-line and environment configuration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::auth::Authenticator;
use crate::client::{DriveClient, DRIVE_API_BASE, EXPORT_BASE};
use crate::error::{DriveError, Result};
use crate::service::ExportService;

/// Options shared by every command that talks to Google Drive.
#[derive(Debug, Clone, Args)]
pub struct DriveArgs {
    /// Path to service account JSON credentials file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Pre-issued OAuth access token, used when no credentials file is given.
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Local folder exported documents are written to.
    #[arg(long, env = "DOWNLOAD_FOLDER", default_value = "/tmp")]
    pub download_folder: PathBuf,

    /// Drive API v2 base URL.
    #[arg(long, env = "DRIVE_API_BASE", default_value = DRIVE_API_BASE)]
    pub api_base: String,

    /// Docs export endpoint.
    #[arg(long, env = "DRIVE_EXPORT_BASE", default_value = EXPORT_BASE)]
    pub export_base: String,
}

impl DriveArgs {
    /// Build the authenticator. A credentials file takes precedence over a raw token.
    pub fn authenticator(&self) -> Result<Authenticator> {
        match (&self.credentials, &self.access_token) {
            (Some(path), _) => Authenticator::from_file(path),
            (None, Some(token)) => Ok(Authenticator::from_access_token(token.clone())),
            (None, None) => Err(DriveError::AuthenticationError(
                "set --credentials or --access-token".to_string(),
            )),
        }
    }

    /// Build the export service, creating the download folder if needed.
    pub fn export_service(&self) -> Result<ExportService> {
        std::fs::create_dir_all(&self.download_folder)?;

        let client = DriveClient::with_endpoints(
            self.authenticator()?,
            self.api_base.clone(),
            self.export_base.clone(),
        );
        tracing::debug!(
            api_base = client.api_base(),
            export_base = client.export_base(),
            download_folder = %self.download_folder.display(),
            "configured Drive client"
        );

        Ok(ExportService::new(Arc::new(client), self.download_folder.clone()))
    }
}
