//! Google Drive API client for metadata, folder listings and document exports.

use std::io;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, Response};
use tokio::io::AsyncWrite;
use tokio_util::io::StreamReader;

use crate::auth::Authenticator;
use crate::error::{DriveError, Result};
use crate::export::ExportFormat;
use crate::models::{ApiErrorResponse, ChildList, ChildReference, DocumentRef};

/// Base URL for Google Drive API v2.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v2";

/// Docs export feed. Takes `id` and `exportFormat` query parameters.
pub const EXPORT_BASE: &str = "https://docs.google.com/feeds/download/documents/export/Export";

/// Operations the export service needs from the document provider.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Fetch a file's metadata. `Ok(None)` when the provider returns no object.
    async fn get_metadata(&self, file_id: &str) -> Result<Option<DocumentRef>>;

    /// List the children of a folder. `Ok(None)` when the provider returns no listing.
    async fn list_children(&self, folder_id: &str) -> Result<Option<Vec<ChildReference>>>;

    /// Stream an export of `file_id` into `sink`, returning the bytes written.
    async fn download_export(
        &self,
        file_id: &str,
        format: ExportFormat,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;
}

/// Client for the Drive v2 REST API and the Docs export feed.
pub struct DriveClient {
    auth: Authenticator,
    http: Client,
    api_base: String,
    export_base: String,
}

impl DriveClient {
    /// Create a client talking to Google's production endpoints.
    pub fn new(auth: Authenticator) -> Self {
        Self::with_endpoints(auth, DRIVE_API_BASE, EXPORT_BASE)
    }

    /// Create a client with custom endpoints.
    ///
    /// # Arguments
    /// * `auth` - Authenticator for obtaining access tokens
    /// * `api_base` - Drive API root, without trailing slash
    /// * `export_base` - Full URL of the export endpoint
    pub fn with_endpoints(
        auth: Authenticator,
        api_base: impl Into<String>,
        export_base: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            export_base: export_base.into(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn export_base(&self) -> &str {
        &self.export_base
    }

    /// Fetch one page of a folder's children.
    async fn list_children_page(
        &self,
        token: &str,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<Option<ChildList>> {
        let mut request = self
            .http
            .get(format!("{}/files/{}/children", self.api_base, folder_id))
            .bearer_auth(token)
            .query(&[("supportsAllDrives", "true")]);

        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = check_status(request.send().await?).await?;
        parse_optional(response).await
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn get_metadata(&self, file_id: &str) -> Result<Option<DocumentRef>> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(&token)
            .query(&[
                ("supportsAllDrives", "true"),
                ("fields", "id,title,mimeType"),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        parse_optional(response).await
    }

    async fn list_children(&self, folder_id: &str) -> Result<Option<Vec<ChildReference>>> {
        let token = self.auth.get_access_token().await?;

        let Some(first) = self.list_children_page(&token, folder_id, None).await? else {
            return Ok(None);
        };

        let mut children = first.items;
        let mut page_token = first.next_page_token;

        while let Some(current) = page_token.take() {
            let Some(page) = self
                .list_children_page(&token, folder_id, Some(&current))
                .await?
            else {
                break;
            };
            children.extend(page.items);

            // A repeated token would request the same page forever.
            page_token = page.next_page_token.filter(|next| *next != current);
        }

        Ok(Some(children))
    }

    async fn download_export(
        &self,
        file_id: &str,
        format: ExportFormat,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(&self.export_base)
            .bearer_auth(&token)
            .query(&[("id", file_id), ("exportFormat", format.export_code())])
            .send()
            .await?;

        let response = check_status(response).await?;

        let stream = response.bytes_stream().map_err(io::Error::other);
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);
        let written = tokio::io::copy(&mut reader, sink).await?;

        Ok(written)
    }
}

/// Turn a non-success response into `DriveError::ApiError`.
///
/// The status comes from the Google error envelope when the body has one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
        return Err(DriveError::ApiError {
            status: api_error.error.code,
            message: api_error.error.message,
        });
    }
    Err(DriveError::ApiError {
        status: status.as_u16(),
        message: error_body,
    })
}

/// Parse a JSON body that may be empty or `null`.
async fn parse_optional<T: serde::de::DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let body = response.bytes().await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(serde_json::from_slice::<Option<T>>(&body)?)
}
