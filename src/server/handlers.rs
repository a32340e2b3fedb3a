//! Request handlers for the `/gdrive` endpoints.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::error::DriveError;
use crate::models::ChildReference;

/// Query params for the export endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub file_id: String,
    /// Requested MIME type; anything other than `application/pdf` exports DOCX.
    pub mime_type: Option<String>,
}

/// Query params for the folder endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderQuery {
    pub folder_id: String,
}

impl IntoResponse for DriveError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

/// Export one document and respond with the local path it was written to.
pub async fn export_file(
    State(state): State<AppState>,
    Query(params): Query<ExportQuery>,
) -> Result<String, DriveError> {
    let path = state
        .service
        .export_file(&params.file_id, params.mime_type.as_deref())
        .await?;
    Ok(path.display().to_string())
}

/// List the children of a folder.
pub async fn list_folder(
    State(state): State<AppState>,
    Query(params): Query<FolderQuery>,
) -> Result<Json<Vec<ChildReference>>, DriveError> {
    let children = state.service.list_folder(&params.folder_id).await?;
    Ok(Json(children))
}

/// Export every child of a folder as DOCX.
pub async fn export_folder(
    State(state): State<AppState>,
    Query(params): Query<FolderQuery>,
) -> Result<String, DriveError> {
    let report = state.service.export_folder(&params.folder_id).await?;
    Ok(report.to_string())
}
