//! Data models for Google Drive API responses and export reports.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata for a Drive document, as returned by the v2 `files.get` endpoint.
///
/// The title names the exported file; the source MIME type is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// A single entry of a folder's children listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_link: Option<String>,
}

impl std::fmt::Display for ChildReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}",
            self.id,
            self.child_link.as_deref().unwrap_or("-")
        )
    }
}

/// Response from the v2 `children.list` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildList {
    #[serde(default)]
    pub items: Vec<ChildReference>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// What happened to one child during a folder export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum ExportOutcome {
    Exported(PathBuf),
    Failed(String),
}

/// Per-child result of a folder export.
#[derive(Debug, Clone, Serialize)]
pub struct ChildExport {
    pub id: String,
    pub outcome: ExportOutcome,
}

/// Result of exporting every child of a folder, in listing order.
#[derive(Debug, Clone, Serialize)]
pub struct FolderExportReport {
    pub folder_id: String,
    pub children: Vec<ChildExport>,
}

impl FolderExportReport {
    /// Number of children listed in the folder.
    pub fn total(&self) -> usize {
        self.children.len()
    }

    /// Number of children that were exported successfully.
    pub fn succeeded(&self) -> usize {
        self.children
            .iter()
            .filter(|c| matches!(c.outcome, ExportOutcome::Exported(_)))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ChildExport> {
        self.children
            .iter()
            .filter(|c| matches!(c.outcome, ExportOutcome::Failed(_)))
    }
}

impl std::fmt::Display for FolderExportReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Exported {} of {} documents",
            self.succeeded(),
            self.total()
        )
    }
}

/// Google API error response.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: u16,
    pub message: String,
}

/// Service account credentials from JSON file.
#[derive(Debug, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: Option<String>,
}

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}
