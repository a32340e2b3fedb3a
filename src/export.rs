//! Export format resolution and output file naming.

use std::path::{Path, PathBuf};

/// MIME type requesting a PDF export.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// MIME type requesting a word-processing (DOCX) export.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Formats the Docs export feed can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    Pdf,
    #[default]
    Docx,
}

impl ExportFormat {
    /// Resolve the export format from a requested MIME type.
    ///
    /// Only an exact match on `application/pdf` selects PDF. Anything else,
    /// including an empty or absent value, falls back to DOCX.
    pub fn from_mime_type(mime_type: Option<&str>) -> Self {
        match mime_type {
            Some(PDF_MIME_TYPE) => ExportFormat::Pdf,
            _ => ExportFormat::Docx,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => PDF_MIME_TYPE,
            ExportFormat::Docx => DOCX_MIME_TYPE,
        }
    }

    /// File extension, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => ".pdf",
            ExportFormat::Docx => ".docx",
        }
    }

    /// Value of the `exportFormat` query parameter.
    pub fn export_code(self) -> &'static str {
        &self.extension()[1..]
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.export_code())
    }
}

/// Turn a document title into a file stem that stays inside the download folder.
///
/// Surrounding whitespace is trimmed; internal whitespace is kept as is.
fn sanitize_title(title: &str, fallback: &str) -> String {
    let trimmed = title.trim();
    let stem = if trimmed.is_empty() { fallback } else { trimmed };
    stem.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Compute `<download_folder>/<sanitized title><extension>`.
///
/// `file_id` names the file when the title is blank.
pub fn target_path(
    download_folder: &Path,
    title: &str,
    file_id: &str,
    format: ExportFormat,
) -> PathBuf {
    let mut name = sanitize_title(title, file_id);
    name.push_str(format.extension());
    download_folder.join(name)
}
