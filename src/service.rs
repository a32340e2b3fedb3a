//! Export orchestration: metadata lookup, download into the local folder,
//! folder listing and folder batch export.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::client::DriveApi;
use crate::error::{DriveError, Result};
use crate::export::{target_path, ExportFormat};
use crate::models::{format_size, ChildExport, ChildReference, ExportOutcome, FolderExportReport};
use crate::url_parser::extract_id;

/// Exports Drive documents into a local download folder.
#[derive(Clone)]
pub struct ExportService {
    drive: Arc<dyn DriveApi>,
    download_folder: PathBuf,
}

impl ExportService {
    pub fn new(drive: Arc<dyn DriveApi>, download_folder: impl Into<PathBuf>) -> Self {
        Self {
            drive,
            download_folder: download_folder.into(),
        }
    }

    pub fn download_folder(&self) -> &Path {
        &self.download_folder
    }

    /// Export a file in the format selected by `mime_type` and return the written path.
    ///
    /// `mime_type` falls back to DOCX when absent or not `application/pdf`.
    pub async fn export_file(&self, file_id: &str, mime_type: Option<&str>) -> Result<PathBuf> {
        self.export_as(file_id, ExportFormat::from_mime_type(mime_type))
            .await
    }

    /// Export a file in an already resolved format.
    pub async fn export_as(&self, file_id: &str, format: ExportFormat) -> Result<PathBuf> {
        let file_id = extract_id(file_id)?;
        info!(file_id = %file_id, format = %format, "exporting file");

        let document = self
            .drive
            .get_metadata(&file_id)
            .await?
            .ok_or_else(|| DriveError::NotFound(file_id.clone()))?;

        let path = target_path(&self.download_folder, &document.title, &file_id, format);
        let written = self.download_to(&file_id, format, &path).await?;

        info!(
            file_id = %file_id,
            source_type = document.mime_type.as_deref().unwrap_or("-"),
            export_type = format.mime_type(),
            path = %path.display(),
            size = %format_size(written),
            "export complete"
        );
        Ok(path)
    }

    /// Stream the export into a temporary file next to `path`, then rename it into place.
    ///
    /// The temporary file is removed on every error path.
    async fn download_to(&self, file_id: &str, format: ExportFormat, path: &Path) -> Result<u64> {
        let folder = self.download_folder.clone();
        let (std_file, temp_path) = tokio::task::spawn_blocking(move || create_part_file(&folder))
            .await
            .map_err(io::Error::other)??
            .into_parts();

        let written = {
            let mut file = File::from_std(std_file);
            let written = self
                .drive
                .download_export(file_id, format, &mut file)
                .await?;
            file.flush().await?;
            file.sync_all().await?;
            written
        };

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || temp_path.persist(target))
            .await
            .map_err(io::Error::other)?
            .map_err(|e| e.error)?;
        Ok(written)
    }

    /// List the children of a folder in provider order.
    pub async fn list_folder(&self, folder_id: &str) -> Result<Vec<ChildReference>> {
        let folder_id = extract_id(folder_id)?;

        let children = self
            .drive
            .list_children(&folder_id)
            .await?
            .ok_or_else(|| DriveError::NotFound(folder_id.clone()))?;

        debug!(folder_id = %folder_id, count = children.len(), "listed folder");
        Ok(children)
    }

    /// Export every child of a folder as DOCX, one after another.
    ///
    /// A failing child is recorded in the report and the batch continues.
    /// Only a failure to list the folder is returned as an error.
    pub async fn export_folder(&self, folder_id: &str) -> Result<FolderExportReport> {
        let folder_id = extract_id(folder_id)?;
        let children = self.list_folder(&folder_id).await?;
        info!(folder_id = %folder_id, count = children.len(), "exporting folder");

        let mut report = FolderExportReport {
            folder_id,
            children: Vec::with_capacity(children.len()),
        };

        for child in children {
            let outcome = match self.export_as(&child.id, ExportFormat::Docx).await {
                Ok(path) => ExportOutcome::Exported(path),
                Err(e) => {
                    warn!(file_id = %child.id, error = %e, "failed to export folder child");
                    ExportOutcome::Failed(e.to_string())
                }
            };
            report.children.push(ChildExport {
                id: child.id,
                outcome,
            });
        }

        info!(
            folder_id = %report.folder_id,
            total = report.total(),
            succeeded = report.succeeded(),
            "folder export finished"
        );
        Ok(report)
    }
}

/// Create the hidden temporary file an export is streamed into.
///
/// Its mode matches a plain `File::create` (0666 less the umask) so the
/// renamed export is as readable as any other file in the folder.
fn create_part_file(folder: &Path) -> io::Result<tempfile::NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".export-").suffix(".part");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    builder.tempfile_in(folder)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::tempdir;
    use tokio::io::AsyncWrite;

    use crate::export::PDF_MIME_TYPE;
    use crate::models::DocumentRef;

    /// In-memory provider. Files without content fail their export with 500.
    #[derive(Default)]
    struct FakeDrive {
        titles: HashMap<String, String>,
        contents: HashMap<String, Vec<u8>>,
        children: HashMap<String, Vec<String>>,
        metadata_error: Option<u16>,
        download_delay: HashMap<String, Duration>,
        exports: Mutex<Vec<(String, ExportFormat)>>,
    }

    impl FakeDrive {
        fn with_file(mut self, id: &str, title: &str, content: &[u8]) -> Self {
            self.titles.insert(id.to_string(), title.to_string());
            self.contents.insert(id.to_string(), content.to_vec());
            self
        }

        fn with_folder(mut self, id: &str, children: &[&str]) -> Self {
            self.children
                .insert(id.to_string(), children.iter().map(|c| c.to_string()).collect());
            self
        }

        fn exports(&self) -> Vec<(String, ExportFormat)> {
            self.exports.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DriveApi for FakeDrive {
        async fn get_metadata(&self, file_id: &str) -> Result<Option<DocumentRef>> {
            if let Some(status) = self.metadata_error {
                return Err(DriveError::ApiError {
                    status,
                    message: "provider refused".to_string(),
                });
            }
            Ok(self.titles.get(file_id).map(|title| DocumentRef {
                id: file_id.to_string(),
                title: title.clone(),
                mime_type: Some("application/vnd.google-apps.document".to_string()),
            }))
        }

        async fn list_children(&self, folder_id: &str) -> Result<Option<Vec<ChildReference>>> {
            Ok(self.children.get(folder_id).map(|ids| {
                ids.iter()
                    .map(|id| ChildReference {
                        id: id.clone(),
                        self_link: None,
                        child_link: None,
                    })
                    .collect()
            }))
        }

        async fn download_export(
            &self,
            file_id: &str,
            format: ExportFormat,
            sink: &mut (dyn AsyncWrite + Unpin + Send),
        ) -> Result<u64> {
            self.exports
                .lock()
                .unwrap()
                .push((file_id.to_string(), format));

            let content = self.contents.get(file_id).ok_or(DriveError::ApiError {
                status: 500,
                message: "export failed".to_string(),
            })?;

            // Write in two halves so concurrent exports can interleave.
            let (head, tail) = content.split_at(content.len() / 2);
            sink.write_all(head).await?;
            if let Some(delay) = self.download_delay.get(file_id) {
                tokio::time::sleep(*delay).await;
            }
            sink.write_all(tail).await?;
            Ok(content.len() as u64)
        }
    }

    fn service(drive: FakeDrive, folder: &Path) -> (ExportService, Arc<FakeDrive>) {
        let drive = Arc::new(drive);
        (ExportService::new(drive.clone(), folder), drive)
    }

    fn temp_files(folder: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(folder)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "part"))
            .collect()
    }

    #[tokio::test]
    async fn test_export_pdf_writes_trimmed_title() {
        let dir = tempdir().unwrap();
        let (svc, drive) = service(
            FakeDrive::default().with_file("doc1", " My Report ", b"%PDF-1.7"),
            dir.path(),
        );

        let path = svc.export_file("doc1", Some(PDF_MIME_TYPE)).await.unwrap();

        assert_eq!(path, dir.path().join("My Report.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert_eq!(drive.exports(), vec![("doc1".to_string(), ExportFormat::Pdf)]);
    }

    #[tokio::test]
    async fn test_export_defaults_to_docx() {
        let dir = tempdir().unwrap();
        let (svc, drive) = service(
            FakeDrive::default().with_file("doc1", "Notes", b"PK"),
            dir.path(),
        );

        let path = svc.export_file("doc1", None).await.unwrap();
        assert_eq!(path, dir.path().join("Notes.docx"));

        let path = svc.export_file("doc1", Some("image/png")).await.unwrap();
        assert_eq!(path, dir.path().join("Notes.docx"));
        assert!(drive.exports().iter().all(|(_, f)| *f == ExportFormat::Docx));
    }

    #[tokio::test]
    async fn test_missing_metadata_is_not_found() {
        let dir = tempdir().unwrap();
        let (svc, drive) = service(FakeDrive::default(), dir.path());

        let err = svc.export_file("missing", None).await.unwrap_err();

        assert!(matches!(err, DriveError::NotFound(ref id) if id == "missing"));
        assert!(drive.exports().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_provider_status_propagates() {
        let dir = tempdir().unwrap();
        let drive = FakeDrive {
            metadata_error: Some(403),
            ..FakeDrive::default()
        };
        let (svc, _) = service(drive, dir.path());

        let err = svc.export_file("doc1", None).await.unwrap_err();

        assert!(matches!(err, DriveError::ApiError { status: 403, .. }));
        assert_eq!(err.status_code().as_u16(), 403);
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected_before_lookup() {
        let dir = tempdir().unwrap();
        let (svc, _) = service(FakeDrive::default(), dir.path());

        let err = svc.export_file("a&b", None).await.unwrap_err();
        assert!(matches!(err, DriveError::InvalidUrlOrId(_)));
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_files() {
        let dir = tempdir().unwrap();
        let mut drive = FakeDrive::default();
        drive.titles.insert("doc1".to_string(), "Broken".to_string());
        let (svc, _) = service(drive, dir.path());

        let err = svc.export_file("doc1", None).await.unwrap_err();

        assert!(matches!(err, DriveError::ApiError { status: 500, .. }));
        assert!(!dir.path().join("Broken.docx").exists());
        assert!(temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_missing_download_folder_is_io_error() {
        let dir = tempdir().unwrap();
        let (svc, _) = service(
            FakeDrive::default().with_file("doc1", "Notes", b"PK"),
            &dir.path().join("does-not-exist"),
        );

        let err = svc.export_file("doc1", None).await.unwrap_err();
        assert!(matches!(err, DriveError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exported_file_mode_matches_plain_create() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let (svc, _) = service(
            FakeDrive::default().with_file("doc1", "Shared Notes", b"PK"),
            dir.path(),
        );

        let path = svc.export_file("doc1", None).await.unwrap();
        let plain = dir.path().join("plain.txt");
        std::fs::File::create(&plain).unwrap();

        let exported_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let plain_mode = std::fs::metadata(&plain).unwrap().permissions().mode() & 0o777;
        assert_eq!(exported_mode, plain_mode);
    }

    #[tokio::test]
    async fn test_list_folder() {
        let dir = tempdir().unwrap();
        let (svc, _) = service(
            FakeDrive::default().with_folder("folder1", &["a", "b"]),
            dir.path(),
        );

        let children = svc.list_folder("folder1").await.unwrap();
        let ids: Vec<_> = children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let err = svc.list_folder("nope").await.unwrap_err();
        assert!(matches!(err, DriveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_export_folder_exports_each_child_in_order() {
        let dir = tempdir().unwrap();
        let drive = FakeDrive::default()
            .with_folder("folder1", &["c1", "c2", "c3"])
            .with_file("c1", "One", b"1")
            .with_file("c2", "Two", b"2")
            .with_file("c3", "Three", b"3");
        let (svc, drive) = service(drive, dir.path());

        let report = svc.export_folder("folder1").await.unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.to_string(), "Exported 3 of 3 documents");
        assert_eq!(
            drive.exports(),
            vec![
                ("c1".to_string(), ExportFormat::Docx),
                ("c2".to_string(), ExportFormat::Docx),
                ("c3".to_string(), ExportFormat::Docx),
            ]
        );
        assert!(dir.path().join("Two.docx").exists());
    }

    #[tokio::test]
    async fn test_export_folder_continues_past_failures() {
        let dir = tempdir().unwrap();
        let mut drive = FakeDrive::default()
            .with_folder("folder1", &["c1", "c2", "c3"])
            .with_file("c1", "One", b"1")
            .with_file("c3", "Three", b"3");
        drive.titles.insert("c2".to_string(), "Two".to_string());
        let (svc, drive) = service(drive, dir.path());

        let report = svc.export_folder("folder1").await.unwrap();

        assert_eq!(drive.exports().len(), 3);
        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        let failed: Vec<_> = report.failed().map(|c| c.id.as_str()).collect();
        assert_eq!(failed, vec!["c2"]);
        assert!(dir.path().join("Three.docx").exists());
    }

    #[tokio::test]
    async fn test_concurrent_exports_to_same_title_last_write_wins() {
        let dir = tempdir().unwrap();
        let first = vec![b'a'; 64 * 1024];
        let second = vec![b'b'; 64 * 1024];
        let mut drive = FakeDrive::default()
            .with_file("slow", "Shared", &first)
            .with_file("fast", "Shared", &second);
        drive
            .download_delay
            .insert("slow".to_string(), Duration::from_millis(50));
        let (svc, _) = service(drive, dir.path());

        let (slow, fast) = tokio::join!(
            svc.export_file("slow", None),
            svc.export_file("fast", None)
        );
        assert_eq!(slow.unwrap(), fast.unwrap());

        let content = std::fs::read(dir.path().join("Shared.docx")).unwrap();
        assert_eq!(content, first);
        assert!(temp_files(dir.path()).is_empty());
    }
}
