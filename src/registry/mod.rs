use log::info;
use std::path::Path;
use thiserror::Error;

use crate::api::{ ApiError, BackendApi };
use crate::models::DocumentInfo;
use crate::store::ChatStore;

/// Extensions accepted for ingestion.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".pdf", ".txt", ".md"];

/// Maximum upload size: 50 MB.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type '{extension}'. Use: .pdf, .txt, .md")] UnsupportedType {
        extension: String,
    },
    #[error("File too large ({size} bytes, max 50MB)")] TooLarge {
        size: u64,
    },
    #[error("Cannot read file: {0}")] Io(#[from] std::io::Error),
    #[error(transparent)] Api(#[from] ApiError),
}

/// Client-side validation gate. Runs before any bytes leave the machine.
pub fn validate_upload(filename: &str, size: u64) -> Result<(), UploadError> {
    let extension = filename
        .rfind('.')
        .map(|i| filename[i..].to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedType { extension });
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size });
    }
    Ok(())
}

/// Replace the local registry with the backend's current listing.
pub async fn refresh(backend: &dyn BackendApi, store: &mut ChatStore) -> Result<usize, ApiError> {
    let documents = backend.list_documents().await?;
    let count = documents.len();
    store.set_documents(documents);
    Ok(count)
}

/// Validate, read and upload one file. The local registry is updated
/// only after the backend confirms the ingestion.
pub async fn upload(
    backend: &dyn BackendApi,
    store: &mut ChatStore,
    path: &Path,
    subject: &str
) -> Result<DocumentInfo, UploadError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = std::fs::metadata(path)?.len();
    validate_upload(&filename, size)?;

    info!("Vectorizing & indexing {}...", filename);
    let bytes = std::fs::read(path)?;
    let document = backend.upload_document(&filename, bytes, subject).await?;
    store.add_document(document.clone());
    Ok(document)
}

/// Delete one document. The local registry is updated only after the
/// backend confirms. Interactive confirmation is the caller's job.
pub async fn delete(
    backend: &dyn BackendApi,
    store: &mut ChatStore,
    doc_id: &str
) -> Result<(), ApiError> {
    backend.delete_document(doc_id).await?;
    store.remove_document(doc_id);
    info!("Document {} purged", doc_id);
    Ok(())
}
