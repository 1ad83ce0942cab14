// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// PDF text extraction
// Uploaded bytes are written to a scratch directory that is removed on return

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::errors::IngestError;

/// Extract raw text from a PDF, one entry per page
///
/// Parsing runs on the blocking pool. Panics inside the parser are
/// reported as `IngestError::PdfUnreadable`.
pub async fn extract_pages(filename: &str, bytes: &[u8]) -> Result<Vec<String>, IngestError> {
    let scratch = tempfile::tempdir()?;
    let path = scratch.path().join(scratch_file_name(filename));
    tokio::fs::write(&path, bytes).await?;

    let display_name = filename.to_string();
    let pages = tokio::task::spawn_blocking(move || extract_pages_from_path(&path))
        .await
        .map_err(|e| IngestError::PdfUnreadable {
            filename: display_name.clone(),
            reason: format!("extraction task failed: {}", e),
        })?
        .map_err(|reason| IngestError::PdfUnreadable {
            filename: display_name.clone(),
            reason,
        })?;

    debug!("Extracted {} pages from {}", pages.len(), filename);
    Ok(pages)
}

/// Extract page texts from a PDF on disk
pub fn extract_pages_from_path(path: &Path) -> Result<Vec<String>, String> {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic_payload) => {
            let message = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            warn!("PDF parser panicked on {}: {}", path.display(), message);
            Err(format!("parser panicked: {}", message))
        }
    }
}

/// File name used inside the scratch directory
///
/// Only the final path component of the upload name is kept.
fn scratch_file_name(filename: &str) -> PathBuf {
    Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("upload.pdf"))
}
