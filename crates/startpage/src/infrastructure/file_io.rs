//! File adapters for import and export.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::application::transfer::ExportBlob;
use crate::application::workflow::FileReader;

/// Reads import files with `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileReader;

#[async_trait]
impl FileReader for TokioFileReader {
    async fn read_text(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// Writes `blob` to `target`.
///
/// A directory target receives the blob under its suggested file name
/// (`export.json`); any other path is used as-is.  Returns the path written.
///
/// # Errors
///
/// Any I/O error from creating the file.
pub async fn write_export(blob: &ExportBlob, target: &Path) -> io::Result<PathBuf> {
    let path = if tokio::fs::metadata(target)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        target.join(&blob.file_name)
    } else {
        target.to_path_buf()
    };
    tokio::fs::write(&path, blob.contents.as_bytes()).await?;
    info!(path = %path.display(), bytes = blob.contents.len(), "export written");
    Ok(path)
}
