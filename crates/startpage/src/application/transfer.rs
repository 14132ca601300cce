//! TransferUseCase: export to and import from standalone JSON files.
//!
//! Export produces a pretty-printed v2 document named [`EXPORT_FILE_NAME`].
//! Import accepts every document shape the schema codec understands and
//! replaces the store wholesale; nothing is merged.

use serde::Serialize;
use startpage_core::{decode, encode_pretty, Configuration, SchemaError, SchemaShape};
use thiserror::Error;
use tracing::info;

use super::manage_store::ConfigStore;
use super::persistence::{KeyValueStore, PersistError};

/// Suggested file name for downloads.
pub const EXPORT_FILE_NAME: &str = "export.json";

/// Error type for import and export.
#[derive(Debug, Error)]
pub enum TransferError {
    /// No categories and default design: nothing worth exporting.
    #[error("no data to export found")]
    EmptyConfig,

    /// The configuration could not be encoded.
    #[error("export failed: {0}")]
    Serialize(#[source] SchemaError),

    /// The import file is not a configuration document.
    #[error("import file could not be read as a configuration: {0}")]
    Parse(#[source] SchemaError),

    /// A legacy category list with no entries; the store is left alone.
    #[error("import file contains no categories")]
    EmptyImport,

    /// The imported configuration replaced the store but could not be saved.
    #[error("imported configuration kept in memory but not saved: {0}")]
    WriteThrough(#[source] PersistError),
}

/// A file ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportBlob {
    pub file_name: String,
    pub contents: String,
}

/// What an import brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub shape: SchemaShape,
    pub categories: usize,
    pub urls: usize,
}

/// Serializes `config` into an export file.
///
/// # Errors
///
/// [`TransferError::EmptyConfig`] when [`Configuration::has_content`] is false.
pub fn export(config: &Configuration) -> Result<ExportBlob, TransferError> {
    if !config.has_content() {
        return Err(TransferError::EmptyConfig);
    }
    let contents = encode_pretty(config).map_err(TransferError::Serialize)?;
    info!(
        bytes = contents.len(),
        categories = config.categories.len(),
        "configuration exported"
    );
    Ok(ExportBlob {
        file_name: EXPORT_FILE_NAME.to_string(),
        contents,
    })
}

/// Parses `contents` and replaces the store's configuration with it.
///
/// A leading UTF-8 byte order mark is ignored.  Only an empty legacy list is
/// refused; an object document without categories, such as `{}`, is a valid
/// configuration and clears the store.
///
/// # Errors
///
/// - [`TransferError::Parse`] if `contents` is not a configuration document;
///   the store is unchanged.
/// - [`TransferError::EmptyImport`] for an empty legacy list; the store is
///   unchanged.
/// - [`TransferError::WriteThrough`] if the replaced configuration could not
///   be saved.
pub fn import<S: KeyValueStore>(
    store: &mut ConfigStore<S>,
    contents: &str,
) -> Result<ImportSummary, TransferError> {
    let decoded = decode(contents.trim_start_matches('\u{feff}')).map_err(TransferError::Parse)?;
    if decoded.shape == SchemaShape::LegacyList && decoded.config.categories.is_empty() {
        return Err(TransferError::EmptyImport);
    }

    let summary = ImportSummary {
        shape: decoded.shape,
        categories: decoded.config.categories.len(),
        urls: decoded.config.url_count(),
    };
    store
        .replace(decoded.config)
        .map_err(TransferError::WriteThrough)?;
    info!(
        shape = ?summary.shape,
        categories = summary.categories,
        urls = summary.urls,
        "configuration imported"
    );
    Ok(summary)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
