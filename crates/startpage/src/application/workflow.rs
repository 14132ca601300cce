//! Dialog-driven workflows.
//!
//! Each user action that needs input (a name, a URL, a confirmation, a file)
//! is modelled as a request to a [`Prompter`], awaited until the user answers
//! or cancels, followed by a synchronous call into the [`ConfigStore`].
//!
//! ```text
//! delete_category(id)
//!   ├─ resolve id          → NotFound before asking anything
//!   ├─ prompter.confirm()  → suspended until the user answers
//!   │     └─ false         → Flow::Cancelled, store untouched
//!   └─ store.delete_category(id)
//! ```
//!
//! A cancelled dialog is not an error: the workflow returns
//! [`Flow::Cancelled`] and nothing changes.  Callers are expected to run one
//! workflow at a time; `AppState` holds its store lock for the whole flow.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use startpage_core::{Category, CategoryId, ConfigError, Resolution, UrlEntry, UrlId};
use thiserror::Error;

use super::manage_store::{ConfigStore, StoreError};
use super::persistence::KeyValueStore;
use super::transfer::{self, ImportSummary, TransferError};

/// The name/URL pair collected by the "Add URL" dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlForm {
    pub name: String,
    pub url: String,
}

/// A destructive action awaiting the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DeleteCategory {
        id: CategoryId,
        name: String,
        urls: usize,
    },
    RemoveUrl {
        category_id: CategoryId,
        url_id: UrlId,
        name: String,
    },
}

/// The presentation layer's side of every dialog.
///
/// Implementations render the request however they like and resolve once the
/// user has answered.  `None` / `false` mean the dialog was dismissed.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks for the name of a new category.
    async fn category_name(&self) -> Option<String>;

    /// Asks for the name and URL of a new link.
    async fn url_entry(&self) -> Option<UrlForm>;

    /// Asks the user to confirm a destructive action.
    async fn confirm(&self, request: &Confirmation) -> bool;

    /// Asks the user to pick a file to import.
    async fn import_file(&self) -> Option<PathBuf>;
}

/// Reads the full text of a user-selected file.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read_text(&self, path: &Path) -> io::Result<String>;
}

/// Result of a workflow that may be cancelled by the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Flow<T> {
    Completed(T),
    Cancelled,
}

impl<T> Flow<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Flow::Cancelled)
    }
}

/// Error type for workflows.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<ConfigError> for WorkflowError {
    fn from(e: ConfigError) -> Self {
        WorkflowError::Store(StoreError::Config(e))
    }
}

/// Prompts for a category name and adds the category.
///
/// Blank input counts as a cancelled dialog.
///
/// # Errors
///
/// Propagates [`StoreError`] from [`ConfigStore::add_category`].
pub async fn add_category<S, P>(
    store: &mut ConfigStore<S>,
    prompter: &P,
) -> Result<Flow<Category>, WorkflowError>
where
    S: KeyValueStore,
    P: Prompter + ?Sized,
{
    let Some(name) = prompter
        .category_name()
        .await
        .filter(|name| !name.trim().is_empty())
    else {
        return Ok(Flow::Cancelled);
    };
    Ok(Flow::Completed(store.add_category(&name)?))
}

/// Prompts for a name/URL pair and adds it to `category_id`.
///
/// # Errors
///
/// `NoCategories` is reported before the dialog is shown; other failures
/// come from [`ConfigStore::add_url`].
pub async fn add_url<S, P>(
    store: &mut ConfigStore<S>,
    prompter: &P,
    category_id: CategoryId,
) -> Result<Flow<Resolution<UrlEntry>>, WorkflowError>
where
    S: KeyValueStore,
    P: Prompter + ?Sized,
{
    if store.config().categories.is_empty() {
        return Err(ConfigError::NoCategories.into());
    }
    let Some(form) = prompter.url_entry().await else {
        return Ok(Flow::Cancelled);
    };
    Ok(Flow::Completed(store.add_url(
        category_id,
        &form.name,
        &form.url,
    )?))
}

/// Asks for confirmation, then deletes a category and its URLs.
///
/// # Errors
///
/// `NotFound` is reported before the dialog is shown.
pub async fn delete_category<S, P>(
    store: &mut ConfigStore<S>,
    prompter: &P,
    id: CategoryId,
) -> Result<Flow<Category>, WorkflowError>
where
    S: KeyValueStore,
    P: Prompter + ?Sized,
{
    let category = store.config().category(id).ok_or(ConfigError::NotFound(id))?;
    let request = Confirmation::DeleteCategory {
        id,
        name: category.name.clone(),
        urls: category.urls.len(),
    };
    if !prompter.confirm(&request).await {
        return Ok(Flow::Cancelled);
    }
    Ok(Flow::Completed(store.delete_category(id)?))
}

/// Asks for confirmation, then removes one URL.
///
/// Ids that do not resolve complete immediately with
/// [`Resolution::Unresolved`]; no dialog is shown.
///
/// # Errors
///
/// Propagates [`StoreError`] from [`ConfigStore::remove_url`].
pub async fn remove_url<S, P>(
    store: &mut ConfigStore<S>,
    prompter: &P,
    category_id: CategoryId,
    url_id: UrlId,
) -> Result<Flow<Resolution<UrlEntry>>, WorkflowError>
where
    S: KeyValueStore,
    P: Prompter + ?Sized,
{
    let config = store.config();
    let target = config
        .resolve_category_index(category_id)
        .and_then(|ci| Some((ci, config.resolve_url_index(ci, url_id)?)))
        .map(|(ci, ui)| config.categories[ci].urls[ui].name.clone());
    let Some(name) = target else {
        return Ok(Flow::Completed(Resolution::Unresolved));
    };

    let request = Confirmation::RemoveUrl {
        category_id,
        url_id,
        name,
    };
    if !prompter.confirm(&request).await {
        return Ok(Flow::Cancelled);
    }
    Ok(Flow::Completed(store.remove_url(category_id, url_id)?))
}

/// Prompts for a file, reads it, and imports it over the current store.
///
/// # Errors
///
/// [`WorkflowError::Read`] if the file cannot be read; otherwise
/// [`TransferError`] from [`transfer::import`].
pub async fn import_file<S, P, R>(
    store: &mut ConfigStore<S>,
    prompter: &P,
    reader: &R,
) -> Result<Flow<ImportSummary>, WorkflowError>
where
    S: KeyValueStore,
    P: Prompter + ?Sized,
    R: FileReader + ?Sized,
{
    let Some(path) = prompter.import_file().await else {
        return Ok(Flow::Cancelled);
    };
    let contents = reader
        .read_text(&path)
        .await
        .map_err(|source| WorkflowError::Read {
            path: path.clone(),
            source,
        })?;
    Ok(Flow::Completed(transfer::import(store, &contents)?))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::persistence::MockKeyValueStore;
    use startpage_core::{Configuration, IdAllocation};
    use std::sync::Mutex;

    // ── Test doubles ──────────────────────────────────────────────────────────

    #[derive(Default)]
    struct FixedPrompter {
        name: Option<String>,
        form: Option<UrlForm>,
        confirm: bool,
        file: Option<PathBuf>,
        confirmations: Mutex<Vec<Confirmation>>,
    }

    #[async_trait]
    impl Prompter for FixedPrompter {
        async fn category_name(&self) -> Option<String> {
            self.name.clone()
        }

        async fn url_entry(&self) -> Option<UrlForm> {
            self.form.clone()
        }

        async fn confirm(&self, request: &Confirmation) -> bool {
            self.confirmations.lock().unwrap().push(request.clone());
            self.confirm
        }

        async fn import_file(&self) -> Option<PathBuf> {
            self.file.clone()
        }
    }

    struct FixedReader(io::Result<String>);

    #[async_trait]
    impl FileReader for FixedReader {
        async fn read_text(&self, _path: &Path) -> io::Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    fn store() -> ConfigStore<MockKeyValueStore> {
        let mut slot = MockKeyValueStore::new();
        slot.expect_set_item().returning(|_, _| Ok(()));
        ConfigStore::with_config(Configuration::default(), slot, IdAllocation::LastElement)
    }

    fn store_with_work() -> ConfigStore<MockKeyValueStore> {
        let mut store = store();
        store.add_category("Work").unwrap();
        store.add_url(1, "Docs", "https://example.com").unwrap();
        store
    }

    fn docs_form() -> UrlForm {
        UrlForm {
            name: "Docs".to_string(),
            url: "https://example.com".to_string(),
        }
    }

    // ── add_category ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_add_category_completes_with_prompted_name() {
        let mut store = store();
        let prompter = FixedPrompter {
            name: Some("Work".to_string()),
            ..FixedPrompter::default()
        };

        let flow = add_category(&mut store, &prompter).await.unwrap();

        assert!(matches!(flow, Flow::Completed(ref c) if c.name == "Work" && c.id == 1));
    }

    #[tokio::test]
    async fn test_add_category_dismissed_dialog_is_cancelled() {
        let mut store = store();

        let flow = add_category(&mut store, &FixedPrompter::default())
            .await
            .unwrap();

        assert!(flow.is_cancelled());
        assert!(store.config().categories.is_empty());
    }

    #[tokio::test]
    async fn test_add_category_blank_input_is_cancelled() {
        let mut store = store();
        let prompter = FixedPrompter {
            name: Some("  ".to_string()),
            ..FixedPrompter::default()
        };

        let flow = add_category(&mut store, &prompter).await.unwrap();

        assert!(flow.is_cancelled());
    }

    #[tokio::test]
    async fn test_add_category_duplicate_surfaces_error() {
        let mut store = store_with_work();
        let prompter = FixedPrompter {
            name: Some("work".to_string()),
            ..FixedPrompter::default()
        };

        let result = add_category(&mut store, &prompter).await;

        assert!(matches!(
            result,
            Err(WorkflowError::Store(StoreError::Config(
                ConfigError::DuplicateName(_)
            )))
        ));
    }

    // ── add_url ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_add_url_without_categories_fails_before_prompting() {
        let mut store = store();
        let prompter = FixedPrompter {
            form: Some(docs_form()),
            ..FixedPrompter::default()
        };

        let result = add_url(&mut store, &prompter, 1).await;

        assert!(matches!(
            result,
            Err(WorkflowError::Store(StoreError::Config(
                ConfigError::NoCategories
            )))
        ));
    }

    #[tokio::test]
    async fn test_add_url_appends_entry() {
        let mut store = store();
        store.add_category("Work").unwrap();
        let prompter = FixedPrompter {
            form: Some(docs_form()),
            ..FixedPrompter::default()
        };

        let flow = add_url(&mut store, &prompter, 1).await.unwrap();

        assert_eq!(
            flow,
            Flow::Completed(Resolution::Applied(UrlEntry::new(
                1,
                "Docs",
                "https://example.com"
            )))
        );
    }

    #[tokio::test]
    async fn test_add_url_to_unknown_category_completes_unresolved() {
        let mut store = store_with_work();
        let before = store.config().clone();
        let prompter = FixedPrompter {
            form: Some(docs_form()),
            ..FixedPrompter::default()
        };

        let flow = add_url(&mut store, &prompter, 999).await.unwrap();

        assert_eq!(flow, Flow::Completed(Resolution::Unresolved));
        assert_eq!(store.config(), &before);
    }

    // ── delete_category ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_delete_category_asks_with_name_and_url_count() {
        let mut store = store_with_work();
        let prompter = FixedPrompter {
            confirm: true,
            ..FixedPrompter::default()
        };

        let flow = delete_category(&mut store, &prompter, 1).await.unwrap();

        assert!(matches!(flow, Flow::Completed(_)));
        assert!(store.config().categories.is_empty());
        assert_eq!(
            prompter.confirmations.lock().unwrap().as_slice(),
            &[Confirmation::DeleteCategory {
                id: 1,
                name: "Work".to_string(),
                urls: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_category_declined_keeps_category() {
        let mut store = store_with_work();

        let flow = delete_category(&mut store, &FixedPrompter::default(), 1)
            .await
            .unwrap();

        assert!(flow.is_cancelled());
        assert_eq!(store.config().categories.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_category_fails_without_asking() {
        let mut store = store_with_work();
        let prompter = FixedPrompter {
            confirm: true,
            ..FixedPrompter::default()
        };

        let result = delete_category(&mut store, &prompter, 9).await;

        assert!(matches!(
            result,
            Err(WorkflowError::Store(StoreError::Config(ConfigError::NotFound(9))))
        ));
        assert!(prompter.confirmations.lock().unwrap().is_empty());
    }

    // ── remove_url ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_remove_url_twice_second_call_is_unresolved_without_prompt() {
        let mut store = store_with_work();
        let prompter = FixedPrompter {
            confirm: true,
            ..FixedPrompter::default()
        };

        let first = remove_url(&mut store, &prompter, 1, 1).await.unwrap();
        let second = remove_url(&mut store, &prompter, 1, 1).await.unwrap();

        assert!(matches!(first, Flow::Completed(Resolution::Applied(_))));
        assert_eq!(second, Flow::Completed(Resolution::Unresolved));
        assert_eq!(prompter.confirmations.lock().unwrap().len(), 1);
    }

    // ── import_file ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_import_file_replaces_store() {
        let mut store = store();
        let prompter = FixedPrompter {
            file: Some(PathBuf::from("export.json")),
            ..FixedPrompter::default()
        };
        let reader = FixedReader(Ok(r#"[{"id":3,"name":"Imported","urls":[]}]"#.to_string()));

        let flow = import_file(&mut store, &prompter, &reader).await.unwrap();

        assert!(matches!(flow, Flow::Completed(s) if s.categories == 1));
        assert_eq!(store.config().categories[0].name, "Imported");
    }

    #[tokio::test]
    async fn test_import_file_without_selection_is_cancelled() {
        let mut store = store_with_work();
        let reader = FixedReader(Ok(String::new()));

        let flow = import_file(&mut store, &FixedPrompter::default(), &reader)
            .await
            .unwrap();

        assert!(flow.is_cancelled());
        assert_eq!(store.config().categories.len(), 1);
    }

    #[tokio::test]
    async fn test_import_file_read_failure_is_reported_with_path() {
        let mut store = store();
        let prompter = FixedPrompter {
            file: Some(PathBuf::from("missing.json")),
            ..FixedPrompter::default()
        };
        let reader = FixedReader(Err(io::Error::new(io::ErrorKind::NotFound, "gone")));

        let result = import_file(&mut store, &prompter, &reader).await;

        let err = result.unwrap_err();
        assert!(matches!(err, WorkflowError::Read { .. }));
        assert!(err.to_string().contains("missing.json"));
    }
}
