//! Command bridge: exposes the store and its workflows to a presentation layer.
//!
//! Every command takes the shared [`AppState`], performs one operation, and
//! answers with a [`CommandResult`]:
//! `{ success: bool, data: T | null, error: string | null }`.
//! The `error` text is the notification shown to the user; the presentation
//! layer never has to inspect error types.
//!
//! # Interactive commands
//!
//! The `prompt_*` commands run a dialog-driven workflow.  They hold the store
//! lock while awaiting the user's answers, so a second action started from the
//! UI waits until the first dialog closes.

use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use startpage_core::{
    Category, CategoryId, Configuration, DesignPatch, DesignSettings, IdAllocation, Resolution,
    UrlEntry, UrlId,
};
use tokio::sync::Mutex;

use crate::application::{
    manage_store::ConfigStore,
    persistence::KeyValueStore,
    transfer::{self, ExportBlob, ImportSummary},
    workflow::{self, FileReader, Flow, Prompter},
};
use crate::infrastructure::storage::{
    settings::{AppSettings, SettingsError},
    slot::FileSlot,
};

/// The store type shared by all commands.
pub type SharedStore = ConfigStore<Box<dyn KeyValueStore>>;

// ── Shared application state ──────────────────────────────────────────────────

/// Application state shared between commands.
///
/// The store sits behind an async Tokio mutex because interactive commands
/// keep it locked across `.await` points while a dialog is open.
pub struct AppState {
    pub store: Mutex<SharedStore>,
    /// Why the stored configuration could not be loaded, if it could not.
    notice: Option<String>,
}

impl AppState {
    /// Hydrates the store from `slot`.
    ///
    /// A slot that cannot be read or holds corrupt data does not prevent
    /// start-up: the default configuration is used and the problem is kept as
    /// a notice for the user.
    pub fn new(slot: Box<dyn KeyValueStore>, allocation: IdAllocation) -> Arc<Self> {
        let (store, load_error) = ConfigStore::open_or_default(slot, allocation);
        Arc::new(Self {
            store: Mutex::new(store),
            notice: load_error.map(|e| e.to_string()),
        })
    }

    /// Builds the state on a [`FileSlot`] described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoPlatformConfigDir`] when no data directory is
    /// configured and none can be derived from the platform.
    pub fn from_settings(settings: &AppSettings) -> Result<Arc<Self>, SettingsError> {
        let data_dir = settings.storage.resolve_data_dir()?;
        let slot = FileSlot::new(
            data_dir,
            &settings.storage.origin,
            settings.storage.quota(),
        );
        Ok(Self::new(Box::new(slot), settings.identity.allocation))
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

// ── Response wrapper ──────────────────────────────────────────────────────────

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }

    fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns a snapshot of the whole configuration.
pub async fn get_config(state: Arc<AppState>) -> CommandResult<Configuration> {
    let store = state.store.lock().await;
    CommandResult::ok(store.config().clone())
}

/// Returns the start-up notice, if loading the stored configuration failed.
pub async fn get_startup_notice(state: Arc<AppState>) -> CommandResult<Option<String>> {
    CommandResult::ok(state.notice().map(str::to_string))
}

pub async fn add_category(state: Arc<AppState>, name: String) -> CommandResult<Category> {
    let mut store = state.store.lock().await;
    CommandResult::from_result(store.add_category(&name))
}

pub async fn delete_category(state: Arc<AppState>, id: CategoryId) -> CommandResult<Category> {
    let mut store = state.store.lock().await;
    CommandResult::from_result(store.delete_category(id))
}

pub async fn add_url(
    state: Arc<AppState>,
    category_id: CategoryId,
    name: String,
    url: String,
) -> CommandResult<Resolution<UrlEntry>> {
    let mut store = state.store.lock().await;
    CommandResult::from_result(store.add_url(category_id, &name, &url))
}

pub async fn remove_url(
    state: Arc<AppState>,
    category_id: CategoryId,
    url_id: UrlId,
) -> CommandResult<Resolution<UrlEntry>> {
    let mut store = state.store.lock().await;
    CommandResult::from_result(store.remove_url(category_id, url_id))
}

/// Applies a partial design update.  An empty patch changes and writes nothing.
pub async fn set_design(state: Arc<AppState>, patch: DesignPatch) -> CommandResult<DesignSettings> {
    let mut store = state.store.lock().await;
    if patch.is_empty() {
        return CommandResult::ok(store.config().design.clone());
    }
    CommandResult::from_result(store.set_design(patch))
}

/// Produces the `export.json` download.
pub async fn export_config(state: Arc<AppState>) -> CommandResult<ExportBlob> {
    let store = state.store.lock().await;
    CommandResult::from_result(transfer::export(store.config()))
}

/// Replaces the configuration with the contents of an import file.
pub async fn import_config(state: Arc<AppState>, contents: String) -> CommandResult<ImportSummary> {
    let mut store = state.store.lock().await;
    CommandResult::from_result(transfer::import(&mut *store, &contents))
}

// ── Interactive commands ──────────────────────────────────────────────────────

pub async fn prompt_add_category<P>(state: Arc<AppState>, prompter: &P) -> CommandResult<Flow<Category>>
where
    P: Prompter + ?Sized,
{
    let mut store = state.store.lock().await;
    CommandResult::from_result(workflow::add_category(&mut *store, prompter).await)
}

pub async fn prompt_add_url<P>(
    state: Arc<AppState>,
    prompter: &P,
    category_id: CategoryId,
) -> CommandResult<Flow<Resolution<UrlEntry>>>
where
    P: Prompter + ?Sized,
{
    let mut store = state.store.lock().await;
    CommandResult::from_result(workflow::add_url(&mut *store, prompter, category_id).await)
}

pub async fn prompt_delete_category<P>(
    state: Arc<AppState>,
    prompter: &P,
    id: CategoryId,
) -> CommandResult<Flow<Category>>
where
    P: Prompter + ?Sized,
{
    let mut store = state.store.lock().await;
    CommandResult::from_result(workflow::delete_category(&mut *store, prompter, id).await)
}

pub async fn prompt_remove_url<P>(
    state: Arc<AppState>,
    prompter: &P,
    category_id: CategoryId,
    url_id: UrlId,
) -> CommandResult<Flow<Resolution<UrlEntry>>>
where
    P: Prompter + ?Sized,
{
    let mut store = state.store.lock().await;
    CommandResult::from_result(
        workflow::remove_url(&mut *store, prompter, category_id, url_id).await,
    )
}

pub async fn prompt_import<P, R>(
    state: Arc<AppState>,
    prompter: &P,
    reader: &R,
) -> CommandResult<Flow<ImportSummary>>
where
    P: Prompter + ?Sized,
    R: FileReader + ?Sized,
{
    let mut store = state.store.lock().await;
    CommandResult::from_result(workflow::import_file(&mut *store, prompter, reader).await)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
