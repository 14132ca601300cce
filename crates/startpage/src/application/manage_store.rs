//! ManageStoreUseCase: the configuration store with write-through persistence.
//!
//! [`ConfigStore`] owns the one live [`Configuration`] of the process together
//! with the storage slot it is mirrored into.  It is created once by the
//! top-level controller (see `infrastructure::ui_bridge::AppState`) and passed
//! by reference to every operation; there is no global instance.
//!
//! # Write-through (for beginners)
//!
//! Every successful mutation is followed immediately by a full save of the
//! configuration:
//!
//! ```text
//! add_category("Work")
//!   ├─ Configuration::add_category   (in memory, may fail → nothing changes)
//!   └─ persistence::save              (may fail → change stays in memory,
//!                                      StoreError::WriteThrough returned)
//! ```
//!
//! A failed save is not fatal.  The caller shows the error to the user and the
//! next successful mutation saves everything, including the earlier change.

use startpage_core::{
    Category, CategoryId, ConfigError, Configuration, DesignPatch, DesignSettings, IdAllocation,
    Resolution, UrlEntry, UrlId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::persistence::{self, Hydration, KeyValueStore, PersistError};

/// Error type for store mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The mutation was rejected; the configuration is unchanged.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The mutation was applied in memory but could not be saved.
    #[error("change kept in memory but not saved: {0}")]
    WriteThrough(#[from] PersistError),
}

/// The configuration store: in-memory tree plus its durable slot.
pub struct ConfigStore<S> {
    config: Configuration,
    slot: S,
    allocation: IdAllocation,
}

impl<S: KeyValueStore> ConfigStore<S> {
    /// Hydrates a store from `slot`.
    ///
    /// # Errors
    ///
    /// Propagates [`PersistError`] from [`persistence::load`].
    pub fn open(slot: S, allocation: IdAllocation) -> Result<Self, PersistError> {
        let loaded = persistence::load(&slot)?;
        if let Hydration::Stored { key, shape } = loaded.hydration {
            info!(
                key,
                ?shape,
                categories = loaded.config.categories.len(),
                urls = loaded.config.url_count(),
                "configuration loaded"
            );
        }
        Ok(Self::with_config(loaded.config, slot, allocation))
    }

    /// Hydrates a store from `slot`, falling back to the default configuration
    /// when the slot cannot be read or holds corrupt data.
    ///
    /// The load error, if any, is returned so it can be shown to the user.
    pub fn open_or_default(slot: S, allocation: IdAllocation) -> (Self, Option<PersistError>) {
        match persistence::load(&slot) {
            Ok(loaded) => (Self::with_config(loaded.config, slot, allocation), None),
            Err(e) => {
                warn!("starting with default configuration: {e}");
                (
                    Self::with_config(Configuration::default(), slot, allocation),
                    Some(e),
                )
            }
        }
    }

    /// Wraps an existing configuration without reading the slot.
    pub fn with_config(config: Configuration, slot: S, allocation: IdAllocation) -> Self {
        Self {
            config,
            slot,
            allocation,
        }
    }

    /// Read-only view of the current configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn allocation(&self) -> IdAllocation {
        self.allocation
    }

    /// Read-only access to the underlying slot.
    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Adds a category and writes through.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] with `DuplicateName` or `EmptyName`, or
    /// [`StoreError::WriteThrough`] if saving fails.
    pub fn add_category(&mut self, name: &str) -> Result<Category, StoreError> {
        let category = self.config.add_category(name, self.allocation)?;
        info!(id = category.id, name = %category.name, "category added");
        self.write_through()?;
        Ok(category)
    }

    /// Deletes a category (and its URLs) and writes through.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] with `NotFound`, or [`StoreError::WriteThrough`].
    pub fn delete_category(&mut self, id: CategoryId) -> Result<Category, StoreError> {
        let removed = self.config.delete_category(id)?;
        info!(id, urls = removed.urls.len(), "category deleted");
        self.write_through()?;
        Ok(removed)
    }

    /// Adds a URL to a category and writes through.
    ///
    /// An unknown category id is reported as [`Resolution::Unresolved`] and
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] with `NoCategories`, or [`StoreError::WriteThrough`].
    pub fn add_url(
        &mut self,
        category_id: CategoryId,
        name: &str,
        url: &str,
    ) -> Result<Resolution<UrlEntry>, StoreError> {
        let outcome = self
            .config
            .add_url(category_id, name, url, self.allocation)?;
        match &outcome {
            Resolution::Applied(entry) => {
                info!(category_id, id = entry.id, "url added");
                self.write_through()?;
            }
            Resolution::Unresolved => debug!(category_id, "add_url: category not found"),
        }
        Ok(outcome)
    }

    /// Removes a URL and writes through.
    ///
    /// Unknown ids are reported as [`Resolution::Unresolved`], so calling this
    /// twice with the same ids is harmless.
    ///
    /// # Errors
    ///
    /// [`StoreError::WriteThrough`] if saving fails.
    pub fn remove_url(
        &mut self,
        category_id: CategoryId,
        url_id: UrlId,
    ) -> Result<Resolution<UrlEntry>, StoreError> {
        let outcome = self.config.remove_url(category_id, url_id);
        match &outcome {
            Resolution::Applied(_) => {
                info!(category_id, url_id, "url removed");
                self.write_through()?;
            }
            Resolution::Unresolved => debug!(category_id, url_id, "remove_url: nothing to remove"),
        }
        Ok(outcome)
    }

    /// Merges design settings and writes through.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] with `InvalidOpacity`, or [`StoreError::WriteThrough`].
    pub fn set_design(&mut self, patch: DesignPatch) -> Result<DesignSettings, StoreError> {
        let design = self.config.apply_design(patch)?.clone();
        info!(color = %design.color, opacity = design.opacity, "design updated");
        self.write_through()?;
        Ok(design)
    }

    /// Replaces the whole configuration (import) and writes through.
    ///
    /// # Errors
    ///
    /// [`PersistError`] if saving fails; the new configuration is kept in memory.
    pub fn replace(&mut self, config: Configuration) -> Result<(), PersistError> {
        self.config = config;
        self.write_through()
    }

    fn write_through(&mut self) -> Result<(), PersistError> {
        persistence::save(&mut self.slot, &self.config).map(|_| ()).map_err(|e| {
            warn!("write-through failed: {e}");
            e
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
