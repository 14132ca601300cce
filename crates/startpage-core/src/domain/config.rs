//! The start page configuration tree.
//!
//! A [`Configuration`] is an ordered list of [`Category`] values, each owning
//! an ordered list of [`UrlEntry`] values, plus one [`DesignSettings`] block.
//! All mutations here are pure in-memory operations; persistence is layered on
//! top by the application crate.
//!
//! # Lookup semantics
//!
//! Ids are resolved by a linear scan that keeps the **last** match.  Under the
//! invariants duplicates never exist, but hand-edited imports can contain
//! them, and the last-match rule keeps behaviour stable for such files.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identity::{IdAllocation, Identified};

/// Identifier of a category, unique within a configuration.
pub type CategoryId = u32;

/// Identifier of a URL entry, unique within its owning category only.
pub type UrlId = u32;

/// Accent colour used when none has been chosen.
pub const DEFAULT_COLOR: &str = "#343a40";

/// Fully opaque.
pub const DEFAULT_OPACITY: f64 = 1.0;

/// Errors raised by configuration mutations.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Another category already uses this name (compared case-insensitively).
    #[error("category \"{0}\" exists already")]
    DuplicateName(String),

    /// The category name is blank.
    #[error("category name must not be empty")]
    EmptyName,

    /// No category carries the requested id.
    #[error("the category you tried to delete doesn't exist (id {0})")]
    NotFound(CategoryId),

    /// A URL was added while no category exists.
    #[error("please add a category first")]
    NoCategories,

    /// Opacity outside `[0, 1]` or NaN.
    #[error("opacity must be between 0 and 1, got {0}")]
    InvalidOpacity(f64),
}

/// Outcome of an operation whose target ids may not resolve.
///
/// Unresolved ids are not errors: the operation is a no-op and the
/// configuration is left untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Resolution<T> {
    /// Both ids resolved and the change was made.
    Applied(T),
    /// An id did not resolve; nothing changed.
    Unresolved,
}

impl<T> Resolution<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Resolution::Applied(_))
    }
}

/// A named link inside a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlEntry {
    pub id: UrlId,
    #[serde(default)]
    pub name: String,
    /// Expected to be a URL; never validated.
    #[serde(default)]
    pub url: String,
}

impl UrlEntry {
    pub fn new(id: UrlId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
        }
    }
}

impl Identified for UrlEntry {
    fn id(&self) -> u32 {
        self.id
    }
}

/// A named group of URL entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub urls: Vec<UrlEntry>,
}

impl Category {
    /// Creates an empty category.
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            urls: Vec::new(),
        }
    }
}

impl Identified for Category {
    fn id(&self) -> u32 {
        self.id
    }
}

/// Cosmetic settings, independent of the category tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignSettings {
    /// A `data:` URI, or empty for no background image.
    pub background_image: String,
    /// Hex accent colour.
    pub color: String,
    /// In `[0, 1]`.
    pub opacity: f64,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            background_image: String::new(),
            color: DEFAULT_COLOR.to_string(),
            opacity: DEFAULT_OPACITY,
        }
    }
}

/// A partial update of [`DesignSettings`]; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignPatch {
    pub background_image: Option<String>,
    pub color: Option<String>,
    pub opacity: Option<f64>,
}

impl DesignPatch {
    pub fn is_empty(&self) -> bool {
        self.background_image.is_none() && self.color.is_none() && self.opacity.is_none()
    }
}

/// Root aggregate: every category, every URL, and the design block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub categories: Vec<Category>,
    pub design: DesignSettings,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when there is something worth exporting: at least one category,
    /// or design settings that differ from the defaults.
    pub fn has_content(&self) -> bool {
        !self.categories.is_empty() || self.design != DesignSettings::default()
    }

    /// Total number of URL entries across all categories.
    pub fn url_count(&self) -> usize {
        self.categories.iter().map(|c| c.urls.len()).sum()
    }

    /// Index of the last category whose id equals `id`.
    pub fn resolve_category_index(&self, id: CategoryId) -> Option<usize> {
        self.categories.iter().rposition(|c| c.id == id)
    }

    /// Index of the last URL with id `id` inside the category at `category_index`.
    ///
    /// Returns `None` when either the category index is out of range or no URL
    /// matches.
    pub fn resolve_url_index(&self, category_index: usize, id: UrlId) -> Option<usize> {
        self.categories
            .get(category_index)?
            .urls
            .iter()
            .rposition(|u| u.id == id)
    }

    /// Returns the category with the given id, if any.
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.resolve_category_index(id).map(|i| &self.categories[i])
    }

    /// Case-insensitive name check.
    pub fn contains_category_name(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.categories
            .iter()
            .any(|c| c.name.to_lowercase() == wanted)
    }

    /// Appends a new, empty category.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyName`] for a blank name and
    /// [`ConfigError::DuplicateName`] when the name is already taken.
    pub fn add_category(
        &mut self,
        name: &str,
        allocation: IdAllocation,
    ) -> Result<Category, ConfigError> {
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.contains_category_name(name) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }

        let category = Category::new(allocation.next_id(&self.categories), name);
        self.categories.push(category.clone());
        Ok(category)
    }

    /// Removes a category together with all of its URLs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotFound`] when no category has this id.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<Category, ConfigError> {
        let index = self
            .resolve_category_index(id)
            .ok_or(ConfigError::NotFound(id))?;
        Ok(self.categories.remove(index))
    }

    /// Appends a URL entry to the category `category_id`.
    ///
    /// An unknown category id yields [`Resolution::Unresolved`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoCategories`] when the configuration has no categories.
    pub fn add_url(
        &mut self,
        category_id: CategoryId,
        name: &str,
        url: &str,
        allocation: IdAllocation,
    ) -> Result<Resolution<UrlEntry>, ConfigError> {
        if self.categories.is_empty() {
            return Err(ConfigError::NoCategories);
        }
        let Some(index) = self.resolve_category_index(category_id) else {
            return Ok(Resolution::Unresolved);
        };

        let urls = &mut self.categories[index].urls;
        let entry = UrlEntry::new(allocation.next_id(urls), name, url);
        urls.push(entry.clone());
        Ok(Resolution::Applied(entry))
    }

    /// Removes one URL entry; unresolved ids leave everything unchanged.
    pub fn remove_url(&mut self, category_id: CategoryId, url_id: UrlId) -> Resolution<UrlEntry> {
        let Some(category_index) = self.resolve_category_index(category_id) else {
            return Resolution::Unresolved;
        };
        let Some(url_index) = self.resolve_url_index(category_index, url_id) else {
            return Resolution::Unresolved;
        };
        Resolution::Applied(self.categories[category_index].urls.remove(url_index))
    }

    /// Merges `patch` into the design settings.
    ///
    /// The patch is validated as a whole before any field is written.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidOpacity`] when the opacity is NaN or outside `[0, 1]`.
    pub fn apply_design(&mut self, patch: DesignPatch) -> Result<&DesignSettings, ConfigError> {
        if let Some(opacity) = patch.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(ConfigError::InvalidOpacity(opacity));
            }
        }

        let design = &mut self.design;
        if let Some(background_image) = patch.background_image {
            design.background_image = background_image;
        }
        if let Some(color) = patch.color {
            design.color = color;
        }
        if let Some(opacity) = patch.opacity {
            design.opacity = opacity;
        }
        Ok(&self.design)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
