//! JSON codec for configuration documents.
//!
//! Document shapes, newest first:
//! ```text
//! v2        {"version": 2, "categories": [...], "design": {...}}
//! envelope  {"categories": [...], "design": {...}}          (no version field)
//! legacy    [ {"id": 1, "name": "...", "urls": [...]}, ... ] (bare category list)
//! ```
//! [`encode`] always writes v2.  [`decode`] accepts every shape above and
//! reports which one it found, so callers can log the migration.
//!
//! Decoding is lenient about missing fields (see the serde defaults on the
//! domain types) but strict about the top-level shape and the version.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::config::{Category, Configuration, DesignSettings};

/// The version written by [`encode`].
pub const SCHEMA_VERSION: u32 = 2;

/// Errors that can occur while encoding or decoding a document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The text is not JSON at all.
    #[error("not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// Valid JSON, but neither an object nor a list of categories.
    #[error("unexpected document shape: expected an object or a list of categories, found {0}")]
    UnexpectedShape(&'static str),

    /// Written by a newer release.
    #[error("unsupported schema version {found} (newest known is {})", SCHEMA_VERSION)]
    UnsupportedVersion { found: u64 },

    /// The shape is right but a field has the wrong type.
    #[error("invalid document content: {0}")]
    Content(#[source] serde_json::Error),

    /// The configuration could not be turned into JSON.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Which document shape [`decode`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaShape {
    /// Bare list of categories.
    LegacyList,
    /// `{categories, design}` without a version field.
    Envelope,
    /// Carries an explicit version.
    Versioned(u32),
}

impl SchemaShape {
    /// `true` when the document was not already in the current shape.
    pub fn was_migrated(self) -> bool {
        self != SchemaShape::Versioned(SCHEMA_VERSION)
    }
}

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub config: Configuration,
    pub shape: SchemaShape,
}

#[derive(Serialize)]
struct Document<'a> {
    version: u32,
    #[serde(flatten)]
    config: &'a Configuration,
}

impl<'a> Document<'a> {
    fn current(config: &'a Configuration) -> Self {
        Self {
            version: SCHEMA_VERSION,
            config,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `config` as compact v2 JSON.
///
/// # Errors
///
/// Returns [`SchemaError::Serialize`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use startpage_core::{decode, encode, Configuration};
///
/// let mut cfg = Configuration::new();
/// cfg.add_category("Work", Default::default()).unwrap();
/// let text = encode(&cfg).unwrap();
/// assert!(text.starts_with(r#"{"version":2"#));
/// assert_eq!(decode(&text).unwrap().config, cfg);
/// ```
pub fn encode(config: &Configuration) -> Result<String, SchemaError> {
    serde_json::to_string(&Document::current(config)).map_err(SchemaError::Serialize)
}

/// Encodes `config` as indented v2 JSON, for files meant to be read by people.
///
/// # Errors
///
/// Returns [`SchemaError::Serialize`] if serialization fails.
pub fn encode_pretty(config: &Configuration) -> Result<String, SchemaError> {
    serde_json::to_string_pretty(&Document::current(config)).map_err(SchemaError::Serialize)
}

/// Decodes a document of any known shape into a [`Configuration`].
///
/// # Errors
///
/// - [`SchemaError::Syntax`] if `text` is not JSON.
/// - [`SchemaError::UnexpectedShape`] for scalars, or a non-integer version.
/// - [`SchemaError::UnsupportedVersion`] for versions newer than [`SCHEMA_VERSION`].
/// - [`SchemaError::Content`] when a field has the wrong type.
pub fn decode(text: &str) -> Result<Decoded, SchemaError> {
    let value: Value = serde_json::from_str(text).map_err(SchemaError::Syntax)?;
    let shape = detect_shape(&value)?;

    let config = match shape {
        SchemaShape::LegacyList => {
            let categories: Vec<Category> =
                serde_json::from_value(value).map_err(SchemaError::Content)?;
            Configuration {
                categories,
                design: DesignSettings::default(),
            }
        }
        SchemaShape::Envelope | SchemaShape::Versioned(_) => {
            serde_json::from_value(value).map_err(SchemaError::Content)?
        }
    };

    if shape.was_migrated() {
        debug!(
            ?shape,
            categories = config.categories.len(),
            "migrated configuration document to schema v{SCHEMA_VERSION}"
        );
    }

    Ok(Decoded { config, shape })
}

fn detect_shape(value: &Value) -> Result<SchemaShape, SchemaError> {
    match value {
        Value::Array(_) => Ok(SchemaShape::LegacyList),
        Value::Object(map) => match map.get("version") {
            None => Ok(SchemaShape::Envelope),
            Some(version) => {
                let found = version
                    .as_u64()
                    .ok_or(SchemaError::UnexpectedShape("a non-integer version field"))?;
                if found > u64::from(SCHEMA_VERSION) {
                    return Err(SchemaError::UnsupportedVersion { found });
                }
                // Bounded by SCHEMA_VERSION above.
                Ok(SchemaShape::Versioned(found as u32))
            }
        },
        Value::String(_) => Err(SchemaError::UnexpectedShape("a string")),
        Value::Number(_) => Err(SchemaError::UnexpectedShape("a number")),
        Value::Bool(_) => Err(SchemaError::UnexpectedShape("a boolean")),
        Value::Null => Err(SchemaError::UnexpectedShape("null")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
