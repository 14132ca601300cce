//! # startpage-core
//!
//! Shared library for StartPage containing the configuration data model, the
//! id allocator, and the versioned document schema used both for the durable
//! storage slot and for exported files.
//!
//! This crate performs no I/O.
//!
//! - **`domain`** – Categories, URL entries, design settings, and the rules
//!   that keep the tree consistent (unique ids, case-insensitive unique
//!   category names).
//!
//! - **`schema`** – How a configuration becomes text and back.  Older
//!   documents (a bare list of categories, or an envelope without a version
//!   field) are migrated on the way in.

pub mod domain;
pub mod schema;

pub use domain::config::{
    Category, CategoryId, ConfigError, Configuration, DesignPatch, DesignSettings, Resolution,
    UrlEntry, UrlId, DEFAULT_COLOR, DEFAULT_OPACITY,
};
pub use domain::identity::{IdAllocation, Identified};
pub use schema::codec::{decode, encode, encode_pretty, Decoded, SchemaError, SchemaShape};
