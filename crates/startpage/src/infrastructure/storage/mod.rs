//! Storage infrastructure: the durable slot and the settings file.
//!
//! - `slot`     – File-backed and in-memory implementations of
//!   [`KeyValueStore`](crate::application::persistence::KeyValueStore).
//! - `settings` – Reads `settings.toml` from the platform config directory,
//!   with defaults for every field on first run.

pub mod settings;
pub mod slot;
