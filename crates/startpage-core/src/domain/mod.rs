//! Domain entities for StartPage.
//!
//! Pure data and rules: no file system, no storage slots, no prompts.  The
//! application crate layers persistence and user interaction on top.

/// Id allocation policies shared by categories and URL entries.
pub mod identity;

/// The configuration tree and its in-memory mutations.
///
/// See [`config::Configuration`] for the root aggregate.
pub mod config;
