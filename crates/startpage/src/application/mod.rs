//! Application layer use cases for the start page.
//!
//! The application layer sits between the domain (`startpage_core`, pure
//! in-memory rules) and the infrastructure (files, terminal, settings).
//! Use cases here depend on traits such as [`persistence::KeyValueStore`] and
//! [`workflow::Prompter`] rather than on concrete adapters, and perform no
//! file system or terminal I/O of their own.
//!
//! # Sub-modules
//!
//! - **`persistence`**  – Saves and loads the configuration through a durable
//!   key/value slot, including the legacy-key fallback.
//!
//! - **`manage_store`** – The [`manage_store::ConfigStore`]: every mutation is
//!   applied in memory and written through to the slot.
//!
//! - **`transfer`**     – Export to and import from `export.json` files.
//!
//! - **`workflow`**     – Dialog-driven flows that collect user input or
//!   confirmation before calling into the store.

pub mod manage_store;
pub mod persistence;
pub mod transfer;
pub mod workflow;
