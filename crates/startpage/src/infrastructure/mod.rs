//! Infrastructure layer.
//!
//! Contains the OS-facing adapters: file-backed storage slots and settings,
//! the terminal prompter, file reading/writing, and the UI command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `startpage_core`, but MUST NOT be imported by the `application` layer.

pub mod file_io;
pub mod prompt;
pub mod storage;
pub mod ui_bridge;
