//! TOML-based application settings.
//!
//! Reads `AppSettings` from the platform-appropriate settings file:
//! - Windows:  `%APPDATA%\StartPage\settings.toml`
//! - Linux:    `~/.config/startpage/settings.toml`
//! - macOS:    `~/Library/Application Support/StartPage/settings.toml`
//!
//! ```toml
//! log_level = "warn"
//!
//! [storage]
//! origin = "default"
//! data_dir = "/home/me/.local/share/startpage"
//! quota_bytes = 5242880
//!
//! [identity]
//! allocation = "last-element"   # or "max"
//! ```
//!
//! Every field has a default, so a missing file, a missing section, or a
//! missing key all fall back to the values below.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use startpage_core::IdAllocation;
use thiserror::Error;

/// Default storage quota: 5 MiB, the common browser local-storage budget.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Settings schema types ─────────────────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub identity: IdentitySettings,
}

/// Where and how the configuration slot is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Namespace for the slot, one directory per origin.
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Overrides the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Maximum total bytes stored for the origin, summed over every key
    /// (the legacy slot included); `0` disables the check.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdentitySettings {
    #[serde(default)]
    pub allocation: IdAllocation,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "warn".to_string()
}
fn default_origin() -> String {
    "default".to_string()
}
fn default_quota_bytes() -> u64 {
    DEFAULT_QUOTA_BYTES
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            storage: StorageSettings::default(),
            identity: IdentitySettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            data_dir: None,
            quota_bytes: default_quota_bytes(),
        }
    }
}

impl StorageSettings {
    /// The quota to enforce, `None` when disabled.
    pub fn quota(&self) -> Option<u64> {
        (self.quota_bytes > 0).then_some(self.quota_bytes)
    }

    /// The explicit `data_dir`, or `data/` inside the platform config dir.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoPlatformConfigDir`] if no override is set
    /// and the platform directory cannot be determined.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, SettingsError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("data")),
        }
    }
}

// ── Settings repository ───────────────────────────────────────────────────────

/// Determines the platform-appropriate settings directory.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, SettingsError> {
    platform_config_dir().ok_or(SettingsError::NoPlatformConfigDir)
}

/// Resolves the full path to the default settings file.
///
/// # Errors
///
/// Returns [`SettingsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn settings_file_path() -> Result<PathBuf, SettingsError> {
    Ok(config_dir()?.join("settings.toml"))
}

/// Loads settings from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for file-system errors other than "not found",
/// and [`SettingsError::Parse`] if the TOML is malformed.
pub fn load_settings_from(path: &Path) -> Result<AppSettings, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppSettings::default()),
        Err(source) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads settings from `path` if given, otherwise from [`settings_file_path`].
///
/// With no explicit path and no platform directory, defaults are returned.
///
/// # Errors
///
/// See [`load_settings_from`].
pub fn load_settings(path: Option<&Path>) -> Result<AppSettings, SettingsError> {
    match path {
        Some(path) => load_settings_from(path),
        None => match settings_file_path() {
            Ok(path) => load_settings_from(&path),
            Err(SettingsError::NoPlatformConfigDir) => Ok(AppSettings::default()),
            Err(e) => Err(e),
        },
    }
}

/// Resolves the platform config base directory including the `StartPage`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("StartPage"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("startpage"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("StartPage")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
