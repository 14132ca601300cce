//! Concrete [`KeyValueStore`] implementations.
//!
//! - [`FileSlot`]: one JSON text file per key under
//!   `<data_dir>/<origin>/<key>.json`.  Writes go to a temporary file first and
//!   are renamed into place, so a crash mid-write never leaves a truncated
//!   document behind.
//! - [`MemorySlot`]: a `HashMap`, for tests and for running without a disk.
//!
//! Both enforce an optional quota on the total number of bytes stored for the
//! origin, mirroring browser local storage.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::application::persistence::{KeyValueStore, SlotError};

const EXTENSION: &str = "json";

/// Encodes `name` as a file name.
///
/// ASCII letters, digits and `-` are kept; every other byte, `_` included,
/// becomes `_XX` in upper-case hex.  Distinct names always give distinct
/// stems, and no stem contains a path separator or a dot.
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02X}"));
        }
    }
    stem
}

fn check_quota(quota: Option<u64>, others: u64, value: &str) -> Result<(), SlotError> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let needed = others.saturating_add(value.len() as u64);
    if needed > quota {
        return Err(SlotError::QuotaExceeded { needed, quota });
    }
    Ok(())
}

// ── FileSlot ──────────────────────────────────────────────────────────────────

/// File-backed slot scoped to one origin directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
    quota: Option<u64>,
}

impl FileSlot {
    /// Creates a slot rooted at `<data_dir>/<origin>`.
    ///
    /// Nothing is created on disk until the first write.
    pub fn new(data_dir: impl AsRef<Path>, origin: &str, quota: Option<u64>) -> Self {
        Self {
            dir: data_dir.as_ref().join(file_stem(origin)),
            quota,
        }
    }

    /// The origin directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", file_stem(key)))
    }

    fn unavailable(&self, path: &Path, source: io::Error) -> SlotError {
        SlotError::Unavailable {
            location: path.display().to_string(),
            source,
        }
    }

    /// Bytes stored under every key except `key`.
    fn bytes_excluding(&self, key: &str) -> Result<u64, SlotError> {
        let skip = self.path_for(key);
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.unavailable(&self.dir, e)),
        };

        let mut total = 0u64;
        for entry in entries {
            let entry = entry.map_err(|e| self.unavailable(&self.dir, e))?;
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let meta = entry.metadata().map_err(|e| self.unavailable(&path, e))?;
            total = total.saturating_add(meta.len());
        }
        Ok(total)
    }
}

impl KeyValueStore for FileSlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), bytes = text.len(), "slot read");
                Ok(Some(text))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.unavailable(&path, e)),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        if self.quota.is_some() {
            check_quota(self.quota, self.bytes_excluding(key)?, value)?;
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| self.unavailable(&self.dir, e))?;

        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        std::fs::write(&tmp, value).map_err(|e| self.unavailable(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            warn!(path = %tmp.display(), "rename failed, removing temporary file");
            std::fs::remove_file(&tmp).ok();
            return Err(self.unavailable(&path, e));
        }

        debug!(path = %path.display(), bytes = value.len(), "slot written");
        Ok(())
    }
}

// ── MemorySlot ────────────────────────────────────────────────────────────────

/// In-memory slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    items: HashMap<String, String>,
    quota: Option<u64>,
    disabled: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that refuses writes exceeding `quota` bytes in total.
    pub fn with_quota(quota: u64) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// A slot on which every call fails, like storage disabled by policy.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    /// Seeds `key` with `value`, bypassing the quota.
    pub fn with_item(mut self, key: &str, value: impl Into<String>) -> Self {
        self.items.insert(key.to_string(), value.into());
        self
    }

    /// Direct read access for inspection.
    pub fn peek(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    fn check_enabled(&self) -> Result<(), SlotError> {
        if self.disabled {
            return Err(SlotError::Unavailable {
                location: "memory".to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "storage is disabled"),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for MemorySlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, SlotError> {
        self.check_enabled()?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        self.check_enabled()?;
        let others: u64 = self
            .items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len() as u64)
            .sum();
        check_quota(self.quota, others, value)?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_data_dir() -> PathBuf {
        std::env::temp_dir().join(format!("startpage_slot_{}", Uuid::new_v4()))
    }

    // ── FileSlot ──────────────────────────────────────────────────────────────

    #[test]
    fn test_file_slot_missing_key_reads_none() {
        let slot = FileSlot::new(temp_data_dir(), "default", None);
        assert_eq!(slot.get_item("startpage").unwrap(), None);
    }

    #[test]
    fn test_file_slot_write_then_read() {
        // Arrange
        let data_dir = temp_data_dir();
        let mut slot = FileSlot::new(&data_dir, "default", None);

        // Act
        slot.set_item("startpage", r#"{"version":2}"#).unwrap();

        // Assert
        assert_eq!(
            slot.get_item("startpage").unwrap().as_deref(),
            Some(r#"{"version":2}"#)
        );
        assert!(data_dir.join("default").join("startpage.json").is_file());
        assert!(!data_dir.join("default").join("startpage.json.tmp").exists());

        std::fs::remove_dir_all(&data_dir).ok();
    }

    #[test]
    fn test_file_slot_overwrites_previous_value() {
        let data_dir = temp_data_dir();
        let mut slot = FileSlot::new(&data_dir, "default", None);

        slot.set_item("startpage", "first").unwrap();
        slot.set_item("startpage", "second").unwrap();

        assert_eq!(slot.get_item("startpage").unwrap().as_deref(), Some("second"));
        std::fs::remove_dir_all(&data_dir).ok();
    }

    #[test]
    fn test_file_slot_origins_are_isolated() {
        let data_dir = temp_data_dir();
        let mut home = FileSlot::new(&data_dir, "home", None);
        let work = FileSlot::new(&data_dir, "work", None);

        home.set_item("startpage", "home data").unwrap();

        assert_eq!(work.get_item("startpage").unwrap(), None);
        std::fs::remove_dir_all(&data_dir).ok();
    }

    #[test]
    fn test_file_slot_origin_cannot_escape_data_dir() {
        let slot = FileSlot::new("/data", "../etc", None);
        assert_eq!(slot.dir(), Path::new("/data/_2E_2E_2Fetc"));
    }

    #[test]
    fn test_file_slot_similar_origins_do_not_share_a_slot() {
        // Arrange
        let data_dir = temp_data_dir();
        let mut dotted = FileSlot::new(&data_dir, "work.example", None);
        let underscored = FileSlot::new(&data_dir, "work_example", None);
        let slashed = FileSlot::new(&data_dir, "work/example", None);

        // Act
        dotted.set_item("startpage", "dotted data").unwrap();

        // Assert
        assert_eq!(underscored.get_item("startpage").unwrap(), None);
        assert_eq!(slashed.get_item("startpage").unwrap(), None);
        assert_ne!(dotted.dir(), underscored.dir());
        assert_ne!(dotted.dir(), slashed.dir());
        std::fs::remove_dir_all(&data_dir).ok();
    }

    #[test]
    fn test_file_stem_encodes_non_ascii_bytes() {
        assert_ne!(file_stem("café"), file_stem("cafè"));
        assert_eq!(file_stem("café"), "caf_C3_A9");
        assert_eq!(file_stem("default"), "default");
    }

    #[test]
    fn test_file_slot_quota_counts_other_keys() {
        // Arrange
        let data_dir = temp_data_dir();
        let mut slot = FileSlot::new(&data_dir, "default", Some(10));
        slot.set_item("categories", "123456").unwrap();

        // Act
        let result = slot.set_item("startpage", "12345");

        // Assert
        assert!(matches!(
            result,
            Err(SlotError::QuotaExceeded {
                needed: 11,
                quota: 10
            })
        ));
        assert_eq!(slot.get_item("startpage").unwrap(), None);
        std::fs::remove_dir_all(&data_dir).ok();
    }

    #[test]
    fn test_file_slot_quota_ignores_value_being_replaced() {
        let data_dir = temp_data_dir();
        let mut slot = FileSlot::new(&data_dir, "default", Some(8));

        slot.set_item("startpage", "12345678").unwrap();
        let result = slot.set_item("startpage", "87654321");

        assert!(result.is_ok());
        std::fs::remove_dir_all(&data_dir).ok();
    }

    #[test]
    fn test_file_slot_unreadable_entry_is_unavailable() {
        // A directory where the key's file should be cannot be read as text.
        let data_dir = temp_data_dir();
        std::fs::create_dir_all(data_dir.join("default").join("startpage.json")).unwrap();
        let slot = FileSlot::new(&data_dir, "default", None);

        let result = slot.get_item("startpage");

        assert!(matches!(result, Err(SlotError::Unavailable { .. })));
        std::fs::remove_dir_all(&data_dir).ok();
    }

    // ── MemorySlot ────────────────────────────────────────────────────────────

    #[test]
    fn test_memory_slot_round_trip() {
        let mut slot = MemorySlot::new();

        slot.set_item("startpage", "value").unwrap();

        assert_eq!(slot.get_item("startpage").unwrap().as_deref(), Some("value"));
        assert_eq!(slot.peek("startpage"), Some("value"));
    }

    #[test]
    fn test_memory_slot_quota_exceeded_keeps_old_value() {
        let mut slot = MemorySlot::with_quota(4).with_item("startpage", "old");

        let result = slot.set_item("startpage", "too long");

        assert!(matches!(result, Err(SlotError::QuotaExceeded { .. })));
        assert_eq!(slot.peek("startpage"), Some("old"));
    }

    #[test]
    fn test_memory_slot_disabled_fails_reads_and_writes() {
        let mut slot = MemorySlot::disabled();

        assert!(matches!(
            slot.get_item("startpage"),
            Err(SlotError::Unavailable { .. })
        ));
        assert!(matches!(
            slot.set_item("startpage", "x"),
            Err(SlotError::Unavailable { .. })
        ));
    }
}
