//! Persistence adapter: keeps the durable storage slot in step with the store.
//!
//! The durable slot is modelled after browser local storage: an origin-scoped
//! key/value store holding text.  [`KeyValueStore`] abstracts it so the use
//! cases can be tested without touching the disk; the file-backed and
//! in-memory implementations live in `infrastructure::storage::slot`.
//!
//! # Keys
//!
//! - [`SLOT_KEY`] holds the current v2 document.
//! - [`LEGACY_SLOT_KEY`] is where the first release kept a bare category list.
//!   It is only read, and only when [`SLOT_KEY`] is absent.  The legacy value
//!   is never overwritten or removed; the next write-through simply creates
//!   [`SLOT_KEY`].

use startpage_core::{decode, encode, Configuration, SchemaError, SchemaShape};
use thiserror::Error;
use tracing::{debug, info};

/// Key of the current configuration document.
pub const SLOT_KEY: &str = "startpage";

/// Key used by the first release.
pub const LEGACY_SLOT_KEY: &str = "categories";

/// Errors reported by a [`KeyValueStore`] implementation.
#[derive(Debug, Error)]
pub enum SlotError {
    /// Writing the value would exceed the storage quota; nothing was written.
    #[error("storage quota exceeded: {needed} bytes needed, {quota} bytes allowed")]
    QuotaExceeded { needed: u64, quota: u64 },

    /// The storage mechanism cannot be used at all (missing, disabled, or not
    /// readable/writable).
    #[error("storage unavailable at {location}: {source}")]
    Unavailable {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// An origin-scoped, durable key/value slot holding text values.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send {
    /// Returns the value stored under `key`, or `None` if the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, SlotError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        (**self).set_item(key, value)
    }
}

/// Error type for [`save`] and [`load`].
#[derive(Debug, Error)]
pub enum PersistError {
    /// The slot is full; the in-memory configuration is unaffected.
    #[error("your changes couldn't be saved: {0}")]
    QuotaExceeded(#[source] SlotError),

    /// The slot cannot be used (disabled by policy, unreadable, ...).
    #[error("storage is unavailable: {0}")]
    StorageUnavailable(#[source] SlotError),

    /// The slot holds text that is not a configuration document.
    #[error("stored configuration is corrupt: {0}")]
    CorruptData(#[source] SchemaError),

    /// The configuration could not be encoded.
    #[error("configuration could not be serialized: {0}")]
    Serialize(#[source] SchemaError),
}

impl From<SlotError> for PersistError {
    fn from(e: SlotError) -> Self {
        match e {
            SlotError::QuotaExceeded { .. } => PersistError::QuotaExceeded(e),
            SlotError::Unavailable { .. } => PersistError::StorageUnavailable(e),
        }
    }
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Nothing stored yet; the default configuration was used.
    Empty,
    /// Read from `key`, which held a document of the given shape.
    Stored {
        key: &'static str,
        shape: SchemaShape,
    },
}

/// Result of [`load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub config: Configuration,
    pub hydration: Hydration,
}

/// Serializes the whole configuration into the slot.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// [`PersistError::QuotaExceeded`] / [`PersistError::StorageUnavailable`] for
/// slot failures and [`PersistError::Serialize`] if encoding fails.
pub fn save<S: KeyValueStore + ?Sized>(
    slot: &mut S,
    config: &Configuration,
) -> Result<usize, PersistError> {
    let text = encode(config).map_err(PersistError::Serialize)?;
    slot.set_item(SLOT_KEY, &text)?;
    debug!(
        bytes = text.len(),
        categories = config.categories.len(),
        "configuration saved"
    );
    Ok(text.len())
}

/// Reads the configuration from the slot.
///
/// An empty slot is not an error: the default configuration is returned.
///
/// # Errors
///
/// [`PersistError::StorageUnavailable`] if the slot cannot be read and
/// [`PersistError::CorruptData`] if it holds something that does not decode.
pub fn load<S: KeyValueStore + ?Sized>(slot: &S) -> Result<Loaded, PersistError> {
    for key in [SLOT_KEY, LEGACY_SLOT_KEY] {
        let Some(text) = slot.get_item(key)? else {
            continue;
        };
        let decoded = decode(&text).map_err(PersistError::CorruptData)?;
        if key == LEGACY_SLOT_KEY || decoded.shape.was_migrated() {
            info!(
                key,
                shape = ?decoded.shape,
                "migrating stored configuration; it will be rewritten on the next change"
            );
        }
        return Ok(Loaded {
            config: decoded.config,
            hydration: Hydration::Stored {
                key,
                shape: decoded.shape,
            },
        });
    }

    debug!("storage slot empty, starting with default configuration");
    Ok(Loaded {
        config: Configuration::default(),
        hydration: Hydration::Empty,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use startpage_core::{DesignSettings, IdAllocation};
    use std::io;

    fn unavailable() -> SlotError {
        SlotError::Unavailable {
            location: "test".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "disabled by policy"),
        }
    }

    fn sample() -> Configuration {
        let mut cfg = Configuration::new();
        cfg.add_category("Work", IdAllocation::LastElement).unwrap();
        cfg
    }

    #[test]
    fn test_load_empty_slot_returns_default_configuration() {
        // Arrange
        let mut slot = MockKeyValueStore::new();
        slot.expect_get_item().times(2).returning(|_| Ok(None));

        // Act
        let loaded = load(&slot).expect("empty slot is not an error");

        // Assert
        assert_eq!(loaded.hydration, Hydration::Empty);
        assert!(loaded.config.categories.is_empty());
        assert_eq!(loaded.config.design, DesignSettings::default());
    }

    #[test]
    fn test_load_reads_current_key_first() {
        let text = encode(&sample()).unwrap();
        let mut slot = MockKeyValueStore::new();
        slot.expect_get_item().times(1).returning(move |key| {
            assert_eq!(key, SLOT_KEY);
            Ok(Some(text.clone()))
        });

        let loaded = load(&slot).unwrap();

        assert_eq!(loaded.config, sample());
        assert_eq!(
            loaded.hydration,
            Hydration::Stored {
                key: SLOT_KEY,
                shape: SchemaShape::Versioned(2)
            }
        );
    }

    #[test]
    fn test_load_falls_back_to_legacy_key() {
        let mut slot = MockKeyValueStore::new();
        slot.expect_get_item().returning(|key| {
            if key == LEGACY_SLOT_KEY {
                Ok(Some(r#"[{"id":1,"name":"Work","urls":[]}]"#.to_string()))
            } else {
                Ok(None)
            }
        });

        let loaded = load(&slot).unwrap();

        assert_eq!(loaded.config, sample());
        assert_eq!(
            loaded.hydration,
            Hydration::Stored {
                key: LEGACY_SLOT_KEY,
                shape: SchemaShape::LegacyList
            }
        );
    }

    #[test]
    fn test_load_corrupt_data_is_reported() {
        let mut slot = MockKeyValueStore::new();
        slot.expect_get_item()
            .returning(|_| Ok(Some("{{ definitely not json".to_string())));

        let result = load(&slot);

        assert!(matches!(result, Err(PersistError::CorruptData(_))));
    }

    #[test]
    fn test_load_unavailable_storage_is_reported() {
        let mut slot = MockKeyValueStore::new();
        slot.expect_get_item().returning(|_| Err(unavailable()));

        let result = load(&slot);

        assert!(matches!(result, Err(PersistError::StorageUnavailable(_))));
    }

    #[test]
    fn test_save_writes_encoded_document_under_slot_key() {
        // Arrange
        let expected = encode(&sample()).unwrap();
        let expected_len = expected.len();
        let mut slot = MockKeyValueStore::new();
        slot.expect_set_item().times(1).returning(move |key, value| {
            assert_eq!(key, SLOT_KEY);
            assert_eq!(value, expected);
            Ok(())
        });

        // Act
        let written = save(&mut slot, &sample()).unwrap();

        // Assert
        assert_eq!(written, expected_len);
    }

    #[test]
    fn test_save_maps_quota_exceeded() {
        let mut slot = MockKeyValueStore::new();
        slot.expect_set_item()
            .returning(|_, _| Err(SlotError::QuotaExceeded { needed: 10, quota: 5 }));

        let result = save(&mut slot, &sample());

        assert!(matches!(result, Err(PersistError::QuotaExceeded(_))));
    }

    #[test]
    fn test_save_maps_unavailable_storage() {
        let mut slot = MockKeyValueStore::new();
        slot.expect_set_item().returning(|_, _| Err(unavailable()));

        let result = save(&mut slot, &sample());

        assert!(matches!(result, Err(PersistError::StorageUnavailable(_))));
    }

    #[test]
    fn test_boxed_store_delegates_to_inner_store() {
        let mut inner = MockKeyValueStore::new();
        inner.expect_get_item().returning(|_| Ok(None));
        let boxed: Box<dyn KeyValueStore> = Box::new(inner);

        assert!(boxed.get_item(SLOT_KEY).unwrap().is_none());
    }
}
