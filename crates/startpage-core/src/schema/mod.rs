//! Serialized document schema.
//!
//! A single JSON document format is used for the storage slot and for export
//! files.  [`codec`] handles encoding, decoding, and migration of the older
//! shapes.

pub mod codec;
