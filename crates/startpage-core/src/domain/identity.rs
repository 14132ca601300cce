//! Identity allocation for categories and URL entries.
//!
//! Ids are plain integers starting at 1.  Categories draw from one sequence
//! for the whole configuration; URL entries draw from a separate sequence
//! per owning category, so two categories may both contain a URL with id 1.
//!
//! # Allocation policies
//!
//! Two schemes are supported:
//!
//! - [`IdAllocation::LastElement`] looks only at the **last** entry of the
//!   sequence and returns its id plus one.  This is what every stored
//!   configuration so far was produced with, so it is the default.
//! - [`IdAllocation::Max`] scans the whole sequence and returns the largest id
//!   plus one.  It never collides, even when entries were reordered by hand in
//!   an imported file.
//!
//! ```text
//! ids: [1, 5, 3]
//!   LastElement -> 4   (collides once 4 is taken later)
//!   Max         -> 6
//! ```

use serde::{Deserialize, Serialize};

/// Anything that carries an integer id inside an ordered sequence.
pub trait Identified {
    fn id(&self) -> u32;
}

/// Strategy used to pick the next id for a new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdAllocation {
    /// `id(last) + 1`, or `1` for an empty sequence.
    #[default]
    LastElement,
    /// `max(ids) + 1`, or `1` for an empty sequence.
    Max,
}

impl IdAllocation {
    /// Returns the id the next appended entry should receive.
    ///
    /// Saturates at `u32::MAX` rather than wrapping.
    pub fn next_id<T: Identified>(self, entries: &[T]) -> u32 {
        let base = match self {
            IdAllocation::LastElement => entries.last().map(Identified::id),
            IdAllocation::Max => entries.iter().map(Identified::id).max(),
        };
        base.map_or(1, |id| id.saturating_add(1))
    }
}
