//! Arena handles for import tree nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an import item inside its batch arena.
///
/// Handles are indices into the arena. A batch only ever appends, so a
/// handle is never reused for a different item while the batch lives; a
/// new batch starts again from zero.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u32);

impl ItemId {
    /// Create a handle from an arena index
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Arena index of this handle
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
