//! Domain primitives for the recipe pipeline.
//!
//! Recipe identifiers are opaque strings: transient recipes carry a
//! process-unique temporary id until the cache writer assigns a persistent
//! one. Id generation sits behind [`IdAllocator`] so uniqueness guarantees
//! are explicit and swappable in tests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a recipe.
///
/// Wraps the string form used both for temporary (pre-persistence) and
/// persistent ids, preventing mixups with user ids and name hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id was minted by [`IdAllocator::temp_id`] and has not
    /// yet been replaced by a persistent one.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecipeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecipeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

const TEMP_ID_PREFIX: &str = "tmp-";

/// Capability for minting recipe identifiers.
///
/// Injected into the generator client and the cache writer so tests can
/// substitute a deterministic allocator.
pub trait IdAllocator: Send + Sync {
    /// A process-unique placeholder id for a recipe that has not been
    /// persisted yet.
    fn temp_id(&self) -> RecipeId;

    /// A persistent id assigned at cache-write time.
    fn recipe_id(&self) -> RecipeId;
}

/// UUIDv4-backed [`IdAllocator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn temp_id(&self) -> RecipeId {
        RecipeId::new(format!("{TEMP_ID_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    fn recipe_id(&self) -> RecipeId {
        RecipeId::new(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_ids_are_marked_temporary() {
        let alloc = UuidAllocator;
        let id = alloc.temp_id();
        assert!(id.is_temporary());
        assert!(!alloc.recipe_id().is_temporary());
    }

    #[test]
    fn temp_ids_are_unique() {
        let alloc = UuidAllocator;
        assert_ne!(alloc.temp_id(), alloc.temp_id());
    }

    #[test]
    fn recipe_id_serializes_transparently() {
        let id = RecipeId::new("abc-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc-123\"");
        let back: RecipeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
