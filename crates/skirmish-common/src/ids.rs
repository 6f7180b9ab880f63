//! ID types for entities and catalog resources.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for entity IDs.
static ENTITY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an entity in the arena.
///
/// Pooled entities keep their id when they are reused; use [`Lifetime`] to
/// tell one life of a pooled entity from the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new unique entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(ENTITY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an entity ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) entity ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One life of an entity: its id plus the spawn generation.
///
/// Every spawn (including reuse from a pool) bumps the generation, so a
/// delayed routine tagged with an older lifetime can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lifetime {
    /// Entity this lifetime belongs to.
    pub entity: EntityId,
    /// Spawn generation.
    pub generation: u32,
}

impl Lifetime {
    /// Creates a lifetime tag.
    #[must_use]
    pub const fn new(entity: EntityId, generation: u32) -> Self {
        Self { entity, generation }
    }

    /// Returns the lifetime of the next spawn of the same entity.
    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            entity: self.entity,
            generation: self.generation.wrapping_add(1),
        }
    }

    /// Checks whether both tags refer to the same life of the same entity.
    #[must_use]
    pub fn is_same_life(self, other: Self) -> bool {
        self == other
    }
}

/// Identifier of an equipment template in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EquipmentId(u32);

impl EquipmentId {
    /// Creates an equipment ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}
