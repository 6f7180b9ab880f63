//! Live monster roster.

use serde::{Deserialize, Serialize};
use skirmish_common::EntityId;

/// Monsters currently in play, in spawn order.
///
/// Readers iterate over a [`snapshot`](Self::snapshot), so removals made
/// while a tick walks the roster take effect on the next walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRoster {
    ids: Vec<EntityId>,
}

impl MonsterRoster {
    /// Creates an empty roster.
    #[must_use]
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Adds a monster. Returns false if it was already listed.
    pub fn insert(&mut self, id: EntityId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Removes a monster. Returns false if it was not listed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|m| *m != id);
        self.ids.len() != before
    }

    /// Whether a monster is listed.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    /// Number of monsters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Copy of the current ids.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntityId> {
        self.ids.clone()
    }

    /// Empties the roster, returning what was in it.
    pub fn clear(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.ids)
    }
}
