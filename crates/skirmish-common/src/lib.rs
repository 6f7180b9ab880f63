//! # Skirmish Common
//!
//! Common types shared by the Skirmish combat core and its drivers.
//!
//! This crate provides:
//! - ID types (`EntityId`, `Lifetime`, `EquipmentId`)
//! - Planar geometry helpers over `glam::Vec2`
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
    }

    #[test]
    fn test_lifetime_matches_generation() {
        let id = EntityId::new();
        let first = Lifetime::new(id, 1);
        let second = first.next();
        assert_eq!(second.entity, id);
        assert!(!first.is_same_life(second));
        assert!(second.is_same_life(Lifetime::new(id, 2)));
    }

    #[test]
    fn test_planar_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert!((distance(a, b) - 5.0).abs() < 1e-6);
    }
}
