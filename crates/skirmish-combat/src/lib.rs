//! # Skirmish Combat
//!
//! Combat core for Skirmish.
//!
//! This crate provides the simulation side of a top-down arena fight:
//! - Stats with bounded upgrades and derived DPS
//! - Health with hit invulnerability
//! - A per-entity state machine (Init, Idle, Control, Track, Attack, Skill, Die)
//! - Target acquisition with line of sight
//! - Skills, cooldowns and projectiles
//! - Equipment, currencies, stages and upgrades
//! - An arena that owns entities and drives them tick by tick
//! - Event bus for notifying the presentation layer

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod entity;
pub mod equipment;
pub mod events;
pub mod fsm;
pub mod living;
pub mod progression;
pub mod projectile;
pub mod roster;
pub mod scheduler;
pub mod skills;
pub mod stats;
pub mod targeting;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::arena::*;
    pub use crate::catalog::*;
    pub use crate::clock::*;
    pub use crate::config::*;
    pub use crate::entity::*;
    pub use crate::equipment::*;
    pub use crate::events::*;
    pub use crate::fsm::*;
    pub use crate::living::*;
    pub use crate::progression::*;
    pub use crate::projectile::*;
    pub use crate::roster::*;
    pub use crate::scheduler::*;
    pub use crate::skills::*;
    pub use crate::stats::*;
    pub use crate::targeting::*;
    pub use crate::world::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_common::Vec2;

    #[test]
    fn test_default_catalog_drives_arena() {
        let catalog = Catalog::default();
        assert!(catalog.validate().is_ok());

        let mut arena = Arena::new(ArenaConfig::default(), catalog);
        let player = arena.start_game();
        for _ in 0..80 {
            arena.advance(0.125);
        }
        assert!(arena.entity(player).is_some());
        assert!(arena.is_game_running());
        assert_eq!(arena.progression().deaths, 0);
        assert!(arena.time() > 9.9);
    }

    #[test]
    fn test_wallet_transactions() {
        let mut wallet = Wallet::new(1000);
        wallet.earn(Currency::Gold, 700);

        assert!(wallet.spend(Currency::Gold, 500).is_ok());
        assert_eq!(wallet.balance(Currency::Gold), 200);
        assert!(wallet.spend(Currency::Gold, 500).is_err());
    }

    #[test]
    fn test_event_bus_round_trip() {
        let bus = EventBus::new(16);
        bus.publish(CombatEvent::LevelUp { level: 2 });
        assert_eq!(bus.drain(), vec![CombatEvent::LevelUp { level: 2 }]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_projectile_travel_limit() {
        let mut pool = CountingPool::new();
        let effect = pool.spawn(EffectKind::FireBall, Vec2::ZERO, Vec2::X);
        let mut projectile = Projectile {
            owner: skirmish_common::EntityId::new(),
            effect,
            origin: Vec2::ZERO,
            position: Vec2::ZERO,
            previous: Vec2::ZERO,
            direction: Vec2::X,
            speed: 10.0,
            max_distance: 5.0,
            hit_radius: 0.25,
            impact_radius: None,
            damage: DamageMessage::environmental(1),
            target_layer: Layer::Monster,
        };
        projectile.advance(0.25);
        assert!(!projectile.is_spent());
        projectile.advance(0.5);
        assert!(projectile.is_spent());
    }
}
