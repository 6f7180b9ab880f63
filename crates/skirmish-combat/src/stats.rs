//! Derived-stat model.
//!
//! This module provides:
//! - Base attributes per archetype (health, attack power, range, cadence, speed)
//! - Equipment and upgrade bonuses layered on top
//! - Designer bounds clamping range, cadence and move speed
//! - Difficulty scaling and permanent upgrade steps

use serde::{Deserialize, Serialize};

/// Health gained per health upgrade level.
pub const HEALTH_UPGRADE_STEP: i32 = 10;
/// Attack power gained per attack upgrade level.
pub const ATTACK_UPGRADE_STEP: i32 = 5;
/// Attack range gained per range upgrade level.
pub const RANGE_UPGRADE_STEP: f32 = 0.01;
/// Attacks per second gained per cadence upgrade level.
pub const CADENCE_UPGRADE_STEP: f32 = 0.001;
/// Move speed gained per speed upgrade level.
pub const SPEED_UPGRADE_STEP: f32 = 0.01;

// ============================================================================
// Stat kinds
// ============================================================================

/// A stat shown to the player or targeted by an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Attack power.
    AttackPower,
    /// Maximum health.
    Health,
    /// Attack range.
    AttackRange,
    /// Attacks per second.
    AttackCadence,
    /// Damage per second (derived, not upgradable).
    Dps,
    /// Movement speed.
    MoveSpeed,
}

impl StatKind {
    /// Stats that can be bought as permanent upgrades.
    pub const UPGRADABLE: [Self; 5] = [
        Self::AttackPower,
        Self::Health,
        Self::AttackRange,
        Self::AttackCadence,
        Self::MoveSpeed,
    ];

    /// Human-readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::AttackPower => "Attack Power",
            Self::Health => "Max Health",
            Self::AttackRange => "Attack Range",
            Self::AttackCadence => "Attack Speed",
            Self::Dps => "DPS",
            Self::MoveSpeed => "Move Speed",
        }
    }

    /// Whether this stat can be upgraded directly.
    #[must_use]
    pub fn is_upgradable(self) -> bool {
        self != Self::Dps
    }

    /// Index into [`Self::UPGRADABLE`], if upgradable.
    #[must_use]
    pub fn upgrade_index(self) -> Option<usize> {
        Self::UPGRADABLE.iter().position(|k| *k == self)
    }
}

// ============================================================================
// Bounds
// ============================================================================

/// Designer-defined minimum and maximum for the clamped stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBounds {
    /// Minimum attack range.
    pub min_attack_range: f32,
    /// Maximum attack range.
    pub max_attack_range: f32,
    /// Minimum attacks per second.
    pub min_attack_cadence: f32,
    /// Maximum attacks per second.
    pub max_attack_cadence: f32,
    /// Minimum move speed.
    pub min_move_speed: f32,
    /// Maximum move speed.
    pub max_move_speed: f32,
}

impl Default for StatBounds {
    fn default() -> Self {
        Self {
            min_attack_range: 0.5,
            max_attack_range: 10.0,
            min_attack_cadence: 0.1,
            max_attack_cadence: 5.0,
            min_move_speed: 0.5,
            max_move_speed: 12.0,
        }
    }
}

impl StatBounds {
    /// Check that every minimum is positive and below its maximum.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min_attack_range > 0.0
            && self.min_attack_range <= self.max_attack_range
            && self.min_attack_cadence > 0.0
            && self.min_attack_cadence <= self.max_attack_cadence
            && self.min_move_speed >= 0.0
            && self.min_move_speed <= self.max_move_speed
    }
}

// ============================================================================
// Stat block
// ============================================================================

/// Base attributes plus bonuses for one entity.
///
/// Each entity owns its own copy, derived from a shared archetype template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBlock {
    /// Base maximum health.
    pub base_health: i32,
    /// Base attack power.
    pub base_attack_power: i32,
    /// Base attack range.
    pub base_attack_range: f32,
    /// Base attacks per second.
    pub base_attack_cadence: f32,
    /// Base move speed.
    pub base_move_speed: f32,
    /// Health bonus (armor).
    pub bonus_health: i32,
    /// Attack power bonus (weapon).
    pub bonus_attack_power: i32,
    /// Attack range bonus.
    pub bonus_attack_range: f32,
    /// Cadence bonus.
    pub bonus_attack_cadence: f32,
    /// Move speed bonus.
    pub bonus_move_speed: f32,
    /// Clamp bounds.
    pub bounds: StatBounds,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            base_health: 100,
            base_attack_power: 10,
            base_attack_range: 1.5,
            base_attack_cadence: 1.0,
            base_move_speed: 3.0,
            bonus_health: 0,
            bonus_attack_power: 0,
            bonus_attack_range: 0.0,
            bonus_attack_cadence: 0.0,
            bonus_move_speed: 0.0,
            bounds: StatBounds::default(),
        }
    }
}

impl StatBlock {
    /// Create a stat block with the given health and attack power.
    #[must_use]
    pub fn new(health: i32, attack_power: i32) -> Self {
        Self {
            base_health: health,
            base_attack_power: attack_power,
            ..Self::default()
        }
    }

    /// Set the base attack range.
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.base_attack_range = range;
        self
    }

    /// Set the base attacks per second.
    #[must_use]
    pub fn with_cadence(mut self, cadence: f32) -> Self {
        self.base_attack_cadence = cadence;
        self
    }

    /// Set the base move speed.
    #[must_use]
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.base_move_speed = speed;
        self
    }

    /// Set the clamp bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: StatBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Effective maximum health (never below 1).
    #[must_use]
    pub fn max_health(&self) -> i32 {
        self.base_health.saturating_add(self.bonus_health).max(1)
    }

    /// Effective attack power (never negative).
    #[must_use]
    pub fn attack_power(&self) -> i32 {
        self.base_attack_power
            .saturating_add(self.bonus_attack_power)
            .max(0)
    }

    /// Effective attack range, clamped to bounds.
    #[must_use]
    pub fn attack_range(&self) -> f32 {
        (self.base_attack_range + self.bonus_attack_range)
            .clamp(self.bounds.min_attack_range, self.bounds.max_attack_range)
    }

    /// Effective attacks per second, clamped to bounds.
    #[must_use]
    pub fn attack_cadence(&self) -> f32 {
        (self.base_attack_cadence + self.bonus_attack_cadence)
            .clamp(self.bounds.min_attack_cadence, self.bounds.max_attack_cadence)
    }

    /// Minimum seconds between attacks.
    #[must_use]
    pub fn attack_interval(&self) -> f32 {
        1.0 / self.attack_cadence().max(f32::EPSILON)
    }

    /// Effective move speed, clamped to bounds.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        (self.base_move_speed + self.bonus_move_speed)
            .clamp(self.bounds.min_move_speed, self.bounds.max_move_speed)
    }

    /// Damage per second.
    #[must_use]
    pub fn dps(&self) -> f32 {
        self.attack_power() as f32 * self.attack_cadence()
    }

    /// Current value of a stat, as shown in status UIs.
    #[must_use]
    pub fn value(&self, kind: StatKind) -> f32 {
        match kind {
            StatKind::AttackPower => self.attack_power() as f32,
            StatKind::Health => self.max_health() as f32,
            StatKind::AttackRange => self.attack_range(),
            StatKind::AttackCadence => self.attack_cadence(),
            StatKind::Dps => self.dps(),
            StatKind::MoveSpeed => self.move_speed(),
        }
    }

    /// Set the health bonus granted by armor.
    pub fn set_health_bonus(&mut self, amount: i32) {
        self.bonus_health = amount;
    }

    /// Set the attack power bonus granted by a weapon.
    pub fn set_attack_bonus(&mut self, amount: i32) {
        self.bonus_attack_power = amount;
    }

    /// Copy scaled by a difficulty factor.
    ///
    /// Health and attack power are multiplied and rounded; range, cadence and
    /// speed are multiplied and clamped to the archetype bounds. Bonuses are
    /// not carried over.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        let factor = factor.max(0.0);
        let b = self.bounds;
        Self {
            base_health: (self.base_health as f32 * factor).round() as i32,
            base_attack_power: (self.base_attack_power as f32 * factor).round() as i32,
            base_attack_range: (self.base_attack_range * factor)
                .clamp(b.min_attack_range, b.max_attack_range),
            base_attack_cadence: (self.base_attack_cadence * factor)
                .clamp(b.min_attack_cadence, b.max_attack_cadence),
            base_move_speed: (self.base_move_speed * factor)
                .clamp(b.min_move_speed, b.max_move_speed),
            bonus_health: 0,
            bonus_attack_power: 0,
            bonus_attack_range: 0.0,
            bonus_attack_cadence: 0.0,
            bonus_move_speed: 0.0,
            bounds: b,
        }
    }

    /// Apply one permanent upgrade step. Returns false for derived stats.
    pub fn apply_upgrade(&mut self, kind: StatKind) -> bool {
        let b = self.bounds;
        match kind {
            StatKind::AttackPower => {
                self.base_attack_power = self.base_attack_power.saturating_add(ATTACK_UPGRADE_STEP);
            },
            StatKind::Health => {
                self.base_health = self.base_health.saturating_add(HEALTH_UPGRADE_STEP);
            },
            StatKind::AttackRange => {
                self.base_attack_range =
                    (self.base_attack_range + RANGE_UPGRADE_STEP).clamp(0.0, b.max_attack_range);
            },
            StatKind::AttackCadence => {
                self.base_attack_cadence = (self.base_attack_cadence + CADENCE_UPGRADE_STEP)
                    .clamp(0.0, b.max_attack_cadence);
            },
            StatKind::MoveSpeed => {
                self.base_move_speed =
                    (self.base_move_speed + SPEED_UPGRADE_STEP).clamp(0.0, b.max_move_speed);
            },
            StatKind::Dps => return false,
        }
        true
    }

    /// Check that the block can drive an entity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.base_health > 0
            && self.base_attack_power >= 0
            && self.base_attack_cadence > 0.0
            && self.bounds.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dps_is_power_times_cadence() {
        let stats = StatBlock::new(100, 10).with_cadence(2.0);
        assert!((stats.dps() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_bonus_is_summed_without_cap() {
        let mut stats = StatBlock::new(100, 10);
        stats.set_health_bonus(50);
        stats.set_attack_bonus(7);
        assert_eq!(stats.max_health(), 150);
        assert_eq!(stats.attack_power(), 17);
    }

    #[test]
    fn test_range_cadence_speed_are_clamped() {
        let bounds = StatBounds {
            min_attack_range: 1.0,
            max_attack_range: 3.0,
            min_attack_cadence: 0.5,
            max_attack_cadence: 2.0,
            min_move_speed: 1.0,
            max_move_speed: 5.0,
        };
        let stats = StatBlock::new(10, 1)
            .with_range(10.0)
            .with_cadence(0.01)
            .with_move_speed(50.0)
            .with_bounds(bounds);

        assert!((stats.attack_range() - 3.0).abs() < 1e-6);
        assert!((stats.attack_cadence() - 0.5).abs() < 1e-6);
        assert!((stats.move_speed() - 5.0).abs() < 1e-6);
        assert!((stats.attack_interval() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_multiplies_and_clamps() {
        let stats = StatBlock::new(50, 5).with_cadence(4.0);
        let scaled = stats.scaled(1.5);
        assert_eq!(scaled.base_health, 75);
        assert_eq!(scaled.base_attack_power, 8);
        // 4.0 * 1.5 exceeds the default cadence cap of 5.0
        assert!((scaled.base_attack_cadence - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_drops_bonuses() {
        let mut stats = StatBlock::new(50, 5);
        stats.set_attack_bonus(100);
        assert_eq!(stats.scaled(1.0).attack_power(), 5);
    }

    #[test]
    fn test_upgrade_steps() {
        let mut stats = StatBlock::new(100, 10);
        assert!(stats.apply_upgrade(StatKind::AttackPower));
        assert!(stats.apply_upgrade(StatKind::Health));
        assert_eq!(stats.attack_power(), 15);
        assert_eq!(stats.max_health(), 110);
        assert!(!stats.apply_upgrade(StatKind::Dps));
    }

    #[test]
    fn test_upgrade_respects_cap() {
        let mut stats = StatBlock::new(100, 10).with_move_speed(12.0);
        stats.apply_upgrade(StatKind::MoveSpeed);
        assert!((stats.base_move_speed - 12.0).abs() < 1e-6);
    }

    #[test]
    fn test_stat_kind_upgrade_index() {
        assert_eq!(StatKind::AttackPower.upgrade_index(), Some(0));
        assert_eq!(StatKind::Dps.upgrade_index(), None);
        assert!(!StatKind::Dps.is_upgradable());
    }
}
