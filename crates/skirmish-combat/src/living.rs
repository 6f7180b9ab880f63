//! Health, damage intake and death.
//!
//! A [`LivingEntity`] owns the health pool of anything that can be hit. It
//! enforces three rules on every damage message:
//! - dead entities ignore damage
//! - hits closer together than `min_hit_interval` are dropped
//! - health never leaves `[0, max]`, and death is reported exactly once

use serde::{Deserialize, Serialize};
use skirmish_common::{EntityId, Vec2};

/// A request to hurt something.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageMessage {
    /// Who dealt the damage, if anyone.
    pub source: Option<EntityId>,
    /// Amount of health to remove.
    pub amount: i32,
    /// Contact point on the floor, for hit effects.
    pub hit_point: Option<Vec2>,
}

impl DamageMessage {
    /// Creates a damage message from a source.
    #[must_use]
    pub const fn new(source: Option<EntityId>, amount: i32) -> Self {
        Self {
            source,
            amount,
            hit_point: None,
        }
    }

    /// Damage with no attributable source.
    #[must_use]
    pub const fn environmental(amount: i32) -> Self {
        Self::new(None, amount)
    }

    /// Sets the contact point.
    #[must_use]
    pub const fn with_hit_point(mut self, point: Vec2) -> Self {
        self.hit_point = Some(point);
        self
    }
}

/// Why a damage message was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageRejection {
    /// The target is already dead.
    AlreadyDead,
    /// The target was hit too recently.
    Invulnerable,
    /// The target is not in play (pooled or missing).
    Inactive,
}

/// Result of applying a damage message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Nothing changed.
    Ignored(DamageRejection),
    /// Damage applied, target still alive.
    Wounded {
        /// Health left after the hit.
        remaining: i32,
    },
    /// This hit killed the target.
    Killed,
}

impl DamageOutcome {
    /// Whether the hit was applied.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        !matches!(self, Self::Ignored(_))
    }

    /// Whether the hit killed the target.
    #[must_use]
    pub const fn is_kill(self) -> bool {
        matches!(self, Self::Killed)
    }
}

/// Anything that accepts damage messages.
pub trait DamageTarget {
    /// Applies a damage message at simulation time `now`.
    fn apply_damage(&mut self, msg: &DamageMessage, now: f64) -> DamageOutcome;

    /// Whether the target is dead.
    fn is_dead(&self) -> bool;
}

/// Health pool with hit invulnerability and a death latch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivingEntity {
    max_health: i32,
    current_health: i32,
    dead: bool,
    last_damaged_at: Option<f64>,
    min_hit_interval: f32,
}

impl LivingEntity {
    /// Creates a living entity at full health.
    #[must_use]
    pub fn new(max_health: i32, min_hit_interval: f32) -> Self {
        let max_health = max_health.max(1);
        Self {
            max_health,
            current_health: max_health,
            dead: false,
            last_damaged_at: None,
            min_hit_interval: min_hit_interval.max(0.0),
        }
    }

    /// Current health.
    #[must_use]
    pub const fn current_health(&self) -> i32 {
        self.current_health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Whether the death latch is set.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Health as a fraction of the maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        self.current_health as f32 / self.max_health as f32
    }

    /// Minimum seconds between accepted hits.
    #[must_use]
    pub const fn min_hit_interval(&self) -> f32 {
        self.min_hit_interval
    }

    /// Time of the last accepted hit.
    #[must_use]
    pub const fn last_damaged_at(&self) -> Option<f64> {
        self.last_damaged_at
    }

    /// Whether a hit arriving at `now` would be accepted.
    #[must_use]
    pub fn can_be_damaged_at(&self, now: f64) -> bool {
        if self.dead {
            return false;
        }
        self.last_damaged_at
            .map_or(true, |last| now >= last + f64::from(self.min_hit_interval))
    }

    /// Revives at full health with a new maximum.
    pub fn reset(&mut self, max_health: i32) {
        self.max_health = max_health.max(1);
        self.current_health = self.max_health;
        self.dead = false;
        self.last_damaged_at = None;
    }

    /// Changes the maximum, clamping current health into the new range.
    pub fn set_max_health(&mut self, max_health: i32) {
        self.max_health = max_health.max(1);
        self.current_health = self.current_health.min(self.max_health);
    }

    /// Heals by `amount`. Returns the new health, or `None` if dead.
    pub fn recover(&mut self, amount: i32) -> Option<i32> {
        if self.dead {
            return None;
        }
        self.current_health = self
            .current_health
            .saturating_add(amount.max(0))
            .min(self.max_health);
        Some(self.current_health)
    }
}

impl DamageTarget for LivingEntity {
    fn apply_damage(&mut self, msg: &DamageMessage, now: f64) -> DamageOutcome {
        if self.dead {
            return DamageOutcome::Ignored(DamageRejection::AlreadyDead);
        }
        if !self.can_be_damaged_at(now) {
            return DamageOutcome::Ignored(DamageRejection::Invulnerable);
        }

        self.last_damaged_at = Some(now);
        self.current_health = self.current_health.saturating_sub(msg.amount.max(0)).max(0);

        if self.current_health == 0 {
            self.dead = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Wounded {
                remaining: self.current_health,
            }
        }
    }

    fn is_dead(&self) -> bool {
        LivingEntity::is_dead(self)
    }
}
