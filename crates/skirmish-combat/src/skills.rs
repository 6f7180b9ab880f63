//! Active skills, cooldowns and skill levels.
//!
//! This module provides:
//! - Skill templates (cooldown, impact, projectile parameters)
//! - Per-slot cooldown tracking with a shared cast lockout
//! - Skill levels and effect amounts bought with Karma
//!
//! Casting itself lives on the entity, which owns a [`SkillController`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Skill system error types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkillError {
    /// No skill in that slot
    #[error("no skill in slot {0}")]
    UnknownSlot(usize),
    /// Slot still cooling down
    #[error("skill on cooldown: {remaining}s remaining")]
    OnCooldown {
        /// Time remaining in seconds
        remaining: f32,
    },
    /// Another skill was cast too recently
    #[error("cast lockout: {remaining}s remaining")]
    CastLockout {
        /// Time remaining in seconds
        remaining: f32,
    },
    /// Skill needs a target and there is none
    #[error("no valid target")]
    NoTarget,
    /// Ranged skill target is outside the viewport
    #[error("target is off screen")]
    TargetOffScreen,
    /// Caster is dead or not in play
    #[error("caster cannot act")]
    CasterDead,
    /// Caster is already casting
    #[error("caster is busy casting")]
    Busy,
    /// Simulation is paused or stopped
    #[error("game is not running")]
    NotPlaying,
}

/// Result type for skill operations.
pub type SkillResult<T> = Result<T, SkillError>;

/// The player's active skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    /// Dash to the target and strike it.
    PhantomBlade,
    /// Exploding projectile.
    FireBall,
    /// Self heal.
    Recovery,
}

/// What a skill needs before it can be cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillTargeting {
    /// No target needed.
    SelfOnly,
    /// A valid target, reached by dashing if necessary.
    EnemyMelee,
    /// A valid target inside the viewport.
    EnemyRanged,
}

impl SkillKind {
    /// Every skill, in slot order.
    pub const ALL: [Self; 3] = [Self::PhantomBlade, Self::FireBall, Self::Recovery];

    /// Slot index of this skill.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::PhantomBlade => 0,
            Self::FireBall => 1,
            Self::Recovery => 2,
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::PhantomBlade => "Phantom Blade",
            Self::FireBall => "Fire Ball",
            Self::Recovery => "Recovery",
        }
    }

    /// Cast precondition.
    #[must_use]
    pub const fn targeting(self) -> SkillTargeting {
        match self {
            Self::PhantomBlade => SkillTargeting::EnemyMelee,
            Self::FireBall => SkillTargeting::EnemyRanged,
            Self::Recovery => SkillTargeting::SelfOnly,
        }
    }

    /// Effect amount gained per skill level.
    #[must_use]
    pub const fn upgrade_step(self) -> i32 {
        match self {
            Self::PhantomBlade => 50,
            Self::FireBall => 10,
            Self::Recovery => 30,
        }
    }
}

/// Static description of a skill.
///
/// For damage skills `impact_amount` is a percentage bonus over attack
/// power; for Recovery it is the amount healed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTemplate {
    /// Skill
    pub kind: SkillKind,
    /// Seconds between casts
    pub cool_down: f32,
    /// Base effect amount
    pub impact_amount: i32,
    /// Damages everything inside `impact_radius`
    pub is_area_effect: bool,
    /// Travels as a projectile
    pub is_projectile: bool,
    /// Projectile speed
    pub projectile_speed: f32,
    /// Projectile travel limit
    pub projectile_range: f32,
    /// Explosion radius
    pub impact_radius: f32,
}

impl SkillTemplate {
    /// Default template for a skill.
    #[must_use]
    pub fn default_for(kind: SkillKind) -> Self {
        match kind {
            SkillKind::PhantomBlade => Self {
                kind,
                cool_down: 5.0,
                impact_amount: 100,
                is_area_effect: false,
                is_projectile: false,
                projectile_speed: 0.0,
                projectile_range: 0.0,
                impact_radius: 0.0,
            },
            SkillKind::FireBall => Self {
                kind,
                cool_down: 8.0,
                impact_amount: 50,
                is_area_effect: true,
                is_projectile: true,
                projectile_speed: 15.0,
                projectile_range: 20.0,
                impact_radius: 3.0,
            },
            SkillKind::Recovery => Self {
                kind,
                cool_down: 15.0,
                impact_amount: 30,
                is_area_effect: false,
                is_projectile: false,
                projectile_speed: 0.0,
                projectile_range: 0.0,
                impact_radius: 0.0,
            },
        }
    }

    /// Sets the cooldown.
    #[must_use]
    pub fn with_cool_down(mut self, cool_down: f32) -> Self {
        self.cool_down = cool_down;
        self
    }
}

/// Skill damage: attack power raised by `effect_percent` percent, floored.
#[must_use]
pub fn skill_damage(attack_power: i32, effect_percent: i32) -> i32 {
    let raw = i64::from(attack_power.max(0)) * (100 + i64::from(effect_percent));
    let damage = raw.div_euclid(100).max(0);
    i32::try_from(damage).unwrap_or(i32::MAX)
}

// ============================================================================
// Skill levels
// ============================================================================

/// Skill levels and their current effect amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillLevels {
    levels: [u32; 3],
    effect_amounts: [i32; 3],
    max_level: u32,
}

impl SkillLevels {
    /// Level-1 skills with the templates' base effect amounts.
    #[must_use]
    pub fn from_templates(templates: &[SkillTemplate], max_level: u32) -> Self {
        let mut effect_amounts = [0; 3];
        for kind in SkillKind::ALL {
            effect_amounts[kind.index()] = templates
                .iter()
                .find(|t| t.kind == kind)
                .map_or_else(|| SkillTemplate::default_for(kind).impact_amount, |t| t.impact_amount);
        }
        Self {
            levels: [1; 3],
            effect_amounts,
            max_level: max_level.max(1),
        }
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self, kind: SkillKind) -> u32 {
        self.levels[kind.index()]
    }

    /// Current effect amount.
    #[must_use]
    pub const fn effect_amount(&self, kind: SkillKind) -> i32 {
        self.effect_amounts[kind.index()]
    }

    /// Whether another level can be bought.
    #[must_use]
    pub const fn can_upgrade(&self, kind: SkillKind) -> bool {
        self.levels[kind.index()] < self.max_level
    }

    /// Raises the level by one. Returns the new effect amount, or `None` at max level.
    pub fn upgrade(&mut self, kind: SkillKind) -> Option<i32> {
        if !self.can_upgrade(kind) {
            return None;
        }
        let i = kind.index();
        self.levels[i] += 1;
        self.effect_amounts[i] = self.effect_amounts[i].saturating_add(kind.upgrade_step());
        Some(self.effect_amounts[i])
    }
}

// ============================================================================
// Cooldowns
// ============================================================================

/// One skill and its cooldown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillSlot {
    template: SkillTemplate,
    remaining: f32,
}

impl SkillSlot {
    /// A ready slot.
    #[must_use]
    pub const fn new(template: SkillTemplate) -> Self {
        Self {
            template,
            remaining: 0.0,
        }
    }

    /// The skill in this slot.
    #[must_use]
    pub const fn template(&self) -> &SkillTemplate {
        &self.template
    }

    /// Seconds until ready.
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Whether the slot can be cast.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Fraction of the cooldown still to go, for cooldown overlays.
    #[must_use]
    pub fn cooldown_fraction(&self) -> f32 {
        if self.template.cool_down <= 0.0 {
            0.0
        } else {
            (self.remaining / self.template.cool_down).clamp(0.0, 1.0)
        }
    }

    fn start(&mut self) {
        self.remaining = self.template.cool_down.max(0.0);
    }

    /// Counts down. Returns true on the tick the slot becomes ready.
    fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            true
        } else {
            false
        }
    }
}

/// Cooldowns, lockout, auto-cast flag and skill levels of a caster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillController {
    slots: Vec<SkillSlot>,
    levels: SkillLevels,
    lockout: f32,
    lockout_remaining: f32,
    auto_cast: bool,
}

impl SkillController {
    /// Creates a controller with one slot per template, in the given order.
    #[must_use]
    pub fn new(templates: Vec<SkillTemplate>, lockout: f32, max_level: u32) -> Self {
        let levels = SkillLevels::from_templates(&templates, max_level);
        Self {
            slots: templates.into_iter().map(SkillSlot::new).collect(),
            levels,
            lockout: lockout.max(0.0),
            lockout_remaining: 0.0,
            auto_cast: false,
        }
    }

    /// All slots.
    #[must_use]
    pub fn slots(&self) -> &[SkillSlot] {
        &self.slots
    }

    /// One slot.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&SkillSlot> {
        self.slots.get(index)
    }

    /// Slot holding `kind`.
    #[must_use]
    pub fn slot_of(&self, kind: SkillKind) -> Option<usize> {
        self.slots.iter().position(|s| s.template.kind == kind)
    }

    /// Skill levels.
    #[must_use]
    pub const fn levels(&self) -> &SkillLevels {
        &self.levels
    }

    /// Mutable skill levels.
    pub fn levels_mut(&mut self) -> &mut SkillLevels {
        &mut self.levels
    }

    /// Whether ready skills fire on their own.
    #[must_use]
    pub const fn auto_cast(&self) -> bool {
        self.auto_cast
    }

    /// Turns auto-cast on or off.
    pub fn set_auto_cast(&mut self, enabled: bool) {
        self.auto_cast = enabled;
    }

    /// Seconds until any skill may be cast again.
    #[must_use]
    pub const fn lockout_remaining(&self) -> f32 {
        self.lockout_remaining
    }

    /// Checks cooldown and lockout for a slot.
    pub fn check(&self, index: usize) -> SkillResult<&SkillTemplate> {
        let slot = self.slots.get(index).ok_or(SkillError::UnknownSlot(index))?;
        if !slot.is_ready() {
            return Err(SkillError::OnCooldown {
                remaining: slot.remaining,
            });
        }
        if self.lockout_remaining > 0.0 {
            return Err(SkillError::CastLockout {
                remaining: self.lockout_remaining,
            });
        }
        Ok(&slot.template)
    }

    /// Starts the slot's cooldown and the shared lockout.
    pub fn commit(&mut self, index: usize) -> SkillResult<()> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SkillError::UnknownSlot(index))?;
        slot.start();
        self.lockout_remaining = self.lockout;
        Ok(())
    }

    /// Counts every cooldown down. Returns the slots that just became ready.
    pub fn tick(&mut self, dt: f32) -> Vec<usize> {
        let dt = dt.max(0.0);
        self.lockout_remaining = (self.lockout_remaining - dt).max(0.0);
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.tick(dt).then_some(i))
            .collect()
    }

    /// Slots that are off cooldown.
    #[must_use]
    pub fn ready_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.is_ready().then_some(i))
            .collect()
    }

    /// Clears every cooldown and the lockout.
    pub fn reset_cooldowns(&mut self) {
        for slot in &mut self.slots {
            slot.remaining = 0.0;
        }
        self.lockout_remaining = 0.0;
    }
}
