//! The world as seen by a combat entity.
//!
//! Entities never hold references to each other or to the arena. Every
//! interaction (damage, routines, effects, notifications) goes through a
//! [`CombatWorld`] passed into the entity's hooks.

use serde::{Deserialize, Serialize};
use skirmish_common::{EntityId, Lifetime, Vec2};

use crate::config::ArenaConfig;
use crate::events::CombatEvent;
use crate::living::{DamageMessage, DamageOutcome};
use crate::projectile::EffectKind;
use crate::scheduler::{TaskId, Wake};
use crate::targeting::{Layer, TargetProvider};

/// Multi-tick routines an entity can schedule for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRoutine {
    /// Move one step of a Phantom Blade dash.
    DashStep,
    /// Leave the Skill state after a cast.
    FinishCast,
}

/// Parameters of a projectile to launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    /// Who fires it
    pub owner: EntityId,
    /// Visual effect
    pub effect: EffectKind,
    /// Launch point
    pub origin: Vec2,
    /// Unit direction
    pub direction: Vec2,
    /// Units per second
    pub speed: f32,
    /// Travel limit
    pub max_distance: f32,
    /// Explosion radius, if it explodes
    pub impact_radius: Option<f32>,
    /// Damage on impact
    pub damage: DamageMessage,
    /// Layer it can hit
    pub target_layer: Layer,
}

/// Everything an entity may ask of its surroundings.
pub trait CombatWorld: TargetProvider {
    /// Simulation time.
    fn now(&self) -> f64;

    /// Length of the current tick.
    fn frame_dt(&self) -> f32;

    /// Whether the game is running and not paused.
    fn is_playing(&self) -> bool;

    /// Arena tuning.
    fn config(&self) -> &ArenaConfig;

    /// Sends a damage message to another entity.
    fn deliver_damage(&mut self, target: EntityId, msg: DamageMessage) -> DamageOutcome;

    /// Schedules a routine bound to one life of an entity.
    fn schedule(&mut self, owner: Lifetime, wake: Wake, routine: EntityRoutine) -> TaskId;

    /// Cancels every routine owned by an entity.
    fn cancel_routines(&mut self, entity: EntityId) -> usize;

    /// Fires a projectile.
    fn launch_projectile(&mut self, launch: ProjectileLaunch);

    /// Plays a one-shot effect.
    fn spawn_effect(&mut self, kind: EffectKind, at: Vec2, facing: Vec2);

    /// Publishes a notification.
    fn publish(&self, event: CombatEvent);
}
