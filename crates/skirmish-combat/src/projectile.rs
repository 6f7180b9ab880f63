//! Projectiles and pooled visual effects.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use skirmish_common::{EntityId, Vec2};

use crate::living::DamageMessage;
use crate::targeting::Layer;

/// Pooled visual effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Travelling fire ball.
    FireBall,
    /// Fire ball explosion.
    Explosion,
    /// Phantom blade slash.
    BladeSlash,
    /// Healing glow.
    Recovery,
    /// Monster death burst.
    DeathBurst,
}

/// Handle to a spawned effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle(u64);

impl EffectHandle {
    /// Creates a handle from a raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Spawn and release contract for pooled effects.
///
/// The combat core only asks for effects; rendering them is up to the
/// implementation.
pub trait EffectPool: std::fmt::Debug {
    /// Takes an effect from the pool and places it.
    fn spawn(&mut self, kind: EffectKind, at: Vec2, facing: Vec2) -> EffectHandle;

    /// Returns an effect to the pool after `delay` seconds.
    fn release(&mut self, handle: EffectHandle, delay: f32);

    /// Effects currently out of the pool.
    fn active_count(&self) -> usize;
}

/// Effect pool that only keeps books. Used headless and in tests.
#[derive(Debug, Default)]
pub struct CountingPool {
    next: u64,
    active: AHashMap<EffectHandle, EffectKind>,
    spawned: AHashMap<EffectKind, u32>,
}

impl CountingPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many effects of `kind` were ever spawned.
    #[must_use]
    pub fn spawned(&self, kind: EffectKind) -> u32 {
        self.spawned.get(&kind).copied().unwrap_or(0)
    }
}

impl EffectPool for CountingPool {
    fn spawn(&mut self, kind: EffectKind, _at: Vec2, _facing: Vec2) -> EffectHandle {
        self.next += 1;
        let handle = EffectHandle(self.next);
        self.active.insert(handle, kind);
        *self.spawned.entry(kind).or_insert(0) += 1;
        handle
    }

    fn release(&mut self, handle: EffectHandle, _delay: f32) {
        self.active.remove(&handle);
    }

    fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    /// Who fired it
    pub owner: EntityId,
    /// Visual effect riding along
    pub effect: EffectHandle,
    /// Launch point
    pub origin: Vec2,
    /// Current position
    pub position: Vec2,
    /// Position before the last step
    pub previous: Vec2,
    /// Unit travel direction
    pub direction: Vec2,
    /// Units per second
    pub speed: f32,
    /// Travel limit
    pub max_distance: f32,
    /// Collision radius
    pub hit_radius: f32,
    /// Explosion radius; `None` damages only what it hits
    pub impact_radius: Option<f32>,
    /// Damage dealt on impact
    pub damage: DamageMessage,
    /// Layer it can hit
    pub target_layer: Layer,
}

impl Projectile {
    /// Moves the projectile one step.
    pub fn advance(&mut self, dt: f32) {
        self.previous = self.position;
        self.position += self.direction * self.speed * dt.max(0.0);
    }

    /// Distance covered so far.
    #[must_use]
    pub fn travelled(&self) -> f32 {
        self.origin.distance(self.position)
    }

    /// Whether it flew past its range.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        self.travelled() >= self.max_distance
    }

    /// Length of the last step.
    #[must_use]
    pub fn step_length(&self) -> f32 {
        self.previous.distance(self.position)
    }
}
