//! Target acquisition.
//!
//! Entities look at the world through [`TargetProvider`] and pick targets
//! with a [`TargetingStrategy`]:
//! - monsters bind to the player when they spawn
//! - the player scans for the nearest monster, preferring one in line of sight

use serde::{Deserialize, Serialize};
use skirmish_common::{direction_to, distance, EntityId, Vec2};

/// Collision layer of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// The player.
    Player,
    /// Monsters.
    Monster,
    /// Dead or pooled: invisible to rays and queries.
    Ignore,
}

impl Layer {
    /// Layer this one attacks.
    #[must_use]
    pub const fn hostile(self) -> Option<Self> {
        match self {
            Self::Player => Some(Self::Monster),
            Self::Monster => Some(Self::Player),
            Self::Ignore => None,
        }
    }
}

/// Read-only view of a potential target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    /// Entity
    pub id: EntityId,
    /// Position
    pub position: Vec2,
    /// Body radius
    pub radius: f32,
    /// Layer
    pub layer: Layer,
    /// Dead flag
    pub dead: bool,
    /// In play (not pooled)
    pub active: bool,
}

impl TargetInfo {
    /// Whether this can be targeted: alive and in play.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.active && !self.dead
    }
}

/// First thing a ray touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RayHit {
    /// An entity on the queried layer.
    Entity(EntityId),
    /// Scenery.
    Obstacle,
}

/// World queries used for targeting.
pub trait TargetProvider {
    /// Looks up one entity.
    fn target_info(&self, id: EntityId) -> Option<TargetInfo>;

    /// The player, if one exists.
    fn player_id(&self) -> Option<EntityId>;

    /// Copy of every monster currently on the roster.
    fn monster_snapshot(&self) -> Vec<TargetInfo>;

    /// Casts a ray against obstacles and entities on `layer`.
    ///
    /// `dir` must be normalized. `exclude` is skipped (usually the caster).
    /// Returns the first hit and its distance.
    fn raycast(
        &self,
        origin: Vec2,
        dir: Vec2,
        max_distance: f32,
        layer: Layer,
        exclude: Option<EntityId>,
    ) -> Option<(RayHit, f32)>;

    /// Whether a point is inside the visible viewport.
    fn in_viewport(&self, point: Vec2) -> bool;
}

/// The entity doing the searching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seeker {
    /// Entity
    pub id: EntityId,
    /// Position
    pub position: Vec2,
    /// Layer
    pub layer: Layer,
}

/// How an entity chooses what to attack.
pub trait TargetingStrategy: std::fmt::Debug {
    /// Picks a target, or `None` to leave the entity without one.
    fn acquire(&self, seeker: &Seeker, world: &dyn TargetProvider) -> Option<EntityId>;

    /// Whether `acquire` should run on every Idle and Track tick.
    ///
    /// Strategies that return false are consulted only on spawn.
    fn rescans_every_tick(&self) -> bool;
}

/// Monster strategy: the target is always the player.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindToPlayer;

impl TargetingStrategy for BindToPlayer {
    fn acquire(&self, _seeker: &Seeker, world: &dyn TargetProvider) -> Option<EntityId> {
        world.player_id()
    }

    fn rescans_every_tick(&self) -> bool {
        false
    }
}

/// Player strategy: nearest live monster, preferring line of sight.
#[derive(Debug, Clone, Copy)]
pub struct NearestMonster {
    /// Length of the line-of-sight ray.
    pub scan_distance: f32,
}

impl Default for NearestMonster {
    fn default() -> Self {
        Self {
            scan_distance: 20.0,
        }
    }
}

impl TargetingStrategy for NearestMonster {
    fn acquire(&self, seeker: &Seeker, world: &dyn TargetProvider) -> Option<EntityId> {
        let candidates = world.monster_snapshot();
        let hostile = seeker.layer.hostile()?;
        select_nearest(seeker.position, &candidates, |candidate| {
            let dir = direction_to(seeker.position, candidate.position);
            if dir == Vec2::ZERO {
                return true;
            }
            matches!(
                world.raycast(seeker.position, dir, self.scan_distance, hostile, Some(seeker.id)),
                Some((RayHit::Entity(_), _))
            )
        })
    }

    fn rescans_every_tick(&self) -> bool {
        true
    }
}

/// Nearest valid candidate, preferring those `has_line_of_sight` accepts.
///
/// Returns `None` when there are no valid candidates.
pub fn select_nearest<F>(origin: Vec2, candidates: &[TargetInfo], mut has_line_of_sight: F) -> Option<EntityId>
where
    F: FnMut(&TargetInfo) -> bool,
{
    let mut nearest_visible: Option<(EntityId, f32)> = None;
    let mut nearest_any: Option<(EntityId, f32)> = None;

    for candidate in candidates.iter().filter(|c| c.is_valid()) {
        let d = distance(origin, candidate.position);
        if nearest_any.map_or(true, |(_, best)| d < best) {
            nearest_any = Some((candidate.id, d));
        }
        if nearest_visible.map_or(true, |(_, best)| d < best) && has_line_of_sight(candidate) {
            nearest_visible = Some((candidate.id, d));
        }
    }

    nearest_visible.or(nearest_any).map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monster(x: f32, y: f32) -> TargetInfo {
        TargetInfo {
            id: EntityId::new(),
            position: Vec2::new(x, y),
            radius: 0.5,
            layer: Layer::Monster,
            dead: false,
            active: true,
        }
    }

    #[test]
    fn test_empty_roster_selects_nothing() {
        assert_eq!(select_nearest(Vec2::ZERO, &[], |_| true), None);
    }

    #[test]
    fn test_prefers_line_of_sight_over_distance() {
        let near = monster(1.0, 0.0);
        let far = monster(5.0, 0.0);
        let picked = select_nearest(Vec2::ZERO, &[near, far], |c| c.id == far.id);
        assert_eq!(picked, Some(far.id));
    }

    #[test]
    fn test_falls_back_to_nearest_without_sight() {
        let near = monster(0.0, 2.0);
        let far = monster(0.0, 9.0);
        assert_eq!(select_nearest(Vec2::ZERO, &[far, near], |_| false), Some(near.id));
    }

    #[test]
    fn test_skips_dead_and_pooled() {
        let mut dead = monster(1.0, 0.0);
        dead.dead = true;
        let mut pooled = monster(0.5, 0.0);
        pooled.active = false;
        let alive = monster(7.0, 0.0);
        assert_eq!(
            select_nearest(Vec2::ZERO, &[dead, pooled, alive], |_| true),
            Some(alive.id)
        );
    }

    #[test]
    fn test_hostile_layers() {
        assert_eq!(Layer::Player.hostile(), Some(Layer::Monster));
        assert_eq!(Layer::Monster.hostile(), Some(Layer::Player));
        assert_eq!(Layer::Ignore.hostile(), None);
    }
}
