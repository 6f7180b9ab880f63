//! Archetype catalog.
//!
//! Every template the arena builds entities from: the player archetype,
//! monster archetypes, skill templates, equipment and obstacles. The
//! catalog is plain data and loads from RON; anything left out of a file
//! falls back to the built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skirmish_common::{Circle, EquipmentId, Vec2};
use thiserror::Error;

use crate::entity::StrikeMode;
use crate::equipment::{EquipSlot, EquipmentTemplate};
use crate::skills::{SkillKind, SkillTemplate};
use crate::stats::{StatBlock, StatBounds};

/// Catalog error types.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// RON could not be parsed
    #[error("catalog parse error: {0}")]
    Parse(String),
    /// RON could not be written
    #[error("catalog serialization error: {0}")]
    Serialize(String),
    /// File could not be read
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A skill is missing or listed twice
    #[error("skill {0:?} must appear exactly once")]
    SkillCount(SkillKind),
    /// Two equipment templates share an id
    #[error("duplicate equipment id {0:?}")]
    DuplicateEquipment(EquipmentId),
    /// No monster can spawn
    #[error("catalog has no spawnable monsters")]
    NoMonsters,
    /// An archetype has unusable stats
    #[error("invalid stats for {0}")]
    InvalidStats(String),
    /// An equipment template cannot be levelled
    #[error("equipment {0:?} needs a max level of at least 1")]
    InvalidEquipment(EquipmentId),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Monster archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    /// Fast, fragile melee.
    Spider,
    /// Slow, tough melee.
    Golem,
    /// Long reach, quick swings.
    Wraith,
}

/// Template for the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerArchetype {
    /// Display name
    pub name: String,
    /// Base stats
    pub stats: StatBlock,
    /// Body radius
    pub body_radius: f32,
    /// Seconds of invulnerability after a hit
    pub min_hit_interval: f32,
    /// When a swing deals damage
    pub strike_mode: StrikeMode,
    /// Line-of-sight ray length when picking targets
    pub scan_distance: f32,
}

impl Default for PlayerArchetype {
    fn default() -> Self {
        Self {
            name: "Wanderer".to_string(),
            stats: StatBlock::new(100, 10)
                .with_range(1.5)
                .with_cadence(1.0)
                .with_move_speed(4.0)
                .with_bounds(StatBounds {
                    min_attack_range: 1.0,
                    max_attack_range: 5.0,
                    min_attack_cadence: 0.1,
                    max_attack_cadence: 4.0,
                    min_move_speed: 0.5,
                    max_move_speed: 10.0,
                }),
            body_radius: 0.5,
            min_hit_interval: 0.1,
            strike_mode: StrikeMode::Immediate,
            scan_distance: 20.0,
        }
    }
}

/// Template for one kind of monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterArchetype {
    /// Kind
    pub kind: MonsterKind,
    /// Display name
    pub name: String,
    /// Base stats before difficulty scaling
    pub stats: StatBlock,
    /// Body radius
    pub body_radius: f32,
    /// Seconds of invulnerability after a hit
    pub min_hit_interval: f32,
    /// When a swing deals damage
    pub strike_mode: StrikeMode,
    /// Relative spawn chance; 0 never spawns in waves
    pub spawn_weight: u32,
}

impl Default for MonsterArchetype {
    fn default() -> Self {
        Self {
            kind: MonsterKind::Spider,
            name: "Spider".to_string(),
            stats: StatBlock::new(30, 5)
                .with_range(1.2)
                .with_cadence(0.8)
                .with_move_speed(3.0),
            body_radius: 0.5,
            min_hit_interval: 0.1,
            strike_mode: StrikeMode::Immediate,
            spawn_weight: 100,
        }
    }
}

/// Everything the arena is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Player template
    pub player: PlayerArchetype,
    /// Monster templates
    pub monsters: Vec<MonsterArchetype>,
    /// One template per skill
    pub skills: Vec<SkillTemplate>,
    /// Equipment templates
    pub equipment: Vec<EquipmentTemplate>,
    /// Scenery that blocks rays and movement
    pub obstacles: Vec<Circle>,
}

impl Default for Catalog {
    fn default() -> Self {
        let weapon = |id: u32, name: &str, impact: i32, per_level: i32, cost: i64, unlocked: bool| {
            EquipmentTemplate {
                id: EquipmentId::new(id),
                name: name.to_string(),
                slot: EquipSlot::Weapon,
                max_level: 10,
                buy_cost: cost,
                upgrade_cost: cost + cost / 2,
                impact_amount: impact,
                impact_per_level: per_level,
                unlocked,
            }
        };
        let armor = |id: u32, name: &str, impact: i32, per_level: i32, cost: i64, unlocked: bool| {
            EquipmentTemplate {
                slot: EquipSlot::Armor,
                ..weapon(id, name, impact, per_level, cost, unlocked)
            }
        };

        Self {
            player: PlayerArchetype::default(),
            monsters: vec![
                MonsterArchetype::default(),
                MonsterArchetype {
                    kind: MonsterKind::Golem,
                    name: "Golem".to_string(),
                    stats: StatBlock::new(80, 12)
                        .with_range(1.5)
                        .with_cadence(0.5)
                        .with_move_speed(2.0),
                    body_radius: 0.8,
                    spawn_weight: 40,
                    ..MonsterArchetype::default()
                },
                MonsterArchetype {
                    kind: MonsterKind::Wraith,
                    name: "Wraith".to_string(),
                    stats: StatBlock::new(45, 8)
                        .with_range(2.0)
                        .with_cadence(1.2)
                        .with_move_speed(4.0),
                    spawn_weight: 20,
                    ..MonsterArchetype::default()
                },
            ],
            skills: SkillKind::ALL.iter().map(|k| SkillTemplate::default_for(*k)).collect(),
            equipment: vec![
                weapon(1, "Rusty Sword", 5, 2, 100, true),
                weapon(2, "Knight Blade", 15, 4, 1_000, false),
                armor(101, "Leather Vest", 20, 5, 100, true),
                armor(102, "Iron Plate", 50, 10, 1_000, false),
            ],
            obstacles: vec![
                Circle::new(Vec2::new(10.0, 10.0), 1.5),
                Circle::new(Vec2::new(-12.0, 6.0), 2.0),
                Circle::new(Vec2::new(4.0, -14.0), 1.0),
            ],
        }
    }
}

impl Catalog {
    /// Parses and validates a catalog from RON.
    pub fn from_ron_str(source: &str) -> CatalogResult<Self> {
        let catalog: Self = ron::from_str(source).map_err(|e| CatalogError::Parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reads, parses and validates a catalog file.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Writes the catalog as pretty RON.
    pub fn to_ron_string(&self) -> CatalogResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| CatalogError::Serialize(e.to_string()))
    }

    /// Checks that the catalog can drive an arena.
    pub fn validate(&self) -> CatalogResult<()> {
        if !self.player.stats.is_valid() {
            return Err(CatalogError::InvalidStats(self.player.name.clone()));
        }
        for monster in &self.monsters {
            if !monster.stats.is_valid() {
                return Err(CatalogError::InvalidStats(monster.name.clone()));
            }
        }
        if self.monsters.iter().all(|m| m.spawn_weight == 0) {
            return Err(CatalogError::NoMonsters);
        }
        for kind in SkillKind::ALL {
            if self.skills.iter().filter(|s| s.kind == kind).count() != 1 {
                return Err(CatalogError::SkillCount(kind));
            }
        }
        for (i, piece) in self.equipment.iter().enumerate() {
            if piece.max_level < 1 {
                return Err(CatalogError::InvalidEquipment(piece.id));
            }
            if self.equipment[..i].iter().any(|p| p.id == piece.id) {
                return Err(CatalogError::DuplicateEquipment(piece.id));
            }
        }
        Ok(())
    }

    /// Template for a monster kind.
    #[must_use]
    pub fn monster(&self, kind: MonsterKind) -> Option<&MonsterArchetype> {
        self.monsters.iter().find(|m| m.kind == kind)
    }

    /// Template for a skill.
    #[must_use]
    pub fn skill(&self, kind: SkillKind) -> Option<&SkillTemplate> {
        self.skills.iter().find(|s| s.kind == kind)
    }

    /// Skill templates in slot order.
    #[must_use]
    pub fn skill_templates(&self) -> Vec<SkillTemplate> {
        SkillKind::ALL
            .iter()
            .map(|k| self.skill(*k).cloned().unwrap_or_else(|| SkillTemplate::default_for(*k)))
            .collect()
    }

    /// Picks a monster kind by spawn weight.
    pub fn pick_monster(&self, rng: &mut fastrand::Rng) -> Option<MonsterKind> {
        let total: u32 = self.monsters.iter().map(|m| m.spawn_weight).sum();
        if total == 0 {
            return None;
        }
        let mut roll = rng.u32(0..total);
        for monster in &self.monsters {
            if roll < monster.spawn_weight {
                return Some(monster.kind);
            }
            roll -= monster.spawn_weight;
        }
        None
    }

    /// Sets the strike mode of every archetype.
    pub fn set_strike_mode(&mut self, mode: StrikeMode) {
        self.player.strike_mode = mode;
        for monster in &mut self.monsters {
            monster.strike_mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        assert!(Catalog::default().validate().is_ok());
    }

    #[test]
    fn test_default_catalog_survives_ron() {
        let catalog = Catalog::default();
        let text = catalog.to_ron_string();
        assert!(text.is_ok());
        let parsed = Catalog::from_ron_str(&text.unwrap_or_default());
        assert!(matches!(parsed, Ok(ref c) if *c == catalog));
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let source = r#"(
            monsters: [
                (kind: Golem, name: "Big Golem", spawn_weight: 1),
            ],
            obstacles: [],
        )"#;
        let catalog = Catalog::from_ron_str(source);
        assert!(catalog.is_ok());
        if let Ok(catalog) = catalog {
            assert_eq!(catalog.monsters.len(), 1);
            assert_eq!(catalog.monsters[0].kind, MonsterKind::Golem);
            assert_eq!(catalog.monsters[0].stats, MonsterArchetype::default().stats);
            assert_eq!(catalog.skills.len(), 3);
            assert!(catalog.obstacles.is_empty());
        }
    }

    #[test]
    fn test_missing_skill_is_rejected() {
        let mut catalog = Catalog::default();
        catalog.skills.retain(|s| s.kind != SkillKind::FireBall);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::SkillCount(SkillKind::FireBall))
        ));
    }

    #[test]
    fn test_unlevelable_equipment_is_rejected() {
        let mut catalog = Catalog::default();
        catalog.equipment[0].max_level = 0;
        let id = catalog.equipment[0].id;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidEquipment(bad)) if bad == id
        ));

        let mut catalog = Catalog::default();
        catalog.player.stats.base_attack_cadence = 0.0;
        assert!(matches!(catalog.validate(), Err(CatalogError::InvalidStats(_))));
    }

    #[test]
    fn test_zero_weights_are_rejected() {
        let mut catalog = Catalog::default();
        for monster in &mut catalog.monsters {
            monster.spawn_weight = 0;
        }
        assert!(matches!(catalog.validate(), Err(CatalogError::NoMonsters)));
        assert_eq!(catalog.pick_monster(&mut fastrand::Rng::with_seed(1)), None);
    }

    #[test]
    fn test_pick_monster_follows_weights() {
        let mut catalog = Catalog::default();
        catalog.monsters[0].spawn_weight = 0;
        catalog.monsters[2].spawn_weight = 0;
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..20 {
            assert_eq!(catalog.pick_monster(&mut rng), Some(MonsterKind::Golem));
        }
    }
}
