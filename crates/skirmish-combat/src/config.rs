//! Arena tuning.
//!
//! Numbers that shape a run but are not part of any archetype: timings of
//! deferred routines, wave pacing, viewport size and economy limits.

use serde::{Deserialize, Serialize};

use crate::progression::DEFAULT_CURRENCY_CEILING;

/// Arena configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seconds after one skill cast before any other may be cast.
    pub cast_lockout: f32,
    /// Seconds a caster stays in the Skill state after the effect fires.
    pub cast_recovery: f32,
    /// Phantom Blade dash speed as a multiple of move speed.
    pub dash_speed_multiplier: f32,
    /// Seconds a one-shot effect stays out of the pool.
    pub effect_lifetime: f32,
    /// Blend factor when turning towards a new heading.
    pub turn_rate: f32,
    /// Half width of the viewport, centred on the player.
    pub viewport_half_width: f32,
    /// Half height of the viewport, centred on the player.
    pub viewport_half_height: f32,
    /// Monsters spawn within this distance of the origin.
    pub spawn_radius: f32,
    /// Seconds between spawns on the first stage.
    pub spawn_cycle: f32,
    /// Spawn cycle reduction per cleared stage.
    pub spawn_cycle_shrink: f32,
    /// Shortest spawn cycle.
    pub min_spawn_cycle: f32,
    /// Largest wave.
    pub max_wave_size: u32,
    /// Seconds between clearing a wave and starting the next.
    pub next_wave_delay: f32,
    /// Seconds a dead monster lingers before returning to the pool.
    pub return_to_pool_delay: f32,
    /// Monster stat growth per (stage count x main stage).
    pub difficulty_step: f32,
    /// Ceiling for every currency balance.
    pub currency_ceiling: i64,
    /// Highest stat and skill upgrade level.
    pub max_upgrade_level: u32,
    /// Event bus capacity. Must cover every event published between two
    /// drains; a full bus drops events, including the attack triggers the
    /// animation layer turns into strikes.
    pub event_capacity: usize,
    /// Seed for spawn positions and rewards.
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            cast_lockout: 0.5,
            cast_recovery: 0.25,
            dash_speed_multiplier: 4.0,
            effect_lifetime: 1.0,
            turn_rate: 0.3,
            viewport_half_width: 12.0,
            viewport_half_height: 20.0,
            spawn_radius: 50.0,
            spawn_cycle: 5.0,
            spawn_cycle_shrink: 0.01,
            min_spawn_cycle: 0.2,
            max_wave_size: 100,
            next_wave_delay: 1.0,
            return_to_pool_delay: 1.0,
            difficulty_step: 0.04,
            currency_ceiling: DEFAULT_CURRENCY_CEILING,
            max_upgrade_level: 99,
            event_capacity: 4096,
            seed: 0x5EED,
        }
    }
}

impl ArenaConfig {
    /// Clamps values into usable ranges.
    pub fn validate(&mut self) {
        self.cast_lockout = self.cast_lockout.max(0.0);
        self.cast_recovery = self.cast_recovery.max(0.0);
        self.dash_speed_multiplier = self.dash_speed_multiplier.max(1.0);
        self.effect_lifetime = self.effect_lifetime.max(0.0);
        self.turn_rate = self.turn_rate.clamp(0.01, 1.0);
        self.viewport_half_width = self.viewport_half_width.max(1.0);
        self.viewport_half_height = self.viewport_half_height.max(1.0);
        self.spawn_radius = self.spawn_radius.max(0.0);
        self.min_spawn_cycle = self.min_spawn_cycle.max(0.01);
        self.spawn_cycle = self.spawn_cycle.max(self.min_spawn_cycle);
        self.spawn_cycle_shrink = self.spawn_cycle_shrink.max(0.0);
        self.max_wave_size = self.max_wave_size.clamp(1, 1000);
        self.next_wave_delay = self.next_wave_delay.max(0.0);
        self.return_to_pool_delay = self.return_to_pool_delay.max(0.0);
        self.difficulty_step = self.difficulty_step.max(0.0);
        self.currency_ceiling = self.currency_ceiling.max(0);
        self.max_upgrade_level = self.max_upgrade_level.max(1);
        self.event_capacity = self.event_capacity.clamp(16, 1 << 20);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_clamps() {
        let mut config = ArenaConfig {
            cast_lockout: -1.0,
            turn_rate: 5.0,
            max_wave_size: 0,
            spawn_cycle: 0.0,
            ..ArenaConfig::default()
        };
        config.validate();
        assert!(config.cast_lockout.abs() < f32::EPSILON);
        assert!((config.turn_rate - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.max_wave_size, 1);
        assert!(config.spawn_cycle >= config.min_spawn_cycle);
    }

    #[test]
    fn test_default_is_already_valid() {
        let mut config = ArenaConfig::default();
        config.validate();
        assert_eq!(config, ArenaConfig::default());
    }
}
