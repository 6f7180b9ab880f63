//! Runner configuration.
//!
//! Provides simulation, content, player and output settings for a headless
//! run. Configuration can be loaded from and saved to a TOML file; arena
//! tuning lives in the nested `[arena]` table.

use serde::{Deserialize, Serialize};
use skirmish_combat::{ArenaConfig, StrikeMode};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "skirmish.toml";

/// Runner configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Simulation Settings ===
    /// Simulation ticks per second
    pub target_fps: u32,
    /// Fixed physics timestep in seconds
    pub fixed_dt: f32,
    /// Simulated seconds to run (0 = until game over)
    pub duration_secs: f32,
    /// Pace the loop against the wall clock
    pub realtime: bool,
    /// Start a new game after a game over instead of stopping
    pub restart_on_death: bool,
    /// Games to play before stopping when restarting
    pub max_games: u32,

    // === Content Settings ===
    /// RON catalog to load (None = built-in catalog)
    pub catalog_path: Option<PathBuf>,
    /// Random seed override (None = arena default)
    pub seed: Option<u64>,

    // === Player Settings ===
    /// Cast ready skills automatically
    pub auto_cast: bool,
    /// When melee swings deal damage
    pub strike_mode: StrikeMode,
    /// Seconds between a swing starting and its strike frame
    pub strike_delay: f32,

    // === Output Settings ===
    /// Write a JSON run report here
    pub report_path: Option<PathBuf>,
    /// Log every combat event at debug level
    pub log_events: bool,

    // === Arena Settings ===
    /// Arena tuning
    pub arena: ArenaConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Simulation
            target_fps: 60,
            fixed_dt: 1.0 / 50.0,
            duration_secs: 120.0,
            realtime: false,
            restart_on_death: false,
            max_games: 1,

            // Content
            catalog_path: None,
            seed: None,

            // Player
            auto_cast: true,
            strike_mode: StrikeMode::Immediate,
            strike_delay: 0.2,

            // Output
            report_path: None,
            log_events: false,

            arena: ArenaConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str::<Self>(&contents) {
                    Ok(mut config) => {
                        config.validate();
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.target_fps = self.target_fps.clamp(10, 240);
        self.fixed_dt = self.fixed_dt.clamp(0.001, 0.1);
        self.duration_secs = self.duration_secs.max(0.0);
        self.max_games = self.max_games.max(1);
        self.strike_delay = self.strike_delay.clamp(0.0, 2.0);
        if let Some(seed) = self.seed {
            self.arena.seed = seed;
        }
        self.arena.validate();
    }

    /// Length of one simulation tick.
    #[must_use]
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }

    /// Whether the run stops on a timer.
    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.duration_secs > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.target_fps, 60);
        assert!(config.auto_cast);
        assert!(config.is_timed());
        assert_eq!(config.strike_mode, StrikeMode::Immediate);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig {
            target_fps: 1,
            fixed_dt: 5.0,
            max_games: 0,
            seed: Some(99),
            ..EngineConfig::default()
        };

        config.validate();

        assert_eq!(config.target_fps, 10);
        assert!((config.fixed_dt - 0.1).abs() < 0.001);
        assert_eq!(config.max_games, 1);
        assert_eq!(config.arena.seed, 99);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let mut config = EngineConfig::default();
        config.target_fps = 30;
        config.strike_mode = StrikeMode::AnimationEvent;
        config.arena.spawn_cycle = 2.5;
        config.seed = Some(12345);

        assert!(config.save_to(&config_path).is_ok());

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.target_fps, 30);
        assert_eq!(loaded.strike_mode, StrikeMode::AnimationEvent);
        assert!((loaded.arena.spawn_cycle - 2.5).abs() < f32::EPSILON);
        assert_eq!(loaded.arena.seed, 12345);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/skirmish.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EngineConfig = toml::from_str("duration_secs = 5.0\n[arena]\nmax_wave_size = 3\n")
            .expect("partial toml");
        assert!((config.duration_secs - 5.0).abs() < f32::EPSILON);
        assert_eq!(config.arena.max_wave_size, 3);
        assert_eq!(config.target_fps, 60);
    }

    #[test]
    fn test_config_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");

        assert!(toml_str.contains("target_fps"));
        assert!(toml_str.contains("[arena]"));
    }
}
