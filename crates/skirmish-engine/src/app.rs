//! Headless application loop.
//!
//! A [`Session`] owns the arena and everything the presentation layer would
//! normally provide: frame timing, the animation stand-in and the event log.

use anyhow::{Context, Result};
use skirmish_combat::{Arena, Catalog, EventHandler};
use tracing::{info, warn};

use crate::animation::AnimationDriver;
use crate::config::EngineConfig;
use crate::telemetry::{EventLog, RunReport};
use crate::timing::{FrameTiming, TimeSource};

/// One headless run.
#[derive(Debug)]
pub struct Session {
    config: EngineConfig,
    arena: Arena,
    timing: FrameTiming,
    animation: AnimationDriver,
    log: EventLog,
    games: u32,
}

impl Session {
    /// Creates a session, loading the catalog named in the config.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("loading catalog {}", path.display()))?,
            None => Catalog::default(),
        };
        Self::with_catalog(config, catalog)
    }

    /// Creates a session around an explicit catalog.
    pub fn with_catalog(mut config: EngineConfig, mut catalog: Catalog) -> Result<Self> {
        config.validate();
        catalog.set_strike_mode(config.strike_mode);
        catalog.validate().context("validating catalog")?;

        let source = if config.realtime {
            TimeSource::Realtime
        } else {
            TimeSource::Simulated(config.frame_dt())
        };
        let mut timing = FrameTiming::new(config.target_fps, source);
        timing.set_fixed_dt(config.fixed_dt);

        Ok(Self {
            arena: Arena::new(config.arena.clone(), catalog),
            timing,
            animation: AnimationDriver::new(config.strike_delay),
            log: EventLog::new(config.log_events),
            games: 0,
            config,
        })
    }

    /// The arena being simulated.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable access to the arena, for scripted scenarios.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Games started so far.
    #[must_use]
    pub fn games(&self) -> u32 {
        self.games
    }

    /// Event counts so far.
    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Starts a new game.
    pub fn start(&mut self) {
        self.games += 1;
        self.animation.clear();
        self.timing.reset();
        self.arena.start_game();
        self.arena.set_auto_cast(self.config.auto_cast);
        info!(game = self.games, "game started");
    }

    /// Runs one frame. Returns false once the run is over.
    pub fn step(&mut self) -> bool {
        let dt = self.timing.delta_time();
        let fixed_dt = self.timing.fixed_dt();
        for _ in 0..self.timing.accumulate(dt) {
            self.arena.fixed_update(fixed_dt);
        }
        self.arena.update(dt);

        let now = self.arena.time();
        self.animation.set_time(now);
        let mut handlers: [&mut dyn EventHandler; 2] = [&mut self.animation, &mut self.log];
        self.arena.events().dispatch(&mut handlers);
        for entity in self.animation.take_due(now) {
            self.arena.strike_landed(entity);
        }

        if !self.arena.is_game_running() {
            if self.config.restart_on_death && self.games < self.config.max_games {
                self.start();
            } else {
                return false;
            }
        }
        if self.config.is_timed() && self.timing.elapsed() >= f64::from(self.config.duration_secs) {
            return false;
        }
        self.timing.sleep_remainder();
        true
    }

    /// Snapshot of the run so far.
    #[must_use]
    pub fn report(&self) -> RunReport {
        RunReport::collect(&self.arena, &self.log, self.games, self.timing.frames())
    }

    /// Plays until the timer runs out or the last game ends.
    pub fn run(mut self) -> Result<RunReport> {
        if !self.config.is_timed() && !self.config.restart_on_death {
            warn!("Untimed run: stopping only when the player falls");
        }
        self.start();
        while self.step() {}

        let report = self.report();
        info!(
            games = report.games,
            frames = report.frames,
            stage = %report.stage,
            kills = report.kills,
            deaths = report.deaths,
            fps = self.timing.current_fps(),
            "run finished"
        );
        if let Some(path) = &self.config.report_path {
            report.write_json(path)?;
        }
        Ok(report)
    }
}

/// Runs a headless session with the given configuration.
pub fn run(config: EngineConfig) -> Result<RunReport> {
    Session::new(config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_combat::{DamageMessage, StrikeMode};
    use tempfile::TempDir;

    fn open_field() -> Catalog {
        Catalog {
            obstacles: Vec::new(),
            ..Catalog::default()
        }
    }

    fn timed(secs: f32) -> EngineConfig {
        EngineConfig {
            duration_secs: secs,
            target_fps: 50,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_timed_run_stops() {
        let session = Session::with_catalog(timed(2.0), open_field()).expect("session");
        let report = session.run().expect("run");
        assert_eq!(report.games, 1);
        assert!((99..=101).contains(&report.frames));
        assert!(report.simulated_secs >= 1.9);
        assert_eq!(report.events.get("WaveStarted"), Some(&1));
    }

    #[test]
    fn test_run_kills_monsters() {
        let session = Session::with_catalog(timed(60.0), open_field()).expect("session");
        let report = session.run().expect("run");
        assert!(report.kills >= 1);
        assert!(report.gold >= 1);
        assert!(report.events.get("MonsterSpawned").is_some_and(|n| *n >= 1));
    }

    #[test]
    fn test_animation_event_strikes_still_land() {
        let config = EngineConfig {
            strike_mode: StrikeMode::AnimationEvent,
            strike_delay: 0.1,
            ..timed(60.0)
        };
        let session = Session::with_catalog(config, open_field()).expect("session");
        let report = session.run().expect("run");
        assert!(report.kills >= 1);
    }

    #[test]
    fn test_restart_after_death() {
        let config = EngineConfig {
            restart_on_death: true,
            max_games: 2,
            ..timed(10.0)
        };
        let mut session = Session::with_catalog(config, open_field()).expect("session");
        session.start();
        assert!(session.step());

        let player = session.arena().player().map(|p| p.id());
        if let Some(player) = player {
            session.arena_mut().damage(player, DamageMessage::environmental(10_000));
        }
        assert!(session.step());
        assert_eq!(session.games(), 2);
        assert!(session.arena().is_game_running());
        assert_eq!(session.report().deaths, 1);

        if let Some(player) = player {
            session.arena_mut().damage(player, DamageMessage::environmental(10_000));
        }
        assert!(!session.step());
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/catalog.ron");
        let config = EngineConfig {
            catalog_path: Some(path),
            ..timed(1.0)
        };
        let session = Session::new(config).expect("bundled catalog");
        let catalog = session.arena().catalog();
        assert_eq!(catalog.player.stats.max_health(), 120);
        assert_eq!(catalog.monsters.len(), 3);
        assert_eq!(catalog.obstacles.len(), 3);
    }

    #[test]
    fn test_missing_catalog_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let config = EngineConfig {
            catalog_path: Some(dir.path().join("missing.ron")),
            ..EngineConfig::default()
        };
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn test_report_file_written() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("report.json");
        let config = EngineConfig {
            report_path: Some(path.clone()),
            ..timed(1.0)
        };
        let session = Session::with_catalog(config, open_field()).expect("session");
        session.run().expect("run");
        assert!(path.exists());
    }
}
