//! Event logging and the end-of-run report.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use skirmish_combat::{Arena, CombatEvent, Currency, EventHandler};
use tracing::{debug, info};

/// Short name of an event variant.
#[must_use]
pub fn event_name(event: &CombatEvent) -> &'static str {
    match event {
        CombatEvent::HealthChanged { .. } => "HealthChanged",
        CombatEvent::Died { .. } => "Died",
        CombatEvent::StateChanged { .. } => "StateChanged",
        CombatEvent::Animation { .. } => "Animation",
        CombatEvent::TargetChanged { .. } => "TargetChanged",
        CombatEvent::SkillCast { .. } => "SkillCast",
        CombatEvent::SkillReady { .. } => "SkillReady",
        CombatEvent::SkillUpgraded { .. } => "SkillUpgraded",
        CombatEvent::EquipmentChanged { .. } => "EquipmentChanged",
        CombatEvent::EquipmentUpgraded { .. } => "EquipmentUpgraded",
        CombatEvent::StatusChanged { .. } => "StatusChanged",
        CombatEvent::CurrencyChanged { .. } => "CurrencyChanged",
        CombatEvent::ExperienceChanged { .. } => "ExperienceChanged",
        CombatEvent::LevelUp { .. } => "LevelUp",
        CombatEvent::MonsterSpawned { .. } => "MonsterSpawned",
        CombatEvent::MonsterReturned { .. } => "MonsterReturned",
        CombatEvent::WaveStarted { .. } => "WaveStarted",
        CombatEvent::WaveCleared { .. } => "WaveCleared",
        CombatEvent::GameOver { .. } => "GameOver",
    }
}

/// Counts events and logs the interesting ones.
#[derive(Debug, Default)]
pub struct EventLog {
    verbose: bool,
    counts: BTreeMap<&'static str, u64>,
}

impl EventLog {
    /// Creates a log. `verbose` logs every event at debug level.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            counts: BTreeMap::new(),
        }
    }

    /// Events seen of one kind.
    #[must_use]
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Events seen in total.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

impl EventHandler for EventLog {
    fn handle(&mut self, event: &CombatEvent) {
        *self.counts.entry(event_name(event)).or_insert(0) += 1;
        if self.verbose {
            debug!(?event, "combat event");
        }
        match event {
            CombatEvent::WaveStarted { stage, size } => info!(%stage, size, "wave started"),
            CombatEvent::LevelUp { level } => info!(level, "level up"),
            CombatEvent::GameOver { deaths } => info!(deaths, "player fell"),
            _ => {},
        }
    }
}

/// Summary of a headless run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Games started
    pub games: u32,
    /// Frames simulated
    pub frames: u64,
    /// Simulated seconds
    pub simulated_secs: f64,
    /// Stage reached
    pub stage: String,
    /// Player level
    pub level: u32,
    /// Monsters killed
    pub kills: u32,
    /// Player deaths
    pub deaths: u32,
    /// Final Gold balance
    pub gold: i64,
    /// Final Karma balance
    pub karma: i64,
    /// Player health at the end
    pub player_health: i32,
    /// Event counts by kind
    pub events: BTreeMap<String, u64>,
}

impl RunReport {
    /// Collects the report from the arena and the event log.
    #[must_use]
    pub fn collect(arena: &Arena, log: &EventLog, games: u32, frames: u64) -> Self {
        let progression = arena.progression();
        Self {
            games,
            frames,
            simulated_secs: arena.time(),
            stage: progression.stage.label(),
            level: progression.experience.level(),
            kills: progression.kills,
            deaths: progression.deaths,
            gold: progression.wallet.balance(Currency::Gold),
            karma: progression.wallet.balance(Currency::Karma),
            player_health: arena.player().map_or(0, |p| p.life().current_health()),
            events: log
                .counts
                .iter()
                .map(|(name, count)| ((*name).to_string(), *count))
                .collect(),
        }
    }

    /// Writes the report as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing run report")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("Wrote run report to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_counts_by_kind() {
        let mut log = EventLog::new(false);
        log.handle(&CombatEvent::LevelUp { level: 2 });
        log.handle(&CombatEvent::LevelUp { level: 3 });
        log.handle(&CombatEvent::GameOver { deaths: 1 });

        assert_eq!(log.count("LevelUp"), 2);
        assert_eq!(log.count("GameOver"), 1);
        assert_eq!(log.count("Died"), 0);
        assert_eq!(log.total(), 3);
    }

    #[test]
    fn test_report_written_as_json() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("reports").join("run.json");
        let report = RunReport {
            games: 1,
            stage: "1-3".to_string(),
            kills: 7,
            ..RunReport::default()
        };

        assert!(report.write_json(&path).is_ok());
        let text = std::fs::read_to_string(&path).expect("report file");
        let parsed: RunReport = serde_json::from_str(&text).expect("report json");
        assert_eq!(parsed, report);
    }
}
