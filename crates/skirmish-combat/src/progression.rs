//! Economy and run progression.
//!
//! This module provides:
//! - Gold and Karma balances with a ceiling
//! - Experience and levels
//! - Stage numbering, wave sizing and difficulty scaling
//! - Permanent stat upgrades bought with Gold
//! - Kill rewards

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::{StatBlock, StatKind};

/// Default ceiling for any currency balance.
pub const DEFAULT_CURRENCY_CEILING: i64 = 999_999_999;

/// Experience needed to leave level 1.
pub const STARTING_EXP_REQUIREMENT: f32 = 5.0;

// ============================================================================
// Wallet
// ============================================================================

/// Currencies held by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Earned from kills, spent on stats and equipment.
    Gold,
    /// Earned from kills and stages, spent on skills.
    Karma,
}

/// Wallet error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// Not enough currency
    #[error("insufficient {currency:?}: need {needed}, have {available}")]
    Insufficient {
        /// Currency
        currency: Currency,
        /// Amount required
        needed: i64,
        /// Amount held
        available: i64,
    },
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Gold and Karma balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    gold: i64,
    karma: i64,
    ceiling: i64,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_CEILING)
    }
}

impl Wallet {
    /// Creates an empty wallet.
    #[must_use]
    pub fn new(ceiling: i64) -> Self {
        Self {
            gold: 0,
            karma: 0,
            ceiling: ceiling.max(0),
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self, currency: Currency) -> i64 {
        match currency {
            Currency::Gold => self.gold,
            Currency::Karma => self.karma,
        }
    }

    /// Maximum balance.
    #[must_use]
    pub const fn ceiling(&self) -> i64 {
        self.ceiling
    }

    /// Whether `amount` can be spent.
    #[must_use]
    pub const fn can_afford(&self, currency: Currency, amount: i64) -> bool {
        self.balance(currency) >= amount
    }

    fn slot_mut(&mut self, currency: Currency) -> &mut i64 {
        match currency {
            Currency::Gold => &mut self.gold,
            Currency::Karma => &mut self.karma,
        }
    }

    /// Adds currency, clamped to the ceiling. Returns the new balance.
    pub fn earn(&mut self, currency: Currency, amount: i64) -> i64 {
        let ceiling = self.ceiling;
        let slot = self.slot_mut(currency);
        *slot = slot.saturating_add(amount.max(0)).min(ceiling);
        *slot
    }

    /// Removes currency. Returns the new balance.
    pub fn spend(&mut self, currency: Currency, amount: i64) -> WalletResult<i64> {
        let available = self.balance(currency);
        if available < amount {
            return Err(WalletError::Insufficient {
                currency,
                needed: amount,
                available,
            });
        }
        let slot = self.slot_mut(currency);
        *slot -= amount.max(0);
        Ok(*slot)
    }
}

// ============================================================================
// Experience
// ============================================================================

/// Player level and experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    level: u32,
    exp: f32,
    needed: f32,
}

impl Default for Experience {
    fn default() -> Self {
        Self::new()
    }
}

impl Experience {
    /// Level 1 with no experience.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: 1,
            exp: 0.0,
            needed: STARTING_EXP_REQUIREMENT,
        }
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Experience into the current level.
    #[must_use]
    pub const fn exp(&self) -> f32 {
        self.exp
    }

    /// Experience needed to reach the next level.
    #[must_use]
    pub const fn needed(&self) -> f32 {
        self.needed
    }

    /// Requirement to leave `level`.
    #[must_use]
    pub fn requirement_for(level: u32) -> f32 {
        let curve = ((level.saturating_sub(1)) as f32 * 50.0 / 49.0).powf(2.5) * 10.0;
        curve.max(STARTING_EXP_REQUIREMENT)
    }

    /// Adds experience. Returns the number of levels gained.
    pub fn add(&mut self, amount: f32) -> u32 {
        self.exp += amount.max(0.0);
        let mut gained = 0;
        while self.exp >= self.needed {
            self.exp -= self.needed;
            self.level += 1;
            self.needed = Self::requirement_for(self.level);
            gained += 1;
        }
        gained
    }
}

// ============================================================================
// Stage
// ============================================================================

/// Stage numbering ("main-sub") and cleared-stage count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    main: u32,
    sub: u32,
    stage_count: u32,
}

impl Default for StageProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl StageProgress {
    /// Sub-stages per main stage.
    pub const SUB_STAGES: u32 = 10;

    /// The opening stage, "1-0".
    #[must_use]
    pub const fn new() -> Self {
        Self {
            main: 1,
            sub: 0,
            stage_count: 0,
        }
    }

    /// Main stage number.
    #[must_use]
    pub const fn main(&self) -> u32 {
        self.main
    }

    /// Sub-stage number.
    #[must_use]
    pub const fn sub(&self) -> u32 {
        self.sub
    }

    /// Number of stages cleared.
    #[must_use]
    pub const fn stage_count(&self) -> u32 {
        self.stage_count
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.main, self.sub)
    }

    /// Moves to the next stage. Returns the Karma earned.
    pub fn advance(&mut self) -> i64 {
        self.stage_count += 1;
        if self.sub >= Self::SUB_STAGES {
            self.main += 1;
            self.sub = 1;
        } else {
            self.sub += 1;
        }
        i64::from(self.main)
    }

    /// Monsters in the current wave.
    #[must_use]
    pub fn wave_size(&self, max: u32) -> u32 {
        self.stage_count.saturating_mul(2).clamp(1, max.max(1))
    }

    /// Seconds between spawns in the current wave.
    #[must_use]
    pub fn spawn_cycle(&self, base: f32, shrink_per_stage: f32, min: f32) -> f32 {
        (base - shrink_per_stage * self.stage_count as f32).max(min)
    }

    /// Multiplier applied to monster stats.
    #[must_use]
    pub fn difficulty_factor(&self, step: f32) -> f32 {
        1.0 + step * (self.stage_count * self.main) as f32
    }
}

// ============================================================================
// Upgrades
// ============================================================================

/// Upgrade error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    /// Already at the highest level
    #[error("already at max level {0}")]
    MaxLevel(u32),
    /// Stat cannot be bought
    #[error("{0:?} cannot be upgraded")]
    NotUpgradable(StatKind),
    /// No entity to apply it to
    #[error("no player in the arena")]
    NoPlayer,
    /// Not enough currency
    #[error(transparent)]
    Funds(#[from] WalletError),
}

/// Result type for upgrade operations.
pub type UpgradeResult<T> = Result<T, UpgradeError>;

/// Cost to buy the level after `level`.
#[must_use]
pub fn upgrade_cost(level: u32) -> i64 {
    (f64::from(level) * 100.0 * 1.5).round() as i64
}

/// Levels of the permanent stat upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatUpgrades {
    levels: [u32; 5],
    max_level: u32,
}

impl StatUpgrades {
    /// All upgrades at level 1.
    #[must_use]
    pub fn new(max_level: u32) -> Self {
        Self {
            levels: [1; 5],
            max_level: max_level.max(1),
        }
    }

    /// Current level, or `None` for derived stats.
    #[must_use]
    pub fn level(&self, kind: StatKind) -> Option<u32> {
        kind.upgrade_index().map(|i| self.levels[i])
    }

    /// Price of the next level.
    #[must_use]
    pub fn next_cost(&self, kind: StatKind) -> Option<i64> {
        self.level(kind).map(upgrade_cost)
    }

    /// Spends Gold and applies one step to `stats`. Returns the new level.
    pub fn purchase(
        &mut self,
        kind: StatKind,
        wallet: &mut Wallet,
        stats: &mut StatBlock,
    ) -> UpgradeResult<u32> {
        let index = kind.upgrade_index().ok_or(UpgradeError::NotUpgradable(kind))?;
        let level = self.levels[index];
        if level >= self.max_level {
            return Err(UpgradeError::MaxLevel(self.max_level));
        }
        wallet.spend(Currency::Gold, upgrade_cost(level))?;
        stats.apply_upgrade(kind);
        self.levels[index] += 1;
        Ok(self.levels[index])
    }
}

// ============================================================================
// Rewards
// ============================================================================

/// What a kill pays out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KillReward {
    /// Gold
    pub gold: i64,
    /// Karma
    pub karma: i64,
    /// Experience
    pub exp: f32,
}

/// Random reward in `[n, n * 2.5]` for each currency, where `n` is the stage count (at least 1).
pub fn roll_reward(rng: &mut fastrand::Rng, stage_count: u32) -> KillReward {
    let low = stage_count.max(1) as f32;
    let high = low * 2.5;
    let mut roll = || low + rng.f32() * (high - low);
    KillReward {
        gold: roll().round() as i64,
        karma: roll().round() as i64,
        exp: roll(),
    }
}

/// Everything the player accumulates over a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    /// Currencies
    pub wallet: Wallet,
    /// Level and experience
    pub experience: Experience,
    /// Stage numbering
    pub stage: StageProgress,
    /// Stat upgrade levels
    pub stat_upgrades: StatUpgrades,
    /// Kills this run
    pub kills: u32,
    /// Player deaths
    pub deaths: u32,
}

impl Progression {
    /// Fresh progression.
    #[must_use]
    pub fn new(currency_ceiling: i64, max_upgrade_level: u32) -> Self {
        Self {
            wallet: Wallet::new(currency_ceiling),
            experience: Experience::new(),
            stage: StageProgress::new(),
            stat_upgrades: StatUpgrades::new(max_upgrade_level),
            kills: 0,
            deaths: 0,
        }
    }

    /// Pays out a kill. Returns levels gained.
    pub fn record_kill(&mut self, reward: KillReward) -> u32 {
        self.kills += 1;
        self.wallet.earn(Currency::Gold, reward.gold);
        self.wallet.earn(Currency::Karma, reward.karma);
        self.experience.add(reward.exp)
    }

    /// Buys a stat upgrade for `stats`.
    pub fn purchase_stat(&mut self, kind: StatKind, stats: &mut StatBlock) -> UpgradeResult<u32> {
        self.stat_upgrades.purchase(kind, &mut self.wallet, stats)
    }
}
