//! Weapons, armor and the equipped loadout.
//!
//! A weapon adds its impact amount to attack power, an armor piece adds its
//! impact amount to maximum health. At most one piece per slot is equipped.

use serde::{Deserialize, Serialize};
use skirmish_common::EquipmentId;
use thiserror::Error;

use crate::living::LivingEntity;
use crate::progression::{Currency, Wallet, WalletError};
use crate::stats::{StatBlock, StatKind};

/// Equipment system error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EquipmentError {
    /// No piece with that id
    #[error("unknown equipment: {0:?}")]
    UnknownPiece(EquipmentId),
    /// Piece has not been bought
    #[error("equipment is locked: {0:?}")]
    Locked(EquipmentId),
    /// Piece is already owned
    #[error("equipment already unlocked: {0:?}")]
    AlreadyUnlocked(EquipmentId),
    /// Piece is at its highest level
    #[error("equipment at max level: {0:?}")]
    MaxLevel(EquipmentId),
    /// Swapping armor would leave the new maximum at or below current health
    #[error("armor swap would drop max health to {new_max}, not above current {current}")]
    UnsafeHealthSwap {
        /// Maximum health after the swap
        new_max: i32,
        /// Current health
        current: i32,
    },
    /// No entity to equip
    #[error("no player in the arena")]
    NoPlayer,
    /// Not enough currency
    #[error(transparent)]
    Funds(#[from] WalletError),
}

/// Result type for equipment operations.
pub type EquipmentResult<T> = Result<T, EquipmentError>;

/// Equipment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    /// Raises attack power.
    Weapon,
    /// Raises maximum health.
    Armor,
}

impl EquipSlot {
    /// Stat affected by this slot.
    #[must_use]
    pub const fn stat(self) -> StatKind {
        match self {
            Self::Weapon => StatKind::AttackPower,
            Self::Armor => StatKind::Health,
        }
    }
}

/// Catalog entry for a piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentTemplate {
    /// Identifier
    pub id: EquipmentId,
    /// Display name
    pub name: String,
    /// Slot
    pub slot: EquipSlot,
    /// Highest level
    pub max_level: u32,
    /// Gold price to unlock
    pub buy_cost: i64,
    /// Gold price of the first upgrade
    pub upgrade_cost: i64,
    /// Bonus at level 1
    pub impact_amount: i32,
    /// Bonus gained per level
    pub impact_per_level: i32,
    /// Owned from the start
    #[serde(default)]
    pub unlocked: bool,
}

/// A piece of equipment owned (or purchasable) by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentPiece {
    id: EquipmentId,
    name: String,
    slot: EquipSlot,
    level: u32,
    max_level: u32,
    buy_cost: i64,
    upgrade_cost: i64,
    impact_amount: i32,
    impact_per_level: i32,
    unlocked: bool,
    equipped: bool,
}

impl EquipmentPiece {
    /// Level-1 piece from a template.
    #[must_use]
    pub fn from_template(template: &EquipmentTemplate) -> Self {
        Self {
            id: template.id,
            name: template.name.clone(),
            slot: template.slot,
            level: 1,
            max_level: template.max_level.max(1),
            buy_cost: template.buy_cost,
            upgrade_cost: template.upgrade_cost,
            impact_amount: template.impact_amount,
            impact_per_level: template.impact_per_level,
            unlocked: template.unlocked,
            equipped: false,
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> EquipmentId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot.
    #[must_use]
    pub const fn slot(&self) -> EquipSlot {
        self.slot
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Current bonus.
    #[must_use]
    pub const fn impact_amount(&self) -> i32 {
        self.impact_amount
    }

    /// Gold price of the next upgrade.
    #[must_use]
    pub const fn upgrade_cost(&self) -> i64 {
        self.upgrade_cost
    }

    /// Gold price to unlock.
    #[must_use]
    pub const fn buy_cost(&self) -> i64 {
        self.buy_cost
    }

    /// Whether the piece is owned.
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Whether the piece is worn.
    #[must_use]
    pub const fn is_equipped(&self) -> bool {
        self.equipped
    }
}

/// What an equip request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipOutcome {
    /// The piece is now worn.
    Equipped {
        /// Piece taken off to make room
        replaced: Option<EquipmentId>,
    },
    /// It was already worn.
    Unchanged,
}

/// All equipment pieces and which are worn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pieces: Vec<EquipmentPiece>,
}

fn apply_bonus(slot: EquipSlot, amount: i32, stats: &mut StatBlock, life: &mut LivingEntity) {
    match slot {
        EquipSlot::Weapon => stats.set_attack_bonus(amount),
        EquipSlot::Armor => {
            stats.set_health_bonus(amount);
            life.set_max_health(stats.max_health());
        },
    }
}

impl Loadout {
    /// Creates an empty loadout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loadout holding one level-1 piece per template.
    #[must_use]
    pub fn from_templates<'a>(templates: impl IntoIterator<Item = &'a EquipmentTemplate>) -> Self {
        Self {
            pieces: templates.into_iter().map(EquipmentPiece::from_template).collect(),
        }
    }

    /// All pieces.
    #[must_use]
    pub fn pieces(&self) -> &[EquipmentPiece] {
        &self.pieces
    }

    /// One piece.
    #[must_use]
    pub fn piece(&self, id: EquipmentId) -> Option<&EquipmentPiece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// Piece worn in `slot`.
    #[must_use]
    pub fn equipped(&self, slot: EquipSlot) -> Option<&EquipmentPiece> {
        self.pieces.iter().find(|p| p.slot == slot && p.equipped)
    }

    fn index_of(&self, id: EquipmentId) -> EquipmentResult<usize> {
        self.pieces
            .iter()
            .position(|p| p.id == id)
            .ok_or(EquipmentError::UnknownPiece(id))
    }

    /// Wears a piece, replacing whatever is in its slot.
    ///
    /// Swapping one armor piece for another is accepted only when the
    /// resulting maximum health stays strictly above current health; a new
    /// maximum equal to current health is refused.
    pub fn equip(
        &mut self,
        id: EquipmentId,
        stats: &mut StatBlock,
        life: &mut LivingEntity,
    ) -> EquipmentResult<EquipOutcome> {
        let index = self.index_of(id)?;
        let piece = &self.pieces[index];
        if !piece.unlocked {
            return Err(EquipmentError::Locked(id));
        }
        if piece.equipped {
            return Ok(EquipOutcome::Unchanged);
        }

        let slot = piece.slot;
        let new_amount = piece.impact_amount;
        let old_index = self.pieces.iter().position(|p| p.slot == slot && p.equipped);

        if let (EquipSlot::Armor, Some(old)) = (slot, old_index) {
            let new_max = life.max_health() - self.pieces[old].impact_amount + new_amount;
            if new_max <= life.current_health() {
                return Err(EquipmentError::UnsafeHealthSwap {
                    new_max,
                    current: life.current_health(),
                });
            }
        }

        apply_bonus(slot, new_amount, stats, life);
        let replaced = old_index.map(|old| {
            self.pieces[old].equipped = false;
            self.pieces[old].id
        });
        self.pieces[index].equipped = true;
        Ok(EquipOutcome::Equipped { replaced })
    }

    /// Takes off whatever is worn in `slot`.
    pub fn unequip(
        &mut self,
        slot: EquipSlot,
        stats: &mut StatBlock,
        life: &mut LivingEntity,
    ) -> Option<EquipmentId> {
        let piece = self.pieces.iter_mut().find(|p| p.slot == slot && p.equipped)?;
        piece.equipped = false;
        let id = piece.id;
        apply_bonus(slot, 0, stats, life);
        Some(id)
    }

    /// Unlocks a piece for Gold.
    pub fn purchase(&mut self, id: EquipmentId, wallet: &mut Wallet) -> EquipmentResult<i64> {
        let index = self.index_of(id)?;
        let piece = &mut self.pieces[index];
        if piece.unlocked {
            return Err(EquipmentError::AlreadyUnlocked(id));
        }
        wallet.spend(Currency::Gold, piece.buy_cost)?;
        piece.unlocked = true;
        Ok(piece.buy_cost)
    }

    /// Raises a piece one level for Gold. Returns the new level.
    ///
    /// The next upgrade costs 1.5x as much, capped at the wallet ceiling.
    /// A worn piece applies its new bonus immediately.
    pub fn upgrade(
        &mut self,
        id: EquipmentId,
        wallet: &mut Wallet,
        stats: &mut StatBlock,
        life: &mut LivingEntity,
    ) -> EquipmentResult<u32> {
        let index = self.index_of(id)?;
        let piece = &mut self.pieces[index];
        if !piece.unlocked {
            return Err(EquipmentError::Locked(id));
        }
        if piece.level >= piece.max_level {
            return Err(EquipmentError::MaxLevel(id));
        }
        wallet.spend(Currency::Gold, piece.upgrade_cost)?;

        piece.level += 1;
        piece.impact_amount = piece.impact_amount.saturating_add(piece.impact_per_level);
        let next_cost = (piece.upgrade_cost as f64 * 1.5).ceil() as i64;
        piece.upgrade_cost = next_cost.min(wallet.ceiling());

        if piece.equipped {
            apply_bonus(piece.slot, piece.impact_amount, stats, life);
        }
        Ok(piece.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(id: u32, slot: EquipSlot, impact: i32) -> EquipmentTemplate {
        EquipmentTemplate {
            id: EquipmentId::new(id),
            name: format!("piece {id}"),
            slot,
            max_level: 3,
            buy_cost: 100,
            upgrade_cost: 100,
            impact_amount: impact,
            impact_per_level: 10,
            unlocked: true,
        }
    }

    fn setup() -> (Loadout, StatBlock, LivingEntity) {
        let loadout = Loadout::from_templates(&[
            template(1, EquipSlot::Weapon, 5),
            template(2, EquipSlot::Weapon, 15),
            template(10, EquipSlot::Armor, 50),
            template(11, EquipSlot::Armor, 20),
        ]);
        let stats = StatBlock::new(100, 10);
        let life = LivingEntity::new(stats.max_health(), 0.0);
        (loadout, stats, life)
    }

    #[test]
    fn test_weapon_swap_replaces_bonus() {
        let (mut loadout, mut stats, mut life) = setup();
        let first = loadout.equip(EquipmentId::new(1), &mut stats, &mut life);
        assert_eq!(first, Ok(EquipOutcome::Equipped { replaced: None }));
        assert_eq!(stats.attack_power(), 15);

        let second = loadout.equip(EquipmentId::new(2), &mut stats, &mut life);
        assert_eq!(
            second,
            Ok(EquipOutcome::Equipped {
                replaced: Some(EquipmentId::new(1))
            })
        );
        assert_eq!(stats.attack_power(), 25);
        assert_eq!(
            loadout.equipped(EquipSlot::Weapon).map(EquipmentPiece::id),
            Some(EquipmentId::new(2))
        );
    }

    #[test]
    fn test_equip_twice_is_unchanged() {
        let (mut loadout, mut stats, mut life) = setup();
        assert!(loadout.equip(EquipmentId::new(1), &mut stats, &mut life).is_ok());
        assert_eq!(
            loadout.equip(EquipmentId::new(1), &mut stats, &mut life),
            Ok(EquipOutcome::Unchanged)
        );
    }

    #[test]
    fn test_unsafe_armor_swap_is_refused() {
        let (mut loadout, mut stats, mut life) = setup();
        assert!(loadout.equip(EquipmentId::new(10), &mut stats, &mut life).is_ok());
        life.recover(1000);
        assert_eq!(life.current_health(), 150);

        let err = loadout.equip(EquipmentId::new(11), &mut stats, &mut life);
        assert_eq!(
            err,
            Err(EquipmentError::UnsafeHealthSwap {
                new_max: 120,
                current: 150
            })
        );
        assert_eq!(life.max_health(), 150);
        assert_eq!(
            loadout.equipped(EquipSlot::Armor).map(EquipmentPiece::id),
            Some(EquipmentId::new(10))
        );
    }

    #[test]
    fn test_armor_swap_refused_at_exact_health() {
        let (mut loadout, mut stats, mut life) = setup();
        assert!(loadout.equip(EquipmentId::new(10), &mut stats, &mut life).is_ok());
        // Current 100 of 150; heal to exactly the post-swap maximum of 120.
        life.recover(20);
        assert_eq!(
            loadout.equip(EquipmentId::new(11), &mut stats, &mut life),
            Err(EquipmentError::UnsafeHealthSwap {
                new_max: 120,
                current: 120
            })
        );
        assert_eq!(life.max_health(), 150);
    }

    fn light_and_heavy() -> (Loadout, StatBlock, LivingEntity) {
        let loadout = Loadout::from_templates(&[
            template(20, EquipSlot::Armor, 20),
            template(21, EquipSlot::Armor, 5),
        ]);
        let stats = StatBlock::new(80, 10);
        let life = LivingEntity::new(stats.max_health(), 0.0);
        (loadout, stats, life)
    }

    #[test]
    fn test_armor_swap_health_boundary() {
        // 100 max with a +20 piece worn; swapping to +5 gives 85.
        let (mut loadout, mut stats, mut life) = light_and_heavy();
        assert!(loadout.equip(EquipmentId::new(20), &mut stats, &mut life).is_ok());
        life.recover(15);
        assert_eq!((life.current_health(), life.max_health()), (95, 100));
        assert_eq!(
            loadout.equip(EquipmentId::new(21), &mut stats, &mut life),
            Err(EquipmentError::UnsafeHealthSwap {
                new_max: 85,
                current: 95
            })
        );
        assert_eq!(life.max_health(), 100);

        let (mut loadout, mut stats, mut life) = light_and_heavy();
        assert!(loadout.equip(EquipmentId::new(20), &mut stats, &mut life).is_ok());
        assert_eq!((life.current_health(), life.max_health()), (80, 100));
        assert_eq!(
            loadout.equip(EquipmentId::new(21), &mut stats, &mut life),
            Ok(EquipOutcome::Equipped {
                replaced: Some(EquipmentId::new(20))
            })
        );
        assert_eq!((life.current_health(), life.max_health()), (80, 85));
    }

    #[test]
    fn test_locked_piece_cannot_be_equipped() {
        let mut locked = template(3, EquipSlot::Weapon, 1);
        locked.unlocked = false;
        let mut loadout = Loadout::from_templates(&[locked]);
        let mut stats = StatBlock::new(100, 10);
        let mut life = LivingEntity::new(100, 0.0);
        assert_eq!(
            loadout.equip(EquipmentId::new(3), &mut stats, &mut life),
            Err(EquipmentError::Locked(EquipmentId::new(3)))
        );

        let mut wallet = Wallet::default();
        wallet.earn(Currency::Gold, 100);
        assert_eq!(loadout.purchase(EquipmentId::new(3), &mut wallet), Ok(100));
        assert!(loadout.equip(EquipmentId::new(3), &mut stats, &mut life).is_ok());
    }

    #[test]
    fn test_upgrade_scales_cost_and_reapplies() {
        let (mut loadout, mut stats, mut life) = setup();
        let mut wallet = Wallet::default();
        wallet.earn(Currency::Gold, 1_000);
        assert!(loadout.equip(EquipmentId::new(1), &mut stats, &mut life).is_ok());

        assert_eq!(
            loadout.upgrade(EquipmentId::new(1), &mut wallet, &mut stats, &mut life),
            Ok(2)
        );
        assert_eq!(stats.attack_power(), 25);
        assert_eq!(wallet.balance(Currency::Gold), 900);
        assert_eq!(loadout.piece(EquipmentId::new(1)).map(EquipmentPiece::upgrade_cost), Some(150));

        assert!(loadout
            .upgrade(EquipmentId::new(1), &mut wallet, &mut stats, &mut life)
            .is_ok());
        assert_eq!(
            loadout.upgrade(EquipmentId::new(1), &mut wallet, &mut stats, &mut life),
            Err(EquipmentError::MaxLevel(EquipmentId::new(1)))
        );
    }

    #[test]
    fn test_unequip_clears_bonus() {
        let (mut loadout, mut stats, mut life) = setup();
        assert!(loadout.equip(EquipmentId::new(10), &mut stats, &mut life).is_ok());
        assert_eq!(loadout.unequip(EquipSlot::Armor, &mut stats, &mut life), Some(EquipmentId::new(10)));
        assert_eq!(life.max_health(), 100);
        assert!(loadout.equipped(EquipSlot::Armor).is_none());
    }
}
