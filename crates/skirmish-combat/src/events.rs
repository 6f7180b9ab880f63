//! Event bus for combat notifications.
//!
//! Health bars, status panels, currency displays and animation layers all
//! observe the combat core through this bus instead of being called
//! directly. Publishing never blocks; when the channel is full the event is
//! dropped with a warning. The animation layer relies on `AttackTriggered`
//! arriving, so the bus must hold everything published between drains.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use skirmish_common::{EntityId, EquipmentId};

use crate::catalog::MonsterKind;
use crate::equipment::EquipSlot;
use crate::fsm::CombatState;
use crate::progression::Currency;
use crate::skills::SkillKind;
use crate::stats::StatKind;

/// Animation cues published for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationSignal {
    /// An attack swing started.
    AttackTriggered,
    /// An attack swing was interrupted.
    AttackCanceled,
    /// A skill effect fired.
    SkillTriggered,
    /// The death animation started.
    DieTriggered,
}

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Health changed (damage, healing, max-health change)
    HealthChanged {
        /// Entity ID
        entity: EntityId,
        /// Current health
        current: i32,
        /// Maximum health
        max: i32,
    },
    /// Entity died
    Died {
        /// Entity ID
        entity: EntityId,
        /// Killer (if any)
        killer: Option<EntityId>,
    },
    /// Combat state changed
    StateChanged {
        /// Entity ID
        entity: EntityId,
        /// Previous state
        from: CombatState,
        /// New state
        to: CombatState,
    },
    /// Animation cue
    Animation {
        /// Entity ID
        entity: EntityId,
        /// Cue
        signal: AnimationSignal,
    },
    /// Current target changed
    TargetChanged {
        /// Entity ID
        entity: EntityId,
        /// New target
        target: Option<EntityId>,
    },
    /// Skill cast started
    SkillCast {
        /// Caster
        entity: EntityId,
        /// Skill
        skill: SkillKind,
    },
    /// Skill came off cooldown
    SkillReady {
        /// Slot index
        slot: usize,
        /// Skill
        skill: SkillKind,
    },
    /// Skill level went up
    SkillUpgraded {
        /// Skill
        skill: SkillKind,
        /// New level
        level: u32,
        /// New effect amount
        effect_amount: i32,
    },
    /// Equipment equipped or unequipped
    EquipmentChanged {
        /// Piece
        piece: EquipmentId,
        /// Slot
        slot: EquipSlot,
        /// Whether it is now equipped
        equipped: bool,
    },
    /// Equipment unlocked or levelled
    EquipmentUpgraded {
        /// Piece
        piece: EquipmentId,
        /// New level
        level: u32,
    },
    /// Displayed stat changed
    StatusChanged {
        /// Stat
        stat: StatKind,
        /// New value
        value: f32,
    },
    /// Currency balance changed
    CurrencyChanged {
        /// Currency
        currency: Currency,
        /// New balance
        balance: i64,
    },
    /// Experience changed
    ExperienceChanged {
        /// Current level
        level: u32,
        /// Experience into the level
        exp: f32,
        /// Experience needed for the next level
        needed: f32,
    },
    /// Player levelled up
    LevelUp {
        /// New level
        level: u32,
    },
    /// Monster entered play
    MonsterSpawned {
        /// Entity ID
        entity: EntityId,
        /// Archetype
        kind: MonsterKind,
    },
    /// Monster went back to the pool
    MonsterReturned {
        /// Entity ID
        entity: EntityId,
    },
    /// A wave started spawning
    WaveStarted {
        /// Stage label, e.g. "1-3"
        stage: String,
        /// Monsters in this wave
        size: u32,
    },
    /// Every monster of the wave is dead
    WaveCleared {
        /// Stage label
        stage: String,
    },
    /// The player died
    GameOver {
        /// Total deaths so far
        deaths: u32,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
    /// Events lost to a full channel
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            dropped: AtomicU64::new(0),
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: CombatEvent) {
        if let Err(err) = self.sender.try_send(event) {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                event = ?err.into_inner(),
                capacity = self.capacity,
                dropped,
                "event bus full, dropping event"
            );
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
    }

    /// Drains pending events into every handler, in publish order.
    ///
    /// Returns the number of events dispatched.
    pub fn dispatch(&self, handlers: &mut [&mut dyn EventHandler]) -> usize {
        let mut count = 0;
        for event in self.receiver.try_iter() {
            for handler in handlers.iter_mut() {
                handler.handle(&event);
            }
            count += 1;
        }
        count
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Events dropped because the bus was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<CombatEvent> {
        self.sender.clone()
    }
}

/// Typed event handler trait.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &CombatEvent);
}
