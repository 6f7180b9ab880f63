//! Stand-in for the animation layer.
//!
//! With [`StrikeMode::AnimationEvent`](skirmish_combat::StrikeMode) a swing
//! only deals damage when its strike frame is reported. Headless runs have
//! no animator, so this driver watches the event stream and reports the
//! strike frame a fixed delay after each swing starts.

use skirmish_combat::{AnimationSignal, CombatEvent, CombatState, EventHandler};
use skirmish_common::EntityId;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingStrike {
    entity: EntityId,
    due: f64,
}

/// Emulated attack animations.
#[derive(Debug, Default)]
pub struct AnimationDriver {
    strike_delay: f64,
    now: f64,
    pending: Vec<PendingStrike>,
}

impl AnimationDriver {
    /// Creates a driver whose strike frame lands `strike_delay` seconds into a swing.
    #[must_use]
    pub fn new(strike_delay: f32) -> Self {
        Self {
            strike_delay: f64::from(strike_delay.max(0.0)),
            now: 0.0,
            pending: Vec::new(),
        }
    }

    /// Sets the time stamped on swings seen from now on.
    pub fn set_time(&mut self, now: f64) {
        self.now = now;
    }

    /// Swings in progress.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Removes and returns the entities whose strike frame has come.
    pub fn take_due(&mut self, now: f64) -> Vec<EntityId> {
        let (due, waiting): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;
        due.into_iter().map(|p| p.entity).collect()
    }

    /// Drops every swing in progress.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn cancel(&mut self, entity: EntityId) {
        self.pending.retain(|p| p.entity != entity);
    }
}

impl EventHandler for AnimationDriver {
    fn handle(&mut self, event: &CombatEvent) {
        match event {
            CombatEvent::Animation { entity, signal } => match signal {
                AnimationSignal::AttackTriggered => {
                    self.cancel(*entity);
                    trace!(%entity, "swing started");
                    self.pending.push(PendingStrike {
                        entity: *entity,
                        due: self.now + self.strike_delay,
                    });
                },
                AnimationSignal::AttackCanceled | AnimationSignal::DieTriggered => self.cancel(*entity),
                AnimationSignal::SkillTriggered => {},
            },
            CombatEvent::StateChanged { entity, from, .. } if *from == CombatState::Attack => {
                self.cancel(*entity);
            },
            CombatEvent::MonsterReturned { entity } => self.cancel(*entity),
            _ => {},
        }
    }
}
