//! Combat state machine bookkeeping.
//!
//! [`StateMachine`] only tracks which state is current and which transition
//! is queued; the per-state enter, update and exit behaviour lives on the
//! entity that drives it. Transitions follow these rules:
//! - a request made while a transition is running is queued, and a later
//!   request overwrites an earlier queued one
//! - the old state always exits before the new one enters
//! - `Die` is terminal until `Init`, and a queued `Die` cannot be replaced
//!   by anything except `Init`

use serde::{Deserialize, Serialize};

/// States of the combat machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatState {
    /// Spawning: reset health and bindings.
    Init,
    /// No target, or waiting for one.
    Idle,
    /// Player-driven movement.
    Control,
    /// Moving towards the target.
    Track,
    /// In range and swinging.
    Attack,
    /// Casting a skill.
    Skill,
    /// Dead until respawned.
    Die,
}

impl CombatState {
    /// Every state.
    pub const ALL: [Self; 7] = [
        Self::Init,
        Self::Idle,
        Self::Control,
        Self::Track,
        Self::Attack,
        Self::Skill,
        Self::Die,
    ];

    /// Whether the state refuses every transition except `Init`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Die)
    }
}

impl std::fmt::Display for CombatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Idle => "Idle",
            Self::Control => "Control",
            Self::Track => "Track",
            Self::Attack => "Attack",
            Self::Skill => "Skill",
            Self::Die => "Die",
        };
        f.write_str(name)
    }
}

/// What happened to a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRequest {
    /// No transition was running; the caller should run it now.
    Accepted,
    /// Queued behind the running transition.
    Deferred,
    /// Refused because the entity is dead.
    Refused,
}

/// Current state, previous state and the queued transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    current: CombatState,
    previous: Option<CombatState>,
    pending: Option<CombatState>,
    transitioning: bool,
    entered_at: f64,
    transitions: u64,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Creates a machine sitting in `Init`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            current: CombatState::Init,
            previous: None,
            pending: None,
            transitioning: false,
            entered_at: 0.0,
            transitions: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn current(&self) -> CombatState {
        self.current
    }

    /// State before the last transition.
    #[must_use]
    pub const fn previous(&self) -> Option<CombatState> {
        self.previous
    }

    /// Whether an exit/enter sequence is running.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Queued target state.
    #[must_use]
    pub const fn pending(&self) -> Option<CombatState> {
        self.pending
    }

    /// Seconds spent in the current state.
    #[must_use]
    pub fn time_in_state(&self, now: f64) -> f64 {
        (now - self.entered_at).max(0.0)
    }

    /// Total committed transitions.
    #[must_use]
    pub const fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Asks for a transition to `next`.
    pub fn request(&mut self, next: CombatState) -> TransitionRequest {
        if next != CombatState::Init {
            let dead_now = self.current.is_terminal() && !self.transitioning;
            let dying = self.pending == Some(CombatState::Die);
            let entering_die = self.transitioning && self.current.is_terminal();
            if dead_now || dying || entering_die {
                return TransitionRequest::Refused;
            }
        }

        self.pending = Some(next);
        if self.transitioning {
            TransitionRequest::Deferred
        } else {
            self.transitioning = true;
            TransitionRequest::Accepted
        }
    }

    /// Takes the queued target, ending the transition when nothing is left.
    pub fn next_pending(&mut self) -> Option<CombatState> {
        let next = self.pending.take();
        if next.is_none() {
            self.transitioning = false;
        }
        next
    }

    /// Records that `next` is now current. Call between exit and enter.
    pub fn commit(&mut self, next: CombatState, now: f64) {
        self.previous = Some(self.current);
        self.current = next;
        self.entered_at = now;
        self.transitions += 1;
    }

    /// Drops any queued transition and marks the sequence finished.
    pub fn abort(&mut self) {
        self.pending = None;
        self.transitioning = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fsm: &mut StateMachine, next: CombatState, now: f64) {
        assert_eq!(fsm.request(next), TransitionRequest::Accepted);
        while let Some(target) = fsm.next_pending() {
            fsm.commit(target, now);
        }
    }

    #[test]
    fn test_starts_in_init() {
        let fsm = StateMachine::new();
        assert_eq!(fsm.current(), CombatState::Init);
        assert!(fsm.previous().is_none());
    }

    #[test]
    fn test_request_during_transition_is_deferred_and_overwritten() {
        let mut fsm = StateMachine::new();
        assert_eq!(fsm.request(CombatState::Idle), TransitionRequest::Accepted);
        let first = fsm.next_pending();
        assert_eq!(first, Some(CombatState::Idle));

        assert_eq!(fsm.request(CombatState::Track), TransitionRequest::Deferred);
        assert_eq!(fsm.request(CombatState::Attack), TransitionRequest::Deferred);
        fsm.commit(CombatState::Idle, 0.0);

        assert_eq!(fsm.next_pending(), Some(CombatState::Attack));
        fsm.commit(CombatState::Attack, 0.0);
        assert_eq!(fsm.next_pending(), None);
        assert!(!fsm.is_transitioning());
        assert_eq!(fsm.previous(), Some(CombatState::Idle));
    }

    #[test]
    fn test_die_is_terminal_until_init() {
        let mut fsm = StateMachine::new();
        run(&mut fsm, CombatState::Die, 0.0);

        for state in CombatState::ALL {
            if state != CombatState::Init {
                assert_eq!(fsm.request(state), TransitionRequest::Refused);
            }
        }
        run(&mut fsm, CombatState::Init, 1.0);
        assert_eq!(fsm.current(), CombatState::Init);
    }

    #[test]
    fn test_queued_die_is_not_overwritten() {
        let mut fsm = StateMachine::new();
        fsm.request(CombatState::Attack);
        let _ = fsm.next_pending();
        assert_eq!(fsm.request(CombatState::Die), TransitionRequest::Deferred);
        assert_eq!(fsm.request(CombatState::Idle), TransitionRequest::Refused);
        fsm.commit(CombatState::Attack, 0.0);
        assert_eq!(fsm.next_pending(), Some(CombatState::Die));
    }

    #[test]
    fn test_requests_while_entering_die_are_refused() {
        let mut fsm = StateMachine::new();
        fsm.request(CombatState::Die);
        let target = fsm.next_pending();
        fsm.commit(target.unwrap_or(CombatState::Die), 0.0);
        // Still inside Die's enter hook.
        assert_eq!(fsm.request(CombatState::Idle), TransitionRequest::Refused);
        assert_eq!(fsm.next_pending(), None);
    }

    #[test]
    fn test_time_in_state() {
        let mut fsm = StateMachine::new();
        run(&mut fsm, CombatState::Idle, 2.0);
        assert!((fsm.time_in_state(2.5) - 0.5).abs() < 1e-9);
        assert_eq!(fsm.transition_count(), 1);
    }
}
