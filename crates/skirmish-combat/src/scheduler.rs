//! Deferred routines keyed to simulation time.
//!
//! Multi-tick behaviour (dash steps, cast recovery, return-to-pool, wave
//! spawning) is expressed as tasks that wake on a later tick. Tasks owned by
//! an entity carry its [`Lifetime`] so they can be cancelled when it dies
//! and recognised as stale if it has since been reused.

use serde::{Deserialize, Serialize};
use skirmish_common::{EntityId, Lifetime};

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Who owns a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskScope {
    /// Arena-level task, cancelled only explicitly.
    Global,
    /// Task bound to one life of an entity.
    Entity(Lifetime),
}

impl TaskScope {
    /// The owning entity, if any.
    #[must_use]
    pub const fn entity(self) -> Option<EntityId> {
        match self {
            Self::Global => None,
            Self::Entity(life) => Some(life.entity),
        }
    }
}

/// When a task should run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Wake {
    /// On the next drain.
    NextTick,
    /// After this many seconds.
    After(f32),
}

/// A task whose wake time has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct DueTask<T> {
    /// Task handle
    pub id: TaskId,
    /// Owner
    pub scope: TaskScope,
    /// Payload
    pub payload: T,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    id: TaskId,
    scope: TaskScope,
    due: f64,
    payload: T,
}

/// Time-ordered task queue.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    pending: Vec<Pending<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    /// Creates an empty scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Schedules `payload` relative to `now`.
    pub fn schedule(&mut self, now: f64, scope: TaskScope, wake: Wake, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let due = match wake {
            Wake::NextTick => now,
            Wake::After(delay) => now + f64::from(delay.max(0.0)),
        };
        self.pending.push(Pending {
            id,
            scope,
            due,
            payload,
        });
        id
    }

    /// Cancels one task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancels every task owned by `entity`, whatever its generation.
    pub fn cancel_scope(&mut self, entity: EntityId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.scope.entity() != Some(entity));
        before - self.pending.len()
    }

    /// Cancels every global task.
    pub fn cancel_global(&mut self) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.scope != TaskScope::Global);
        before - self.pending.len()
    }

    /// Removes and returns every task due at `now`, earliest first.
    ///
    /// Tasks scheduled while the returned batch is being processed wait for
    /// the next drain, so a routine that reschedules itself with
    /// [`Wake::NextTick`] runs once per tick.
    pub fn drain_due(&mut self, now: f64) -> Vec<DueTask<T>> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|t| t.due <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter()
            .map(|t| DueTask {
                id: t.id,
                scope: t.scope,
                payload: t.payload,
            })
            .collect()
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending tasks owned by `entity`.
    #[must_use]
    pub fn pending_for(&self, entity: EntityId) -> usize {
        self.pending
            .iter()
            .filter(|t| t.scope.entity() == Some(entity))
            .count()
    }
}
