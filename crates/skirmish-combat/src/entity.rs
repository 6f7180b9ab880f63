//! Combat entities.
//!
//! A [`CombatEntity`] is the player or a monster: stats, health, a state
//! machine, a targeting strategy and, for the player, skills and equipment.
//! The per-state enter, update and exit hooks live here; the arena calls
//! [`CombatEntity::update`] once per simulation tick and
//! [`CombatEntity::fixed_update`] once per physics step.

use serde::{Deserialize, Serialize};
use skirmish_common::{
    direction_to, distance, move_towards, turn_towards, EntityId, EquipmentId, Lifetime, Vec2,
    EPSILON,
};
use tracing::{debug, trace, warn};

use crate::catalog::{MonsterArchetype, MonsterKind, PlayerArchetype};
use crate::equipment::{EquipOutcome, EquipSlot, EquipmentResult, Loadout};
use crate::events::{AnimationSignal, CombatEvent};
use crate::fsm::{CombatState, StateMachine, TransitionRequest};
use crate::living::{DamageMessage, DamageOutcome, DamageRejection, DamageTarget, LivingEntity};
use crate::projectile::EffectKind;
use crate::scheduler::Wake;
use crate::skills::{skill_damage, SkillController, SkillError, SkillKind, SkillResult, SkillTargeting};
use crate::stats::{StatBlock, StatKind};
use crate::targeting::{
    BindToPlayer, Layer, NearestMonster, RayHit, Seeker, TargetInfo, TargetingStrategy,
};
use crate::world::{CombatWorld, EntityRoutine, ProjectileLaunch};

/// Transitions allowed inside one `change_state` call before it gives up.
const MAX_CHAINED_TRANSITIONS: usize = 16;

/// Dash and approach movement stop this fraction of attack range short of the target.
const APPROACH_FRACTION: f32 = 0.9;

/// When a melee swing deals its damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrikeMode {
    /// As soon as the cadence gate opens.
    #[default]
    Immediate,
    /// When the animation layer reports the strike frame.
    AnimationEvent,
}

/// Player or monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player.
    Player,
    /// A monster of the given archetype.
    Monster(MonsterKind),
}

impl EntityKind {
    /// Collision layer while alive.
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::Player => Layer::Player,
            Self::Monster(_) => Layer::Monster,
        }
    }
}

/// Animation state flags read by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationFlags {
    /// Walking
    pub walking: bool,
    /// Swinging
    pub attacking: bool,
    /// Casting
    pub casting_skill: bool,
    /// Dying
    pub dying: bool,
    /// Health bar shown
    pub health_bar_visible: bool,
}

impl Default for AnimationFlags {
    fn default() -> Self {
        Self {
            walking: false,
            attacking: false,
            casting_skill: false,
            dying: false,
            health_bar_visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ActiveCast {
    Dash { skill: SkillKind, damage: i32 },
    Recovering { skill: SkillKind },
}

/// The player or a monster.
#[derive(Debug)]
pub struct CombatEntity {
    id: EntityId,
    generation: u32,
    kind: EntityKind,
    active: bool,
    position: Vec2,
    facing: Vec2,
    body_radius: f32,
    layer: Layer,
    life: LivingEntity,
    stats: StatBlock,
    fsm: StateMachine,
    target: Option<EntityId>,
    last_attack_at: Option<f64>,
    anim: AnimationFlags,
    strike_mode: StrikeMode,
    strike_armed: bool,
    targeting: Box<dyn TargetingStrategy>,
    controlling: bool,
    move_input: Vec2,
    skills: Option<SkillController>,
    loadout: Loadout,
    cast: Option<ActiveCast>,
}

impl CombatEntity {
    fn with_parts(
        kind: EntityKind,
        stats: StatBlock,
        body_radius: f32,
        min_hit_interval: f32,
        strike_mode: StrikeMode,
        targeting: Box<dyn TargetingStrategy>,
    ) -> Self {
        Self {
            id: EntityId::new(),
            generation: 0,
            kind,
            active: false,
            position: Vec2::ZERO,
            facing: Vec2::Y,
            body_radius,
            layer: Layer::Ignore,
            life: LivingEntity::new(stats.max_health(), min_hit_interval),
            stats,
            fsm: StateMachine::new(),
            target: None,
            last_attack_at: None,
            anim: AnimationFlags::default(),
            strike_mode,
            strike_armed: false,
            targeting,
            controlling: false,
            move_input: Vec2::ZERO,
            skills: None,
            loadout: Loadout::new(),
            cast: None,
        }
    }

    /// Creates an inactive player. Call [`Self::spawn`] to bring it into play.
    #[must_use]
    pub fn player(archetype: &PlayerArchetype, skills: SkillController, loadout: Loadout) -> Self {
        let mut entity = Self::with_parts(
            EntityKind::Player,
            archetype.stats.clone(),
            archetype.body_radius,
            archetype.min_hit_interval,
            archetype.strike_mode,
            Box::new(NearestMonster {
                scan_distance: archetype.scan_distance,
            }),
        );
        entity.skills = Some(skills);
        entity.loadout = loadout;
        entity
    }

    /// Creates an inactive monster. Call [`Self::spawn`] to bring it into play.
    #[must_use]
    pub fn monster(archetype: &MonsterArchetype) -> Self {
        Self::with_parts(
            EntityKind::Monster(archetype.kind),
            archetype.stats.clone(),
            archetype.body_radius,
            archetype.min_hit_interval,
            archetype.strike_mode,
            Box::new(BindToPlayer),
        )
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Entity ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Current life of this entity.
    #[must_use]
    pub const fn lifetime(&self) -> Lifetime {
        Lifetime::new(self.id, self.generation)
    }

    /// Player or monster kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Whether this is the player.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player)
    }

    /// Whether the entity is in play (not pooled).
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the entity is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.life.is_dead()
    }

    /// Position on the floor.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Unit facing direction.
    #[must_use]
    pub const fn facing(&self) -> Vec2 {
        self.facing
    }

    /// Body radius.
    #[must_use]
    pub const fn body_radius(&self) -> f32 {
        self.body_radius
    }

    /// Current collision layer.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Health pool.
    #[must_use]
    pub const fn life(&self) -> &LivingEntity {
        &self.life
    }

    /// Stats.
    #[must_use]
    pub const fn stats(&self) -> &StatBlock {
        &self.stats
    }

    /// Current combat state.
    #[must_use]
    pub const fn state(&self) -> CombatState {
        self.fsm.current()
    }

    /// State machine bookkeeping.
    #[must_use]
    pub const fn state_machine(&self) -> &StateMachine {
        &self.fsm
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Time of the last swing.
    #[must_use]
    pub const fn last_attack_at(&self) -> Option<f64> {
        self.last_attack_at
    }

    /// Animation flags.
    #[must_use]
    pub const fn animation(&self) -> AnimationFlags {
        self.anim
    }

    /// Strike timing.
    #[must_use]
    pub const fn strike_mode(&self) -> StrikeMode {
        self.strike_mode
    }

    /// Whether a swing is waiting for its strike frame.
    #[must_use]
    pub const fn is_strike_armed(&self) -> bool {
        self.strike_armed
    }

    /// Whether the player is steering.
    #[must_use]
    pub const fn is_controlling(&self) -> bool {
        self.controlling
    }

    /// Whether a skill is being cast (including a dash).
    #[must_use]
    pub const fn is_casting(&self) -> bool {
        self.cast.is_some()
    }

    /// Whether a Phantom Blade dash is in progress.
    #[must_use]
    pub const fn is_dashing(&self) -> bool {
        matches!(self.cast, Some(ActiveCast::Dash { .. }))
    }

    /// Skills, if this entity has any.
    #[must_use]
    pub const fn skills(&self) -> Option<&SkillController> {
        self.skills.as_ref()
    }

    /// Equipment.
    #[must_use]
    pub const fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    /// Moves the entity without any combat side effects.
    pub fn place(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Changes how swings deal damage.
    pub fn set_strike_mode(&mut self, mode: StrikeMode) {
        self.strike_mode = mode;
        if mode == StrikeMode::Immediate {
            self.strike_armed = false;
        }
    }

    pub(crate) fn skills_mut(&mut self) -> Option<&mut SkillController> {
        self.skills.as_mut()
    }

    pub(crate) fn gear_mut(&mut self) -> (&mut Loadout, &mut StatBlock, &mut LivingEntity) {
        (&mut self.loadout, &mut self.stats, &mut self.life)
    }

    pub(crate) fn stats_and_life_mut(&mut self) -> (&mut StatBlock, &mut LivingEntity) {
        (&mut self.stats, &mut self.life)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Brings the entity into play at `position` as a new life.
    ///
    /// `stats` replaces the current stat block when given. The entity goes
    /// through `Init` and settles in `Idle` or `Track`.
    pub fn spawn<W: CombatWorld>(&mut self, position: Vec2, stats: Option<StatBlock>, world: &mut W) {
        if let Some(stats) = stats {
            self.stats = stats;
        }
        self.generation = self.generation.wrapping_add(1);
        self.active = true;
        self.position = position;
        self.change_state(CombatState::Init, world);
    }

    /// Takes the entity out of play.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.layer = Layer::Ignore;
        self.target = None;
        self.controlling = false;
        self.move_input = Vec2::ZERO;
        self.strike_armed = false;
        self.cast = None;
        self.anim.walking = false;
        self.anim.attacking = false;
        self.anim.casting_skill = false;
    }

    // ------------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------------

    /// Requests a state change and runs the exit/enter sequence.
    ///
    /// Called from inside a hook, the request is queued and runs after the
    /// current hook returns.
    pub fn change_state<W: CombatWorld>(&mut self, next: CombatState, world: &mut W) {
        match self.fsm.request(next) {
            TransitionRequest::Accepted => {},
            TransitionRequest::Deferred => {
                trace!(entity = %self.id, to = %next, "transition queued");
                return;
            },
            TransitionRequest::Refused => {
                trace!(entity = %self.id, to = %next, "transition refused");
                return;
            },
        }

        let mut chained = 0;
        while let Some(target) = self.fsm.next_pending() {
            chained += 1;
            if chained > MAX_CHAINED_TRANSITIONS {
                warn!(entity = %self.id, to = %target, "transition chain too long, dropping");
                self.fsm.abort();
                break;
            }
            let from = self.fsm.current();
            self.exit_state(from, world);
            self.fsm.commit(target, world.now());
            debug!(entity = %self.id, %from, to = %target, "state changed");
            world.publish(CombatEvent::StateChanged {
                entity: self.id,
                from,
                to: target,
            });
            self.enter_state(target, world);
        }
    }

    fn enter_state<W: CombatWorld>(&mut self, state: CombatState, world: &mut W) {
        match state {
            CombatState::Init => self.enter_init(world),
            CombatState::Idle => self.anim.walking = false,
            CombatState::Control | CombatState::Track => self.anim.walking = true,
            CombatState::Attack => {
                if self.valid_target(&*world).is_none() {
                    self.set_target(None, world);
                    self.change_state(CombatState::Idle, world);
                }
            },
            CombatState::Skill => {
                self.anim.attacking = false;
                self.anim.casting_skill = true;
            },
            CombatState::Die => self.enter_die(world),
        }
    }

    fn exit_state<W: CombatWorld>(&mut self, state: CombatState, _world: &mut W) {
        match state {
            CombatState::Control | CombatState::Track => self.anim.walking = false,
            CombatState::Attack => {
                self.anim.attacking = false;
                self.strike_armed = false;
            },
            CombatState::Skill => {
                self.anim.attacking = false;
                self.anim.casting_skill = false;
                self.cast = None;
            },
            CombatState::Init | CombatState::Idle | CombatState::Die => {},
        }
    }

    fn enter_init<W: CombatWorld>(&mut self, world: &mut W) {
        self.life.reset(self.stats.max_health());
        self.anim = AnimationFlags::default();
        self.layer = self.kind.layer();
        self.strike_armed = false;
        self.cast = None;
        self.last_attack_at = None;
        self.controlling = false;
        self.move_input = Vec2::ZERO;
        if let Some(skills) = self.skills.as_mut() {
            skills.reset_cooldowns();
        }
        world.publish(CombatEvent::HealthChanged {
            entity: self.id,
            current: self.life.current_health(),
            max: self.life.max_health(),
        });

        self.set_target(None, world);
        if !self.targeting.rescans_every_tick() {
            self.reacquire(world);
        }
        let next = if self.valid_target(&*world).is_some() {
            CombatState::Track
        } else {
            CombatState::Idle
        };
        self.change_state(next, world);
    }

    fn enter_die<W: CombatWorld>(&mut self, world: &mut W) {
        self.anim = AnimationFlags {
            dying: true,
            health_bar_visible: false,
            ..AnimationFlags::default()
        };
        self.layer = Layer::Ignore;
        self.strike_armed = false;
        self.cast = None;
        self.controlling = false;
        self.move_input = Vec2::ZERO;
        let cancelled = world.cancel_routines(self.id);
        world.publish(CombatEvent::Animation {
            entity: self.id,
            signal: AnimationSignal::DieTriggered,
        });
        if !self.is_player() {
            world.spawn_effect(EffectKind::DeathBurst, self.position, self.facing);
        }
        self.set_target(None, world);
        debug!(entity = %self.id, cancelled, "entity died");
    }

    // ------------------------------------------------------------------------
    // Per-tick hooks
    // ------------------------------------------------------------------------

    /// Runs the current state's update hook.
    pub fn update<W: CombatWorld>(&mut self, world: &mut W) {
        if !self.active || self.life.is_dead() || !world.is_playing() {
            return;
        }
        match self.fsm.current() {
            CombatState::Idle => self.update_idle(world),
            CombatState::Track => self.update_track(world),
            CombatState::Attack => self.update_attack(world),
            CombatState::Skill => {
                if self.cast.is_none() {
                    self.change_state(self.after_cast_state(), world);
                }
            },
            CombatState::Init | CombatState::Control | CombatState::Die => {},
        }
    }

    /// Runs movement for the current state.
    pub fn fixed_update<W: CombatWorld>(&mut self, dt: f32, world: &mut W) {
        if !self.active || self.life.is_dead() || !world.is_playing() {
            return;
        }
        let turn_rate = world.config().turn_rate;
        match self.fsm.current() {
            CombatState::Control => {
                let step = self.move_input * self.stats.move_speed() * dt;
                if step.length_squared() > EPSILON * EPSILON {
                    self.position += step;
                    self.facing = turn_towards(self.facing, step, turn_rate);
                }
            },
            CombatState::Track => {
                let Some(info) = self.valid_target(&*world) else {
                    return;
                };
                if !self.in_range(&info) {
                    let step = self.stats.move_speed() * dt;
                    self.approach(info.position, step);
                    self.facing =
                        turn_towards(self.facing, info.position - self.position, turn_rate);
                }
            },
            _ => {},
        }
    }

    fn update_idle<W: CombatWorld>(&mut self, world: &mut W) {
        if self.steering() {
            self.change_state(CombatState::Control, world);
            return;
        }
        if self.targeting.rescans_every_tick() {
            self.reacquire(world);
        }
        let Some(info) = self.valid_target(&*world) else {
            return;
        };
        if self.in_range(&info) {
            self.change_state(CombatState::Attack, world);
        } else {
            self.change_state(CombatState::Track, world);
        }
    }

    fn update_track<W: CombatWorld>(&mut self, world: &mut W) {
        if self.steering() {
            self.change_state(CombatState::Control, world);
            return;
        }
        if self.targeting.rescans_every_tick() {
            self.reacquire(world);
        }
        let Some(info) = self.valid_target(&*world) else {
            self.set_target(None, world);
            self.change_state(CombatState::Idle, world);
            return;
        };
        if self.in_range(&info) {
            self.face(info.position);
            self.change_state(CombatState::Attack, world);
        }
    }

    fn update_attack<W: CombatWorld>(&mut self, world: &mut W) {
        if self.steering() {
            self.cancel_swing(world);
            self.change_state(CombatState::Control, world);
            return;
        }
        let Some(info) = self.valid_target(&*world) else {
            self.set_target(None, world);
            self.change_state(CombatState::Idle, world);
            return;
        };
        if !self.in_range(&info) {
            self.change_state(CombatState::Track, world);
            return;
        }

        self.face(info.position);
        let now = world.now();
        if !self.cadence_open(now) {
            return;
        }
        self.last_attack_at = Some(now);
        self.anim.attacking = true;
        world.publish(CombatEvent::Animation {
            entity: self.id,
            signal: AnimationSignal::AttackTriggered,
        });
        match self.strike_mode {
            StrikeMode::Immediate => self.resolve_strike(world),
            StrikeMode::AnimationEvent => self.strike_armed = true,
        }
    }

    // ------------------------------------------------------------------------
    // Strikes and damage
    // ------------------------------------------------------------------------

    /// Strike frame reported by the animation layer.
    ///
    /// Returns false when no swing was armed or the entity has left Attack.
    pub fn on_strike_landed<W: CombatWorld>(&mut self, world: &mut W) -> bool {
        if !self.strike_armed
            || !self.active
            || self.life.is_dead()
            || self.fsm.current() != CombatState::Attack
        {
            return false;
        }
        self.strike_armed = false;
        self.resolve_strike(world);
        true
    }

    fn resolve_strike<W: CombatWorld>(&mut self, world: &mut W) {
        let Some(info) = self.valid_target(&*world) else {
            self.set_target(None, world);
            self.change_state(CombatState::Idle, world);
            return;
        };
        let Some(hostile) = self.layer.hostile() else {
            return;
        };

        let mut victim = info.id;
        let mut hit_point = info.position;
        let dir = direction_to(self.position, info.position);
        if dir != Vec2::ZERO {
            let range = self.stats.attack_range();
            match world.raycast(self.position, dir, range, hostile, Some(self.id)) {
                Some((RayHit::Obstacle, _)) => {
                    trace!(entity = %self.id, "strike blocked by obstacle");
                    return;
                },
                Some((RayHit::Entity(hit), t)) => {
                    hit_point = self.position + dir * t;
                    if hit != info.id && world.target_info(hit).is_some_and(|h| h.is_valid()) {
                        victim = hit;
                        self.set_target(Some(hit), world);
                    }
                },
                None => {},
            }
        }

        let msg = DamageMessage::new(Some(self.id), self.stats.attack_power()).with_hit_point(hit_point);
        let outcome = world.deliver_damage(victim, msg);
        trace!(entity = %self.id, %victim, ?outcome, "strike resolved");
        if outcome.is_kill() {
            self.set_target(None, world);
            if self.fsm.current() == CombatState::Attack {
                self.change_state(CombatState::Idle, world);
            }
        }
    }

    /// Applies an incoming damage message.
    pub fn receive_damage<W: CombatWorld>(&mut self, msg: &DamageMessage, world: &mut W) -> DamageOutcome {
        if !self.active {
            return DamageOutcome::Ignored(DamageRejection::Inactive);
        }
        let outcome = self.life.apply_damage(msg, world.now());
        if outcome.is_accepted() {
            world.publish(CombatEvent::HealthChanged {
                entity: self.id,
                current: self.life.current_health(),
                max: self.life.max_health(),
            });
        }
        if outcome.is_kill() {
            debug!(entity = %self.id, killer = ?msg.source, "killed");
            world.publish(CombatEvent::Died {
                entity: self.id,
                killer: msg.source,
            });
            self.change_state(CombatState::Die, world);
        }
        outcome
    }

    /// Heals. Returns the new health, or `None` if dead.
    pub fn recover<W: CombatWorld>(&mut self, amount: i32, world: &mut W) -> Option<i32> {
        let health = self.life.recover(amount)?;
        world.publish(CombatEvent::HealthChanged {
            entity: self.id,
            current: health,
            max: self.life.max_health(),
        });
        Some(health)
    }

    // ------------------------------------------------------------------------
    // Player control
    // ------------------------------------------------------------------------

    /// Joystick pressed: switch to Control unless casting.
    pub fn begin_control<W: CombatWorld>(&mut self, world: &mut W) -> bool {
        if !self.is_player() || !self.active || self.life.is_dead() {
            return false;
        }
        if self.fsm.current() == CombatState::Skill || self.cast.is_some() {
            return false;
        }
        self.controlling = true;
        self.cancel_swing(world);
        self.change_state(CombatState::Control, world);
        true
    }

    /// Joystick released: resume Track or Idle.
    pub fn end_control<W: CombatWorld>(&mut self, world: &mut W) {
        self.controlling = false;
        self.move_input = Vec2::ZERO;
        if self.fsm.current() != CombatState::Control {
            return;
        }
        let next = if self.valid_target(&*world).is_some() {
            CombatState::Track
        } else {
            CombatState::Idle
        };
        self.change_state(next, world);
    }

    /// Joystick direction; longer than 1 is clamped.
    pub fn set_move_input(&mut self, input: Vec2) {
        self.move_input = input.clamp_length_max(1.0);
    }

    fn steering(&self) -> bool {
        self.controlling && self.move_input != Vec2::ZERO
    }

    /// Where a finished or abandoned cast hands over: back to the joystick
    /// while it is held, otherwise to Attack.
    fn after_cast_state(&self) -> CombatState {
        if self.controlling {
            CombatState::Control
        } else {
            CombatState::Attack
        }
    }

    fn cancel_swing<W: CombatWorld>(&mut self, world: &mut W) {
        if self.anim.attacking || self.strike_armed {
            world.publish(CombatEvent::Animation {
                entity: self.id,
                signal: AnimationSignal::AttackCanceled,
            });
        }
        self.anim.attacking = false;
        self.strike_armed = false;
    }

    // ------------------------------------------------------------------------
    // Skills
    // ------------------------------------------------------------------------

    /// Casts the skill in `slot`.
    pub fn try_cast<W: CombatWorld>(&mut self, slot: usize, world: &mut W) -> SkillResult<SkillKind> {
        if !self.active || self.life.is_dead() {
            return Err(SkillError::CasterDead);
        }
        if !world.is_playing() {
            return Err(SkillError::NotPlaying);
        }
        if self.fsm.current() == CombatState::Skill || self.cast.is_some() {
            return Err(SkillError::Busy);
        }
        let skills = self.skills.as_ref().ok_or(SkillError::UnknownSlot(slot))?;
        let template = skills.check(slot)?.clone();
        let effect = skills.levels().effect_amount(template.kind);

        let target = match template.kind.targeting() {
            SkillTargeting::SelfOnly => None,
            SkillTargeting::EnemyMelee => Some(self.valid_target(&*world).ok_or(SkillError::NoTarget)?),
            SkillTargeting::EnemyRanged => {
                let info = self.valid_target(&*world).ok_or(SkillError::NoTarget)?;
                if !world.in_viewport(info.position) {
                    return Err(SkillError::TargetOffScreen);
                }
                Some(info)
            },
        };

        if let Some(skills) = self.skills.as_mut() {
            skills.commit(slot)?;
        }
        let kind = template.kind;
        debug!(entity = %self.id, skill = ?kind, slot, "casting skill");
        world.publish(CombatEvent::SkillCast {
            entity: self.id,
            skill: kind,
        });
        self.change_state(CombatState::Skill, world);

        match (kind, target) {
            (SkillKind::Recovery, _) => {
                self.recover(effect, world);
                world.spawn_effect(EffectKind::Recovery, self.position, self.facing);
                self.publish_skill_triggered(world);
                self.change_state(self.after_cast_state(), world);
            },
            (SkillKind::FireBall, Some(info)) => {
                let damage = skill_damage(self.stats.attack_power(), effect);
                self.face(info.position);
                let hostile = self.kind.layer().hostile().unwrap_or(Layer::Monster);
                world.launch_projectile(ProjectileLaunch {
                    owner: self.id,
                    effect: EffectKind::FireBall,
                    origin: self.position + self.facing * self.body_radius,
                    direction: self.facing,
                    speed: template.projectile_speed,
                    max_distance: template.projectile_range,
                    impact_radius: template.is_area_effect.then_some(template.impact_radius),
                    damage: DamageMessage::new(Some(self.id), damage),
                    target_layer: hostile,
                });
                self.publish_skill_triggered(world);
                self.cast = Some(ActiveCast::Recovering { skill: kind });
                let recovery = world.config().cast_recovery;
                world.schedule(self.lifetime(), Wake::After(recovery), EntityRoutine::FinishCast);
            },
            (SkillKind::PhantomBlade, Some(info)) => {
                let damage = skill_damage(self.stats.attack_power(), effect);
                self.cast = Some(ActiveCast::Dash { skill: kind, damage });
                if self.in_range(&info) {
                    self.blade_strike(info, kind, damage, world);
                } else {
                    world.schedule(self.lifetime(), Wake::NextTick, EntityRoutine::DashStep);
                }
            },
            (_, None) => {
                self.change_state(self.after_cast_state(), world);
            },
        }
        Ok(kind)
    }

    /// Runs a routine this entity scheduled.
    pub fn run_routine<W: CombatWorld>(&mut self, routine: EntityRoutine, world: &mut W) {
        match routine {
            EntityRoutine::DashStep => self.dash_step(world),
            EntityRoutine::FinishCast => {
                if self.fsm.current() == CombatState::Skill {
                    self.cast = None;
                    self.change_state(self.after_cast_state(), world);
                }
            },
        }
    }

    fn dash_step<W: CombatWorld>(&mut self, world: &mut W) {
        let Some(ActiveCast::Dash { skill, damage }) = self.cast else {
            return;
        };
        if self.life.is_dead() || self.fsm.current() != CombatState::Skill {
            self.cast = None;
            return;
        }
        let Some(info) = self.valid_target(&*world) else {
            trace!(entity = %self.id, "dash target lost");
            self.cast = None;
            self.change_state(self.after_cast_state(), world);
            return;
        };

        let step = self.stats.move_speed() * world.config().dash_speed_multiplier * world.frame_dt();
        self.approach(info.position, step);
        self.face(info.position);
        if self.in_range(&info) {
            self.blade_strike(info, skill, damage, world);
        } else {
            world.schedule(self.lifetime(), Wake::NextTick, EntityRoutine::DashStep);
        }
    }

    fn blade_strike<W: CombatWorld>(&mut self, info: TargetInfo, skill: SkillKind, damage: i32, world: &mut W) {
        self.face(info.position);
        world.spawn_effect(EffectKind::BladeSlash, info.position, self.facing);
        self.publish_skill_triggered(world);
        let msg = DamageMessage::new(Some(self.id), damage).with_hit_point(info.position);
        if world.deliver_damage(info.id, msg).is_kill() {
            self.set_target(None, world);
        }
        self.cast = Some(ActiveCast::Recovering { skill });
        let recovery = world.config().cast_recovery;
        world.schedule(self.lifetime(), Wake::After(recovery), EntityRoutine::FinishCast);
    }

    fn publish_skill_triggered<W: CombatWorld>(&self, world: &mut W) {
        world.publish(CombatEvent::Animation {
            entity: self.id,
            signal: AnimationSignal::SkillTriggered,
        });
    }

    /// Counts cooldowns down and auto-casts ready skills when enabled.
    pub fn tick_skills<W: CombatWorld>(&mut self, dt: f32, world: &mut W) {
        let Some(skills) = self.skills.as_mut() else {
            return;
        };
        for slot in skills.tick(dt) {
            if let Some(ready) = skills.slot(slot) {
                world.publish(CombatEvent::SkillReady {
                    slot,
                    skill: ready.template().kind,
                });
            }
        }
        if !skills.auto_cast() {
            return;
        }
        let candidates = skills.ready_slots();
        for slot in candidates {
            match self.try_cast(slot, world) {
                Ok(kind) => {
                    trace!(entity = %self.id, skill = ?kind, "auto-cast");
                    break;
                },
                Err(err) => trace!(entity = %self.id, slot, %err, "auto-cast skipped"),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Equipment
    // ------------------------------------------------------------------------

    /// Wears a piece of equipment.
    pub fn equip<W: CombatWorld>(&mut self, piece: EquipmentId, world: &mut W) -> EquipmentResult<EquipOutcome> {
        let outcome = self.loadout.equip(piece, &mut self.stats, &mut self.life)?;
        if let EquipOutcome::Equipped { replaced } = outcome {
            let slot = self
                .loadout
                .piece(piece)
                .map_or(EquipSlot::Weapon, |p| p.slot());
            if let Some(old) = replaced {
                world.publish(CombatEvent::EquipmentChanged {
                    piece: old,
                    slot,
                    equipped: false,
                });
            }
            world.publish(CombatEvent::EquipmentChanged {
                piece,
                slot,
                equipped: true,
            });
            self.publish_slot_stats(slot, world);
        }
        Ok(outcome)
    }

    /// Takes off whatever is worn in `slot`.
    pub fn unequip<W: CombatWorld>(&mut self, slot: EquipSlot, world: &mut W) -> Option<EquipmentId> {
        let piece = self.loadout.unequip(slot, &mut self.stats, &mut self.life)?;
        world.publish(CombatEvent::EquipmentChanged {
            piece,
            slot,
            equipped: false,
        });
        self.publish_slot_stats(slot, world);
        Some(piece)
    }

    pub(crate) fn publish_slot_stats<W: CombatWorld>(&self, slot: EquipSlot, world: &mut W) {
        self.publish_stat(slot.stat(), world);
    }

    /// Publishes a stat value plus anything derived from it.
    pub(crate) fn publish_stat<W: CombatWorld>(&self, stat: StatKind, world: &mut W) {
        world.publish(CombatEvent::StatusChanged {
            stat,
            value: self.stats.value(stat),
        });
        match stat {
            StatKind::AttackPower | StatKind::AttackCadence => {
                world.publish(CombatEvent::StatusChanged {
                    stat: StatKind::Dps,
                    value: self.stats.dps(),
                });
            },
            StatKind::Health => world.publish(CombatEvent::HealthChanged {
                entity: self.id,
                current: self.life.current_health(),
                max: self.life.max_health(),
            }),
            _ => {},
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn reacquire<W: CombatWorld>(&mut self, world: &mut W) {
        let seeker = Seeker {
            id: self.id,
            position: self.position,
            layer: self.kind.layer(),
        };
        let found = self.targeting.acquire(&seeker, &*world);
        self.set_target(found, world);
    }

    fn set_target<W: CombatWorld>(&mut self, target: Option<EntityId>, world: &mut W) {
        if self.target != target {
            self.target = target;
            world.publish(CombatEvent::TargetChanged {
                entity: self.id,
                target,
            });
        }
    }

    fn valid_target<W: CombatWorld>(&self, world: &W) -> Option<TargetInfo> {
        self.target
            .and_then(|id| world.target_info(id))
            .filter(TargetInfo::is_valid)
    }

    fn in_range(&self, info: &TargetInfo) -> bool {
        distance(self.position, info.position) <= self.stats.attack_range()
    }

    fn cadence_open(&self, now: f64) -> bool {
        self.last_attack_at
            .map_or(true, |last| now >= last + f64::from(self.stats.attack_interval()))
    }

    fn face(&mut self, point: Vec2) {
        let dir = direction_to(self.position, point);
        if dir != Vec2::ZERO {
            self.facing = dir;
        }
    }

    /// Moves towards `point` by at most `max_step`, stopping just inside attack range.
    fn approach(&mut self, point: Vec2, max_step: f32) {
        let gap = distance(self.position, point) - self.stats.attack_range() * APPROACH_FRACTION;
        if gap > 0.0 {
            self.position = move_towards(self.position, point, max_step.min(gap));
        }
    }
}
