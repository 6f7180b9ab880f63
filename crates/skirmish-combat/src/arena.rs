//! The arena: owner of every entity and driver of the simulation.
//!
//! The arena implements [`CombatWorld`] for the entities it updates. An
//! entity is taken out of the map while its hooks run, so hooks can
//! freely reach other entities through the world without aliasing.
//!
//! One frame is [`Arena::fixed_update`] (movement, projectiles) followed by
//! [`Arena::update`] (routines, state machines, cooldowns);
//! [`Arena::advance`] runs both.

use std::f32::consts::TAU;

use ahash::AHashMap;
use skirmish_common::{distance, Circle, EntityId, EquipmentId, Lifetime, Vec2};
use tracing::{debug, info, trace};

use crate::catalog::{Catalog, MonsterKind};
use crate::clock::SimClock;
use crate::config::ArenaConfig;
use crate::entity::{CombatEntity, EntityKind, StrikeMode};
use crate::equipment::{EquipOutcome, EquipSlot, EquipmentError, EquipmentResult, Loadout};
use crate::events::{CombatEvent, EventBus};
use crate::living::{DamageMessage, DamageOutcome, DamageRejection};
use crate::progression::{roll_reward, upgrade_cost, Currency, Progression, UpgradeError, UpgradeResult};
use crate::projectile::{CountingPool, EffectKind, EffectPool, Projectile};
use crate::roster::MonsterRoster;
use crate::scheduler::{Scheduler, TaskId, TaskScope, Wake};
use crate::skills::{SkillController, SkillError, SkillKind, SkillResult};
use crate::stats::{StatBlock, StatKind};
use crate::targeting::{Layer, RayHit, TargetInfo, TargetProvider};
use crate::world::{CombatWorld, EntityRoutine, ProjectileLaunch};

/// Collision radius of every projectile.
const PROJECTILE_HIT_RADIUS: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArenaRoutine {
    ReturnToPool,
    SpawnMonster,
    NextWave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Routine {
    Entity(EntityRoutine),
    Arena(ArenaRoutine),
}

/// Follow-up work raised while an entity is checked out of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Killed {
        entity: EntityId,
        killer: Option<EntityId>,
    },
}

/// Progress of the current wave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveState {
    /// Monsters in the wave
    pub size: u32,
    /// Monsters still to spawn
    pub to_spawn: u32,
    /// Whether a wave is running
    pub active: bool,
}

/// The combat arena.
#[derive(Debug)]
pub struct Arena {
    config: ArenaConfig,
    catalog: Catalog,
    clock: SimClock,
    entities: AHashMap<EntityId, CombatEntity>,
    player: Option<EntityId>,
    roster: MonsterRoster,
    idle_pool: Vec<EntityId>,
    scheduler: Scheduler<Routine>,
    projectiles: Vec<Projectile>,
    obstacles: Vec<Circle>,
    effects: Box<dyn EffectPool>,
    events: EventBus,
    signals: Vec<Signal>,
    progression: Progression,
    wave: WaveState,
    viewport_center: Vec2,
    playing: bool,
    paused: bool,
    rng: fastrand::Rng,
}

impl Arena {
    /// Creates an empty arena. The game counts as running until the player dies.
    #[must_use]
    pub fn new(mut config: ArenaConfig, catalog: Catalog) -> Self {
        config.validate();
        let events = EventBus::new(config.event_capacity);
        let rng = fastrand::Rng::with_seed(config.seed);
        let progression = Progression::new(config.currency_ceiling, config.max_upgrade_level);
        let obstacles = catalog.obstacles.clone();
        Self {
            config,
            catalog,
            clock: SimClock::new(),
            entities: AHashMap::new(),
            player: None,
            roster: MonsterRoster::new(),
            idle_pool: Vec::new(),
            scheduler: Scheduler::new(),
            projectiles: Vec::new(),
            obstacles,
            effects: Box::new(CountingPool::new()),
            events,
            signals: Vec::new(),
            progression,
            wave: WaveState::default(),
            viewport_center: Vec2::ZERO,
            playing: true,
            paused: false,
            rng,
        }
    }

    /// Replaces the effect pool.
    #[must_use]
    pub fn with_effect_pool(mut self, pool: Box<dyn EffectPool>) -> Self {
        self.effects = pool;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Arena tuning.
    #[must_use]
    pub const fn arena_config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Archetype catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    /// One entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&CombatEntity> {
        self.entities.get(&id)
    }

    /// The player entity.
    #[must_use]
    pub fn player(&self) -> Option<&CombatEntity> {
        self.player.and_then(|id| self.entities.get(&id))
    }

    /// Live monsters.
    #[must_use]
    pub const fn roster(&self) -> &MonsterRoster {
        &self.roster
    }

    /// Pooled monsters waiting for reuse.
    #[must_use]
    pub fn pooled_count(&self) -> usize {
        self.idle_pool.len()
    }

    /// Run progression.
    #[must_use]
    pub const fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Effect pool.
    #[must_use]
    pub fn effects(&self) -> &dyn EffectPool {
        self.effects.as_ref()
    }

    /// Scheduled routines.
    #[must_use]
    pub fn pending_routines(&self) -> usize {
        self.scheduler.len()
    }

    /// Current wave.
    #[must_use]
    pub const fn wave(&self) -> WaveState {
        self.wave
    }

    /// Whether a game is running (the player has not died).
    #[must_use]
    pub const fn is_game_running(&self) -> bool {
        self.playing
    }

    /// Whether the simulation is frozen.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freezes or resumes the simulation, clock included.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Adds scenery.
    pub fn add_obstacle(&mut self, obstacle: Circle) {
        self.obstacles.push(obstacle);
    }

    /// Moves an entity without combat side effects.
    pub fn place(&mut self, id: EntityId, position: Vec2) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        entity.place(position);
        self.refresh_viewport();
        true
    }

    /// Changes how an entity's swings deal damage.
    pub fn set_strike_mode(&mut self, id: EntityId, mode: StrikeMode) -> bool {
        self.entities.get_mut(&id).map(|e| e.set_strike_mode(mode)).is_some()
    }

    /// Adds currency to the wallet. Returns the new balance.
    pub fn grant(&mut self, currency: Currency, amount: i64) -> i64 {
        let balance = self.progression.wallet.earn(currency, amount);
        self.publish(CombatEvent::CurrencyChanged { currency, balance });
        balance
    }

    // ------------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------------

    /// Runs one physics step and one simulation tick of `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.fixed_update(dt);
        self.update(dt);
    }

    /// Simulation tick: routines, state machines and skill cooldowns.
    pub fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.clock.advance(dt);
        self.refresh_viewport();
        self.run_due_routines();

        if let Some(player) = self.player {
            self.with_entity(player, |e, w| e.update(w));
            self.flush_signals();
        }
        for id in self.roster.snapshot() {
            self.with_entity(id, |e, w| e.update(w));
            self.flush_signals();
        }

        if self.playing {
            if let Some(player) = self.player {
                self.with_entity(player, |e, w| e.tick_skills(dt, w));
                self.flush_signals();
            }
        }
    }

    /// Physics step: movement, obstacle push-out and projectiles.
    pub fn fixed_update(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let movers: Vec<EntityId> = self.player.into_iter().chain(self.roster.snapshot()).collect();
        for id in movers {
            self.with_entity(id, |e, w| {
                e.fixed_update(dt, w);
                w.push_out_of_obstacles(e);
            });
        }
        self.refresh_viewport();
        self.update_projectiles(dt);
        self.flush_signals();
    }

    fn with_entity<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut CombatEntity, &mut Self) -> R,
    ) -> Option<R> {
        let mut entity = self.entities.remove(&id)?;
        let result = f(&mut entity, self);
        self.entities.insert(id, entity);
        Some(result)
    }

    fn refresh_viewport(&mut self) {
        if let Some(player) = self.player() {
            self.viewport_center = player.position();
        }
    }

    fn push_out_of_obstacles(&self, entity: &mut CombatEntity) {
        for obstacle in &self.obstacles {
            let body = Circle::new(entity.position(), entity.body_radius());
            if !obstacle.overlaps(&body) {
                continue;
            }
            let offset = entity.position() - obstacle.center;
            let dir = if offset.length_squared() > 0.0 {
                offset.normalize()
            } else {
                Vec2::X
            };
            entity.place(obstacle.center + dir * (obstacle.radius + entity.body_radius()));
        }
    }

    // ------------------------------------------------------------------------
    // Routines and signals
    // ------------------------------------------------------------------------

    fn run_due_routines(&mut self) {
        for task in self.scheduler.drain_due(self.clock.now()) {
            match (task.scope, task.payload) {
                (TaskScope::Entity(owner), Routine::Entity(routine)) => {
                    if self.is_current_life(owner) {
                        self.with_entity(owner.entity, |e, w| e.run_routine(routine, w));
                    } else {
                        trace!(entity = %owner.entity, ?routine, "dropping stale routine");
                    }
                },
                (TaskScope::Entity(owner), Routine::Arena(ArenaRoutine::ReturnToPool)) => {
                    if self.is_current_life(owner) {
                        self.return_to_pool(owner.entity);
                    }
                },
                (TaskScope::Global, Routine::Arena(ArenaRoutine::SpawnMonster)) => {
                    self.spawn_wave_monster();
                },
                (TaskScope::Global, Routine::Arena(ArenaRoutine::NextWave)) => self.advance_stage(),
                (scope, payload) => trace!(?scope, ?payload, "ignoring misrouted routine"),
            }
            self.flush_signals();
        }
    }

    fn is_current_life(&self, owner: Lifetime) -> bool {
        self.entities
            .get(&owner.entity)
            .is_some_and(|e| e.is_active() && e.lifetime().is_same_life(owner))
    }

    fn schedule_arena(&mut self, scope: TaskScope, wake: Wake, routine: ArenaRoutine) -> TaskId {
        self.scheduler
            .schedule(self.clock.now(), scope, wake, Routine::Arena(routine))
    }

    fn flush_signals(&mut self) {
        while !self.signals.is_empty() {
            for signal in std::mem::take(&mut self.signals) {
                match signal {
                    Signal::Killed { entity, killer } => {
                        if Some(entity) == self.player {
                            self.game_over();
                        } else {
                            self.monster_killed(entity, killer);
                        }
                    },
                }
            }
        }
    }

    fn monster_killed(&mut self, id: EntityId, killer: Option<EntityId>) {
        self.roster.remove(id);
        let reward = roll_reward(&mut self.rng, self.progression.stage.stage_count());
        let levels = self.progression.record_kill(reward);
        debug!(monster = %id, killer = ?killer, gold = reward.gold, "monster killed");

        for currency in [Currency::Gold, Currency::Karma] {
            self.publish(CombatEvent::CurrencyChanged {
                currency,
                balance: self.progression.wallet.balance(currency),
            });
        }
        let exp = &self.progression.experience;
        self.publish(CombatEvent::ExperienceChanged {
            level: exp.level(),
            exp: exp.exp(),
            needed: exp.needed(),
        });
        let level = exp.level();
        for gained in (0..levels).rev() {
            self.publish(CombatEvent::LevelUp {
                level: level - gained,
            });
        }

        if let Some(owner) = self.entities.get(&id).map(CombatEntity::lifetime) {
            let delay = self.config.return_to_pool_delay;
            self.schedule_arena(TaskScope::Entity(owner), Wake::After(delay), ArenaRoutine::ReturnToPool);
        }
        self.check_wave_cleared();
    }

    fn return_to_pool(&mut self, id: EntityId) {
        self.scheduler.cancel_scope(id);
        self.roster.remove(id);
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        if !entity.is_active() || entity.is_player() {
            return;
        }
        entity.deactivate();
        self.idle_pool.push(id);
        trace!(monster = %id, "returned to pool");
        self.publish(CombatEvent::MonsterReturned { entity: id });
    }

    fn game_over(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.clear_field();
        self.progression.deaths += 1;
        info!(
            deaths = self.progression.deaths,
            stage = %self.progression.stage.label(),
            kills = self.progression.kills,
            "game over"
        );
        self.publish(CombatEvent::GameOver {
            deaths: self.progression.deaths,
        });
    }

    /// Returns every monster to the pool and drops waves and projectiles.
    fn clear_field(&mut self) {
        self.scheduler.cancel_global();
        self.wave = WaveState::default();
        let monsters: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| !e.is_player() && e.is_active())
            .map(CombatEntity::id)
            .collect();
        for id in monsters {
            self.return_to_pool(id);
        }
        for projectile in std::mem::take(&mut self.projectiles) {
            self.effects.release(projectile.effect, 0.0);
        }
    }

    // ------------------------------------------------------------------------
    // Spawning and waves
    // ------------------------------------------------------------------------

    /// Creates the player if needed and spawns it at `position`.
    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        let id = match self.player {
            Some(id) => id,
            None => self.create_player(),
        };
        self.with_entity(id, |e, w| e.spawn(position, None, w));
        self.refresh_viewport();
        self.flush_signals();
        id
    }

    fn create_player(&mut self) -> EntityId {
        let skills = SkillController::new(
            self.catalog.skill_templates(),
            self.config.cast_lockout,
            self.config.max_upgrade_level,
        );
        let loadout = Loadout::from_templates(&self.catalog.equipment);
        let player = CombatEntity::player(&self.catalog.player, skills, loadout);
        let id = player.id();
        self.entities.insert(id, player);
        self.player = Some(id);
        id
    }

    /// Spawns a monster with stats scaled to the current stage.
    pub fn spawn_monster(&mut self, kind: MonsterKind, position: Vec2) -> Option<EntityId> {
        let factor = self
            .progression
            .stage
            .difficulty_factor(self.config.difficulty_step);
        let stats = self.catalog.monster(kind)?.stats.scaled(factor);
        self.spawn_monster_with_stats(kind, position, stats)
    }

    /// Spawns a monster with explicit stats, reusing a pooled one when possible.
    pub fn spawn_monster_with_stats(
        &mut self,
        kind: MonsterKind,
        position: Vec2,
        stats: StatBlock,
    ) -> Option<EntityId> {
        let archetype = self.catalog.monster(kind)?;
        let pooled = self
            .idle_pool
            .iter()
            .position(|id| self.entities.get(id).is_some_and(|e| e.kind() == EntityKind::Monster(kind)));
        let id = match pooled {
            Some(index) => self.idle_pool.remove(index),
            None => {
                let monster = CombatEntity::monster(archetype);
                let id = monster.id();
                self.entities.insert(id, monster);
                id
            },
        };

        self.roster.insert(id);
        self.with_entity(id, |e, w| e.spawn(position, Some(stats), w));
        trace!(monster = %id, ?kind, "monster spawned");
        self.publish(CombatEvent::MonsterSpawned { entity: id, kind });
        self.flush_signals();
        Some(id)
    }

    /// Starts a fresh run: respawns the player, clears the field and starts the current stage's wave.
    pub fn start_game(&mut self) -> EntityId {
        self.clear_field();
        self.playing = true;
        self.paused = false;
        let player = self.spawn_player(Vec2::ZERO);
        self.start_wave();
        player
    }

    fn start_wave(&mut self) {
        let stage = &self.progression.stage;
        let size = stage.wave_size(self.config.max_wave_size);
        let label = stage.label();
        self.wave = WaveState {
            size,
            to_spawn: size,
            active: true,
        };
        info!(stage = %label, size, "wave started");
        self.publish(CombatEvent::WaveStarted { stage: label, size });
        let cycle = self.spawn_cycle();
        self.schedule_arena(TaskScope::Global, Wake::After(cycle), ArenaRoutine::SpawnMonster);
    }

    fn spawn_cycle(&self) -> f32 {
        self.progression.stage.spawn_cycle(
            self.config.spawn_cycle,
            self.config.spawn_cycle_shrink,
            self.config.min_spawn_cycle,
        )
    }

    fn spawn_wave_monster(&mut self) {
        if !self.playing || self.wave.to_spawn == 0 {
            return;
        }
        let Some(kind) = self.catalog.pick_monster(&mut self.rng) else {
            return;
        };
        let angle = self.rng.f32() * TAU;
        let radius = self.config.spawn_radius * self.rng.f32().sqrt();
        let position = Vec2::new(angle.cos(), angle.sin()) * radius;

        self.wave.to_spawn -= 1;
        self.spawn_monster(kind, position);
        if self.wave.to_spawn > 0 {
            let cycle = self.spawn_cycle();
            self.schedule_arena(TaskScope::Global, Wake::After(cycle), ArenaRoutine::SpawnMonster);
        }
    }

    fn check_wave_cleared(&mut self) {
        if !self.wave.active || self.wave.to_spawn > 0 || !self.roster.is_empty() {
            return;
        }
        self.wave.active = false;
        let stage = self.progression.stage.label();
        debug!(stage = %stage, "wave cleared");
        self.publish(CombatEvent::WaveCleared { stage });
        let delay = self.config.next_wave_delay;
        self.schedule_arena(TaskScope::Global, Wake::After(delay), ArenaRoutine::NextWave);
    }

    fn advance_stage(&mut self) {
        if !self.playing {
            return;
        }
        let karma = self.progression.stage.advance();
        self.grant(Currency::Karma, karma);
        self.start_wave();
    }

    // ------------------------------------------------------------------------
    // Projectiles
    // ------------------------------------------------------------------------

    fn update_projectiles(&mut self, dt: f32) {
        let in_flight = std::mem::take(&mut self.projectiles);
        let mut kept = Vec::with_capacity(in_flight.len());
        for mut projectile in in_flight {
            projectile.advance(dt);
            if let Some((victim, contact)) = self.first_contact(&projectile) {
                self.detonate(&projectile, victim, contact);
                self.effects.release(projectile.effect, 0.0);
            } else if projectile.is_spent() {
                self.effects.release(projectile.effect, 0.0);
            } else {
                kept.push(projectile);
            }
        }
        kept.append(&mut self.projectiles);
        self.projectiles = kept;
    }

    /// First entity or obstacle swept by the projectile's last step.
    fn first_contact(&self, projectile: &Projectile) -> Option<(Option<EntityId>, Vec2)> {
        let origin = projectile.previous;
        let dir = projectile.direction;
        let reach = projectile.step_length();
        let mut best: Option<(Option<EntityId>, f32)> = None;

        for obstacle in &self.obstacles {
            let grown = Circle::new(obstacle.center, obstacle.radius + projectile.hit_radius);
            if let Some(t) = grown.ray_hit(origin, dir, reach) {
                if best.map_or(true, |(_, b)| t < b) {
                    best = Some((None, t));
                }
            }
        }
        for entity in self.entities.values() {
            if entity.layer() != projectile.target_layer || !entity.is_active() || entity.is_dead() {
                continue;
            }
            let body = Circle::new(entity.position(), entity.body_radius() + projectile.hit_radius);
            if let Some(t) = body.ray_hit(origin, dir, reach) {
                if best.map_or(true, |(_, b)| t < b) {
                    best = Some((Some(entity.id()), t));
                }
            }
        }
        best.map(|(hit, t)| (hit, origin + dir * t))
    }

    fn detonate(&mut self, projectile: &Projectile, victim: Option<EntityId>, at: Vec2) {
        let msg = projectile.damage.with_hit_point(at);
        match projectile.impact_radius {
            Some(radius) => {
                self.spawn_effect(EffectKind::Explosion, at, projectile.direction);
                let caught: Vec<EntityId> = self
                    .entities
                    .values()
                    .filter(|e| {
                        e.layer() == projectile.target_layer
                            && e.is_active()
                            && !e.is_dead()
                            && distance(e.position(), at) <= radius + e.body_radius()
                    })
                    .map(CombatEntity::id)
                    .collect();
                trace!(caught = caught.len(), "projectile exploded");
                for id in caught {
                    self.deliver_damage(id, msg);
                }
            },
            None => {
                if let Some(id) = victim {
                    self.deliver_damage(id, msg);
                }
            },
        }
    }

    // ------------------------------------------------------------------------
    // External hooks
    // ------------------------------------------------------------------------

    /// Damages an entity from outside the simulation (traps, scripts, tests).
    pub fn damage(&mut self, target: EntityId, msg: DamageMessage) -> DamageOutcome {
        let outcome = self.deliver_damage(target, msg);
        self.flush_signals();
        outcome
    }

    /// Strike frame reported by the animation layer for `id`.
    pub fn strike_landed(&mut self, id: EntityId) -> bool {
        let landed = self
            .with_entity(id, |e, w| e.on_strike_landed(w))
            .unwrap_or(false);
        self.flush_signals();
        landed
    }

    /// Casts the player's skill in `slot`.
    pub fn cast_skill(&mut self, slot: usize) -> SkillResult<SkillKind> {
        let player = self.player.ok_or(SkillError::CasterDead)?;
        let result = self
            .with_entity(player, |e, w| e.try_cast(slot, w))
            .unwrap_or(Err(SkillError::CasterDead));
        self.flush_signals();
        result
    }

    /// Turns the player's auto-cast on or off.
    pub fn set_auto_cast(&mut self, enabled: bool) -> bool {
        let Some(skills) = self
            .player
            .and_then(|id| self.entities.get_mut(&id))
            .and_then(CombatEntity::skills_mut)
        else {
            return false;
        };
        skills.set_auto_cast(enabled);
        true
    }

    /// Joystick pressed.
    pub fn begin_control(&mut self) -> bool {
        let Some(player) = self.player else {
            return false;
        };
        let started = self
            .with_entity(player, |e, w| e.begin_control(w))
            .unwrap_or(false);
        self.flush_signals();
        started
    }

    /// Joystick released.
    pub fn end_control(&mut self) {
        if let Some(player) = self.player {
            self.with_entity(player, |e, w| e.end_control(w));
            self.flush_signals();
        }
    }

    /// Joystick direction.
    pub fn set_move_input(&mut self, input: Vec2) {
        if let Some(player) = self.player.and_then(|id| self.entities.get_mut(&id)) {
            player.set_move_input(input);
        }
    }

    /// Wears a piece of equipment.
    pub fn equip(&mut self, piece: EquipmentId) -> EquipmentResult<EquipOutcome> {
        let player = self.player.ok_or(EquipmentError::NoPlayer)?;
        self.with_entity(player, |e, w| e.equip(piece, w))
            .unwrap_or(Err(EquipmentError::NoPlayer))
    }

    /// Takes off whatever is worn in `slot`.
    pub fn unequip(&mut self, slot: EquipSlot) -> Option<EquipmentId> {
        let player = self.player?;
        self.with_entity(player, |e, w| e.unequip(slot, w)).flatten()
    }

    /// Unlocks a piece of equipment for Gold. Returns the price paid.
    pub fn purchase_equipment(&mut self, piece: EquipmentId) -> EquipmentResult<i64> {
        let player = self.player.ok_or(EquipmentError::NoPlayer)?;
        let cost = self
            .with_entity(player, |e, w| {
                let (loadout, _, _) = e.gear_mut();
                loadout.purchase(piece, &mut w.progression.wallet)
            })
            .unwrap_or(Err(EquipmentError::NoPlayer))?;
        self.publish_balance(Currency::Gold);
        self.publish(CombatEvent::EquipmentUpgraded { piece, level: 1 });
        Ok(cost)
    }

    /// Raises a piece of equipment one level for Gold. Returns the new level.
    pub fn upgrade_equipment(&mut self, piece: EquipmentId) -> EquipmentResult<u32> {
        let player = self.player.ok_or(EquipmentError::NoPlayer)?;
        self.with_entity(player, |e, w| {
            let (loadout, stats, life) = e.gear_mut();
            let level = loadout.upgrade(piece, &mut w.progression.wallet, stats, life)?;
            w.publish_balance(Currency::Gold);
            w.publish(CombatEvent::EquipmentUpgraded { piece, level });
            if let Some(slot) = e
                .loadout()
                .piece(piece)
                .filter(|p| p.is_equipped())
                .map(|p| p.slot())
            {
                e.publish_slot_stats(slot, w);
            }
            Ok(level)
        })
        .unwrap_or(Err(EquipmentError::NoPlayer))
    }

    /// Buys one permanent stat upgrade for Gold. Returns the new level.
    pub fn upgrade_stat(&mut self, stat: StatKind) -> UpgradeResult<u32> {
        let player = self.player.ok_or(UpgradeError::NoPlayer)?;
        self.with_entity(player, |e, w| {
            let (stats, life) = e.stats_and_life_mut();
            let level = w.progression.purchase_stat(stat, stats)?;
            if stat == StatKind::Health {
                life.set_max_health(stats.max_health());
            }
            w.publish_balance(Currency::Gold);
            e.publish_stat(stat, w);
            Ok(level)
        })
        .unwrap_or(Err(UpgradeError::NoPlayer))
    }

    /// Buys one skill level for Karma. Returns the new effect amount.
    pub fn upgrade_skill(&mut self, skill: SkillKind) -> UpgradeResult<i32> {
        let player = self.player.ok_or(UpgradeError::NoPlayer)?;
        self.with_entity(player, |e, w| {
            let levels = e.skills_mut().ok_or(UpgradeError::NoPlayer)?.levels_mut();
            let level = levels.level(skill);
            if !levels.can_upgrade(skill) {
                return Err(UpgradeError::MaxLevel(level));
            }
            w.progression.wallet.spend(Currency::Karma, upgrade_cost(level))?;
            let effect_amount = levels.upgrade(skill).ok_or(UpgradeError::MaxLevel(level))?;
            w.publish_balance(Currency::Karma);
            w.publish(CombatEvent::SkillUpgraded {
                skill,
                level: level + 1,
                effect_amount,
            });
            Ok(effect_amount)
        })
        .unwrap_or(Err(UpgradeError::NoPlayer))
    }

    fn publish_balance(&self, currency: Currency) {
        self.publish(CombatEvent::CurrencyChanged {
            currency,
            balance: self.progression.wallet.balance(currency),
        });
    }
}

impl TargetProvider for Arena {
    fn target_info(&self, id: EntityId) -> Option<TargetInfo> {
        self.entities.get(&id).map(|e| TargetInfo {
            id,
            position: e.position(),
            radius: e.body_radius(),
            layer: e.layer(),
            dead: e.is_dead(),
            active: e.is_active(),
        })
    }

    fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    fn monster_snapshot(&self) -> Vec<TargetInfo> {
        self.roster
            .snapshot()
            .into_iter()
            .filter_map(|id| self.target_info(id))
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec2,
        dir: Vec2,
        max_distance: f32,
        layer: Layer,
        exclude: Option<EntityId>,
    ) -> Option<(RayHit, f32)> {
        let mut best: Option<(RayHit, f32)> = None;
        for obstacle in &self.obstacles {
            if let Some(t) = obstacle.ray_hit(origin, dir, max_distance) {
                if best.map_or(true, |(_, b)| t < b) {
                    best = Some((RayHit::Obstacle, t));
                }
            }
        }
        for entity in self.entities.values() {
            if entity.layer() != layer || !entity.is_active() || Some(entity.id()) == exclude {
                continue;
            }
            let body = Circle::new(entity.position(), entity.body_radius());
            if let Some(t) = body.ray_hit(origin, dir, max_distance) {
                if best.map_or(true, |(_, b)| t < b) {
                    best = Some((RayHit::Entity(entity.id()), t));
                }
            }
        }
        best
    }

    fn in_viewport(&self, point: Vec2) -> bool {
        let offset = point - self.viewport_center;
        offset.x.abs() <= self.config.viewport_half_width
            && offset.y.abs() <= self.config.viewport_half_height
    }
}

impl CombatWorld for Arena {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn frame_dt(&self) -> f32 {
        self.clock.last_dt()
    }

    fn is_playing(&self) -> bool {
        self.playing && !self.paused
    }

    fn config(&self) -> &ArenaConfig {
        &self.config
    }

    fn deliver_damage(&mut self, target: EntityId, msg: DamageMessage) -> DamageOutcome {
        let outcome = self
            .with_entity(target, |e, w| e.receive_damage(&msg, w))
            .unwrap_or(DamageOutcome::Ignored(DamageRejection::Inactive));
        if outcome.is_kill() {
            self.signals.push(Signal::Killed {
                entity: target,
                killer: msg.source,
            });
        }
        outcome
    }

    fn schedule(&mut self, owner: Lifetime, wake: Wake, routine: EntityRoutine) -> TaskId {
        self.scheduler.schedule(
            self.clock.now(),
            TaskScope::Entity(owner),
            wake,
            Routine::Entity(routine),
        )
    }

    fn cancel_routines(&mut self, entity: EntityId) -> usize {
        self.scheduler.cancel_scope(entity)
    }

    fn launch_projectile(&mut self, launch: ProjectileLaunch) {
        let effect = self.effects.spawn(launch.effect, launch.origin, launch.direction);
        self.projectiles.push(Projectile {
            owner: launch.owner,
            effect,
            origin: launch.origin,
            position: launch.origin,
            previous: launch.origin,
            direction: launch.direction,
            speed: launch.speed,
            max_distance: launch.max_distance,
            hit_radius: PROJECTILE_HIT_RADIUS,
            impact_radius: launch.impact_radius,
            damage: launch.damage,
            target_layer: launch.target_layer,
        });
    }

    fn spawn_effect(&mut self, kind: EffectKind, at: Vec2, facing: Vec2) {
        let handle = self.effects.spawn(kind, at, facing);
        self.effects.release(handle, self.config.effect_lifetime);
    }

    fn publish(&self, event: CombatEvent) {
        self.events.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::AnimationSignal;
    use crate::fsm::CombatState;

    const DT: f32 = 0.125;

    fn arena() -> Arena {
        let catalog = Catalog {
            obstacles: Vec::new(),
            ..Catalog::default()
        };
        Arena::new(ArenaConfig::default(), catalog)
    }

    fn run(arena: &mut Arena, ticks: usize) {
        for _ in 0..ticks {
            arena.advance(DT);
        }
    }

    fn dummy(health: i32, attack: i32, cadence: f32) -> StatBlock {
        StatBlock::new(health, attack)
            .with_range(1.5)
            .with_cadence(cadence)
            .with_move_speed(0.5)
    }

    fn state(arena: &Arena, id: EntityId) -> Option<CombatState> {
        arena.entity(id).map(CombatEntity::state)
    }

    fn health(arena: &Arena, id: EntityId) -> i32 {
        arena.entity(id).map_or(-1, |e| e.life().current_health())
    }

    #[test]
    fn test_player_kills_adjacent_monster() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(1.0, 0.0), dummy(50, 5, 1.0))
            .expect("monster spawned");
        assert_eq!(state(&arena, monster), Some(CombatState::Track));

        run(&mut arena, 1);
        assert_eq!(state(&arena, player), Some(CombatState::Attack));
        assert_eq!(arena.player().and_then(CombatEntity::target), Some(monster));

        // Both swing once per second starting at t=0.25; five player hits kill.
        run(&mut arena, 33);
        assert_eq!(health(&arena, monster), 0);
        assert_eq!(state(&arena, monster), Some(CombatState::Die));
        assert_eq!(health(&arena, player), 80);
        assert_eq!(state(&arena, player), Some(CombatState::Idle));
        assert_eq!(arena.player().and_then(CombatEntity::target), None);
        assert_eq!(arena.progression().kills, 1);
        assert!(arena.progression().wallet.balance(Currency::Gold) >= 1);
        assert!(!arena.roster().contains(monster));

        arena.events().drain();
        run(&mut arena, 8);
        assert!(arena.entity(monster).is_some_and(|e| !e.is_active()));
        assert_eq!(arena.pooled_count(), 1);
        assert!(arena
            .events()
            .drain()
            .contains(&CombatEvent::MonsterReturned { entity: monster }));
    }

    #[test]
    fn test_attack_cadence_is_respected() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(1.0, 0.0), dummy(10_000, 1, 2.0))
            .expect("monster spawned");

        let mut swings = Vec::new();
        for _ in 0..40 {
            arena.advance(DT);
            if let Some(at) = arena.entity(monster).and_then(CombatEntity::last_attack_at) {
                if swings.last() != Some(&at) {
                    swings.push(at);
                }
            }
        }
        assert!(swings.len() >= 8);
        for pair in swings.windows(2) {
            assert!((pair[1] - pair[0] - 0.5).abs() < 1e-9);
        }
        assert!(health(&arena, player) < 100);
    }

    #[test]
    fn test_damage_inside_hit_interval_is_ignored() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let hit = DamageMessage::environmental(10);
        assert!(arena.damage(player, hit).is_accepted());
        assert_eq!(
            arena.damage(player, hit),
            DamageOutcome::Ignored(DamageRejection::Invulnerable)
        );
        assert_eq!(health(&arena, player), 90);
    }

    #[test]
    fn test_player_death_ends_game() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let a = arena.spawn_monster(MonsterKind::Spider, Vec2::new(5.0, 0.0));
        let b = arena.spawn_monster(MonsterKind::Golem, Vec2::new(-5.0, 0.0));
        assert!(a.is_some() && b.is_some());
        arena.events().drain();

        assert!(arena.damage(player, DamageMessage::environmental(1_000)).is_kill());
        assert!(!arena.is_game_running());
        assert_eq!(state(&arena, player), Some(CombatState::Die));
        assert!(arena.roster().is_empty());
        assert_eq!(arena.pooled_count(), 2);
        assert_eq!(arena.progression().deaths, 1);

        let events = arena.events().drain();
        assert!(events.contains(&CombatEvent::GameOver { deaths: 1 }));
        assert!(events.contains(&CombatEvent::Animation {
            entity: player,
            signal: AnimationSignal::DieTriggered,
        }));

        // Dead stays dead.
        assert!(!arena.begin_control());
        assert_eq!(arena.cast_skill(2), Err(SkillError::CasterDead));
        run(&mut arena, 4);
        assert_eq!(state(&arena, player), Some(CombatState::Die));
    }

    #[test]
    fn test_phantom_blade_dashes_and_strikes() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(6.0, 0.0), dummy(1_000, 1, 1.0))
            .expect("monster spawned");
        run(&mut arena, 1);
        assert_eq!(state(&arena, player), Some(CombatState::Track));

        assert_eq!(arena.cast_skill(0), Ok(SkillKind::PhantomBlade));
        assert_eq!(state(&arena, player), Some(CombatState::Skill));
        assert!(arena.player().is_some_and(CombatEntity::is_dashing));

        for _ in 0..10 {
            if arena.player().is_some_and(|p| !p.is_dashing()) {
                break;
            }
            arena.advance(DT);
        }
        // skill damage = 10 * (100 + 100) / 100
        assert_eq!(health(&arena, monster), 980);
        assert_eq!(state(&arena, player), Some(CombatState::Skill));

        run(&mut arena, 3);
        assert_ne!(state(&arena, player), Some(CombatState::Skill));
        assert!(matches!(arena.cast_skill(0), Err(SkillError::OnCooldown { .. })));
    }

    #[test]
    fn test_dash_target_death_aborts_without_damage() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(10.0, 0.0), dummy(1_000, 1, 1.0))
            .expect("monster spawned");
        run(&mut arena, 1);
        assert_eq!(arena.cast_skill(0), Ok(SkillKind::PhantomBlade));

        assert!(arena.damage(monster, DamageMessage::environmental(5_000)).is_kill());
        arena.events().drain();
        run(&mut arena, 1);

        assert_eq!(state(&arena, player), Some(CombatState::Idle));
        assert!(arena.player().is_some_and(|p| !p.is_casting()));
        let hits: Vec<_> = arena
            .events()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, CombatEvent::HealthChanged { entity, .. } if *entity == monster))
            .collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_recovery_heals_and_starts_cooldown() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        arena.damage(player, DamageMessage::environmental(50));

        assert_eq!(arena.cast_skill(2), Ok(SkillKind::Recovery));
        assert_eq!(health(&arena, player), 80);
        assert_eq!(state(&arena, player), Some(CombatState::Idle));
        assert!(matches!(arena.cast_skill(2), Err(SkillError::OnCooldown { .. })));
        assert!(matches!(arena.cast_skill(0), Err(SkillError::CastLockout { .. })));
    }

    #[test]
    fn test_fire_ball_needs_visible_target_and_explodes() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        assert_eq!(arena.cast_skill(1), Err(SkillError::NoTarget));

        let far = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(30.0, 0.0), dummy(1_000, 1, 1.0))
            .expect("monster spawned");
        run(&mut arena, 1);
        assert_eq!(arena.player().and_then(CombatEntity::target), Some(far));
        assert_eq!(arena.cast_skill(1), Err(SkillError::TargetOffScreen));

        let near = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(8.0, 0.0), dummy(1_000, 1, 1.0))
            .expect("monster spawned");
        let beside = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(9.0, 1.0), dummy(1_000, 1, 1.0))
            .expect("monster spawned");
        run(&mut arena, 1);
        assert_eq!(arena.player().and_then(CombatEntity::target), Some(near));

        assert_eq!(arena.cast_skill(1), Ok(SkillKind::FireBall));
        assert_eq!(arena.projectiles().len(), 1);
        run(&mut arena, 8);

        // skill damage = 10 * (100 + 50) / 100
        assert!(arena.projectiles().is_empty());
        assert_eq!(health(&arena, near), 985);
        assert_eq!(health(&arena, beside), 985);
        assert_eq!(health(&arena, far), 1_000);
        assert_eq!(health(&arena, player), 100);
    }

    #[test]
    fn test_control_moves_player_and_blocks_while_casting() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        assert!(arena.begin_control());
        assert_eq!(state(&arena, player), Some(CombatState::Control));

        arena.set_move_input(Vec2::new(1.0, 0.0));
        run(&mut arena, 2);
        let x = arena.player().map_or(0.0, |p| p.position().x);
        assert!((x - 1.0).abs() < 1e-5);

        arena.end_control();
        assert_eq!(state(&arena, player), Some(CombatState::Idle));

        arena.spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(8.0, 0.0), dummy(1_000, 1, 1.0));
        run(&mut arena, 1);
        assert_eq!(arena.cast_skill(0), Ok(SkillKind::PhantomBlade));
        assert!(!arena.begin_control());
    }

    #[test]
    fn test_cast_while_steering_returns_to_control() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        assert!(arena.begin_control());
        arena.set_move_input(Vec2::new(1.0, 0.0));
        run(&mut arena, 1);

        assert_eq!(arena.cast_skill(2), Ok(SkillKind::Recovery));
        assert_eq!(state(&arena, player), Some(CombatState::Control));

        run(&mut arena, 8);
        assert_eq!(state(&arena, player), Some(CombatState::Control));
        // 4 units/s for nine ticks of 0.125 s.
        let x = arena.player().map_or(0.0, |p| p.position().x);
        assert!((x - 4.5).abs() < 1e-4);
    }

    #[test]
    fn test_target_lost_mid_track_goes_idle() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(8.0, 0.0), dummy(1_000, 1, 1.0))
            .expect("monster spawned");
        run(&mut arena, 1);
        assert_eq!(state(&arena, player), Some(CombatState::Track));

        assert!(arena.damage(monster, DamageMessage::environmental(5_000)).is_kill());
        run(&mut arena, 1);
        assert_eq!(state(&arena, player), Some(CombatState::Idle));
        assert_eq!(arena.player().and_then(CombatEntity::target), None);
        assert!(arena.player().and_then(CombatEntity::last_attack_at).is_none());
    }

    #[test]
    fn test_dead_monster_drops_armed_strike() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(1.0, 0.0), dummy(1_000, 7, 1.0))
            .expect("monster spawned");
        assert!(arena.set_strike_mode(monster, StrikeMode::AnimationEvent));

        run(&mut arena, 2);
        assert!(arena.entity(monster).is_some_and(CombatEntity::is_strike_armed));
        assert_eq!(health(&arena, player), 100);

        assert!(arena.damage(monster, DamageMessage::environmental(5_000)).is_kill());
        assert!(!arena.strike_landed(monster));
        assert_eq!(health(&arena, player), 100);
    }

    #[test]
    fn test_animation_event_strike_waits_for_frame() {
        let mut arena = arena();
        let player = arena.spawn_player(Vec2::ZERO);
        assert!(arena.set_strike_mode(player, StrikeMode::AnimationEvent));
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(1.0, 0.0), dummy(100, 0, 0.1))
            .expect("monster spawned");

        run(&mut arena, 2);
        assert!(arena.player().is_some_and(CombatEntity::is_strike_armed));
        assert_eq!(health(&arena, monster), 100);

        assert!(arena.strike_landed(player));
        assert_eq!(health(&arena, monster), 90);
        assert!(!arena.strike_landed(player));
    }

    #[test]
    fn test_obstacle_blocks_strike() {
        let mut arena = arena();
        arena.add_obstacle(Circle::new(Vec2::new(0.7, 0.0), 0.1));
        let player = arena.spawn_player(Vec2::ZERO);
        let monster = arena
            .spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(1.4, 0.0), dummy(100, 5, 1.0))
            .expect("monster spawned");

        run(&mut arena, 4);
        assert_eq!(arena.player().and_then(CombatEntity::target), Some(monster));
        assert!(arena.player().and_then(CombatEntity::last_attack_at).is_some());
        assert_eq!(health(&arena, monster), 100);
        assert_eq!(health(&arena, player), 100);
    }

    #[test]
    fn test_pooled_monster_is_reused_with_new_lifetime() {
        let mut arena = arena();
        arena.spawn_player(Vec2::ZERO);
        let first = arena
            .spawn_monster(MonsterKind::Wraith, Vec2::new(20.0, 0.0))
            .expect("monster spawned");
        let old_life = arena.entity(first).map(CombatEntity::lifetime);

        arena.damage(first, DamageMessage::environmental(10_000));
        run(&mut arena, 9);
        assert_eq!(arena.pooled_count(), 1);

        let second = arena.spawn_monster(MonsterKind::Wraith, Vec2::new(-20.0, 0.0));
        assert_eq!(second, Some(first));
        let new_life = arena.entity(first).map(CombatEntity::lifetime);
        assert_ne!(old_life, new_life);
        assert_eq!(health(&arena, first), arena.entity(first).map_or(0, |e| e.stats().max_health()));
        assert_eq!(state(&arena, first), Some(CombatState::Track));
    }

    #[test]
    fn test_wave_cycle_advances_stage() {
        let config = ArenaConfig {
            spawn_cycle: 0.5,
            next_wave_delay: 0.5,
            ..ArenaConfig::default()
        };
        let catalog = Catalog {
            obstacles: Vec::new(),
            ..Catalog::default()
        };
        let mut arena = Arena::new(config, catalog);
        arena.start_game();
        assert_eq!(arena.wave().size, 1);

        run(&mut arena, 4);
        assert_eq!(arena.roster().len(), 1);
        let monster = arena.roster().snapshot()[0];

        arena.damage(monster, DamageMessage::environmental(100_000));
        assert!(!arena.wave().active);
        run(&mut arena, 4);

        assert_eq!(arena.progression().stage.label(), "1-1");
        assert_eq!(arena.wave().size, 2);
        assert!(arena.progression().wallet.balance(Currency::Karma) >= 2);
        let events = arena.events().drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::WaveCleared { stage } if stage == "1-0")));
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::WaveStarted { stage, size: 2 } if stage == "1-1")));
    }

    #[test]
    fn test_upgrades_spend_currency() {
        let mut arena = arena();
        arena.spawn_player(Vec2::ZERO);
        assert!(matches!(
            arena.upgrade_stat(StatKind::AttackPower),
            Err(UpgradeError::Funds(_))
        ));

        arena.grant(Currency::Gold, 150);
        assert_eq!(arena.upgrade_stat(StatKind::AttackPower), Ok(2));
        assert_eq!(arena.player().map(|p| p.stats().attack_power()), Some(15));

        arena.grant(Currency::Karma, 150);
        assert_eq!(arena.upgrade_skill(SkillKind::PhantomBlade), Ok(150));
        assert_eq!(arena.progression().wallet.balance(Currency::Karma), 0);
    }

    #[test]
    fn test_equipment_through_arena() {
        let mut arena = arena();
        arena.spawn_player(Vec2::ZERO);
        let sword = EquipmentId::new(1);
        let blade = EquipmentId::new(2);

        assert_eq!(arena.equip(sword), Ok(EquipOutcome::Equipped { replaced: None }));
        assert_eq!(arena.player().map(|p| p.stats().attack_power()), Some(15));
        assert_eq!(arena.equip(blade), Err(EquipmentError::Locked(blade)));

        arena.grant(Currency::Gold, 1_000);
        assert_eq!(arena.purchase_equipment(blade), Ok(1_000));
        assert_eq!(
            arena.equip(blade),
            Ok(EquipOutcome::Equipped {
                replaced: Some(sword)
            })
        );
        assert_eq!(arena.player().map(|p| p.stats().attack_power()), Some(25));
        assert_eq!(arena.unequip(EquipSlot::Weapon), Some(blade));
        assert_eq!(arena.player().map(|p| p.stats().attack_power()), Some(10));
    }

    #[test]
    fn test_auto_cast_fires_ready_skill() {
        let mut arena = arena();
        arena.spawn_player(Vec2::ZERO);
        arena.spawn_monster_with_stats(MonsterKind::Spider, Vec2::new(1.0, 0.0), dummy(10_000, 1, 1.0));
        assert!(arena.set_auto_cast(true));
        arena.events().drain();

        run(&mut arena, 2);
        let casts = arena
            .events()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, CombatEvent::SkillCast { .. }))
            .count();
        assert_eq!(casts, 1);
    }

    #[test]
    fn test_paused_arena_is_frozen() {
        let mut arena = arena();
        arena.spawn_player(Vec2::ZERO);
        arena.set_paused(true);
        run(&mut arena, 4);
        assert!(arena.time().abs() < f64::EPSILON);
        arena.set_paused(false);
        run(&mut arena, 4);
        assert!((arena.time() - 0.5).abs() < 1e-9);
    }
}
