//! Per-frame simulation tick
//!
//! [`GameManager`] owns the run state and every modifier subsystem. Each tick
//! feeds the same `dt` to all of them, then composes their outputs into the
//! effective parameters that drive spawning and collision.

use glam::Vec2;
use serde::Serialize;

use super::events::{ContactOutcome, EventBus, GameEvent};
use super::rng::GameRng;
use super::state::{
    GamePhase, GameState, GateKind, Obstacle, ObstacleKind, SpawnEntity, SpawnRequest, lane_x,
};
use crate::consts::*;
use crate::modifiers::comeback::ASSIST_SHIELD_DURATION;
use crate::modifiers::near_miss::COLLISION_RADIUS;
use crate::modifiers::{
    ActiveBuff, ActiveEvent, AdaptiveMultipliers, AdaptivePerformanceController, BuffKind,
    ComboTracker, ComebackAssist, ComebackAssistant, ContactResolution, CritStats,
    CriticalRollEngine, EventEffects, LaneTraitAssigner, LaneTraitConfig, LaneTraitKind,
    MomentumTier, MomentumTracker, Mutation, MutationRollEngine, NearMissTracker, PatternKind,
    PatternScheduler, ProgressionDifficulty, TimedBuffRegistry, Trend, WeightedEventScheduler,
    WorldEventKind,
};
use crate::settings::{Feature, Preset, Settings};

/// Randomly spawned gates carry a base value in this range (inclusive)
pub const GATE_VALUE_RANGE: (u32, u32) = (5, 15);
/// Randomly spawned enemy crowds carry a base value in this range (inclusive)
pub const ENEMY_VALUE_RANGE: (u32, u32) = (5, 15);
/// Multiply gates roll a factor in this range (inclusive)
pub const MULTIPLY_FACTOR_RANGE: (u32, u32) = (2, 3);

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Steer toward a lane (clamped to the track)
    pub target_lane: Option<usize>,
    /// Step one lane left
    pub move_left: bool,
    /// Step one lane right
    pub move_right: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - AI steers the crowd
    pub idle_mode: bool,
}

/// Composed parameters for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveParams {
    pub difficulty_speed: f32,
    pub buff_speed: f32,
    /// manual × difficulty × buff
    pub effective_speed: f32,
    /// `dt × effective_speed`
    pub adjusted_delta: f32,
    /// Obstacle closing speed (world units per adjusted second)
    pub approach_speed: f32,
    /// Seconds of adjusted time between random spawns
    pub spawn_interval: f32,
}

impl Default for EffectiveParams {
    fn default() -> Self {
        Self {
            difficulty_speed: 1.0,
            buff_speed: 1.0,
            effective_speed: 1.0,
            adjusted_delta: 0.0,
            approach_speed: RUN_SPEED,
            spawn_interval: ProgressionDifficulty::new().obstacle_interval(),
        }
    }
}

/// Read-only view of every modifier for HUD collaborators
#[derive(Debug, Clone, Serialize)]
pub struct ModifierSnapshot {
    pub phase: GamePhase,
    pub crowd: u32,
    pub score: u64,
    pub distance: f32,
    pub level: u32,
    pub params: EffectiveParams,
    pub momentum_tier: MomentumTier,
    pub momentum_streak: u32,
    pub combo: u32,
    pub combo_multiplier: f32,
    pub buffs: Vec<ActiveBuff>,
    pub world_event: Option<ActiveEvent>,
    pub pattern: Option<PatternKind>,
    pub lane_traits: [LaneTraitKind; LANE_COUNT],
    pub danger: f32,
    pub second_chance_used: bool,
    pub trend: Trend,
    pub adaptive: AdaptiveMultipliers,
    pub crits: CritStats,
    pub near_miss_streak: u32,
}

/// Reward for a collected gate: each factor is applied and floored in turn.
/// The critical roll happens afterwards, on the floored result.
pub fn compose_reward(
    base: u32,
    momentum: f32,
    comeback: f32,
    frenzy: f32,
    one_shot: Option<f32>,
) -> u32 {
    let stage = |value: u32, factor: f32| (value as f32 * factor.max(0.0)).floor() as u32;
    let mut reward = stage(base, momentum);
    reward = stage(reward, comeback);
    reward = stage(reward, frenzy);
    if let Some(factor) = one_shot {
        reward = stage(reward, factor);
    }
    reward
}

/// Composition root for a run
#[derive(Debug)]
pub struct GameManager {
    settings: Settings,
    rng: GameRng,
    state: GameState,
    bus: EventBus,
    progression: ProgressionDifficulty,
    adaptive: AdaptivePerformanceController,
    momentum: MomentumTracker,
    combo: ComboTracker,
    buffs: TimedBuffRegistry,
    world_events: WeightedEventScheduler,
    patterns: PatternScheduler,
    lanes: LaneTraitAssigner,
    comeback: ComebackAssistant,
    critical: CriticalRollEngine,
    mutations: MutationRollEngine,
    near_miss: NearMissTracker,
    params: EffectiveParams,
    /// Adjusted seconds since the last random spawn
    spawn_timer: f32,
    /// Seconds toward the next regen member
    regen_timer: f32,
}

impl GameManager {
    pub fn new(settings: Settings, seed: u64) -> Self {
        let mut rng = GameRng::new(seed);
        let world_events = WeightedEventScheduler::new(&mut rng);
        log::info!(
            "Game manager created (seed {seed}, preset {})",
            settings.preset.as_str()
        );
        Self {
            critical: CriticalRollEngine::new(settings.luck_multiplier()),
            mutations: MutationRollEngine::new(settings.mutation_chance()),
            settings,
            rng,
            state: GameState::new(seed),
            bus: EventBus::new(),
            progression: ProgressionDifficulty::new(),
            adaptive: AdaptivePerformanceController::new(),
            momentum: MomentumTracker::new(),
            combo: ComboTracker::new(),
            buffs: TimedBuffRegistry::new(),
            world_events,
            patterns: PatternScheduler::new(),
            lanes: LaneTraitAssigner::new(),
            comeback: ComebackAssistant::new(),
            near_miss: NearMissTracker::new(),
            params: EffectiveParams::default(),
            spawn_timer: 0.0,
            regen_timer: 0.0,
        }
    }

    /// Reset every subsystem and begin a run
    pub fn start_new_game(&mut self) {
        self.state = GameState::new(self.rng.seed());
        self.state.phase = GamePhase::Playing;

        self.progression.reset();
        self.adaptive.reset();
        self.momentum.reset();
        self.combo.reset();
        self.buffs.reset();
        self.world_events.reset(&mut self.rng);
        self.patterns.reset();
        self.lanes.reset();
        self.comeback.reset();
        self.critical.reset();
        self.mutations.reset();
        self.near_miss.reset();

        self.params = EffectiveParams::default();
        self.spawn_timer = 0.0;
        self.regen_timer = 0.0;
        self.bus.clear();
        log::info!("New game started (crowd {})", self.state.crowd);
    }

    pub fn pause(&mut self) -> bool {
        if self.state.phase != GamePhase::Playing {
            return false;
        }
        self.state.phase = GamePhase::Paused;
        log::info!("Paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state.phase != GamePhase::Paused {
            return false;
        }
        self.state.phase = GamePhase::Playing;
        log::info!("Resumed");
        true
    }

    /// Advance the run by one frame
    pub fn tick(&mut self, dt: f32, input: &TickInput) {
        if input.pause {
            match self.state.phase {
                GamePhase::Playing => {
                    self.pause();
                    return;
                }
                GamePhase::Paused => {
                    self.resume();
                }
                _ => {}
            }
        }

        if self.state.phase != GamePhase::Playing {
            return;
        }

        let dt = if dt.is_finite() {
            dt.clamp(0.0, MAX_DT)
        } else {
            log::warn!("Ignoring non-finite dt {dt}");
            0.0
        };
        let mut events = Vec::new();

        self.steer(input, dt);

        let mut pattern_spawns = Vec::new();
        self.update_modifiers(dt, &mut events, &mut pattern_spawns);

        // Levels reached by last tick's distance apply to this tick's params
        self.progression.update_distance(self.state.distance, &mut events);
        self.params = self.compose_params(dt);
        self.state.elapsed += dt;
        self.state.distance += self.params.adjusted_delta * RUN_SPEED;

        let power_ups = self.settings.enabled(Feature::PowerUps);
        for request in pattern_spawns {
            if request.entity == SpawnEntity::PowerUp && !power_ups {
                continue;
            }
            self.spawn_at(request, SPAWN_DISTANCE, &mut events);
        }
        self.spawn_random(&mut events);
        self.advance_obstacles(&mut events);
        self.apply_regen(dt);
        self.observe_crowd(&mut events);

        self.bus.publish_all(events);
    }

    fn steer(&mut self, input: &TickInput, dt: f32) {
        let mut target = self.state.player_lane;
        if input.idle_mode {
            target = self.autopilot_lane();
        }
        if let Some(lane) = input.target_lane {
            target = lane;
        }
        if input.move_left {
            target = target.saturating_sub(1);
        }
        if input.move_right {
            target += 1;
        }
        self.state.set_player_lane(target);
        self.state.slide_player(dt);
    }

    /// Greedy lane choice over the nearest obstacle in each lane
    fn autopilot_lane(&self) -> usize {
        let crowd = self.state.crowd;
        let current = self.state.player_lane;
        let mut best = (current, f32::MIN);

        for lane in 0..LANE_COUNT {
            let nearest = self
                .state
                .obstacles
                .iter()
                .filter(|o| o.lane == lane && o.pos.y > 0.0 && o.pos.y < AUTOPILOT_LOOKAHEAD)
                .min_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

            let mut score = match nearest.map(|o| o.kind) {
                None => 0.0,
                Some(ObstacleKind::Gate {
                    kind: GateKind::Addition,
                    value,
                }) => value as f32,
                Some(ObstacleKind::Gate {
                    kind: GateKind::Multiply,
                    value,
                }) => crowd.saturating_mul(value.saturating_sub(1)) as f32,
                Some(ObstacleKind::PowerUp { .. }) => 5.0,
                Some(ObstacleKind::EnemyCrowd { value, .. }) if value >= crowd => -1000.0,
                Some(ObstacleKind::EnemyCrowd { value, .. }) => -(value as f32),
            };
            if lane == current {
                score += 0.5;
            }
            score -= lane.abs_diff(current) as f32 * 0.25;

            if score > best.1 {
                best = (lane, score);
            }
        }
        best.0
    }

    /// Every enabled subsystem sees the same `dt`
    fn update_modifiers(
        &mut self,
        dt: f32,
        events: &mut Vec<GameEvent>,
        pattern_spawns: &mut Vec<SpawnRequest>,
    ) {
        let features = self.settings.features;

        self.progression.update(dt);
        if features.adaptive_difficulty {
            self.adaptive.update(dt, events);
        }
        self.buffs.update(dt, events);
        if features.momentum && self.momentum.update(dt, events) {
            self.buffs
                .activate_power_up(BuffKind::Shield, BuffKind::Shield.default_duration(), events);
        }
        if features.combos {
            self.combo.update(dt, events);
        }
        if features.world_events {
            self.world_events.update(dt, &mut self.rng, events);
        }
        if features.patterns {
            self.patterns.update(dt, &mut self.rng, events, pattern_spawns);
        }
        if features.lane_traits {
            self.lanes.update(dt, &mut self.rng, events);
        }
        if features.comeback {
            self.comeback.update(dt);
        }
        self.mutations.update(dt);
        if features.near_misses {
            self.near_miss.update(dt);
        }
    }

    fn compose_params(&self, dt: f32) -> EffectiveParams {
        let difficulty_speed = self.progression.speed_multiplier();
        let buff_speed = self.buffs.speed_multiplier();
        let effective_speed = self.settings.manual_speed() * difficulty_speed * buff_speed;
        EffectiveParams {
            difficulty_speed,
            buff_speed,
            effective_speed,
            adjusted_delta: dt * effective_speed,
            approach_speed: RUN_SPEED * self.event_effects().speed,
            spawn_interval: self.progression.obstacle_interval(),
        }
    }

    fn event_effects(&self) -> EventEffects {
        if self.settings.enabled(Feature::WorldEvents) {
            self.world_events.effects()
        } else {
            EventEffects::NEUTRAL
        }
    }

    fn lane_config(&self, lane: usize) -> LaneTraitConfig {
        if self.settings.enabled(Feature::LaneTraits) {
            self.lanes.config(lane)
        } else {
            LaneTraitConfig::NEUTRAL
        }
    }

    fn adaptive_multipliers(&self) -> AdaptiveMultipliers {
        if self.settings.enabled(Feature::AdaptiveDifficulty) {
            self.adaptive.multipliers()
        } else {
            AdaptiveMultipliers::default()
        }
    }

    /// Progression shares of each entity type, before any rate multiplier
    fn base_spawn_weights(&self) -> [(SpawnEntity, f32); 4] {
        let features = self.settings.features;
        let p = &self.progression;

        // Disabled multiply gates hand their share to addition gates
        let (addition, multiply) = if features.multiply_gates {
            (p.addition_gate_percentage(), p.multiply_gate_percentage())
        } else {
            (
                p.addition_gate_percentage() + p.multiply_gate_percentage(),
                0.0,
            )
        };
        let power_up = if features.power_ups {
            p.power_up_chance()
        } else {
            0.0
        };

        [
            (SpawnEntity::AdditionGate, addition),
            (SpawnEntity::MultiplyGate, multiply),
            (SpawnEntity::Enemy, p.enemy_percentage()),
            (SpawnEntity::PowerUp, power_up),
        ]
    }

    /// Spawn weight of each entity type for `lane`: its progression share
    /// times the event, lane trait and adaptive rate multipliers
    pub fn spawn_weights(&self, lane: usize) -> [(SpawnEntity, f32); 4] {
        let event = self.event_effects();
        let traits = self.lane_config(lane);
        let adaptive = self.adaptive_multipliers();
        let gate_scale = event.gate_spawn * traits.gate_spawn;

        self.base_spawn_weights().map(|(entity, weight)| {
            let rate = match entity {
                SpawnEntity::AdditionGate | SpawnEntity::MultiplyGate => gate_scale,
                SpawnEntity::Enemy => {
                    event.enemy_spawn * traits.enemy_spawn * adaptive.obstacle_frequency
                }
                SpawnEntity::PowerUp => adaptive.power_up_frequency,
            };
            (entity, weight * rate)
        })
    }

    /// Random spawns per base interval, relative to the unmodified mix.
    ///
    /// 1.0 when every multiplier is neutral. Each entity type in each lane
    /// then spawns at its base rate times its own multiplier.
    pub fn spawn_rate(&self) -> f32 {
        let base: f32 = self.base_spawn_weights().iter().map(|(_, w)| w).sum();
        if base <= 0.0 {
            return 0.0;
        }
        let scaled: f32 = (0..LANE_COUNT).map(|lane| self.lane_spawn_weight(lane)).sum();
        scaled / (LANE_COUNT as f32 * base)
    }

    fn lane_spawn_weight(&self, lane: usize) -> f32 {
        self.spawn_weights(lane).iter().map(|(_, w)| w).sum()
    }

    fn spawn_random(&mut self, events: &mut Vec<GameEvent>) {
        let features = self.settings.features;
        if !features.random_spawns {
            return;
        }
        if features.patterns && self.patterns.suppresses_random_spawns() {
            return;
        }
        let interval = self.params.spawn_interval;
        if interval <= 0.0 {
            return;
        }

        self.spawn_timer += self.params.adjusted_delta * self.spawn_rate();
        let mut row = 0;
        while self.spawn_timer >= interval {
            self.spawn_timer -= interval;

            let lanes: [(usize, f32); LANE_COUNT] =
                std::array::from_fn(|lane| (lane, self.lane_spawn_weight(lane)));
            let lane = self.rng.weighted_pick(&lanes, LANE_COUNT / 2);
            let weights = self.spawn_weights(lane);
            let entity = self.rng.weighted_pick(&weights, SpawnEntity::AdditionGate);
            // Backlogged spawns queue up behind the spawn line
            let ahead = SPAWN_DISTANCE + row as f32 * BURST_SPACING;
            self.spawn_at(
                SpawnRequest {
                    lane,
                    entity,
                    value: None,
                },
                ahead,
                events,
            );
            row += 1;
        }
    }

    /// Materialise a request at the spawn line. Returns the new obstacle id.
    pub fn spawn(&mut self, request: SpawnRequest) -> u32 {
        let mut events = Vec::new();
        let id = self.spawn_at(request, SPAWN_DISTANCE, &mut events);
        self.bus.publish_all(events);
        id
    }

    fn spawn_at(&mut self, request: SpawnRequest, ahead: f32, events: &mut Vec<GameEvent>) -> u32 {
        let lane = if request.lane < LANE_COUNT {
            request.lane
        } else {
            log::warn!("Spawn lane {} out of range, clamping", request.lane);
            LANE_COUNT - 1
        };

        let (kind, speed, value) = match request.entity {
            SpawnEntity::AdditionGate => {
                let value = match request.value {
                    Some(v) => v,
                    None => self.roll_gate_value(lane),
                };
                let kind = ObstacleKind::Gate {
                    kind: GateKind::Addition,
                    value,
                };
                (kind, 1.0, Some(value))
            }
            SpawnEntity::MultiplyGate => {
                let value = match request.value {
                    Some(v) => v,
                    None => self.roll_in(MULTIPLY_FACTOR_RANGE),
                };
                let kind = ObstacleKind::Gate {
                    kind: GateKind::Multiply,
                    value,
                };
                (kind, 1.0, Some(value))
            }
            SpawnEntity::Enemy => {
                let mutation = if self.settings.enabled(Feature::Mutations) {
                    self.mutations.roll(&mut self.rng, events)
                } else {
                    Mutation::none(self.mutations.clock())
                };
                let base = match request.value {
                    Some(v) => v as f32,
                    None => self.roll_enemy_base(lane),
                };
                let value = ((base * mutation.strength).floor() as u32).max(1);
                (
                    ObstacleKind::EnemyCrowd { value, mutation },
                    mutation.speed,
                    Some(value),
                )
            }
            SpawnEntity::PowerUp => {
                let buff = BuffKind::ALL[self.rng.index(BuffKind::ALL.len())];
                (ObstacleKind::PowerUp { buff }, 1.0, None)
            }
        };

        let id = self.state.next_entity_id();
        self.state.obstacles.push(Obstacle {
            id,
            lane,
            pos: Vec2::new(lane_x(lane), ahead),
            speed,
            kind,
        });
        events.push(GameEvent::ObstacleSpawned {
            id,
            request: SpawnRequest {
                lane,
                entity: request.entity,
                value,
            },
        });
        id
    }

    fn roll_in(&mut self, (min, max): (u32, u32)) -> u32 {
        min + self.rng.index((max - min + 1) as usize) as u32
    }

    fn roll_gate_value(&mut self, lane: usize) -> u32 {
        let base = self.roll_in(GATE_VALUE_RANGE);
        let scale = self.adaptive_multipliers().gate_value
            * self.event_effects().gate_value
            * self.lane_config(lane).gate_value;
        ((base as f32 * scale).floor() as u32).max(1)
    }

    fn roll_enemy_base(&mut self, lane: usize) -> f32 {
        let base = self.roll_in(ENEMY_VALUE_RANGE);
        base as f32
            * self.progression.enemy_count_multiplier()
            * self.adaptive_multipliers().enemy_strength
            * self.event_effects().enemy_size
            * self.lane_config(lane).enemy_strength
    }

    fn advance_obstacles(&mut self, events: &mut Vec<GameEvent>) {
        let step = self.params.adjusted_delta * self.params.approach_speed;
        let mut arrived = Vec::new();
        for obstacle in self.state.obstacles.iter_mut() {
            if obstacle.advance(step) {
                arrived.push(*obstacle);
            }
        }
        self.state.obstacles.retain(|o| o.pos.y > 0.0);

        for obstacle in arrived {
            if self.state.phase != GamePhase::Playing {
                break;
            }
            self.resolve_arrival(obstacle, events);
        }
    }

    /// An obstacle reached the player's line
    fn resolve_arrival(&mut self, obstacle: Obstacle, events: &mut Vec<GameEvent>) {
        let lateral = obstacle.pos.x - self.state.player_x;
        let hit = lateral.abs() <= COLLISION_RADIUS;

        match obstacle.kind {
            ObstacleKind::Gate { kind, value } if hit => self.collect_gate(kind, value, events),
            ObstacleKind::PowerUp { buff } if hit => {
                events.push(GameEvent::PowerUpCollected { kind: buff });
                self.buffs.activate_power_up(buff, buff.default_duration(), events);
            }
            ObstacleKind::EnemyCrowd { value, mutation } if hit => {
                self.enemy_contact(obstacle.id, value, &mutation, events)
            }
            missed => {
                match missed {
                    ObstacleKind::Gate { .. } => self.adaptive.record_gate_missed(),
                    ObstacleKind::EnemyCrowd { .. } => {
                        self.adaptive.record_enemy_avoided();
                        if self.settings.enabled(Feature::NearMisses) {
                            if let Some(bonus) = self.near_miss.check(lateral, events) {
                                self.state.score += u64::from(bonus);
                            }
                        }
                    }
                    ObstacleKind::PowerUp { .. } => {}
                }
                events.push(GameEvent::ObstacleMissed {
                    id: obstacle.id,
                    kind: missed,
                });
            }
        }
    }

    fn collect_gate(&mut self, kind: GateKind, value: u32, events: &mut Vec<GameEvent>) {
        let features = self.settings.features;
        let crowd = self.state.crowd;
        let base = match kind {
            GateKind::Addition => value,
            GateKind::Multiply => crowd.saturating_mul(value.saturating_sub(1)),
        };

        let reward = self.reward_for(base, events);
        self.state.crowd = crowd.saturating_add(reward);

        if features.momentum {
            self.momentum.on_gate_collected(events);
        }
        let combo = if features.combos {
            self.combo.add_to_combo(events);
            self.combo.multiplier()
        } else {
            1.0
        };
        self.adaptive.record_gate_collected();
        self.state.score += (reward as f32 * combo).floor() as u64;

        events.push(GameEvent::GateCollected {
            reward,
            crowd: self.state.crowd,
        });
    }

    /// momentum → comeback → frenzy → one-shot → critical
    fn reward_for(&mut self, base: u32, events: &mut Vec<GameEvent>) -> u32 {
        let features = self.settings.features;
        let momentum = if features.momentum {
            self.momentum.multiplier()
        } else {
            1.0
        };
        let comeback = if features.comeback {
            self.comeback.gate_value_multiplier()
        } else {
            1.0
        };
        let one_shot = self.buffs.take_multiplier(events);
        let reward = compose_reward(
            base,
            momentum,
            comeback,
            self.buffs.frenzy_multiplier(),
            one_shot,
        );

        if features.critical_hits {
            self.critical.roll(reward, &mut self.rng, events).0
        } else {
            reward
        }
    }

    fn enemy_contact(
        &mut self,
        id: u32,
        value: u32,
        mutation: &Mutation,
        events: &mut Vec<GameEvent>,
    ) {
        let current = (value as f32 * self.mutations.regeneration_multiplier(mutation)).floor() as u32;

        let outcome = match self.buffs.resolve_enemy_contact(current, events) {
            ContactResolution::PassThrough => {
                self.adaptive.record_enemy_avoided();
                ContactOutcome::PhasedThrough
            }
            ContactResolution::Shielded => {
                self.adaptive.record_enemy_avoided();
                ContactOutcome::Shielded
            }
            ContactResolution::Drained { gained } => {
                self.adaptive.record_enemy_avoided();
                self.state.crowd = self.state.crowd.saturating_add(gained);
                ContactOutcome::Drained { gained }
            }
            ContactResolution::Unprotected => self.take_damage(current, events),
        };

        events.push(GameEvent::EnemyContact {
            id,
            outcome,
            crowd: self.state.crowd,
        });
        if self.state.crowd == 0 {
            self.end_game(events);
        }
    }

    fn take_damage(&mut self, enemy_value: u32, events: &mut Vec<GameEvent>) -> ContactOutcome {
        let features = self.settings.features;
        let strength = if features.comeback {
            (enemy_value as f32 * self.comeback.enemy_strength_multiplier()).floor() as u32
        } else {
            enemy_value
        };

        self.adaptive.record_enemy_hit();
        if features.momentum {
            self.momentum.on_enemy_hit(events);
        }
        if features.combos {
            self.combo.reset_combo(events);
        }

        let before = self.state.crowd;
        if strength < before {
            self.state.crowd = before - strength;
            return ContactOutcome::Damaged { lost: strength };
        }

        if features.comeback && self.comeback.check_second_chance(before, events) {
            self.buffs
                .activate_power_up(BuffKind::Shield, ASSIST_SHIELD_DURATION, events);
            return ContactOutcome::Rescued;
        }
        self.state.crowd = 0;
        ContactOutcome::Damaged { lost: before }
    }

    fn end_game(&mut self, events: &mut Vec<GameEvent>) {
        self.state.phase = GamePhase::GameOver;
        self.adaptive.record_death();
        log::info!(
            "Game over at {:.0}m, score {}",
            self.state.distance,
            self.state.score
        );
        events.push(GameEvent::GameOver {
            distance: self.state.distance,
            score: self.state.score,
        });
    }

    fn apply_regen(&mut self, dt: f32) {
        if self.state.phase != GamePhase::Playing || !self.buffs.has_regen() {
            self.regen_timer = 0.0;
            return;
        }
        self.regen_timer += dt;
        while self.regen_timer >= REGEN_INTERVAL {
            self.regen_timer -= REGEN_INTERVAL;
            self.state.crowd = self.state.crowd.saturating_add(1);
        }
    }

    /// Feed the crowd size to the size-watching subsystems
    fn observe_crowd(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.phase != GamePhase::Playing {
            return;
        }
        let crowd = self.state.crowd;
        self.adaptive.update_crowd_size(crowd);

        if !self.settings.enabled(Feature::Comeback) {
            return;
        }
        if let Some(assist) = self.comeback.update_crowd_size(crowd, &mut self.rng, events) {
            self.apply_assist(assist, events);
        }
    }

    /// Carry out a comeback assist. Without power-ups a drop becomes a shield.
    fn apply_assist(&mut self, assist: ComebackAssist, events: &mut Vec<GameEvent>) {
        match assist {
            ComebackAssist::GrantShield { duration } => {
                self.buffs.activate_power_up(BuffKind::Shield, duration, events);
            }
            ComebackAssist::SpawnPowerUps { .. } if !self.settings.enabled(Feature::PowerUps) => {
                self.buffs
                    .activate_power_up(BuffKind::Shield, ASSIST_SHIELD_DURATION, events);
            }
            ComebackAssist::SpawnPowerUps { count } => {
                for i in 0..count as usize {
                    let request = SpawnRequest {
                        lane: (self.state.player_lane + i) % LANE_COUNT,
                        entity: SpawnEntity::PowerUp,
                        value: None,
                    };
                    let ahead = SPAWN_DISTANCE / 2.0 + i as f32 * BURST_SPACING;
                    self.spawn_at(request, ahead, events);
                }
            }
        }
    }

    // Commands outside the tick

    pub fn activate_power_up(&mut self, kind: BuffKind, duration: f32) {
        let mut events = Vec::new();
        self.buffs.activate_power_up(kind, duration, &mut events);
        self.bus.publish_all(events);
    }

    pub fn start_world_event(&mut self, kind: WorldEventKind) -> bool {
        let mut events = Vec::new();
        let started = self.world_events.start(kind, &mut events);
        self.bus.publish_all(events);
        started
    }

    pub fn activate_pattern(&mut self, kind: PatternKind) -> bool {
        let mut events = Vec::new();
        let started = self.patterns.activate(kind, &mut events);
        self.bus.publish_all(events);
        started
    }

    pub fn assign_lane_trait(&mut self, lane: usize, kind: LaneTraitKind) -> bool {
        let mut events = Vec::new();
        let assigned = self.lanes.assign(lane, kind, &mut events);
        self.bus.publish_all(events);
        assigned
    }

    // Settings

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_feature(&mut self, feature: Feature, enabled: bool) {
        self.settings.set_feature(feature, enabled);
    }

    pub fn set_manual_speed(&mut self, speed: f32) {
        self.settings.set_manual_speed(speed);
    }

    pub fn set_luck_multiplier(&mut self, luck: f32) {
        self.settings.set_luck_multiplier(luck);
        self.critical
            .set_luck_multiplier(self.settings.luck_multiplier());
    }

    pub fn set_mutation_chance(&mut self, chance: f32) {
        self.settings.set_mutation_chance(chance);
        self.mutations.set_chance(self.settings.mutation_chance());
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        self.settings.apply_preset(preset);
        self.critical
            .set_luck_multiplier(self.settings.luck_multiplier());
    }

    // Events

    pub fn subscribe(&mut self, observer: impl FnMut(&GameEvent) + 'static) {
        self.bus.subscribe(observer);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.bus.drain()
    }

    // Queries

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn params(&self) -> EffectiveParams {
        self.params
    }

    pub fn progression(&self) -> &ProgressionDifficulty {
        &self.progression
    }

    pub fn adaptive(&self) -> &AdaptivePerformanceController {
        &self.adaptive
    }

    pub fn momentum(&self) -> &MomentumTracker {
        &self.momentum
    }

    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub fn buffs(&self) -> &TimedBuffRegistry {
        &self.buffs
    }

    pub fn world_events(&self) -> &WeightedEventScheduler {
        &self.world_events
    }

    pub fn patterns(&self) -> &PatternScheduler {
        &self.patterns
    }

    pub fn lanes(&self) -> &LaneTraitAssigner {
        &self.lanes
    }

    pub fn comeback(&self) -> &ComebackAssistant {
        &self.comeback
    }

    pub fn critical(&self) -> &CriticalRollEngine {
        &self.critical
    }

    pub fn mutations(&self) -> &MutationRollEngine {
        &self.mutations
    }

    pub fn near_miss(&self) -> &NearMissTracker {
        &self.near_miss
    }

    pub fn snapshot(&self) -> ModifierSnapshot {
        ModifierSnapshot {
            phase: self.state.phase,
            crowd: self.state.crowd,
            score: self.state.score,
            distance: self.state.distance,
            level: self.progression.level(),
            params: self.params,
            momentum_tier: self.momentum.tier(),
            momentum_streak: self.momentum.streak(),
            combo: self.combo.count(),
            combo_multiplier: self.combo.multiplier(),
            buffs: self.buffs.active().copied().collect(),
            world_event: self.world_events.active().copied(),
            pattern: self.patterns.active().map(|p| p.kind),
            lane_traits: std::array::from_fn(|lane| self.lanes.trait_of(lane)),
            danger: self.comeback.danger_level(),
            second_chance_used: self.comeback.second_chance_used(),
            trend: self.adaptive.trend(),
            adaptive: self.adaptive.multipliers(),
            crits: self.critical.stats(),
            near_miss_streak: self.near_miss.streak(),
        }
    }

    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FeatureFlags;

    const DT: f32 = 1.0 / 60.0;

    fn manager_with(features: FeatureFlags) -> GameManager {
        let mut settings = Settings::default();
        settings.features = features;
        let mut gm = GameManager::new(settings, 12345);
        gm.start_new_game();
        gm
    }

    /// Spawn in the player's lane right in front of them
    fn spawn_in_front(gm: &mut GameManager, entity: SpawnEntity, value: Option<u32>) -> u32 {
        let id = gm.spawn(SpawnRequest {
            lane: gm.state.player_lane,
            entity,
            value,
        });
        let obstacle = gm
            .state
            .obstacles
            .iter_mut()
            .find(|o| o.id == id)
            .expect("spawned obstacle");
        obstacle.pos.y = 0.01;
        id
    }

    #[test]
    fn test_phases_and_pause() {
        let mut gm = GameManager::new(Settings::default(), 1);
        assert_eq!(gm.phase(), GamePhase::Ready);
        gm.tick(DT, &TickInput::default());
        assert_eq!(gm.state().elapsed, 0.0);

        gm.start_new_game();
        assert_eq!(gm.phase(), GamePhase::Playing);

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        gm.tick(DT, &pause);
        assert_eq!(gm.phase(), GamePhase::Paused);
        let elapsed = gm.state().elapsed;
        gm.tick(DT, &TickInput::default());
        assert_eq!(gm.state().elapsed, elapsed);

        gm.tick(DT, &pause);
        assert_eq!(gm.phase(), GamePhase::Playing);
        assert!(gm.state().elapsed > elapsed);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut gm = manager_with(FeatureFlags::none());
        gm.tick(5.0, &TickInput::default());
        assert_eq!(gm.state().elapsed, MAX_DT);
        assert!((gm.state().distance - MAX_DT * RUN_SPEED).abs() < 1e-4);

        gm.tick(-1.0, &TickInput::default());
        gm.tick(f32::NAN, &TickInput::default());
        assert_eq!(gm.state().elapsed, MAX_DT);
    }

    #[test]
    fn test_reward_composition_order() {
        // Base 20, Hot momentum, comeback 1.2, no frenzy, no crit
        assert_eq!(compose_reward(20, 1.25, 1.2, 1.0, None), 30);
        // Each stage floors: 7 -> 8 -> 8 (a single product would give 9)
        assert_eq!(compose_reward(7, 1.25, 1.1, 1.0, None), 8);
        assert_eq!(compose_reward(20, 1.25, 1.2, 2.0, Some(2.0)), 120);
    }

    #[test]
    fn test_gate_collection_end_to_end() {
        let mut features = FeatureFlags::none();
        features.momentum = true;
        features.comeback = true;
        let mut gm = manager_with(features);

        let mut scratch = Vec::new();
        for _ in 0..3 {
            gm.momentum.on_gate_collected(&mut scratch);
        }
        assert_eq!(gm.momentum.tier(), MomentumTier::Hot);
        gm.state.crowd = 22;
        gm.comeback.update_crowd_size(22, &mut gm.rng, &mut scratch);
        assert!((gm.comeback.gate_value_multiplier() - 1.2).abs() < 1e-5);

        spawn_in_front(&mut gm, SpawnEntity::AdditionGate, Some(20));
        gm.drain_events();
        gm.tick(0.1, &TickInput::default());

        assert_eq!(gm.state().crowd, 52);
        let events = gm.drain_events();
        assert!(events.contains(&GameEvent::GateCollected {
            reward: 30,
            crowd: 52
        }));
        assert_eq!(gm.momentum().streak(), 4);
    }

    #[test]
    fn test_one_shot_multiplier_is_spent() {
        let mut gm = manager_with(FeatureFlags::none());
        gm.activate_power_up(BuffKind::Multiplier, 10.0);

        spawn_in_front(&mut gm, SpawnEntity::AdditionGate, Some(10));
        gm.tick(0.1, &TickInput::default());
        assert_eq!(gm.state().crowd, STARTING_CROWD + 20);
        assert!(!gm.buffs().has_multiplier());

        spawn_in_front(&mut gm, SpawnEntity::AdditionGate, Some(10));
        gm.tick(0.1, &TickInput::default());
        assert_eq!(gm.state().crowd, STARTING_CROWD + 30);
    }

    #[test]
    fn test_contact_precedence() {
        let mut gm = manager_with(FeatureFlags::none());
        gm.activate_power_up(BuffKind::Ghost, 5.0);
        gm.activate_power_up(BuffKind::Shield, 5.0);
        gm.activate_power_up(BuffKind::Vampire, 5.0);

        let id = spawn_in_front(&mut gm, SpawnEntity::Enemy, Some(10));
        gm.drain_events();
        gm.tick(0.1, &TickInput::default());
        let events = gm.drain_events();
        assert!(events.contains(&GameEvent::EnemyContact {
            id,
            outcome: ContactOutcome::PhasedThrough,
            crowd: STARTING_CROWD
        }));
        assert!(gm.buffs().has_shield());

        gm.buffs.reset();
        gm.activate_power_up(BuffKind::Vampire, 5.0);
        spawn_in_front(&mut gm, SpawnEntity::Enemy, Some(10));
        gm.tick(0.1, &TickInput::default());
        assert_eq!(gm.state().crowd, STARTING_CROWD + 5);
    }

    #[test]
    fn test_second_chance_then_game_over() {
        let mut features = FeatureFlags::none();
        features.comeback = true;
        let mut gm = manager_with(features);
        gm.state.crowd = 4;

        spawn_in_front(&mut gm, SpawnEntity::Enemy, Some(10));
        gm.tick(0.1, &TickInput::default());
        assert_eq!(gm.phase(), GamePhase::Playing);
        assert_eq!(gm.state().crowd, 4);
        assert!(gm.comeback().second_chance_used());
        let events = gm.drain_events();
        assert!(events.contains(&GameEvent::SecondChanceUsed));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::EnemyContact {
                outcome: ContactOutcome::Rescued,
                ..
            }
        )));

        // Strip the rescue shield and any assist so the next hit lands
        gm.buffs.reset();
        gm.state.obstacles.clear();
        spawn_in_front(&mut gm, SpawnEntity::Enemy, Some(10));
        gm.tick(0.1, &TickInput::default());
        assert_eq!(gm.phase(), GamePhase::GameOver);
        assert_eq!(gm.state().crowd, 0);
        let events = gm.drain_events();
        assert!(!events.contains(&GameEvent::SecondChanceUsed));
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
    }

    #[test]
    fn test_near_miss_scores_bonus() {
        let mut features = FeatureFlags::none();
        features.near_misses = true;
        let mut gm = manager_with(features);

        let id = gm.spawn(SpawnRequest {
            lane: 2,
            entity: SpawnEntity::Enemy,
            value: Some(10),
        });
        gm.state.obstacles[0].pos.y = 0.01;
        gm.tick(0.1, &TickInput::default());

        assert_eq!(gm.state().crowd, STARTING_CROWD);
        assert_eq!(gm.state().score, 2);
        let events = gm.drain_events();
        assert!(events.contains(&GameEvent::NearMiss { bonus: 2, streak: 1 }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::ObstacleMissed { id: m, .. } if *m == id)));
    }

    #[test]
    fn test_disabled_features_stay_neutral() {
        let mut gm = manager_with(FeatureFlags::none());
        for _ in 0..3600 {
            gm.tick(DT, &TickInput::default());
        }
        assert!(gm.state().obstacles.is_empty());
        assert_eq!(gm.state().crowd, STARTING_CROWD);
        assert!(gm.world_events().active().is_none());
        let events = gm.drain_events();
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| matches!(e, GameEvent::LevelUp { .. })));
    }

    #[test]
    fn test_random_spawns_follow_interval() {
        let mut features = FeatureFlags::none();
        features.random_spawns = true;
        let mut gm = manager_with(features);

        for _ in 0..20 {
            gm.tick(0.1, &TickInput::default());
        }
        assert!(gm.state().obstacles.is_empty());
        for _ in 0..40 {
            gm.tick(0.1, &TickInput::default());
        }
        assert_eq!(gm.state().obstacles.len(), 2);
        assert!(gm.state().obstacles.iter().all(|o| !matches!(
            o.kind,
            ObstacleKind::PowerUp { .. }
                | ObstacleKind::Gate {
                    kind: GateKind::Multiply,
                    ..
                }
        )));
    }

    #[test]
    fn test_pattern_suppresses_random_spawns() {
        let mut features = FeatureFlags::none();
        features.random_spawns = true;
        features.patterns = true;
        let mut gm = manager_with(features);

        assert!(gm.activate_pattern(PatternKind::EnemyWall));
        gm.drain_events();
        for _ in 0..30 {
            gm.tick(0.1, &TickInput::default());
        }
        let spawned = gm
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ObstacleSpawned { .. }))
            .count();
        assert_eq!(spawned, PatternKind::EnemyWall.definition().instructions.len());
    }

    #[test]
    fn test_spawn_weights_follow_modifiers() {
        let mut features = FeatureFlags::none();
        features.world_events = true;
        features.lane_traits = true;
        let mut gm = manager_with(features);

        let base = gm.spawn_weights(0);
        assert_eq!(base[1].1, 0.0);
        assert_eq!(base[3].1, 0.0);

        gm.start_world_event(WorldEventKind::GoldRush);
        let rush = gm.spawn_weights(0);
        assert!((rush[0].1 - base[0].1 * 2.0).abs() < 1e-5);
        assert!((rush[2].1 - base[2].1 * 0.5).abs() < 1e-5);

        gm.assign_lane_trait(0, LaneTraitKind::Hostile);
        let hostile = gm.spawn_weights(0);
        assert!((hostile[2].1 - rush[2].1 * 1.5).abs() < 1e-5);
        assert_eq!(gm.spawn_weights(1)[2].1, rush[2].1);

        gm.set_feature(Feature::WorldEvents, false);
        assert_eq!(gm.spawn_weights(1), base);
    }

    #[test]
    fn test_regen_and_auto_shield() {
        let mut features = FeatureFlags::none();
        features.momentum = true;
        let mut gm = manager_with(features);
        gm.activate_power_up(BuffKind::Regen, 10.0);

        for _ in 0..8 {
            gm.tick(0.25, &TickInput::default());
        }
        assert_eq!(gm.state().crowd, STARTING_CROWD + 2);
        assert!(!gm.buffs().has_shield());

        for _ in 0..72 {
            gm.tick(0.25, &TickInput::default());
        }
        assert!(gm.buffs().has_shield());
        assert!(gm.drain_events().contains(&GameEvent::AutoShield));
    }

    #[test]
    fn test_lane_input() {
        let mut gm = manager_with(FeatureFlags::none());
        let left = TickInput {
            move_left: true,
            ..Default::default()
        };
        gm.tick(0.25, &left);
        gm.tick(0.25, &left);
        assert_eq!(gm.state().player_lane, 0);
        assert_eq!(gm.state().player_x, -1.0);

        gm.tick(
            0.25,
            &TickInput {
                target_lane: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(gm.state().player_lane, 2);
    }

    #[test]
    fn test_settings_forwarding() {
        let mut gm = GameManager::new(Settings::default(), 3);
        gm.set_luck_multiplier(0.0);
        assert_eq!(gm.critical().luck_multiplier(), 0.0);
        gm.set_mutation_chance(2.0);
        assert_eq!(gm.mutations().chance(), 1.0);
        gm.set_manual_speed(2.0);
        gm.start_new_game();
        gm.tick(0.1, &TickInput::default());
        assert!((gm.params().effective_speed - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameManager::new(Settings::default(), 99999);
        let mut b = GameManager::new(Settings::default(), 99999);
        a.start_new_game();
        b.start_new_game();

        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..3000 {
            a.tick(DT, &input);
            b.tick(DT, &input);
        }

        assert_eq!(a.state().crowd, b.state().crowd);
        assert_eq!(a.state().score, b.state().score);
        assert_eq!(a.drain_events(), b.drain_events());
        assert_eq!(a.snapshot_json().unwrap(), b.snapshot_json().unwrap());
    }

    #[test]
    fn test_observers_see_events() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&seen);
        let mut gm = manager_with(FeatureFlags::none());
        gm.subscribe(move |_| *sink.borrow_mut() += 1);
        gm.activate_power_up(BuffKind::Frenzy, 3.0);
        assert_eq!(*seen.borrow(), 1);

        let json = gm.snapshot_json().unwrap();
        assert!(json.contains("\"crowd\":30"));
        assert!(json.contains("Frenzy"));
    }

    fn spawned_enemies(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::ObstacleSpawned {
                        request: SpawnRequest {
                            entity: SpawnEntity::Enemy,
                            ..
                        },
                        ..
                    }
                )
            })
            .count()
    }

    #[test]
    fn test_neutral_spawn_rate() {
        let mut features = FeatureFlags::none();
        features.random_spawns = true;
        features.lane_traits = true;
        let mut gm = manager_with(features);
        assert_eq!(gm.spawn_rate(), 1.0);

        gm.assign_lane_trait(0, LaneTraitKind::Hostile);
        assert!(gm.spawn_rate() > 1.0);
    }

    #[test]
    fn test_enemy_swarm_spawns_more_enemies() {
        let run = |swarm: bool| {
            let mut features = FeatureFlags::none();
            features.random_spawns = true;
            features.world_events = swarm;
            let mut gm = manager_with(features);
            let mut enemies = 0;
            for _ in 0..3000 {
                if swarm && gm.world_events().active().is_none() {
                    gm.start_world_event(WorldEventKind::EnemySwarm);
                }
                gm.tick(0.1, &TickInput::default());
                gm.state.obstacles.clear();
                enemies += spawned_enemies(&gm.drain_events());
            }
            enemies
        };

        let base = run(false);
        let swarm = run(true);
        assert!(base > 0);
        assert!(swarm > base, "swarm {swarm} vs base {base}");
    }

    #[test]
    fn test_spawn_backlog_drains_in_one_tick() {
        let mut features = FeatureFlags::none();
        features.random_spawns = true;
        let mut gm = manager_with(features);

        gm.spawn_timer = 6.0;
        gm.tick(0.1, &TickInput::default());
        assert_eq!(gm.state().obstacles.len(), 2);
        assert!(gm.spawn_timer < gm.params().spawn_interval);

        let gap = gm.state().obstacles[1].pos.y - gm.state().obstacles[0].pos.y;
        assert!((gap - BURST_SPACING).abs() < 1e-4);
    }

    #[test]
    fn test_level_up_reaches_params_same_tick() {
        let mut gm = manager_with(FeatureFlags::none());
        gm.state.distance = 100.0;
        gm.tick(0.1, &TickInput::default());

        assert_eq!(gm.progression().level(), 2);
        assert!(gm.drain_events().contains(&GameEvent::LevelUp { level: 2 }));
        assert!(gm.params().difficulty_speed > 1.0);
        assert_eq!(gm.params().difficulty_speed, gm.progression().speed_multiplier());
        assert_eq!(gm.params().spawn_interval, gm.progression().obstacle_interval());
    }

    #[test]
    fn test_comeback_softens_enemy_contact() {
        let mut features = FeatureFlags::none();
        features.comeback = true;
        let mut gm = manager_with(features);

        let mut scratch = Vec::new();
        gm.state.crowd = 20;
        gm.comeback.update_crowd_size(20, &mut gm.rng, &mut scratch);
        assert!((gm.comeback().danger_level() - 0.5).abs() < 1e-6);
        gm.buffs.reset();

        let id = spawn_in_front(&mut gm, SpawnEntity::Enemy, Some(10));
        gm.drain_events();
        gm.tick(0.1, &TickInput::default());

        // floor(10 * 0.85) = 8
        assert_eq!(gm.state().crowd, 12);
        assert!(gm.drain_events().contains(&GameEvent::EnemyContact {
            id,
            outcome: ContactOutcome::Damaged { lost: 8 },
            crowd: 12
        }));
    }

    #[test]
    fn test_regenerating_enemy_hits_harder() {
        use crate::modifiers::MutationKind;

        let mut gm = manager_with(FeatureFlags::none());
        let id = spawn_in_front(&mut gm, SpawnEntity::Enemy, Some(10));
        gm.state.obstacles[0].kind = ObstacleKind::EnemyCrowd {
            value: 10,
            mutation: Mutation::of(MutationKind::Regenerating, gm.mutations.clock()),
        };
        gm.mutations.update(10.0);
        gm.drain_events();
        gm.tick(0.1, &TickInput::default());

        // 10.1 s alive: 10 * 1.202 floors to 12
        assert_eq!(gm.state().crowd, STARTING_CROWD - 12);
        assert!(gm.drain_events().contains(&GameEvent::EnemyContact {
            id,
            outcome: ContactOutcome::Damaged { lost: 12 },
            crowd: STARTING_CROWD - 12
        }));
    }

    #[test]
    fn test_power_up_assist_needs_power_ups() {
        let mut features = FeatureFlags::none();
        features.comeback = true;
        let mut gm = manager_with(features);
        let drop = ComebackAssist::SpawnPowerUps { count: 3 };

        let mut events = Vec::new();
        gm.apply_assist(drop, &mut events);
        assert!(gm.state().obstacles.is_empty());
        assert!(gm.buffs().has_shield());

        gm.buffs.reset();
        gm.set_feature(Feature::PowerUps, true);
        gm.apply_assist(drop, &mut events);
        assert_eq!(gm.state().obstacles.len(), 3);
        assert!(!gm.buffs().has_shield());
    }

    #[test]
    fn test_pattern_skips_power_ups_when_disabled() {
        let mut features = FeatureFlags::none();
        features.patterns = true;
        let mut gm = manager_with(features);

        assert!(gm.activate_pattern(PatternKind::PowerUpTunnel));
        gm.drain_events();
        for _ in 0..50 {
            gm.tick(0.1, &TickInput::default());
        }
        let events = gm.drain_events();
        assert_eq!(spawned_enemies(&events), 4);
        assert!(!events.iter().any(|e| matches!(
            e,
            GameEvent::ObstacleSpawned {
                request: SpawnRequest {
                    entity: SpawnEntity::PowerUp,
                    ..
                },
                ..
            }
        )));
    }
}
