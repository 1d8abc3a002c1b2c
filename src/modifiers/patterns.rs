//! Pre-authored spawn sequences
//!
//! A pattern is a list of timed spawn instructions. Only one runs at a time;
//! each instruction fires once when its own countdown reaches zero, and the
//! pattern ends when its total duration runs out whether or not everything
//! fired. A short cooldown afterwards keeps random spawning suppressed so the
//! lanes can clear.

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;
use crate::sim::rng::GameRng;
use crate::sim::state::{SpawnEntity, SpawnRequest};

/// Idle seconds between patterns
pub const PATTERN_INTERVAL: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Zigzag,
    GateStairs,
    EnemyWall,
    Gauntlet,
    PowerUpTunnel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternInstruction {
    pub lane: usize,
    pub entity: SpawnEntity,
    pub value: Option<u32>,
    /// Seconds after activation
    pub delay: f32,
}

impl PatternInstruction {
    const fn new(lane: usize, entity: SpawnEntity, value: Option<u32>, delay: f32) -> Self {
        Self {
            lane,
            entity,
            value,
            delay,
        }
    }

    pub fn to_request(&self) -> SpawnRequest {
        SpawnRequest {
            lane: self.lane,
            entity: self.entity,
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDefinition {
    pub instructions: Vec<PatternInstruction>,
    pub duration: f32,
    pub cooldown: f32,
}

impl PatternKind {
    pub const ALL: [PatternKind; 5] = [
        PatternKind::Zigzag,
        PatternKind::GateStairs,
        PatternKind::EnemyWall,
        PatternKind::Gauntlet,
        PatternKind::PowerUpTunnel,
    ];

    pub fn definition(&self) -> PatternDefinition {
        use SpawnEntity::{AdditionGate as Gate, Enemy, PowerUp};
        type I = PatternInstruction;

        let (instructions, duration, cooldown) = match self {
            PatternKind::Zigzag => (
                vec![
                    I::new(0, Enemy, Some(6), 0.0),
                    I::new(1, Enemy, Some(6), 0.8),
                    I::new(2, Enemy, Some(6), 1.6),
                    I::new(1, Enemy, Some(6), 2.4),
                    I::new(0, Enemy, Some(6), 3.2),
                    I::new(2, Gate, Some(10), 4.0),
                ],
                6.0,
                3.0,
            ),
            PatternKind::GateStairs => (
                vec![
                    I::new(0, Gate, Some(5), 0.0),
                    I::new(1, Gate, Some(10), 1.0),
                    I::new(2, Gate, Some(15), 2.0),
                    I::new(1, Enemy, Some(12), 3.0),
                ],
                5.0,
                2.0,
            ),
            PatternKind::EnemyWall => (
                vec![
                    I::new(0, Enemy, Some(10), 0.0),
                    I::new(1, Gate, Some(20), 0.0),
                    I::new(2, Enemy, Some(10), 0.0),
                    I::new(0, Enemy, Some(12), 2.0),
                    I::new(1, Enemy, Some(12), 2.0),
                    I::new(2, Gate, Some(25), 2.0),
                ],
                4.0,
                4.0,
            ),
            PatternKind::Gauntlet => (
                vec![
                    I::new(1, Enemy, Some(8), 0.0),
                    I::new(0, Enemy, Some(8), 1.2),
                    I::new(2, Enemy, Some(8), 1.2),
                    I::new(1, Enemy, Some(10), 2.4),
                    I::new(0, Enemy, Some(10), 3.6),
                    I::new(2, Enemy, Some(10), 3.6),
                    I::new(1, PowerUp, None, 5.0),
                ],
                8.0,
                5.0,
            ),
            PatternKind::PowerUpTunnel => (
                vec![
                    I::new(0, Enemy, Some(5), 0.0),
                    I::new(2, Enemy, Some(5), 0.0),
                    I::new(1, PowerUp, None, 1.5),
                    I::new(0, Enemy, Some(7), 3.0),
                    I::new(2, Enemy, Some(7), 3.0),
                ],
                5.0,
                3.0,
            ),
        };
        PatternDefinition {
            instructions,
            duration,
            cooldown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct QueuedInstruction {
    time_left: f32,
    instruction: PatternInstruction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivePattern {
    pub kind: PatternKind,
    pub remaining: f32,
    cooldown: f32,
    queue: Vec<QueuedInstruction>,
}

impl ActivePattern {
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternScheduler {
    active: Option<ActivePattern>,
    last_pattern: Option<PatternKind>,
    idle_elapsed: f32,
    cooldown_left: f32,
}

impl PatternScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance timers; due instructions are appended to `spawns` in delay order
    pub fn update(
        &mut self,
        dt: f32,
        rng: &mut GameRng,
        events: &mut Vec<GameEvent>,
        spawns: &mut Vec<SpawnRequest>,
    ) {
        let dt = dt.max(0.0);
        self.cooldown_left = (self.cooldown_left - dt).max(0.0);

        if self.active.is_none() {
            self.idle_elapsed += dt;
            if self.idle_elapsed >= PATTERN_INTERVAL {
                let kind = self.pick(rng);
                self.activate(kind, events);
            }
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };

        for queued in active.queue.iter_mut() {
            queued.time_left -= dt;
        }
        // Queue is sorted by delay and every timer moved by the same dt, so
        // the due entries form a prefix.
        let due = active.queue.iter().take_while(|q| q.time_left <= 0.0).count();
        spawns.extend(active.queue.drain(..due).map(|q| q.instruction.to_request()));

        active.remaining -= dt;
        if active.remaining <= 0.0 {
            let kind = active.kind;
            let dropped = active.queue.len();
            self.cooldown_left = active.cooldown;
            self.active = None;
            self.idle_elapsed = 0.0;
            log::info!("Pattern {kind:?} ended ({dropped} unfired instructions dropped)");
            events.push(GameEvent::PatternEnded { kind });
        }
    }

    /// Random kind, never the one that just ran
    fn pick(&self, rng: &mut GameRng) -> PatternKind {
        let choices: Vec<PatternKind> = PatternKind::ALL
            .iter()
            .copied()
            .filter(|k| Some(*k) != self.last_pattern)
            .collect();
        choices[rng.index(choices.len())]
    }

    /// Start a pattern now. Refused while another one is running.
    pub fn activate(&mut self, kind: PatternKind, events: &mut Vec<GameEvent>) -> bool {
        if self.active.is_some() {
            return false;
        }
        let def = kind.definition();
        let mut queue: Vec<QueuedInstruction> = def
            .instructions
            .into_iter()
            .filter(|i| {
                let fits = i.delay <= def.duration;
                if !fits {
                    log::warn!("Pattern {kind:?}: instruction at {}s is past the end", i.delay);
                }
                fits
            })
            .map(|instruction| QueuedInstruction {
                time_left: instruction.delay,
                instruction,
            })
            .collect();
        queue.sort_by(|a, b| a.time_left.total_cmp(&b.time_left));

        self.active = Some(ActivePattern {
            kind,
            remaining: def.duration,
            cooldown: def.cooldown,
            queue,
        });
        self.last_pattern = Some(kind);
        self.idle_elapsed = 0.0;
        log::info!("Pattern {kind:?} started");
        events.push(GameEvent::PatternStarted { kind });
        true
    }

    pub fn active(&self) -> Option<&ActivePattern> {
        self.active.as_ref()
    }

    pub fn last_pattern(&self) -> Option<PatternKind> {
        self.last_pattern
    }

    /// Random spawning stays off while a pattern runs or cools down
    pub fn suppresses_random_spawns(&self) -> bool {
        self.active.is_some() || self.cooldown_left > 0.0
    }
}
