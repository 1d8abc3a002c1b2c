//! Temporary per-lane traits ("lane personalities")

use serde::{Deserialize, Serialize};

use crate::consts::LANE_COUNT;
use crate::sim::events::GameEvent;
use crate::sim::rng::GameRng;

/// Seconds between assignment attempts
pub const ASSIGN_INTERVAL: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneTraitKind {
    Neutral,
    Golden,
    Hostile,
    Generous,
    Fortified,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneTraitConfig {
    pub gate_spawn: f32,
    pub enemy_spawn: f32,
    pub gate_value: f32,
    pub enemy_strength: f32,
    pub duration: f32,
}

impl LaneTraitConfig {
    pub const NEUTRAL: LaneTraitConfig = LaneTraitConfig {
        gate_spawn: 1.0,
        enemy_spawn: 1.0,
        gate_value: 1.0,
        enemy_strength: 1.0,
        duration: 0.0,
    };
}

impl LaneTraitKind {
    /// Traits that can be handed out
    pub const ASSIGNABLE: [LaneTraitKind; 5] = [
        LaneTraitKind::Golden,
        LaneTraitKind::Hostile,
        LaneTraitKind::Generous,
        LaneTraitKind::Fortified,
        LaneTraitKind::Quiet,
    ];

    pub fn config(&self) -> LaneTraitConfig {
        let n = LaneTraitConfig::NEUTRAL;
        match self {
            LaneTraitKind::Neutral => n,
            LaneTraitKind::Golden => LaneTraitConfig {
                gate_spawn: 1.3,
                gate_value: 1.5,
                duration: 15.0,
                ..n
            },
            LaneTraitKind::Hostile => LaneTraitConfig {
                enemy_spawn: 1.5,
                enemy_strength: 1.2,
                duration: 12.0,
                ..n
            },
            LaneTraitKind::Generous => LaneTraitConfig {
                gate_spawn: 1.5,
                enemy_spawn: 0.8,
                duration: 15.0,
                ..n
            },
            LaneTraitKind::Fortified => LaneTraitConfig {
                enemy_spawn: 0.8,
                gate_value: 1.3,
                enemy_strength: 1.5,
                duration: 18.0,
                ..n
            },
            LaneTraitKind::Quiet => LaneTraitConfig {
                gate_spawn: 0.8,
                enemy_spawn: 0.5,
                duration: 10.0,
                ..n
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneTraitAssignment {
    pub kind: LaneTraitKind,
    pub remaining: f32,
    pub config: LaneTraitConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaneTraitAssigner {
    lanes: [Option<LaneTraitAssignment>; LANE_COUNT],
    timer: f32,
}

impl LaneTraitAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, dt: f32, rng: &mut GameRng, events: &mut Vec<GameEvent>) {
        let dt = dt.max(0.0);
        for (lane, slot) in self.lanes.iter_mut().enumerate() {
            if let Some(assignment) = slot {
                assignment.remaining -= dt;
                if assignment.remaining <= 0.0 {
                    let kind = assignment.kind;
                    *slot = None;
                    log::debug!("Lane {lane} trait {kind:?} expired");
                    events.push(GameEvent::LaneTraitExpired { lane, kind });
                }
            }
        }

        self.timer += dt;
        while self.timer >= ASSIGN_INTERVAL {
            self.timer -= ASSIGN_INTERVAL;
            self.assign_random(rng, events);
        }
    }

    /// Give one uncovered lane a random trait; no-op when all lanes are taken
    fn assign_random(&mut self, rng: &mut GameRng, events: &mut Vec<GameEvent>) {
        let free: Vec<usize> = (0..LANE_COUNT).filter(|l| self.lanes[*l].is_none()).collect();
        if free.is_empty() {
            return;
        }
        let lane = free[rng.index(free.len())];
        let kind = LaneTraitKind::ASSIGNABLE[rng.index(LaneTraitKind::ASSIGNABLE.len())];
        self.assign(lane, kind, events);
    }

    /// Put `kind` on `lane`, replacing nothing if the lane is covered
    pub fn assign(&mut self, lane: usize, kind: LaneTraitKind, events: &mut Vec<GameEvent>) -> bool {
        if kind == LaneTraitKind::Neutral {
            return false;
        }
        let Some(slot) = self.lanes.get_mut(lane) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        let config = kind.config();
        *slot = Some(LaneTraitAssignment {
            kind,
            remaining: config.duration,
            config,
        });
        log::info!("Lane {lane} is now {kind:?} for {:.0}s", config.duration);
        events.push(GameEvent::LaneTraitAssigned {
            lane,
            kind,
            duration: config.duration,
        });
        true
    }

    pub fn trait_of(&self, lane: usize) -> LaneTraitKind {
        self.assignment(lane)
            .map(|a| a.kind)
            .unwrap_or(LaneTraitKind::Neutral)
    }

    pub fn assignment(&self, lane: usize) -> Option<&LaneTraitAssignment> {
        self.lanes.get(lane).and_then(|slot| slot.as_ref())
    }

    /// Multipliers for `lane` (neutral when uncovered)
    pub fn config(&self, lane: usize) -> LaneTraitConfig {
        self.assignment(lane)
            .map(|a| a.config)
            .unwrap_or(LaneTraitConfig::NEUTRAL)
    }

    pub fn covered_lanes(&self) -> usize {
        self.lanes.iter().filter(|l| l.is_some()).count()
    }
}
