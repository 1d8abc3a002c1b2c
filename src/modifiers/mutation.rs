//! Special traits rolled onto enemy crowds at spawn

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;
use crate::sim::rng::GameRng;

/// Default chance that a spawned enemy mutates
pub const DEFAULT_MUTATION_CHANCE: f32 = 0.15;
/// Regeneration growth per [`REGEN_STEP_SECONDS`]
pub const REGEN_GROWTH: f32 = 0.1;
pub const REGEN_STEP_SECONDS: f32 = 5.0;
pub const REGEN_CAP: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    None,
    Armored,
    Swift,
    Giant,
    Regenerating,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    pub size: f32,
    pub speed: f32,
    pub strength: f32,
    /// Relative weight among mutated spawns
    pub spawn_weight: f32,
}

impl MutationKind {
    /// Kinds that can be rolled
    pub const ROLLABLE: [MutationKind; 4] = [
        MutationKind::Armored,
        MutationKind::Swift,
        MutationKind::Giant,
        MutationKind::Regenerating,
    ];

    pub const FALLBACK: MutationKind = MutationKind::Armored;

    pub fn config(&self) -> MutationConfig {
        let (size, speed, strength, spawn_weight) = match self {
            MutationKind::None => (1.0, 1.0, 1.0, 0.0),
            MutationKind::Armored => (1.2, 0.8, 1.5, 3.0),
            MutationKind::Swift => (0.9, 1.6, 0.9, 3.0),
            MutationKind::Giant => (2.0, 0.7, 2.0, 1.5),
            MutationKind::Regenerating => (1.0, 1.0, 1.0, 2.0),
        };
        MutationConfig {
            size,
            speed,
            strength,
            spawn_weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: MutationKind,
    pub size: f32,
    pub speed: f32,
    pub strength: f32,
    /// Engine clock at spawn
    pub spawned_at: f32,
}

impl Mutation {
    pub fn none(now: f32) -> Self {
        Self::of(MutationKind::None, now)
    }

    pub fn of(kind: MutationKind, now: f32) -> Self {
        let config = kind.config();
        Self {
            kind,
            size: config.size,
            speed: config.speed,
            strength: config.strength,
            spawned_at: now,
        }
    }

    pub fn is_mutated(&self) -> bool {
        self.kind != MutationKind::None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationRollEngine {
    chance: f32,
    clock: f32,
    counts: [u32; 4],
}

impl MutationRollEngine {
    pub fn new(chance: f32) -> Self {
        Self {
            chance: chance.clamp(0.0, 1.0),
            clock: 0.0,
            counts: [0; 4],
        }
    }

    pub fn reset(&mut self) {
        self.clock = 0.0;
        self.counts = [0; 4];
    }

    pub fn set_chance(&mut self, chance: f32) {
        self.chance = chance.clamp(0.0, 1.0);
    }

    pub fn chance(&self) -> f32 {
        self.chance
    }

    pub fn update(&mut self, dt: f32) {
        self.clock += dt.max(0.0);
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Roll for a freshly spawned enemy
    pub fn roll(&mut self, rng: &mut GameRng, events: &mut Vec<GameEvent>) -> Mutation {
        if !rng.chance(self.chance) {
            return Mutation::none(self.clock);
        }
        let kind = Self::select(rng);
        if let Some(idx) = MutationKind::ROLLABLE.iter().position(|k| *k == kind) {
            self.counts[idx] += 1;
        }
        log::debug!("Enemy mutated: {kind:?}");
        events.push(GameEvent::MutationSpawned { kind });
        Mutation::of(kind, self.clock)
    }

    /// Weighted walk over the rollable kinds
    pub fn select(rng: &mut GameRng) -> MutationKind {
        let table: Vec<(MutationKind, f32)> = MutationKind::ROLLABLE
            .iter()
            .map(|k| (*k, k.config().spawn_weight))
            .collect();
        rng.weighted_pick(&table, MutationKind::FALLBACK)
    }

    /// Strength growth for regenerating enemies: +10% per 5s alive, capped 2x
    pub fn regeneration_multiplier(&self, mutation: &Mutation) -> f32 {
        if mutation.kind != MutationKind::Regenerating {
            return 1.0;
        }
        let alive = (self.clock - mutation.spawned_at).max(0.0);
        (1.0 + REGEN_GROWTH * alive / REGEN_STEP_SECONDS).min(REGEN_CAP)
    }

    pub fn count(&self, kind: MutationKind) -> u32 {
        MutationKind::ROLLABLE
            .iter()
            .position(|k| *k == kind)
            .map(|idx| self.counts[idx])
            .unwrap_or(0)
    }
}
