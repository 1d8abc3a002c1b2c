//! Typed gameplay notifications
//!
//! Subsystems push [`GameEvent`]s into a plain `Vec` handed to them by the
//! caller. The game manager collects them on its [`EventBus`], which forwards
//! each one to registered observers and keeps it queued for `drain()`.

use serde::{Deserialize, Serialize};

use super::state::{ObstacleKind, SpawnRequest};
use crate::modifiers::{
    BuffKind, ComebackAssist, CritTier, LaneTraitKind, MomentumTier, MutationKind, PatternKind,
    Trend, WorldEventKind,
};

/// Everything the engine can tell a presentation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelUp { level: u32 },
    MomentumTierChanged { tier: MomentumTier, streak: u32 },
    AutoShield,
    ComboChanged { count: u32, multiplier: f32 },
    ComboExpired { count: u32 },
    ComboNewMax { max: u32 },
    PowerUpActivated { kind: BuffKind, duration: f32 },
    PowerUpExpired { kind: BuffKind },
    WorldEventStarted { kind: WorldEventKind, duration: f32 },
    WorldEventEnded { kind: WorldEventKind },
    PatternStarted { kind: PatternKind },
    PatternEnded { kind: PatternKind },
    LaneTraitAssigned { lane: usize, kind: LaneTraitKind, duration: f32 },
    LaneTraitExpired { lane: usize, kind: LaneTraitKind },
    NearMiss { bonus: u32, streak: u32 },
    NearMissStreak { streak: u32 },
    CriticalHit { tier: CritTier, base: u32, value: u32 },
    MutationSpawned { kind: MutationKind },
    ComebackTriggered { assist: ComebackAssist, danger: f32 },
    SecondChanceUsed,
    DifficultyAdjusted { trend: Trend, average: f32 },
    ObstacleSpawned { id: u32, request: SpawnRequest },
    GateCollected { reward: u32, crowd: u32 },
    EnemyContact { id: u32, outcome: ContactOutcome, crowd: u32 },
    PowerUpCollected { kind: BuffKind },
    ObstacleMissed { id: u32, kind: ObstacleKind },
    GameOver { distance: f32, score: u64 },
}

/// How an enemy collision was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactOutcome {
    /// Ghost buff: passed straight through
    PhasedThrough,
    /// Shield absorbed the hit and was consumed
    Shielded,
    /// Vampire buff: part of the enemy joined the crowd
    Drained { gained: u32 },
    /// Default path: crowd lost members
    Damaged { lost: u32 },
    /// Lethal hit cancelled by the one-time second chance
    Rescued,
}

type Observer = Box<dyn FnMut(&GameEvent)>;

/// Owned notification channel: synchronous observers plus a drainable queue
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Observer>,
    queue: Vec<GameEvent>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .field("queue", &self.queue)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fire-and-forget observer. Observers see `&GameEvent` only
    /// and so cannot call back into the engine.
    pub fn subscribe(&mut self, observer: impl FnMut(&GameEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Deliver a batch in order
    pub fn publish_all(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn publish(&mut self, event: GameEvent) {
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
        self.queue.push(event);
    }

    /// Take everything published since the last drain
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> &[GameEvent] {
        &self.queue
    }

    /// Drop queued events (observers stay registered)
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
