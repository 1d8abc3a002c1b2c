//! Global timed random events
//!
//! At most one event runs at a time. Between events the scheduler waits a
//! random 30-60s, then draws the next kind by rarity weight.

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;
use crate::sim::rng::GameRng;

/// Idle wait bounds (seconds)
pub const MIN_IDLE: f32 = 30.0;
pub const MAX_IDLE: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorldEventKind {
    GoldRush,
    EnemySwarm,
    GiantEnemies,
    SpeedRush,
    Calm,
}

/// Multipliers an event applies while live
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventEffects {
    pub gate_spawn: f32,
    pub enemy_spawn: f32,
    pub gate_value: f32,
    pub enemy_size: f32,
    pub speed: f32,
}

impl EventEffects {
    pub const NEUTRAL: EventEffects = EventEffects {
        gate_spawn: 1.0,
        enemy_spawn: 1.0,
        gate_value: 1.0,
        enemy_size: 1.0,
        speed: 1.0,
    };
}

impl Default for EventEffects {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    pub duration: f32,
    pub rarity: f32,
    pub effects: EventEffects,
}

impl WorldEventKind {
    pub const ALL: [WorldEventKind; 5] = [
        WorldEventKind::GoldRush,
        WorldEventKind::EnemySwarm,
        WorldEventKind::GiantEnemies,
        WorldEventKind::SpeedRush,
        WorldEventKind::Calm,
    ];

    /// Used when the weighted walk runs off the end of the table
    pub const FALLBACK: WorldEventKind = WorldEventKind::GoldRush;

    pub fn config(&self) -> EventConfig {
        let (duration, rarity, effects) = match self {
            WorldEventKind::GoldRush => (
                10.0,
                3.0,
                EventEffects {
                    gate_spawn: 2.0,
                    enemy_spawn: 0.5,
                    gate_value: 1.5,
                    ..EventEffects::NEUTRAL
                },
            ),
            WorldEventKind::EnemySwarm => (
                12.0,
                2.5,
                EventEffects {
                    gate_spawn: 0.7,
                    enemy_spawn: 2.0,
                    enemy_size: 0.8,
                    ..EventEffects::NEUTRAL
                },
            ),
            WorldEventKind::GiantEnemies => (
                10.0,
                1.5,
                EventEffects {
                    enemy_spawn: 0.7,
                    enemy_size: 1.8,
                    speed: 0.9,
                    ..EventEffects::NEUTRAL
                },
            ),
            WorldEventKind::SpeedRush => (
                8.0,
                2.0,
                EventEffects {
                    gate_spawn: 1.2,
                    enemy_spawn: 1.2,
                    gate_value: 1.25,
                    speed: 1.3,
                    ..EventEffects::NEUTRAL
                },
            ),
            WorldEventKind::Calm => (
                15.0,
                1.0,
                EventEffects {
                    enemy_spawn: 0.6,
                    speed: 0.85,
                    ..EventEffects::NEUTRAL
                },
            ),
        };
        EventConfig {
            duration,
            rarity,
            effects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub kind: WorldEventKind,
    pub remaining: f32,
    pub config: EventConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedEventScheduler {
    active: Option<ActiveEvent>,
    idle_elapsed: f32,
    idle_target: f32,
}

impl WeightedEventScheduler {
    pub fn new(rng: &mut GameRng) -> Self {
        Self {
            active: None,
            idle_elapsed: 0.0,
            idle_target: rng.range_f32(MIN_IDLE, MAX_IDLE),
        }
    }

    pub fn reset(&mut self, rng: &mut GameRng) {
        *self = Self::new(rng);
    }

    pub fn update(&mut self, dt: f32, rng: &mut GameRng, events: &mut Vec<GameEvent>) {
        let dt = dt.max(0.0);
        match self.active.as_mut() {
            Some(active) => {
                active.remaining -= dt;
                if active.remaining <= 0.0 {
                    let kind = active.kind;
                    self.active = None;
                    self.idle_elapsed = 0.0;
                    self.idle_target = rng.range_f32(MIN_IDLE, MAX_IDLE);
                    log::info!("World event {kind:?} ended, next in {:.0}s", self.idle_target);
                    events.push(GameEvent::WorldEventEnded { kind });
                }
            }
            None => {
                self.idle_elapsed += dt;
                if self.idle_elapsed >= self.idle_target {
                    let kind = Self::select(rng);
                    self.start(kind, events);
                }
            }
        }
    }

    /// Rarity-weighted draw over the full table
    pub fn select(rng: &mut GameRng) -> WorldEventKind {
        let table: Vec<(WorldEventKind, f32)> = WorldEventKind::ALL
            .iter()
            .map(|k| (*k, k.config().rarity))
            .collect();
        rng.weighted_pick(&table, WorldEventKind::FALLBACK)
    }

    /// Start `kind` right away, replacing nothing if one is already live
    pub fn start(&mut self, kind: WorldEventKind, events: &mut Vec<GameEvent>) -> bool {
        if self.active.is_some() {
            return false;
        }
        let config = kind.config();
        self.active = Some(ActiveEvent {
            kind,
            remaining: config.duration,
            config,
        });
        log::info!("World event {kind:?} started ({:.0}s)", config.duration);
        events.push(GameEvent::WorldEventStarted {
            kind,
            duration: config.duration,
        });
        true
    }

    pub fn active(&self) -> Option<&ActiveEvent> {
        self.active.as_ref()
    }

    pub fn effects(&self) -> EventEffects {
        self.active
            .map(|a| a.config.effects)
            .unwrap_or(EventEffects::NEUTRAL)
    }

    pub fn idle_target(&self) -> f32 {
        self.idle_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_target_in_range() {
        let mut rng = GameRng::new(3);
        for _ in 0..100 {
            let s = WeightedEventScheduler::new(&mut rng);
            assert!((MIN_IDLE..MAX_IDLE).contains(&s.idle_target()));
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut rng = GameRng::new(11);
        let mut s = WeightedEventScheduler::new(&mut rng);
        let mut events = Vec::new();

        s.update(s.idle_target() - 0.1, &mut rng, &mut events);
        assert!(s.active().is_none());
        assert_eq!(s.effects(), EventEffects::NEUTRAL);

        s.update(0.2, &mut rng, &mut events);
        let active = *s.active().expect("event should start");
        assert!(matches!(events[0], GameEvent::WorldEventStarted { .. }));
        assert_eq!(s.effects(), active.kind.config().effects);

        events.clear();
        s.update(active.remaining + 0.01, &mut rng, &mut events);
        assert!(s.active().is_none());
        assert_eq!(events, vec![GameEvent::WorldEventEnded { kind: active.kind }]);
    }

    #[test]
    fn test_only_one_active() {
        let mut rng = GameRng::new(5);
        let mut s = WeightedEventScheduler::new(&mut rng);
        let mut events = Vec::new();
        assert!(s.start(WorldEventKind::Calm, &mut events));
        assert!(!s.start(WorldEventKind::GoldRush, &mut events));
        assert_eq!(s.active().map(|a| a.kind), Some(WorldEventKind::Calm));
    }

    #[test]
    fn test_selection_frequencies() {
        let mut rng = GameRng::new(2024);
        let total: f32 = WorldEventKind::ALL.iter().map(|k| k.config().rarity).sum();
        let mut counts = [0u32; 5];
        let draws = 20_000;
        for _ in 0..draws {
            let kind = WeightedEventScheduler::select(&mut rng);
            let idx = WorldEventKind::ALL.iter().position(|k| *k == kind).unwrap();
            counts[idx] += 1;
        }
        for (kind, count) in WorldEventKind::ALL.iter().zip(counts) {
            let expected = kind.config().rarity / total;
            let observed = count as f32 / draws as f32;
            assert!(
                (observed - expected).abs() < 0.02,
                "{kind:?}: {observed} vs {expected}"
            );
        }
    }
}
