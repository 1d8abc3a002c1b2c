//! Distance-driven difficulty curve
//!
//! Level 1 at the start line, +1 every 100 distance units, capped at 10.
//! Every derived value is a linear function of `t = (level - 1) / 9`.

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;

/// Distance per level
pub const DISTANCE_PER_LEVEL: f32 = 100.0;
/// Highest reachable level
pub const MAX_LEVEL: u32 = 10;

/// Base obstacle spawn interval at level 1 (seconds)
const BASE_OBSTACLE_INTERVAL: f32 = 2.5;
/// Fraction of the base interval removed at max level
const INTERVAL_REDUCTION: f32 = 0.52;

/// Level for a given distance: `min(floor(d / 100) + 1, 10)`
pub fn level_for_distance(distance: f32) -> u32 {
    let distance = distance.max(0.0);
    let level = (distance / DISTANCE_PER_LEVEL).floor() as u32 + 1;
    level.min(MAX_LEVEL)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionDifficulty {
    level: u32,
    distance: f32,
    elapsed: f32,
}

impl Default for ProgressionDifficulty {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressionDifficulty {
    pub fn new() -> Self {
        Self {
            level: 1,
            distance: 0.0,
            elapsed: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance session clock (the curve itself is distance-driven)
    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Feed the run distance. Emits one `LevelUp` per level gained; the level
    /// never drops within a session.
    pub fn update_distance(&mut self, distance: f32, events: &mut Vec<GameEvent>) {
        self.distance = self.distance.max(distance);
        let target = level_for_distance(self.distance);
        while self.level < target {
            self.level += 1;
            log::info!("Level up: {} (distance {:.0})", self.level, self.distance);
            events.push(GameEvent::LevelUp { level: self.level });
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Normalized progress through the curve (0 at level 1, 1 at max)
    fn t(&self) -> f32 {
        (self.level - 1) as f32 / (MAX_LEVEL - 1) as f32
    }

    /// Seconds between random obstacle rows
    pub fn obstacle_interval(&self) -> f32 {
        BASE_OBSTACLE_INTERVAL * (1.0 - INTERVAL_REDUCTION * self.t())
    }

    pub fn enemy_count_multiplier(&self) -> f32 {
        1.0 + self.t()
    }

    pub fn speed_multiplier(&self) -> f32 {
        1.0 + 0.3 * self.t()
    }

    pub fn power_up_chance(&self) -> f32 {
        0.15 - 0.05 * self.t()
    }

    pub fn enemy_percentage(&self) -> f32 {
        0.25 + 0.15 * self.t()
    }

    /// Legacy multiply-gate share (only weighted when multiply gates are enabled)
    pub fn multiply_gate_percentage(&self) -> f32 {
        0.45 - 0.10 * self.t()
    }

    pub fn addition_gate_percentage(&self) -> f32 {
        1.0 - self.enemy_percentage() - self.multiply_gate_percentage() - self.power_up_chance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_examples() {
        assert_eq!(level_for_distance(0.0), 1);
        assert_eq!(level_for_distance(99.9), 1);
        assert_eq!(level_for_distance(100.0), 2);
        assert_eq!(level_for_distance(250.0), 3);
        assert_eq!(level_for_distance(999.0), 10);
        assert_eq!(level_for_distance(50_000.0), 10);
    }

    #[test]
    fn test_level_up_fires_once_per_increment() {
        let mut p = ProgressionDifficulty::new();
        let mut events = Vec::new();

        p.update_distance(50.0, &mut events);
        assert!(events.is_empty());

        // Jump two levels in one call
        p.update_distance(250.0, &mut events);
        assert_eq!(
            events,
            vec![GameEvent::LevelUp { level: 2 }, GameEvent::LevelUp { level: 3 }]
        );

        // Same level again: nothing
        events.clear();
        p.update_distance(260.0, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_level_never_decreases() {
        let mut p = ProgressionDifficulty::new();
        let mut events = Vec::new();
        p.update_distance(450.0, &mut events);
        p.update_distance(10.0, &mut events);
        assert_eq!(p.level(), 5);
    }

    #[test]
    fn test_curve_endpoints() {
        let mut p = ProgressionDifficulty::new();
        assert!((p.obstacle_interval() - 2.5).abs() < 1e-6);
        assert!((p.speed_multiplier() - 1.0).abs() < 1e-6);
        assert!((p.power_up_chance() - 0.15).abs() < 1e-6);
        assert!((p.addition_gate_percentage() - 0.15).abs() < 1e-5);

        let mut events = Vec::new();
        p.update_distance(1_000.0, &mut events);
        assert_eq!(p.level(), 10);
        assert!((p.obstacle_interval() - 1.2).abs() < 1e-5);
        assert!((p.enemy_count_multiplier() - 2.0).abs() < 1e-6);
        assert!((p.speed_multiplier() - 1.3).abs() < 1e-6);
        assert!((p.power_up_chance() - 0.10).abs() < 1e-6);
        assert!((p.enemy_percentage() - 0.40).abs() < 1e-6);
        assert!((p.multiply_gate_percentage() - 0.35).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_level_matches_formula_and_is_monotonic(a in 0.0f32..5_000.0, b in 0.0f32..5_000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_distance(lo) <= level_for_distance(hi));
            let expected = ((a / 100.0).floor() as u32 + 1).min(10);
            prop_assert_eq!(level_for_distance(a), expected);
            prop_assert!((1..=10).contains(&level_for_distance(a)));
        }
    }
}
