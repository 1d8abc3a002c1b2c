//! Near-miss bonus with streak amplification
//!
//! Distances are measured in lane widths along the lateral axis.

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;

/// Lateral distance under which an enemy counts as a hit, not a near miss
pub const COLLISION_RADIUS: f32 = 0.5;
/// Lateral distance up to which a passing enemy counts as a near miss
pub const NEAR_MISS_RADIUS: f32 = 1.2;
/// Seconds a streak stays open after a near miss
pub const STREAK_WINDOW: f32 = 2.0;
pub const BASE_BONUS: f32 = 2.0;
pub const MAX_STREAK_MULTIPLIER: f32 = 3.0;
/// Streak counts that announce themselves
pub const STREAK_MILESTONES: [u32; 3] = [3, 5, 10];

/// Bonus multiplier for a streak length
pub fn streak_multiplier(streak: u32) -> f32 {
    (1.0 + 0.5 * streak.saturating_sub(1) as f32).min(MAX_STREAK_MULTIPLIER)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NearMissTracker {
    streak: u32,
    window: f32,
    total: u32,
    best_streak: u32,
}

impl NearMissTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, dt: f32) {
        if self.streak == 0 {
            return;
        }
        self.window -= dt.max(0.0);
        if self.window <= 0.0 {
            self.streak = 0;
            self.window = 0.0;
        }
    }

    pub fn is_near_miss(lateral_distance: f32) -> bool {
        let d = lateral_distance.abs();
        d > COLLISION_RADIUS && d <= NEAR_MISS_RADIUS
    }

    /// Score a passing enemy. Returns the bonus when it was a near miss.
    pub fn check(&mut self, lateral_distance: f32, events: &mut Vec<GameEvent>) -> Option<u32> {
        if !Self::is_near_miss(lateral_distance) {
            return None;
        }
        self.streak += 1;
        self.window = STREAK_WINDOW;
        self.total += 1;
        self.best_streak = self.best_streak.max(self.streak);

        let bonus = (BASE_BONUS * streak_multiplier(self.streak)).floor() as u32;
        events.push(GameEvent::NearMiss {
            bonus,
            streak: self.streak,
        });
        if STREAK_MILESTONES.contains(&self.streak) {
            log::debug!("Near-miss streak {}", self.streak);
            events.push(GameEvent::NearMissStreak { streak: self.streak });
        }
        Some(bonus)
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }
}
