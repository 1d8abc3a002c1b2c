//! Comeback assistance for small crowds
//!
//! Danger is 1.0 at or below the critical crowd size and falls linearly to
//! 0.0 at the low threshold. It continuously sweetens gates and softens
//! enemies, and a sharp rise in danger can trigger a discrete assist.

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;
use crate::sim::rng::GameRng;

/// Crowd size at or below which danger is maxed
pub const CRITICAL_THRESHOLD: u32 = 10;
/// Crowd size at or above which danger is zero
pub const LOW_THRESHOLD: u32 = 30;
/// Minimum danger jump in one update to trigger an assist
pub const ASSIST_JUMP: f32 = 0.3;
/// Seconds between assists
pub const ASSIST_COOLDOWN: f32 = 10.0;
/// Danger at which the assist may spawn power-ups instead
pub const HIGH_DANGER: f32 = 0.8;
/// Power-ups dropped by the spawn assist
pub const ASSIST_POWER_UPS: u32 = 3;
/// Shield length granted by an assist
pub const ASSIST_SHIELD_DURATION: f32 = 5.0;
/// Largest crowd that still qualifies for the second chance
pub const SECOND_CHANCE_MAX_CROWD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ComebackAssist {
    SpawnPowerUps { count: u32 },
    GrantShield { duration: f32 },
}

/// Danger for a crowd size, clamped to [0, 1]
pub fn danger_for_crowd(size: u32) -> f32 {
    if size <= CRITICAL_THRESHOLD {
        1.0
    } else if size >= LOW_THRESHOLD {
        0.0
    } else {
        let span = (LOW_THRESHOLD - CRITICAL_THRESHOLD) as f32;
        ((LOW_THRESHOLD - size) as f32 / span).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComebackAssistant {
    danger_level: f32,
    second_chance_used: bool,
    since_last_assist: f32,
}

impl Default for ComebackAssistant {
    fn default() -> Self {
        Self::new()
    }
}

impl ComebackAssistant {
    pub fn new() -> Self {
        Self {
            danger_level: 0.0,
            second_chance_used: false,
            // First assist is available straight away
            since_last_assist: ASSIST_COOLDOWN,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn update(&mut self, dt: f32) {
        self.since_last_assist += dt.max(0.0);
    }

    /// Recompute danger; returns an assist when one triggers
    pub fn update_crowd_size(
        &mut self,
        size: u32,
        rng: &mut GameRng,
        events: &mut Vec<GameEvent>,
    ) -> Option<ComebackAssist> {
        let previous = self.danger_level;
        self.danger_level = danger_for_crowd(size);

        let jump = self.danger_level - previous;
        if jump <= ASSIST_JUMP || self.since_last_assist < ASSIST_COOLDOWN {
            return None;
        }

        let shield = ComebackAssist::GrantShield {
            duration: ASSIST_SHIELD_DURATION,
        };
        let assist = if self.danger_level >= HIGH_DANGER && rng.chance(0.5) {
            ComebackAssist::SpawnPowerUps {
                count: ASSIST_POWER_UPS,
            }
        } else {
            shield
        };
        self.since_last_assist = 0.0;
        log::info!(
            "Comeback assist {assist:?} (danger {:.2}, crowd {size})",
            self.danger_level
        );
        events.push(GameEvent::ComebackTriggered {
            assist,
            danger: self.danger_level,
        });
        Some(assist)
    }

    /// One-time rescue for a crowd of 1..=5. Returns true exactly once per
    /// session; the caller cancels the pending game over.
    pub fn check_second_chance(&mut self, size: u32, events: &mut Vec<GameEvent>) -> bool {
        if self.second_chance_used || size == 0 || size > SECOND_CHANCE_MAX_CROWD {
            return false;
        }
        self.second_chance_used = true;
        log::info!("Second chance used at crowd {size}");
        events.push(GameEvent::SecondChanceUsed);
        true
    }

    pub fn danger_level(&self) -> f32 {
        self.danger_level
    }

    pub fn gate_value_multiplier(&self) -> f32 {
        1.0 + 0.5 * self.danger_level
    }

    pub fn enemy_strength_multiplier(&self) -> f32 {
        1.0 - 0.3 * self.danger_level
    }

    pub fn second_chance_used(&self) -> bool {
        self.second_chance_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_danger_points() {
        assert_eq!(danger_for_crowd(0), 1.0);
        assert_eq!(danger_for_crowd(10), 1.0);
        assert_eq!(danger_for_crowd(20), 0.5);
        assert_eq!(danger_for_crowd(30), 0.0);
        assert_eq!(danger_for_crowd(100), 0.0);
    }

    #[test]
    fn test_multipliers_follow_danger() {
        let mut rng = GameRng::new(1);
        let mut events = Vec::new();
        let mut c = ComebackAssistant::new();
        c.update_crowd_size(20, &mut rng, &mut events);
        assert!((c.gate_value_multiplier() - 1.25).abs() < 1e-6);
        assert!((c.enemy_strength_multiplier() - 0.85).abs() < 1e-6);

        c.update_crowd_size(22, &mut rng, &mut events);
        assert!((c.gate_value_multiplier() - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_assist_needs_jump_and_cooldown() {
        let mut rng = GameRng::new(4);
        let mut events = Vec::new();
        let mut c = ComebackAssistant::new();

        // Gradual decline: no single jump above 0.3
        for size in (20..=40).rev() {
            assert!(c.update_crowd_size(size, &mut rng, &mut events).is_none());
        }

        // Sharp drop from 0.5 to 1.0 danger
        let assist = c.update_crowd_size(8, &mut rng, &mut events);
        assert!(assist.is_some());
        assert_eq!(events.len(), 1);

        // Back up then down again inside the cooldown: nothing
        c.update_crowd_size(40, &mut rng, &mut events);
        c.update(5.0);
        assert!(c.update_crowd_size(5, &mut rng, &mut events).is_none());

        c.update_crowd_size(40, &mut rng, &mut events);
        c.update(5.0);
        assert!(c.update_crowd_size(5, &mut rng, &mut events).is_some());
    }

    #[test]
    fn test_moderate_danger_always_shields() {
        let mut rng = GameRng::new(4);
        let mut events = Vec::new();
        for _ in 0..50 {
            let mut c = ComebackAssistant::new();
            c.update_crowd_size(40, &mut rng, &mut events);
            // 40 -> 16: danger 0.7, below the high-danger band
            let assist = c.update_crowd_size(16, &mut rng, &mut events);
            assert_eq!(
                assist,
                Some(ComebackAssist::GrantShield {
                    duration: ASSIST_SHIELD_DURATION
                })
            );
        }
    }

    #[test]
    fn test_high_danger_uses_both_assists() {
        let mut rng = GameRng::new(99);
        let mut events = Vec::new();
        let mut spawned = 0;
        let mut shielded = 0;
        for _ in 0..200 {
            let mut c = ComebackAssistant::new();
            c.update_crowd_size(40, &mut rng, &mut events);
            match c.update_crowd_size(3, &mut rng, &mut events) {
                Some(ComebackAssist::SpawnPowerUps { count }) => {
                    assert_eq!(count, ASSIST_POWER_UPS);
                    spawned += 1;
                }
                Some(ComebackAssist::GrantShield { .. }) => shielded += 1,
                None => panic!("assist expected"),
            }
        }
        assert!(spawned > 50 && shielded > 50);
    }

    #[test]
    fn test_second_chance_once() {
        let mut events = Vec::new();
        let mut c = ComebackAssistant::new();
        assert!(!c.check_second_chance(0, &mut events));
        assert!(!c.check_second_chance(6, &mut events));
        assert!(c.check_second_chance(5, &mut events));
        assert!(!c.check_second_chance(3, &mut events));
        assert_eq!(events, vec![GameEvent::SecondChanceUsed]);
        assert!(c.second_chance_used());

        c.reset();
        assert!(c.check_second_chance(1, &mut events));
    }

    proptest! {
        #[test]
        fn prop_danger_monotonic_and_clamped(a in 0u32..200, b in 0u32..200) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(danger_for_crowd(lo) >= danger_for_crowd(hi));
            prop_assert!((0.0..=1.0).contains(&danger_for_crowd(a)));
        }
    }
}
