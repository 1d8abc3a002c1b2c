//! Consecutive-success streak tiers and the no-damage auto shield

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;

/// Seconds without damage before the free shield
pub const AUTO_SHIELD_TIME: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MomentumTier {
    #[default]
    None,
    Hot,
    Blazing,
    Unstoppable,
}

impl MomentumTier {
    pub fn for_streak(streak: u32) -> Self {
        match streak {
            8.. => MomentumTier::Unstoppable,
            5.. => MomentumTier::Blazing,
            3.. => MomentumTier::Hot,
            _ => MomentumTier::None,
        }
    }

    /// Gate value multiplier for this tier
    pub fn multiplier(&self) -> f32 {
        match self {
            MomentumTier::None => 1.0,
            MomentumTier::Hot => 1.25,
            MomentumTier::Blazing => 1.5,
            MomentumTier::Unstoppable => 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MomentumTracker {
    streak: u32,
    tier: MomentumTier,
    no_damage_time: f32,
    shield_granted: bool,
}

impl MomentumTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn on_gate_collected(&mut self, events: &mut Vec<GameEvent>) {
        self.streak += 1;
        self.refresh_tier(events);
    }

    /// Breaks the streak and restarts the no-damage clock
    pub fn on_enemy_hit(&mut self, events: &mut Vec<GameEvent>) {
        self.streak = 0;
        self.no_damage_time = 0.0;
        self.shield_granted = false;
        self.refresh_tier(events);
    }

    /// Returns true on the tick the auto shield is earned
    pub fn update(&mut self, dt: f32, events: &mut Vec<GameEvent>) -> bool {
        self.no_damage_time += dt.max(0.0);
        if self.shield_granted || self.no_damage_time < AUTO_SHIELD_TIME {
            return false;
        }
        self.shield_granted = true;
        log::info!("Momentum: {AUTO_SHIELD_TIME}s without damage, auto shield");
        events.push(GameEvent::AutoShield);
        true
    }

    fn refresh_tier(&mut self, events: &mut Vec<GameEvent>) {
        let tier = MomentumTier::for_streak(self.streak);
        if tier != self.tier {
            self.tier = tier;
            log::debug!("Momentum tier {tier:?} at streak {}", self.streak);
            events.push(GameEvent::MomentumTierChanged {
                tier,
                streak: self.streak,
            });
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn tier(&self) -> MomentumTier {
        self.tier
    }

    pub fn multiplier(&self) -> f32 {
        self.tier.multiplier()
    }

    pub fn no_damage_time(&self) -> f32 {
        self.no_damage_time
    }
}
