//! Critical-hit rolls on reward collection

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;
use crate::sim::rng::GameRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CritTier {
    Normal,
    Mega,
    Ultra,
}

impl CritTier {
    /// Rarest first
    pub const BY_RARITY: [CritTier; 3] = [CritTier::Ultra, CritTier::Mega, CritTier::Normal];

    /// Base probability before luck scaling
    pub fn base_chance(&self) -> f32 {
        match self {
            CritTier::Ultra => 0.005,
            CritTier::Mega => 0.02,
            CritTier::Normal => 0.10,
        }
    }

    pub fn multiplier(&self) -> f32 {
        match self {
            CritTier::Normal => 2.0,
            CritTier::Mega => 5.0,
            CritTier::Ultra => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalHit {
    pub tier: CritTier,
    pub base: u32,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritStats {
    pub normal: u32,
    pub mega: u32,
    pub ultra: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalRollEngine {
    luck_multiplier: f32,
    stats: CritStats,
}

impl CriticalRollEngine {
    pub fn new(luck_multiplier: f32) -> Self {
        Self {
            luck_multiplier: luck_multiplier.max(0.0),
            stats: CritStats::default(),
        }
    }

    pub fn reset(&mut self) {
        self.stats = CritStats::default();
    }

    pub fn set_luck_multiplier(&mut self, luck: f32) {
        self.luck_multiplier = luck.max(0.0);
    }

    pub fn luck_multiplier(&self) -> f32 {
        self.luck_multiplier
    }

    /// Tier for a unit roll, rarest threshold first
    pub fn tier_for_roll(&self, roll: f32) -> Option<CritTier> {
        CritTier::BY_RARITY
            .into_iter()
            .find(|tier| roll < tier.base_chance() * self.luck_multiplier)
    }

    /// Draw once and apply. Returns the final value and the crit, if any.
    pub fn roll(
        &mut self,
        base: u32,
        rng: &mut GameRng,
        events: &mut Vec<GameEvent>,
    ) -> (u32, Option<CriticalHit>) {
        let roll = rng.next_f32();
        self.roll_with(roll, base, events)
    }

    /// Apply a given roll value
    pub fn roll_with(
        &mut self,
        roll: f32,
        base: u32,
        events: &mut Vec<GameEvent>,
    ) -> (u32, Option<CriticalHit>) {
        let Some(tier) = self.tier_for_roll(roll) else {
            return (base, None);
        };

        let value = (base as f32 * tier.multiplier()).floor() as u32;
        match tier {
            CritTier::Normal => self.stats.normal += 1,
            CritTier::Mega => self.stats.mega += 1,
            CritTier::Ultra => self.stats.ultra += 1,
        }
        self.stats.total += 1;

        log::debug!("Critical {tier:?}: {base} -> {value}");
        events.push(GameEvent::CriticalHit { tier, base, value });
        (value, Some(CriticalHit { tier, base, value }))
    }

    pub fn stats(&self) -> CritStats {
        self.stats
    }
}
