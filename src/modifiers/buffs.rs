//! Timed buffs (power-ups)
//!
//! One entry per kind. Re-activating a live buff keeps whichever remaining
//! time is longer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;

/// Longest duration accepted for any buff (seconds)
pub const MAX_BUFF_DURATION: f32 = 60.0;
/// Speed boost factor
pub const SPEED_BOOST_MULTIPLIER: f32 = 1.5;
/// Time slow factor
pub const TIME_SLOW_MULTIPLIER: f32 = 0.6;
/// Frenzy reward factor
pub const FRENZY_MULTIPLIER: f32 = 2.0;
/// One-shot reward factor
pub const ONE_SHOT_MULTIPLIER: f32 = 2.0;
/// Share of an enemy's value a vampire steals
pub const VAMPIRE_STEAL_FRACTION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuffKind {
    Shield,
    Ghost,
    Vampire,
    Regen,
    TimeSlow,
    Frenzy,
    SpeedBoost,
    Multiplier,
}

impl BuffKind {
    pub const ALL: [BuffKind; 8] = [
        BuffKind::Shield,
        BuffKind::Ghost,
        BuffKind::Vampire,
        BuffKind::Regen,
        BuffKind::TimeSlow,
        BuffKind::Frenzy,
        BuffKind::SpeedBoost,
        BuffKind::Multiplier,
    ];

    /// Duration granted by a pickup
    pub fn default_duration(&self) -> f32 {
        match self {
            BuffKind::Shield => 10.0,
            BuffKind::Ghost => 5.0,
            BuffKind::Vampire => 8.0,
            BuffKind::Regen => 10.0,
            BuffKind::TimeSlow => 6.0,
            BuffKind::Frenzy => 8.0,
            BuffKind::SpeedBoost => 5.0,
            BuffKind::Multiplier => 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuff {
    pub kind: BuffKind,
    pub remaining: f32,
    pub full_duration: f32,
}

/// Result of an enemy touching the player, by fixed precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactResolution {
    /// Ghost: nothing happens
    PassThrough,
    /// Shield consumed, enemy removed
    Shielded,
    /// Vampire: `gained` members join the crowd
    Drained { gained: u32 },
    /// No protective buff: caller applies damage
    Unprotected,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimedBuffRegistry {
    active: BTreeMap<BuffKind, ActiveBuff>,
}

impl TimedBuffRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.active.clear();
    }

    pub fn activate_power_up(&mut self, kind: BuffKind, duration: f32, events: &mut Vec<GameEvent>) {
        let duration = duration.clamp(0.0, MAX_BUFF_DURATION);
        match self.active.get_mut(&kind) {
            Some(buff) => {
                buff.remaining = buff.remaining.max(duration);
                buff.full_duration = buff.full_duration.max(duration);
            }
            None => {
                self.active.insert(
                    kind,
                    ActiveBuff {
                        kind,
                        remaining: duration,
                        full_duration: duration,
                    },
                );
            }
        }
        log::debug!("Buff {kind:?} active for {duration:.1}s");
        events.push(GameEvent::PowerUpActivated { kind, duration });
    }

    pub fn update(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let dt = dt.max(0.0);
        let mut expired = Vec::new();
        for buff in self.active.values_mut() {
            buff.remaining -= dt;
            if buff.remaining <= 0.0 {
                expired.push(buff.kind);
            }
        }
        for kind in expired {
            self.expire(kind, events);
        }
    }

    fn expire(&mut self, kind: BuffKind, events: &mut Vec<GameEvent>) {
        if self.active.remove(&kind).is_some() {
            log::debug!("Buff {kind:?} expired");
            events.push(GameEvent::PowerUpExpired { kind });
        }
    }

    pub fn is_active(&self, kind: BuffKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn remaining(&self, kind: BuffKind) -> f32 {
        self.active.get(&kind).map(|b| b.remaining).unwrap_or(0.0)
    }

    pub fn active(&self) -> impl Iterator<Item = &ActiveBuff> {
        self.active.values()
    }

    pub fn has_shield(&self) -> bool {
        self.is_active(BuffKind::Shield)
    }

    pub fn has_ghost(&self) -> bool {
        self.is_active(BuffKind::Ghost)
    }

    pub fn has_vampire(&self) -> bool {
        self.is_active(BuffKind::Vampire)
    }

    pub fn has_regen(&self) -> bool {
        self.is_active(BuffKind::Regen)
    }

    pub fn has_time_slow(&self) -> bool {
        self.is_active(BuffKind::TimeSlow)
    }

    pub fn has_frenzy(&self) -> bool {
        self.is_active(BuffKind::Frenzy)
    }

    pub fn has_speed_boost(&self) -> bool {
        self.is_active(BuffKind::SpeedBoost)
    }

    pub fn has_multiplier(&self) -> bool {
        self.is_active(BuffKind::Multiplier)
    }

    /// Remove the shield right away (fires expiry)
    pub fn consume_shield(&mut self, events: &mut Vec<GameEvent>) {
        self.expire(BuffKind::Shield, events);
    }

    /// Speed boost × time slow
    pub fn speed_multiplier(&self) -> f32 {
        let mut speed = 1.0;
        if self.has_speed_boost() {
            speed *= SPEED_BOOST_MULTIPLIER;
        }
        if self.has_time_slow() {
            speed *= TIME_SLOW_MULTIPLIER;
        }
        speed
    }

    pub fn frenzy_multiplier(&self) -> f32 {
        if self.has_frenzy() { FRENZY_MULTIPLIER } else { 1.0 }
    }

    /// Spend the one-shot multiplier on the next reward, if held
    pub fn take_multiplier(&mut self, events: &mut Vec<GameEvent>) -> Option<f32> {
        if self.has_multiplier() {
            self.expire(BuffKind::Multiplier, events);
            Some(ONE_SHOT_MULTIPLIER)
        } else {
            None
        }
    }

    /// Ghost > Shield > Vampire > damage. Only the first match applies.
    pub fn resolve_enemy_contact(
        &mut self,
        enemy_value: u32,
        events: &mut Vec<GameEvent>,
    ) -> ContactResolution {
        if self.has_ghost() {
            ContactResolution::PassThrough
        } else if self.has_shield() {
            self.consume_shield(events);
            ContactResolution::Shielded
        } else if self.has_vampire() {
            let gained = (enemy_value as f32 * VAMPIRE_STEAL_FRACTION).floor() as u32;
            ContactResolution::Drained { gained }
        } else {
            ContactResolution::Unprotected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_expiry_and_events() {
        let mut buffs = TimedBuffRegistry::new();
        let mut events = Vec::new();
        buffs.activate_power_up(BuffKind::Frenzy, 2.0, &mut events);
        buffs.activate_power_up(BuffKind::Ghost, 5.0, &mut events);
        assert_eq!(buffs.frenzy_multiplier(), 2.0);

        events.clear();
        buffs.update(2.5, &mut events);
        assert!(!buffs.has_frenzy());
        assert!(buffs.has_ghost());
        assert_eq!(events, vec![GameEvent::PowerUpExpired { kind: BuffKind::Frenzy }]);
        assert_eq!(buffs.frenzy_multiplier(), 1.0);
    }

    #[test]
    fn test_speed_composition() {
        let mut buffs = TimedBuffRegistry::new();
        let mut events = Vec::new();
        assert_eq!(buffs.speed_multiplier(), 1.0);
        buffs.activate_power_up(BuffKind::SpeedBoost, 5.0, &mut events);
        assert_eq!(buffs.speed_multiplier(), 1.5);
        buffs.activate_power_up(BuffKind::TimeSlow, 5.0, &mut events);
        assert!((buffs.speed_multiplier() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_contact_precedence() {
        let mut buffs = TimedBuffRegistry::new();
        let mut events = Vec::new();
        assert_eq!(
            buffs.resolve_enemy_contact(10, &mut events),
            ContactResolution::Unprotected
        );

        buffs.activate_power_up(BuffKind::Vampire, 5.0, &mut events);
        assert_eq!(
            buffs.resolve_enemy_contact(11, &mut events),
            ContactResolution::Drained { gained: 5 }
        );

        buffs.activate_power_up(BuffKind::Shield, 5.0, &mut events);
        assert_eq!(buffs.resolve_enemy_contact(11, &mut events), ContactResolution::Shielded);
        assert!(!buffs.has_shield());
        assert!(buffs.has_vampire());

        buffs.activate_power_up(BuffKind::Shield, 5.0, &mut events);
        buffs.activate_power_up(BuffKind::Ghost, 5.0, &mut events);
        assert_eq!(
            buffs.resolve_enemy_contact(11, &mut events),
            ContactResolution::PassThrough
        );
        // Ghost took it; the shield is untouched
        assert!(buffs.has_shield());
    }

    #[test]
    fn test_one_shot_multiplier_consumed() {
        let mut buffs = TimedBuffRegistry::new();
        let mut events = Vec::new();
        assert_eq!(buffs.take_multiplier(&mut events), None);
        buffs.activate_power_up(BuffKind::Multiplier, 10.0, &mut events);
        assert_eq!(buffs.take_multiplier(&mut events), Some(2.0));
        assert_eq!(buffs.take_multiplier(&mut events), None);
    }

    #[test]
    fn test_duration_clamped() {
        let mut buffs = TimedBuffRegistry::new();
        let mut events = Vec::new();
        buffs.activate_power_up(BuffKind::Regen, 500.0, &mut events);
        assert_eq!(buffs.remaining(BuffKind::Regen), MAX_BUFF_DURATION);
    }

    proptest! {
        #[test]
        fn prop_refresh_never_shortens(first in 0.1f32..30.0, elapsed in 0.0f32..0.09, second in 0.0f32..30.0) {
            let mut buffs = TimedBuffRegistry::new();
            let mut events = Vec::new();
            buffs.activate_power_up(BuffKind::Shield, first, &mut events);
            buffs.update(elapsed, &mut events);
            let before = buffs.remaining(BuffKind::Shield);
            buffs.activate_power_up(BuffKind::Shield, second, &mut events);
            prop_assert!(buffs.remaining(BuffKind::Shield) >= before);
            prop_assert_eq!(buffs.active().count(), 1);
        }
    }
}
