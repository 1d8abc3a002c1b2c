//! Timeout-windowed combo counter

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;

/// Seconds a combo survives without a new hit
pub const COMBO_TIMEOUT: f32 = 3.0;

/// Score multiplier for a combo count
pub fn combo_multiplier(count: u32) -> f32 {
    match count {
        15.. => 3.0,
        10.. => 2.5,
        6.. => 2.0,
        3.. => 1.5,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboTracker {
    count: u32,
    timer: f32,
    session_max: u32,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn add_to_combo(&mut self, events: &mut Vec<GameEvent>) {
        self.count += 1;
        self.timer = COMBO_TIMEOUT;
        events.push(GameEvent::ComboChanged {
            count: self.count,
            multiplier: self.multiplier(),
        });
        if self.count > self.session_max {
            self.session_max = self.count;
            events.push(GameEvent::ComboNewMax { max: self.count });
        }
    }

    pub fn update(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        if self.count == 0 {
            return;
        }
        self.timer -= dt.max(0.0);
        if self.timer <= 0.0 {
            log::debug!("Combo expired at {}", self.count);
            self.expire(events);
        }
    }

    /// Break the combo (e.g. on enemy hit)
    pub fn reset_combo(&mut self, events: &mut Vec<GameEvent>) {
        if self.count > 0 {
            self.expire(events);
        }
    }

    fn expire(&mut self, events: &mut Vec<GameEvent>) {
        events.push(GameEvent::ComboExpired { count: self.count });
        self.count = 0;
        self.timer = 0.0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn multiplier(&self) -> f32 {
        combo_multiplier(self.count)
    }

    pub fn session_max(&self) -> u32 {
        self.session_max
    }

    pub fn time_left(&self) -> f32 {
        self.timer.max(0.0)
    }
}
