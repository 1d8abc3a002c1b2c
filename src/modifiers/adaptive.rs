//! Performance-adaptive difficulty
//!
//! Recorders feed raw counters; every [`EVALUATION_INTERVAL`] seconds the
//! controller scores the player, classifies the recent trend and nudges four
//! multipliers. Adjustments only happen on a trend *change*, and the stable
//! band relaxes everything back toward 1.0, so the loop settles instead of
//! oscillating.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;

/// Seconds between evaluations
pub const EVALUATION_INTERVAL: f32 = 15.0;
/// Scores kept for the trend average
pub const HISTORY_LEN: usize = 10;
/// Samples needed before the controller acts
pub const MIN_SAMPLES: usize = 3;
/// EMA smoothing factor for crowd size
pub const CROWD_ALPHA: f32 = 0.1;

const INCREASING_THRESHOLD: f32 = 0.65;
const DECREASING_THRESHOLD: f32 = 0.35;
const STABLE_RELAX: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// Raw counters written by the recorders
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub gates_collected: u32,
    pub gates_missed: u32,
    pub enemies_hit: u32,
    pub enemies_avoided: u32,
    pub rolling_average_crowd_size: f32,
    pub deaths: u32,
    #[serde(skip)]
    crowd_seeded: bool,
}

impl PerformanceMetrics {
    /// Collected / seen, 0.5 without samples
    pub fn gate_rate(&self) -> f32 {
        let total = self.gates_collected + self.gates_missed;
        if total == 0 {
            0.5
        } else {
            self.gates_collected as f32 / total as f32
        }
    }

    /// Avoided / seen, 0.5 without samples
    pub fn avoid_rate(&self) -> f32 {
        let total = self.enemies_avoided + self.enemies_hit;
        if total == 0 {
            0.5
        } else {
            self.enemies_avoided as f32 / total as f32
        }
    }

    /// Weighted score in [0, 1]
    pub fn score(&self) -> f32 {
        let crowd = (self.rolling_average_crowd_size / 100.0).min(1.0);
        (0.4 * self.gate_rate() + 0.4 * self.avoid_rate() + 0.2 * crowd).clamp(0.0, 1.0)
    }
}

/// Multipliers the controller steers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveMultipliers {
    pub obstacle_frequency: f32,
    pub enemy_strength: f32,
    pub gate_value: f32,
    pub power_up_frequency: f32,
}

impl Default for AdaptiveMultipliers {
    fn default() -> Self {
        Self {
            obstacle_frequency: 1.0,
            enemy_strength: 1.0,
            gate_value: 1.0,
            power_up_frequency: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptivePerformanceController {
    metrics: PerformanceMetrics,
    history: VecDeque<f32>,
    trend: Trend,
    multipliers: AdaptiveMultipliers,
    timer: f32,
}

impl Default for AdaptivePerformanceController {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptivePerformanceController {
    pub fn new() -> Self {
        Self {
            metrics: PerformanceMetrics::default(),
            history: VecDeque::with_capacity(HISTORY_LEN),
            trend: Trend::Stable,
            multipliers: AdaptiveMultipliers::default(),
            timer: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn record_gate_collected(&mut self) {
        self.metrics.gates_collected += 1;
    }

    pub fn record_gate_missed(&mut self) {
        self.metrics.gates_missed += 1;
    }

    pub fn record_enemy_hit(&mut self) {
        self.metrics.enemies_hit += 1;
    }

    pub fn record_enemy_avoided(&mut self) {
        self.metrics.enemies_avoided += 1;
    }

    pub fn record_death(&mut self) {
        self.metrics.deaths += 1;
    }

    /// Exponential rolling average; the first sample seeds it
    pub fn update_crowd_size(&mut self, size: u32) {
        let size = size as f32;
        if self.metrics.crowd_seeded {
            let avg = self.metrics.rolling_average_crowd_size;
            self.metrics.rolling_average_crowd_size = avg + CROWD_ALPHA * (size - avg);
        } else {
            self.metrics.rolling_average_crowd_size = size;
            self.metrics.crowd_seeded = true;
        }
    }

    pub fn update(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.timer += dt.max(0.0);
        while self.timer >= EVALUATION_INTERVAL {
            self.timer -= EVALUATION_INTERVAL;
            self.evaluate(events);
        }
    }

    /// One evaluation step (normally driven by `update`)
    pub fn evaluate(&mut self, events: &mut Vec<GameEvent>) {
        let score = self.metrics.score();
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(score);

        if self.history.len() < MIN_SAMPLES {
            log::debug!("Adaptive: score {score:.2} ({} samples, waiting)", self.history.len());
            return;
        }

        let average = self.average_score();
        let trend = if average > INCREASING_THRESHOLD {
            Trend::Increasing
        } else if average < DECREASING_THRESHOLD {
            Trend::Decreasing
        } else {
            Trend::Stable
        };

        let changed = trend != self.trend;
        self.trend = trend;

        let m = &mut self.multipliers;
        match trend {
            Trend::Increasing if changed => {
                m.obstacle_frequency = (m.obstacle_frequency + 0.1).min(1.3);
                m.enemy_strength = (m.enemy_strength + 0.1).min(1.3);
                m.gate_value = (m.gate_value - 0.05).max(0.9);
                m.power_up_frequency = (m.power_up_frequency - 0.1).max(0.8);
            }
            Trend::Decreasing if changed => {
                m.obstacle_frequency = (m.obstacle_frequency - 0.1).max(0.7);
                m.enemy_strength = (m.enemy_strength - 0.1).max(0.7);
                m.gate_value = (m.gate_value + 0.1).min(1.3);
                m.power_up_frequency = (m.power_up_frequency + 0.1).min(1.4);
            }
            Trend::Stable => {
                m.obstacle_frequency += (1.0 - m.obstacle_frequency) * STABLE_RELAX;
                m.enemy_strength += (1.0 - m.enemy_strength) * STABLE_RELAX;
                m.gate_value += (1.0 - m.gate_value) * STABLE_RELAX;
                m.power_up_frequency += (1.0 - m.power_up_frequency) * STABLE_RELAX;
            }
            _ => {}
        }

        if changed {
            log::info!("Adaptive difficulty: {trend:?} (avg score {average:.2})");
            events.push(GameEvent::DifficultyAdjusted { trend, average });
        }
    }

    pub fn average_score(&self) -> f32 {
        if self.history.is_empty() {
            return 0.5;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn multipliers(&self) -> AdaptiveMultipliers {
        self.multipliers
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
