//! Crowd Runner - a lane runner where the player steers a crowd
//!
//! Core modules:
//! - `modifiers`: Independent time-evolving gameplay modifiers
//! - `sim`: Game state, the per-frame orchestrator and its event bus
//! - `settings`: Runtime settings and feature flags
//! - `error`: Error types

pub mod error;
pub mod modifiers;
pub mod settings;
pub mod sim;

pub use error::SettingsError;
pub use settings::{Feature, FeatureFlags, Preset, Settings};
pub use sim::{GameEvent, GameManager, GamePhase, TickInput};

/// Game configuration constants
pub mod consts {
    /// Number of lanes on the track
    pub const LANE_COUNT: usize = 3;
    /// Forward speed at multiplier 1.0 (world units per second)
    pub const RUN_SPEED: f32 = 10.0;
    /// How far ahead new obstacles appear
    pub const SPAWN_DISTANCE: f32 = 60.0;
    /// Spacing between obstacles spawned in one burst
    pub const BURST_SPACING: f32 = 4.0;
    /// Longest frame the simulation accepts (seconds)
    pub const MAX_DT: f32 = 0.25;
    /// Crowd at the start of a run
    pub const STARTING_CROWD: u32 = 30;
    /// Lateral slide speed (lanes per second)
    pub const LANE_CHANGE_SPEED: f32 = 8.0;
    /// Seconds per crowd member restored by the regen buff
    pub const REGEN_INTERVAL: f32 = 1.0;
    /// Autopilot look-ahead distance
    pub const AUTOPILOT_LOOKAHEAD: f32 = 25.0;
}
