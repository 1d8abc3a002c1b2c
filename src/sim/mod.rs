//! Simulation module
//!
//! The game manager drives every modifier from one place:
//! - One `dt` per frame, fed to every subsystem before any composition
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod events;
pub mod rng;
pub mod state;
pub mod tick;

pub use events::{ContactOutcome, EventBus, GameEvent};
pub use rng::{GameRng, weighted_walk};
pub use state::{
    GameState, GamePhase, GateKind, Obstacle, ObstacleKind, SpawnEntity, SpawnRequest, lane_x,
};
pub use tick::{EffectiveParams, GameManager, ModifierSnapshot, TickInput, compose_reward};
