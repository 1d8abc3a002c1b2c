//! Gameplay modifier subsystems
//!
//! Each subsystem is independent of the others: it advances on `update(dt)`,
//! answers queries, and reports notifications into a caller-supplied event
//! buffer. Only the game manager reads across them.

pub mod adaptive;
pub mod buffs;
pub mod combo;
pub mod comeback;
pub mod critical;
pub mod lanes;
pub mod momentum;
pub mod mutation;
pub mod near_miss;
pub mod patterns;
pub mod progression;
pub mod world_events;

pub use adaptive::{AdaptiveMultipliers, AdaptivePerformanceController, PerformanceMetrics, Trend};
pub use buffs::{ActiveBuff, BuffKind, ContactResolution, TimedBuffRegistry};
pub use combo::{ComboTracker, combo_multiplier};
pub use comeback::{ComebackAssist, ComebackAssistant, danger_for_crowd};
pub use critical::{CritStats, CritTier, CriticalHit, CriticalRollEngine};
pub use lanes::{LaneTraitAssigner, LaneTraitAssignment, LaneTraitConfig, LaneTraitKind};
pub use momentum::{MomentumTier, MomentumTracker};
pub use mutation::{Mutation, MutationKind, MutationRollEngine};
pub use near_miss::NearMissTracker;
pub use patterns::{PatternInstruction, PatternKind, PatternScheduler};
pub use progression::{ProgressionDifficulty, level_for_distance};
pub use world_events::{ActiveEvent, EventEffects, WeightedEventScheduler, WorldEventKind};
