//! Game state and core simulation types
//!
//! Everything a snapshot of a run needs lives here. Modifier state is owned
//! by the game manager, not by `GameState`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::modifiers::{BuffKind, Mutation};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Constructed, no run started yet
    Ready,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Crowd reached zero
    GameOver,
}

/// What a spawn request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnEntity {
    AdditionGate,
    /// Legacy gate that multiplies the crowd
    MultiplyGate,
    Enemy,
    PowerUp,
}

/// Request to materialise one obstacle. `value: None` lets the spawner pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub lane: usize,
    pub entity: SpawnEntity,
    pub value: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateKind {
    Addition,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Gate { kind: GateKind, value: u32 },
    EnemyCrowd { value: u32, mutation: Mutation },
    PowerUp { buff: BuffKind },
}

impl ObstacleKind {
    pub fn is_enemy(&self) -> bool {
        matches!(self, ObstacleKind::EnemyCrowd { .. })
    }
}

/// An approaching obstacle. `pos.x` is lateral (lane units, centre lane at
/// 0), `pos.y` is distance ahead of the player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub lane: usize,
    pub pos: Vec2,
    /// Own approach-speed factor (swift enemies close in faster)
    pub speed: f32,
    pub kind: ObstacleKind,
}

impl Obstacle {
    /// Move toward the player. Returns true on the step it reaches the
    /// player's line.
    pub fn advance(&mut self, step: f32) -> bool {
        let before = self.pos.y;
        self.pos.y -= step * self.speed;
        before > 0.0 && self.pos.y <= 0.0
    }
}

/// Lateral position of a lane's centre
#[inline]
pub fn lane_x(lane: usize) -> f32 {
    lane.min(LANE_COUNT - 1) as f32 - (LANE_COUNT / 2) as f32
}

/// Complete run state (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    /// Head count; the run ends at zero
    pub crowd: u32,
    /// Distance run (world units)
    pub distance: f32,
    /// Seconds of play (unscaled)
    pub elapsed: f32,
    pub score: u64,
    /// Lane the player is steering toward
    pub player_lane: usize,
    /// Current lateral position (slides toward `player_lane`)
    pub player_x: f32,
    /// Active obstacles, in spawn (id) order
    pub obstacles: Vec<Obstacle>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        let lane = LANE_COUNT / 2;
        Self {
            seed,
            phase: GamePhase::Ready,
            crowd: STARTING_CROWD,
            distance: 0.0,
            elapsed: 0.0,
            score: 0,
            player_lane: lane,
            player_x: lane_x(lane),
            obstacles: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Move the steering target, clamped to the track
    pub fn set_player_lane(&mut self, lane: usize) {
        self.player_lane = lane.min(LANE_COUNT - 1);
    }

    /// Slide the player toward its lane at `LANE_CHANGE_SPEED`
    pub fn slide_player(&mut self, dt: f32) {
        let target = lane_x(self.player_lane);
        let max_step = LANE_CHANGE_SPEED * dt;
        let delta = (target - self.player_x).clamp(-max_step, max_step);
        self.player_x += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_positions() {
        assert_eq!(lane_x(0), -1.0);
        assert_eq!(lane_x(1), 0.0);
        assert_eq!(lane_x(2), 1.0);
        assert_eq!(lane_x(7), 1.0);
    }

    #[test]
    fn test_new_state() {
        let mut state = GameState::new(5);
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.crowd, STARTING_CROWD);
        assert_eq!(state.player_x, 0.0);
        assert_eq!(state.next_entity_id(), 1);
        assert_eq!(state.next_entity_id(), 2);
    }

    #[test]
    fn test_slide_is_rate_limited() {
        let mut state = GameState::new(5);
        state.set_player_lane(9);
        assert_eq!(state.player_lane, LANE_COUNT - 1);

        state.slide_player(0.05);
        assert!(state.player_x > 0.0 && state.player_x < 1.0);
        state.slide_player(1.0);
        assert_eq!(state.player_x, 1.0);
    }

    #[test]
    fn test_obstacle_crossing_reported_once() {
        let mut obstacle = Obstacle {
            id: 1,
            lane: 1,
            pos: Vec2::new(0.0, 1.0),
            speed: 1.0,
            kind: ObstacleKind::PowerUp {
                buff: BuffKind::Ghost,
            },
        };
        assert!(!obstacle.advance(0.5));
        assert!(obstacle.advance(0.6));
        assert!(!obstacle.advance(0.6));
    }
}
