//! Wire contract: topic names and payload records
//!
//! All payloads are field-named JSON records (never positional) so remote
//! actors tolerate schema evolution. The topic set matches the exhibit's
//! deployed consumers; renaming a topic is a breaking change for them.

use serde::{Deserialize, Serialize};

use crate::sim::GameState;

/// Topic names, publish direction in the comment
pub mod topic {
    /// engine -> AI actor
    pub const PUCK_POSITION: &str = "puck/position";
    /// engine -> AI actor
    pub const PADDLE1_POSITION: &str = "paddle1/position";
    /// engine -> AI actor
    pub const PADDLE2_POSITION: &str = "paddle2/position";
    /// engine -> all
    pub const GAME_LEVEL: &str = "game/level";
    /// engine -> AI actor; triggers remote render + inference
    pub const GAME_FRAME: &str = "game/frame";
    /// camera actor -> engine
    pub const PADDLE1_ACTION: &str = "paddle1/action";
    /// AI actor -> engine
    pub const PADDLE2_ACTION: &str = "paddle2/action";
    /// camera actor -> engine (frame echo for lag accounting)
    pub const PADDLE1_FRAME: &str = "paddle1/frame";
    /// AI actor -> engine (frame echo for lag accounting)
    pub const PADDLE2_FRAME: &str = "paddle2/frame";
    /// engine -> visualization
    pub const DEPTH_FEED: &str = "depth/feed";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PuckPosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaddlePosition {
    pub position: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LevelPayload {
    pub level: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FramePayload {
    pub frame: u64,
}

/// Inbound paddle command; `action` is the wire integer decoded by
/// [`crate::sim::Action::from_wire`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionPayload {
    pub action: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthFeed {
    pub feed: String,
}

/// Published view of the game for one tick. Immutable once built; the
/// channel fans it out across the position/level/frame topics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub ball: (f32, f32),
    /// (left y, right y)
    pub paddles: (f32, f32),
    /// (left, right)
    pub score: (u32, u32),
    pub level: u8,
    /// When set, remote actors are expected to answer with an action
    pub request_action: bool,
}

impl Snapshot {
    pub fn from_state(state: &GameState, level: u8, request_action: bool) -> Self {
        Self {
            tick: state.tick,
            ball: (state.ball.pos.x, state.ball.pos.y),
            paddles: (state.left_paddle.y, state.right_paddle.y),
            score: (state.score_left, state.score_right),
            level,
            request_action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_field_names_are_stable() {
        let json = serde_json::to_string(&PuckPosition { x: 1.5, y: 2.0 }).unwrap();
        assert_eq!(json, r#"{"x":1.5,"y":2.0}"#);

        let json = serde_json::to_string(&PaddlePosition { position: 96.0 }).unwrap();
        assert_eq!(json, r#"{"position":96.0}"#);

        let json = serde_json::to_string(&FramePayload { frame: 42 }).unwrap();
        assert_eq!(json, r#"{"frame":42}"#);
    }

    #[test]
    fn test_action_payload_decodes() {
        let payload: ActionPayload = serde_json::from_str(r#"{"action": 1}"#).unwrap();
        assert_eq!(payload.action, 1);
        // Missing field is a decode error, not a default
        assert!(serde_json::from_str::<ActionPayload>(r#"{}"#).is_err());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let state = GameState::new(1.0);
        let snapshot = Snapshot::from_state(&state, 2, true);
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.level, 2);
        assert_eq!(snapshot.score, (0, 0));
        assert_eq!(snapshot.paddles.0, state.left_paddle.y);
        assert!(snapshot.request_action);
    }
}
