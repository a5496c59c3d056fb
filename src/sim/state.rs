//! Game state and core simulation types
//!
//! All state the engine mutates during a level-run lives here. Positions
//! are center coordinates; x is the scoring axis, y the clamped axis.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// One paddle command for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Action {
    Up,
    Down,
    #[default]
    None,
    /// Depth-camera positioning sentinel. Carried on the wire for the
    /// vision side but treated exactly like `None` by the physics.
    Depth,
}

impl Action {
    /// Decode the wire integer used on the `paddleN/action` topics
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(Action::Up),
            1 => Some(Action::Down),
            2 => Some(Action::None),
            3 => Some(Action::Depth),
            _ => None,
        }
    }

    pub fn to_wire(self) -> i64 {
        match self {
            Action::Up => 0,
            Action::Down => 1,
            Action::None => 2,
            Action::Depth => 3,
        }
    }
}

/// Which edge of the playfield a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Fixed paddle x for this side
    pub fn paddle_x(self) -> f32 {
        match self {
            Side::Left => PADDING,
            Side::Right => WIDTH - PADDING,
        }
    }
}

/// A paddle. `x` is fixed at construction per side; only `y` moves, by
/// exactly `speed` per handled action, clamped to `[0, HEIGHT]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub speed: f32,
}

impl Paddle {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            x: side.paddle_x(),
            y: HEIGHT / 2.0,
            w: PADDLE_WIDTH,
            h: PADDLE_HEIGHT,
            speed: PADDLE_SPEED,
        }
    }

    /// Back to serve position. Score is not touched here.
    pub fn reset(&mut self) {
        *self = Self::new(self.side);
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Up => {
                self.y -= self.speed;
                if self.y < 0.0 {
                    self.y = 0.0;
                }
            }
            Action::Down => {
                self.y += self.speed;
                if self.y > HEIGHT {
                    self.y = HEIGHT;
                }
            }
            Action::None | Action::Depth => {}
        }
    }
}

/// The ball. `velocity == (0,0)` only in the just-reset state; the first
/// update after a reset serves it at a random table angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub w: f32,
    pub h: f32,
    /// Unset until the first serve after a reset
    pub moving_right: Option<bool>,
}

impl Ball {
    pub fn new(speed: f32) -> Self {
        Self {
            pos: Vec2::new((WIDTH / 2.0).floor(), (HEIGHT / 2.0).floor()),
            velocity: Vec2::ZERO,
            speed,
            w: BALL_DIAMETER,
            h: BALL_DIAMETER,
            moving_right: None,
        }
    }

    /// Back to center, stationary, direction unset
    pub fn reset(&mut self, speed: f32) {
        *self = Self::new(speed);
    }

    /// Reflect velocity on the given axes
    pub fn bounce(&mut self, x: bool, y: bool) {
        if x {
            self.velocity.x = -self.velocity.x;
        }
        if y {
            self.velocity.y = -self.velocity.y;
        }
    }
}

/// Complete game state for one level-run. Owned exclusively by the engine
/// and mutated only inside `step`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub left_paddle: Paddle,
    pub right_paddle: Paddle,
    pub ball: Ball,
    pub score_left: u32,
    pub score_right: u32,
    /// Sub-tick counter, incremented once per physics update
    pub tick: u64,
}

impl GameState {
    pub fn new(ball_speed: f32) -> Self {
        Self {
            left_paddle: Paddle::new(Side::Left),
            right_paddle: Paddle::new(Side::Right),
            ball: Ball::new(ball_speed),
            score_left: 0,
            score_right: 0,
            tick: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paddle_clamps_to_screen() {
        let mut paddle = Paddle::new(Side::Left);
        for _ in 0..1000 {
            paddle.handle_action(Action::Up);
        }
        assert_eq!(paddle.y, 0.0);
        for _ in 0..1000 {
            paddle.handle_action(Action::Down);
        }
        assert_eq!(paddle.y, HEIGHT);
    }

    #[test]
    fn test_depth_action_is_inert() {
        let mut paddle = Paddle::new(Side::Right);
        let before = paddle.y;
        paddle.handle_action(Action::Depth);
        paddle.handle_action(Action::None);
        assert_eq!(paddle.y, before);
    }

    #[test]
    fn test_action_wire_codes_round_trip() {
        for action in [Action::Up, Action::Down, Action::None, Action::Depth] {
            assert_eq!(Action::from_wire(action.to_wire()), Some(action));
        }
        assert_eq!(Action::from_wire(7), None);
        assert_eq!(Action::from_wire(-1), None);
    }

    #[test]
    fn test_ball_reset_state() {
        let mut ball = Ball::new(1.0);
        ball.velocity = Vec2::new(1.0, -0.5);
        ball.moving_right = Some(true);
        ball.speed = 2.3;
        ball.reset(1.0);
        assert_eq!(ball.velocity, Vec2::ZERO);
        assert_eq!(ball.moving_right, None);
        assert_eq!(ball.speed, 1.0);
    }
}
