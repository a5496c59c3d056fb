//! Player kinds
//!
//! Every paddle is driven by something that can produce one `Action` per
//! tick: a local bot, a local human on the keyboard, the remote decision
//! policy, or the depth camera. Each variant keeps its wiring private;
//! the orchestrator only sees `act()` and the frame echo for lag
//! accounting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::channel::RemoteActorChannel;
use crate::sim::{Action, GameState, Side};

/// A paddle controller
pub enum Player {
    /// Local bot that tracks the ball (attract mode and fallback opponent)
    Bot(BotPlayer),
    /// Local human on the keyboard
    Human(HumanPlayer),
    /// Remote decision policy fed over the bus
    Remote(RemoteActorChannel),
    /// Depth-camera positioning, also fed over the bus. Produces the
    /// camera sentinel action alongside up/down; the physics treats the
    /// sentinel as no-op.
    Camera(RemoteActorChannel),
}

impl Player {
    /// Produce this tick's action. Remote variants never block; they hold
    /// the last received input.
    pub fn act(&self, state: &GameState) -> Action {
        match self {
            Player::Bot(bot) => bot.act(state),
            Player::Human(human) => human.act(),
            Player::Remote(channel) | Player::Camera(channel) => channel.act(),
        }
    }

    /// Frame echo of the most recent remote action, for lag accounting.
    /// Local variants have no pipeline and report nothing.
    pub fn acted_frame(&self) -> Option<u64> {
        match self {
            Player::Bot(_) | Player::Human(_) => None,
            Player::Remote(channel) | Player::Camera(channel) => channel.acted_frame(),
        }
    }
}

/// Pressed-state of the two movement keys. The input surface (GUI shell,
/// terminal reader) writes; the player samples each tick.
#[derive(Default)]
pub struct KeyState {
    up: AtomicBool,
    down: AtomicBool,
}

impl KeyState {
    pub fn set_up(&self, pressed: bool) {
        self.up.store(pressed, Ordering::Release);
    }

    pub fn set_down(&self, pressed: bool) {
        self.down.store(pressed, Ordering::Release);
    }
}

/// Keyboard-driven player. The key wiring stays private to the variant:
/// outside code sees only the `act()` seam plus a `KeyState` handle for
/// the input surface to write into.
#[derive(Default)]
pub struct HumanPlayer {
    keys: Arc<KeyState>,
}

impl HumanPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the input surface feeding this player's keys
    pub fn keys(&self) -> Arc<KeyState> {
        Arc::clone(&self.keys)
    }

    fn act(&self) -> Action {
        let up = self.keys.up.load(Ordering::Acquire);
        let down = self.keys.down.load(Ordering::Acquire);
        match (up, down) {
            (true, false) => Action::Up,
            (false, true) => Action::Down,
            // Neither key, or both: stay put
            _ => Action::None,
        }
    }
}

/// Ball-following bot. Moves toward the ball's y whenever it is more than
/// a dead zone away, so it does not jitter at matched height.
pub struct BotPlayer {
    side: Side,
    dead_zone: f32,
}

impl BotPlayer {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            dead_zone: 1.0,
        }
    }

    fn act(&self, state: &GameState) -> Action {
        let paddle = match self.side {
            Side::Left => &state.left_paddle,
            Side::Right => &state.right_paddle,
        };
        let delta = state.ball.pos.y - paddle.y;
        if delta < -self.dead_zone {
            Action::Up
        } else if delta > self.dead_zone {
            Action::Down
        } else {
            Action::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_bot_tracks_ball() {
        let mut state = GameState::new(1.0);
        let bot = Player::Bot(BotPlayer::new(Side::Left));

        state.ball.pos = Vec2::new(40.0, 10.0); // well above the paddle
        assert_eq!(bot.act(&state), Action::Up);

        state.ball.pos = Vec2::new(40.0, 180.0); // well below
        assert_eq!(bot.act(&state), Action::Down);

        state.ball.pos = Vec2::new(40.0, state.left_paddle.y); // matched
        assert_eq!(bot.act(&state), Action::None);
    }

    #[test]
    fn test_bot_reports_no_frame() {
        let bot = Player::Bot(BotPlayer::new(Side::Right));
        assert_eq!(bot.acted_frame(), None);
    }

    #[test]
    fn test_human_follows_key_state() {
        let state = GameState::new(1.0);
        let human = HumanPlayer::new();
        let keys = human.keys();
        let player = Player::Human(human);

        assert_eq!(player.act(&state), Action::None);

        keys.set_up(true);
        assert_eq!(player.act(&state), Action::Up);

        // Both keys held cancel out
        keys.set_down(true);
        assert_eq!(player.act(&state), Action::None);

        keys.set_up(false);
        assert_eq!(player.act(&state), Action::Down);

        keys.set_down(false);
        assert_eq!(player.act(&state), Action::None);
        assert_eq!(player.acted_frame(), None);
    }

    #[test]
    fn test_remote_defaults_to_none() {
        let state = GameState::new(1.0);
        let player = Player::Remote(RemoteActorChannel::new(Side::Right));
        assert_eq!(player.act(&state), Action::None);
        assert_eq!(player.acted_frame(), None);
    }
}
