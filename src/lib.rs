//! Pong Exhibit - coordinator for a two-player networked Pong installation
//!
//! Core modules:
//! - `sim`: Deterministic Pong simulation (paddles, ball, scoring)
//! - `protocol`: MQTT topic names and wire payload types
//! - `bus`: Publish/subscribe transport wrapper with a delivery thread
//! - `channel`: Per-side remote actor adapters (last-write-wins action slots)
//! - `skew`: Frame lag accounting for remote decision-makers
//! - `player`: Player kinds (bot, human, remote AI, depth camera)
//! - `session`: Presence-gated level/idle state machine
//! - `orchestrator`: Fixed-tick game loop tying it all together

pub mod bus;
pub mod channel;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod player;
pub mod protocol;
pub mod session;
pub mod sim;
pub mod skew;

pub use config::Config;
pub use error::Error;

/// Game configuration constants
pub mod consts {
    /// Playfield width (px). The ball scores by leaving this axis.
    pub const WIDTH: f32 = 160.0;
    /// Playfield height (px). Paddles and ball stay clamped to this axis.
    pub const HEIGHT: f32 = 192.0;
    /// Distance between screen edge and each paddle's center (px)
    pub const PADDING: f32 = 10.0;
    /// Points one side must reach to finish a level-run
    pub const MAX_SCORE: u32 = 21;

    /// Paddle defaults
    pub const PADDLE_HEIGHT: f32 = 20.0;
    pub const PADDLE_WIDTH: f32 = 2.0;
    pub const PADDLE_SPEED: f32 = 1.0;

    /// Ball defaults
    pub const BALL_DIAMETER: f32 = 2.0;
    pub const BALL_SPEED: f32 = 1.0;
    /// Flat speed gain applied on every paddle bounce
    pub const VOLLEY_SPEEDUP: f32 = 0.1;

    /// Bounce angle table (degrees). Impact offset along the paddle is
    /// quantized to one of seven bands; negative bands index from the end
    /// of the table.
    pub const BOUNCE_ANGLES: [f32; 7] = [0.0, 60.0, 45.0, 30.0, -30.0, -45.0, -60.0];

    /// Published tick rate target
    pub const DEFAULT_TICK_HZ: f64 = 60.0;
    /// Ticks between action requests; also the expected pipeline delay
    /// for lag accounting
    pub const ACTION_INTERVAL: u64 = 3;
}
