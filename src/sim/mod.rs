//! Deterministic Pong simulation
//!
//! Pure function of (state, actions) -> (state, reward, done). No I/O;
//! randomness is limited to serve angle/direction and driven by a seeded
//! PCG stream so a fixed seed and action script reproduce the same
//! trajectory exactly.

pub mod collision;
pub mod engine;
pub mod state;

pub use collision::{bounce_velocity, check_collision};
pub use engine::{PhysicsEngine, StepResult};
pub use state::{Action, Ball, GameState, Paddle, Side};
