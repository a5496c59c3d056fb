//! Runtime configuration
//!
//! One `Config` value is constructed at process start (file + CLI overrides)
//! and passed by reference into the engine, channels and session machine.
//! There is no ambient global lookup.

use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::Error;

/// Exhibit runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // === Transport ===
    /// MQTT broker host
    pub broker_host: String,
    /// MQTT broker port
    pub broker_port: u16,
    /// Client id presented to the broker
    pub client_id: String,

    // === Tick loop ===
    /// Target published tick rate (Hz)
    pub tick_hz: f64,
    /// Ticks between action requests to the remote AI. Doubles as the
    /// expected pipeline delay when classifying lag.
    pub action_interval: u64,

    // === Game rules ===
    /// Points needed to finish a level-run
    pub max_score: u32,
    /// Seed for serve angle/direction selection
    pub seed: u64,
    /// Ball base speed (px per sub-tick)
    pub ball_speed: f32,
    /// Flat speed gain per paddle bounce
    pub volley_speedup: f32,
    /// Ball speed multiplier per level (index 0 = level 1)
    pub level_ball_speedup: [f32; 3],

    // === Presence gating ===
    /// Whether session transitions are gated on the presence sensor
    pub use_presence: bool,
    /// Stillness sampling window (samples)
    pub presence_window: usize,
    /// Maximum population stdev of depth samples to count as "still"
    pub stillness_stdev_max: f32,
    /// Poll interval while waiting on presence (ms)
    pub presence_poll_ms: u64,
    /// Poll iterations before a level-advance wait times out
    pub presence_poll_max: u32,
    /// Delay between announcing a level and starting it (ms)
    pub settle_delay_ms: u64,
    /// Delay after a finished game before returning to attract mode (ms)
    pub cooldown_ms: u64,

    // === Feeds ===
    /// Publish the auxiliary depth feed topic every tick
    pub publish_depth_feed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "game_driver".to_string(),

            tick_hz: consts::DEFAULT_TICK_HZ,
            action_interval: consts::ACTION_INTERVAL,

            max_score: consts::MAX_SCORE,
            seed: 0,
            ball_speed: consts::BALL_SPEED,
            volley_speedup: consts::VOLLEY_SPEEDUP,
            level_ball_speedup: [1.0, 1.25, 1.5],

            use_presence: false,
            presence_window: 30,
            stillness_stdev_max: 0.06,
            presence_poll_ms: 10,
            presence_poll_max: 250,
            settle_delay_ms: 6000,
            cooldown_ms: 1000,

            publish_depth_feed: false,
        }
    }
}

impl Config {
    /// Load from a JSON file
    pub fn load(path: &str) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|e| Error::ConfigIo {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|e| Error::ConfigIo {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Reject configurations the loop or state machine cannot run with.
    /// Called once at startup; invalid values are fatal here and nowhere
    /// else.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.tick_hz > 0.0) {
            return Err(Error::Config(format!(
                "tick_hz must be positive, got {}",
                self.tick_hz
            )));
        }
        if self.action_interval == 0 {
            return Err(Error::Config("action_interval must be at least 1".into()));
        }
        if self.max_score == 0 {
            return Err(Error::Config("max_score must be at least 1".into()));
        }
        if !(self.ball_speed > 0.0) {
            return Err(Error::Config(format!(
                "ball_speed must be positive, got {}",
                self.ball_speed
            )));
        }
        if self.level_ball_speedup.iter().any(|m| !(*m > 0.0)) {
            return Err(Error::Config(
                "level_ball_speedup multipliers must be positive".into(),
            ));
        }
        if self.presence_window == 0 {
            return Err(Error::Config("presence_window must be at least 1".into()));
        }
        if self.presence_poll_max == 0 {
            return Err(Error::Config("presence_poll_max must be at least 1".into()));
        }
        Ok(())
    }

    /// Wall-clock interval between published ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz)
    }

    /// Ball base speed for a level in `1..=3`
    pub fn ball_speed_for(&self, level: u8) -> f32 {
        let idx = (level.clamp(1, 3) - 1) as usize;
        self.ball_speed * self.level_ball_speedup[idx]
    }
}
