//! Game orchestrator: the fixed-tick loop
//!
//! Owns the engine, both players, the bus, and the skew accountants for
//! one process. Single-threaded at its core: the loop reads the latest
//! action per side, steps physics, publishes the snapshot, then sleeps
//! toward the next tick. Pacing is wall-clock best-effort; when behind
//! schedule the sleep is skipped and never caught up, so lag accumulates
//! as skipped sleep rather than slowed gameplay.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, info, warn};

use crate::Config;
use crate::bus::{Bus, QoS};
use crate::channel::SnapshotPublisher;
use crate::player::Player;
use crate::protocol::{LevelPayload, Snapshot, topic};
use crate::session::{ControlSlot, LevelRunner, RunOutcome};
use crate::sim::PhysicsEngine;
use crate::skew::FrameAccountant;

/// Source of the auxiliary visualization feed (depth-camera imagery).
/// The capture pipeline itself lives outside this crate.
pub trait FeedSource: Send {
    /// Most recent encoded frame, if one is available
    fn latest_feed(&mut self) -> Option<String>;
}

/// Composition root for one game process
pub struct GameOrchestrator {
    config: Config,
    bus: Bus,
    /// Paddle 1 (left): camera player, human stand-in, or bot
    left: Player,
    /// Paddle 2 (right): the remote decision policy
    right: Player,
    publisher: SnapshotPublisher,
    control: Arc<ControlSlot>,
    feed_source: Option<Box<dyn FeedSource>>,
}

impl GameOrchestrator {
    pub fn new(
        config: Config,
        bus: Bus,
        left: Player,
        right: Player,
        control: Arc<ControlSlot>,
    ) -> Self {
        Self {
            config,
            bus,
            left,
            right,
            publisher: SnapshotPublisher,
            control,
            feed_source: None,
        }
    }

    pub fn set_feed_source(&mut self, source: Box<dyn FeedSource>) {
        self.feed_source = Some(source);
    }

    /// Play one level to the win condition (or until termination is
    /// requested). Blocks for the whole level-run.
    fn run_level(&mut self, level: u8) -> RunOutcome {
        info!("running level {level}");
        let mut engine = PhysicsEngine::new(&self.config, level);
        let mut skew_left = FrameAccountant::new(self.config.action_interval);
        let mut skew_right = FrameAccountant::new(self.config.action_interval);
        let tick_interval = self.config.tick_interval();

        // Prime the remote actors with an action-requesting snapshot
        self.publisher.publish(
            &self.bus,
            &Snapshot::from_state(engine.state(), level, true),
        );

        let mut terminated = false;
        let mut last_tick_time = Instant::now();
        loop {
            // Termination is checked once per tick boundary, never mid-step
            if self.control.terminate_requested() {
                terminated = true;
                break;
            }

            let action_left = self.left.act(engine.state());
            let action_right = self.right.act(engine.state());

            // Skew against the tick the applied actions were computed on
            let rendered_tick = engine.state().tick;
            skew_left.record(rendered_tick, self.left.acted_frame());
            skew_right.record(rendered_tick, self.right.acted_frame());

            let result = engine.step(action_left, action_right, 1);

            let request_action = result.state.tick % self.config.action_interval == 0;
            self.publisher.publish(
                &self.bus,
                &Snapshot::from_state(&result.state, level, request_action),
            );
            if self.config.publish_depth_feed {
                if let Some(source) = self.feed_source.as_mut() {
                    if let Some(feed) = source.latest_feed() {
                        self.publisher.publish_depth_feed(&self.bus, &feed);
                    }
                }
            }

            if result.done {
                break;
            }

            let next_tick_time = last_tick_time + tick_interval;
            let now = Instant::now();
            if next_tick_time > now {
                thread::sleep(next_tick_time - now);
            } else {
                debug!(
                    "render tick lagging behind by {} ms",
                    (now - next_tick_time).as_millis()
                );
            }
            last_tick_time = Instant::now();
        }

        let state = engine.state();
        let outcome = RunOutcome {
            score: (state.score_left, state.score_right),
            skew_left: skew_left.summary(),
            skew_right: skew_right.summary(),
            terminated,
        };
        info!("score: {} - {}", outcome.score.0, outcome.score.1);
        if let Some(summary) = &outcome.skew_left {
            info!("left actor {summary}");
        }
        if let Some(summary) = &outcome.skew_right {
            info!("right actor {summary}");
        }
        outcome
    }
}

impl LevelRunner for GameOrchestrator {
    fn announce_level(&mut self, level: u8) {
        if let Err(e) = self
            .bus
            .publish(topic::GAME_LEVEL, &LevelPayload { level }, QoS::AtMostOnce)
        {
            warn!("level announcement failed: {e}");
        }
    }

    fn run(&mut self, level: u8) -> RunOutcome {
        self.run_level(level)
    }

    fn shutdown(&mut self) {
        self.bus.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::bus::BusHandler;
    use crate::player::BotPlayer;
    use crate::sim::Side;

    struct NullHandler;
    impl BusHandler for NullHandler {
        fn on_message(&self, _topic: &str, _payload: &[u8]) {}
    }

    struct CountingFeed(Arc<AtomicU64>);
    impl FeedSource for CountingFeed {
        fn latest_feed(&mut self) -> Option<String> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Some("frame-bytes".to_string())
        }
    }

    fn fast_orchestrator(max_score: u32) -> (GameOrchestrator, Arc<ControlSlot>) {
        let mut config = Config::default();
        config.max_score = max_score;
        config.seed = 42;
        // Effectively unpaced so the test finishes quickly; no broker is
        // listening, publishes just drop
        config.tick_hz = 1_000_000.0;

        let control = Arc::new(ControlSlot::new());
        let bus = Bus::connect(&config, Arc::new(NullHandler));
        let orchestrator = GameOrchestrator::new(
            config,
            bus,
            Player::Bot(BotPlayer::new(Side::Left)),
            Player::Bot(BotPlayer::new(Side::Right)),
            Arc::clone(&control),
        );
        (orchestrator, control)
    }

    #[test]
    fn test_level_run_reaches_win_condition() {
        let (mut orchestrator, _control) = fast_orchestrator(1);
        let outcome = orchestrator.run_level(1);
        assert!(!outcome.terminated);
        assert_eq!(outcome.score.0 + outcome.score.1, 1);
        // Bots have no remote pipeline, so no skew samples exist
        assert!(outcome.skew_left.is_none());
        assert!(outcome.skew_right.is_none());
    }

    #[test]
    fn test_feed_source_polled_every_tick_when_enabled() {
        let (mut orchestrator, _control) = fast_orchestrator(1);
        orchestrator.config.publish_depth_feed = true;
        let polls = Arc::new(AtomicU64::new(0));
        orchestrator.set_feed_source(Box::new(CountingFeed(Arc::clone(&polls))));

        orchestrator.run_level(1);
        assert!(polls.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn test_feed_source_idle_when_disabled() {
        let (mut orchestrator, _control) = fast_orchestrator(1);
        let polls = Arc::new(AtomicU64::new(0));
        orchestrator.set_feed_source(Box::new(CountingFeed(Arc::clone(&polls))));

        orchestrator.run_level(1);
        assert_eq!(polls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_pending_terminate_stops_run_immediately() {
        let (mut orchestrator, control) = fast_orchestrator(21);
        control.request_terminate();
        let outcome = orchestrator.run_level(1);
        assert!(outcome.terminated);
        assert_eq!(outcome.score, (0, 0));
    }
}
