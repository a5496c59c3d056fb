//! Remote actor channels: inbound action slots and outbound snapshot fan-out
//!
//! Each remote side (AI policy, depth camera) gets one channel holding at
//! most one pending action: a last-write-wins register, never a queue.
//! The delivery thread is the single writer, the tick loop the single
//! reader, and the reader never blocks on fresh input - a crashed or slow
//! remote actor degrades to hold-last-input, not to a stalled loop.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::bus::{Bus, BusHandler, QoS};
use crate::error::Error;
use crate::protocol::{
    ActionPayload, DepthFeed, FramePayload, LevelPayload, PaddlePosition, PuckPosition, Snapshot,
    topic,
};
use crate::sim::{Action, Side};

#[derive(Debug, Default, Clone, Copy)]
struct SlotState {
    action: Option<Action>,
    frame: Option<u64>,
}

/// Last-write-wins register shared between the delivery thread and the
/// tick loop. Reads are idempotent; storing overwrites any not-yet-read
/// value.
#[derive(Default)]
pub struct ActionSlot {
    inner: Mutex<SlotState>,
}

impl ActionSlot {
    fn store_action(&self, action: Action) {
        if let Ok(mut state) = self.inner.lock() {
            state.action = Some(action);
        }
    }

    fn store_frame(&self, frame: u64) {
        if let Ok(mut state) = self.inner.lock() {
            state.frame = Some(frame);
        }
    }

    /// Latest action, or the documented default when nothing has arrived
    pub fn action(&self) -> Action {
        self.inner
            .lock()
            .map(|state| state.action.unwrap_or_default())
            .unwrap_or_default()
    }

    /// Frame echo of the most recent action message, for lag accounting
    pub fn frame(&self) -> Option<u64> {
        self.inner.lock().ok().and_then(|state| state.frame)
    }
}

/// Protocol adapter for one remote side
pub struct RemoteActorChannel {
    side: Side,
    slot: Arc<ActionSlot>,
}

impl RemoteActorChannel {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            slot: Arc::new(ActionSlot::default()),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn slot(&self) -> Arc<ActionSlot> {
        Arc::clone(&self.slot)
    }

    /// Latest remote action; `Action::None` until the first message lands.
    /// Never blocks and never consumes - reading twice without a new
    /// arrival returns the same value.
    pub fn act(&self) -> Action {
        self.slot.action()
    }

    /// Snapshot tick the most recent action was computed against
    pub fn acted_frame(&self) -> Option<u64> {
        self.slot.frame()
    }
}

/// Bus handler routing inbound action/frame topics into the per-side slots.
/// Malformed payloads are dropped and logged here; nothing propagates into
/// the orchestration loop.
pub struct ActorRouter {
    camera: Arc<ActionSlot>,
    ai: Arc<ActionSlot>,
}

impl ActorRouter {
    /// `camera` feeds paddle1 (left), `ai` feeds paddle2 (right)
    pub fn new(camera: Arc<ActionSlot>, ai: Arc<ActionSlot>) -> Self {
        Self { camera, ai }
    }

    fn route(&self, topic_name: &str, payload: &[u8]) -> Result<(), Error> {
        let malformed = |source| Error::MalformedMessage {
            topic: topic_name.to_string(),
            source,
        };
        match topic_name {
            topic::PADDLE1_ACTION | topic::PADDLE2_ACTION => {
                let decoded: ActionPayload = serde_json::from_slice(payload).map_err(malformed)?;
                let Some(action) = Action::from_wire(decoded.action) else {
                    warn!("dropping unknown action code {} on {topic_name}", decoded.action);
                    return Ok(());
                };
                let slot = if topic_name == topic::PADDLE1_ACTION {
                    &self.camera
                } else {
                    &self.ai
                };
                slot.store_action(action);
            }
            topic::PADDLE1_FRAME | topic::PADDLE2_FRAME => {
                let decoded: FramePayload = serde_json::from_slice(payload).map_err(malformed)?;
                let slot = if topic_name == topic::PADDLE1_FRAME {
                    &self.camera
                } else {
                    &self.ai
                };
                slot.store_frame(decoded.frame);
            }
            other => debug!("ignoring message on unexpected topic {other}"),
        }
        Ok(())
    }
}

impl BusHandler for ActorRouter {
    fn on_message(&self, topic: &str, payload: &[u8]) {
        if let Err(e) = self.route(topic, payload) {
            warn!("dropping inbound message: {e}");
        }
    }
}

/// Subscribe the inbound actor topics
pub fn subscribe_actor_topics(bus: &Bus) -> Result<(), Error> {
    for name in [
        topic::PADDLE1_ACTION,
        topic::PADDLE2_ACTION,
        topic::PADDLE1_FRAME,
        topic::PADDLE2_FRAME,
    ] {
        bus.subscribe(name)?;
    }
    Ok(())
}

/// Fans one snapshot out across the outbound topic set.
/// Position and level go out every tick; the frame topic only on
/// action-request ticks, since it is what triggers remote inference.
pub struct SnapshotPublisher;

impl SnapshotPublisher {
    pub fn publish(&self, bus: &Bus, snapshot: &Snapshot) {
        // At-most-once everywhere: each payload is superseded next tick
        let puck = PuckPosition {
            x: snapshot.ball.0,
            y: snapshot.ball.1,
        };
        let results = [
            bus.publish(topic::PUCK_POSITION, &puck, QoS::AtMostOnce),
            bus.publish(
                topic::PADDLE1_POSITION,
                &PaddlePosition {
                    position: snapshot.paddles.0,
                },
                QoS::AtMostOnce,
            ),
            bus.publish(
                topic::PADDLE2_POSITION,
                &PaddlePosition {
                    position: snapshot.paddles.1,
                },
                QoS::AtMostOnce,
            ),
            bus.publish(
                topic::GAME_LEVEL,
                &LevelPayload {
                    level: snapshot.level,
                },
                QoS::AtMostOnce,
            ),
        ];
        for result in results {
            if let Err(e) = result {
                warn!("snapshot publish failed: {e}");
            }
        }

        if snapshot.request_action {
            let frame = FramePayload {
                frame: snapshot.tick,
            };
            if let Err(e) = bus.publish(topic::GAME_FRAME, &frame, QoS::AtMostOnce) {
                warn!("frame publish failed: {e}");
            }
        }
    }

    /// Auxiliary feed for the web visualization, published every tick when
    /// a feed is configured
    pub fn publish_depth_feed(&self, bus: &Bus, feed: &str) {
        let payload = DepthFeed {
            feed: feed.to_string(),
        };
        if let Err(e) = bus.publish(topic::DEPTH_FEED, &payload, QoS::AtMostOnce) {
            warn!("depth feed publish failed: {e}");
        }
    }
}
