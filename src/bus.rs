//! Message bus: thin reliability wrapper over the MQTT transport
//!
//! Inbound delivery runs on a dedicated thread owned by the `Bus`, never on
//! the caller of `publish`. Handlers are explicit objects registered at
//! connect time; they operate only on their own slots, so no mutable
//! closure state is shared with the tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};
use rumqttc::{Client, Event, MqttOptions, Packet};
use serde::Serialize;

use crate::Config;
use crate::error::Error;

pub use rumqttc::QoS;

/// Receives every inbound publish from the delivery thread.
/// Implementations must absorb their own errors; a handler can never fail
/// the delivery loop.
pub trait BusHandler: Send + Sync {
    fn on_message(&self, topic: &str, payload: &[u8]);
}

/// Connected transport handle. Publishing is fire-and-forget beyond the
/// chosen QoS; the broker handshake and reconnects run with the transport's
/// own retry policy on the delivery thread.
pub struct Bus {
    client: Client,
    closing: Arc<AtomicBool>,
    delivery: Option<JoinHandle<()>>,
}

impl Bus {
    /// Open the transport and spawn the delivery thread dispatching into
    /// `handler`. The broker connection is established (and re-established)
    /// in the background; publishes made before it settles are queued.
    pub fn connect(config: &Config, handler: Arc<dyn BusHandler>) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(60));

        let (client, mut connection) = Client::new(options, 64);
        let closing = Arc::new(AtomicBool::new(false));

        let thread_closing = Arc::clone(&closing);
        let delivery = thread::Builder::new()
            .name("bus-delivery".into())
            .spawn(move || {
                for event in connection.iter() {
                    if thread_closing.load(Ordering::Acquire) {
                        break;
                    }
                    match event {
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            handler.on_message(&publish.topic, &publish.payload);
                        }
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            info!("connected to broker");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!("transport error, retrying: {e}");
                            // The iterator reconnects internally; pace the
                            // retries so a dead broker doesn't spin a core
                            thread::sleep(Duration::from_millis(250));
                        }
                    }
                }
                debug!("delivery thread exiting");
            })
            .expect("failed to spawn bus delivery thread");

        Self {
            client,
            closing,
            delivery: Some(delivery),
        }
    }

    pub fn subscribe(&self, topic: &str) -> Result<(), Error> {
        self.client.subscribe(topic, QoS::AtMostOnce)?;
        Ok(())
    }

    /// Serialize `payload` as a field-named JSON record and publish it.
    /// Never blocks: when the outbound queue is full (broker down), the
    /// publish is dropped with an error instead of stalling the tick loop.
    pub fn publish<T: Serialize>(&self, topic: &str, payload: &T, qos: QoS) -> Result<(), Error> {
        let bytes = serde_json::to_vec(payload).map_err(|source| Error::MalformedMessage {
            topic: topic.to_string(),
            source,
        })?;
        self.client.try_publish(topic, qos, false, bytes)?;
        Ok(())
    }

    /// Tear down the transport and unblock the delivery loop. Idempotent;
    /// safe to call from shutdown paths that may run more than once.
    pub fn disconnect(&mut self) {
        if self.closing.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.client.try_disconnect() {
            warn!("disconnect request failed (already down?): {e}");
        }
        if let Some(handle) = self.delivery.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        self.disconnect();
    }
}
