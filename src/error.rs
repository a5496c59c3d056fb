//! Error taxonomy for the exhibit coordinator
//!
//! Per-tick and per-message failures are absorbed and logged where they
//! occur; only configuration errors are allowed to be fatal, and only at
//! startup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bus unreachable or a publish/subscribe call failed. The tick loop
    /// degrades to hold-last-input instead of propagating this.
    #[error("transport error: {0}")]
    Transport(#[from] rumqttc::ClientError),

    /// Inbound payload missing or carrying an invalid field. Dropped and
    /// logged at the channel boundary, never raised into the loop.
    #[error("malformed message on {topic}: {source}")]
    MalformedMessage {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid numeric configuration (non-positive tick rate, empty
    /// windows). Fatal at startup only.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Config file could not be read or parsed.
    #[error("failed to load config from {path}: {reason}")]
    ConfigIo { path: String, reason: String },
}
