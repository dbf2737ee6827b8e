//! Messaging transport seam and the inbound command dispatch point
//!
//! ## Overview
//!
//! The engine owns *when* to connect, publish, and service the session; the
//! wire protocol itself lives behind [`Transport`]. An implementation wraps
//! whatever client library the platform provides (an MQTT client on hosts,
//! a vendor socket stack on bare metal) and keeps every call non-blocking
//! except [`Transport::connect`], which runs only inside the throttled
//! reconnect path.
//!
//! ## Sessions and Last Will
//!
//! [`Session`] carries everything the broker needs at connect time: the
//! client identifier (the device id) and an optional [`LastWill`]. The will
//! is how "OFFLINE" presence works; the device itself never publishes it.
//! If the session dies uncleanly the broker delivers the will on the status
//! topic, retained, so late subscribers still see the device as offline.
//!
//! ## Inbound Commands
//!
//! Messages arriving on subscribed topics are handed to a
//! [`CommandHandler`] during [`Transport::service`]. The handler is a
//! dispatch point registered at setup; what commands mean is up to the
//! application. [`NullHandler`] ignores everything and is the default.

use crate::errors::TransportError;

/// Delivery guarantee for a published message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QoS {
    /// Fire and forget
    AtMostOnce,
    /// Acknowledged, may duplicate
    AtLeastOnce,
    /// Acknowledged, exactly once
    ExactlyOnce,
}

/// Testament the broker delivers if the session dies uncleanly
#[derive(Debug, Clone, Copy)]
pub struct LastWill<'a> {
    /// Topic the will is published on
    pub topic: &'a str,
    /// Will payload
    pub payload: &'a [u8],
    /// Delivery guarantee for the will
    pub qos: QoS,
    /// Whether the broker retains the will for late subscribers
    pub retain: bool,
}

/// Connect-time session descriptor
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    /// Client identifier, unique per device
    pub client_id: &'a str,
    /// Optional last will registered with the broker
    pub will: Option<LastWill<'a>>,
}

/// Receiver for inbound messages on subscribed topics
pub trait CommandHandler {
    /// Called once per inbound message during transport servicing
    fn on_command(&mut self, topic: &str, payload: &[u8]);
}

/// Handler that ignores every command
pub struct NullHandler;

impl CommandHandler for NullHandler {
    fn on_command(&mut self, _topic: &str, _payload: &[u8]) {}
}

/// Narrow interface over a pub/sub messaging client
///
/// The server endpoint is implementation configuration, fixed when the
/// transport is constructed; a session can never be opened against an
/// unset server.
pub trait Transport {
    /// Open a session described by `session`
    ///
    /// The only call allowed to take real time. It runs inside the
    /// cooldown-throttled reconnect path, never more than once per window.
    fn connect(&mut self, session: &Session<'_>) -> Result<(), TransportError>;

    /// Publish a message on `topic`
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError>;

    /// Subscribe to an inbound topic
    ///
    /// Subscriptions do not survive reconnects; the engine re-issues them
    /// after every successful `connect`.
    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError>;

    /// Service session I/O: keepalive and inbound dispatch (non-blocking)
    ///
    /// Drains any pending inbound messages into `handler`. Returning an
    /// error means the session is no longer usable and the engine should
    /// fall back to the reconnect path.
    fn service(&mut self, handler: &mut dyn CommandHandler) -> Result<(), TransportError>;

    /// Whether a session is currently active
    fn is_connected(&self) -> bool;
}
