//! MQTT transport backed by the `rumqttc` synchronous client
//!
//! ## Session Ownership
//!
//! The lifecycle engine decides *when* to connect and how long to wait
//! between attempts; `rumqttc` would happily reconnect on its own if its
//! event loop were polled past an error. This adapter suppresses that by
//! construction: every [`Transport::connect`] builds a fresh client pair and
//! drops the old one, and any session-level error reported during
//! [`Transport::service`] marks the session dead so the engine's cooldown
//! path takes over. The broker therefore sees exactly one CONNECT per
//! engine-approved attempt, each carrying the last will.
//!
//! ## Blocking Behavior
//!
//! `connect` is the only call that waits: it blocks until the broker answers
//! the CONNECT, bounded by [`MqttTransportConfig::connack_timeout`]. Every
//! other call either queues work on the client or drains already-arrived
//! events without blocking.

use std::time::{Duration, Instant};

use log::warn;
use outpost_core::errors::TransportError;
use outpost_core::transport::{CommandHandler, QoS, Session, Transport};
use rumqttc::{Client, ConnectReturnCode, Connection, Event, MqttOptions, Packet};

/// Default TCP port for plain MQTT
pub const DEFAULT_PORT: u16 = 1883;

/// Default keepalive interval announced to the broker
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Default window to wait for the broker's ConnAck
pub const DEFAULT_CONNACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the client's outbound request queue
const CLIENT_QUEUE_DEPTH: usize = 10;

/// Broker endpoint and session timing
#[derive(Debug, Clone)]
pub struct MqttTransportConfig {
    host: String,
    port: u16,
    keep_alive: Duration,
    connack_timeout: Duration,
}

impl MqttTransportConfig {
    /// Configuration for `host` with default port and timing
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            port: DEFAULT_PORT,
            keep_alive: DEFAULT_KEEP_ALIVE,
            connack_timeout: DEFAULT_CONNACK_TIMEOUT,
        }
    }

    /// Override the broker port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the keepalive interval
    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = interval;
        self
    }

    /// Override how long `connect` waits for the broker's ConnAck
    pub fn connack_timeout(mut self, window: Duration) -> Self {
        self.connack_timeout = window;
        self
    }
}

struct ActiveSession {
    client: Client,
    connection: Connection,
    connected: bool,
}

/// [`Transport`] implementation over a `rumqttc` client
///
/// The broker endpoint is fixed at construction; sessions against it are
/// opened and torn down through the [`Transport`] seam.
pub struct MqttTransport {
    config: MqttTransportConfig,
    session: Option<ActiveSession>,
}

impl MqttTransport {
    /// Transport for the configured broker, initially disconnected
    pub fn new(config: MqttTransportConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    fn live_session(&mut self) -> Result<&mut ActiveSession, TransportError> {
        self.session
            .as_mut()
            .filter(|s| s.connected)
            .ok_or(TransportError::NotConnected)
    }
}

impl Transport for MqttTransport {
    fn connect(&mut self, session: &Session<'_>) -> Result<(), TransportError> {
        // Drop any previous session first so its event loop can never limp
        // along and reconnect behind the engine's back.
        self.session = None;

        let mut options =
            MqttOptions::new(session.client_id, &self.config.host, self.config.port);
        options.set_keep_alive(self.config.keep_alive);
        // Sessions are always clean; the engine re-issues subscriptions
        // after every connect rather than trusting broker-side state.
        options.set_clean_session(true);

        if let Some(will) = session.will {
            options.set_last_will(rumqttc::LastWill::new(
                will.topic,
                will.payload.to_vec(),
                wire_qos(will.qos),
                will.retain,
            ));
        }

        let (client, mut connection) = Client::new(options, CLIENT_QUEUE_DEPTH);

        // Wait for the broker's answer to the CONNECT, bounded by the
        // configured window. Anything short of an accepting ConnAck is a
        // failed attempt.
        let deadline = Instant::now() + self.config.connack_timeout;
        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(TransportError::ConnectFailed {
                    reason: "no ConnAck before timeout",
                })?;

            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code == ConnectReturnCode::Success {
                        break;
                    }
                    warn!("broker refused session: {:?}", ack.code);
                    return Err(TransportError::ConnectFailed {
                        reason: "broker refused session",
                    });
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => {
                    warn!("mqtt connect failed: {e}");
                    return Err(TransportError::ConnectFailed {
                        reason: "transport fault before ConnAck",
                    });
                }
                Err(_) => {
                    return Err(TransportError::ConnectFailed {
                        reason: "no ConnAck before timeout",
                    });
                }
            }
        }

        self.session = Some(ActiveSession {
            client,
            connection,
            connected: true,
        });
        Ok(())
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        let session = self.live_session()?;
        session
            .client
            .publish(topic, wire_qos(qos), retain, payload.to_vec())
            .map_err(|e| {
                warn!("publish to {topic} failed: {e}");
                TransportError::PublishFailed {
                    reason: "client rejected publish",
                }
            })
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        let session = self.live_session()?;
        session
            .client
            .subscribe(topic, wire_qos(qos))
            .map_err(|e| {
                warn!("subscribe to {topic} failed: {e}");
                TransportError::SubscribeFailed {
                    reason: "client rejected subscribe",
                }
            })
    }

    fn service(&mut self, handler: &mut dyn CommandHandler) -> Result<(), TransportError> {
        let session = self.live_session()?;

        loop {
            match session.connection.try_recv() {
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    handler.on_command(&publish.topic, &publish.payload);
                }
                Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                    session.connected = false;
                    return Err(TransportError::NotConnected);
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => {
                    // Polling past this error would trigger the library's
                    // own reconnect; park the session instead and let the
                    // engine schedule the next attempt.
                    warn!("mqtt session fault: {e}");
                    session.connected = false;
                    return Err(TransportError::NotConnected);
                }
                Err(_) => break,
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.connected)
    }
}

fn wire_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_core::transport::NullHandler;

    /// Bind then immediately release a local port; nothing listens on it
    /// for the duration of the test.
    fn free_local_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn config_defaults_match_plain_mqtt() {
        let config = MqttTransportConfig::new("broker.local");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.keep_alive, DEFAULT_KEEP_ALIVE);
        assert_eq!(config.connack_timeout, DEFAULT_CONNACK_TIMEOUT);
    }

    #[test]
    fn config_overrides_stick() {
        let config = MqttTransportConfig::new("broker.local")
            .port(8883)
            .keep_alive(Duration::from_secs(10))
            .connack_timeout(Duration::from_millis(250));
        assert_eq!(config.port, 8883);
        assert_eq!(config.keep_alive, Duration::from_secs(10));
        assert_eq!(config.connack_timeout, Duration::from_millis(250));
    }

    #[test]
    fn qos_levels_map_one_to_one() {
        assert_eq!(wire_qos(QoS::AtMostOnce), rumqttc::QoS::AtMostOnce);
        assert_eq!(wire_qos(QoS::AtLeastOnce), rumqttc::QoS::AtLeastOnce);
        assert_eq!(wire_qos(QoS::ExactlyOnce), rumqttc::QoS::ExactlyOnce);
    }

    #[test]
    fn calls_before_connect_are_rejected() {
        let mut transport = MqttTransport::new(MqttTransportConfig::new("127.0.0.1"));

        assert!(!transport.is_connected());
        assert_eq!(
            transport.publish("t", b"x", QoS::AtMostOnce, false),
            Err(TransportError::NotConnected)
        );
        assert_eq!(
            transport.subscribe("t", QoS::AtMostOnce),
            Err(TransportError::NotConnected)
        );
        assert_eq!(
            transport.service(&mut NullHandler),
            Err(TransportError::NotConnected)
        );
    }

    #[test]
    fn connect_against_closed_port_fails() {
        let config = MqttTransportConfig::new("127.0.0.1")
            .port(free_local_port())
            .connack_timeout(Duration::from_millis(500));
        let mut transport = MqttTransport::new(config);

        let session = Session {
            client_id: "node-under-test",
            will: None,
        };
        assert!(transport.connect(&session).is_err());
        assert!(!transport.is_connected());
    }
}
