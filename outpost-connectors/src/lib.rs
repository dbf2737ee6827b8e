//! Host-Side Protocol Adapters for Outpost Nodes
//!
//! ## Overview
//!
//! `outpost-core` drives the whole device lifecycle against narrow traits:
//! [`Transport`](outpost_core::transport::Transport) for pub/sub messaging,
//! [`DatagramSocket`](outpost_core::ntp::DatagramSocket) for time sync, and
//! so on. On microcontrollers those traits wrap vendor network stacks; this
//! crate provides the `std` implementations so the same engine runs on
//! gateways, test rigs, and development hosts against real brokers and
//! real NTP servers.
//!
//! ## MQTT
//!
//! [`MqttTransport`] adapts the `rumqttc` synchronous client.
//!
//! **Session model:**
//! - Every `connect` call builds a fresh client and tears down the previous
//!   one. The engine owns reconnection (with its cooldown ladder), so the
//!   library's own retry behavior never gets a chance to run.
//! - The last will from the session descriptor is registered with the broker
//!   at connect time; it is the only way an "offline" presence message is
//!   ever produced.
//! - `service` drains pending events without blocking and hands inbound
//!   publishes to the registered command handler. A session-level error marks
//!   the transport dead and the engine falls back to the reconnect path.
//!
//! ## SNTP
//!
//! [`UdpDatagramSocket`] puts a non-blocking UDP socket behind the core's
//! datagram seam, and [`UdpNtpClock`] bundles it with the system tick source
//! into a ready-to-use clock:
//!
//! ```no_run
//! use outpost_connectors::UdpNtpClock;
//!
//! let clock = UdpNtpClock::connect("pool.ntp.org:123")?;
//! # let _ = clock;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use outpost_connectors::{MqttTransport, MqttTransportConfig};
//!
//! // Configure the broker endpoint once; sessions are opened later by the
//! // lifecycle engine, never here.
//! let transport = MqttTransport::new(
//!     MqttTransportConfig::new("broker.local").port(1883),
//! );
//! # let _ = transport;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "sntp")]
pub mod ntp;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttTransport, MqttTransportConfig};

#[cfg(feature = "sntp")]
pub use ntp::{UdpDatagramSocket, UdpNtpClock};

#[cfg(feature = "std")]
use thiserror::Error;

/// Errors raised while constructing host-side adapters
///
/// Once an adapter is built, runtime faults are reported through the core
/// error types its trait defines; this covers setup only.
#[cfg(feature = "std")]
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Socket setup failed before any exchange started
    #[error("Socket setup: {0}")]
    Socket(#[from] std::io::Error),
}
