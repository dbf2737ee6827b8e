//! Core engine for Outpost sensor nodes
//!
//! Drives a microcontroller-class sensor node: WiFi association, pub/sub
//! connectivity with presence reporting, a small display form, and a
//! wall clock, all from one cooperative run loop.
//!
//! Key constraints:
//! - Single control loop, nothing inside a tick blocks
//! - Fixed-capacity storage throughout, no allocator required
//! - Hardware behind narrow traits (link, transport, display, clock)
//!
//! ```no_run
//! use outpost_core::{DeviceId, Node, NodeConfig};
//!
//! # fn main() -> Result<(), outpost_core::NodeError> {
//! let config = NodeConfig::new("kw_sensors")?
//!     .access_point("homenet", "secret")?;
//!
//! let id = DeviceId::parse("A1:B2:C3:D4:E5:F6")?;
//! let mut node = Node::with_device_id(config, id)?;
//!
//! let temp = node.register_data_topic("Temp", "C", "temp", "outdoor")?;
//! assert_eq!(temp.index(), 0);
//! # Ok(()) }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod display;
pub mod errors;
pub mod form;
pub mod identity;
pub mod lifecycle;
pub mod link;
pub mod node;
pub mod ntp;
pub mod time;
pub mod topics;
pub mod transport;

// Public API
pub use config::{ApCredentials, Capabilities, ClockCadence, FormStyle, NodeConfig};
pub use errors::{NodeError, NodeResult};
pub use identity::DeviceId;
pub use lifecycle::{LinkState, StepOutcome};
pub use node::{Node, Peripherals, Reading, TickReport};
pub use topics::{DataHandle, MetaHandle, TopicRegistry};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
