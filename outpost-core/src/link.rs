//! Network link seam: radio drivers behind a narrow trait
//!
//! The engine never talks to a radio directly. It issues a `join`, then
//! polls `status` from the run loop until the link is up, so a driver
//! implementation must not block inside either call. Drivers that can only
//! associate synchronously should spawn the work in `join` and report
//! progress from `status`.

use crate::config::ApCredentials;
use crate::errors::LinkError;

/// Association state of the network link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkStatus {
    /// No association
    Down,
    /// Association in progress
    Joining,
    /// Associated and usable
    Up,
}

/// Narrow interface over a network radio
pub trait NetworkLink {
    /// Hardware address of the interface
    ///
    /// Must be available before association; identities are derived from it
    /// at construction time.
    fn hardware_address(&mut self) -> Result<[u8; 6], LinkError>;

    /// Begin associating with the given access point (non-blocking)
    fn join(&mut self, ap: &ApCredentials) -> Result<(), LinkError>;

    /// Current association state
    fn status(&mut self) -> LinkStatus;
}

/// Local connected/disconnected indicator, typically an LED
pub trait StatusIndicator {
    /// Reflect the transport connection state
    fn set_connected(&mut self, connected: bool);
}

/// Indicator for boards without one
pub struct NullIndicator;

impl StatusIndicator for NullIndicator {
    fn set_connected(&mut self, _connected: bool) {}
}
