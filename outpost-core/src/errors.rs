//! Error Types for Node Lifecycle and Registration Failures
//!
//! ## Design Philosophy
//!
//! Outpost's error system is designed with embedded systems in mind:
//!
//! 1. **Small Size**: Each error variant is kept minimal (typically 8-16 bytes) since
//!    errors are returned from the tick path and may be stored in tick reports.
//!
//! 2. **No Heap Allocation**: All error data is inline - no String, only &'static str
//!    for reasons. This ensures deterministic memory usage.
//!
//! 3. **Copy Semantics**: Errors implement Copy for efficient return from functions
//!    without move semantics complications.
//!
//! 4. **Actionable Information**: Each error carries enough context to decide the
//!    response without further queries (which handle, how many attempts, which field).
//!
//! ## Error Categories
//!
//! ### Setup Faults
//! - `IdentityUnavailable`: the hardware address query failed, so no device id can
//!   be derived. Fatal at construction; nothing downstream can name its topics.
//! - `FieldTooLong` / `RegistryFull` / `RegistrySealed`: registration misuse,
//!   surfaced to the caller during the setup phase.
//!
//! ### Lifecycle Faults
//! - `AssociationTimeout`: the network link never came up within the configured
//!   attempt budget. Reported through the tick report; the supervisor parks and
//!   re-arms instead of hanging.
//! - `Link` / `Transport`: wrapped collaborator errors. In steady state these are
//!   absorbed into status-line text and the cooldown retry ladder.
//!
//! ### Query Faults
//! - `InvalidHandle`: a registry index out of bounds. Always checked; a stale or
//!   fabricated handle can never reach an unchecked slice access.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use outpost_core::errors::NodeError;
//!
//! fn describe(err: NodeError) -> &'static str {
//!     match err {
//!         NodeError::IdentityUnavailable { .. } => "check radio bring-up order",
//!         NodeError::AssociationTimeout { .. } => "verify access point credentials",
//!         NodeError::InvalidHandle { .. } => "handle from a different registry",
//!         _ => "transient, retried automatically",
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

/// Top-level node errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum NodeError {
    /// Hardware address query failed or returned an all-zero address
    #[error("Device identity unavailable: {reason}")]
    IdentityUnavailable {
        /// What went wrong while deriving the identity
        reason: &'static str,
    },

    /// Network link never associated within the configured attempt budget
    #[error("Association timed out after {attempts} attempts")]
    AssociationTimeout {
        /// Attempts made before parking
        attempts: u8,
    },

    /// Registry has no room for another topic
    #[error("Topic registry full (capacity {capacity})")]
    RegistryFull {
        /// Fixed capacity of the namespace that rejected the entry
        capacity: usize,
    },

    /// Handle does not refer to a registered entry
    #[error("Invalid handle {index} (registry has {len} entries)")]
    InvalidHandle {
        /// Index carried by the handle
        index: usize,
        /// Number of entries in the addressed namespace
        len: usize,
    },

    /// A string input exceeds its fixed capacity
    #[error("{field} exceeds {max} bytes")]
    FieldTooLong {
        /// Which input overflowed
        field: &'static str,
        /// Capacity in bytes
        max: usize,
    },

    /// Registration attempted after the run loop started
    #[error("Topic registry is sealed once the form is laid out")]
    RegistrySealed,

    /// Network link fault
    #[error("Link: {0}")]
    Link(#[from] LinkError),

    /// Messaging transport fault
    #[error("Transport: {0}")]
    Transport(#[from] TransportError),
}

/// Network link errors reported by radio drivers
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum LinkError {
    /// The interface cannot report a hardware address
    #[error("Hardware address unavailable")]
    AddressUnavailable,

    /// Association with the access point was rejected or failed to start
    #[error("Join failed: {reason}")]
    JoinFailed {
        /// What the driver reported
        reason: &'static str,
    },
}

/// Messaging transport errors reported by transport implementations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Session establishment was refused or the endpoint is unreachable
    #[error("Connect failed: {reason}")]
    ConnectFailed {
        /// What the transport reported
        reason: &'static str,
    },

    /// Operation requires an active session
    #[error("Not connected")]
    NotConnected,

    /// Outbound message was not accepted
    #[error("Publish failed: {reason}")]
    PublishFailed {
        /// What the transport reported
        reason: &'static str,
    },

    /// Subscription was not accepted
    #[error("Subscribe failed: {reason}")]
    SubscribeFailed {
        /// What the transport reported
        reason: &'static str,
    },
}

/// Time-sync errors from the NTP codec and poller
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum NtpError {
    /// Response shorter than a full NTP packet
    #[error("Short packet: {len} bytes")]
    ShortPacket {
        /// Bytes actually received
        len: usize,
    },

    /// Transmit-timestamp field was zero; subtracting the epoch offset would
    /// wrap, so the response is rejected instead of producing a bogus time
    #[error("Zero transmit timestamp in response")]
    ZeroTimestamp,

    /// No response arrived within the response window
    #[error("No response before timeout")]
    Timeout,

    /// Datagram socket fault
    #[error("Socket: {reason}")]
    Socket {
        /// What the socket reported
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for NodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::IdentityUnavailable { reason } =>
                defmt::write!(fmt, "identity unavailable: {}", reason),
            Self::AssociationTimeout { attempts } =>
                defmt::write!(fmt, "association timeout after {}", attempts),
            Self::RegistryFull { capacity } =>
                defmt::write!(fmt, "registry full ({})", capacity),
            Self::InvalidHandle { index, len } =>
                defmt::write!(fmt, "invalid handle {} of {}", index, len),
            Self::FieldTooLong { field, max } =>
                defmt::write!(fmt, "{} exceeds {} bytes", field, max),
            Self::RegistrySealed =>
                defmt::write!(fmt, "registry sealed"),
            Self::Link(e) =>
                defmt::write!(fmt, "link: {}", e),
            Self::Transport(e) =>
                defmt::write!(fmt, "transport: {}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::AddressUnavailable =>
                defmt::write!(fmt, "address unavailable"),
            Self::JoinFailed { reason } =>
                defmt::write!(fmt, "join failed: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ConnectFailed { reason } =>
                defmt::write!(fmt, "connect failed: {}", reason),
            Self::NotConnected =>
                defmt::write!(fmt, "not connected"),
            Self::PublishFailed { reason } =>
                defmt::write!(fmt, "publish failed: {}", reason),
            Self::SubscribeFailed { reason } =>
                defmt::write!(fmt, "subscribe failed: {}", reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NtpError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ShortPacket { len } =>
                defmt::write!(fmt, "short packet ({})", len),
            Self::ZeroTimestamp =>
                defmt::write!(fmt, "zero timestamp"),
            Self::Timeout =>
                defmt::write!(fmt, "timeout"),
            Self::Socket { reason } =>
                defmt::write!(fmt, "socket: {}", reason),
        }
    }
}
