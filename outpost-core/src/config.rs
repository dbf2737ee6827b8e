//! Node configuration and capability selection
//!
//! One engine serves every hardware variant; the differences (how often the
//! clock line refreshes, whether the display carries a labeled form or just
//! a status line) are data in [`Capabilities`], not subclasses. Transport
//! and clock variants are chosen by which trait implementations the caller
//! wires in.
//!
//! Defaults follow the deployed firmware: a 5 second reconnect cooldown and
//! up to three candidate access points tried in rotation.

use heapless::{String, Vec};

use crate::errors::{NodeError, NodeResult};

/// Maximum number of candidate access points
pub const MAX_ACCESS_POINTS: usize = 3;

/// Maximum SSID length in bytes (802.11 limit)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum passphrase length in bytes (WPA2 limit)
pub const MAX_PASSPHRASE_LEN: usize = 64;

/// Default minimum gap between transport reconnect attempts
pub const RECONNECT_COOLDOWN_MS: u32 = 5_000;

/// Default window for one association attempt before rotating access points
pub const ASSOCIATION_TIMEOUT_MS: u32 = 15_000;

/// Default association attempts before parking in the failed state
pub const MAX_ASSOCIATION_ATTEMPTS: u8 = 3;

/// Credentials for one candidate access point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApCredentials {
    ssid: String<MAX_SSID_LEN>,
    passphrase: String<MAX_PASSPHRASE_LEN>,
}

impl ApCredentials {
    /// Store credentials, rejecting oversized inputs
    pub fn new(ssid: &str, passphrase: &str) -> NodeResult<Self> {
        let mut stored_ssid = String::new();
        stored_ssid.push_str(ssid).map_err(|_| NodeError::FieldTooLong {
            field: "ssid",
            max: MAX_SSID_LEN,
        })?;

        let mut stored_passphrase = String::new();
        stored_passphrase
            .push_str(passphrase)
            .map_err(|_| NodeError::FieldTooLong {
                field: "passphrase",
                max: MAX_PASSPHRASE_LEN,
            })?;

        Ok(Self {
            ssid: stored_ssid,
            passphrase: stored_passphrase,
        })
    }

    /// Network name
    pub fn ssid(&self) -> &str {
        self.ssid.as_str()
    }

    /// Passphrase (empty for open networks)
    pub fn passphrase(&self) -> &str {
        self.passphrase.as_str()
    }
}

/// How the clock line on the status row is refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockCadence {
    /// Re-render when the formatted time changes (wall-clock equality check)
    OnSecondChange,
    /// Re-render on a fixed software timer, as RTC builds do
    FixedInterval {
        /// Interval between refreshes
        period_ms: u32,
    },
}

/// What the display carries besides the status row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormStyle {
    /// One labeled row per data topic with a value cell and unit column
    LabeledRows,
    /// Status row only; value updates are ignored
    StatusOnly,
}

/// Capability set selecting per-build behavior of the shared engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capabilities {
    /// Clock refresh policy
    pub clock_cadence: ClockCadence,
    /// Display form layout
    pub form: FormStyle,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            clock_cadence: ClockCadence::OnSecondChange,
            form: FormStyle::LabeledRows,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// First segment of every composed topic
    pub topic_root: String<{ crate::topics::MAX_ROOT_LEN }>,
    /// Candidate access points, tried in rotation
    pub access_points: Vec<ApCredentials, MAX_ACCESS_POINTS>,
    /// Window for one association attempt
    pub association_timeout_ms: u32,
    /// Association attempts before parking
    pub max_association_attempts: u8,
    /// Minimum gap between transport reconnect attempts
    pub reconnect_cooldown_ms: u32,
    /// Per-build behavior selection
    pub capabilities: Capabilities,
}

impl NodeConfig {
    /// Create a configuration with default timing and capabilities
    pub fn new(topic_root: &str) -> NodeResult<Self> {
        let mut root = String::new();
        root.push_str(topic_root).map_err(|_| NodeError::FieldTooLong {
            field: "topic root",
            max: crate::topics::MAX_ROOT_LEN,
        })?;

        Ok(Self {
            topic_root: root,
            access_points: Vec::new(),
            association_timeout_ms: ASSOCIATION_TIMEOUT_MS,
            max_association_attempts: MAX_ASSOCIATION_ATTEMPTS,
            reconnect_cooldown_ms: RECONNECT_COOLDOWN_MS,
            capabilities: Capabilities::default(),
        })
    }

    /// Add a candidate access point
    pub fn access_point(mut self, ssid: &str, passphrase: &str) -> NodeResult<Self> {
        let ap = ApCredentials::new(ssid, passphrase)?;
        self.access_points.push(ap).map_err(|_| NodeError::RegistryFull {
            capacity: MAX_ACCESS_POINTS,
        })?;
        Ok(self)
    }

    /// Override the reconnect cooldown
    pub fn reconnect_cooldown_ms(mut self, ms: u32) -> Self {
        self.reconnect_cooldown_ms = ms;
        self
    }

    /// Override the association attempt window
    pub fn association_timeout_ms(mut self, ms: u32) -> Self {
        self.association_timeout_ms = ms;
        self
    }

    /// Override the association attempt budget
    pub fn max_association_attempts(mut self, attempts: u8) -> Self {
        self.max_association_attempts = attempts;
        self
    }

    /// Select the clock refresh policy
    pub fn clock_cadence(mut self, cadence: ClockCadence) -> Self {
        self.capabilities.clock_cadence = cadence;
        self
    }

    /// Select the display form layout
    pub fn form_style(mut self, form: FormStyle) -> Self {
        self.capabilities.form = form;
        self
    }
}
