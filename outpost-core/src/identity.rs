//! Device identity derived from the network hardware address
//!
//! Every topic string ends with the device id, and the messaging session
//! uses it as the client identifier, so it must exist before any
//! registration happens. The id is the 48-bit hardware address rendered
//! as 12 uppercase hex characters with separators stripped:
//! `A1:B2:C3:D4:E5:F6` becomes `A1B2C3D4E5F6`.
//!
//! An interface that cannot produce an address (or reports the all-zero
//! address some radios return before bring-up) is a startup fault, not
//! something to paper over with an empty id.

use core::fmt;

use crate::errors::NodeError;
use crate::link::NetworkLink;

/// Length of a rendered device id in bytes
pub const DEVICE_ID_LEN: usize = 12;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Compact device identifier (12 uppercase hex characters)
///
/// Stored inline; no heap, `Copy`, and cheap to embed in topic strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    bytes: [u8; DEVICE_ID_LEN],
}

impl DeviceId {
    /// Derive the id from a raw 6-byte hardware address
    ///
    /// Rejects the all-zero address: radios report it when queried before
    /// initialization, and an id built from it would collide across every
    /// such device.
    pub fn from_mac(mac: [u8; 6]) -> Result<Self, NodeError> {
        if mac == [0u8; 6] {
            return Err(NodeError::IdentityUnavailable {
                reason: "hardware address is all zeros",
            });
        }

        let mut bytes = [0u8; DEVICE_ID_LEN];
        for (i, b) in mac.iter().enumerate() {
            bytes[i * 2] = HEX[(b >> 4) as usize];
            bytes[i * 2 + 1] = HEX[(b & 0x0F) as usize];
        }

        Ok(Self { bytes })
    }

    /// Derive the id from a link's hardware address
    ///
    /// The interface must be initialized far enough to answer the query;
    /// a failure here is a startup fault.
    pub fn from_link(link: &mut dyn NetworkLink) -> Result<Self, NodeError> {
        let mac = link
            .hardware_address()
            .map_err(|_| NodeError::IdentityUnavailable {
                reason: "hardware address query failed",
            })?;
        Self::from_mac(mac)
    }

    /// Parse a textual address, stripping `:` and `-` separators
    ///
    /// Accepts `A1:B2:C3:D4:E5:F6`, `a1-b2-c3-d4-e5-f6`, or the bare
    /// 12-character form. Lowercase digits are uppercased.
    pub fn parse(text: &str) -> Result<Self, NodeError> {
        let mut bytes = [0u8; DEVICE_ID_LEN];
        let mut len = 0;

        for ch in text.bytes() {
            match ch {
                b':' | b'-' => continue,
                b'0'..=b'9' | b'A'..=b'F' | b'a'..=b'f' => {
                    if len == DEVICE_ID_LEN {
                        return Err(NodeError::IdentityUnavailable {
                            reason: "address has more than 12 hex digits",
                        });
                    }
                    bytes[len] = ch.to_ascii_uppercase();
                    len += 1;
                }
                _ => {
                    return Err(NodeError::IdentityUnavailable {
                        reason: "address contains a non-hex character",
                    });
                }
            }
        }

        if len != DEVICE_ID_LEN {
            return Err(NodeError::IdentityUnavailable {
                reason: "address has fewer than 12 hex digits",
            });
        }

        Ok(Self { bytes })
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        // Only ASCII hex digits are ever stored
        debug_assert!(self.bytes.iter().all(u8::is_ascii_hexdigit));
        core::str::from_utf8(&self.bytes).unwrap_or("")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.as_str())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceId {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_str());
    }
}
