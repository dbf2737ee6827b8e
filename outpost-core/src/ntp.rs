//! NTP client: request codec and non-blocking sync poller
//!
//! ## Wire Format
//!
//! The node speaks plain SNTP: one 48-byte request, one 48-byte response,
//! UDP port 123. Only the transmit-timestamp seconds matter on the way
//! back; everything else in the response is ignored.
//!
//! ```text
//! offset  field
//! 0       LI=3 (unsynchronized), VN=4, Mode=3 (client)  -> 0b1110_0011
//! 1       stratum (0 in requests)
//! 2       poll exponent (6)
//! 3       precision (0xEC)
//! 12..16  reference identifier
//! 40..44  transmit timestamp, seconds since 1900-01-01 (big-endian u32)
//! ```
//!
//! NTP counts seconds from 1900; unix time from 1970. The difference,
//! [`UNIX_EPOCH_OFFSET`], is subtracted after parsing. A zero transmit
//! timestamp would wrap below the epoch, so it is rejected as
//! [`NtpError::ZeroTimestamp`] and the clock keeps its previous state.
//!
//! ## Polling Model
//!
//! [`SntpPoller`] is a pull-based state machine driven from the run loop
//! with `nb` semantics: every call is a single non-blocking step, and
//! `WouldBlock` means "nothing to report yet". One exchange is attempted
//! per resync interval (default 60 s), with a 3 s response window. Between
//! successful exchanges the clock free-runs, extrapolating from the last
//! sync point against monotonic ticks.

use crate::clock::{ClockReading, ClockSource, WallClock};
use crate::errors::NtpError;
use crate::time::{TickSource, Ticks};

/// NTP packet length in bytes
pub const PACKET_LEN: usize = 48;

/// UDP port NTP servers listen on
pub const NTP_PORT: u16 = 123;

/// Seconds between the NTP epoch (1900) and the unix epoch (1970)
pub const UNIX_EPOCH_OFFSET: u64 = 2_208_988_800;

/// How long to wait for a server response before giving up
pub const RESPONSE_TIMEOUT_MS: u32 = 3_000;

/// Default interval between sync attempts
pub const RESYNC_INTERVAL_MS: u32 = 60_000;

/// Fill `buf` with a client mode sync request
pub fn build_request(buf: &mut [u8; PACKET_LEN]) {
    buf.fill(0);
    buf[0] = 0b1110_0011; // LI, version, mode
    buf[1] = 0; // stratum
    buf[2] = 6; // poll exponent
    buf[3] = 0xEC; // precision
    buf[12] = 49;
    buf[13] = 0x4E;
    buf[14] = 49;
    buf[15] = 52;
}

/// Extract the transmit timestamp from a response as unix seconds
pub fn parse_transmit_time(packet: &[u8]) -> Result<u64, NtpError> {
    if packet.len() < PACKET_LEN {
        return Err(NtpError::ShortPacket { len: packet.len() });
    }

    let raw = u32::from_be_bytes([packet[40], packet[41], packet[42], packet[43]]) as u64;
    raw.checked_sub(UNIX_EPOCH_OFFSET)
        .ok_or(NtpError::ZeroTimestamp)
}

/// Non-blocking datagram socket, already bound to the server endpoint
///
/// `WouldBlock` from either call means "try again next tick"; real faults
/// use [`NtpError::Socket`].
pub trait DatagramSocket {
    /// Send one datagram
    fn send(&mut self, buf: &[u8]) -> nb::Result<(), NtpError>;

    /// Receive one datagram into `buf`, returning its length
    fn recv(&mut self, buf: &mut [u8]) -> nb::Result<usize, NtpError>;
}

#[derive(Debug, Clone, Copy)]
enum PollState {
    Idle,
    Awaiting { sent_at: Ticks },
}

#[derive(Debug, Clone, Copy)]
struct SyncPoint {
    unix: u64,
    at: Ticks,
}

/// SNTP exchange state machine
#[derive(Debug)]
pub struct SntpPoller {
    state: PollState,
    last_attempt: Option<Ticks>,
    sync: Option<SyncPoint>,
    resync_interval_ms: u32,
}

impl SntpPoller {
    pub fn new() -> Self {
        Self {
            state: PollState::Idle,
            last_attempt: None,
            sync: None,
            resync_interval_ms: RESYNC_INTERVAL_MS,
        }
    }

    /// Override the interval between sync attempts
    pub fn resync_interval_ms(mut self, ms: u32) -> Self {
        self.resync_interval_ms = ms;
        self
    }

    /// Whether any exchange has ever completed
    pub fn synchronized(&self) -> bool {
        self.sync.is_some()
    }

    /// Unix time extrapolated from the last sync point, if any
    pub fn unix_now(&self, now: Ticks) -> Option<u64> {
        self.sync
            .map(|s| s.unix + now.saturating_sub(s.at) / 1_000)
    }

    /// Drive the exchange one non-blocking step
    ///
    /// Returns `Ok(unix)` exactly once per completed exchange. Timeouts and
    /// malformed responses surface as errors, reset the machine, and leave
    /// the next attempt to the resync schedule.
    pub fn poll<S: DatagramSocket>(
        &mut self,
        socket: &mut S,
        now: Ticks,
    ) -> nb::Result<u64, NtpError> {
        match self.state {
            PollState::Idle => {
                if !self.attempt_due(now) {
                    return Err(nb::Error::WouldBlock);
                }

                // Drain responses left over from an earlier exchange so a
                // stale timestamp cannot answer this request.
                let mut scratch = [0u8; PACKET_LEN];
                loop {
                    match socket.recv(&mut scratch) {
                        Ok(_) => continue,
                        Err(nb::Error::WouldBlock) => break,
                        Err(nb::Error::Other(e)) => return Err(nb::Error::Other(e)),
                    }
                }

                let mut request = [0u8; PACKET_LEN];
                build_request(&mut request);
                socket.send(&request)?;

                self.last_attempt = Some(now);
                self.state = PollState::Awaiting { sent_at: now };
                Err(nb::Error::WouldBlock)
            }
            PollState::Awaiting { sent_at } => {
                let mut response = [0u8; PACKET_LEN];
                match socket.recv(&mut response) {
                    Ok(len) => {
                        self.state = PollState::Idle;
                        if len < PACKET_LEN {
                            return Err(nb::Error::Other(NtpError::ShortPacket { len }));
                        }
                        let unix = parse_transmit_time(&response)?;
                        self.sync = Some(SyncPoint { unix, at: now });
                        Ok(unix)
                    }
                    Err(nb::Error::WouldBlock) => {
                        if now.saturating_sub(sent_at) >= RESPONSE_TIMEOUT_MS as u64 {
                            self.state = PollState::Idle;
                            return Err(nb::Error::Other(NtpError::Timeout));
                        }
                        Err(nb::Error::WouldBlock)
                    }
                    Err(nb::Error::Other(e)) => {
                        self.state = PollState::Idle;
                        Err(nb::Error::Other(e))
                    }
                }
            }
        }
    }

    fn attempt_due(&self, now: Ticks) -> bool {
        match self.last_attempt {
            None => true,
            Some(at) => now.saturating_sub(at) >= self.resync_interval_ms as u64,
        }
    }
}

impl Default for SntpPoller {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock source backed by an SNTP poller over a datagram socket
///
/// Drives one poll step per reading. Exchange failures are absorbed; the
/// reading simply stays unsynchronized (or extrapolated) until the next
/// scheduled attempt succeeds.
pub struct SntpClock<S: DatagramSocket, T: TickSource> {
    poller: SntpPoller,
    socket: S,
    ticks: T,
}

impl<S: DatagramSocket, T: TickSource> SntpClock<S, T> {
    pub fn new(socket: S, ticks: T) -> Self {
        Self {
            poller: SntpPoller::new(),
            socket,
            ticks,
        }
    }

    /// Override the interval between sync attempts
    pub fn resync_interval_ms(mut self, ms: u32) -> Self {
        self.poller = self.poller.resync_interval_ms(ms);
        self
    }
}

impl<S: DatagramSocket, T: TickSource> ClockSource for SntpClock<S, T> {
    fn now(&mut self) -> ClockReading {
        let now = self.ticks.now();
        // Step the exchange; failures fall back to the resync schedule.
        let _ = self.poller.poll(&mut self.socket, now);

        match self.poller.unix_now(now) {
            Some(unix) => ClockReading {
                time: WallClock::from_unix(unix),
                synchronized: true,
            },
            None => ClockReading::unset(),
        }
    }
}
