//! UDP adapter for the core's SNTP poller
//!
//! The core owns the whole exchange (request codec, response window, resync
//! schedule); all this module adds is a non-blocking `std` UDP socket behind
//! the [`DatagramSocket`] seam, plus [`UdpNtpClock`] bundling it with the
//! process tick source into a drop-in [`ClockSource`].

use std::io;
use std::net::{ToSocketAddrs, UdpSocket};

use log::warn;
use outpost_core::clock::{ClockReading, ClockSource};
use outpost_core::errors::NtpError;
use outpost_core::ntp::{DatagramSocket, SntpClock};
use outpost_core::time::SystemTicks;

use crate::AdapterError;

/// Non-blocking UDP socket fixed to one server endpoint
pub struct UdpDatagramSocket {
    socket: UdpSocket,
}

impl UdpDatagramSocket {
    /// Bind an ephemeral local port and fix the remote endpoint
    ///
    /// `server` includes the port, e.g. `"pool.ntp.org:123"`.
    pub fn connect(server: impl ToSocketAddrs) -> Result<Self, AdapterError> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        socket.connect(server)?;
        Ok(Self { socket })
    }
}

impl DatagramSocket for UdpDatagramSocket {
    fn send(&mut self, buf: &[u8]) -> nb::Result<(), NtpError> {
        match self.socket.send(buf) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(nb::Error::WouldBlock),
            Err(e) => {
                warn!("ntp send failed: {e}");
                Err(nb::Error::Other(NtpError::Socket {
                    reason: "send failed",
                }))
            }
        }
    }

    fn recv(&mut self, buf: &mut [u8]) -> nb::Result<usize, NtpError> {
        match self.socket.recv(buf) {
            Ok(len) => Ok(len),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(nb::Error::WouldBlock),
            Err(e) => {
                warn!("ntp recv failed: {e}");
                Err(nb::Error::Other(NtpError::Socket {
                    reason: "recv failed",
                }))
            }
        }
    }
}

/// SNTP clock over UDP against one server
pub struct UdpNtpClock {
    inner: SntpClock<UdpDatagramSocket, SystemTicks>,
}

impl UdpNtpClock {
    /// Clock synchronizing against `server` (host and port, port 123 for
    /// public NTP)
    pub fn connect(server: impl ToSocketAddrs) -> Result<Self, AdapterError> {
        let socket = UdpDatagramSocket::connect(server)?;
        Ok(Self {
            inner: SntpClock::new(socket, SystemTicks::new()),
        })
    }

    /// Override the interval between sync attempts
    pub fn resync_interval_ms(mut self, ms: u32) -> Self {
        self.inner = self.inner.resync_interval_ms(ms);
        self
    }
}

impl ClockSource for UdpNtpClock {
    fn now(&mut self) -> ClockReading {
        self.inner.now()
    }
}
