//! Wall-clock sources: synced time for the status line and midnight checks
//!
//! Two implementations exist in practice: an NTP-polled software clock
//! (see [`crate::ntp`]) and a battery-backed RTC chip read through
//! [`RtcChip`]. The run loop only sees [`ClockSource`]; a reading carries
//! the time plus whether the source has ever synchronized, and a source
//! that cannot answer reports `synchronized: false` rather than failing.

use core::fmt;

/// Wall-clock time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallClock {
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-59
    pub second: u8,
}

impl WallClock {
    /// Time of day from unix seconds (UTC)
    pub fn from_unix(secs: u64) -> Self {
        let of_day = (secs % 86_400) as u32;
        Self {
            hour: (of_day / 3_600) as u8,
            minute: ((of_day % 3_600) / 60) as u8,
            second: (of_day % 60) as u8,
        }
    }

    /// True exactly at 00:00:00
    pub fn is_midnight(&self) -> bool {
        self.hour == 0 && self.minute == 0 && self.second == 0
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// One reading from a clock source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockReading {
    /// Last-known wall-clock time
    pub time: WallClock,
    /// Whether the source has ever successfully synchronized
    pub synchronized: bool,
}

impl ClockReading {
    /// Reading from a source that has never synchronized
    pub const fn unset() -> Self {
        Self {
            time: WallClock {
                hour: 0,
                minute: 0,
                second: 0,
            },
            synchronized: false,
        }
    }
}

/// Source of wall-clock time
pub trait ClockSource {
    /// Current reading; polled once per run-loop tick
    ///
    /// Implementations drive their own sync machinery here and must not
    /// block.
    fn now(&mut self) -> ClockReading;
}

/// Fixed clock source for testing
#[derive(Debug, Clone)]
pub struct FixedClock {
    reading: ClockReading,
}

impl FixedClock {
    /// Synchronized clock at the given time
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            reading: ClockReading {
                time: WallClock {
                    hour,
                    minute,
                    second,
                },
                synchronized: true,
            },
        }
    }

    /// Clock that has never synchronized
    pub fn unsynchronized() -> Self {
        Self {
            reading: ClockReading::unset(),
        }
    }

    pub fn set(&mut self, hour: u8, minute: u8, second: u8) {
        self.reading = ClockReading {
            time: WallClock {
                hour,
                minute,
                second,
            },
            synchronized: true,
        };
    }

    /// Advance the time, wrapping across midnight
    pub fn advance_seconds(&mut self, secs: u32) {
        let t = self.reading.time;
        let total = t.hour as u64 * 3_600 + t.minute as u64 * 60 + t.second as u64 + secs as u64;
        self.reading.time = WallClock::from_unix(total);
    }
}

impl ClockSource for FixedClock {
    fn now(&mut self) -> ClockReading {
        self.reading
    }
}

/// Narrow interface over a battery-backed RTC chip
pub trait RtcChip {
    /// Driver-specific bus error
    type Error;

    /// Whether the oscillator is running
    fn is_running(&mut self) -> Result<bool, Self::Error>;

    /// Read the chip time as unix seconds
    fn read_unix(&mut self) -> Result<u64, Self::Error>;

    /// Set the chip time from unix seconds
    fn set_unix(&mut self, secs: u64) -> Result<(), Self::Error>;
}

/// Clock source backed by an RTC chip
///
/// A chip whose oscillator is stopped serves frozen time, so it is treated
/// as never-synchronized. Provisioning a stopped chip (writing a known
/// timestamp to start it) is opt-in via [`RtcClock::provision_if_stopped`]:
/// a chip that misreports the halt flag would otherwise have a valid
/// battery-backed time silently overwritten.
pub struct RtcClock<C: RtcChip> {
    chip: C,
    provision: Option<u64>,
    checked: bool,
    running: bool,
}

impl<C: RtcChip> RtcClock<C> {
    /// Wrap a chip; a stopped oscillator is left untouched
    pub fn new(chip: C) -> Self {
        Self {
            chip,
            provision: None,
            checked: false,
            running: false,
        }
    }

    /// Write `unix_secs` to the chip if its oscillator reports stopped
    ///
    /// Intended for first-boot provisioning with a build or install
    /// timestamp.
    pub fn provision_if_stopped(mut self, unix_secs: u64) -> Self {
        self.provision = Some(unix_secs);
        self
    }

    fn check_oscillator(&mut self) {
        self.checked = true;
        match self.chip.is_running() {
            Ok(true) => self.running = true,
            Ok(false) => {
                if let Some(secs) = self.provision {
                    self.running = self.chip.set_unix(secs).is_ok();
                }
            }
            Err(_) => {}
        }
    }
}

impl<C: RtcChip> ClockSource for RtcClock<C> {
    fn now(&mut self) -> ClockReading {
        if !self.checked {
            self.check_oscillator();
        }
        if !self.running {
            return ClockReading::unset();
        }

        match self.chip.read_unix() {
            Ok(secs) => ClockReading {
                time: WallClock::from_unix(secs),
                synchronized: true,
            },
            Err(_) => ClockReading::unset(),
        }
    }
}
