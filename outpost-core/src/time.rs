//! Monotonic tick time for lifecycle scheduling
//!
//! Cooldowns, association timeouts, and refresh intervals are all measured
//! against a monotonic millisecond counter, never against wall-clock time.
//! Wall-clock readings live in [`crate::clock`] and may jump on sync; the
//! tick counter only moves forward.

/// Milliseconds since device boot
pub type Ticks = u64;

/// Source of monotonic tick time
pub trait TickSource {
    /// Current tick count in milliseconds
    fn now(&self) -> Ticks;
}

/// Tick source backed by the process monotonic clock (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemTicks {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemTicks {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for SystemTicks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TickSource for SystemTicks {
    fn now(&self) -> Ticks {
        self.start.elapsed().as_millis() as Ticks
    }
}

/// Fixed tick source for testing
#[derive(Debug, Clone)]
pub struct FixedTicks {
    now: Ticks,
}

impl FixedTicks {
    pub fn new(now: Ticks) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: Ticks) {
        self.now = now;
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }
}

impl TickSource for FixedTicks {
    fn now(&self) -> Ticks {
        self.now
    }
}
