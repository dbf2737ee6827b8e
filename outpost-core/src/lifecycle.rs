//! Connectivity lifecycle and presence reporting
//!
//! ## State Machine
//!
//! One supervisor owns the path from cold boot to a live transport
//! session and back through every failure:
//!
//! ```text
//! Init ──► Associating ──► TransportDown ──► TransportUp
//!  ▲            │   ▲             ▲               │
//!  │            ▼   └── rotate AP │               ▼
//!  └── AssociationFailed          └──── session dropped
//! ```
//!
//! Association is bounded: each attempt gets a fixed window, attempts
//! rotate through the configured access points, and exhausting the
//! budget parks the supervisor in `AssociationFailed` instead of
//! spinning. A parked supervisor re-arms itself after one cooldown
//! window, so an access point that comes back later is still found.
//!
//! Transport reconnects are throttled by a cooldown measured from the
//! previous attempt. The timestamp is taken *before* the attempt, so a
//! failing broker is probed at most once per window. A dropped session
//! restarts the cooldown from the moment of the drop.
//!
//! ## Presence
//!
//! Every successful connect declares an `OFFLINE` last will on the
//! status topic (retained, at-least-once) and then publishes `ONLINE`
//! the same way. The device itself never sends `OFFLINE`; that message
//! only ever comes from the broker executing the will after an unclean
//! disconnect. Command subscriptions are re-issued inside every connect
//! because the session, and anything it carried, died with the drop.
//!
//! Each step ends by driving the status indicator from the resulting
//! state, so the on-device LED can never disagree with the supervisor.

use heapless::String;

use crate::config::{ApCredentials, NodeConfig};
use crate::errors::TransportError;
use crate::link::{LinkStatus, NetworkLink, StatusIndicator};
use crate::time::Ticks;
use crate::topics::MAX_TOPIC_LEN;
use crate::transport::{CommandHandler, LastWill, QoS, Session, Transport};

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

/// Retained payload announcing the device is up
pub const PRESENCE_ONLINE: &str = "ONLINE";

/// Will payload the broker delivers after an unclean disconnect
pub const PRESENCE_OFFLINE: &str = "OFFLINE";

/// Delivery level for presence messages
pub const PRESENCE_QOS: QoS = QoS::AtLeastOnce;

/// Delivery level for command subscriptions
pub const COMMAND_QOS: QoS = QoS::AtLeastOnce;

/// Where the supervisor currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkState {
    /// Nothing attempted yet
    Init,
    /// Association attempt in flight
    Associating,
    /// Attempt budget exhausted; parked until the cooldown re-arms
    AssociationFailed,
    /// Link up, no transport session
    TransportDown,
    /// Transport session live
    TransportUp,
}

/// What a single step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing due this tick
    Idle,
    /// An association attempt was dispatched
    AssociationStarted,
    /// The link came up
    Associated,
    /// Association budget exhausted; supervisor parked
    AssociationParked {
        /// Attempts consumed before parking
        attempts: u8,
    },
    /// Session established and presence published
    CameOnline,
    /// Transport connect failed; next try after the cooldown
    ConnectFailed {
        /// What the transport reported
        error: TransportError,
    },
    /// Live session serviced
    Serviced,
    /// Session dropped
    Dropped,
}

/// Session parameters the supervisor replays on every reconnect
pub struct ConnectPlan<'a> {
    /// Transport client identifier, normally the device id
    pub client_id: &'a str,
    /// Presence topic for the will and the `ONLINE` publish
    pub status_topic: &'a str,
    /// Topics to (re)subscribe for inbound commands
    pub subscriptions: &'a [String<MAX_TOPIC_LEN>],
}

/// Drives association, reconnection, presence, and the status indicator
#[derive(Debug)]
pub struct LinkSupervisor {
    state: LinkState,
    last_reconnect: Option<Ticks>,
    association_started: Ticks,
    attempts: u8,
    parked_at: Ticks,
    ap_cursor: usize,
    reconnect_cooldown_ms: u32,
    association_timeout_ms: u32,
    max_attempts: u8,
}

impl LinkSupervisor {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            state: LinkState::Init,
            last_reconnect: None,
            association_started: 0,
            attempts: 0,
            parked_at: 0,
            ap_cursor: 0,
            reconnect_cooldown_ms: config.reconnect_cooldown_ms,
            association_timeout_ms: config.association_timeout_ms,
            max_attempts: config.max_association_attempts,
        }
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Advance the machine by one non-blocking step
    ///
    /// Called once per run-loop tick. Never blocks: association and
    /// reconnection progress across ticks, gated by their windows.
    pub fn step(
        &mut self,
        now: Ticks,
        aps: &[ApCredentials],
        plan: &ConnectPlan<'_>,
        link: &mut dyn NetworkLink,
        transport: &mut dyn Transport,
        indicator: &mut dyn StatusIndicator,
        handler: &mut dyn CommandHandler,
    ) -> StepOutcome {
        let outcome = match self.state {
            LinkState::Init => self.step_init(now, aps, link),
            LinkState::Associating => self.step_associating(now, aps, link),
            LinkState::AssociationFailed => self.step_parked(now),
            LinkState::TransportDown => self.step_transport_down(now, plan, link, transport),
            LinkState::TransportUp => self.step_transport_up(now, transport, handler),
        };

        indicator.set_connected(matches!(self.state, LinkState::TransportUp));
        outcome
    }

    fn step_init(&mut self, now: Ticks, aps: &[ApCredentials], link: &mut dyn NetworkLink) -> StepOutcome {
        // Host adapters may hand us a link that is already up
        if matches!(link.status(), LinkStatus::Up) {
            self.state = LinkState::TransportDown;
            return StepOutcome::Associated;
        }

        if self.begin_attempt(now, aps, link) {
            self.state = LinkState::Associating;
            StepOutcome::AssociationStarted
        } else {
            self.park(now)
        }
    }

    fn step_associating(
        &mut self,
        now: Ticks,
        aps: &[ApCredentials],
        link: &mut dyn NetworkLink,
    ) -> StepOutcome {
        match link.status() {
            LinkStatus::Up => {
                log_info!("link associated after {} attempt(s)", self.attempts);
                self.attempts = 0;
                self.state = LinkState::TransportDown;
                StepOutcome::Associated
            }
            LinkStatus::Joining | LinkStatus::Down => {
                if now.saturating_sub(self.association_started)
                    < self.association_timeout_ms as u64
                {
                    return StepOutcome::Idle;
                }

                if self.attempts >= self.max_attempts {
                    self.park(now)
                } else if self.begin_attempt(now, aps, link) {
                    StepOutcome::AssociationStarted
                } else {
                    self.park(now)
                }
            }
        }
    }

    fn step_parked(&mut self, now: Ticks) -> StepOutcome {
        if now.saturating_sub(self.parked_at) >= self.reconnect_cooldown_ms as u64 {
            self.attempts = 0;
            self.state = LinkState::Init;
        }
        StepOutcome::Idle
    }

    fn step_transport_down(
        &mut self,
        now: Ticks,
        plan: &ConnectPlan<'_>,
        link: &mut dyn NetworkLink,
        transport: &mut dyn Transport,
    ) -> StepOutcome {
        if !matches!(link.status(), LinkStatus::Up) {
            // Link fell over underneath us; run association again
            self.attempts = 0;
            self.state = LinkState::Init;
            return StepOutcome::Idle;
        }

        if !self.reconnect_due(now) {
            return StepOutcome::Idle;
        }

        // Stamp before the attempt so a failure is throttled too
        self.last_reconnect = Some(now);

        match Self::establish(plan, transport) {
            Ok(()) => {
                log_info!("transport session up as {}", plan.client_id);
                self.state = LinkState::TransportUp;
                StepOutcome::CameOnline
            }
            Err(error) => {
                log_warn!("transport connect failed: {}", error);
                StepOutcome::ConnectFailed { error }
            }
        }
    }

    fn step_transport_up(
        &mut self,
        now: Ticks,
        transport: &mut dyn Transport,
        handler: &mut dyn CommandHandler,
    ) -> StepOutcome {
        if !transport.is_connected() {
            self.drop_session(now);
            return StepOutcome::Dropped;
        }

        match transport.service(handler) {
            Ok(()) => StepOutcome::Serviced,
            Err(error) => {
                log_warn!("transport service failed: {}", error);
                self.drop_session(now);
                StepOutcome::Dropped
            }
        }
    }

    /// Dispatch one association attempt, rotating through `aps`
    fn begin_attempt(
        &mut self,
        now: Ticks,
        aps: &[ApCredentials],
        link: &mut dyn NetworkLink,
    ) -> bool {
        if aps.is_empty() {
            return false;
        }

        let ap = &aps[self.ap_cursor % aps.len()];
        self.ap_cursor = self.ap_cursor.wrapping_add(1);
        self.attempts += 1;
        self.association_started = now;

        if let Err(error) = link.join(ap) {
            // The attempt still burns its window; status() stays Down
            log_warn!("join {} failed: {}", ap.ssid(), error);
        }
        true
    }

    fn park(&mut self, now: Ticks) -> StepOutcome {
        log_warn!("association parked after {} attempt(s)", self.attempts);
        self.parked_at = now;
        self.state = LinkState::AssociationFailed;
        StepOutcome::AssociationParked {
            attempts: self.attempts,
        }
    }

    fn drop_session(&mut self, now: Ticks) {
        log_warn!("transport session dropped");
        self.last_reconnect = Some(now);
        self.state = LinkState::TransportDown;
    }

    fn reconnect_due(&self, now: Ticks) -> bool {
        match self.last_reconnect {
            None => true,
            Some(at) => now.saturating_sub(at) >= self.reconnect_cooldown_ms as u64,
        }
    }

    /// Connect with the will declared, then announce presence
    fn establish(plan: &ConnectPlan<'_>, transport: &mut dyn Transport) -> Result<(), TransportError> {
        let session = Session {
            client_id: plan.client_id,
            will: Some(LastWill {
                topic: plan.status_topic,
                payload: PRESENCE_OFFLINE.as_bytes(),
                qos: PRESENCE_QOS,
                retain: true,
            }),
        };
        transport.connect(&session)?;

        for topic in plan.subscriptions {
            transport.subscribe(topic, COMMAND_QOS)?;
        }

        transport.publish(
            plan.status_topic,
            PRESENCE_ONLINE.as_bytes(),
            PRESENCE_QOS,
            true,
        )?;
        Ok(())
    }
}
