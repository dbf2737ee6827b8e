//! Shared mock peripherals for integration tests
//!
//! Everything a node borrows per tick, scripted and recording: link,
//! transport, display, indicator, and command sink. Clock and tick
//! sources come from the crate's own `FixedClock` / `FixedTicks`.

#![allow(dead_code)]

use outpost_core::clock::FixedClock;
use outpost_core::config::ApCredentials;
use outpost_core::display::DisplayPort;
use outpost_core::errors::{LinkError, TransportError};
use outpost_core::link::{LinkStatus, NetworkLink, StatusIndicator};
use outpost_core::node::{Node, Peripherals, TickReport};
use outpost_core::time::FixedTicks;
use outpost_core::transport::{CommandHandler, QoS, Session, Transport};

/// Scriptable network link
pub struct MockLink {
    pub status: LinkStatus,
    pub mac: [u8; 6],
    pub joins: Vec<String>,
}

impl MockLink {
    pub fn up() -> Self {
        Self {
            status: LinkStatus::Up,
            mac: [0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6],
            joins: Vec::new(),
        }
    }

    pub fn down() -> Self {
        Self {
            status: LinkStatus::Down,
            ..Self::up()
        }
    }
}

impl NetworkLink for MockLink {
    fn hardware_address(&mut self) -> Result<[u8; 6], LinkError> {
        Ok(self.mac)
    }

    fn join(&mut self, ap: &ApCredentials) -> Result<(), LinkError> {
        self.joins.push(ap.ssid().to_owned());
        Ok(())
    }

    fn status(&mut self) -> LinkStatus {
        self.status
    }
}

/// What one connect attempt carried
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectRecord {
    pub client_id: String,
    pub will_topic: String,
    pub will_payload: Vec<u8>,
    pub will_qos: QoS,
    pub will_retain: bool,
}

/// One recorded publish
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRecord {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Recording transport with scriptable connect failures and inbound mail
pub struct MockTransport {
    pub fail_next_connects: usize,
    pub connected: bool,
    pub connects: Vec<ConnectRecord>,
    pub publishes: Vec<PublishRecord>,
    pub subscribes: Vec<(String, QoS)>,
    pub services: usize,
    /// Messages delivered to the command handler on the next service call
    pub inbound: Vec<(String, Vec<u8>)>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            fail_next_connects: 0,
            connected: false,
            connects: Vec::new(),
            publishes: Vec::new(),
            subscribes: Vec::new(),
            services: 0,
            inbound: Vec::new(),
        }
    }

    /// Payloads published to one topic, in order
    pub fn published_to(&self, topic: &str) -> Vec<&[u8]> {
        self.publishes
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.payload.as_slice())
            .collect()
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, session: &Session<'_>) -> Result<(), TransportError> {
        let will = session.will.as_ref().expect("node sessions declare a will");
        self.connects.push(ConnectRecord {
            client_id: session.client_id.to_owned(),
            will_topic: will.topic.to_owned(),
            will_payload: will.payload.to_vec(),
            will_qos: will.qos,
            will_retain: will.retain,
        });

        if self.fail_next_connects > 0 {
            self.fail_next_connects -= 1;
            return Err(TransportError::ConnectFailed {
                reason: "broker unreachable",
            });
        }
        self.connected = true;
        Ok(())
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.publishes.push(PublishRecord {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: QoS) -> Result<(), TransportError> {
        self.subscribes.push((topic.to_owned(), qos));
        Ok(())
    }

    fn service(&mut self, handler: &mut dyn CommandHandler) -> Result<(), TransportError> {
        self.services += 1;
        for (topic, payload) in self.inbound.drain(..) {
            handler.on_command(&topic, &payload);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// One recorded display operation, with cursor position where relevant
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOp {
    ClearAll,
    ClearRegion {
        c0: u8,
        c1: u8,
        r0: u8,
        r1: u8,
    },
    ClearToEol {
        col: u8,
        row: u8,
    },
    Print {
        col: u8,
        row: u8,
        text: String,
    },
}

/// Character-grid recorder: 128x64, two rows per text line, width = len
pub struct MockDisplay {
    cursor: (u8, u8),
    pub ops: Vec<DisplayOp>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self {
            cursor: (0, 0),
            ops: Vec::new(),
        }
    }

    /// Texts printed on the status line, in order
    pub fn status_writes(&self) -> Vec<&str> {
        let status_row = 3 * self.font_rows();
        self.ops
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Print { row, text, .. } if *row == status_row => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Last text printed on the status line
    pub fn last_status(&self) -> Option<&str> {
        self.status_writes().last().copied()
    }

    pub fn reset(&mut self) {
        self.ops.clear();
    }
}

impl DisplayPort for MockDisplay {
    fn clear_all(&mut self) {
        self.cursor = (0, 0);
        self.ops.push(DisplayOp::ClearAll);
    }

    fn clear_region(&mut self, c0: u8, c1: u8, r0: u8, r1: u8) {
        self.cursor = (c0, r0);
        self.ops.push(DisplayOp::ClearRegion { c0, c1, r0, r1 });
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        self.cursor = (col, row);
    }

    fn print(&mut self, text: &str) {
        let (col, row) = self.cursor;
        self.ops.push(DisplayOp::Print {
            col,
            row,
            text: text.to_owned(),
        });
        self.cursor.0 = col.saturating_add(self.str_width(text));
    }

    fn clear_to_eol(&mut self) {
        let (col, row) = self.cursor;
        self.ops.push(DisplayOp::ClearToEol { col, row });
    }

    fn str_width(&self, text: &str) -> u8 {
        text.len() as u8
    }

    fn display_width(&self) -> u8 {
        128
    }

    fn display_height(&self) -> u8 {
        64
    }

    fn font_rows(&self) -> u8 {
        2
    }

    fn font_width(&self) -> u8 {
        8
    }
}

/// Indicator remembering every level it was driven to
pub struct MockIndicator {
    pub history: Vec<bool>,
}

impl MockIndicator {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<bool> {
        self.history.last().copied()
    }
}

impl StatusIndicator for MockIndicator {
    fn set_connected(&mut self, connected: bool) {
        self.history.push(connected);
    }
}

/// Command sink remembering everything dispatched to it
pub struct RecordingHandler {
    pub commands: Vec<(String, Vec<u8>)>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl CommandHandler for RecordingHandler {
    fn on_command(&mut self, topic: &str, payload: &[u8]) {
        self.commands.push((topic.to_owned(), payload.to_vec()));
    }
}

/// The full peripheral set wired for one node under test
pub struct Bench {
    pub link: MockLink,
    pub transport: MockTransport,
    pub display: MockDisplay,
    pub clock: FixedClock,
    pub indicator: MockIndicator,
    pub handler: RecordingHandler,
    pub ticks: FixedTicks,
}

impl Bench {
    /// Link already up, clock never synchronized, ticks at zero
    pub fn new() -> Self {
        Self {
            link: MockLink::up(),
            transport: MockTransport::new(),
            display: MockDisplay::new(),
            clock: FixedClock::unsynchronized(),
            indicator: MockIndicator::new(),
            handler: RecordingHandler::new(),
            ticks: FixedTicks::new(0),
        }
    }

    /// Run one tick against this bench
    pub fn tick(&mut self, node: &mut Node) -> TickReport {
        let mut p = Peripherals {
            link: &mut self.link,
            transport: &mut self.transport,
            display: &mut self.display,
            clock: &mut self.clock,
            indicator: &mut self.indicator,
            commands: &mut self.handler,
            ticks: &self.ticks,
        };
        node.tick(&mut p)
    }

    /// Set the tick counter, then run one tick
    pub fn tick_at(&mut self, node: &mut Node, ms: u64) -> TickReport {
        self.ticks.set(ms);
        self.tick(node)
    }
}
