//! Simulated Sensor Node Example
//!
//! Drives the full node lifecycle against simulated hardware: WiFi
//! association, transport connection with presence reporting, a dropped
//! session, and automatic recovery, publishing readings along the way.
//!
//! ## What You'll Learn
//!
//! - Implementing the hardware traits (link, transport, indicator)
//! - Wiring a `Peripherals` set for the run loop
//! - How the supervisor narrates progress through `StepOutcome`
//! - Presence: the retained `ONLINE` publish and the `OFFLINE` will
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_simulated_node
//! ```

use outpost_core::clock::FixedClock;
use outpost_core::config::ApCredentials;
use outpost_core::display::NullDisplay;
use outpost_core::errors::{LinkError, TransportError};
use outpost_core::link::{LinkStatus, NetworkLink, StatusIndicator};
use outpost_core::time::{FixedTicks, TickSource};
use outpost_core::transport::{CommandHandler, QoS, Session, Transport};
use outpost_core::{Node, NodeConfig, Peripherals, Reading, StepOutcome};

/// Link that associates on the second attempt
struct SimLink {
    attempts: u32,
    status: LinkStatus,
}

impl NetworkLink for SimLink {
    fn hardware_address(&mut self) -> Result<[u8; 6], LinkError> {
        Ok([0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6])
    }

    fn join(&mut self, ap: &ApCredentials) -> Result<(), LinkError> {
        self.attempts += 1;
        println!("  [link] joining '{}' (attempt {})", ap.ssid(), self.attempts);
        if self.attempts >= 2 {
            self.status = LinkStatus::Up;
        }
        Ok(())
    }

    fn status(&mut self) -> LinkStatus {
        self.status
    }
}

/// Transport that prints its traffic and can be forced to drop
struct SimTransport {
    connected: bool,
    inbound: Vec<(String, Vec<u8>)>,
}

impl Transport for SimTransport {
    fn connect(&mut self, session: &Session<'_>) -> Result<(), TransportError> {
        let will = session.will.as_ref().expect("node declares a will");
        println!(
            "  [mqtt] connect as '{}', will '{}' on {}",
            session.client_id,
            String::from_utf8_lossy(will.payload),
            will.topic
        );
        self.connected = true;
        Ok(())
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        _qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        println!(
            "  [mqtt] publish {} = '{}'{}",
            topic,
            String::from_utf8_lossy(payload),
            if retain { " (retained)" } else { "" }
        );
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, _qos: QoS) -> Result<(), TransportError> {
        println!("  [mqtt] subscribe {}", topic);
        Ok(())
    }

    fn service(&mut self, handler: &mut dyn CommandHandler) -> Result<(), TransportError> {
        for (topic, payload) in self.inbound.drain(..) {
            handler.on_command(&topic, &payload);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// The on-device LED
struct SimLed {
    lit: bool,
}

impl StatusIndicator for SimLed {
    fn set_connected(&mut self, connected: bool) {
        if connected != self.lit {
            self.lit = connected;
            println!("  [led]  {}", if connected { "on" } else { "off" });
        }
    }
}

/// Command sink for inbound control messages
struct PrintCommands;

impl CommandHandler for PrintCommands {
    fn on_command(&mut self, topic: &str, payload: &[u8]) {
        println!(
            "  [cmd]  {} -> '{}'",
            topic,
            String::from_utf8_lossy(payload)
        );
    }
}

fn main() {
    println!("Outpost Simulated Node");
    println!("======================\n");

    let config = NodeConfig::new("kw_sensors")
        .expect("valid topic root")
        .access_point("homenet", "secret")
        .expect("valid credentials")
        .reconnect_cooldown_ms(2_000)
        .association_timeout_ms(1_000);

    let mut link = SimLink {
        attempts: 0,
        status: LinkStatus::Down,
    };
    let mut node = Node::new(config, &mut link).expect("identity available");
    println!("Device id: {}\n", node.device_id());

    let temp = node
        .register_data_topic("Temp", "C", "temp", "outdoor")
        .expect("registry has room");
    let hum = node
        .register_data_topic("Hum", "%", "hum", "outdoor")
        .expect("registry has room");
    node.subscribe_command("cmd").expect("registry has room");

    let mut transport = SimTransport {
        connected: false,
        inbound: Vec::new(),
    };
    let mut display = NullDisplay;
    let mut clock = FixedClock::new(12, 0, 0);
    let mut led = SimLed { lit: false };
    let mut commands = PrintCommands;
    let mut ticks = FixedTicks::new(0);

    for step in 0u64..12 {
        ticks.set(step * 1_000);
        clock.advance_seconds(1);

        // Script some trouble and some traffic
        match step {
            5 => {
                println!("-- broker drops the session --");
                transport.connected = false;
            }
            9 => {
                transport.inbound.push((
                    "kw_sensors/meta/cmd/A1B2C3D4E5F6".to_owned(),
                    b"report".to_vec(),
                ));
            }
            _ => {}
        }

        let mut peripherals = Peripherals {
            link: &mut link,
            transport: &mut transport,
            display: &mut display,
            clock: &mut clock,
            indicator: &mut led,
            commands: &mut commands,
            ticks: &ticks,
        };
        let report = node.tick(&mut peripherals);

        match report.outcome {
            StepOutcome::Idle | StepOutcome::Serviced => {}
            outcome => println!("t={:5}ms  {:?}", ticks.now(), outcome),
        }

        // Publish a reading once the session is up
        if node.is_online() && step == 4 {
            node.publish(&mut transport, temp, Reading::Float(21.5))
                .expect("publish");
            node.publish(&mut transport, hum, Reading::Unsigned(47))
                .expect("publish");
        }
    }

    println!(
        "\nDone: node is {}, clock reads {:?}",
        if node.is_online() { "online" } else { "offline" },
        node.clock_time()
    );
}
