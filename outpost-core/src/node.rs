//! Node façade: registration surface plus the cooperative run loop
//!
//! A [`Node`] owns everything that must survive between ticks (topic
//! registry, connectivity supervisor, form layout, last clock reading)
//! and borrows everything hardware-shaped per call through
//! [`Peripherals`]. Setup code registers topics, builds the form, then
//! hands the node to the host scheduler:
//!
//! ```text
//! loop {
//!     node.tick(&mut peripherals);
//!     node.publish(transport, temp, Reading::Float(21.5))?;
//! }
//! ```
//!
//! Registration is a setup-phase activity: the first tick (or an explicit
//! [`Node::setup_form`]) seals the registries, and later registration
//! attempts fail with [`NodeError::RegistrySealed`] instead of quietly
//! resizing tables the run loop is already using.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::clock::{ClockReading, ClockSource, WallClock};
use crate::config::{ClockCadence, NodeConfig};
use crate::display::DisplayPort;
use crate::errors::{NodeError, NodeResult};
use crate::form::FormLayout;
use crate::identity::DeviceId;
use crate::lifecycle::{ConnectPlan, LinkState, LinkSupervisor, StepOutcome, PRESENCE_ONLINE};
use crate::link::{NetworkLink, StatusIndicator};
use crate::time::{TickSource, Ticks};
use crate::topics::{DataHandle, MetaHandle, TopicRegistry, MAX_TOPIC_LEN};
use crate::transport::{CommandHandler, QoS, Transport};

/// Command subscriptions a node can carry
pub const MAX_COMMAND_TOPICS: usize = 4;

/// Capacity for a rendered reading
const VALUE_LEN: usize = 16;

/// Status-line text while the clock has never synchronized
const TIME_NOT_SET: &str = "Time not set";

/// One sensor observation, rendered identically on the wire and display
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Counter or raw register value, rendered without decimals
    Unsigned(u16),
    /// Measurement rendered with one decimal place
    Float(f32),
}

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Reading::Unsigned(value) => write!(f, "{}", value),
            Reading::Float(value) => write!(f, "{:.1}", value),
        }
    }
}

/// Borrowed hardware surfaces for one tick
pub struct Peripherals<'a> {
    /// Radio / network interface
    pub link: &'a mut dyn NetworkLink,
    /// Pub/sub transport
    pub transport: &'a mut dyn Transport,
    /// Character-grid display
    pub display: &'a mut dyn DisplayPort,
    /// Wall-clock source
    pub clock: &'a mut dyn ClockSource,
    /// On-device connection indicator
    pub indicator: &'a mut dyn StatusIndicator,
    /// Inbound command sink
    pub commands: &'a mut dyn CommandHandler,
    /// Monotonic time
    pub ticks: &'a dyn TickSource,
}

/// What one run-loop tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// What the connectivity supervisor did
    pub outcome: StepOutcome,
    /// Whether the clock (or its placeholder) re-rendered the status line
    pub clock_rendered: bool,
    /// Error the tick absorbed, if any
    pub error: Option<NodeError>,
}

/// The sensor node: identity, topics, connectivity, display, clock
pub struct Node {
    config: NodeConfig,
    registry: TopicRegistry,
    supervisor: LinkSupervisor,
    command_topics: Vec<String<MAX_TOPIC_LEN>, MAX_COMMAND_TOPICS>,
    form: Option<FormLayout>,
    sealed: bool,
    last_reading: ClockReading,
    last_clock_render: Option<Ticks>,
}

impl Node {
    /// Build a node whose identity comes from the link's hardware address
    ///
    /// Fails loudly with [`NodeError::IdentityUnavailable`] when the
    /// address cannot be read; every topic string embeds the identity, so
    /// proceeding without one would poison the whole registry.
    pub fn new(config: NodeConfig, link: &mut dyn NetworkLink) -> NodeResult<Self> {
        let id = DeviceId::from_link(link)?;
        Self::with_device_id(config, id)
    }

    /// Build a node with an explicit identity, for hosts and tests
    pub fn with_device_id(config: NodeConfig, id: DeviceId) -> NodeResult<Self> {
        let registry = TopicRegistry::new(config.topic_root.as_str(), id)?;
        let supervisor = LinkSupervisor::new(&config);
        Ok(Self {
            config,
            registry,
            supervisor,
            command_topics: Vec::new(),
            form: None,
            sealed: false,
            last_reading: ClockReading::unset(),
            last_clock_render: None,
        })
    }

    /// Register a sensor field published under `root/data/...`
    pub fn register_data_topic(
        &mut self,
        label: &str,
        unit: &str,
        topic_name: &str,
        source_name: &str,
    ) -> NodeResult<DataHandle> {
        self.ensure_unsealed()?;
        self.registry
            .register_data(label, unit, topic_name, source_name)
    }

    /// Register a non-sensor topic published under `root/meta/...`
    pub fn register_meta_topic(&mut self, topic_name: &str) -> NodeResult<MetaHandle> {
        self.ensure_unsealed()?;
        self.registry.register_meta(topic_name)
    }

    /// Register a meta topic and subscribe to it for inbound commands
    ///
    /// Commands arrive through [`Peripherals::commands`] once the
    /// transport session is up; the subscription is re-issued after every
    /// reconnect.
    pub fn subscribe_command(&mut self, topic_name: &str) -> NodeResult<MetaHandle> {
        self.ensure_unsealed()?;
        let handle = self.registry.register_meta(topic_name)?;

        let mut owned: String<MAX_TOPIC_LEN> = String::new();
        owned
            .push_str(self.registry.meta(handle)?.topic())
            .map_err(|_| NodeError::FieldTooLong {
                field: "topic",
                max: MAX_TOPIC_LEN,
            })?;
        self.command_topics
            .push(owned)
            .map_err(|_| NodeError::RegistryFull {
                capacity: MAX_COMMAND_TOPICS,
            })?;
        Ok(handle)
    }

    /// Lay out the form and splash the device id on the status line
    ///
    /// Seals the registries. Optional: the first tick does both lazily,
    /// minus the splash.
    pub fn setup_form(&mut self, display: &mut dyn DisplayPort) {
        let mut form = FormLayout::build(
            display,
            self.registry.data_entries(),
            self.config.capabilities.form,
        );
        form.set_status(display, self.registry.device_id().as_str());
        self.form = Some(form);
        self.sealed = true;
    }

    /// Publish a reading to a data topic (fire-and-forget, not retained)
    pub fn publish(
        &self,
        transport: &mut dyn Transport,
        handle: DataHandle,
        reading: Reading,
    ) -> NodeResult<()> {
        let mut buf: String<VALUE_LEN> = String::new();
        write!(buf, "{}", reading).map_err(|_| NodeError::FieldTooLong {
            field: "value",
            max: VALUE_LEN,
        })?;

        let topic = self.registry.data(handle)?.topic();
        transport.publish(topic, buf.as_bytes(), QoS::AtMostOnce, false)?;
        Ok(())
    }

    /// Render a reading into a field's value cell
    pub fn update(
        &self,
        display: &mut dyn DisplayPort,
        handle: DataHandle,
        reading: Reading,
    ) -> NodeResult<()> {
        let mut buf: String<VALUE_LEN> = String::new();
        write!(buf, "{}", reading).map_err(|_| NodeError::FieldTooLong {
            field: "value",
            max: VALUE_LEN,
        })?;
        self.update_text(display, handle, buf.as_str())
    }

    /// Render free text into a field's value cell
    pub fn update_text(
        &self,
        display: &mut dyn DisplayPort,
        handle: DataHandle,
        text: &str,
    ) -> NodeResult<()> {
        self.registry.data(handle)?;
        if let Some(form) = &self.form {
            form.set_value(display, handle.index(), text);
        }
        Ok(())
    }

    /// One cooperative run-loop pass; never blocks
    ///
    /// Steps the connectivity supervisor, reflects its outcome on the
    /// status line, then refreshes the clock (or the `Time not set`
    /// placeholder). All failures are absorbed into the report.
    pub fn tick(&mut self, p: &mut Peripherals<'_>) -> TickReport {
        self.sealed = true;
        if self.form.is_none() {
            self.form = Some(FormLayout::build(
                p.display,
                self.registry.data_entries(),
                self.config.capabilities.form,
            ));
        }

        let now = p.ticks.now();

        let plan = ConnectPlan {
            client_id: self.registry.device_id().as_str(),
            status_topic: self.registry.status_topic(),
            subscriptions: self.command_topics.as_slice(),
        };
        let outcome = self.supervisor.step(
            now,
            self.config.access_points.as_slice(),
            &plan,
            p.link,
            p.transport,
            p.indicator,
            p.commands,
        );

        let error = match outcome {
            StepOutcome::AssociationParked { attempts } => {
                Some(NodeError::AssociationTimeout { attempts })
            }
            StepOutcome::ConnectFailed { error } => Some(NodeError::Transport(error)),
            _ => None,
        };

        let status = match outcome {
            StepOutcome::AssociationStarted => Some("[->] WiFi"),
            StepOutcome::Associated => Some("WiFi: connected"),
            StepOutcome::AssociationParked { .. } => Some("WiFi: failed"),
            StepOutcome::ConnectFailed { .. } => Some("[->] MQTT"),
            StepOutcome::CameOnline => Some(PRESENCE_ONLINE),
            StepOutcome::Idle | StepOutcome::Serviced | StepOutcome::Dropped => None,
        };
        if let (Some(text), Some(form)) = (status, self.form.as_mut()) {
            form.set_status(p.display, text);
        }

        let clock_rendered = self.refresh_clock(p, now);

        TickReport {
            outcome,
            clock_rendered,
            error,
        }
    }

    fn refresh_clock(&mut self, p: &mut Peripherals<'_>, now: Ticks) -> bool {
        let reading = p.clock.now();
        self.last_reading = reading;

        let form = match self.form.as_mut() {
            Some(form) => form,
            None => return false,
        };

        if !reading.synchronized {
            return form.set_status(p.display, TIME_NOT_SET);
        }

        let due = match self.config.capabilities.clock_cadence {
            ClockCadence::OnSecondChange => true,
            ClockCadence::FixedInterval { period_ms } => match self.last_clock_render {
                None => true,
                Some(at) => now.saturating_sub(at) >= period_ms as u64,
            },
        };
        if !due {
            return false;
        }
        self.last_clock_render = Some(now);

        let mut text: String<12> = String::new();
        // "HH:MM:SS" is 8 characters; the buffer cannot overflow
        let _ = write!(text, "{}", reading.time);
        form.set_status(p.display, text.as_str())
    }

    /// Identity derived at construction
    pub fn device_id(&self) -> &DeviceId {
        self.registry.device_id()
    }

    /// Topic registry, for inspecting composed topic strings
    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// Where the connectivity supervisor currently is
    pub fn link_state(&self) -> LinkState {
        self.supervisor.state()
    }

    /// Whether a transport session is live
    pub fn is_online(&self) -> bool {
        matches!(self.supervisor.state(), LinkState::TransportUp)
    }

    /// Last wall-clock reading, if the source has ever synchronized
    pub fn clock_time(&self) -> Option<WallClock> {
        self.last_reading
            .synchronized
            .then_some(self.last_reading.time)
    }

    /// True at exactly 00:00:00 on a synchronized clock, never otherwise
    pub fn is_midnight(&self) -> bool {
        self.last_reading.synchronized && self.last_reading.time.is_midnight()
    }

    fn ensure_unsealed(&self) -> NodeResult<()> {
        if self.sealed {
            return Err(NodeError::RegistrySealed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullDisplay;
    use crate::errors::LinkError;

    fn test_node() -> Node {
        let config = NodeConfig::new("kw_sensors").unwrap();
        let id = DeviceId::parse("A1B2C3D4E5F6").unwrap();
        Node::with_device_id(config, id).unwrap()
    }

    #[test]
    fn readings_render_wire_format() {
        assert_eq!(format!("{}", Reading::Unsigned(400)), "400");
        assert_eq!(format!("{}", Reading::Float(21.5)), "21.5");
        assert_eq!(format!("{}", Reading::Float(3.0)), "3.0");
    }

    #[test]
    fn setup_form_seals_registration() {
        let mut node = test_node();
        node.register_data_topic("Temp", "C", "temp", "outdoor")
            .unwrap();

        node.setup_form(&mut NullDisplay);

        assert_eq!(
            node.register_data_topic("Hum", "%", "hum", "outdoor"),
            Err(NodeError::RegistrySealed)
        );
        assert_eq!(
            node.register_meta_topic("battery"),
            Err(NodeError::RegistrySealed)
        );
        assert_eq!(
            node.subscribe_command("cmd"),
            Err(NodeError::RegistrySealed)
        );
    }

    #[test]
    fn identity_failure_is_loud() {
        struct DeadLink;

        impl NetworkLink for DeadLink {
            fn hardware_address(&mut self) -> Result<[u8; 6], LinkError> {
                Err(LinkError::AddressUnavailable)
            }

            fn join(&mut self, _ap: &crate::config::ApCredentials) -> Result<(), LinkError> {
                Ok(())
            }

            fn status(&mut self) -> crate::link::LinkStatus {
                crate::link::LinkStatus::Down
            }
        }

        let config = NodeConfig::new("kw_sensors").unwrap();
        assert!(matches!(
            Node::new(config, &mut DeadLink),
            Err(NodeError::IdentityUnavailable { .. })
        ));
    }

    #[test]
    fn commands_compose_meta_topics() {
        let mut node = test_node();
        let handle = node.subscribe_command("cmd").unwrap();

        assert_eq!(
            node.registry().meta(handle).unwrap().topic(),
            "kw_sensors/meta/cmd/A1B2C3D4E5F6"
        );
    }
}
