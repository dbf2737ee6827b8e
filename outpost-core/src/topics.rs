//! Topic Registry: composed topic strings behind dense integer handles
//!
//! ## Overview
//!
//! Every value this device publishes goes to a topic string assembled once,
//! at setup, from four parts: the configured root, a namespace segment, the
//! caller's name segments, and the device id. After composition the caller
//! holds only a small handle; the string itself never moves or mutates, so
//! the hot publish path is a bounds-checked index, not a format call.
//!
//! ```text
//! data:  root/data/<topic>/<source>/<device-id>   e.g. kw_sensors/data/temp/outdoor/A1B2C3D4E5F6
//! meta:  root/meta/<topic>/<device-id>            e.g. kw_sensors/meta/status/A1B2C3D4E5F6
//! ```
//!
//! ## Handle Discipline
//!
//! Handles are dense indexes assigned in registration order starting at 0,
//! one sequence for data topics and an independent one for meta topics.
//! [`DataHandle`] and [`MetaHandle`] are distinct types so the two
//! namespaces cannot be conflated at a call site: a data handle of value 1
//! and a meta handle of value 1 name unrelated entries, and the compiler
//! keeps them apart. Handles are never recycled.
//!
//! Lookups are always bounds-checked. A handle minted by a different
//! registry instance may be out of range here; that returns
//! [`NodeError::InvalidHandle`] instead of touching memory it should not.
//!
//! ## The Status Topic
//!
//! The well-known `status` meta topic is registered during construction and
//! its handle is cached, so presence reporting never depends on the caller
//! remembering to register it.
//!
//! ## Capacity
//!
//! All storage is fixed-capacity (`heapless`); exceeding it returns
//! [`NodeError::RegistryFull`]. Name segments are not validated beyond
//! length. Callers must supply protocol-safe strings; a `+` or `#` in a
//! segment goes onto the wire as-is.

use heapless::{String, Vec};

use crate::errors::{NodeError, NodeResult};
use crate::identity::DeviceId;

/// Maximum number of data topics per device
pub const MAX_DATA_TOPICS: usize = 8;

/// Maximum number of meta topics per device
pub const MAX_META_TOPICS: usize = 4;

/// Maximum length of a composed topic string in bytes
pub const MAX_TOPIC_LEN: usize = 64;

/// Maximum length of a display label in bytes
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum length of a unit string in bytes
pub const MAX_UNIT_LEN: usize = 8;

/// Maximum length of the topic root in bytes
pub const MAX_ROOT_LEN: usize = 16;

/// Handle to a registered data topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataHandle(u8);

/// Handle to a registered meta topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaHandle(u8);

impl DataHandle {
    /// Position of the entry in registration order
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl MetaHandle {
    /// Position of the entry in registration order
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A registered data topic with its display metadata
#[derive(Debug, Clone)]
pub struct DataTopic {
    topic: String<MAX_TOPIC_LEN>,
    label: String<MAX_LABEL_LEN>,
    unit: String<MAX_UNIT_LEN>,
}

impl DataTopic {
    /// Composed topic string
    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    /// Display label shown on the form
    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Unit string shown beside the value
    pub fn unit(&self) -> &str {
        self.unit.as_str()
    }
}

/// A registered meta topic
#[derive(Debug, Clone)]
pub struct MetaTopic {
    topic: String<MAX_TOPIC_LEN>,
}

impl MetaTopic {
    /// Composed topic string
    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }
}

/// Append-only registry of composed topic strings
pub struct TopicRegistry {
    root: String<MAX_ROOT_LEN>,
    device_id: DeviceId,
    data: Vec<DataTopic, MAX_DATA_TOPICS>,
    meta: Vec<MetaTopic, MAX_META_TOPICS>,
    status: MetaHandle,
}

impl TopicRegistry {
    /// Create a registry and register the well-known `status` meta topic
    pub fn new(root: &str, device_id: DeviceId) -> NodeResult<Self> {
        let mut stored_root = String::new();
        stored_root.push_str(root).map_err(|_| NodeError::FieldTooLong {
            field: "topic root",
            max: MAX_ROOT_LEN,
        })?;

        let mut registry = Self {
            root: stored_root,
            device_id,
            data: Vec::new(),
            meta: Vec::new(),
            status: MetaHandle(0),
        };
        registry.status = registry.register_meta("status")?;

        Ok(registry)
    }

    /// Register a data topic: `root/data/<topic_name>/<source_name>/<device-id>`
    ///
    /// Returns the next dense handle in the data namespace.
    pub fn register_data(
        &mut self,
        label: &str,
        unit: &str,
        topic_name: &str,
        source_name: &str,
    ) -> NodeResult<DataHandle> {
        if self.data.is_full() {
            return Err(NodeError::RegistryFull {
                capacity: MAX_DATA_TOPICS,
            });
        }

        let mut stored_label = String::new();
        stored_label.push_str(label).map_err(|_| NodeError::FieldTooLong {
            field: "label",
            max: MAX_LABEL_LEN,
        })?;

        let mut stored_unit = String::new();
        stored_unit.push_str(unit).map_err(|_| NodeError::FieldTooLong {
            field: "unit",
            max: MAX_UNIT_LEN,
        })?;

        let mut topic = self.compose("data", topic_name)?;
        push_segment(&mut topic, source_name)?;
        push_segment(&mut topic, self.device_id.as_str())?;

        let handle = DataHandle(self.data.len() as u8);
        self.data
            .push(DataTopic {
                topic,
                label: stored_label,
                unit: stored_unit,
            })
            .map_err(|_| NodeError::RegistryFull {
                capacity: MAX_DATA_TOPICS,
            })?;

        Ok(handle)
    }

    /// Register a meta topic: `root/meta/<topic_name>/<device-id>`
    ///
    /// Returns the next dense handle in the meta namespace.
    pub fn register_meta(&mut self, topic_name: &str) -> NodeResult<MetaHandle> {
        if self.meta.is_full() {
            return Err(NodeError::RegistryFull {
                capacity: MAX_META_TOPICS,
            });
        }

        let mut topic = self.compose("meta", topic_name)?;
        push_segment(&mut topic, self.device_id.as_str())?;

        let handle = MetaHandle(self.meta.len() as u8);
        self.meta
            .push(MetaTopic { topic })
            .map_err(|_| NodeError::RegistryFull {
                capacity: MAX_META_TOPICS,
            })?;

        Ok(handle)
    }

    /// Look up a data topic, bounds-checked
    pub fn data(&self, handle: DataHandle) -> NodeResult<&DataTopic> {
        self.data.get(handle.index()).ok_or(NodeError::InvalidHandle {
            index: handle.index(),
            len: self.data.len(),
        })
    }

    /// Look up a meta topic, bounds-checked
    pub fn meta(&self, handle: MetaHandle) -> NodeResult<&MetaTopic> {
        self.meta.get(handle.index()).ok_or(NodeError::InvalidHandle {
            index: handle.index(),
            len: self.meta.len(),
        })
    }

    /// Cached handle of the auto-registered `status` meta topic
    pub fn status_handle(&self) -> MetaHandle {
        self.status
    }

    /// Topic string of the auto-registered `status` meta topic
    pub fn status_topic(&self) -> &str {
        self.meta
            .get(self.status.index())
            .map(|m| m.topic.as_str())
            .unwrap_or("")
    }

    /// All data entries in registration order
    pub fn data_entries(&self) -> &[DataTopic] {
        &self.data
    }

    /// Number of registered data topics
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Number of registered meta topics
    pub fn meta_len(&self) -> usize {
        self.meta.len()
    }

    /// Device id the registry composes topics for
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    fn compose(&self, kind: &str, topic_name: &str) -> NodeResult<String<MAX_TOPIC_LEN>> {
        let mut topic: String<MAX_TOPIC_LEN> = String::new();
        push_part(&mut topic, self.root.as_str())?;
        push_segment(&mut topic, kind)?;
        push_segment(&mut topic, topic_name)?;
        Ok(topic)
    }
}

fn push_part(topic: &mut String<MAX_TOPIC_LEN>, part: &str) -> NodeResult<()> {
    topic.push_str(part).map_err(|_| NodeError::FieldTooLong {
        field: "topic",
        max: MAX_TOPIC_LEN,
    })
}

fn push_segment(topic: &mut String<MAX_TOPIC_LEN>, part: &str) -> NodeResult<()> {
    push_part(topic, "/")?;
    push_part(topic, part)
}
