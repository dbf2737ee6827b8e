//! Topic Registry Example
//!
//! Shows how device identity and topic composition work: a device id
//! derived from the hardware address, data and meta topics composed
//! around it, and the bounds checking that stale handles run into.
//!
//! ## What You'll Learn
//!
//! - Deriving a `DeviceId` from a MAC address
//! - The `root/data/...` and `root/meta/...` composition rules
//! - Handle namespaces: data and meta handles are independent
//! - What happens at registry capacity and on a bad handle
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_topic_registry
//! ```

use outpost_core::topics::{MAX_DATA_TOPICS, MAX_META_TOPICS};
use outpost_core::{DeviceId, TopicRegistry};

fn main() {
    println!("Outpost Topic Registry");
    println!("======================\n");

    // Identity: hardware address with separators stripped, uppercase hex
    let id = DeviceId::from_mac([0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6]).expect("nonzero MAC");
    println!("Device id from MAC: {}", id);

    let parsed = DeviceId::parse("a1:b2:c3:d4:e5:f6").expect("valid address string");
    println!("Same id parsed:     {}\n", parsed);

    let mut registry = TopicRegistry::new("kw_sensors", id).expect("valid root");

    // The status topic is registered for us at construction
    println!(
        "Status topic (auto, meta handle {}):\n  {}\n",
        registry.status_handle().index(),
        registry.status_topic()
    );

    // Data topics: root/data/<topic>/<source>/<id>
    println!("Data topics (capacity {}):", MAX_DATA_TOPICS);
    let temp = registry
        .register_data("Temp", "C", "temp", "outdoor")
        .expect("registry has room");
    let hum = registry
        .register_data("Hum", "%", "hum", "outdoor")
        .expect("registry has room");

    for handle in [temp, hum] {
        let entry = registry.data(handle).expect("fresh handle");
        println!(
            "  [{}] {:5} ({}) -> {}",
            handle.index(),
            entry.label(),
            entry.unit(),
            entry.topic()
        );
    }

    // Meta topics: root/meta/<topic>/<id>, a separate handle namespace
    println!("\nMeta topics (capacity {}):", MAX_META_TOPICS);
    let battery = registry.register_meta("battery").expect("registry has room");
    println!(
        "  [{}] {}",
        battery.index(),
        registry.meta(battery).unwrap().topic()
    );

    // Handles are bounds-checked, so a handle from some other registry
    // (or a stale build) fails loudly instead of reading garbage
    let stale = hum;
    let mut narrow = TopicRegistry::new("kw_sensors", id).expect("valid root");
    narrow
        .register_data("Temp", "C", "temp", "outdoor")
        .expect("registry has room");
    println!(
        "\nStale handle against a narrower registry:\n  {:?}",
        narrow.data(stale).unwrap_err()
    );
}
