//! Integration tests for the node façade: topics, form, clock
//!
//! Covers topic composition end to end, form geometry driven through a
//! recording display, and the status-line clock with both refresh
//! cadences.

#![cfg(test)]

mod common;

use outpost_core::clock::FixedClock;
use outpost_core::errors::NodeError;
use outpost_core::{ClockCadence, DeviceId, Node, NodeConfig, Reading};

use common::{Bench, DisplayOp, MockDisplay};

fn test_node() -> Node {
    let config = NodeConfig::new("kw_sensors")
        .unwrap()
        .access_point("homenet", "secret")
        .unwrap();
    let id = DeviceId::parse("A1B2C3D4E5F6").unwrap();
    Node::with_device_id(config, id).unwrap()
}

fn online(node: &mut Node, bench: &mut Bench) {
    bench.tick_at(node, 0);
    bench.tick_at(node, 1);
    assert!(node.is_online());
    bench.display.reset();
}

#[test]
fn test_fixture_topic_composition() {
    let mut node = test_node();
    let temp = node
        .register_data_topic("Temp", "C", "temp", "outdoor")
        .unwrap();

    assert_eq!(temp.index(), 0);
    assert_eq!(
        node.registry().data(temp).unwrap().topic(),
        "kw_sensors/data/temp/outdoor/A1B2C3D4E5F6"
    );
    assert_eq!(
        node.registry().status_topic(),
        "kw_sensors/meta/status/A1B2C3D4E5F6"
    );
}

#[test]
fn test_handle_sequences_are_independent() {
    let mut node = test_node();

    let d0 = node.register_data_topic("Temp", "C", "temp", "a").unwrap();
    let d1 = node.register_data_topic("Hum", "%", "hum", "a").unwrap();
    // The status topic claimed meta handle 0 at construction
    let m1 = node.register_meta_topic("battery").unwrap();
    let m2 = node.register_meta_topic("rssi").unwrap();

    assert_eq!((d0.index(), d1.index()), (0, 1));
    assert_eq!((m1.index(), m2.index()), (1, 2));
    assert_eq!(node.registry().status_handle().index(), 0);
}

#[test]
fn test_form_lays_out_labels_values_and_units() {
    let mut node = test_node();
    let temp = node
        .register_data_topic("Temp", "C", "temp", "outdoor")
        .unwrap();
    let hum = node
        .register_data_topic("Hum", "%", "hum", "outdoor")
        .unwrap();

    let mut display = MockDisplay::new();
    node.setup_form(&mut display);

    // Splash: the device id lands on the status line
    assert_eq!(display.last_status(), Some("A1B2C3D4E5F6"));

    // Labels on lines 0 and 1, units one column past the value cell
    assert!(display.ops.contains(&DisplayOp::Print {
        col: 0,
        row: 0,
        text: "Temp".into()
    }));
    assert!(display.ops.contains(&DisplayOp::Print {
        col: 0,
        row: 2,
        text: "Hum".into()
    }));
    assert!(display.ops.contains(&DisplayOp::Print {
        col: 14,
        row: 0,
        text: "C".into()
    }));
    assert!(display.ops.contains(&DisplayOp::Print {
        col: 14,
        row: 2,
        text: "%".into()
    }));

    // Values clear exactly the shared cell, then print from its left edge
    display.reset();
    node.update(&mut display, temp, Reading::Float(21.5)).unwrap();
    node.update(&mut display, hum, Reading::Unsigned(47)).unwrap();

    assert_eq!(
        display.ops,
        vec![
            DisplayOp::ClearRegion {
                c0: 7,
                c1: 13,
                r0: 0,
                r1: 0
            },
            DisplayOp::Print {
                col: 7,
                row: 0,
                text: "21.5".into()
            },
            DisplayOp::ClearRegion {
                c0: 7,
                c1: 13,
                r0: 2,
                r1: 2
            },
            DisplayOp::Print {
                col: 7,
                row: 2,
                text: "47".into()
            },
        ]
    );
}

#[test]
fn test_clock_renders_only_when_the_second_changes() {
    let mut node = test_node();
    let mut bench = Bench::new();
    online(&mut node, &mut bench);

    bench.clock = FixedClock::new(12, 0, 0);

    assert!(bench.tick_at(&mut node, 2).clock_rendered);
    assert_eq!(bench.display.last_status(), Some("12:00:00"));

    // Same second: nothing re-rendered
    assert!(!bench.tick_at(&mut node, 3).clock_rendered);
    assert_eq!(bench.display.status_writes().len(), 1);

    bench.clock.advance_seconds(1);
    assert!(bench.tick_at(&mut node, 4).clock_rendered);
    assert_eq!(bench.display.last_status(), Some("12:00:01"));
}

#[test]
fn test_placeholder_is_pinned_not_hammered() {
    let mut node = test_node();
    let mut bench = Bench::new();
    online(&mut node, &mut bench);

    // "Time not set" went up during the online ticks; with no lifecycle
    // chatter it is not rewritten
    assert!(!bench.tick_at(&mut node, 2).clock_rendered);
    assert!(bench.display.status_writes().is_empty());

    bench.clock.set(9, 30, 0);
    assert!(bench.tick_at(&mut node, 3).clock_rendered);
    assert_eq!(bench.display.last_status(), Some("09:30:00"));
}

#[test]
fn test_fixed_interval_cadence_ignores_second_changes() {
    let config = NodeConfig::new("kw_sensors")
        .unwrap()
        .access_point("homenet", "secret")
        .unwrap()
        .clock_cadence(ClockCadence::FixedInterval { period_ms: 10_000 });
    let id = DeviceId::parse("A1B2C3D4E5F6").unwrap();
    let mut node = Node::with_device_id(config, id).unwrap();

    let mut bench = Bench::new();
    online(&mut node, &mut bench);
    bench.clock = FixedClock::new(8, 0, 0);

    assert!(bench.tick_at(&mut node, 2_000).clock_rendered);
    assert_eq!(bench.display.last_status(), Some("08:00:00"));

    // The second changed but the refresh interval has not elapsed
    bench.clock.advance_seconds(1);
    assert!(!bench.tick_at(&mut node, 3_000).clock_rendered);

    bench.clock.advance_seconds(1);
    assert!(bench.tick_at(&mut node, 12_000).clock_rendered);
    assert_eq!(bench.display.last_status(), Some("08:00:02"));
}

#[test]
fn test_midnight_is_exact_and_requires_sync() {
    let mut node = test_node();
    let mut bench = Bench::new();
    online(&mut node, &mut bench);

    assert!(!node.is_midnight());
    assert_eq!(node.clock_time(), None);

    bench.clock = FixedClock::new(23, 59, 59);
    bench.tick_at(&mut node, 2);
    assert!(!node.is_midnight());

    bench.clock.advance_seconds(1);
    bench.tick_at(&mut node, 3);
    assert!(node.is_midnight());
    let time = node.clock_time().unwrap();
    assert_eq!((time.hour, time.minute, time.second), (0, 0, 0));
}

#[test]
fn test_stale_handles_are_bounds_checked() {
    let mut wide = test_node();
    wide.register_data_topic("Temp", "C", "temp", "a").unwrap();
    let stale = wide.register_data_topic("Hum", "%", "hum", "a").unwrap();

    let mut narrow = test_node();
    narrow.register_data_topic("Temp", "C", "temp", "a").unwrap();

    let mut display = MockDisplay::new();
    narrow.setup_form(&mut display);

    assert_eq!(
        narrow.update_text(&mut display, stale, "21.5"),
        Err(NodeError::InvalidHandle { index: 1, len: 1 })
    );
}
