use std::time::Duration;

use bus_bridge::testing::{wait_until, ScriptedBus};
use bus_bridge::{Bridge, BusEvent, ConnectionConfig, MessageEnvelope};

fn envelope(lines: &[&str]) -> MessageEnvelope {
    MessageEnvelope::new(lines.iter().map(|l| l.to_string()).collect())
}

fn start(bus: &ScriptedBus) -> Bridge {
    Bridge::start(ConnectionConfig::default(), bus.connector()).expect("start bridge")
}

#[test]
fn envelopes_are_transmitted_in_submission_order() {
    let bus = ScriptedBus::new();
    bus.grant_credit(100);
    let bridge = start(&bus);

    let batches: Vec<MessageEnvelope> = (0..5)
        .map(|i| envelope(&[&format!("batch-{i}")]))
        .collect();
    for batch in &batches {
        bridge.submit(batch.clone()).unwrap();
    }

    wait_until("all batches transmitted", || bus.sent().len() == 5);
    assert_eq!(bus.sent(), batches);

    bridge.shutdown(Duration::from_secs(5)).unwrap();
    assert!(bus.is_closed());
}

#[test]
fn zero_credit_holds_batches_without_loss() {
    let bus = ScriptedBus::new();
    let bridge = start(&bus);

    bridge.submit(envelope(&["a"])).unwrap();
    bridge.submit(envelope(&["b"])).unwrap();
    bridge.submit(envelope(&["c"])).unwrap();

    // Give the worker a moment: with no credit nothing may be transmitted.
    std::thread::sleep(Duration::from_millis(100));
    assert!(bus.sent().is_empty());
    assert_eq!(bridge.queue_len(), 3);

    bus.grant_credit(3);
    wait_until("held batches drained after credit grant", || {
        bus.sent().len() == 3
    });
    assert_eq!(bridge.queue_len(), 0);
    assert_eq!(bus.sent(), [envelope(&["a"]), envelope(&["b"]), envelope(&["c"])]);

    bridge.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn partial_credit_sends_only_what_the_peer_allows() {
    let bus = ScriptedBus::new();
    bus.grant_credit(1);
    let bridge = start(&bus);

    bridge.submit(envelope(&["first"])).unwrap();
    bridge.submit(envelope(&["second"])).unwrap();

    wait_until("first batch transmitted", || bus.sent().len() == 1);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(bus.sent().len(), 1);
    assert_eq!(bridge.queue_len(), 1);

    bus.grant_credit(1);
    wait_until("second batch transmitted", || bus.sent().len() == 2);
    assert_eq!(bus.sent()[1], envelope(&["second"]));

    bridge.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn redundant_wakes_do_not_duplicate_sends() {
    let bus = ScriptedBus::new();
    bus.grant_credit(10);
    let bridge = start(&bus);

    bridge.submit(envelope(&["only"])).unwrap();
    wait_until("batch transmitted", || bus.sent().len() == 1);

    // Extra work notifications with nothing queued are no-op drain passes.
    bus.inject(BusEvent::WorkAvailable);
    bus.inject(BusEvent::WorkAvailable);
    bus.inject(BusEvent::WorkAvailable);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(bus.sent().len(), 1);

    bridge.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn single_batch_is_transmitted_as_a_single_unit() {
    let bus = ScriptedBus::new();
    let bridge = start(&bus);

    bridge.submit(envelope(&["a", "b", "c"])).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert!(bus.sent().is_empty());

    bus.grant_credit(1);
    wait_until("batch transmitted once credit arrives", || {
        bus.sent().len() == 1
    });
    assert_eq!(bus.sent()[0].payload(), ["a", "b", "c"]);

    bridge.shutdown(Duration::from_secs(5)).unwrap();
}
