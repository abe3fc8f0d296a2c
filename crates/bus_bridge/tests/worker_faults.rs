use std::time::{Duration, Instant};

use bus_bridge::testing::{wait_until, ScriptedBus, ScriptedConnector};
use bus_bridge::{Bridge, BridgeError, BusEvent, ConnectionConfig, MessageEnvelope, WorkerError};

fn envelope(line: &str) -> MessageEnvelope {
    MessageEnvelope::new(vec![line.to_string()])
}

fn start(bus: &ScriptedBus) -> Bridge {
    Bridge::start(ConnectionConfig::default(), bus.connector()).expect("start bridge")
}

#[test]
fn connection_fault_kills_worker_and_fails_next_submission() {
    let bus = ScriptedBus::new();
    let bridge = start(&bus);

    bridge.submit(envelope("one")).unwrap();
    bridge.submit(envelope("two")).unwrap();
    bridge.submit(envelope("three")).unwrap();

    bus.inject(BusEvent::ConnectionFault {
        condition: "amqp:connection:forced".to_string(),
    });
    wait_until("worker terminated", || !bridge.worker_alive());

    // The three envelopes stay queued and untransmitted.
    assert!(bus.sent().is_empty());
    assert_eq!(bridge.queue_len(), 3);

    let err = bridge.submit(envelope("four")).unwrap_err();
    match err {
        BridgeError::WorkerFailed(WorkerError::Connection { condition }) => {
            assert_eq!(condition, "amqp:connection:forced");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn recoverable_transport_fault_keeps_the_worker_running() {
    let bus = ScriptedBus::new();
    let bridge = start(&bus);

    bus.inject(BusEvent::TransportFault {
        condition: "amqp:connection:framing-error".to_string(),
    });
    std::thread::sleep(Duration::from_millis(100));
    assert!(bridge.worker_alive());

    bus.grant_credit(1);
    bridge.submit(envelope("still-delivered")).unwrap();
    wait_until("delivery after recoverable fault", || bus.sent().len() == 1);

    bridge.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn transport_fault_in_fatal_set_is_escalated() {
    let bus = ScriptedBus::new();
    let bridge = start(&bus);

    // Default fatal set from the resolved config.
    bus.inject(BusEvent::TransportFault {
        condition: "amqp:unauthorized-access".to_string(),
    });
    wait_until("worker terminated", || !bridge.worker_alive());

    let err = bridge.submit(envelope("rejected")).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::WorkerFailed(WorkerError::Transport { .. })
    ));
}

#[test]
fn link_fault_is_always_fatal() {
    let bus = ScriptedBus::new();
    let bridge = start(&bus);

    bus.inject(BusEvent::LinkFault {
        condition: "amqp:link:detach-forced".to_string(),
    });
    wait_until("worker terminated", || !bridge.worker_alive());

    let err = bridge.submit(envelope("rejected")).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::WorkerFailed(WorkerError::Link { .. })
    ));
}

#[test]
fn connect_failure_surfaces_through_the_watchdog() {
    let connector = ScriptedConnector::failing(WorkerError::Connect("refused".to_string()));
    let bridge = Bridge::start(ConnectionConfig::default(), connector).expect("start bridge");

    wait_until("worker terminated", || !bridge.worker_alive());
    let err = bridge.submit(envelope("never")).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::WorkerFailed(WorkerError::Connect(_))
    ));
}

#[test]
fn shutdown_returns_within_its_bound_for_a_stuck_worker() {
    let connector = ScriptedConnector::stuck_for(Duration::from_secs(10));
    let bridge = Bridge::start(ConnectionConfig::default(), connector).expect("start bridge");

    let started = Instant::now();
    bridge.shutdown(Duration::from_millis(200)).unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn clean_shutdown_closes_the_link() {
    let bus = ScriptedBus::new();
    let bridge = start(&bus);

    bridge.shutdown(Duration::from_secs(5)).unwrap();
    assert!(bus.is_closed());
}
