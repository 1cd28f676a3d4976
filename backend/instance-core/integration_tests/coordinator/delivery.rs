use crate::helpers::{
    DELIVERY_TIMEOUT, Event, EventLog, QUIET_PERIOD, RecordingWindow, TestEndpoint,
    channel_handler,
};

use instance_core::{
    DEFAULT_MAX_MESSAGE_SIZE, InstanceCoordinator, MAX_MESSAGE_SIZE_LIMIT, Message, Role,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;

/// Parent plus one attached child on a fresh endpoint.
fn parent_and_child(
    endpoint: &TestEndpoint,
    parent: &mut InstanceCoordinator,
    capacity: usize,
) -> InstanceCoordinator {
    let mut child = InstanceCoordinator::new(endpoint.name.clone());
    let role = child
        .initialize(|_: Message<'_>| {}, capacity, None)
        .expect("child initialize");
    assert_eq!(role, Role::Child);
    assert_eq!(parent.role(), Some(Role::Parent));
    child
}

/// **VALUE**: Verifies a child's payload reaches the parent's handler exactly once, intact.
///
/// **WHY THIS MATTERS**: This is the whole point of the coordinator: double-clicking a
/// file while the app is open must hand that file to the running window.
///
/// **BUG THIS CATCHES**: Would catch truncation, a stale byte from a previous message, a
/// duplicate delivery, or the terminator leaking into the payload.
#[test]
fn given_parent_and_child_when_child_sends_then_handler_receives_payload_once() {
    // GIVEN: A parent with a channel handler and an attached child
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 256, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, 256);

    // WHEN: The child sends a payload
    assert!(child.send(b"open C:/songs/level.zip"));

    // THEN: The handler receives exactly those bytes, once
    let received = rx.recv_timeout(DELIVERY_TIMEOUT).expect("message delivered");
    assert_eq!(received, b"open C:/songs/level.zip");
    assert!(rx.recv_timeout(QUIET_PERIOD).is_err(), "delivered more than once");

    drop(child);
    parent.terminate();
}

/// **VALUE**: Verifies messages from one child arrive in send order, each with its own length.
///
/// **BUG THIS CATCHES**: Would catch a longer earlier message bleeding into a shorter
/// later one through the reused buffer.
#[test]
fn given_child_when_sending_several_messages_then_delivered_in_order() {
    // GIVEN: A parent and child
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, 64);

    // WHEN: Sending a long message then shorter ones
    let payloads: [&[u8]; 3] = [b"a much longer first payload", b"short", b"x"];
    for payload in payloads {
        assert!(child.send(payload));
    }

    // THEN: Each arrives in order with its exact length
    for expected in payloads {
        let received = rx.recv_timeout(DELIVERY_TIMEOUT).unwrap();
        assert_eq!(received, expected);
    }

    drop(child);
    parent.terminate();
}

/// **VALUE**: Verifies a payload exactly at capacity is delivered whole.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one that treats a full-size message as
/// oversized.
#[test]
fn given_payload_at_capacity_when_sent_then_delivered_whole() {
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 32, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, 32);

    let payload = [b'z'; 32];
    assert!(child.send(&payload));

    assert_eq!(rx.recv_timeout(DELIVERY_TIMEOUT).unwrap(), payload.to_vec());

    drop(child);
    parent.terminate();
}

/// **VALUE**: Verifies an oversized payload fails on the child and is never delivered.
///
/// **WHY THIS MATTERS**: A truncated file path would open the wrong file; a crash would
/// take down the running app.
///
/// **BUG THIS CATCHES**: Would catch partial delivery, a silent success, or a parent
/// listener that dies after an oversized write.
#[test]
fn given_payload_over_capacity_when_sent_then_fails_and_parent_keeps_working() {
    // GIVEN: A parent with a 16 byte capacity and a child
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 16, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, 16);

    // WHEN: Sending 17 bytes
    let sent = child.send(&[b'!'; 17]);

    // THEN: The send fails and nothing is delivered
    assert!(!sent);
    assert!(rx.recv_timeout(QUIET_PERIOD).is_err());

    // AND: The parent still delivers a valid message afterwards
    assert!(child.send(b"still alive"));
    assert_eq!(rx.recv_timeout(DELIVERY_TIMEOUT).unwrap(), b"still alive");
    assert!(parent.is_listening());

    drop(child);
    parent.terminate();
}

/// **VALUE**: Verifies the parent itself cannot send.
///
/// **BUG THIS CATCHES**: Would catch the parent writing into its own endpoint and
/// triggering its own handler.
#[test]
fn given_parent_when_send_called_then_returns_false_and_nothing_delivered() {
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();

    assert!(!parent.send(b"to myself"));
    assert!(rx.recv_timeout(QUIET_PERIOD).is_err());

    parent.terminate();
}

/// **VALUE**: Verifies each delivery triggers one restore → foreground → focus sequence,
/// after the handler.
///
/// **WHY THIS MATTERS**: Focusing before the handler ran would show a window that has not
/// yet loaded the forwarded file.
///
/// **BUG THIS CATCHES**: Would catch reordered window calls, refocusing once per batch
/// instead of per message, or refocusing without calling the handler.
#[test]
fn given_host_window_when_messages_delivered_then_refocus_follows_each_handler_call() {
    // GIVEN: A parent recording handler calls and window effects into one log
    let endpoint = TestEndpoint::new();
    let log = EventLog::default();
    let (handled_tx, handled_rx) = channel();
    let (focused_tx, focused_rx) = channel();

    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    parent
        .initialize(
            log.handler(handled_tx),
            64,
            Some(RecordingWindow::new(log.clone(), focused_tx)),
        )
        .unwrap();
    let child = parent_and_child(&endpoint, &mut parent, 64);

    // WHEN: Two messages are delivered
    for payload in [b"one".as_slice(), b"two".as_slice()] {
        assert!(child.send(payload));
        handled_rx.recv_timeout(DELIVERY_TIMEOUT).unwrap();
        focused_rx.recv_timeout(DELIVERY_TIMEOUT).unwrap();
    }

    // THEN: Handler, then the three window effects, once per message
    assert_eq!(
        log.snapshot(),
        vec![
            Event::Handled(b"one".to_vec()),
            Event::Restored,
            Event::Foreground,
            Event::Focused,
            Event::Handled(b"two".to_vec()),
            Event::Restored,
            Event::Foreground,
            Event::Focused,
        ]
    );

    drop(child);
    parent.terminate();
}

/// **VALUE**: Verifies a panicking handler does not stop later deliveries.
///
/// **WHY THIS MATTERS**: A bug in the app's handler must not silently turn every later
/// launch into a no-op.
///
/// **BUG THIS CATCHES**: Would catch a listener thread that unwinds on the first panic.
#[test]
fn given_handler_panics_when_next_message_arrives_then_still_delivered() {
    // GIVEN: A handler that panics on its first call only
    let endpoint = TestEndpoint::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = channel();
    let handler_calls = Arc::clone(&calls);
    let handler = move |message: Message<'_>| {
        if handler_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("handler bug");
        }
        let _ = tx.send(message.as_bytes().to_vec());
    };

    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    parent.initialize(handler, 64, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, 64);

    // WHEN: Two messages are sent
    assert!(child.send(b"boom"));
    assert!(child.send(b"after"));

    // THEN: The second is delivered and the listener is alive
    assert_eq!(rx.recv_timeout(DELIVERY_TIMEOUT).unwrap(), b"after");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(parent.is_listening());

    drop(child);
    parent.terminate();
}

/// **VALUE**: Verifies no handler call happens after `terminate` returns.
///
/// **WHY THIS MATTERS**: The handler typically touches GUI state that is being torn down.
///
/// **BUG THIS CATCHES**: Would catch clearing the handler after the endpoint is closed.
#[test]
fn given_terminated_parent_when_child_sends_then_handler_not_called() {
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, 64);

    parent.terminate();
    let _ = child.send(b"late");

    assert!(rx.recv_timeout(QUIET_PERIOD).is_err());
}

/// **VALUE**: Verifies payloads above the BSD default datagram size are delivered.
///
/// **WHY THIS MATTERS**: macOS caps Unix datagrams at the 2048 byte default send buffer.
/// A long list of file paths easily exceeds that at the default 4096 byte capacity.
///
/// **BUG THIS CATCHES**: Would catch socket buffers left at the platform default, which
/// fails the send with `EMSGSIZE` although the payload fits the parent's capacity.
#[test]
fn given_default_capacity_when_payload_exceeds_bsd_datagram_default_then_delivered() {
    // GIVEN: A parent and child at the default capacity
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, DEFAULT_MAX_MESSAGE_SIZE, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, DEFAULT_MAX_MESSAGE_SIZE);

    // WHEN: Sending 3000 bytes, then a full-capacity payload
    let medium = vec![b'm'; 3000];
    let full = vec![b'f'; DEFAULT_MAX_MESSAGE_SIZE];
    assert!(child.send(&medium));
    assert!(child.send(&full));

    // THEN: Both arrive whole
    assert_eq!(rx.recv_timeout(DELIVERY_TIMEOUT).unwrap(), medium);
    assert_eq!(rx.recv_timeout(DELIVERY_TIMEOUT).unwrap(), full);

    drop(child);
    parent.terminate();
}

/// **VALUE**: Verifies the largest capacity the config accepts actually works end to end.
///
/// **BUG THIS CATCHES**: Would catch a config limit the transport cannot carry, so a
/// valid `config.json` produces a parent no child can reach with a full payload.
#[test]
fn given_max_configurable_capacity_when_full_payload_sent_then_delivered() {
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, MAX_MESSAGE_SIZE_LIMIT, None).unwrap();
    let child = parent_and_child(&endpoint, &mut parent, MAX_MESSAGE_SIZE_LIMIT);

    let payload: Vec<u8> = (0..MAX_MESSAGE_SIZE_LIMIT).map(|i| (i % 251) as u8).collect();
    assert!(child.send(&payload));

    assert_eq!(rx.recv_timeout(DELIVERY_TIMEOUT).unwrap(), payload);

    drop(child);
    parent.terminate();
}
