use crate::helpers::{DELIVERY_TIMEOUT, TestEndpoint, channel_handler};

use instance_core::error::InitError;
use instance_core::{CoordinatorState, InstanceCoordinator, Message, Role};

use std::sync::mpsc::channel;
use std::thread;
use std::time::Instant;

/// **VALUE**: Verifies the first launch on an unused endpoint becomes parent and listens.
///
/// **WHY THIS MATTERS**: This is the cold-start path every user hits first. If it fails,
/// the app never receives forwarded launches.
///
/// **BUG THIS CATCHES**: Would catch `initialize` returning Child on a missing endpoint or
/// forgetting to start the listener.
#[test]
fn given_no_parent_when_initialize_then_becomes_listening_parent() {
    // GIVEN: An endpoint nobody owns
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();

    // WHEN: Initializing
    let role = coordinator.initialize(handler, 64, None).expect("initialize");

    // THEN: Parent with a running listener
    assert_eq!(role, Role::Parent);
    assert_eq!(coordinator.state(), CoordinatorState::Parent);
    assert!(coordinator.is_listening());

    coordinator.terminate();
}

/// **VALUE**: Verifies a launch after the parent attaches as child and starts no listener.
///
/// **BUG THIS CATCHES**: Would catch a child spawning its own listener or creating a
/// second endpoint.
#[test]
fn given_running_parent_when_second_initialize_then_becomes_child() {
    // GIVEN: A parent
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();

    // WHEN: A second coordinator initializes on the same endpoint
    let mut child = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx2) = channel_handler();
    let role = child.initialize(handler, 64, None).unwrap();

    // THEN: Child, not listening
    assert_eq!(role, Role::Child);
    assert_eq!(child.role(), Some(Role::Child));
    assert!(!child.is_listening());

    child.terminate();
    parent.terminate();
}

/// **VALUE**: Verifies `terminate` stops a listener that is blocked in a read.
///
/// **WHY THIS MATTERS**: The app calls `terminate` while closing. If the blocked read is
/// not released, the app hangs on exit.
///
/// **BUG THIS CATCHES**: Would catch closing the endpoint after the join instead of before,
/// or a close that does not wake the reader.
#[test]
fn given_idle_parent_when_terminated_then_returns_within_bounded_time() {
    // GIVEN: A parent whose listener is blocked waiting for a message
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();
    thread::sleep(std::time::Duration::from_millis(50));

    // WHEN: Terminating on another thread
    let (done_tx, done_rx) = channel();
    let started = Instant::now();
    let worker = thread::spawn(move || {
        parent.terminate();
        let _ = done_tx.send(parent.state());
    });

    // THEN: Terminate completes promptly and leaves the coordinator uninitialized
    let state = done_rx
        .recv_timeout(DELIVERY_TIMEOUT)
        .expect("terminate should not hang on a blocked listener");
    assert_eq!(state, CoordinatorState::Uninitialized);
    assert!(started.elapsed() < DELIVERY_TIMEOUT);
    worker.join().unwrap();
}

/// **VALUE**: Verifies parent cycles on one endpoint keep working, with a child
/// delivering in every cycle.
///
/// **WHY THIS MATTERS**: Closing wakes the listener while its read handle is still open.
/// Releasing the handle any earlier lets a read race against a freed handle value.
///
/// **BUG THIS CATCHES**: Would catch a receiver that closes its handle before the join, or
/// a wake message that leaks into the next parent's handler.
#[test]
fn given_repeated_parent_cycles_when_terminated_then_each_closes_cleanly() {
    let endpoint = TestEndpoint::new();

    for cycle in 0..5u8 {
        // GIVEN: A fresh parent and child on the same endpoint
        let mut parent = InstanceCoordinator::new(endpoint.name.clone());
        let (handler, rx) = channel_handler();
        assert_eq!(parent.initialize(handler, 64, None).unwrap(), Role::Parent);

        let mut child = InstanceCoordinator::new(endpoint.name.clone());
        assert_eq!(child.initialize(|_: Message<'_>| {}, 64, None).unwrap(), Role::Child);
        assert!(child.send(&[b'0' + cycle]));
        assert_eq!(rx.recv_timeout(DELIVERY_TIMEOUT).unwrap(), vec![b'0' + cycle]);

        // WHEN: Both terminate
        child.terminate();
        let started = Instant::now();
        parent.terminate();

        // THEN: Prompt, and only the child's payload was ever handled
        assert!(started.elapsed() < DELIVERY_TIMEOUT, "cycle {cycle}");
        assert!(rx.try_recv().is_err(), "cycle {cycle}");
    }
}

/// **VALUE**: Verifies `terminate` is harmless without a prior `initialize`, and repeatable.
///
/// **WHY THIS MATTERS**: Shutdown paths call it unconditionally, including after a failed
/// startup.
///
/// **BUG THIS CATCHES**: Would catch a panic on a missing channel or listener.
#[test]
fn given_uninitialized_coordinator_when_terminated_twice_then_no_panic() {
    // GIVEN: A fresh coordinator
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());

    // WHEN: Terminating twice
    coordinator.terminate();
    coordinator.terminate();

    // THEN: Still uninitialized
    assert_eq!(coordinator.state(), CoordinatorState::Uninitialized);
}

/// **VALUE**: Verifies a child cannot send once it has been terminated.
///
/// **BUG THIS CATCHES**: Would catch `terminate` leaving the write side open.
#[test]
fn given_terminated_child_when_send_then_returns_false() {
    // GIVEN: A parent and a child that is then terminated
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();

    let mut child = InstanceCoordinator::new(endpoint.name.clone());
    let (child_handler, _child_rx) = channel_handler();
    assert_eq!(child.initialize(child_handler, 64, None).unwrap(), Role::Child);
    child.terminate();

    // WHEN: Sending after terminate
    let sent = child.send(b"too late");

    // THEN: Failure, and nothing reaches the parent
    assert!(!sent);
    assert!(rx.recv_timeout(crate::helpers::QUIET_PERIOD).is_err());

    parent.terminate();
}

/// **VALUE**: Verifies a child's send fails once the parent has gone away.
///
/// **WHY THIS MATTERS**: The host uses this failure to promote itself to parent.
///
/// **BUG THIS CATCHES**: Would catch a write that reports success into a dead endpoint.
///
/// Unix only: a mailslot client handle may keep accepting writes after the
/// server handle is closed.
#[test]
#[cfg(unix)]
fn given_parent_terminated_when_child_sends_then_returns_false() {
    // GIVEN: A child whose parent then terminates
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();

    let mut child = InstanceCoordinator::new(endpoint.name.clone());
    let (child_handler, _child_rx) = channel_handler();
    child.initialize(child_handler, 64, None).unwrap();
    parent.terminate();

    // WHEN: The child sends
    let sent = child.send(b"anyone there?");

    // THEN: Failure
    assert!(!sent);
    child.terminate();
}

/// **VALUE**: Verifies the endpoint is free again after the parent terminates.
///
/// **WHY THIS MATTERS**: Closing and relaunching the app must make the new launch parent.
///
/// **BUG THIS CATCHES**: Would catch a lock or socket file that outlives `terminate`.
#[test]
fn given_parent_terminated_when_new_coordinator_initializes_then_becomes_parent() {
    // GIVEN: A parent that has terminated
    let endpoint = TestEndpoint::new();
    let mut first = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    assert_eq!(first.initialize(handler, 64, None).unwrap(), Role::Parent);
    first.terminate();

    // WHEN: A new coordinator initializes
    let mut second = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx2) = channel_handler();
    let role = second.initialize(handler, 64, None).unwrap();

    // THEN: It becomes parent
    assert_eq!(role, Role::Parent);
    second.terminate();
}

/// **VALUE**: Verifies the same coordinator can be initialized again after terminate.
#[test]
fn given_terminated_parent_when_reinitialized_then_becomes_parent_again() {
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());

    let (handler, _rx) = channel_handler();
    assert_eq!(coordinator.initialize(handler, 64, None).unwrap(), Role::Parent);
    coordinator.terminate();

    let (handler, _rx2) = channel_handler();
    assert_eq!(coordinator.initialize(handler, 64, None).unwrap(), Role::Parent);
    coordinator.terminate();
}

/// **VALUE**: Verifies a second `initialize` on a live coordinator is refused and harmless.
///
/// **BUG THIS CATCHES**: Would catch a second call leaking the first endpoint or
/// replacing the running listener.
#[test]
fn given_initialized_parent_when_initialize_again_then_already_initialized() {
    // GIVEN: A parent
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    coordinator.initialize(handler, 64, None).unwrap();

    // WHEN: Initializing again
    let result = coordinator.initialize(|_: Message<'_>| {}, 64, None);

    // THEN: Refused, and the original listener is untouched
    assert!(matches!(result, Err(InitError::AlreadyInitialized { .. })));
    assert_eq!(coordinator.state(), CoordinatorState::Parent);
    assert!(coordinator.is_listening());

    coordinator.terminate();
}

/// **VALUE**: Verifies dropping a parent releases the endpoint.
///
/// **BUG THIS CATCHES**: Would catch a missing `Drop` that leaves the listener running and
/// the endpoint owned.
#[test]
fn given_parent_dropped_when_new_coordinator_initializes_then_becomes_parent() {
    let endpoint = TestEndpoint::new();
    {
        let mut parent = InstanceCoordinator::new(endpoint.name.clone());
        let (handler, _rx) = channel_handler();
        assert_eq!(parent.initialize(handler, 64, None).unwrap(), Role::Parent);
    }

    let mut next = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    assert_eq!(next.initialize(handler, 64, None).unwrap(), Role::Parent);
}

/// **VALUE**: Verifies a socket left behind by a crashed parent does not block new launches.
///
/// **WHY THIS MATTERS**: After a crash the socket file remains but no process holds the
/// lock. Without reclaiming it every later launch would fail with contention.
///
/// **BUG THIS CATCHES**: Would catch relying on the socket file's existence for exclusivity.
#[cfg(unix)]
#[test]
fn given_stale_socket_file_when_initialize_then_reclaims_and_becomes_parent() {
    use std::os::unix::net::UnixDatagram;

    // GIVEN: A socket file whose owner is gone
    let endpoint = TestEndpoint::new();
    drop(UnixDatagram::bind(endpoint.name.socket_path()).unwrap());
    assert!(endpoint.name.socket_path().exists());

    // WHEN: Initializing
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    let role = coordinator.initialize(handler, 64, None).unwrap();

    // THEN: The stale socket is replaced and we are parent
    assert_eq!(role, Role::Parent);
    coordinator.terminate();
    assert!(!endpoint.name.socket_path().exists());
}
