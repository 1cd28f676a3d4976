use crate::helpers::{QUIET_PERIOD, TestEndpoint, channel_handler};

use instance_core::error::InitError;
use instance_core::{CoordinatorState, InstanceCoordinator, Message, Role};

/// **VALUE**: Verifies a zero capacity is rejected before anything is created.
///
/// **WHY THIS MATTERS**: A zero capacity parent could never deliver a message, yet it would
/// still claim the endpoint and swallow every later launch.
///
/// **BUG THIS CATCHES**: Would catch the check running after `create`, leaving a live
/// endpoint behind a failed coordinator.
#[test]
fn given_zero_capacity_when_initialize_then_invalid_capacity_and_endpoint_free() {
    // GIVEN: A fresh coordinator
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());

    // WHEN: Initializing with capacity zero
    let result = coordinator.initialize(|_: Message<'_>| {}, 0, None);

    // THEN: InvalidCapacity, Failed state, and the endpoint is still free
    assert!(matches!(result, Err(InitError::InvalidCapacity { .. })));
    assert_eq!(coordinator.state(), CoordinatorState::Failed);
    assert_eq!(coordinator.role(), None);

    let mut other = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    assert_eq!(other.initialize(handler, 64, None).unwrap(), Role::Parent);
    other.terminate();
}

/// **VALUE**: Verifies a failed coordinator can be initialized again.
///
/// **BUG THIS CATCHES**: Would catch `Failed` being treated as initialized, which would
/// turn one bad argument into a permanent `AlreadyInitialized`.
#[test]
fn given_failed_coordinator_when_initialize_again_then_succeeds() {
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());
    let _ = coordinator.initialize(|_: Message<'_>| {}, 0, None);
    assert_eq!(coordinator.state(), CoordinatorState::Failed);

    let (handler, _rx) = channel_handler();
    let role = coordinator.initialize(handler, 64, None).unwrap();

    assert_eq!(role, Role::Parent);
    assert!(coordinator.is_listening());
    coordinator.terminate();
    assert_eq!(coordinator.state(), CoordinatorState::Uninitialized);
}

/// **VALUE**: Verifies an impossible buffer size is reported instead of aborting the process.
///
/// **BUG THIS CATCHES**: Would catch `vec![0; n + 1]`, which overflows or aborts on OOM.
#[test]
fn given_huge_capacity_when_initialize_then_allocation_failed() {
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());

    let result = coordinator.initialize(|_: Message<'_>| {}, usize::MAX, None);

    assert!(matches!(result, Err(InitError::AllocationFailed { .. })));
    assert_eq!(coordinator.state(), CoordinatorState::Failed);
}

/// **VALUE**: Verifies init errors render with their kind, message and call site.
///
/// **WHY THIS MATTERS**: The app logs these and then keeps running standalone, so the log
/// line is all a user can send in a bug report.
///
/// **BUG THIS CATCHES**: Would catch a missing location or a variant with the wrong label.
#[test]
fn given_init_error_when_displayed_then_includes_kind_and_location() {
    let endpoint = TestEndpoint::new();
    let mut coordinator = InstanceCoordinator::new(endpoint.name.clone());

    let error = coordinator
        .initialize(|_: Message<'_>| {}, 0, None)
        .unwrap_err();
    let rendered = error.to_string();

    assert!(rendered.starts_with("Invalid Capacity Error:"), "{rendered}");
    assert!(rendered.contains("greater than zero"), "{rendered}");
    assert!(rendered.contains(".rs:"), "{rendered}");
}

/// **VALUE**: Verifies `AlreadyInitialized` leaves the running role untouched.
///
/// **BUG THIS CATCHES**: Would catch the early return tearing down the live listener or
/// flipping the state to Failed.
#[test]
fn given_parent_when_initialize_again_then_already_initialized_and_still_parent() {
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();

    let error = parent
        .initialize(|_: Message<'_>| {}, 64, None)
        .unwrap_err();

    assert!(matches!(error, InitError::AlreadyInitialized { .. }));
    assert!(error.to_string().starts_with("Already Initialized Error:"));
    assert_eq!(parent.state(), CoordinatorState::Parent);
    assert!(parent.is_listening());
    parent.terminate();
}

/// **VALUE**: Verifies a launcher that cannot learn the parent's capacity does not attach.
///
/// **WHY THIS MATTERS**: Without the capacity a child cannot refuse an oversized payload,
/// so its send would report success while the parent drops the message.
///
/// **BUG THIS CATCHES**: Would catch `attach` falling back to an unchecked sender when the
/// lock file is unreadable or holds garbage.
#[test]
#[cfg(unix)]
fn given_unreadable_parent_capacity_when_initialize_then_contention() {
    // GIVEN: A live parent whose published capacity has been overwritten
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, rx) = channel_handler();
    parent.initialize(handler, 64, None).unwrap();
    std::fs::write(endpoint.name.lock_path(), "not a number").unwrap();

    // WHEN: Another launch initializes
    let mut other = InstanceCoordinator::new(endpoint.name.clone());
    let result = other.initialize(|_: Message<'_>| {}, 64, None);

    // THEN: It neither attaches nor takes the endpoint, and nothing is delivered
    assert!(matches!(result, Err(InitError::Contention { .. })), "{result:?}");
    assert_eq!(other.state(), CoordinatorState::Failed);
    assert!(!other.send(b"lost"));
    assert!(rx.recv_timeout(QUIET_PERIOD).is_err());
    assert!(parent.is_listening());

    parent.terminate();
}
