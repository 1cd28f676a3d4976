// Unit tests for coordinator internals that need no endpoint

use crate::coordinator::allocate_buffer;
use crate::coordinator::{CoordinatorState, Role};
use crate::error::InitError;

/// **VALUE**: Verifies the receive buffer has one spare byte past the capacity.
///
/// **WHY THIS MATTERS**: The listener writes the terminator at `buffer[n]` and uses the
/// spare byte to detect oversized datagrams. Without it a full-size message would write
/// out of bounds.
///
/// **BUG THIS CATCHES**: Would catch allocating exactly `capacity` bytes.
#[test]
fn given_capacity_when_buffer_allocated_then_has_one_spare_zeroed_byte() {
    // GIVEN / WHEN: A buffer for 16 byte messages
    let buffer = allocate_buffer(16).expect("small allocation should succeed");

    // THEN: 17 zeroed bytes
    assert_eq!(buffer.len(), 17);
    assert!(buffer.iter().all(|byte| *byte == 0));
}

/// **VALUE**: Verifies impossible capacities surface as `AllocationFailed`.
///
/// **WHY THIS MATTERS**: A bad capacity coming from the host must not abort the process.
///
/// **BUG THIS CATCHES**: Would catch `vec![0; n]` style allocation that aborts on failure
/// and an unchecked `capacity + 1` that overflows.
#[test]
fn given_impossible_capacity_when_buffer_allocated_then_returns_allocation_failed() {
    // GIVEN: Capacities that overflow or exceed isize::MAX
    for capacity in [usize::MAX, usize::MAX - 1] {
        // WHEN: Allocating
        let result = allocate_buffer(capacity);

        // THEN: A typed error, not an abort
        assert!(
            matches!(result, Err(InitError::AllocationFailed { .. })),
            "capacity {capacity} should fail to allocate"
        );
    }
}

/// **VALUE**: Verifies the state-to-role mapping used by `role()` and `initialize`.
///
/// **BUG THIS CATCHES**: Would catch `Failed` being reported as initialized, which would
/// block the host from retrying `initialize`.
#[test]
fn given_each_state_when_role_queried_then_only_parent_and_child_have_roles() {
    assert_eq!(CoordinatorState::Parent.role(), Some(Role::Parent));
    assert_eq!(CoordinatorState::Child.role(), Some(Role::Child));
    assert_eq!(CoordinatorState::Uninitialized.role(), None);
    assert_eq!(CoordinatorState::Failed.role(), None);
    assert!(!CoordinatorState::Failed.is_initialized());
    assert_eq!(CoordinatorState::default(), CoordinatorState::Uninitialized);
    assert_eq!(CoordinatorState::from(Role::Child), CoordinatorState::Child);
}

/// **VALUE**: Verifies the lower-case names used in log lines.
#[test]
fn given_roles_and_states_when_displayed_then_lower_case() {
    assert_eq!(Role::Parent.to_string(), "parent");
    assert_eq!(Role::Child.to_string(), "child");
    assert_eq!(CoordinatorState::Failed.to_string(), "failed");
}
