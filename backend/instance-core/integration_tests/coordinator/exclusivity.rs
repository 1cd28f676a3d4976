use crate::helpers::{TestEndpoint, channel_handler};

use instance_core::error::InitError;
use instance_core::{InstanceCoordinator, Message, Role};

use std::sync::{Arc, Barrier};
use std::thread;

const RACERS: usize = 8;

/// **VALUE**: Verifies that launches racing on one endpoint produce exactly one parent.
///
/// **WHY THIS MATTERS**: Selecting several files in Explorer and pressing Enter starts many
/// processes at once. Two parents would mean two windows that each get half the files.
///
/// **BUG THIS CATCHES**: Would catch a create path that is not exclusive, such as binding
/// over a live socket or removing another parent's socket file.
#[test]
fn given_simultaneous_launches_when_initializing_then_exactly_one_parent() {
    // GIVEN: Several threads released at the same instant
    let endpoint = TestEndpoint::new();
    let barrier = Arc::new(Barrier::new(RACERS));

    let racers: Vec<_> = (0..RACERS)
        .map(|_| {
            let name = endpoint.name.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut coordinator = InstanceCoordinator::new(name);
                barrier.wait();
                let result = coordinator.initialize(|_: Message<'_>| {}, 64, None);
                (coordinator, result)
            })
        })
        .collect();

    // WHEN: All of them initialize
    let outcomes: Vec<_> = racers
        .into_iter()
        .map(|racer| racer.join().expect("racer thread"))
        .collect();

    // THEN: One parent; everyone else is a child or lost the race cleanly
    let parents = outcomes
        .iter()
        .filter(|(_, result)| matches!(result, Ok(Role::Parent)))
        .count();
    assert_eq!(parents, 1, "outcomes: {:?}", outcomes.iter().map(|(_, r)| r).collect::<Vec<_>>());

    for (_, result) in &outcomes {
        match result {
            Ok(_) | Err(InitError::Contention { .. }) => {}
            Err(other) => panic!("unexpected initialize error: {other}"),
        }
    }

    // Children first so the parent outlives every attached sender.
    let (mut parent, mut others): (Vec<_>, Vec<_>) = outcomes
        .into_iter()
        .map(|(coordinator, _)| coordinator)
        .partition(|coordinator| coordinator.role() == Some(Role::Parent));
    others.iter_mut().for_each(InstanceCoordinator::terminate);
    parent.iter_mut().for_each(InstanceCoordinator::terminate);
}

/// **VALUE**: Verifies every launch after the parent is up becomes a child.
///
/// **BUG THIS CATCHES**: Would catch a child attach that disturbs the endpoint, so that a
/// later launch fails to attach or becomes a second parent.
#[test]
fn given_running_parent_when_many_launches_follow_then_all_become_children() {
    // GIVEN: A parent
    let endpoint = TestEndpoint::new();
    let mut parent = InstanceCoordinator::new(endpoint.name.clone());
    let (handler, _rx) = channel_handler();
    assert_eq!(parent.initialize(handler, 64, None).unwrap(), Role::Parent);

    // WHEN: Launching one child after another, each exiting before the next
    for _ in 0..RACERS {
        let mut child = InstanceCoordinator::new(endpoint.name.clone());
        let role = child.initialize(|_: Message<'_>| {}, 64, None).unwrap();

        // THEN: Each one is a child and can reach the parent
        assert_eq!(role, Role::Child);
        assert!(child.send(b"ping"));
        child.terminate();
    }

    assert!(parent.is_listening());
    parent.terminate();
}
