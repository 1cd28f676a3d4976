// Unit tests for the startup policy

use crate::app::{Outcome, resolve_config, start, wait_for_quit};
use crate::cli::Cli;
use crate::window::ConsoleWindow;

use instance_core::{EndpointName, HostWindow, InstanceConfig, InstanceCoordinator, Role};

use std::io::Cursor;
use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;
use uuid::Uuid;

/// Isolated endpoint; the temp dir keeps Unix sockets out of the user's runtime dir.
fn isolated_endpoint(dir: &TempDir) -> EndpointName {
    let name = format!("test_{}", Uuid::new_v4().simple());
    #[cfg(unix)]
    let endpoint = EndpointName::in_dir(&name, dir.path()).unwrap();
    #[cfg(windows)]
    let endpoint = {
        let _ = dir;
        EndpointName::new(&name).unwrap()
    };
    endpoint
}

fn window() -> Arc<dyn HostWindow> {
    Arc::new(ConsoleWindow::new("test"))
}

/// **VALUE**: Verifies the first launch becomes parent.
///
/// **BUG THIS CATCHES**: Would catch the policy treating a missing parent as a failure
/// and running standalone.
#[test]
fn given_no_running_instance_when_started_then_parent() {
    // GIVEN: An unused endpoint
    let dir = TempDir::new().unwrap();
    let mut coordinator = InstanceCoordinator::new(isolated_endpoint(&dir));

    // WHEN: Starting
    let outcome = start(&mut coordinator, &InstanceConfig::default(), b"song.zip", window());

    // THEN: Parent
    assert_eq!(outcome, Outcome::Parent);
    assert_eq!(coordinator.role(), Some(Role::Parent));
    coordinator.terminate();
}

/// **VALUE**: Verifies a second launch forwards its payload and reports it is done.
///
/// **WHY THIS MATTERS**: `main` exits on `Forwarded`; any other outcome would open a
/// second window.
#[test]
fn given_running_instance_when_started_then_forwarded() {
    // GIVEN: A parent on the endpoint
    let dir = TempDir::new().unwrap();
    let endpoint = isolated_endpoint(&dir);
    let mut parent = InstanceCoordinator::new(endpoint.clone());
    assert_eq!(
        start(&mut parent, &InstanceConfig::default(), b"", window()),
        Outcome::Parent
    );

    // WHEN: A second launch starts
    let mut child = InstanceCoordinator::new(endpoint);
    let outcome = start(&mut child, &InstanceConfig::default(), b"song.zip", window());

    // THEN: The payload was forwarded
    assert_eq!(outcome, Outcome::Forwarded);

    child.terminate();
    parent.terminate();
}

/// **VALUE**: Verifies a rejected send makes the child try to take over, and when the
/// parent is still alive it falls back to standalone instead of exiting.
///
/// **BUG THIS CATCHES**: Would catch the takeover retrying forever, or a child that
/// exits with its payload lost.
#[test]
fn given_payload_parent_rejects_when_started_then_standalone() {
    // GIVEN: A parent with a tiny capacity
    let dir = TempDir::new().unwrap();
    let endpoint = isolated_endpoint(&dir);
    let small = InstanceConfig {
        max_message_size: 4,
        ..InstanceConfig::default()
    };
    let mut parent = InstanceCoordinator::new(endpoint.clone());
    assert_eq!(start(&mut parent, &small, b"", window()), Outcome::Parent);

    // WHEN: A child sends more than the parent accepts
    let mut child = InstanceCoordinator::new(endpoint);
    let outcome = start(&mut child, &small, b"far too long", window());

    // THEN: Takeover fails because the parent is alive, so the child runs standalone
    assert_eq!(outcome, Outcome::Standalone);
    assert_eq!(child.role(), None);
    assert_eq!(parent.role(), Some(Role::Parent));

    parent.terminate();
}

/// **VALUE**: Verifies a coordinator failure leads to standalone, not an exit.
///
/// **WHY THIS MATTERS**: The app must stay usable when single-instance setup is broken.
#[test]
fn given_initialize_fails_when_started_then_standalone() {
    let dir = TempDir::new().unwrap();
    let mut coordinator = InstanceCoordinator::new(isolated_endpoint(&dir));
    let broken = InstanceConfig {
        max_message_size: 0,
        ..InstanceConfig::default()
    };

    let outcome = start(&mut coordinator, &broken, b"song.zip", window());

    assert_eq!(outcome, Outcome::Standalone);
}

/// **VALUE**: Verifies command line overrides win over the config file.
///
/// **BUG THIS CATCHES**: Would catch overrides applied before `load`, which then
/// replaces them with the file's values.
#[test]
fn given_file_and_overrides_when_resolved_then_overrides_win() {
    // GIVEN: A saved config and a command line overriding it
    let dir = TempDir::new().unwrap();
    InstanceConfig {
        endpoint_name: "from_file".to_string(),
        max_message_size: 2048,
        ..InstanceConfig::default()
    }
    .save(dir.path())
    .unwrap();
    let config_arg = dir.path().to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "songmanager",
        "--config",
        config_arg.as_str(),
        "--endpoint",
        "from_cli",
    ])
    .unwrap();

    // WHEN: Resolving
    let config = resolve_config(&cli).unwrap();

    // THEN: Endpoint from the command line, capacity from the file
    assert_eq!(config.endpoint_name, "from_cli");
    assert_eq!(config.max_message_size, 2048);
}

/// **VALUE**: Verifies an invalid override is reported as a config error.
#[test]
fn given_invalid_endpoint_override_when_resolved_then_config_error() {
    let dir = TempDir::new().unwrap();
    let config_arg = dir.path().to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "songmanager",
        "--config",
        config_arg.as_str(),
        "--endpoint",
        "bad/name",
    ])
    .unwrap();

    let err = resolve_config(&cli).unwrap_err();

    assert!(err.to_string().starts_with("Config Error:"), "{err}");
}

/// **VALUE**: Verifies the parent's stdin loop stops at `quit` and at EOF.
///
/// **BUG THIS CATCHES**: Would catch a loop that only stops on EOF, leaving the parent
/// hanging when the user types `quit`.
#[test]
fn given_stdin_when_waiting_then_returns_on_quit_or_eof() {
    // `quit` before EOF: the trailing line is never read.
    let mut input = Cursor::new(b"hello\n quit \nafter\n".to_vec());
    wait_for_quit(&mut input);
    assert!((input.position() as usize) < input.get_ref().len());

    let mut empty = Cursor::new(Vec::new());
    wait_for_quit(&mut empty);
}
