//! Test helpers for coordinator integration tests.
//!
//! - Isolated endpoints (temp directory on Unix, unique mailslot on Windows)
//! - A handler that forwards payloads to a channel
//! - A host window that records focus requests next to handler calls

use instance_core::{EndpointName, HostWindow, Message};

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

/// How long a test waits for something that should happen promptly.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a test waits to be confident something did *not* happen.
pub const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Endpoint nobody else uses, plus whatever keeps it isolated alive.
pub struct TestEndpoint {
    pub name: EndpointName,
    #[cfg(unix)]
    _dir: tempfile::TempDir,
}

impl TestEndpoint {
    #[cfg(unix)]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let name = EndpointName::in_dir(&unique_name(), dir.path())
            .expect("Generated name should be valid");
        Self { name, _dir: dir }
    }

    #[cfg(windows)]
    pub fn new() -> Self {
        let name = EndpointName::new(&unique_name()).expect("Generated name should be valid");
        Self { name }
    }
}

fn unique_name() -> String {
    format!("test_{}", Uuid::new_v4().simple())
}

/// Handler that pushes a copy of every payload into a channel.
pub fn channel_handler() -> (
    impl Fn(Message<'_>) + Send + Sync + 'static,
    Receiver<Vec<u8>>,
) {
    let (tx, rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = channel();
    let handler = move |message: Message<'_>| {
        let _ = tx.send(message.as_bytes().to_vec());
    };
    (handler, rx)
}

/// One observable step of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Handled(Vec<u8>),
    Restored,
    Foreground,
    Focused,
}

/// Shared, ordered record of handler calls and window effects.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Handler that records `Handled` and signals `done` afterwards.
    pub fn handler(
        &self,
        done: Sender<()>,
    ) -> impl Fn(Message<'_>) + Send + Sync + 'static {
        let log = self.clone();
        move |message: Message<'_>| {
            log.push(Event::Handled(message.as_bytes().to_vec()));
            let _ = done.send(());
        }
    }
}

/// Host window that records focus requests into an [`EventLog`].
pub struct RecordingWindow {
    log: EventLog,
    focused: Sender<()>,
}

impl RecordingWindow {
    /// `focused` fires once per completed refocus sequence.
    pub fn new(log: EventLog, focused: Sender<()>) -> Arc<dyn HostWindow> {
        Arc::new(Self { log, focused })
    }
}

impl HostWindow for RecordingWindow {
    fn restore_if_minimized(&self) {
        self.log.push(Event::Restored);
    }

    fn bring_to_foreground(&self) {
        self.log.push(Event::Foreground);
    }

    fn set_input_focus(&self) {
        self.log.push(Event::Focused);
        let _ = self.focused.send(());
    }
}
