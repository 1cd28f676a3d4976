//! Parent-side receive loop.

use crate::endpoint::Receiver;
use crate::handler::{HostWindow, Message, MessageHandler};

use std::io::ErrorKind;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, error, warn};

/// What the listener does with a message: the caller's handler and window.
///
/// Shared between the coordinator, which clears the handler at terminate,
/// and the listener thread, which reads it once per message.
pub(crate) struct Dispatch {
    handler: RwLock<Option<Arc<dyn MessageHandler>>>,
    window: Option<Arc<dyn HostWindow>>,
}

impl Dispatch {
    pub(crate) fn new(handler: Arc<dyn MessageHandler>, window: Option<Arc<dyn HostWindow>>) -> Self {
        Self {
            handler: RwLock::new(Some(handler)),
            window,
        }
    }

    /// After this returns no new handler call can start.
    pub(crate) fn clear_handler(&self) {
        *self
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn handler(&self) -> Option<Arc<dyn MessageHandler>> {
        self.handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs the handler, then asks the host window to come forward.
    fn deliver(&self, message: Message<'_>) {
        let Some(handler) = self.handler() else {
            debug!("Dropping {} byte message: no handler registered", message.len());
            return;
        };

        if catch_unwind(AssertUnwindSafe(|| handler.on_message(message))).is_err() {
            error!("Message handler panicked; listener continues with the next message");
            return;
        }

        if let Some(window) = &self.window {
            window.restore_if_minimized();
            window.bring_to_foreground();
            window.set_input_focus();
        }
    }
}

/// State moved onto the listener thread.
pub(crate) struct Listener {
    pub(crate) receiver: Arc<Receiver>,
    pub(crate) dispatch: Arc<Dispatch>,
    pub(crate) buffer: Vec<u8>,
    pub(crate) capacity: usize,
}

impl Listener {
    /// Loops until the receiver is closed, then hands the buffer back so the
    /// coordinator frees it after the join.
    ///
    /// A failed read on an open receiver is retried at once.
    // TODO: read failures other than close are retried without backoff; add a short sleep if
    // a transport ever reports persistent errors.
    pub(crate) fn run(mut self) -> Vec<u8> {
        debug!("Listener started with capacity {} bytes", self.capacity);

        while self.receiver.is_open() {
            // One byte past capacity: room for the terminator, and a way to spot truncation.
            let received = match self.receiver.recv(&mut self.buffer[..=self.capacity]) {
                Ok(received) => received,
                // Periodic wake-up on backends whose reads time out.
                Err(error) if error.kind() == ErrorKind::TimedOut => continue,
                Err(error) => {
                    if self.receiver.is_open() {
                        debug!("Read failed on open endpoint, retrying: {error}");
                    }
                    continue;
                }
            };

            if !self.receiver.is_open() {
                continue;
            }

            if received > self.capacity {
                warn!(
                    "Dropped a message larger than the {} byte capacity",
                    self.capacity
                );
                continue;
            }

            self.buffer[received] = 0;
            self.dispatch
                .deliver(Message::from_terminated(&self.buffer[..=received]));
        }

        debug!("Listener stopped");
        self.buffer
    }
}
