//! Capabilities the coordinator calls back into.
//!
//! The embedding application hands the coordinator two things at
//! [`initialize`](crate::InstanceCoordinator::initialize) time: a
//! [`MessageHandler`] that receives every payload forwarded by a child, and
//! optionally a [`HostWindow`] that is brought to the front after each
//! delivery.

use std::str::from_utf8;

/// Borrowed view of one received payload.
///
/// The bytes live in the listener's receive buffer, which is reused for the
/// next message, so a `Message` cannot outlive the handler call it was passed
/// to. Copy out anything that has to survive.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    terminated: &'a [u8],
}

impl<'a> Message<'a> {
    /// Wraps `terminated`, whose last byte must be the `0` written after the payload.
    pub(crate) fn from_terminated(terminated: &'a [u8]) -> Self {
        debug_assert_eq!(terminated.last(), Some(&0));
        Self { terminated }
    }

    /// Exactly the bytes the child sent.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.terminated[..self.len()]
    }

    /// The payload followed by its trailing `0`, for consumers that expect a C string.
    pub fn with_terminator(&self) -> &'a [u8] {
        self.terminated
    }

    /// The payload as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        from_utf8(self.as_bytes()).ok()
    }

    pub fn len(&self) -> usize {
        self.terminated.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives payloads forwarded by child instances.
///
/// Called on the listener thread, one message at a time, in arrival order.
/// A panic inside `on_message` is caught and logged; the listener keeps
/// running.
pub trait MessageHandler: Send + Sync {
    fn on_message(&self, message: Message<'_>);
}

impl<F> MessageHandler for F
where
    F: Fn(Message<'_>) + Send + Sync,
{
    fn on_message(&self, message: Message<'_>) {
        self(message)
    }
}

/// The parent's main window, as far as the coordinator is concerned.
///
/// After each successful delivery the listener calls the three methods in
/// declaration order. The coordinator never owns the window; implementations
/// should tolerate the window having been destroyed already.
pub trait HostWindow: Send + Sync {
    fn restore_if_minimized(&self);

    fn bring_to_foreground(&self);

    fn set_input_focus(&self);
}
