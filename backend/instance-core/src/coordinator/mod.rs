//! The single-instance coordinator.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──initialize──► Parent ──terminate──► Uninitialized
//!        │                  └─► Child  ──terminate──►
//!        └──────(failure)─────► Failed ──initialize──► ...
//! ```
//!
//! One coordinator per process. `initialize` and `terminate` take `&mut self`,
//! so they can never run concurrently on the same coordinator.

mod listener;
mod state;

pub use state::{CoordinatorState, Role};

use crate::config::InstanceConfig;
use crate::endpoint::{self, EndpointName, Receiver, Sender};
use crate::error::{EndpointError, InitError};
use crate::handler::{HostWindow, MessageHandler};
use listener::{Dispatch, Listener};

use common::ErrorLocation;

use std::sync::Arc;
use std::thread::{Builder as ThreadBuilder, JoinHandle};

use log::{debug, error, info, warn};

/// Name of the parent's listener thread.
pub const LISTENER_THREAD_NAME: &str = "instance-listener";

enum Channel {
    Parent(Arc<Receiver>),
    Child(Sender),
}

/// Decides whether this process is the parent or a child and moves payloads
/// from children to the parent.
///
/// # Examples
///
/// ```no_run
/// use instance_core::{InstanceCoordinator, Message, Role};
///
/// let mut coordinator = InstanceCoordinator::default();
/// let role = coordinator.initialize(
///     |message: Message<'_>| println!("{:?}", message.as_str()),
///     4096,
///     None,
/// )?;
///
/// if role == Role::Child {
///     let delivered = coordinator.send(b"open song.zip");
///     coordinator.terminate();
///     std::process::exit(if delivered { 0 } else { 1 });
/// }
/// # Ok::<(), instance_core::error::InitError>(())
/// ```
pub struct InstanceCoordinator {
    endpoint: EndpointName,
    state: CoordinatorState,
    channel: Option<Channel>,
    dispatch: Option<Arc<Dispatch>>,
    listener: Option<JoinHandle<Vec<u8>>>,
}

impl InstanceCoordinator {
    pub fn new(endpoint: EndpointName) -> Self {
        Self {
            endpoint,
            state: CoordinatorState::Uninitialized,
            channel: None,
            dispatch: None,
            listener: None,
        }
    }

    /// Coordinator for the endpoint named in `config`.
    #[track_caller]
    pub fn from_config(config: &InstanceConfig) -> Result<Self, EndpointError> {
        Ok(Self::new(config.endpoint()?))
    }

    pub fn endpoint(&self) -> &EndpointName {
        &self.endpoint
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn role(&self) -> Option<Role> {
        self.state.role()
    }

    /// Whether the listener thread exists and has not finished.
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|listener| !listener.is_finished())
    }

    /// Attaches to a running parent or becomes the parent.
    ///
    /// As parent, `handler` is called on the listener thread for every message
    /// of at most `max_message_size` bytes, followed by a refocus of
    /// `host_window`. As child, `handler` and `host_window` are dropped unused.
    ///
    /// # Errors
    ///
    /// - [`InitError::AlreadyInitialized`] while this coordinator is parent or child
    /// - [`InitError::InvalidCapacity`] for a zero `max_message_size`
    /// - [`InitError::AllocationFailed`] when the receive buffer cannot be allocated
    /// - [`InitError::Contention`] when another process became parent between
    ///   our attach and create
    /// - [`InitError::Endpoint`] for any other OS failure creating the endpoint
    /// - [`InitError::ListenerSpawn`] when the listener thread cannot start
    ///
    /// On every error the coordinator is cleaned up and left in
    /// [`CoordinatorState::Failed`] (or unchanged for `AlreadyInitialized`).
    #[track_caller]
    pub fn initialize<H>(
        &mut self,
        handler: H,
        max_message_size: usize,
        host_window: Option<Arc<dyn HostWindow>>,
    ) -> Result<Role, InitError>
    where
        H: MessageHandler + 'static,
    {
        if self.state.is_initialized() {
            return Err(InitError::AlreadyInitialized {
                message: format!("coordinator for {} is already {}", self.endpoint, self.state),
                location: ErrorLocation::caller(),
            });
        }

        if max_message_size == 0 {
            self.state = CoordinatorState::Failed;
            return Err(InitError::InvalidCapacity {
                message: "max_message_size must be greater than zero".to_string(),
                location: ErrorLocation::caller(),
            });
        }

        let buffer = match allocate_buffer(max_message_size) {
            Ok(buffer) => buffer,
            Err(error) => {
                self.state = CoordinatorState::Failed;
                return Err(error);
            }
        };

        match endpoint::attach(&self.endpoint) {
            Ok(sender) => {
                // Children never read.
                drop(buffer);
                self.channel = Some(Channel::Child(sender));
                self.state = CoordinatorState::Child;
                info!("Attached to running instance at {}", self.endpoint);
                return Ok(Role::Child);
            }
            Err(error) => debug!("No running instance at {}: {error}", self.endpoint),
        }

        let receiver = match endpoint::create(&self.endpoint, max_message_size) {
            Ok(receiver) => Arc::new(receiver),
            Err(source) => {
                self.fail();
                return Err(if endpoint::is_contention(&source) {
                    warn!("Lost the race to become parent at {}", self.endpoint);
                    InitError::Contention {
                        message: format!("another instance owns {}", self.endpoint),
                        location: ErrorLocation::caller(),
                        source,
                    }
                } else {
                    error!("Failed to create endpoint {}: {source}", self.endpoint);
                    InitError::Endpoint {
                        message: format!("failed to create {}", self.endpoint),
                        location: ErrorLocation::caller(),
                        source,
                    }
                });
            }
        };

        let dispatch = Arc::new(Dispatch::new(Arc::new(handler), host_window));
        let listener = Listener {
            receiver: Arc::clone(&receiver),
            dispatch: Arc::clone(&dispatch),
            buffer,
            capacity: max_message_size,
        };

        self.channel = Some(Channel::Parent(receiver));
        self.dispatch = Some(dispatch);

        match ThreadBuilder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || listener.run())
        {
            Ok(handle) => {
                self.listener = Some(handle);
                self.state = CoordinatorState::Parent;
                info!(
                    "Became parent instance at {} (capacity {max_message_size} bytes)",
                    self.endpoint
                );
                Ok(Role::Parent)
            }
            Err(source) => {
                self.fail();
                Err(InitError::ListenerSpawn {
                    message: "failed to start the listener thread".to_string(),
                    location: ErrorLocation::caller(),
                    source,
                })
            }
        }
    }

    /// Forwards `payload` to the parent in a single write.
    ///
    /// Returns `false` when this coordinator is not a child (including after
    /// [`terminate`](Self::terminate)), when the payload exceeds the parent's
    /// capacity, or when the write fails. There is no retry.
    pub fn send(&self, payload: &[u8]) -> bool {
        match &self.channel {
            Some(Channel::Child(sender)) => match sender.write(payload) {
                Ok(()) => {
                    debug!("Sent {} bytes to {}", payload.len(), self.endpoint);
                    true
                }
                Err(error) => {
                    warn!(
                        "Failed to send {} bytes to {}: {error}",
                        payload.len(),
                        self.endpoint
                    );
                    false
                }
            },
            Some(Channel::Parent(_)) => {
                warn!("send called on the parent instance; only children forward payloads");
                false
            }
            None => {
                warn!("send called while {}", self.state);
                false
            }
        }
    }

    /// Stops the listener and releases the endpoint.
    ///
    /// Safe to call in any state. The handler is cleared before the endpoint
    /// is closed and the listener is joined before its buffer is freed, so no
    /// handler call is in flight once this returns.
    pub fn terminate(&mut self) {
        self.release();

        if self.state != CoordinatorState::Uninitialized {
            info!("Coordinator for {} terminated", self.endpoint);
        }
        self.state = CoordinatorState::Uninitialized;
    }

    /// Cleanup shared by `terminate` and failed initialization.
    fn release(&mut self) {
        if let Some(dispatch) = self.dispatch.take() {
            dispatch.clear_handler();
        }

        let receiver = match self.channel.take() {
            Some(Channel::Parent(receiver)) => {
                receiver.close();
                Some(receiver)
            }
            Some(Channel::Child(sender)) => {
                drop(sender);
                None
            }
            None => None,
        };

        if let Some(listener) = self.listener.take() {
            match listener.join() {
                Ok(buffer) => drop(buffer),
                Err(_) => error!("Listener thread panicked"),
            }
        }

        // Last reference once the listener is gone: unlinks the socket and unlocks.
        drop(receiver);
    }

    fn fail(&mut self) {
        self.release();
        self.state = CoordinatorState::Failed;
    }
}

impl Default for InstanceCoordinator {
    fn default() -> Self {
        Self::new(EndpointName::default())
    }
}

impl Drop for InstanceCoordinator {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// `capacity + 1` zeroed bytes, failing instead of aborting when memory is short.
#[track_caller]
pub(crate) fn allocate_buffer(capacity: usize) -> Result<Vec<u8>, InitError> {
    let Some(length) = capacity.checked_add(1) else {
        return Err(InitError::AllocationFailed {
            message: format!("receive buffer of {capacity} + 1 bytes overflows"),
            location: ErrorLocation::caller(),
        });
    };

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(length)
        .map_err(|error| InitError::AllocationFailed {
            message: format!("cannot allocate {length} byte receive buffer: {error}"),
            location: ErrorLocation::caller(),
        })?;
    buffer.resize(length, 0);

    Ok(buffer)
}
