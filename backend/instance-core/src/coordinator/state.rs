use std::fmt::{Display, Formatter, Result as FormatResult};

/// Identity a process takes on for the lifetime of its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Created the endpoint and runs the listener.
    Parent,
    /// Attached to a parent's endpoint; may only send.
    Child,
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            Role::Parent => write!(formatter, "parent"),
            Role::Child => write!(formatter, "child"),
        }
    }
}

/// Lifecycle state of an [`InstanceCoordinator`](crate::InstanceCoordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    #[default]
    Uninitialized,
    Parent,
    Child,
    /// The last `initialize` failed and was cleaned up. Initializing again is allowed.
    Failed,
}

impl CoordinatorState {
    pub fn role(&self) -> Option<Role> {
        match self {
            CoordinatorState::Parent => Some(Role::Parent),
            CoordinatorState::Child => Some(Role::Child),
            CoordinatorState::Uninitialized | CoordinatorState::Failed => None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.role().is_some()
    }
}

impl From<Role> for CoordinatorState {
    fn from(role: Role) -> Self {
        match role {
            Role::Parent => CoordinatorState::Parent,
            Role::Child => CoordinatorState::Child,
        }
    }
}

impl Display for CoordinatorState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            CoordinatorState::Uninitialized => write!(formatter, "uninitialized"),
            CoordinatorState::Parent => write!(formatter, "parent"),
            CoordinatorState::Child => write!(formatter, "child"),
            CoordinatorState::Failed => write!(formatter, "failed"),
        }
    }
}
