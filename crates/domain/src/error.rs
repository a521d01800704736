//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! via `#[from]` or an explicit `into_domain()`.

/// Top-level error for the hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced device, scene, room or automation does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The downstream gateway failed to fetch the catalog or accept a command.
    #[error("gateway error")]
    Gateway(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The hub task has stopped and no longer accepts messages.
    #[error("hub is not running")]
    Stopped,
}

/// Invariant violations detected when building domain objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("device identifier must not be empty")]
    EmptyIdentifier,

    #[error("automation must have at least one action")]
    NoActions,

    #[error("invalid time of day {0:?}, expected HH:MM")]
    InvalidTimeOfDay(String),
}

/// Lookup failure for a named domain object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
