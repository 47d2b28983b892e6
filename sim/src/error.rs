//! Error types for host-facing simulation operations.
//!
//! Ticks themselves never fail: missing entities and dead targets are
//! treated as "nothing to do this pass". Only commands issued from outside
//! the schedule (orders, build requests, configuration) report errors.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors returned by [`crate::SimWorld`] commands and config loading.
#[derive(Debug, Error)]
pub enum SimError {
    /// No entity with this id exists in the store.
    #[error("Entity not found: {0}")]
    EntityNotFound(u64),

    /// The entity exists but carries no `Planet` component.
    #[error("Entity {0} is not a planet")]
    NotAPlanet(u64),

    /// The entity exists but carries no `Spacecraft` component.
    #[error("Entity {0} is not a spacecraft")]
    NotASpacecraft(u64),

    /// Build orders are refused once a planet has been destroyed.
    #[error("Planet {0} is destroyed and cannot accept build orders")]
    PlanetDestroyed(u64),

    /// Orders and build requests are only accepted for player-owned entities.
    #[error("Entity {0} is not player-owned")]
    NotPlayerOwned(u64),

    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
