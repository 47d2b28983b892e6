//! Skirmish - Simulation Core
//!
//! Combat and AI core of a small real-time space strategy game: movement,
//! projectiles, collisions, tactical analysis, a per-unit enemy state
//! machine and coordinated enemy formations.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod audio;
pub mod components;
pub mod config;
pub mod error;
pub mod geometry;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use audio::{AudioCue, AudioSink, CueBuffer};
pub use components::*;
pub use config::{CombatTuning, SimConfig, SimTick, WorldBounds};
pub use error::{Result, SimError};
pub use systems::*;
pub use world::Snapshot;
