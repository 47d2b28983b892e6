//! ECS Components for the Skirmish simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::config::CombatTuning;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// 2D position in the play area (normalized screen space, y up).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ============================================================================
// IDENTITY COMPONENTS
// ============================================================================

/// Side an entity fights for. Planets carry it as their ownership flag.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Player,
    Enemy,
}

/// Who decides where a faction's ships go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    /// Explicit move/attack orders from the input collaborator.
    Orders,
    /// The per-unit AI state machine.
    StateMachine,
}

/// When a faction's ships pull the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirePolicy {
    /// Only at an ordered pursuit target.
    OnOrder,
    /// Whenever the controller picks a target in range.
    Autonomous,
}

/// Behavior table entry for a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactionProfile {
    pub controller: Controller,
    pub fire_policy: FirePolicy,
}

impl Faction {
    pub const fn profile(self) -> FactionProfile {
        match self {
            Faction::Player => FactionProfile {
                controller: Controller::Orders,
                fire_policy: FirePolicy::OnOrder,
            },
            Faction::Enemy => FactionProfile {
                controller: Controller::StateMachine,
                fire_policy: FirePolicy::Autonomous,
            },
        }
    }

    pub const fn opponent(self) -> Faction {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }

    /// Cruise speed for this faction's ships.
    pub fn ship_speed(self, tuning: &CombatTuning) -> f32 {
        match self {
            Faction::Player => tuning.player_ship_speed,
            Faction::Enemy => tuning.enemy_ship_speed(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Faction::Player => "Player",
            Faction::Enemy => "Enemy",
        }
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Integer hit points of a ship or planet.
///
/// `alive` flips to false exactly once and never flips back.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
    pub alive: bool,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self {
            current: max,
            max,
            alive: true,
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            0.0
        } else {
            (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Subtract `amount` hit points. Returns `true` only for the hit that
    /// destroys the entity; damage to an already dead entity is ignored.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.current = (self.current - amount).max(0);
        if self.current == 0 {
            self.alive = false;
            return true;
        }
        false
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(10)
    }
}

// ============================================================================
// AGENT COMPONENTS
// ============================================================================

/// Shared shape of every mobile combat entity, player or enemy.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Spacecraft {
    /// Facing in degrees, 0 = up.
    pub angle: f32,
    /// Steering destination, only meaningful while `moving`.
    pub destination: Position,
    pub moving: bool,
    pub attack_intent: bool,
    /// Entity this ship has been ordered to chase.
    pub pursuit_target: Option<Entity>,
    /// Seconds until the weapon may fire again (0 = ready).
    pub weapon_cooldown: f32,
}

impl Spacecraft {
    pub fn with_angle(angle: f32) -> Self {
        Self {
            angle,
            ..Default::default()
        }
    }

    pub fn can_fire(&self) -> bool {
        self.weapon_cooldown <= 0.0
    }

    /// Point the ship at `destination`. Destinations closer than
    /// `arrival_threshold` stop the ship instead, so `moving` always
    /// implies a real distance left to cover.
    pub fn set_destination(&mut self, from: &Position, destination: Position, arrival_threshold: f32) {
        if from.distance_to(&destination) < arrival_threshold {
            self.moving = false;
        } else {
            self.destination = destination;
            self.moving = true;
        }
    }

    pub fn stop(&mut self) {
        self.moving = false;
    }

    pub fn clear_orders(&mut self) {
        self.attack_intent = false;
        self.pursuit_target = None;
    }
}

/// AI behavior state for enemy ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiState {
    /// No target known: sweep toward the player.
    #[default]
    Search,
    /// Target known but out of range.
    Approach,
    /// Target in range: face it and fire.
    Engage,
    /// Badly damaged and outnumbered.
    Retreat,
    /// Isolated: close up with allies.
    Regroup,
}

impl AiState {
    pub fn as_str(self) -> &'static str {
        match self {
            AiState::Search => "Search",
            AiState::Approach => "Approach",
            AiState::Engage => "Engage",
            AiState::Retreat => "Retreat",
            AiState::Regroup => "Regroup",
        }
    }
}

/// Per-unit AI memory, attached to enemy ships only.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AiBrain {
    pub state: AiState,
    pub time_in_state: f32,
    pub target: Option<Entity>,
}

impl AiBrain {
    /// Switch state, resetting the state clock only on an actual change.
    pub fn transition(&mut self, next: AiState) -> bool {
        if self.state == next {
            return false;
        }
        self.state = next;
        self.time_in_state = 0.0;
        true
    }

    /// Drop all targeting and fall back to independent searching.
    pub fn reset_to_search(&mut self) {
        self.transition(AiState::Search);
        self.target = None;
    }
}

// ============================================================================
// PLANET COMPONENTS
// ============================================================================

/// Unit types a planet can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildableUnit {
    #[default]
    Spacecraft,
}

/// One pending build order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BuildQueueEntry {
    pub unit: BuildableUnit,
    pub time_remaining: f32,
    pub total_build_time: f32,
}

impl BuildQueueEntry {
    pub fn new(unit: BuildableUnit, build_time: f32) -> Self {
        Self {
            unit,
            time_remaining: build_time,
            total_build_time: build_time,
        }
    }

    /// Completion in 0..=1.
    pub fn progress(&self) -> f32 {
        if self.total_build_time <= 0.0 {
            1.0
        } else {
            ((self.total_build_time - self.time_remaining) / self.total_build_time).clamp(0.0, 1.0)
        }
    }
}

/// Stationary planet with a FIFO build queue.
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Planet {
    pub radius: f32,
    pub build_queue: VecDeque<BuildQueueEntry>,
    /// Builds completed so far; rotates the spawn point.
    pub completed_builds: u32,
}

impl Planet {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..Default::default()
        }
    }
}

// ============================================================================
// PROJECTILE COMPONENTS
// ============================================================================

/// A weapon shot in flight.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Projectile {
    pub direction_x: f32,
    pub direction_y: f32,
    pub speed: f32,
    /// Seconds left before the shot fizzles.
    pub lifetime: f32,
    pub owner: Entity,
    /// Owner's side at fire time, kept so immunity survives the owner's death.
    pub owner_faction: Faction,
    /// When set, only this entity can be hit.
    pub locked_target: Option<Entity>,
    pub active: bool,
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a ship driven by orders.
#[derive(Bundle)]
pub struct ShipBundle {
    pub faction: Faction,
    pub position: Position,
    pub health: Health,
    pub spacecraft: Spacecraft,
}

impl ShipBundle {
    pub fn new(faction: Faction, x: f32, y: f32, max_health: i32) -> Self {
        Self {
            faction,
            position: Position::new(x, y),
            health: Health::new(max_health),
            spacecraft: Spacecraft::default(),
        }
    }
}

/// Bundle for spawning an AI-driven enemy ship.
#[derive(Bundle)]
pub struct EnemyShipBundle {
    pub ship: ShipBundle,
    pub brain: AiBrain,
}

impl EnemyShipBundle {
    pub fn new(x: f32, y: f32, max_health: i32) -> Self {
        Self {
            ship: ShipBundle::new(Faction::Enemy, x, y, max_health),
            brain: AiBrain::default(),
        }
    }
}

/// Bundle for spawning a planet.
#[derive(Bundle)]
pub struct PlanetBundle {
    pub faction: Faction,
    pub position: Position,
    pub health: Health,
    pub planet: Planet,
}

impl PlanetBundle {
    pub fn new(faction: Faction, x: f32, y: f32, radius: f32, max_health: i32) -> Self {
        Self {
            faction,
            position: Position::new(x, y),
            health: Health::new(max_health),
            planet: Planet::new(radius),
        }
    }
}

/// Bundle for spawning a projectile.
#[derive(Bundle)]
pub struct ProjectileBundle {
    pub position: Position,
    pub projectile: Projectile,
}
