//! Snapshot types for the rendering collaborator.
//!
//! The `Snapshot` struct provides a serializable, read-only view of the
//! simulation state after an update. Entity ids are exported as
//! `Entity::to_bits()`.

use crate::components::*;
use crate::systems::destruction::GameStats;
use crate::systems::formation::GroupTactics;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single ship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipSnapshot {
    pub id: u64,
    pub faction: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: i32,
    pub health_max: i32,
    pub alive: bool,
    pub moving: bool,
    pub weapon_cooldown: f32,
    /// AI state name, `None` for order-driven ships.
    pub ai_state: Option<String>,
}

/// Snapshot of a single planet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetSnapshot {
    pub id: u64,
    pub faction: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub health: i32,
    pub health_max: i32,
    pub alive: bool,
    pub build_queue: usize,
    /// Progress of the front build entry in 0..=1, if any.
    pub build_progress: Option<f32>,
}

/// Snapshot of a projectile in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub owner: u64,
    pub faction: String,
}

/// Snapshot of an active formation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationSnapshot {
    pub id: u32,
    pub kind: String,
    pub target: u64,
    pub members: Vec<u64>,
    pub center_x: f32,
    pub center_y: f32,
    pub age: f32,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    pub ships: Vec<ShipSnapshot>,
    pub planets: Vec<PlanetSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub formations: Vec<FormationSnapshot>,
    pub score: u32,
    pub enemies_killed: u32,
    pub game_over: bool,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut ships = Vec::new();
        let mut ship_query = world.query::<(Entity, &Faction, &Position, &Health, &Spacecraft, Option<&AiBrain>)>();
        for (entity, faction, pos, health, craft, brain) in ship_query.iter(world) {
            ships.push(ShipSnapshot {
                id: entity.to_bits(),
                faction: faction.as_str().to_string(),
                x: pos.x,
                y: pos.y,
                angle: craft.angle,
                health: health.current,
                health_max: health.max,
                alive: health.alive,
                moving: craft.moving,
                weapon_cooldown: craft.weapon_cooldown,
                ai_state: brain.map(|b| b.state.as_str().to_string()),
            });
        }

        let mut planets = Vec::new();
        let mut planet_query = world.query::<(Entity, &Faction, &Position, &Health, &Planet)>();
        for (entity, faction, pos, health, planet) in planet_query.iter(world) {
            planets.push(PlanetSnapshot {
                id: entity.to_bits(),
                faction: faction.as_str().to_string(),
                x: pos.x,
                y: pos.y,
                radius: planet.radius,
                health: health.current,
                health_max: health.max,
                alive: health.alive,
                build_queue: planet.build_queue.len(),
                build_progress: planet.build_queue.front().map(|e| e.progress()),
            });
        }

        let mut projectiles = Vec::new();
        let mut shot_query = world.query::<(Entity, &Position, &Projectile)>();
        for (entity, pos, shot) in shot_query.iter(world) {
            if !shot.active {
                continue;
            }
            projectiles.push(ProjectileSnapshot {
                id: entity.to_bits(),
                x: pos.x,
                y: pos.y,
                owner: shot.owner.to_bits(),
                faction: shot.owner_faction.as_str().to_string(),
            });
        }

        let formations = world
            .get_resource::<GroupTactics>()
            .map(|tactics| {
                tactics
                    .formations
                    .iter()
                    .filter(|f| f.active)
                    .map(|f| FormationSnapshot {
                        id: f.id,
                        kind: f.kind.as_str().to_string(),
                        target: f.target.to_bits(),
                        members: f.members.iter().map(|m| m.to_bits()).collect(),
                        center_x: f.center.x,
                        center_y: f.center.y,
                        age: f.age,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (score, enemies_killed, game_over) = world
            .get_resource::<GameStats>()
            .map(|s| (s.score, s.enemies_killed, s.game_over))
            .unwrap_or_default();

        Self {
            tick,
            time,
            ships,
            planets,
            projectiles,
            formations,
            score,
            enemies_killed,
            game_over,
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
