//! Public API for the simulation.
//!
//! This module provides the frame driver facade the host game talks to:
//! lifecycle, player orders, build requests, spawning and read-only views.
//!
//! ## Frame Driver
//!
//! Every `update(dt)` runs the whole schedule exactly once. The frame delta
//! is clamped to `SimConfig::max_frame_delta` so a stalled frame cannot
//! teleport ships or skip collisions. Phases run in a fixed order:
//!
//! 1. **Movement** - separation, steering, projectile flight
//! 2. **Collision** - projectile hits and deaths
//! 3. **Combat/AI** - cooldowns, player orders, group tactics, enemy AI
//! 4. **Gameplay** - production, destruction side effects, game over

use crate::audio::{AudioCue, AudioSink, CueBuffer};
use crate::components::*;
use crate::config::{CombatTuning, SimConfig, SimTick};
use crate::error::{Result, SimError};
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Horizontal and vertical radii of the ellipse enemy waves arrive on,
/// just outside the visible play area.
const WAVE_RADIUS_X: f32 = 1.2;
const WAVE_RADIUS_Y: f32 = 0.95;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Initializing and shutting down a match
/// - Advancing the simulation one frame at a time
/// - Issuing player orders and build requests
/// - Extracting state snapshots and audio cues
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    waves_spawned: u32,
}

impl SimWorld {
    /// Create a new simulation world with default configuration.
    pub fn new() -> Self {
        Self::build(SimConfig::default(), CombatTuning::default())
    }

    /// Create a new simulation world with custom configuration.
    /// Both configs are validated first.
    pub fn with_config(config: SimConfig, tuning: CombatTuning) -> Result<Self> {
        config.validate()?;
        tuning.validate()?;
        Ok(Self::build(config, tuning))
    }

    fn build(config: SimConfig, tuning: CombatTuning) -> Self {
        let mut world = World::new();

        // Core resources
        world.insert_resource(DeltaTime(0.0));
        world.insert_resource(SimTick(0));
        world.insert_resource(config);
        world.insert_resource(tuning);

        // Transient per-match state
        world.insert_resource(GroupTactics::default());
        world.insert_resource(AiClock::default());
        world.insert_resource(CueBuffer::default());
        world.insert_resource(DestructionEvents::default());
        world.insert_resource(GameStats::default());

        // One chained schedule: each phase sees the previous phase's
        // deferred spawns and despawns.
        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                // Movement
                separation_system,
                steering_system,
                projectile_motion_system,
                // Collision
                projectile_collision_system,
                // Combat/AI
                weapon_cooldown_system,
                player_combat_system,
                group_tactics_system,
                enemy_ai_system,
                // Gameplay
                production_system,
                destruction_effects_system,
                planet_wreck_system,
                game_over_system,
            )
                .chain(),
        );

        Self {
            world,
            schedule,
            tick: 0,
            time: 0.0,
            waves_spawned: 0,
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Start a match. Resets the stats and, when configured, spawns the
    /// opening layout.
    pub fn initialize(&mut self) {
        self.world.insert_resource(GameStats::default());
        let spawn_opening = self.world.resource::<SimConfig>().spawn_initial_scenario;
        if spawn_opening {
            self.spawn_opening_layout();
        }
        info!(
            opening = spawn_opening,
            ships = self.ship_count(),
            "simulation initialized"
        );
    }

    fn spawn_opening_layout(&mut self) {
        self.spawn_planet(Faction::Player, -0.5, 0.0, 0.15);
        self.spawn_planet(Faction::Enemy, 0.5, 0.3, 0.10);
        self.spawn_player_ship(0.0, -0.4);
        let second = self.spawn_player_ship(0.2, 0.2);
        if let Some(mut craft) = self.world.get_mut::<Spacecraft>(second) {
            craft.angle = 45.0;
        }
        self.spawn_enemy_ship(-0.3, 0.3);
    }

    /// Advance the simulation by one frame.
    pub fn update(&mut self, dt: f32) {
        let max_delta = self.world.resource::<SimConfig>().max_frame_delta;
        let dt = if dt.is_finite() { dt.clamp(0.0, max_delta) } else { 0.0 };

        if let Some(mut delta) = self.world.get_resource_mut::<DeltaTime>() {
            delta.0 = dt;
        }
        if let Some(mut tick) = self.world.get_resource_mut::<SimTick>() {
            tick.increment();
        }

        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;
    }

    /// End the match: despawn everything and forget all transient state.
    pub fn shutdown(&mut self) {
        let entities = self.world.entities().len();
        self.world.clear_entities();
        self.world.resource_mut::<GroupTactics>().clear();
        self.world.resource_mut::<CueBuffer>().drain();
        self.world.resource_mut::<DestructionEvents>().clear();
        self.world.insert_resource(AiClock::default());
        self.world.insert_resource(GameStats::default());
        self.world.insert_resource(SimTick(0));
        self.tick = 0;
        self.time = 0.0;
        self.waves_spawned = 0;
        info!(entities, "simulation shut down");
    }

    // ========================================================================
    // PLAYER ORDERS
    // ========================================================================

    /// Send a player ship to a point. Cancels any attack order.
    pub fn order_move(&mut self, ship: Entity, x: f32, y: f32) -> Result<()> {
        self.check_player_ship(ship)?;
        let bounds = self.world.resource::<SimConfig>().world_bounds;
        let threshold = self.world.resource::<CombatTuning>().arrival_threshold;
        let destination = bounds.clamp(Position::new(x, y));

        let Some(from) = self.world.get::<Position>(ship).copied() else {
            return Err(SimError::EntityNotFound(ship.to_bits()));
        };
        let Some(mut craft) = self.world.get_mut::<Spacecraft>(ship) else {
            return Err(SimError::NotASpacecraft(ship.to_bits()));
        };
        craft.clear_orders();
        craft.set_destination(&from, destination, threshold);
        Ok(())
    }

    /// Order a player ship to chase and shoot `target`.
    pub fn order_attack(&mut self, ship: Entity, target: Entity) -> Result<()> {
        self.check_player_ship(ship)?;
        let Some(target_pos) = self.world.get::<Position>(target).copied() else {
            return Err(SimError::EntityNotFound(target.to_bits()));
        };
        let bounds = self.world.resource::<SimConfig>().world_bounds;
        let threshold = self.world.resource::<CombatTuning>().arrival_threshold;

        let Some(from) = self.world.get::<Position>(ship).copied() else {
            return Err(SimError::EntityNotFound(ship.to_bits()));
        };
        let Some(mut craft) = self.world.get_mut::<Spacecraft>(ship) else {
            return Err(SimError::NotASpacecraft(ship.to_bits()));
        };
        craft.pursuit_target = Some(target);
        craft.attack_intent = true;
        craft.set_destination(&from, bounds.clamp(target_pos), threshold);
        Ok(())
    }

    fn check_player_ship(&self, ship: Entity) -> Result<()> {
        let Some(faction) = self.world.get::<Faction>(ship) else {
            return Err(SimError::EntityNotFound(ship.to_bits()));
        };
        if self.world.get::<Spacecraft>(ship).is_none() {
            return Err(SimError::NotASpacecraft(ship.to_bits()));
        }
        if *faction != Faction::Player {
            debug!(?ship, "order rejected: not player-owned");
            return Err(SimError::NotPlayerOwned(ship.to_bits()));
        }
        Ok(())
    }

    /// Append a unit to a player planet's build queue.
    pub fn queue_build(&mut self, planet: Entity, unit: BuildableUnit) -> Result<()> {
        let Some(faction) = self.world.get::<Faction>(planet).copied() else {
            return Err(SimError::EntityNotFound(planet.to_bits()));
        };
        let build_time = match unit {
            BuildableUnit::Spacecraft => self.world.resource::<CombatTuning>().spacecraft_build_time,
        };
        let alive = self.world.get::<Health>(planet).is_some_and(Health::is_alive);
        let Some(mut target) = self.world.get_mut::<Planet>(planet) else {
            return Err(SimError::NotAPlanet(planet.to_bits()));
        };
        if faction != Faction::Player {
            debug!(?planet, "build rejected: not player-owned");
            return Err(SimError::NotPlayerOwned(planet.to_bits()));
        }
        if !alive {
            debug!(?planet, "build rejected: planet destroyed");
            return Err(SimError::PlanetDestroyed(planet.to_bits()));
        }
        target.build_queue.push_back(BuildQueueEntry::new(unit, build_time));
        debug!(?planet, queued = target.build_queue.len(), "build queued");
        Ok(())
    }

    // ========================================================================
    // SPAWNING
    // ========================================================================

    pub fn spawn_player_ship(&mut self, x: f32, y: f32) -> Entity {
        let health = self.world.resource::<CombatTuning>().ship_health;
        self.world.spawn(ShipBundle::new(Faction::Player, x, y, health)).id()
    }

    pub fn spawn_enemy_ship(&mut self, x: f32, y: f32) -> Entity {
        let health = self.world.resource::<CombatTuning>().ship_health;
        self.world.spawn(EnemyShipBundle::new(x, y, health)).id()
    }

    pub fn spawn_planet(&mut self, faction: Faction, x: f32, y: f32, radius: f32) -> Entity {
        let health = self.world.resource::<CombatTuning>().planet_health;
        self.world.spawn(PlanetBundle::new(faction, x, y, radius, health)).id()
    }

    /// Spawn `count` enemy ships evenly spaced on an ellipse just outside
    /// the screen. Each wave is rotated against the previous one.
    pub fn spawn_enemy_wave(&mut self, count: usize) -> Vec<Entity> {
        if count == 0 {
            return Vec::new();
        }
        let offset = self.waves_spawned as f32 * TAU / 12.0;
        self.waves_spawned += 1;

        let step = TAU / count as f32;
        let spawned: Vec<Entity> = (0..count)
            .map(|i| {
                let angle = offset + step * i as f32;
                self.spawn_enemy_ship(WAVE_RADIUS_X * angle.cos(), WAVE_RADIUS_Y * angle.sin())
            })
            .collect();
        debug!(count, wave = self.waves_spawned, "enemy wave spawned");
        spawned
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn is_game_over(&self) -> bool {
        self.world.resource::<GameStats>().game_over
    }

    pub fn stats(&self) -> GameStats {
        self.world.resource::<GameStats>().clone()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Current AI state of a state-machine driven ship.
    pub fn ai_state(&self, entity: Entity) -> Option<AiState> {
        self.world.get::<AiBrain>(entity).map(|brain| brain.state)
    }

    /// Active formations.
    pub fn formations(&self) -> Vec<GroupFormation> {
        self.world
            .resource::<GroupTactics>()
            .formations
            .iter()
            .filter(|f| f.active)
            .cloned()
            .collect()
    }

    fn ship_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<(), With<Spacecraft>>();
        query.iter(&self.world).count()
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the current state as JSON.
    pub fn snapshot_json(&mut self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    /// Take every cue emitted since the last drain.
    pub fn drain_cues(&mut self) -> Vec<AudioCue> {
        self.world.resource_mut::<CueBuffer>().drain()
    }

    /// Play every pending cue on `sink`, in emission order.
    pub fn flush_cues(&mut self, sink: &mut impl AudioSink) -> usize {
        let cues = self.drain_cues();
        for cue in &cues {
            sink.play(*cue);
        }
        cues.len()
    }

    /// Get a reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get a mutable reference to the ECS world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
