//! Simulation configuration and gameplay tuning.
//!
//! `SimConfig` controls the frame driver and play area, `CombatTuning`
//! carries every gameplay constant. Both are ECS resources and can be
//! loaded from JSON.

use crate::components::Position;
use crate::error::{Result, SimError};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Rectangular play area. All AI destinations are clamped into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        // Normalized screen space with a 4:3 aspect ratio.
        Self {
            min_x: -1.0,
            max_x: 1.0,
            min_y: -0.75,
            max_y: 0.75,
        }
    }
}

impl WorldBounds {
    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(self.min_x, self.max_x),
            pos.y.clamp(self.min_y, self.max_y),
        )
    }

    pub fn contains(&self, pos: &Position) -> bool {
        pos.x >= self.min_x && pos.x <= self.max_x && pos.y >= self.min_y && pos.y <= self.max_y
    }

    /// Map center, the fallback destination when nothing else is known.
    pub fn center(&self) -> Position {
        Position::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }
}

/// Frame driver configuration.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Upper bound applied to each frame's delta time (seconds).
    pub max_frame_delta: f32,
    /// Play area.
    pub world_bounds: WorldBounds,
    /// Spawn the opening planets and ships on `initialize()`.
    pub spawn_initial_scenario: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: 1.0 / 30.0,
            world_bounds: WorldBounds::default(),
            spawn_initial_scenario: true,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "max_frame_delta must be positive, got {}",
                self.max_frame_delta
            )));
        }
        let b = &self.world_bounds;
        if !(b.min_x < b.max_x && b.min_y < b.max_y) {
            return Err(SimError::InvalidConfig(format!("inverted world bounds: {b:?}")));
        }
        Ok(())
    }
}

/// Gameplay constants for movement, weapons, AI and group tactics.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    // Movement
    pub player_ship_speed: f32,
    /// Enemy speed as a fraction of the player speed.
    pub enemy_speed_factor: f32,
    pub arrival_threshold: f32,
    pub separation_radius: f32,
    pub separation_strength: f32,

    // Weapons and collision
    pub weapon_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub damage_per_hit: i32,
    pub ship_collision_radius: f32,
    pub projectile_collision_radius: f32,

    // Ranges
    pub firing_range: f32,
    pub planet_attack_range: f32,
    /// Radius for friendly/enemy counts. `None` means unbounded: the AI is omniscient.
    pub detection_radius: Option<f32>,
    pub planet_scan_range: f32,
    pub planet_defense_radius: f32,

    // Tactical analysis and per-unit AI
    pub ai_update_interval: f32,
    pub overwhelm_ratio: f32,
    pub retreat_health_fraction: f32,
    pub healthy_ally_fraction: f32,
    pub support_range: f32,
    pub retreat_range_factor: f32,
    /// How far behind a covering ally a retreating ship parks.
    pub retreat_cover_distance: f32,
    pub retreat_hysteresis: f32,
    pub regroup_range_factor: f32,
    pub approach_ship_factor: f32,
    pub approach_planet_factor: f32,
    pub backoff_range_factor: f32,
    pub too_close_factor: f32,

    // Group tactics
    pub group_tactics_interval: f32,
    pub formation_lifetime: f32,
    pub mass_attack_min_units: usize,
    pub surround_min_units: usize,
    pub large_player_force: usize,
    pub coordination_range: f32,
    pub vulnerable_health: i32,
    pub formation_slot_tolerance: f32,
    pub mass_attack_slots_per_ring: usize,
    pub mass_attack_base_radius: f32,
    pub mass_attack_ring_spacing: f32,
    pub surround_radius: f32,

    // Entities and gameplay
    pub ship_health: i32,
    pub planet_health: i32,
    pub spacecraft_build_time: f32,
    pub spawn_clearance: f32,
    pub score_per_kill: u32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            player_ship_speed: 0.5,
            enemy_speed_factor: 0.8,
            arrival_threshold: 0.01,
            separation_radius: 0.05,
            separation_strength: 0.8,

            weapon_cooldown: 1.0,
            projectile_speed: 1.0,
            projectile_lifetime: 1.5,
            damage_per_hit: 1,
            ship_collision_radius: 0.04,
            projectile_collision_radius: 0.02,

            firing_range: 0.5,
            planet_attack_range: 0.6,
            detection_radius: None,
            planet_scan_range: 1.5,
            planet_defense_radius: 0.3,

            ai_update_interval: 0.1,
            overwhelm_ratio: 2.0,
            retreat_health_fraction: 0.2,
            healthy_ally_fraction: 0.7,
            support_range: 0.75,
            retreat_range_factor: 1.8,
            retreat_cover_distance: 0.1,
            retreat_hysteresis: 0.05,
            regroup_range_factor: 1.5,
            approach_ship_factor: 0.8,
            approach_planet_factor: 0.9,
            backoff_range_factor: 0.6,
            too_close_factor: 0.5,

            group_tactics_interval: 1.0,
            formation_lifetime: 10.0,
            mass_attack_min_units: 3,
            surround_min_units: 4,
            large_player_force: 3,
            coordination_range: 1.0,
            vulnerable_health: 5,
            formation_slot_tolerance: 0.05,
            mass_attack_slots_per_ring: 6,
            mass_attack_base_radius: 0.2,
            mass_attack_ring_spacing: 0.08,
            surround_radius: 0.35,

            ship_health: 10,
            planet_health: 100,
            spacecraft_build_time: 5.0,
            spawn_clearance: 0.05,
            score_per_kill: 10,
        }
    }
}

impl CombatTuning {
    pub fn from_json_str(data: &str) -> Result<Self> {
        let tuning: Self = serde_json::from_str(data)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn detection_radius(&self) -> f32 {
        self.detection_radius.unwrap_or(f32::INFINITY)
    }

    pub fn enemy_ship_speed(&self) -> f32 {
        self.player_ship_speed * self.enemy_speed_factor
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("player_ship_speed", self.player_ship_speed),
            ("enemy_speed_factor", self.enemy_speed_factor),
            ("arrival_threshold", self.arrival_threshold),
            ("separation_radius", self.separation_radius),
            ("weapon_cooldown", self.weapon_cooldown),
            ("projectile_speed", self.projectile_speed),
            ("projectile_lifetime", self.projectile_lifetime),
            ("firing_range", self.firing_range),
            ("planet_attack_range", self.planet_attack_range),
            ("ai_update_interval", self.ai_update_interval),
            ("group_tactics_interval", self.group_tactics_interval),
            ("formation_lifetime", self.formation_lifetime),
            ("overwhelm_ratio", self.overwhelm_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        if let Some(radius) = self.detection_radius {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "detection_radius must be positive, got {radius}"
                )));
            }
        }
        if self.damage_per_hit <= 0 || self.ship_health <= 0 || self.planet_health <= 0 {
            return Err(SimError::InvalidConfig(
                "damage and health values must be positive".to_string(),
            ));
        }
        if self.mass_attack_slots_per_ring == 0 {
            return Err(SimError::InvalidConfig(
                "mass_attack_slots_per_ring must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global simulation pass counter.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
        assert!(CombatTuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = CombatTuning::from_json_str(r#"{ "firing_range": 0.3 }"#).unwrap();
        assert!((tuning.firing_range - 0.3).abs() < 1e-6);
        assert_eq!(tuning.mass_attack_min_units, 3);
        assert!(tuning.detection_radius().is_infinite());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = CombatTuning::from_json_str(r#"{ "weapon_cooldown": 0.0 }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));

        let err = SimConfig::from_json_str(
            r#"{ "world_bounds": { "min_x": 1.0, "max_x": -1.0, "min_y": -1.0, "max_y": 1.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));

        let err = SimConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, SimError::ConfigParse(_)));
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = WorldBounds::default();
        let p = bounds.clamp(Position::new(3.0, -2.0));
        assert_eq!((p.x, p.y), (1.0, -0.75));
        assert!(bounds.contains(&p));
        let c = bounds.center();
        assert_eq!((c.x, c.y), (0.0, 0.0));
    }
}
