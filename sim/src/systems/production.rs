//! Planet production - ticking build queues and spawning finished ships.

use crate::components::*;
use crate::config::CombatTuning;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;
use tracing::debug;

/// Angle between consecutive spawn points around a planet.
const SPAWN_ROTATION_DEGREES: f32 = 72.0;

/// Where a planet's `build_index`-th ship appears: just outside the
/// planet's edge, rotating around it from build to build.
pub fn spawn_point(center: &Position, radius: f32, clearance: f32, build_index: u32) -> Position {
    let angle = (build_index as f32 * SPAWN_ROTATION_DEGREES).to_radians();
    let distance = radius + clearance;
    Position::new(center.x + distance * angle.cos(), center.y + distance * angle.sin())
}

/// Counts down the front entry of every living planet's queue and spawns
/// the unit when it completes. Only one entry per planet can complete per
/// pass.
pub fn production_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    tuning: Res<CombatTuning>,
    mut planets: Query<(Entity, &Faction, &Position, &Health, &mut Planet)>,
) {
    for (entity, faction, pos, health, mut planet) in planets.iter_mut() {
        if !health.is_alive() {
            continue;
        }
        let Some(front) = planet.build_queue.front_mut() else {
            continue;
        };
        front.time_remaining -= dt.0;
        if front.time_remaining > 0.0 {
            continue;
        }

        let Some(done) = planet.build_queue.pop_front() else {
            continue;
        };
        let at = spawn_point(pos, planet.radius, tuning.spawn_clearance, planet.completed_builds);
        planet.completed_builds += 1;

        let ship = match done.unit {
            BuildableUnit::Spacecraft => match faction {
                Faction::Player => commands.spawn(ShipBundle::new(Faction::Player, at.x, at.y, tuning.ship_health)).id(),
                Faction::Enemy => commands.spawn(EnemyShipBundle::new(at.x, at.y, tuning.ship_health)).id(),
            },
        };
        debug!(
            planet = ?entity,
            ?ship,
            faction = faction.as_str(),
            queued = planet.build_queue.len(),
            "build complete"
        );
    }
}
