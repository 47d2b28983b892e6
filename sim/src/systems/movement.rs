//! Movement systems - separation, steering and projectile flight.
//!
//! Runs first in every pass, in this order:
//! 1. `separation_system` pushes overlapping same-faction ships apart
//! 2. `steering_system` moves ships toward their destinations
//! 3. `projectile_motion_system` advances shots and expires old ones

use crate::components::*;
use crate::config::CombatTuning;
use crate::geometry::{direction, heading_degrees, normalize};
use bevy_ecs::prelude::*;
use tracing::trace;

/// Resource containing the (clamped) delta time for the current pass.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// Positional repulsion between living ships of the same faction.
///
/// Displacements for all pairs are gathered from the positions at the start
/// of the pass and applied afterwards, so the result does not depend on
/// iteration order.
pub fn separation_system(
    dt: Res<DeltaTime>,
    tuning: Res<CombatTuning>,
    mut ships: Query<(Entity, &Faction, &Health, &mut Position), With<Spacecraft>>,
) {
    let radius = tuning.separation_radius;
    let strength = tuning.separation_strength;
    let delta = dt.0;
    if radius <= 0.0 || delta <= 0.0 {
        return;
    }

    let agents: Vec<(Entity, Faction, Position)> = ships
        .iter()
        .filter(|(_, _, health, _)| health.is_alive())
        .map(|(entity, faction, _, pos)| (entity, *faction, *pos))
        .collect();

    let mut pushes = vec![(0.0f32, 0.0f32); agents.len()];
    for i in 0..agents.len() {
        for j in (i + 1)..agents.len() {
            let (_, faction_a, a) = agents[i];
            let (_, faction_b, b) = agents[j];
            if faction_a != faction_b {
                continue;
            }
            let dist = a.distance_to(&b);
            if dist >= radius {
                continue;
            }
            // Stacked ships have no axis between them; split them along x.
            let (ux, uy) = normalize(a.x - b.x, a.y - b.y).unwrap_or((1.0, 0.0));
            let force = strength * (radius - dist) / radius * delta;
            pushes[i].0 += ux * force;
            pushes[i].1 += uy * force;
            pushes[j].0 -= ux * force;
            pushes[j].1 -= uy * force;
        }
    }

    for ((entity, _, _), (px, py)) in agents.iter().zip(pushes) {
        if px == 0.0 && py == 0.0 {
            continue;
        }
        if let Ok((_, _, _, mut pos)) = ships.get_mut(*entity) {
            pos.x += px;
            pos.y += py;
        }
    }
}

/// Straight-line steering toward each moving ship's destination.
///
/// A ship that gets within the arrival threshold snaps exactly onto its
/// destination and stops. Dead ships never move.
pub fn steering_system(
    dt: Res<DeltaTime>,
    tuning: Res<CombatTuning>,
    mut ships: Query<(&Faction, &Health, &mut Position, &mut Spacecraft)>,
) {
    let delta = dt.0;
    let threshold = tuning.arrival_threshold;

    for (faction, health, mut pos, mut craft) in ships.iter_mut() {
        if !health.is_alive() {
            craft.moving = false;
            continue;
        }
        if !craft.moving {
            continue;
        }

        let dest = craft.destination;
        let dist = pos.distance_to(&dest);
        if dist < threshold {
            *pos = dest;
            craft.moving = false;
            continue;
        }

        let (dx, dy) = direction(&pos, &dest);
        let step = (faction.ship_speed(&tuning) * delta).min(dist);
        pos.x += dx * step;
        pos.y += dy * step;
        if dx != 0.0 || dy != 0.0 {
            craft.angle = heading_degrees(dx, dy);
        }

        if pos.distance_to(&dest) < threshold {
            *pos = dest;
            craft.moving = false;
        }
    }
}

/// Advances projectiles and despawns the ones whose lifetime ran out.
pub fn projectile_motion_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    mut projectiles: Query<(Entity, &mut Position, &mut Projectile)>,
) {
    let delta = dt.0;
    for (entity, mut pos, mut shot) in projectiles.iter_mut() {
        if shot.active {
            pos.x += shot.direction_x * shot.speed * delta;
            pos.y += shot.direction_y * shot.speed * delta;
            shot.lifetime -= delta;
        }
        if shot.lifetime <= 0.0 || !shot.active {
            shot.active = false;
            trace!(?entity, "projectile expired");
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(dt: f32) -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(dt));
        world.insert_resource(CombatTuning::default());
        world
    }

    #[test]
    fn test_steering_moves_at_faction_speed() {
        let mut world = world_with(0.1);
        let mut craft = Spacecraft::default();
        craft.set_destination(&Position::new(0.0, 0.0), Position::new(0.0, 1.0), 0.01);
        world.spawn((Faction::Player, Health::new(10), Position::new(0.0, 0.0), craft));

        let mut schedule = Schedule::default();
        schedule.add_systems(steering_system);
        schedule.run(&mut world);

        let mut query = world.query::<(&Position, &Spacecraft)>();
        let (pos, craft) = query.single(&world);
        assert!((pos.y - 0.05).abs() < 1e-5);
        assert!(craft.moving);
        assert!(craft.angle.abs() < 1e-3, "heading up should be 0 degrees");
    }

    #[test]
    fn test_steering_snaps_on_arrival() {
        let mut world = world_with(0.1);
        let mut craft = Spacecraft::default();
        craft.set_destination(&Position::new(0.0, 0.0), Position::new(0.03, 0.0), 0.01);
        world.spawn((Faction::Player, Health::new(10), Position::new(0.0, 0.0), craft));

        let mut schedule = Schedule::default();
        schedule.add_systems(steering_system);
        schedule.run(&mut world);

        let mut query = world.query::<(&Position, &Spacecraft)>();
        let (pos, craft) = query.single(&world);
        assert_eq!(*pos, Position::new(0.03, 0.0));
        assert!(!craft.moving);
    }

    #[test]
    fn test_dead_ship_does_not_move() {
        let mut world = world_with(0.1);
        let mut craft = Spacecraft::default();
        craft.set_destination(&Position::new(0.0, 0.0), Position::new(1.0, 0.0), 0.01);
        let mut health = Health::new(1);
        health.apply_damage(1);
        world.spawn((Faction::Enemy, health, Position::new(0.0, 0.0), craft));

        let mut schedule = Schedule::default();
        schedule.add_systems(steering_system);
        schedule.run(&mut world);

        let mut query = world.query::<(&Position, &Spacecraft)>();
        let (pos, craft) = query.single(&world);
        assert_eq!(*pos, Position::new(0.0, 0.0));
        assert!(!craft.moving);
    }

    #[test]
    fn test_separation_pushes_same_faction_apart() {
        let mut world = world_with(0.1);
        let a = world
            .spawn((Faction::Enemy, Health::new(10), Position::new(0.0, 0.0), Spacecraft::default()))
            .id();
        let b = world
            .spawn((Faction::Enemy, Health::new(10), Position::new(0.02, 0.0), Spacecraft::default()))
            .id();
        let c = world
            .spawn((Faction::Player, Health::new(10), Position::new(0.01, 0.0), Spacecraft::default()))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(separation_system);
        schedule.run(&mut world);

        let pa = *world.get::<Position>(a).unwrap();
        let pb = *world.get::<Position>(b).unwrap();
        let pc = *world.get::<Position>(c).unwrap();
        assert!(pa.x < 0.0);
        assert!(pb.x > 0.02);
        assert!(pa.distance_to(&pb) > 0.02);
        // Lone player ship has no same-faction neighbour.
        assert_eq!(pc, Position::new(0.01, 0.0));
    }

    #[test]
    fn test_separation_handles_stacked_ships() {
        let mut world = world_with(0.1);
        world.spawn((Faction::Enemy, Health::new(10), Position::new(0.3, 0.3), Spacecraft::default()));
        world.spawn((Faction::Enemy, Health::new(10), Position::new(0.3, 0.3), Spacecraft::default()));

        let mut schedule = Schedule::default();
        schedule.add_systems(separation_system);
        schedule.run(&mut world);

        let mut query = world.query::<&Position>();
        let positions: Vec<Position> = query.iter(&world).copied().collect();
        assert!(positions.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert!(positions[0].distance_to(&positions[1]) > 0.0);
    }

    #[test]
    fn test_projectile_expires() {
        let mut world = world_with(0.1);
        let owner = world.spawn_empty().id();
        let shot = world
            .spawn((
                Position::new(0.0, 0.0),
                Projectile {
                    direction_x: 1.0,
                    direction_y: 0.0,
                    speed: 1.0,
                    lifetime: 0.05,
                    owner,
                    owner_faction: Faction::Player,
                    locked_target: None,
                    active: true,
                },
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(projectile_motion_system);
        schedule.run(&mut world);

        assert!(world.get::<Projectile>(shot).is_none());
    }
}
