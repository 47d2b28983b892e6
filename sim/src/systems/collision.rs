//! Projectile hit resolution.
//!
//! Circle-circle tests between every active projectile and every living
//! ship or planet, linear in both. A projectile never hurts its owner or
//! anything on its owner's side, and a locked projectile ignores every
//! entity except its locked target.

use crate::components::*;
use crate::config::CombatTuning;
use crate::systems::destruction::{DestroyedKind, Destruction, DestructionEvents};
use bevy_ecs::prelude::*;
use tracing::debug;

/// Returns true when `shot` is allowed to damage `target`.
pub fn can_hit(shot: &Projectile, target: Entity, target_faction: Faction) -> bool {
    if target == shot.owner || target_faction == shot.owner_faction {
        return false;
    }
    match shot.locked_target {
        Some(locked) => locked == target,
        None => true,
    }
}

/// Applies projectile hits, records deaths and despawns spent projectiles.
pub fn projectile_collision_system(
    mut commands: Commands,
    tuning: Res<CombatTuning>,
    mut events: ResMut<DestructionEvents>,
    mut projectiles: Query<(Entity, &Position, &mut Projectile)>,
    mut targets: Query<(Entity, &Position, &Faction, &mut Health, Option<&Planet>), Without<Projectile>>,
) {
    for (shot_entity, shot_pos, mut shot) in projectiles.iter_mut() {
        if !shot.active {
            continue;
        }

        for (target, target_pos, faction, mut health, planet) in targets.iter_mut() {
            if !health.is_alive() || !can_hit(&shot, target, *faction) {
                continue;
            }
            let body_radius = planet.map_or(tuning.ship_collision_radius, |p| p.radius);
            if shot_pos.distance_to(target_pos) > body_radius + tuning.projectile_collision_radius {
                continue;
            }

            if health.apply_damage(tuning.damage_per_hit) {
                let kind = if planet.is_some() {
                    DestroyedKind::Planet
                } else {
                    DestroyedKind::Ship
                };
                debug!(?target, ?kind, killer = ?shot.owner, "entity destroyed by projectile");
                events.record(Destruction {
                    entity: target,
                    faction: *faction,
                    kind,
                    position: *target_pos,
                });
            }

            shot.active = false;
            commands.entity(shot_entity).despawn();
            break;
        }
    }
}
