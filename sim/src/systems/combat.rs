//! Weapons and order-driven player combat.
//!
//! [`fire_weapon`] is the one place projectiles are created. It is used by
//! the player combat system below and by the enemy AI apply phase.
//!
//! ## Cooldowns
//!
//! `weapon_cooldown_system` runs at the start of the Combat phase and only
//! ever lowers cooldowns, clamped at zero. A cooldown is raised back to
//! `CombatTuning::weapon_cooldown` only by a successful fire.

use crate::audio::{AudioCue, CueBuffer};
use crate::components::*;
use crate::config::{CombatTuning, SimConfig};
use crate::geometry::{direction, heading_degrees};
use crate::systems::movement::DeltaTime;
use crate::systems::tactical::TargetKind;
use bevy_ecs::prelude::*;
use tracing::{debug, trace};

/// One fire request: who shoots, from where, at what.
#[derive(Debug, Clone, Copy)]
pub struct Shot {
    pub shooter: Entity,
    pub faction: Faction,
    pub origin: Position,
    /// Locked target, or `None` for a free shot.
    pub target: Option<Entity>,
    pub aim: Position,
}

/// Fire the shooter's weapon at `shot.aim`.
///
/// Turns the shooter toward the aim point, queues a projectile spawn and
/// resets the cooldown. Returns `false` without side effects while the
/// weapon is still cooling down.
pub fn fire_weapon(
    commands: &mut Commands,
    tuning: &CombatTuning,
    cues: &mut CueBuffer,
    craft: &mut Spacecraft,
    shot: Shot,
) -> bool {
    if !craft.can_fire() {
        return false;
    }

    let (dx, dy) = direction(&shot.origin, &shot.aim);
    if dx != 0.0 || dy != 0.0 {
        craft.angle = heading_degrees(dx, dy);
    }

    commands.spawn(ProjectileBundle {
        position: shot.origin,
        projectile: Projectile {
            direction_x: dx,
            direction_y: dy,
            speed: tuning.projectile_speed,
            lifetime: tuning.projectile_lifetime,
            owner: shot.shooter,
            owner_faction: shot.faction,
            locked_target: shot.target,
            active: true,
        },
    });
    craft.weapon_cooldown = tuning.weapon_cooldown;
    cues.push(AudioCue::Pew);

    trace!(shooter = ?shot.shooter, target = ?shot.target, "weapon fired");
    true
}

/// Counts every weapon cooldown down toward zero.
pub fn weapon_cooldown_system(dt: Res<DeltaTime>, mut ships: Query<&mut Spacecraft>) {
    let delta = dt.0;
    for mut craft in ships.iter_mut() {
        if craft.weapon_cooldown > 0.0 {
            craft.weapon_cooldown = (craft.weapon_cooldown - delta).max(0.0);
        }
    }
}

/// Carries out attack orders for order-driven ships.
///
/// A ship with an attack order fires when its target is in range and
/// otherwise chases it. Orders on missing, dead or friendly targets are
/// dropped. Ships without an attack order never fire on their own.
pub fn player_combat_system(
    mut commands: Commands,
    tuning: Res<CombatTuning>,
    config: Res<SimConfig>,
    mut cues: ResMut<CueBuffer>,
    mut ships: Query<(Entity, &Faction, &Position, &Health, &mut Spacecraft)>,
    targets: Query<(&Position, &Faction, &Health, Option<&Planet>)>,
) {
    for (entity, faction, pos, health, mut craft) in ships.iter_mut() {
        let profile = faction.profile();
        if profile.controller != Controller::Orders || !health.is_alive() {
            continue;
        }
        if !craft.attack_intent {
            continue;
        }
        let Some(target) = craft.pursuit_target else {
            craft.attack_intent = false;
            continue;
        };

        let valid = targets.get(target).ok().filter(|(_, target_faction, target_health, _)| {
            target_health.is_alive() && **target_faction == faction.opponent()
        });
        let Some((target_pos, _, _, planet)) = valid else {
            debug!(?entity, ?target, "attack order dropped: target gone");
            craft.clear_orders();
            craft.stop();
            continue;
        };

        let range = TargetKind::of(planet.is_some()).engagement_range(&tuning);
        if pos.distance_to(target_pos) <= range {
            craft.stop();
            if profile.fire_policy == FirePolicy::OnOrder {
                fire_weapon(
                    &mut commands,
                    &tuning,
                    &mut cues,
                    &mut craft,
                    Shot {
                        shooter: entity,
                        faction: *faction,
                        origin: *pos,
                        target: Some(target),
                        aim: *target_pos,
                    },
                );
            }
        } else {
            let destination = config.world_bounds.clamp(*target_pos);
            craft.set_destination(pos, destination, tuning.arrival_threshold);
        }
    }
}
