//! Destruction side effects and the game-over check.
//!
//! Collision only flips `Health::alive`; everything a death implies
//! (score, audio, wiping a planet's build queue) happens here, one pass
//! later in the same update, from the recorded [`DestructionEvents`].

use crate::audio::{AudioCue, CueBuffer};
use crate::components::*;
use crate::config::CombatTuning;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What kind of entity died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyedKind {
    Ship,
    Planet,
}

/// A single death recorded during the current pass.
#[derive(Debug, Clone, Copy)]
pub struct Destruction {
    pub entity: Entity,
    pub faction: Faction,
    pub kind: DestroyedKind,
    pub position: Position,
}

/// Deaths recorded this pass, drained by [`destruction_effects_system`].
#[derive(Resource, Debug, Default)]
pub struct DestructionEvents {
    pub events: Vec<Destruction>,
}

impl DestructionEvents {
    pub fn record(&mut self, event: Destruction) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Running score and loss counters exposed to the game-state collaborator.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u32,
    pub enemies_killed: u32,
    pub player_ships_lost: u32,
    pub planets_lost: u32,
    pub enemy_planets_destroyed: u32,
    pub survival_time: f32,
    pub game_over: bool,
}

/// Applies the faction-specific consequences of every recorded death.
pub fn destruction_effects_system(
    tuning: Res<CombatTuning>,
    mut events: ResMut<DestructionEvents>,
    mut stats: ResMut<GameStats>,
    mut cues: ResMut<CueBuffer>,
    mut planets: Query<&mut Planet>,
) {
    for event in events.events.drain(..) {
        cues.push(AudioCue::Boom);
        match (event.kind, event.faction) {
            (DestroyedKind::Ship, Faction::Enemy) => {
                stats.score += tuning.score_per_kill;
                stats.enemies_killed += 1;
                debug!(entity = ?event.entity, score = stats.score, "enemy ship destroyed");
            }
            (DestroyedKind::Ship, Faction::Player) => {
                stats.player_ships_lost += 1;
                debug!(entity = ?event.entity, "player ship destroyed");
            }
            (DestroyedKind::Planet, faction) => {
                let dropped = planets
                    .get_mut(event.entity)
                    .map(|mut planet| {
                        let n = planet.build_queue.len();
                        planet.build_queue.clear();
                        n
                    })
                    .unwrap_or(0);
                match faction {
                    Faction::Player => stats.planets_lost += 1,
                    Faction::Enemy => stats.enemy_planets_destroyed += 1,
                }
                info!(
                    entity = ?event.entity,
                    faction = faction.as_str(),
                    dropped_builds = dropped,
                    "planet destroyed"
                );
            }
        }
    }
}

/// Wipes the build queue of any planet found dead, however it died.
pub fn planet_wreck_system(mut planets: Query<(&Health, &mut Planet)>) {
    for (health, mut planet) in planets.iter_mut() {
        if !health.is_alive() && !planet.build_queue.is_empty() {
            planet.build_queue.clear();
        }
    }
}

/// Latches game over once no living player-owned planet remains.
pub fn game_over_system(
    dt: Res<DeltaTime>,
    mut stats: ResMut<GameStats>,
    planets: Query<(&Faction, &Health), With<Planet>>,
) {
    if stats.game_over {
        return;
    }
    stats.survival_time += dt.0;

    let has_living_home = planets
        .iter()
        .any(|(faction, health)| *faction == Faction::Player && health.is_alive());
    if !has_living_home {
        stats.game_over = true;
        info!(
            score = stats.score,
            survival_time = stats.survival_time,
            "game over: all player planets destroyed"
        );
    }
}
