//! Group tactics - coordinated enemy formations.
//!
//! Formations live in the [`GroupTactics`] resource as a plain list of
//! records that name their members and target by `Entity` only. Nothing is
//! cached between passes: the target position, the member list and every
//! slot position are looked up or recomputed fresh each time.
//!
//! `group_tactics_system` runs every pass for upkeep (pruning dead members,
//! tracking the target, expiring formations) and forms new formations on
//! its own, slower timer.

use crate::components::*;
use crate::config::CombatTuning;
use crate::geometry::centroid;
use crate::systems::movement::DeltaTime;
use crate::systems::tactical::{Battlefield, TargetRef};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use tracing::{debug, info};

/// Formation layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationKind {
    /// Tight concentric rings around the target.
    MassAttack,
    /// One wide ring around a weakened target.
    Surround,
}

impl FormationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FormationKind::MassAttack => "MassAttack",
            FormationKind::Surround => "Surround",
        }
    }
}

/// One active formation.
#[derive(Debug, Clone)]
pub struct GroupFormation {
    pub id: u32,
    pub kind: FormationKind,
    /// Member order decides slot assignment.
    pub members: Vec<Entity>,
    pub target: Entity,
    /// Follows the target's position.
    pub center: Position,
    /// Seconds since the formation was created.
    pub age: f32,
    pub active: bool,
}

impl GroupFormation {
    pub fn contains(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    /// Slot of `entity` in this formation, if it is a member.
    pub fn slot_of(&self, entity: Entity, tuning: &CombatTuning) -> Option<Position> {
        let index = self.members.iter().position(|m| *m == entity)?;
        Some(slot_position(self.kind, index, self.members.len(), &self.center, tuning))
    }
}

/// Where member `index` of a `count`-strong formation should sit.
pub fn slot_position(
    kind: FormationKind,
    index: usize,
    count: usize,
    center: &Position,
    tuning: &CombatTuning,
) -> Position {
    let (radius, angle) = match kind {
        FormationKind::MassAttack => {
            let per_ring = tuning.mass_attack_slots_per_ring.max(1);
            let ring = index / per_ring;
            let slot = index % per_ring;
            let step = TAU / per_ring as f32;
            (
                tuning.mass_attack_base_radius + tuning.mass_attack_ring_spacing * ring as f32,
                slot as f32 * step + ring as f32 * step * 0.5,
            )
        }
        FormationKind::Surround => {
            let count = count.max(1);
            (tuning.surround_radius, index as f32 * TAU / count as f32)
        }
    };
    Position::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

/// Formation arena and the coordinator's timer.
#[derive(Resource, Debug, Default)]
pub struct GroupTactics {
    pub formations: Vec<GroupFormation>,
    /// Seconds until the next formation evaluation.
    pub until_next_evaluation: f32,
    next_id: u32,
}

impl GroupTactics {
    /// The active formation `entity` belongs to.
    pub fn formation_of(&self, entity: Entity) -> Option<&GroupFormation> {
        self.formations.iter().find(|f| f.active && f.contains(entity))
    }

    pub fn is_member(&self, entity: Entity) -> bool {
        self.formation_of(entity).is_some()
    }

    pub fn has_active(&self, kind: FormationKind) -> bool {
        self.formations.iter().any(|f| f.active && f.kind == kind)
    }

    pub fn clear(&mut self) {
        self.formations.clear();
        self.until_next_evaluation = 0.0;
    }

    fn create(&mut self, kind: FormationKind, members: Vec<Entity>, target: &TargetRef) -> &GroupFormation {
        self.next_id = self.next_id.wrapping_add(1);
        self.formations.push(GroupFormation {
            id: self.next_id,
            kind,
            members,
            target: target.entity,
            center: target.position,
            age: 0.0,
            active: true,
        });
        let index = self.formations.len() - 1;
        &self.formations[index]
    }
}

/// Target a freshly assembled group should go after, seen from the pool's
/// centroid: a player ship if the player fields a large force, else the
/// most vulnerable player planet, else any player ship in coordination range.
pub fn strategic_target(
    pool_center: &Position,
    field: &Battlefield,
    tuning: &CombatTuning,
) -> Option<TargetRef> {
    let foe = Faction::Player;
    let ship_in_range = || {
        field
            .nearest_ship(pool_center, foe, None)
            .filter(|t| t.distance <= tuning.coordination_range)
    };
    if field.ship_count(foe) >= tuning.large_player_force {
        if let Some(target) = ship_in_range() {
            return Some(target);
        }
    }
    field
        .most_vulnerable_planet(pool_center, tuning.planet_scan_range, foe, tuning)
        .or_else(ship_in_range)
}

/// Per-pass formation upkeep plus periodic formation assembly.
pub fn group_tactics_system(
    dt: Res<DeltaTime>,
    tuning: Res<CombatTuning>,
    mut tactics: ResMut<GroupTactics>,
    mut agents: Query<(Entity, &Faction, &Position, &Health, &mut AiBrain)>,
    others: Query<(Entity, &Faction, &Position, &Health, Option<&Planet>), Without<AiBrain>>,
) {
    let mut field = Battlefield::default();
    for (entity, faction, pos, health, brain) in agents.iter() {
        field.add_ship(entity, *faction, *pos, health, Some(brain.state));
    }
    for (entity, faction, pos, health, planet) in others.iter() {
        if planet.is_some() {
            field.add_planet(entity, *faction, *pos, health);
        } else {
            field.add_ship(entity, *faction, *pos, health, None);
        }
    }

    // Upkeep: prune, track, expire.
    let mut released = Vec::new();
    for formation in tactics.formations.iter_mut() {
        formation.age += dt.0;
        formation.members.retain(|m| field.ship(*m).is_some());

        let target = field.locate(formation.target, &formation.center);
        let expired = formation.age >= tuning.formation_lifetime;
        match target {
            Some(t) if !expired && !formation.members.is_empty() => formation.center = t.position,
            _ => {
                formation.active = false;
                info!(
                    id = formation.id,
                    kind = formation.kind.as_str(),
                    target_alive = target.is_some(),
                    expired,
                    "formation dissolved"
                );
                released.append(&mut formation.members);
            }
        }
    }
    tactics.formations.retain(|f| f.active);
    for entity in released {
        if let Ok((_, _, _, _, mut brain)) = agents.get_mut(entity) {
            brain.reset_to_search();
        }
    }

    tactics.until_next_evaluation -= dt.0;
    if tactics.until_next_evaluation > 0.0 {
        return;
    }
    tactics.until_next_evaluation = tuning.group_tactics_interval;

    assemble(FormationKind::MassAttack, &tuning, &mut tactics, &field, &mut agents);
    assemble(FormationKind::Surround, &tuning, &mut tactics, &field, &mut agents);
}

/// Living state-machine enemies free to join a formation.
fn available_pool(field: &Battlefield, tactics: &GroupTactics) -> Vec<(Entity, Position)> {
    let mut pool: Vec<(Entity, Position)> = field
        .ships
        .iter()
        .filter(|s| s.faction.profile().controller == Controller::StateMachine)
        .filter(|s| !matches!(s.state, None | Some(AiState::Retreat) | Some(AiState::Regroup)))
        .filter(|s| !tactics.is_member(s.entity))
        .map(|s| (s.entity, s.position))
        .collect();
    pool.sort_by_key(|(entity, _)| *entity);
    pool
}

fn assemble(
    kind: FormationKind,
    tuning: &CombatTuning,
    tactics: &mut GroupTactics,
    field: &Battlefield,
    agents: &mut Query<(Entity, &Faction, &Position, &Health, &mut AiBrain)>,
) {
    if tactics.has_active(kind) {
        return;
    }
    let pool = available_pool(field, tactics);
    let min_units = match kind {
        FormationKind::MassAttack => tuning.mass_attack_min_units,
        FormationKind::Surround => tuning.surround_min_units,
    };
    if pool.len() < min_units {
        return;
    }
    // A mass attack also needs someone to attack.
    if kind == FormationKind::MassAttack && field.ship_count(Faction::Player) == 0 {
        return;
    }

    let Some(center) = centroid(pool.iter().map(|(_, p)| p)) else {
        return;
    };
    let Some(target) = strategic_target(&center, field, tuning) else {
        debug!(kind = kind.as_str(), pool = pool.len(), "no strategic target");
        return;
    };
    if kind == FormationKind::Surround && target.health >= tuning.vulnerable_health {
        return;
    }

    let members: Vec<Entity> = pool.into_iter().map(|(entity, _)| entity).collect();
    for entity in &members {
        if let Ok((_, _, _, _, mut brain)) = agents.get_mut(*entity) {
            brain.transition(AiState::Approach);
            brain.target = Some(target.entity);
        }
    }
    let formation = tactics.create(kind, members, &target);
    info!(
        id = formation.id,
        kind = kind.as_str(),
        members = formation.members.len(),
        target = ?target.entity,
        "formation formed"
    );
}
