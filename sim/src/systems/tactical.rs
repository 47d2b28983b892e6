//! Tactical analysis - the per-agent read-only view of the battlefield.
//!
//! Every AI pass builds one [`Battlefield`] (a flat copy of all living
//! ships and planets) and then derives a [`TacticalSnapshot`] for each
//! enemy agent from it. Target scanning is a plain linear pass over the
//! battlefield with no spatial partitioning: AI agents always know where
//! every player unit is, no matter how far away.

use crate::components::*;
use crate::config::CombatTuning;
use crate::geometry::centroid;
use bevy_ecs::prelude::*;

// ============================================================================
// BATTLEFIELD VIEW
// ============================================================================

/// Copy of a living ship taken at the start of an AI pass.
#[derive(Debug, Clone, Copy)]
pub struct ShipInfo {
    pub entity: Entity,
    pub faction: Faction,
    pub position: Position,
    pub health: i32,
    pub health_fraction: f32,
    /// AI state for state-machine ships, `None` for order-driven ones.
    pub state: Option<AiState>,
}

/// Copy of a living planet taken at the start of an AI pass.
#[derive(Debug, Clone, Copy)]
pub struct PlanetInfo {
    pub entity: Entity,
    pub faction: Faction,
    pub position: Position,
    pub health: i32,
    pub health_fraction: f32,
}

/// What a target reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Ship,
    Planet,
}

impl TargetKind {
    pub fn of(is_planet: bool) -> Self {
        if is_planet {
            TargetKind::Planet
        } else {
            TargetKind::Ship
        }
    }

    /// Hard range at which a target of this kind may be fired on.
    pub fn engagement_range(self, tuning: &CombatTuning) -> f32 {
        match self {
            TargetKind::Ship => tuning.firing_range,
            TargetKind::Planet => tuning.planet_attack_range,
        }
    }
}

/// A located target, with its distance from whoever asked.
#[derive(Debug, Clone, Copy)]
pub struct TargetRef {
    pub entity: Entity,
    pub kind: TargetKind,
    pub position: Position,
    pub health: i32,
    pub distance: f32,
}

impl TargetRef {
    /// Hard range at which this target may be fired on.
    pub fn engagement_range(&self, tuning: &CombatTuning) -> f32 {
        self.kind.engagement_range(tuning)
    }

    pub fn in_range(&self, tuning: &CombatTuning) -> bool {
        self.distance <= self.engagement_range(tuning)
    }
}

/// All living ships and planets. Dead entities are never added, so nothing
/// built from this view can select them.
#[derive(Debug, Clone, Default)]
pub struct Battlefield {
    pub ships: Vec<ShipInfo>,
    pub planets: Vec<PlanetInfo>,
}

impl Battlefield {
    pub fn add_ship(&mut self, entity: Entity, faction: Faction, position: Position, health: &Health, state: Option<AiState>) {
        if health.is_alive() {
            self.ships.push(ShipInfo {
                entity,
                faction,
                position,
                health: health.current,
                health_fraction: health.fraction(),
                state,
            });
        }
    }

    pub fn add_planet(&mut self, entity: Entity, faction: Faction, position: Position, health: &Health) {
        if health.is_alive() {
            self.planets.push(PlanetInfo {
                entity,
                faction,
                position,
                health: health.current,
                health_fraction: health.fraction(),
            });
        }
    }

    pub fn ship(&self, entity: Entity) -> Option<&ShipInfo> {
        self.ships.iter().find(|s| s.entity == entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.faction_of(entity).is_some()
    }

    pub fn faction_of(&self, entity: Entity) -> Option<Faction> {
        self.ship(entity).map(|s| s.faction).or_else(|| {
            self.planets
                .iter()
                .find(|p| p.entity == entity)
                .map(|p| p.faction)
        })
    }

    /// Resolve a living ship or planet, measured from `from`.
    pub fn locate(&self, entity: Entity, from: &Position) -> Option<TargetRef> {
        if let Some(ship) = self.ship(entity) {
            return Some(ship_ref(ship, from));
        }
        self.planets
            .iter()
            .find(|p| p.entity == entity)
            .map(|p| planet_ref(p, from))
    }

    /// Nearest living ship of `faction`, skipping `exclude`.
    pub fn nearest_ship(&self, from: &Position, faction: Faction, exclude: Option<Entity>) -> Option<TargetRef> {
        self.ships
            .iter()
            .filter(|s| s.faction == faction && Some(s.entity) != exclude)
            .map(|s| ship_ref(s, from))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    pub fn nearest_planet(&self, from: &Position, faction: Faction) -> Option<TargetRef> {
        self.planets
            .iter()
            .filter(|p| p.faction == faction)
            .map(|p| planet_ref(p, from))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Living ships of `faction` within `radius` of `from`, skipping `exclude`.
    pub fn count_ships(&self, from: &Position, radius: f32, faction: Faction, exclude: Option<Entity>) -> usize {
        self.ships
            .iter()
            .filter(|s| s.faction == faction && Some(s.entity) != exclude)
            .filter(|s| s.position.distance_to(from) <= radius)
            .count()
    }

    pub fn ship_count(&self, faction: Faction) -> usize {
        self.ships.iter().filter(|s| s.faction == faction).count()
    }

    /// Defending ships around the planet plus its health fraction.
    /// Lower is more vulnerable.
    pub fn planet_vulnerability(&self, planet: &PlanetInfo, tuning: &CombatTuning) -> f32 {
        let defenders = self.count_ships(&planet.position, tuning.planet_defense_radius, planet.faction, None);
        defenders as f32 + planet.health_fraction
    }

    /// The most vulnerable planet of `faction` within `range` of `from`.
    /// Ties go to the closer planet.
    pub fn most_vulnerable_planet(
        &self,
        from: &Position,
        range: f32,
        faction: Faction,
        tuning: &CombatTuning,
    ) -> Option<TargetRef> {
        self.planets
            .iter()
            .filter(|p| p.faction == faction)
            .map(|p| (self.planet_vulnerability(p, tuning), planet_ref(p, from)))
            .filter(|(_, t)| t.distance <= range)
            .min_by(|(va, a), (vb, b)| va.total_cmp(vb).then(a.distance.total_cmp(&b.distance)))
            .map(|(_, t)| t)
    }

    /// Centroid of every living ship and planet of `faction`.
    pub fn faction_centroid(&self, faction: Faction, exclude: Option<Entity>) -> Option<Position> {
        let ships = self
            .ships
            .iter()
            .filter(|s| s.faction == faction && Some(s.entity) != exclude)
            .map(|s| &s.position);
        let planets = self.planets.iter().filter(|p| p.faction == faction).map(|p| &p.position);
        centroid(ships.chain(planets))
    }

    /// Centroid of living ships of `faction` only.
    pub fn fleet_centroid(&self, faction: Faction, exclude: Option<Entity>) -> Option<Position> {
        centroid(
            self.ships
                .iter()
                .filter(|s| s.faction == faction && Some(s.entity) != exclude)
                .map(|s| &s.position),
        )
    }
}

fn ship_ref(ship: &ShipInfo, from: &Position) -> TargetRef {
    TargetRef {
        entity: ship.entity,
        kind: TargetKind::Ship,
        position: ship.position,
        health: ship.health,
        distance: ship.position.distance_to(from),
    }
}

fn planet_ref(planet: &PlanetInfo, from: &Position) -> TargetRef {
    TargetRef {
        entity: planet.entity,
        kind: TargetKind::Planet,
        position: planet.position,
        health: planet.health,
        distance: planet.position.distance_to(from),
    }
}

// ============================================================================
// TACTICAL SNAPSHOT
// ============================================================================

/// Per-agent summary of the situation, recomputed on every AI pass.
///
/// `nearby_enemies` never includes the agent. The force comparisons that
/// weigh the agent's whole side (`player_overwhelmed`, [`outnumbered`])
/// add it back as `nearby_enemies + 1`. The retreat rule compares
/// `nearby_players` against `nearby_enemies` as stored, i.e. against the
/// agent's allies only.
///
/// [`outnumbered`]: TacticalSnapshot::outnumbered
#[derive(Debug, Clone, Copy, Default)]
pub struct TacticalSnapshot {
    pub health_fraction: f32,
    /// Living player ships within detection radius.
    pub nearby_players: usize,
    /// Living enemy ships within detection radius, not counting the agent.
    pub nearby_enemies: usize,
    pub nearest_player: Option<TargetRef>,
    pub vulnerable_planet: Option<TargetRef>,
    pub player_overwhelmed: bool,
    pub safe_to_attack_planet: bool,
    /// The agent is a member of an active formation.
    pub in_formation: bool,
    /// Best target inside engagement range, if any.
    pub engage_target: Option<TargetRef>,
    /// Best target anywhere.
    pub pursue_target: Option<TargetRef>,
}

impl TacticalSnapshot {
    /// More player ships nearby than the agent's side, itself included.
    pub fn outnumbered(&self) -> bool {
        self.nearby_players > self.nearby_enemies + 1
    }
}

/// Analyze the battlefield from `agent`'s point of view.
///
/// `formation_target` is the shared target of the agent's formation, if it
/// belongs to one. Target priority for both engagement and pursuit is the
/// formation target, then the nearest player ship, then a player planet.
pub fn analyze(
    agent: &ShipInfo,
    formation_target: Option<Entity>,
    field: &Battlefield,
    tuning: &CombatTuning,
) -> TacticalSnapshot {
    let me = &agent.position;
    let foe = agent.faction.opponent();
    let detection = tuning.detection_radius();

    let nearby_players = field.count_ships(me, detection, foe, None);
    let nearby_enemies = field.count_ships(me, detection, agent.faction, Some(agent.entity));
    let nearest_player = field.nearest_ship(me, foe, None);
    let vulnerable_planet = field.most_vulnerable_planet(me, tuning.planet_scan_range, foe, tuning);

    let side = (nearby_enemies + 1) as f32;
    let player_overwhelmed = side >= nearby_players as f32 * tuning.overwhelm_ratio;
    let safe_to_attack_planet = nearby_players == 0 || player_overwhelmed;

    let formation = formation_target
        .and_then(|t| field.locate(t, me))
        .filter(|t| field.faction_of(t.entity) == Some(foe));
    let planet = vulnerable_planet
        .filter(|_| safe_to_attack_planet)
        .or_else(|| field.nearest_planet(me, foe));

    let engage_target = formation
        .filter(|t| t.in_range(tuning))
        .or_else(|| nearest_player.filter(|t| t.in_range(tuning)))
        .or_else(|| planet.filter(|t| t.in_range(tuning)));
    let pursue_target = formation.or(nearest_player).or(planet);

    TacticalSnapshot {
        health_fraction: agent.health_fraction,
        nearby_players,
        nearby_enemies,
        nearest_player,
        vulnerable_planet,
        player_overwhelmed,
        safe_to_attack_planet,
        in_formation: formation_target.is_some(),
        engage_target,
        pursue_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> (Battlefield, Entity) {
        let mut field = Battlefield::default();
        let me = Entity::from_raw(1);
        field.add_ship(me, Faction::Enemy, Position::new(0.0, 0.0), &Health::new(10), Some(AiState::Search));
        (field, me)
    }

    #[test]
    fn test_counts_exclude_self_and_dead() {
        let (mut field, me) = field();
        field.add_ship(Entity::from_raw(2), Faction::Enemy, Position::new(0.1, 0.0), &Health::new(10), None);
        field.add_ship(Entity::from_raw(3), Faction::Player, Position::new(5.0, 0.0), &Health::new(10), None);
        let mut dead = Health::new(1);
        dead.apply_damage(1);
        field.add_ship(Entity::from_raw(4), Faction::Player, Position::new(0.1, 0.1), &dead, None);

        let agent = *field.ship(me).unwrap();
        let snap = analyze(&agent, None, &field, &CombatTuning::default());
        assert_eq!(snap.nearby_enemies, 1);
        assert_eq!(snap.nearby_players, 1);
        // Detection is unbounded: the far ship is still the nearest player.
        assert_eq!(snap.nearest_player.unwrap().entity, Entity::from_raw(3));
        assert!(snap.engage_target.is_none());
        assert_eq!(snap.pursue_target.unwrap().entity, Entity::from_raw(3));
    }

    #[test]
    fn test_force_comparisons_count_the_agent() {
        let (mut field, me) = field();
        field.add_ship(Entity::from_raw(2), Faction::Player, Position::new(0.1, 0.0), &Health::new(10), None);
        field.add_ship(Entity::from_raw(3), Faction::Player, Position::new(0.0, 0.1), &Health::new(10), None);

        let tuning = CombatTuning::default();
        let agent = *field.ship(me).unwrap();
        let snap = analyze(&agent, None, &field, &tuning);
        assert_eq!(snap.nearby_enemies, 0);
        assert_eq!(snap.nearby_players, 2);
        // Two players against the lone agent: outnumbered, but not 2:1.
        assert!(snap.outnumbered());
        assert!(!snap.player_overwhelmed);

        // An ally evens the sides.
        field.add_ship(Entity::from_raw(4), Faction::Enemy, Position::new(-0.1, 0.0), &Health::new(10), None);
        let snap = analyze(&agent, None, &field, &tuning);
        assert_eq!(snap.nearby_enemies, 1);
        assert!(!snap.outnumbered());
        assert!(!snap.player_overwhelmed);
    }

    #[test]
    fn test_vulnerability_prefers_undefended_planet() {
        let (mut field, me) = field();
        let defended = Entity::from_raw(10);
        let open = Entity::from_raw(11);
        field.add_planet(defended, Faction::Player, Position::new(0.3, 0.0), &Health::new(100));
        field.add_planet(open, Faction::Player, Position::new(0.0, 0.6), &Health::new(100));
        field.add_ship(Entity::from_raw(12), Faction::Player, Position::new(0.35, 0.0), &Health::new(10), None);

        let agent = *field.ship(me).unwrap();
        let snap = analyze(&agent, None, &field, &CombatTuning::default());
        assert_eq!(snap.vulnerable_planet.unwrap().entity, open);
        // One agent against one player ship is not a 2:1 advantage.
        assert!(!snap.player_overwhelmed);
        assert!(!snap.safe_to_attack_planet);
    }

    #[test]
    fn test_engage_priority_prefers_formation_target() {
        let (mut field, me) = field();
        let close = Entity::from_raw(2);
        let assigned = Entity::from_raw(3);
        field.add_ship(close, Faction::Player, Position::new(0.1, 0.0), &Health::new(10), None);
        field.add_ship(assigned, Faction::Player, Position::new(0.0, 0.4), &Health::new(10), None);

        let tuning = CombatTuning::default();
        let agent = *field.ship(me).unwrap();
        let solo = analyze(&agent, None, &field, &tuning);
        assert_eq!(solo.engage_target.unwrap().entity, close);

        let grouped = analyze(&agent, Some(assigned), &field, &tuning);
        assert_eq!(grouped.engage_target.unwrap().entity, assigned);
        assert!(grouped.in_formation);
    }

    #[test]
    fn test_planet_in_attack_range_is_engaged() {
        let (mut field, me) = field();
        let planet = Entity::from_raw(20);
        field.add_planet(planet, Faction::Player, Position::new(0.55, 0.0), &Health::new(100));

        let agent = *field.ship(me).unwrap();
        let snap = analyze(&agent, None, &field, &CombatTuning::default());
        assert!(snap.safe_to_attack_planet);
        let target = snap.engage_target.unwrap();
        assert_eq!(target.entity, planet);
        assert_eq!(target.kind, TargetKind::Planet);
    }
}
