//! Per-unit AI for state-machine driven (enemy) ships.
//!
//! Each AI pass has two phases:
//!
//! 1. **Gather** - copy every living ship and planet into a [`Battlefield`],
//!    analyze it once per agent and decide the agent's next state, target,
//!    movement and fire intent. This phase only reads, and each agent's
//!    decision is independent of the others.
//! 2. **Apply** - write the decisions back to `AiBrain`/`Spacecraft` and
//!    fire weapons, sequentially.
//!
//! ## Parallel Feature
//!
//! When compiled with `--features parallel`, the gather phase runs on rayon's
//! thread pool. The apply phase is always sequential, so results are the
//! same either way.

use crate::audio::CueBuffer;
use crate::components::*;
use crate::config::{CombatTuning, SimConfig, WorldBounds};
use crate::geometry::{direction, heading_degrees, offset_from};
use crate::systems::combat::{fire_weapon, Shot};
use crate::systems::formation::GroupTactics;
use crate::systems::movement::DeltaTime;
use crate::systems::tactical::{analyze, Battlefield, ShipInfo, TacticalSnapshot, TargetKind, TargetRef};
use bevy_ecs::prelude::*;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// AI CADENCE
// ============================================================================

/// Timer for the per-agent AI. Starts due, so the first pass decides.
/// Leftover time is dropped when it fires.
#[derive(Resource, Debug, Default)]
pub struct AiClock {
    pub until_next_update: f32,
}

impl AiClock {
    /// Advance by `dt`; returns true when an AI pass is due.
    pub fn advance(&mut self, dt: f32, interval: f32) -> bool {
        self.until_next_update -= dt;
        if self.until_next_update > 0.0 {
            return false;
        }
        self.until_next_update = interval;
        true
    }
}

// ============================================================================
// STATE TRANSITIONS
// ============================================================================

/// Next AI state for an agent. Rules are checked in priority order and the
/// first match wins. The result depends only on the snapshot, so the
/// current state never holds an agent in place.
pub fn determine_ai_state(_current: AiState, snapshot: &TacticalSnapshot, tuning: &CombatTuning) -> AiState {
    let badly_hurt = snapshot.health_fraction < tuning.retreat_health_fraction;
    if badly_hurt && snapshot.nearby_players > snapshot.nearby_enemies {
        return AiState::Retreat;
    }
    if snapshot.nearby_enemies == 0 && snapshot.nearby_players == 0 {
        return AiState::Regroup;
    }
    if snapshot.engage_target.is_some() {
        return AiState::Engage;
    }
    if snapshot.pursue_target.is_some() {
        return AiState::Approach;
    }
    AiState::Search
}

// ============================================================================
// DECISIONS
// ============================================================================

/// Movement part of a decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steer {
    /// Leave the current destination alone.
    Hold,
    Stop,
    MoveTo(Position),
}

/// Everything the apply phase needs to carry out one agent's decision.
#[derive(Debug, Clone, Copy)]
pub struct AiDecision {
    pub entity: Entity,
    pub state: AiState,
    pub target: Option<Entity>,
    pub steer: Steer,
    /// Point to turn toward without moving.
    pub face: Option<Position>,
    pub fire_at: Option<TargetRef>,
}

/// Read-only input for one agent's decision.
#[derive(Debug, Clone, Copy)]
pub struct AgentView {
    pub ship: ShipInfo,
    pub brain: AiBrain,
    pub destination: Position,
    pub moving: bool,
    pub formation_target: Option<Entity>,
    pub formation_slot: Option<Position>,
}

/// Decide what one agent does this AI pass.
pub fn decide(agent: &AgentView, field: &Battlefield, tuning: &CombatTuning, bounds: &WorldBounds) -> AiDecision {
    let snapshot = analyze(&agent.ship, agent.formation_target, field, tuning);
    let state = determine_ai_state(agent.brain.state, &snapshot, tuning);

    let mut decision = AiDecision {
        entity: agent.ship.entity,
        state,
        target: None,
        steer: Steer::Hold,
        face: None,
        fire_at: None,
    };

    match state {
        AiState::Search => search(agent, &snapshot, field, bounds, &mut decision),
        AiState::Approach => approach(agent, &snapshot, tuning, &mut decision),
        AiState::Engage => engage(agent, &snapshot, tuning, &mut decision),
        AiState::Retreat => retreat(agent, &snapshot, field, tuning, bounds, &mut decision),
        AiState::Regroup => regroup(agent, field, tuning, bounds, &mut decision),
    }

    if let Steer::MoveTo(dest) = decision.steer {
        decision.steer = Steer::MoveTo(bounds.clamp(dest));
    }
    decision
}

/// Sweep toward the nearest player ship, then any player planet, then the
/// player's centroid, then the map center.
fn search(
    agent: &AgentView,
    snapshot: &TacticalSnapshot,
    field: &Battlefield,
    bounds: &WorldBounds,
    out: &mut AiDecision,
) {
    let me = &agent.ship.position;
    let foe = agent.ship.faction.opponent();
    let dest = snapshot
        .nearest_player
        .map(|t| t.position)
        .or_else(|| field.nearest_planet(me, foe).map(|t| t.position))
        .or_else(|| field.faction_centroid(foe, None))
        .unwrap_or_else(|| bounds.center());
    out.steer = Steer::MoveTo(dest);
}

/// Close to an optimal range short of the engagement range, or take up the
/// formation slot first.
fn approach(
    agent: &AgentView,
    snapshot: &TacticalSnapshot,
    tuning: &CombatTuning,
    out: &mut AiDecision,
) {
    let Some(target) = snapshot.pursue_target else {
        return;
    };
    out.target = Some(target.entity);
    let me = &agent.ship.position;

    if let Some(slot) = agent.formation_slot {
        if me.distance_to(&slot) > tuning.formation_slot_tolerance {
            out.steer = Steer::MoveTo(slot);
            return;
        }
    }

    let factor = match target.kind {
        TargetKind::Ship => tuning.approach_ship_factor,
        TargetKind::Planet => tuning.approach_planet_factor,
    };
    let optimal = target.engagement_range(tuning) * factor;
    out.steer = Steer::MoveTo(offset_from(&target.position, me, optimal));
}

/// Face and fire on the engaged target, holding the formation slot or
/// backing off when crowded and outnumbered.
fn engage(
    agent: &AgentView,
    snapshot: &TacticalSnapshot,
    tuning: &CombatTuning,
    out: &mut AiDecision,
) {
    let Some(target) = snapshot.engage_target else {
        return;
    };
    let me = &agent.ship.position;
    out.target = Some(target.entity);
    out.face = Some(target.position);
    out.fire_at = Some(target);

    if let Some(slot) = agent.formation_slot {
        out.steer = if me.distance_to(&slot) > tuning.formation_slot_tolerance {
            Steer::MoveTo(slot)
        } else {
            Steer::Stop
        };
        return;
    }

    let too_close = target.distance < target.engagement_range(tuning) * tuning.too_close_factor;
    out.steer = if too_close && snapshot.outnumbered() {
        let backoff = tuning.firing_range * tuning.backoff_range_factor;
        Steer::MoveTo(offset_from(&target.position, me, backoff))
    } else {
        Steer::Stop
    };
}

/// Flee from the nearest threat, behind a healthy ally if one is close.
fn retreat(
    agent: &AgentView,
    snapshot: &TacticalSnapshot,
    field: &Battlefield,
    tuning: &CombatTuning,
    bounds: &WorldBounds,
    out: &mut AiDecision,
) {
    let me = &agent.ship.position;
    let side = agent.ship.faction;
    let allies = || {
        field
            .ships
            .iter()
            .filter(move |s| s.faction == side && s.entity != agent.ship.entity)
    };

    let dest = if let Some(threat) = snapshot.nearest_player {
        let cover = allies()
            .filter(|s| s.health_fraction > tuning.healthy_ally_fraction)
            .filter(|s| s.position.distance_to(me) <= tuning.support_range)
            .min_by(|a, b| a.position.distance_to(me).total_cmp(&b.position.distance_to(me)));
        let behind_ally = cover.and_then(|ally| {
            let (ux, uy) = direction(&threat.position, &ally.position);
            (ux != 0.0 || uy != 0.0).then(|| {
                Position::new(
                    ally.position.x + ux * tuning.retreat_cover_distance,
                    ally.position.y + uy * tuning.retreat_cover_distance,
                )
            })
        });
        behind_ally.unwrap_or_else(|| {
            offset_from(&threat.position, me, tuning.firing_range * tuning.retreat_range_factor)
        })
    } else {
        let score = |s: &ShipInfo| {
            let fresh = if s.state == Some(AiState::Retreat) { 0.0 } else { 1.0 };
            s.health_fraction + fresh - s.position.distance_to(me)
        };
        allies()
            .max_by(|a, b| score(a).total_cmp(&score(b)))
            .map(|ally| offset_from(&ally.position, me, tuning.retreat_cover_distance))
            .or_else(|| field.fleet_centroid(side, Some(agent.ship.entity)))
            .unwrap_or_else(|| bounds.center())
    };

    let dest = bounds.clamp(dest);
    out.steer = if agent.moving && agent.destination.distance_to(&dest) < tuning.retreat_hysteresis {
        Steer::Hold
    } else {
        Steer::MoveTo(dest)
    };
}

/// Close up with the nearest ally to mutual-support distance.
fn regroup(
    agent: &AgentView,
    field: &Battlefield,
    tuning: &CombatTuning,
    bounds: &WorldBounds,
    out: &mut AiDecision,
) {
    let me = &agent.ship.position;
    let support = tuning.firing_range * tuning.regroup_range_factor;
    out.steer = match field.nearest_ship(me, agent.ship.faction, Some(agent.ship.entity)) {
        Some(ally) if ally.distance > support => Steer::MoveTo(offset_from(&ally.position, me, support)),
        Some(_) => Steer::Stop,
        None => Steer::MoveTo(bounds.center()),
    };
}

// ============================================================================
// ENEMY AI SYSTEM
// ============================================================================

/// Runs the per-unit state machine for every state-machine driven ship.
pub fn enemy_ai_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    tuning: Res<CombatTuning>,
    config: Res<SimConfig>,
    tactics: Res<GroupTactics>,
    mut clock: ResMut<AiClock>,
    mut cues: ResMut<CueBuffer>,
    mut ships: Query<(Entity, &Faction, &Position, &Health, &mut Spacecraft, Option<&mut AiBrain>)>,
    planets: Query<(Entity, &Faction, &Position, &Health), With<Planet>>,
) {
    let delta = dt.0;
    for (_, _, _, health, _, brain) in ships.iter_mut() {
        if let Some(mut brain) = brain {
            if health.is_alive() {
                brain.time_in_state += delta;
            }
        }
    }

    if !clock.advance(delta, tuning.ai_update_interval) {
        return;
    }

    // GATHER PHASE: snapshot the battlefield (read-only)
    let mut field = Battlefield::default();
    for (entity, faction, pos, health, _, brain) in ships.iter() {
        field.add_ship(entity, *faction, *pos, health, brain.map(|b| b.state));
    }
    for (entity, faction, pos, health) in planets.iter() {
        field.add_planet(entity, *faction, *pos, health);
    }

    let agents: Vec<AgentView> = ships
        .iter()
        .filter(|(_, faction, _, health, _, brain)| {
            faction.profile().controller == Controller::StateMachine && health.is_alive() && brain.is_some()
        })
        .filter_map(|(entity, _, _, _, craft, brain)| {
            let ship = *field.ship(entity)?;
            let formation = tactics.formation_of(entity);
            Some(AgentView {
                ship,
                brain: *brain?,
                destination: craft.destination,
                moving: craft.moving,
                formation_target: formation.map(|f| f.target),
                formation_slot: formation.and_then(|f| f.slot_of(entity, &tuning)),
            })
        })
        .collect();

    let bounds = config.world_bounds;
    let params: &CombatTuning = &tuning;

    #[cfg(feature = "parallel")]
    let decisions: Vec<AiDecision> = agents
        .par_iter()
        .map(|agent| decide(agent, &field, params, &bounds))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let decisions: Vec<AiDecision> = agents
        .iter()
        .map(|agent| decide(agent, &field, params, &bounds))
        .collect();

    // APPLY PHASE: sequential writes and weapon fire
    for decision in decisions {
        let Ok((entity, faction, pos, _, mut craft, Some(mut brain))) = ships.get_mut(decision.entity) else {
            continue;
        };

        let previous = brain.state;
        if brain.transition(decision.state) {
            debug!(
                ?entity,
                from = previous.as_str(),
                to = decision.state.as_str(),
                "ai state transition"
            );
        }
        brain.target = decision.target;

        match decision.steer {
            Steer::Hold => {}
            Steer::Stop => craft.stop(),
            Steer::MoveTo(dest) => craft.set_destination(pos, dest, tuning.arrival_threshold),
        }

        if let Some(face) = decision.face {
            let (dx, dy) = direction(pos, &face);
            if dx != 0.0 || dy != 0.0 {
                craft.angle = heading_degrees(dx, dy);
            }
        }

        if let Some(target) = decision.fire_at {
            if faction.profile().fire_policy == FirePolicy::Autonomous {
                fire_weapon(
                    &mut commands,
                    &tuning,
                    &mut cues,
                    &mut craft,
                    Shot {
                        shooter: entity,
                        faction: *faction,
                        origin: *pos,
                        target: Some(target.entity),
                        aim: target.position,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(entity: u32, distance: f32) -> TargetRef {
        TargetRef {
            entity: Entity::from_raw(entity),
            kind: TargetKind::Ship,
            position: Position::new(distance, 0.0),
            health: 10,
            distance,
        }
    }

    fn snapshot() -> TacticalSnapshot {
        TacticalSnapshot {
            health_fraction: 1.0,
            nearby_players: 1,
            nearby_enemies: 1,
            ..Default::default()
        }
    }

    fn setup() -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0 / 30.0));
        world.insert_resource(CombatTuning::default());
        world.insert_resource(SimConfig::default());
        world.insert_resource(GroupTactics::default());
        world.insert_resource(AiClock::default());
        world.insert_resource(CueBuffer::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(enemy_ai_system);
        schedule.run(world);
    }

    #[test]
    fn test_retreat_beats_target_in_range() {
        let tuning = CombatTuning::default();
        let snap = TacticalSnapshot {
            health_fraction: 0.15,
            nearby_players: 3,
            nearby_enemies: 0,
            engage_target: Some(target(2, 0.1)),
            pursue_target: Some(target(2, 0.1)),
            ..Default::default()
        };
        for current in [AiState::Search, AiState::Engage, AiState::Approach] {
            assert_eq!(determine_ai_state(current, &snap, &tuning), AiState::Retreat);
        }
    }

    #[test]
    fn test_transition_priority() {
        let tuning = CombatTuning::default();

        let isolated = TacticalSnapshot {
            nearby_players: 0,
            nearby_enemies: 0,
            ..snapshot()
        };
        assert_eq!(determine_ai_state(AiState::Search, &isolated, &tuning), AiState::Regroup);

        let in_range = TacticalSnapshot {
            engage_target: Some(target(2, 0.3)),
            pursue_target: Some(target(2, 0.3)),
            ..snapshot()
        };
        assert_eq!(determine_ai_state(AiState::Search, &in_range, &tuning), AiState::Engage);

        let far = TacticalSnapshot {
            pursue_target: Some(target(2, 3.0)),
            ..snapshot()
        };
        assert_eq!(determine_ai_state(AiState::Engage, &far, &tuning), AiState::Approach);

        assert_eq!(determine_ai_state(AiState::Approach, &snapshot(), &tuning), AiState::Search);
    }

    #[test]
    fn test_even_counts_end_retreat() {
        let tuning = CombatTuning::default();
        let even = TacticalSnapshot {
            health_fraction: 0.1,
            nearby_players: 2,
            nearby_enemies: 2,
            engage_target: Some(target(2, 0.3)),
            pursue_target: Some(target(2, 0.3)),
            ..Default::default()
        };
        assert_eq!(determine_ai_state(AiState::Engage, &even, &tuning), AiState::Engage);
        assert_eq!(determine_ai_state(AiState::Retreat, &even, &tuning), AiState::Engage);
    }

    #[test]
    fn test_state_is_deterministic() {
        let tuning = CombatTuning::default();
        let snap = TacticalSnapshot {
            engage_target: Some(target(5, 0.2)),
            pursue_target: Some(target(5, 0.2)),
            ..snapshot()
        };
        let first = determine_ai_state(AiState::Approach, &snap, &tuning);
        for _ in 0..10 {
            assert_eq!(determine_ai_state(AiState::Approach, &snap, &tuning), first);
        }
    }

    #[test]
    fn test_clock_cadence() {
        let mut clock = AiClock::default();
        assert!(clock.advance(0.03, 0.1));
        assert!(!clock.advance(0.03, 0.1));
        assert!(!clock.advance(0.03, 0.1));
        assert!(!clock.advance(0.03, 0.1));
        assert!(clock.advance(0.03, 0.1));
    }

    #[test]
    fn test_enemy_engages_and_fires_once() {
        let mut world = setup();
        world.spawn(ShipBundle::new(Faction::Player, 0.0, 0.0, 10));
        world.spawn(ShipBundle::new(Faction::Player, 0.1, 0.0, 10));
        let enemy = world.spawn(EnemyShipBundle::new(0.3, 0.0, 10)).id();

        run(&mut world);

        let mut query = world.query::<&Projectile>();
        let shots: Vec<Projectile> = query.iter(&world).copied().collect();
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].owner, enemy);
        assert_eq!(shots[0].owner_faction, Faction::Enemy);
        let brain = world.get::<AiBrain>(enemy).unwrap();
        assert_eq!(brain.state, AiState::Engage);
        assert!(brain.target.is_some());
    }

    #[test]
    fn test_far_enemy_approaches_to_optimal_range() {
        let mut world = setup();
        world.spawn(ShipBundle::new(Faction::Player, 0.0, 0.0, 10));
        let enemy = world.spawn(EnemyShipBundle::new(0.9, 0.0, 10)).id();

        run(&mut world);

        assert_eq!(world.get::<AiBrain>(enemy).unwrap().state, AiState::Approach);
        let craft = world.get::<Spacecraft>(enemy).unwrap();
        assert!(craft.moving);
        assert!((craft.destination.x - 0.4).abs() < 1e-5);
        assert!(craft.destination.y.abs() < 1e-5);
    }

    #[test]
    fn test_hurt_enemy_flees() {
        let mut world = setup();
        for i in 0..3 {
            world.spawn(ShipBundle::new(Faction::Player, -0.2, 0.1 * i as f32, 10));
        }
        let mut bundle = EnemyShipBundle::new(0.1, 0.1, 20);
        bundle.ship.health.current = 3;
        let enemy = world.spawn(bundle).id();

        run(&mut world);

        assert_eq!(world.get::<AiBrain>(enemy).unwrap().state, AiState::Retreat);
        let craft = world.get::<Spacecraft>(enemy).unwrap();
        assert!(craft.moving);
        assert!(craft.destination.x > 0.1, "should flee away from the threat");
        let mut query = world.query::<&Projectile>();
        assert_eq!(query.iter(&world).count(), 0);
    }

    #[test]
    fn test_dead_enemy_is_ignored() {
        let mut world = setup();
        world.spawn(ShipBundle::new(Faction::Player, 0.0, 0.0, 10));
        let mut bundle = EnemyShipBundle::new(0.2, 0.0, 1);
        bundle.ship.health.apply_damage(1);
        let enemy = world.spawn(bundle).id();

        run(&mut world);

        assert_eq!(world.get::<AiBrain>(enemy).unwrap().state, AiState::Search);
        let mut query = world.query::<&Projectile>();
        assert_eq!(query.iter(&world).count(), 0);
    }

    fn hurt_enemy(world: &mut World, x: f32, y: f32) -> Entity {
        let mut bundle = EnemyShipBundle::new(x, y, 20);
        bundle.ship.health.current = 3;
        world.spawn(bundle).id()
    }

    fn three_threats(world: &mut World) {
        for y in [0.0, 0.1, -0.1] {
            world.spawn(ShipBundle::new(Faction::Player, -0.2, y, 10));
        }
    }

    #[test]
    fn test_retreat_keeps_nearby_destination() {
        let mut world = setup();
        three_threats(&mut world);
        let enemy = hurt_enemy(&mut world, 0.1, 0.0);
        {
            let mut craft = world.get_mut::<Spacecraft>(enemy).unwrap();
            craft.destination = Position::new(0.73, 0.0);
            craft.moving = true;
        }

        run(&mut world);

        assert_eq!(world.get::<AiBrain>(enemy).unwrap().state, AiState::Retreat);
        // Fresh flee point is (0.7, 0), inside the hysteresis band.
        let craft = world.get::<Spacecraft>(enemy).unwrap();
        assert_eq!(craft.destination, Position::new(0.73, 0.0));

        world.get_mut::<Spacecraft>(enemy).unwrap().destination = Position::new(0.7, 0.4);
        world.resource_mut::<AiClock>().until_next_update = 0.0;
        run(&mut world);

        let craft = world.get::<Spacecraft>(enemy).unwrap();
        assert!((craft.destination.x - 0.7).abs() < 1e-5);
        assert!(craft.destination.y.abs() < 1e-5);
    }

    #[test]
    fn test_retreat_hides_behind_healthy_ally() {
        let mut world = setup();
        three_threats(&mut world);
        let enemy = hurt_enemy(&mut world, 0.1, 0.0);
        world.spawn(EnemyShipBundle::new(0.3, 0.0, 10));

        run(&mut world);

        assert_eq!(world.get::<AiBrain>(enemy).unwrap().state, AiState::Retreat);
        let craft = world.get::<Spacecraft>(enemy).unwrap();
        assert!(craft.moving);
        assert!((craft.destination.x - 0.4).abs() < 1e-5);
        assert!(craft.destination.y.abs() < 1e-5);
    }

    #[test]
    fn test_retreat_ignores_hurt_ally_for_cover() {
        let mut world = setup();
        three_threats(&mut world);
        let enemy = hurt_enemy(&mut world, 0.1, 0.0);
        let mut ally = EnemyShipBundle::new(0.3, 0.0, 10);
        ally.ship.health.current = 5;
        world.spawn(ally);

        run(&mut world);

        // No cover, so flee to 1.8x firing range from the threat.
        let craft = world.get::<Spacecraft>(enemy).unwrap();
        assert!((craft.destination.x - 0.7).abs() < 1e-5);
    }

    fn view(field: &Battlefield, entity: Entity) -> AgentView {
        AgentView {
            ship: *field.ship(entity).unwrap(),
            brain: AiBrain {
                state: AiState::Retreat,
                ..Default::default()
            },
            destination: Position::default(),
            moving: false,
            formation_target: None,
            formation_slot: None,
        }
    }

    fn blank(entity: Entity) -> AiDecision {
        AiDecision {
            entity,
            state: AiState::Retreat,
            target: None,
            steer: Steer::Hold,
            face: None,
            fire_at: None,
        }
    }

    #[test]
    fn test_retreat_without_threat_joins_best_ally() {
        let tuning = CombatTuning::default();
        let bounds = WorldBounds::default();
        let me = Entity::from_raw(1);
        let fresh = Entity::from_raw(2);
        let fleeing = Entity::from_raw(3);

        let mut field = Battlefield::default();
        field.add_ship(me, Faction::Enemy, Position::new(0.0, 0.0), &Health::new(10), Some(AiState::Retreat));
        field.add_ship(fresh, Faction::Enemy, Position::new(0.3, 0.0), &Health::new(10), Some(AiState::Search));
        field.add_ship(fleeing, Faction::Enemy, Position::new(0.0, 0.1), &Health::new(10), Some(AiState::Retreat));

        let mut decision = blank(me);
        retreat(&view(&field, me), &TacticalSnapshot::default(), &field, &tuning, &bounds, &mut decision);
        match decision.steer {
            Steer::MoveTo(dest) => {
                assert!((dest.x - 0.2).abs() < 1e-5);
                assert!(dest.y.abs() < 1e-5);
            }
            other => panic!("expected a move, got {other:?}"),
        }
    }

    #[test]
    fn test_retreat_alone_without_threat_heads_to_center() {
        let tuning = CombatTuning::default();
        let bounds = WorldBounds::default();
        let me = Entity::from_raw(1);
        let mut field = Battlefield::default();
        field.add_ship(me, Faction::Enemy, Position::new(0.5, 0.5), &Health::new(10), Some(AiState::Retreat));

        let mut decision = blank(me);
        retreat(&view(&field, me), &TacticalSnapshot::default(), &field, &tuning, &bounds, &mut decision);
        assert_eq!(decision.steer, Steer::MoveTo(bounds.center()));
    }

    #[test]
    fn test_regroup_closes_to_support_distance() {
        let mut world = setup();
        world.insert_resource(CombatTuning {
            detection_radius: Some(0.3),
            ..Default::default()
        });
        let enemy = world.spawn(EnemyShipBundle::new(0.0, 0.0, 10)).id();
        world.spawn(EnemyShipBundle::new(0.9, 0.0, 10));

        run(&mut world);

        assert_eq!(world.get::<AiBrain>(enemy).unwrap().state, AiState::Regroup);
        let craft = world.get::<Spacecraft>(enemy).unwrap();
        assert!(craft.moving);
        // 1.5x firing range short of the ally.
        assert!((craft.destination.x - 0.15).abs() < 1e-5);
        assert!(craft.destination.y.abs() < 1e-5);
    }

    #[test]
    fn test_regroup_holds_within_support_distance() {
        let mut world = setup();
        world.insert_resource(CombatTuning {
            detection_radius: Some(0.3),
            ..Default::default()
        });
        let enemy = world.spawn(EnemyShipBundle::new(0.0, 0.0, 10)).id();
        world.spawn(EnemyShipBundle::new(0.5, 0.0, 10));
        world.get_mut::<Spacecraft>(enemy).unwrap().moving = true;

        run(&mut world);

        assert_eq!(world.get::<AiBrain>(enemy).unwrap().state, AiState::Regroup);
        assert!(!world.get::<Spacecraft>(enemy).unwrap().moving);
    }
}
