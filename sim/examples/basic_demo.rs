//! Basic demonstration of the skirmish simulation.
//!
//! Run with: cargo run --example basic_demo
//! Set RUST_LOG=debug to see AI transitions and kills.

use skirmish_sim::{AudioSink, BuildableUnit, Faction, Planet, SimWorld};
use tracing_subscriber::EnvFilter;

/// Counts cues instead of playing them.
#[derive(Default)]
struct CueCounter {
    pews: usize,
    booms: usize,
}

impl AudioSink for CueCounter {
    fn play_pew(&mut self) {
        self.pews += 1;
    }

    fn play_boom(&mut self) {
        self.booms += 1;
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Skirmish - Simulation Demo ===\n");

    let mut sim = SimWorld::new();
    sim.initialize();

    // Queue two ships on the player's home planet
    let home = {
        let world = sim.world_mut();
        let mut query = world.query::<(bevy_ecs::entity::Entity, &Faction, &Planet)>();
        query
            .iter(world)
            .find(|(_, faction, _)| **faction == Faction::Player)
            .map(|(entity, _, _)| entity)
    };
    if let Some(home) = home {
        for _ in 0..2 {
            if let Err(err) = sim.queue_build(home, BuildableUnit::Spacecraft) {
                println!("build refused: {err}");
            }
        }
    }

    println!("Initial state:");
    print_snapshot(&mut sim);

    let mut audio = CueCounter::default();

    // 60 frames per second for 20 seconds, with a wave every 5 seconds
    println!("\nRunning simulation for 1200 frames...\n");
    for frame in 0..1200 {
        if frame % 300 == 0 {
            sim.spawn_enemy_wave(3);
        }
        sim.update(1.0 / 60.0);
        sim.flush_cues(&mut audio);

        if (frame + 1) % 240 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", sim.current_tick(), sim.current_time());
            print_snapshot(&mut sim);
        }
        if sim.is_game_over() {
            println!("\nGame over at t={:.1}s", sim.current_time());
            break;
        }
    }

    let stats = sim.stats();
    println!(
        "\nScore {} | kills {} | ships lost {} | planets lost {} | pew {} boom {}",
        stats.score, stats.enemies_killed, stats.player_ships_lost, stats.planets_lost, audio.pews, audio.booms
    );

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => println!("snapshot failed: {err}"),
    }

    sim.shutdown();
}

fn print_snapshot(sim: &mut SimWorld) {
    let snapshot = sim.snapshot();

    println!("  Planets:");
    for planet in &snapshot.planets {
        println!(
            "    {} planet {}: pos=({:.2}, {:.2}) hp={}/{} queue={}",
            planet.faction, planet.id, planet.x, planet.y, planet.health, planet.health_max, planet.build_queue
        );
    }

    println!("  Ships:");
    for ship in snapshot.ships.iter().filter(|s| s.alive) {
        println!(
            "    {} ship {}: pos=({:.2}, {:.2}) hp={}/{} [{}]",
            ship.faction,
            ship.id,
            ship.x,
            ship.y,
            ship.health,
            ship.health_max,
            ship.ai_state.as_deref().unwrap_or("orders")
        );
    }

    for formation in &snapshot.formations {
        println!(
            "  Formation {} ({}): {} members",
            formation.id,
            formation.kind,
            formation.members.len()
        );
    }
}
