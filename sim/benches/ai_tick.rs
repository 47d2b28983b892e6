//! Benchmarks for AI-heavy update passes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skirmish_sim::{CombatTuning, Faction, SimConfig, SimWorld};

const FRAME: f32 = 1.0 / 60.0;

fn battle(enemies: usize, players: usize) -> SimWorld {
    let config = SimConfig {
        spawn_initial_scenario: false,
        ..Default::default()
    };
    // AI every frame so each iteration pays for a full decision pass.
    let tuning = CombatTuning {
        ai_update_interval: FRAME,
        ..Default::default()
    };
    let mut sim = SimWorld::with_config(config, tuning).expect("bench tuning is valid");
    sim.initialize();
    sim.spawn_planet(Faction::Player, -0.5, 0.0, 0.15);
    sim.spawn_planet(Faction::Enemy, 0.5, 0.3, 0.10);
    for i in 0..players {
        let row = (i / 8) as f32;
        let col = (i % 8) as f32;
        sim.spawn_player_ship(-0.6 + col * 0.06, -0.4 + row * 0.06);
    }
    sim.spawn_enemy_wave(enemies);
    sim
}

fn bench_ai_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("ai_tick");
    for &enemies in &[10usize, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(enemies), &enemies, |b, &enemies| {
            let mut sim = battle(enemies, enemies / 2);
            b.iter(|| {
                sim.update(black_box(FRAME));
            });
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut sim = battle(50, 25);
    for _ in 0..60 {
        sim.update(FRAME);
    }
    c.bench_function("snapshot_json", |b| b.iter(|| black_box(sim.snapshot_json())));
}

criterion_group!(benches, bench_ai_tick, bench_snapshot);
criterion_main!(benches);
