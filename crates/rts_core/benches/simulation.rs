//! Simulation benchmarks for rts_core.
//!
//! Run with: `cargo bench -p rts_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rts_core::game::{Authority, Game};
use rts_core::grid::GridRect;
use rts_core::movement::plan_path;
use rts_core::protocol::Action;
use rts_core::store::StateStore;
use rts_core::visibility::VisibilityEngine;
use rts_test_utils::fixtures::{fixed_f, test_config, test_player, test_unit};

/// Path planning across a large diagonal.
pub fn path_benchmark(c: &mut Criterion) {
    let start = rts_core::math::Vec2Fixed::new(fixed_f(0.4), fixed_f(-0.6));
    let target = rts_core::math::Vec2Fixed::from_ints(900, 300);
    c.bench_function("plan_path_900", |b| {
        b.iter(|| plan_path(black_box(start), black_box(target), 4096))
    });
}

/// One authoritative tick with a hundred travelling units.
pub fn tick_benchmark(c: &mut Criterion) {
    let mut game = Game::new(test_config(), Authority::Server);
    let owner = test_player("bench").id;
    for i in 0..100 {
        let unit = test_unit(owner, 0, i * 2);
        let id = unit.id;
        game.handle_action(&Action::AddUnit(unit));
        game.handle_action(&Action::move_start(
            id,
            rts_core::math::Vec2Fixed::from_ints(1000, i * 2),
        ));
    }

    c.bench_function("server_tick_100_units", |b| {
        b.iter(|| black_box(game.tick()))
    });
}

/// Fog recompute over a 64x64 viewport with ten observers.
pub fn visibility_benchmark(c: &mut Criterion) {
    let mut store = StateStore::new();
    let owner = test_player("bench").id;
    for i in 0..10 {
        store.store_unit(test_unit(owner, i * 6, i * 6));
    }
    let mut engine = VisibilityEngine::new();
    let view = GridRect::new(0, 0, 64, 64);

    c.bench_function("visibility_recompute_64x64", |b| {
        b.iter(|| black_box(engine.recompute(&mut store, owner, view)))
    });
}

criterion_group!(
    benches,
    path_benchmark,
    tick_benchmark,
    visibility_benchmark
);
criterion_main!(benches);
