//! Frame benchmarks for both mini-games
//!
//! Run with: cargo bench --bench frame

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use minigame_engine::bubbles::{BubbleInput, BubbleSession};
use minigame_engine::difficulty::Difficulty;
use minigame_engine::divide::state::{Boundary, DivideWorld};
use minigame_engine::divide::systems::{collision, pellets, physics};
use minigame_engine::divide::{DivideInput, DivideSession};
use minigame_engine::frame::Simulation;
use minigame_engine::render::FrameRecorder;
use minigame_engine::util::vec2::Vec2;

/// World with a player, `bots` bot cells and a full pellet field
fn create_world(bots: usize, pellet_count: usize) -> DivideWorld {
    let mut world = DivideWorld::new(Boundary::square(3000.0), pellet_count, Some(42));
    world.spawn_player("You".to_string());
    for i in 0..bots {
        world.spawn_bot(format!("Bot{}", i));
    }
    pellets::replenish(&mut world);
    world
}

/// Benchmark pellet consumption at various pellet counts
fn bench_pellets(c: &mut Criterion) {
    let mut group = c.benchmark_group("pellets");
    group.sample_size(50);

    for count in [300, 1000, 3000] {
        let mut world = create_world(12, count);
        let mut events = Vec::new();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("consumption", count), &count, |b, _| {
            b.iter(|| {
                events.clear();
                black_box(pellets::resolve_consumption(&mut world, &mut events));
                pellets::replenish(&mut world);
            })
        });
    }
    group.finish();
}

/// Benchmark merge + predation passes at various cell counts
fn bench_collision(c: &mut Criterion) {
    let mut group = c.benchmark_group("collision");
    group.sample_size(50);

    for count in [10, 50, 100, 200] {
        let template = create_world(count, 0).cells;
        let mut events = Vec::new();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("merge_and_eat", count), &count, |b, _| {
            b.iter(|| {
                let mut world = DivideWorld::new(Boundary::square(3000.0), 0, Some(1));
                world.cells = template.clone();
                events.clear();
                physics::update(&mut world);
                black_box(collision::resolve_merges(&mut world, &mut events));
                black_box(collision::resolve_predation(&mut world, &mut events));
                black_box(physics::kinetic_energy(&world))
            })
        });
    }
    group.finish();
}

/// Benchmark a whole divide-io frame (ai, physics, collisions, pellets, draw)
fn bench_divide_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("divide_frame");
    group.sample_size(30);

    for bots in [8, 24, 64] {
        let mut session = DivideSession::with_world(create_world(bots, 300), Difficulty::Hard);
        let mut surface = FrameRecorder::new(Vec2::new(800.0, 600.0));
        let input = DivideInput {
            joystick: Vec2::new(1.0, 0.0),
            split: false,
        };

        group.throughput(Throughput::Elements(bots as u64));
        group.bench_with_input(BenchmarkId::new("complete", bots), &bots, |b, _| {
            b.iter(|| black_box(session.frame(&input, &mut surface)))
        });
    }
    group.finish();
}

/// Benchmark magic-bubbles frames with a shot in flight
fn bench_bubbles_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("bubbles_frame");
    group.sample_size(50);

    for difficulty in [Difficulty::Easy, Difficulty::Hard] {
        let mut surface = FrameRecorder::new(Vec2::new(400.0, 640.0));
        let input = BubbleInput {
            aim: 0.3,
            launch: true,
        };

        group.bench_with_input(
            BenchmarkId::new("shot", difficulty.as_str()),
            &difficulty,
            |b, &difficulty| {
                b.iter_batched(
                    || BubbleSession::new(difficulty, Some(7), 60),
                    |mut session| {
                        for _ in 0..40 {
                            black_box(session.frame(&input, &mut surface));
                        }
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_pellets,
    bench_collision,
    bench_divide_frame,
    bench_bubbles_frame
);
criterion_main!(benches);
