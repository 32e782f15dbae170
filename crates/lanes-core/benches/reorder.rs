//! Reorder engine benchmarks.
//!
//! Measures planning and committing a single move on boards of increasing
//! size. Columns are equally sized across the default statuses.
//!
//! Run with:
//! ```sh
//! cargo bench --bench reorder
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lanes_core::reorder::{compact_all, plan_move};
use lanes_core::{ItemStore, MoveInstruction, ReorderEngine, StatusSet, WorkItem};

const SIZES: [usize; 4] = [10, 100, 1_000, 10_000];

fn board(per_column: usize) -> Vec<WorkItem> {
    let statuses = StatusSet::default();
    let mut items = Vec::with_capacity(per_column * statuses.len());
    for status in statuses.iter() {
        for position in 0..per_column {
            items.push(WorkItem::new(
                format!("{status}-{position}"),
                format!("Item {position}"),
                status.clone(),
                position,
            ));
        }
    }
    items
}

fn bench_plan(c: &mut Criterion) {
    let statuses = StatusSet::default();
    let mut group = c.benchmark_group("reorder.plan_move");

    for size in SIZES {
        let items = board(size);
        group.throughput(Throughput::Elements(items.len() as u64));

        let across = MoveInstruction::new("TODO-0", "DONE", size / 2);
        group.bench_with_input(BenchmarkId::new("cross_column", size), &items, |b, items| {
            b.iter(|| black_box(plan_move(items, &statuses, &across)));
        });

        let within = MoveInstruction::new(format!("DOING-{}", size - 1), "DOING", 0);
        group.bench_with_input(BenchmarkId::new("same_column", size), &items, |b, items| {
            b.iter(|| black_box(plan_move(items, &statuses, &within)));
        });
    }

    group.finish();
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder.commit");
    let engine = ReorderEngine::default();

    for size in SIZES {
        let Ok(store) = ItemStore::with_items(board(size)) else {
            continue;
        };
        // Bouncing one item back and forth keeps the store the same size.
        let there = MoveInstruction::new("REVIEW-0", "DONE", 0);
        let back = MoveInstruction::new("REVIEW-0", "REVIEW", 0);
        group.bench_function(BenchmarkId::new("move_item", size), |b| {
            b.iter(|| {
                black_box(engine.move_item(&store, &there).ok());
                black_box(engine.move_item(&store, &back).ok());
            });
        });
    }

    group.finish();
}

fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder.compact_all");
    for size in SIZES {
        let items = board(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| black_box(compact_all(items)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan, bench_commit, bench_compact);
criterion_main!(benches);
