// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// The search itself is dominated by the external benchmark; these cover the
// in-process work done per round:
//   1. Move list parsing and formatting for large discovered sets
//   2. Shuffle + split of one halving trial
//   3. Chunk and complement construction for delta debugging

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

use move_trimmer::core::ddmin::split_chunks;
use move_trimmer::core::halving::split_halves;
use move_trimmer::core::store::{format_moves, parse_moves};
use move_trimmer::core::types::{CandidateSet, Move};

// ─── Helpers ────────────────────────────────────────────────────────────────

fn build_moves(n: u32) -> Vec<Move> {
    (1..=n).map(|i| Move::new(i * 3, (i % 80) + 1)).collect()
}

// ─── Move list ──────────────────────────────────────────────────────────────

fn bench_move_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_list");
    let moves = build_moves(10_000);
    let text = format_moves(&moves);

    group.bench_function("parse_10k", |b| {
        b.iter(|| parse_moves(black_box(&text), Path::new("moves.tmp")))
    });

    group.bench_function("format_10k", |b| b.iter(|| format_moves(black_box(&moves))));

    group.bench_function("canonicalize_10k", |b| {
        b.iter(|| CandidateSet::new(black_box(moves.iter().rev().copied())))
    });

    group.finish();
}

// ─── Halving ────────────────────────────────────────────────────────────────

fn bench_halving_trial(c: &mut Criterion) {
    let mut group = c.benchmark_group("halving");
    let mut order = build_moves(5_000);
    let mut rng = StdRng::seed_from_u64(42);

    group.bench_function("shuffle_split_5k", |b| {
        b.iter(|| {
            order.shuffle(&mut rng);
            let (left, right) = split_halves(black_box(&order));
            (left.len(), right.len())
        })
    });

    group.finish();
}

// ─── Delta debugging ────────────────────────────────────────────────────────

fn bench_chunks(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddmin");
    let moves = build_moves(5_000);

    group.bench_function("split_chunks_g16", |b| {
        b.iter(|| split_chunks(black_box(&moves), 16).len())
    });

    group.bench_function("split_chunks_g1024", |b| {
        b.iter(|| split_chunks(black_box(&moves), 1024).len())
    });

    group.finish();
}

criterion_group!(benches, bench_move_list, bench_halving_trial, bench_chunks);
criterion_main!(benches);
