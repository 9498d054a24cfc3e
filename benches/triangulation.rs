//! Performance regression benchmarks for the triangulation pipeline.
//!
//! Uses seeded random point clouds so measurements are deterministic across
//! runs. Covers the three hot paths: bulk vertex insertion, constraint edge
//! recovery, and finishing erasure.

#![allow(missing_docs)]

use cdt2d::prelude::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

const COUNTS: &[usize] = &[100, 500, 2000];
const SEED: u64 = 0x5eed_cd72;

/// Seeded uniform points in a square, deduplicated to keep insertion
/// duplicate-free under the exact (zero-tolerance) configuration.
fn random_points(count: usize, seed: u64) -> Vec<Point2> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut seen = std::collections::HashSet::new();
    let mut points = Vec::with_capacity(count);
    while points.len() < count {
        let x: f64 = rng.gen_range(-100.0..100.0);
        let y: f64 = rng.gen_range(-100.0..100.0);
        if seen.insert((x.to_bits(), y.to_bits())) {
            points.push(Point2::new(x, y));
        }
    }
    points
}

/// Random non-loop constraint requests between existing vertices.
fn random_edges(vertex_count: usize, edge_count: usize, seed: u64) -> Vec<Edge> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::with_capacity(edge_count);
    while edges.len() < edge_count {
        let a = rng.gen_range(0..vertex_count as u32);
        let b = rng.gen_range(0..vertex_count as u32);
        if a != b {
            edges.push(Edge::new(a, b));
        }
    }
    edges
}

fn bench_vertex_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_vertices");
    for &count in COUNTS {
        let points = random_points(count, SEED);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &points, |b, points| {
            b.iter(|| {
                let mut cdt = Triangulation::default();
                cdt.insert_vertices(black_box(points)).unwrap();
                black_box(cdt.triangles_count())
            });
        });
    }
    group.finish();
}

fn bench_constraint_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_edges");
    for &count in COUNTS {
        let points = random_points(count, SEED);
        let edges = random_edges(count, count / 10, SEED ^ 1);
        group.throughput(Throughput::Elements(edges.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &(points, edges),
            |b, (points, edges)| {
                b.iter(|| {
                    let mut cdt = Triangulation::new(
                        VertexInsertionOrder::AsProvided,
                        IntersectingConstraintEdges::Resolve,
                        0.0,
                    );
                    cdt.insert_vertices(points).unwrap();
                    let report = cdt.insert_edges(black_box(edges)).unwrap();
                    black_box(report.inserted)
                });
            },
        );
    }
    group.finish();
}

fn bench_erase_super_triangle(c: &mut Criterion) {
    let mut group = c.benchmark_group("erase_super_triangle");
    for &count in COUNTS {
        let points = random_points(count, SEED);
        group.bench_with_input(BenchmarkId::from_parameter(count), &points, |b, points| {
            b.iter_batched(
                || {
                    let mut cdt = Triangulation::default();
                    cdt.insert_vertices(points).unwrap();
                    cdt
                },
                |mut cdt| {
                    cdt.erase_super_triangle().unwrap();
                    black_box(cdt.triangles_count())
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_vertex_insertion,
    bench_constraint_recovery,
    bench_erase_super_triangle
);
criterion_main!(benches);
