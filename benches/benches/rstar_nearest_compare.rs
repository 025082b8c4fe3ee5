// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_spatial::{KdTree, NearestQueryable, RadiusQueryable, SpatialEntity, Vec3};

use rstar::RTree;

struct Rng(u64);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        ((x >> 40) as f32) / ((1u64 << 24) as f32)
    }
    fn point(&mut self) -> [f32; 3] {
        [
            self.next_f32() * 1000.0,
            self.next_f32() * 1000.0,
            self.next_f32() * 1000.0,
        ]
    }
}

fn gen_points(count: usize, seed: u64) -> Vec<[f32; 3]> {
    let mut rng = Rng(seed);
    (0..count).map(|_| rng.point()).collect()
}

fn to_entities(points: &[[f32; 3]]) -> Vec<SpatialEntity> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| SpatialEntity::point(i as i32, Vec3::new(p[0], p[1], p[2])))
        .collect()
}

fn bench_nearest_external_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_external_compare");
    let queries = gen_points(256, 0xFACE_FEED_CAFE_BABE);
    for &n in &[10_000usize, 100_000] {
        let points = gen_points(n, 0xCAFE_F00D_DEAD_BEEF);
        let entities = to_entities(&points);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("understory_kdtree_build_n{}", n), |b| {
            b.iter(|| black_box(KdTree::from_entities(&entities)))
        });
        group.bench_function(format!("rstar_bulk_load_n{}", n), |b| {
            b.iter_batched(
                || points.clone(),
                |pts| black_box(RTree::bulk_load(pts)),
                BatchSize::LargeInput,
            )
        });

        let kd = KdTree::from_entities(&entities);
        let rtree = RTree::bulk_load(points.clone());
        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_function(format!("understory_kdtree_nearest_n{}", n), |b| {
            b.iter(|| {
                let mut total = 0.0_f32;
                for q in &queries {
                    total += kd.query_nearest(Vec3::new(q[0], q[1], q[2])).distance;
                }
                black_box(total);
            })
        });
        group.bench_function(format!("rstar_nearest_n{}", n), |b| {
            b.iter(|| {
                let mut total = 0.0_f32;
                for q in &queries {
                    if let Some(p) = rtree.nearest_neighbor(q) {
                        total += p[0];
                    }
                }
                black_box(total);
            })
        });
        group.bench_function(format!("understory_kdtree_radius_n{}", n), |b| {
            b.iter(|| {
                let mut total = 0_usize;
                for q in &queries {
                    total += kd.query_radius(Vec3::new(q[0], q[1], q[2]), 30.0).len();
                }
                black_box(total);
            })
        });
        group.bench_function(format!("rstar_radius_n{}", n), |b| {
            b.iter(|| {
                let mut total = 0_usize;
                for q in &queries {
                    total += rtree.locate_within_distance(*q, 30.0 * 30.0).count();
                }
                black_box(total);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_nearest_external_compare);
criterion_main!(benches);
