// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use understory_spatial::{
    Aabb, Bvh, Grid2D, Insertable, KdTree, LooseOctree, NearestQueryable, Octree,
    RadiusQueryable, Raycastable, SpatialEntity, SpatialHash, Vec3,
};

const WORLD: f32 = 1000.0;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
    fn point(&mut self) -> Vec3 {
        Vec3::new(
            self.next_f32() * WORLD,
            self.next_f32() * WORLD,
            self.next_f32() * WORLD,
        )
    }
}

fn world() -> Aabb {
    Aabb::new(Vec3::ZERO, Vec3::splat(WORLD))
}

fn gen_uniform(count: usize) -> Vec<SpatialEntity> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|i| SpatialEntity::new(i as i32, rng.point(), 2.0))
        .collect()
}

fn gen_clustered(n_clusters: usize, per_cluster: usize, spread: f32) -> Vec<SpatialEntity> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push(rng.point());
    }
    for c in centers {
        for _ in 0..per_cluster {
            let d = Vec3::new(
                rng.next_f32() - 0.5,
                rng.next_f32() - 0.5,
                rng.next_f32() - 0.5,
            ) * spread;
            let p = (c + d).max(Vec3::ZERO).min(Vec3::splat(WORLD));
            out.push(SpatialEntity::new(out.len() as i32, p, 2.0));
        }
    }
    out
}

fn gen_queries(count: usize) -> Vec<Vec3> {
    let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
    (0..count).map(|_| rng.point()).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[1_000usize, 10_000] {
        let entities = gen_uniform(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("octree_n{}", n), |b| {
            b.iter_batched(
                || Octree::with_bounds(world()),
                |mut idx| {
                    for e in &entities {
                        idx.insert(*e);
                    }
                    black_box(idx);
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("loose_octree_n{}", n), |b| {
            b.iter_batched(
                || LooseOctree::with_bounds(world()),
                |mut idx| {
                    for e in &entities {
                        idx.insert(*e);
                    }
                    black_box(idx);
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("spatial_hash_n{}", n), |b| {
            b.iter_batched(
                || SpatialHash::new(25.0),
                |mut idx| {
                    for e in &entities {
                        idx.insert(*e);
                    }
                    black_box(idx);
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("kdtree_build_n{}", n), |b| {
            b.iter(|| black_box(KdTree::from_entities(&entities)))
        });
        group.bench_function(format!("bvh_build_n{}", n), |b| {
            b.iter(|| black_box(Bvh::from_entities(&entities)))
        });
    }
    group.finish();
}

fn bench_update_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_heavy");
    let entities = gen_uniform(10_000);
    let moved: Vec<_> = entities
        .iter()
        .enumerate()
        .map(|(j, e)| {
            let dx = (j % 5) as f32 - 2.0;
            let dy = ((j * 7) % 5) as f32 - 2.0;
            let p = (e.position + Vec3::new(dx, dy, 0.0)).max(Vec3::ZERO);
            SpatialEntity::new(e.id, p.min(Vec3::splat(WORLD)), e.radius)
        })
        .collect();
    group.throughput(Throughput::Elements(moved.len() as u64));

    group.bench_function("loose_octree_move_all", |b| {
        b.iter_batched(
            || {
                let mut idx = LooseOctree::with_bounds(world());
                for e in &entities {
                    idx.insert(*e);
                }
                idx
            },
            |mut idx| {
                for e in &moved {
                    idx.update(*e);
                }
                black_box(idx);
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("octree_move_all", |b| {
        b.iter_batched(
            || {
                let mut idx = Octree::with_bounds(world());
                for e in &entities {
                    idx.insert(*e);
                }
                idx
            },
            |mut idx| {
                // Octree removal is a linear scan; keep the sample small.
                for e in moved.iter().take(500) {
                    idx.update(*e);
                }
                black_box(idx);
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("spatial_hash_move_all", |b| {
        b.iter_batched(
            || {
                let mut idx = SpatialHash::new(25.0);
                for e in &entities {
                    idx.insert(*e);
                }
                idx
            },
            |mut idx| {
                for e in &moved {
                    idx.update(*e);
                }
                black_box(idx);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    for (label, entities) in [
        ("uniform", gen_uniform(10_000)),
        ("clustered", gen_clustered(20, 500, 60.0)),
    ] {
        let queries = gen_queries(256);
        let mut octree = Octree::with_bounds(world());
        let mut loose = LooseOctree::with_bounds(world());
        for e in &entities {
            octree.insert(*e);
            loose.insert(*e);
        }
        let kd = KdTree::from_entities(&entities);
        let bvh = Bvh::from_entities(&entities);
        let indexes: [(&str, &dyn NearestQueryable); 4] = [
            ("octree", &octree),
            ("loose_octree", &loose),
            ("kdtree", &kd),
            ("bvh", &bvh),
        ];
        group.throughput(Throughput::Elements(queries.len() as u64));
        for (name, idx) in indexes {
            group.bench_function(format!("{name}_{label}"), |b| {
                b.iter(|| {
                    let mut total = 0_i64;
                    for q in &queries {
                        total += i64::from(idx.query_nearest(*q).id);
                    }
                    black_box(total);
                })
            });
            group.bench_function(format!("{name}_{label}_k16"), |b| {
                b.iter(|| {
                    let mut total = 0_usize;
                    for q in &queries {
                        total += idx.query_k_nearest(*q, 16).len();
                    }
                    black_box(total);
                })
            });
        }
    }
    group.finish();
}

fn bench_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("radius");
    let entities = gen_uniform(10_000);
    let queries = gen_queries(256);
    let mut octree = Octree::with_bounds(world());
    let mut loose = LooseOctree::with_bounds(world());
    let mut hash = SpatialHash::new(25.0);
    for e in &entities {
        octree.insert(*e);
        loose.insert(*e);
        hash.insert(*e);
    }
    let kd = KdTree::from_entities(&entities);
    let bvh = Bvh::from_entities(&entities);
    let indexes: [(&str, &dyn RadiusQueryable); 5] = [
        ("octree", &octree),
        ("loose_octree", &loose),
        ("spatial_hash", &hash),
        ("kdtree", &kd),
        ("bvh", &bvh),
    ];
    group.throughput(Throughput::Elements(queries.len() as u64));
    for (name, idx) in indexes {
        group.bench_function(format!("{name}_r50"), |b| {
            b.iter(|| {
                let mut total = 0_usize;
                for q in &queries {
                    total += idx.query_radius(*q, 50.0).len();
                }
                black_box(total);
            })
        });
    }
    group.finish();
}

fn bench_raycast(c: &mut Criterion) {
    let mut group = c.benchmark_group("raycast");
    let entities = gen_uniform(10_000);
    let bvh = Bvh::from_entities(&entities);
    let mut rng = Rng::new(0xBADC_F00D_1234_5678);
    let rays: Vec<_> = (0..256)
        .map(|_| {
            let dir = Vec3::new(
                rng.next_f32() - 0.5,
                rng.next_f32() - 0.5,
                rng.next_f32() - 0.5,
            );
            (rng.point(), dir)
        })
        .collect();
    group.throughput(Throughput::Elements(rays.len() as u64));
    group.bench_function("bvh_first_hit", |b| {
        b.iter(|| {
            let mut hits = 0_usize;
            for (o, d) in &rays {
                if bvh.raycast(*o, *d, WORLD).is_hit() {
                    hits += 1;
                }
            }
            black_box(hits);
        })
    });
    group.finish();
}

fn bench_grid2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid2d");
    let mut rng = Rng::new(0x0BAD_CAFE_0000_0002);
    let points: Vec<_> = (0..10_000)
        .map(|_| {
            Point::new(
                f64::from(rng.next_f32()) * 1000.0,
                f64::from(rng.next_f32()) * 1000.0,
            )
        })
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("insert_then_radius", |b| {
        b.iter_batched(
            || Grid2D::new(100, 100, 10.0),
            |mut grid| {
                for (i, p) in points.iter().enumerate() {
                    grid.insert(i as i32, *p);
                }
                let hits = grid.query_radius(Point::new(500.0, 500.0), 40.0).len();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_update_heavy,
    bench_nearest,
    bench_radius,
    bench_raycast,
    bench_grid2d
);
criterion_main!(benches);
