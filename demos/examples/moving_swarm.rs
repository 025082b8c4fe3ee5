// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A swarm of moving entities tracked by a loose octree and a spatial hash.
//!
//! Each frame every entity moves a little, both indexes are updated in place, and the
//! broad-phase collision pairs are compared. Pairs are bucket-local, so the two indexes
//! can disagree on pairs that straddle a cell or node boundary.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_spatial_demos --example moving_swarm`

use understory_spatial::{
    Aabb, CollisionQueryable, Insertable, LooseOctree, RadiusQueryable, SpatialEntity,
    SpatialHash, SpatialIndex, Vec3,
};

const WORLD: f32 = 200.0;
const COUNT: i32 = 500;
const FRAMES: usize = 5;

struct Rng(u64);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 40) as f32 / (1_u64 << 24) as f32
    }

    fn signed(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }
}

fn main() {
    env_logger::init();

    let world = Aabb::new(Vec3::ZERO, Vec3::splat(WORLD));
    let mut rng = Rng(0x5EED_CAFE_F00D_0001);
    let mut entities: Vec<_> = (0..COUNT)
        .map(|id| {
            let p = Vec3::new(rng.next_f32(), rng.next_f32(), rng.next_f32()) * WORLD;
            SpatialEntity::new(id, p, 1.5)
        })
        .collect();

    let mut loose = LooseOctree::with_bounds(world);
    let mut hash = SpatialHash::new(8.0);
    for e in &entities {
        loose.insert(*e);
        hash.insert(*e);
    }

    for frame in 0..FRAMES {
        for e in &mut entities {
            let step = Vec3::new(rng.signed(), rng.signed(), rng.signed()) * 3.0;
            let p = e.position + step;
            // Keep everyone inside the world box.
            e.position = p.max(Vec3::ZERO).min(Vec3::splat(WORLD));
            loose.update(*e);
            hash.update(*e);
        }
        let loose_pairs = loose.find_collisions();
        let hash_pairs = hash.find_collisions();
        log::info!(
            "frame {frame}: {} entities, {} octree pairs, {} hash pairs ({} buckets)",
            loose.len(),
            loose_pairs.len(),
            hash_pairs.len(),
            hash.occupied_cells()
        );
    }

    let center = Vec3::splat(WORLD * 0.5);
    let mut a = loose.query_radius(center, 20.0);
    let mut b = hash.query_radius(center, 20.0);
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b, "radius queries are exact on both indexes");
    println!("{} entities within 20 of the centre", a.len());
}
