// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Spatial: interchangeable spatial indexes over point-like entities.
//!
//! Every index stores [`SpatialEntity`] values (an id, a 3D position, and an advisory
//! bounding radius) and answers "what is near this point, region, or ray". The indexes
//! share one query vocabulary expressed as capability traits, so callers can swap the
//! strategy without touching query code:
//!
//! - [`Octree`]: adaptive octree that splits full leaves; good general-purpose choice for
//!   bounded worlds with uneven density.
//! - [`LooseOctree`]: octree with enlarged node bounds and an id → node cache; cheap
//!   removal and update for entities that move every frame.
//! - [`SpatialHash`]: unbounded uniform bucket grid; constant-time updates when entities
//!   are roughly the size of a cell.
//! - [`KdTree`]: batch-built median tree; fast nearest-neighbour queries on static sets.
//! - [`Bvh`]: batch-built hierarchy over bounding spheres; the only index with ray queries.
//! - [`Grid2D`]: fixed 2D bucket array over caller-held positions, using Kurbo geometry.
//!
//! # Example
//!
//! ```rust
//! use understory_spatial::{
//!     Bvh, Insertable, NearestQueryable, RadiusQueryable, Raycastable, SpatialEntity,
//!     SpatialHash, Vec3,
//! };
//!
//! let mut hash = SpatialHash::new(4.0);
//! hash.insert(SpatialEntity::point(1, Vec3::new(1.0, 1.0, 1.0)));
//! hash.insert(SpatialEntity::point(2, Vec3::new(9.0, 0.0, 0.0)));
//! assert_eq!(hash.query_radius(Vec3::ZERO, 2.0), [1]);
//!
//! // Batch-built indexes take a snapshot.
//! let bvh = Bvh::from_entities(&[
//!     SpatialEntity::new(7, Vec3::ZERO, 1.0),
//!     SpatialEntity::new(8, Vec3::new(6.0, 0.0, 0.0), 1.0),
//! ]);
//! let hit = bvh.raycast(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 100.0);
//! assert_eq!(hit.id, 7);
//! assert!((hit.distance - 4.0).abs() < 1e-5);
//!
//! // Misses are reported with a sentinel rather than an error.
//! let miss = bvh.raycast(Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 100.0);
//! assert!(!miss.is_hit());
//! assert_eq!(bvh.query_nearest(Vec3::new(5.0, 0.0, 0.0)).id, 8);
//! ```
//!
//! ## Placement and the bounding radius
//!
//! Entities are placed by position alone. The radius is only consulted by sphere tests
//! at query time: ray hits on the [`Bvh`] and collision pairs on [`SpatialHash`] and
//! [`LooseOctree`]. Collision pairs are bucket-local: two overlapping entities stored in
//! different cells or nodes are not reported.
//!
//! ## Failure handling
//!
//! Nothing here returns an error. Out-of-bounds inserts are ignored (`insert` returns
//! `false`), removing an unknown id is a no-op, and empty queries return an empty `Vec`
//! or [`QueryResult::NONE`]. Constructors never panic: a non-positive cell size makes a
//! hash or grid store nothing, and a looseness below 1 is raised to 1.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in positions or radii. Orderings use `total_cmp`, so a NaN
//! never panics, but it may be placed or reported arbitrarily.
//!
//! ## Features
//!
//! - `std` (default): use the standard library's float functions.
//! - `libm`: use `libm` instead, for `no_std` targets. One of the two is required.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod backends;
pub mod capability;
mod collision;
mod knn;
mod math;
pub mod types;

pub use backends::bvh::Bvh;
pub use backends::grid2d::Grid2D;
pub use backends::hash::{CellCoord, SpatialHash};
pub use backends::kdtree::KdTree;
pub use backends::loose_octree::LooseOctree;
pub use backends::octant::Octant;
pub use backends::octree::Octree;
pub use capability::{
    BatchBuildable, CollisionQueryable, Insertable, NearestQueryable, RadiusQueryable,
    RangeQueryable, Raycastable, SpatialIndex,
};
pub use types::{Aabb, CollisionPair, EntityId, QueryResult, SpatialEntity, Vec3};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use approx::assert_abs_diff_eq;

    const WORLD: f32 = 100.0;

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
            v as f32 / (1_u64 << 24) as f32
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

    fn random_entities(seed: u64, n: i32) -> Vec<SpatialEntity> {
        let mut rng = Rng::new(seed);
        (0..n)
            .map(|id| SpatialEntity::new(id, rng.point(), rng.next_f32() * 2.0))
            .collect()
    }

    fn brute_nearest(entities: &[SpatialEntity], p: Vec3) -> f32 {
        entities
            .iter()
            .map(|e| e.position.distance(p))
            .fold(f32::INFINITY, f32::min)
    }

    fn brute_radius(entities: &[SpatialEntity], c: Vec3, r: f32) -> Vec<EntityId> {
        let mut v: Vec<_> = entities
            .iter()
            .filter(|e| e.position.distance_squared(c) <= r * r)
            .map(|e| e.id)
            .collect();
        v.sort_unstable();
        v
    }

    fn brute_k_nearest(entities: &[SpatialEntity], p: Vec3, k: usize) -> Vec<f32> {
        let mut d: Vec<_> = entities.iter().map(|e| e.position.distance(p)).collect();
        d.sort_by(f32::total_cmp);
        d.truncate(k);
        d
    }

    fn sorted(mut v: Vec<EntityId>) -> Vec<EntityId> {
        v.sort_unstable();
        v
    }

    /// One instance of every 3D index, filled with `entities`.
    struct All {
        octree: Octree,
        loose: LooseOctree,
        hash: SpatialHash,
        kd: KdTree,
        bvh: Bvh,
    }

    impl All {
        fn new(entities: &[SpatialEntity]) -> Self {
            let mut octree = Octree::new(world(), 6, 4);
            let mut loose = LooseOctree::with_bounds(world());
            let mut hash = SpatialHash::new(7.5);
            for e in entities {
                assert!(octree.insert(*e), "in-bounds insert must succeed");
                assert!(loose.insert(*e), "in-bounds insert must succeed");
                assert!(hash.insert(*e), "hash accepts any position");
            }
            Self {
                octree,
                loose,
                hash,
                kd: KdTree::from_entities(entities),
                bvh: Bvh::from_entities(entities),
            }
        }

        fn nearest(&self) -> [(&'static str, &dyn NearestQueryable); 4] {
            [
                ("octree", &self.octree),
                ("loose", &self.loose),
                ("kd", &self.kd),
                ("bvh", &self.bvh),
            ]
        }

        fn radius(&self) -> [(&'static str, &dyn RadiusQueryable); 5] {
            [
                ("octree", &self.octree),
                ("loose", &self.loose),
                ("hash", &self.hash),
                ("kd", &self.kd),
                ("bvh", &self.bvh),
            ]
        }

        fn range(&self) -> [(&'static str, &dyn RangeQueryable); 5] {
            [
                ("octree", &self.octree),
                ("loose", &self.loose),
                ("hash", &self.hash),
                ("kd", &self.kd),
                ("bvh", &self.bvh),
            ]
        }
    }

    #[test]
    fn nearest_matches_brute_force() {
        let entities = random_entities(0xCAFE_F00D_DEAD_BEEF, 300);
        let all = All::new(&entities);
        let mut rng = Rng::new(0x1234_5678_9ABC_DEF0);
        for _ in 0..100 {
            let p = rng.point();
            let expected = brute_nearest(&entities, p);
            for (name, index) in all.nearest() {
                let got = index.query_nearest(p);
                assert!(got.is_hit(), "{name}: nearest on a non-empty index");
                assert_abs_diff_eq!(got.distance, expected, epsilon = 1e-4);
                let e = entities
                    .iter()
                    .find(|e| e.id == got.id)
                    .expect("reported id was inserted");
                assert_eq!(e.position, got.position, "{name}: position of reported id");
            }
        }
    }

    #[test]
    fn k_nearest_sorted_and_matches_brute_force() {
        let entities = random_entities(0xBADC_F00D_1234_5678, 200);
        let all = All::new(&entities);
        let mut rng = Rng::new(42);
        for k in [1, 5, 17, 250] {
            let p = rng.point();
            let expected = brute_k_nearest(&entities, p, k);
            for (name, index) in all.nearest() {
                let got = index.query_k_nearest(p, k);
                assert_eq!(got.len(), k.min(entities.len()), "{name}: k-nearest length");
                assert!(
                    got.windows(2).all(|w| w[0].distance <= w[1].distance),
                    "{name}: k-nearest must be ascending"
                );
                for (g, e) in got.iter().zip(&expected) {
                    assert_abs_diff_eq!(g.distance, *e, epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn radius_has_no_false_negatives() {
        let entities = random_entities(0xC1A5_7E55_9999_ABCD, 300);
        let all = All::new(&entities);
        let mut rng = Rng::new(7);
        for _ in 0..50 {
            let c = rng.point();
            let r = rng.next_f32() * 25.0;
            let expected = brute_radius(&entities, c, r);
            for (name, index) in all.radius() {
                assert_eq!(sorted(index.query_radius(c, r)), expected, "{name}: radius");
            }
        }
    }

    #[test]
    fn range_matches_brute_force() {
        let entities = random_entities(0xFACE_FEED_CAFE_BABE, 300);
        let all = All::new(&entities);
        let mut rng = Rng::new(99);
        for _ in 0..50 {
            let a = rng.point();
            let b = rng.point();
            let range = Aabb::new(a.min(b), a.max(b));
            let mut expected: Vec<_> = entities
                .iter()
                .filter(|e| range.contains_point(e.position))
                .map(|e| e.id)
                .collect();
            expected.sort_unstable();
            for (name, index) in all.range() {
                assert_eq!(sorted(index.query_range(&range)), expected, "{name}: range");
            }
        }
    }

    fn check_remove<I>(name: &str, mut index: I, entities: &[SpatialEntity])
    where
        I: Insertable + NearestQueryable + RadiusQueryable,
    {
        let before = index.len();
        let extra = SpatialEntity::point(10_000, Vec3::splat(50.0));
        assert!(index.insert(extra), "{name}: insert");
        assert!(index.remove(extra.id), "{name}: remove");
        assert_eq!(index.len(), before, "{name}: insert then remove keeps len");

        for e in entities.iter().step_by(3) {
            assert!(index.remove(e.id), "{name}: remove stored id");
            assert!(!index.query_radius(e.position, 0.5).contains(&e.id));
            assert_ne!(index.query_nearest(e.position).id, e.id, "{name}: stale nearest");
        }
        assert!(!index.remove(entities[0].id), "{name}: double remove");
    }

    #[test]
    fn removed_entities_are_never_reported() {
        let entities = random_entities(0xDEAD_BEEF_0000_0001, 120);
        let mut octree = Octree::new(world(), 6, 4);
        let mut loose = LooseOctree::with_bounds(world());
        for e in &entities {
            octree.insert(*e);
            loose.insert(*e);
        }
        check_remove("octree", octree, &entities);
        check_remove("loose", loose, &entities);

        let mut hash = SpatialHash::new(7.5);
        for e in &entities {
            hash.insert(*e);
        }
        let before = hash.len();
        hash.insert(SpatialEntity::point(10_000, Vec3::splat(50.0)));
        hash.remove(10_000);
        assert_eq!(hash.len(), before);
        for e in entities.iter().step_by(3) {
            assert!(hash.remove(e.id));
            assert!(!hash.query_radius(e.position, 0.5).contains(&e.id));
            assert!(!hash.query_range(&world()).contains(&e.id));
        }
    }

    #[test]
    fn moving_entities_stay_queryable() {
        let mut entities = random_entities(0x0BAD_CAFE_0000_0002, 80);
        let mut loose = LooseOctree::with_bounds(world());
        let mut hash = SpatialHash::new(5.0);
        for e in &entities {
            loose.insert(*e);
            hash.insert(*e);
        }
        let mut rng = Rng::new(5);
        for _ in 0..10 {
            for e in &mut entities {
                e.position = rng.point();
                assert!(loose.update(*e), "update within bounds");
                assert!(hash.update(*e), "hash update");
            }
        }
        assert_eq!(loose.len(), entities.len());
        assert_eq!(hash.len(), entities.len());
        for e in &entities {
            assert!(loose.query_radius(e.position, 0.01).contains(&e.id));
            assert!(hash.query_radius(e.position, 0.01).contains(&e.id));
        }
    }

    #[test]
    fn collisions_are_true_overlaps() {
        let entities = random_entities(0x5EED_5EED_5EED_5EED, 400);
        let all = All::new(&entities);
        let find = |id: EntityId| entities.iter().find(|e| e.id == id).copied();
        for pairs in [all.hash.find_collisions(), all.loose.find_collisions()] {
            for (a, b) in pairs {
                let (Some(a), Some(b)) = (find(a), find(b)) else {
                    panic!("collision names an unknown id");
                };
                assert!(a.overlaps(&b));
            }
        }
    }

    #[test]
    fn kdtree_scenario() {
        let kd = KdTree::from_entities(&[
            SpatialEntity::point(1, Vec3::new(0.0, 0.0, 0.0)),
            SpatialEntity::point(2, Vec3::new(10.0, 0.0, 0.0)),
            SpatialEntity::point(3, Vec3::new(0.0, 10.0, 0.0)),
        ]);
        let best = kd.query_nearest(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(best.id, 1);
        assert_abs_diff_eq!(best.distance, 1.0);
    }

    #[test]
    fn every_index_starts_empty() {
        let all = All::new(&[]);
        for (name, index) in all.nearest() {
            assert!(!index.query_nearest(Vec3::ZERO).is_hit(), "{name}");
            assert!(index.query_k_nearest(Vec3::ZERO, 3).is_empty(), "{name}");
        }
        for (name, index) in all.radius() {
            assert!(index.query_radius(Vec3::ZERO, WORLD).is_empty(), "{name}");
        }
        assert!(all.octree.is_empty() && all.loose.is_empty() && all.hash.is_empty());
        assert!(all.kd.is_empty() && all.bvh.is_empty());
    }
}
