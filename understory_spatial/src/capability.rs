// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability traits shared by the 3D indexes.
//!
//! Each index implements only the capabilities that make geometric sense for it, so
//! generic code can ask for exactly what it needs:
//!
//! ```rust
//! use understory_spatial::{Octree, KdTree, NearestQueryable, Insertable, BatchBuildable};
//! use understory_spatial::{Aabb, SpatialEntity, Vec3};
//!
//! fn closest_id<I: NearestQueryable>(index: &I, p: Vec3) -> i32 {
//!     index.query_nearest(p).id
//! }
//!
//! let entities = [
//!     SpatialEntity::point(1, Vec3::new(1.0, 1.0, 1.0)),
//!     SpatialEntity::point(2, Vec3::new(8.0, 8.0, 8.0)),
//! ];
//!
//! let mut octree = Octree::with_bounds(Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
//! for e in entities {
//!     octree.insert(e);
//! }
//! let kd = KdTree::from_entities(&entities);
//!
//! let p = Vec3::new(7.0, 7.0, 7.0);
//! assert_eq!(closest_id(&octree, p), closest_id(&kd, p));
//! ```

use alloc::vec::Vec;

use crate::types::{Aabb, CollisionPair, EntityId, QueryResult, SpatialEntity, Vec3};

/// State common to every index.
pub trait SpatialIndex {
    /// Number of entities currently stored.
    fn len(&self) -> usize;

    /// Whether no entities are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entity, keeping construction parameters.
    fn clear(&mut self);
}

/// Incremental mutation.
pub trait Insertable: SpatialIndex {
    /// Insert an entity. Returns `false` if the index ignored it (e.g. out of bounds).
    fn insert(&mut self, entity: SpatialEntity) -> bool;

    /// Remove the entity with `id`. Returns `false` if no such entity was stored.
    fn remove(&mut self, id: EntityId) -> bool;

    /// Move an entity: remove by id, then insert. Returns the result of the insert.
    fn update(&mut self, entity: SpatialEntity) -> bool {
        self.remove(entity.id);
        self.insert(entity)
    }
}

/// Construction from a snapshot. Building discards any previous contents.
pub trait BatchBuildable: SpatialIndex {
    /// Rebuild the index from `entities`.
    fn build(&mut self, entities: &[SpatialEntity]);
}

/// Axis-aligned box queries.
pub trait RangeQueryable {
    /// Ids of entities whose position lies inside `range` (faces inclusive).
    fn query_range(&self, range: &Aabb) -> Vec<EntityId>;
}

/// Sphere queries.
pub trait RadiusQueryable {
    /// Ids of entities whose position lies within `radius` of `center`.
    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId>;
}

/// Nearest-neighbour queries.
pub trait NearestQueryable {
    /// The entity closest to `point`, or [`QueryResult::NONE`] when empty.
    fn query_nearest(&self, point: Vec3) -> QueryResult;

    /// The `k` entities closest to `point`, ascending by distance.
    ///
    /// The result has `min(k, len)` elements.
    fn query_k_nearest(&self, point: Vec3, k: usize) -> Vec<QueryResult>;
}

/// Ray queries against entities' bounding spheres.
pub trait Raycastable {
    /// First bounding sphere hit along the ray within `max_dist`, or [`QueryResult::NONE`].
    ///
    /// `direction` need not be normalized; distances are reported in world units.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_dist: f32) -> QueryResult;
}

/// Broad-phase overlap detection.
pub trait CollisionQueryable {
    /// Pairs of entities whose bounding spheres overlap.
    fn find_collisions(&self) -> Vec<CollisionPair>;
}
