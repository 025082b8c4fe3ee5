// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Understory Spatial: insert, move, and query a handful of entities.

use understory_spatial::{
    Aabb, Insertable, KdTree, LooseOctree, NearestQueryable, RadiusQueryable, RangeQueryable,
    SpatialEntity, Vec3,
};

fn main() {
    let world = Aabb::new(Vec3::ZERO, Vec3::splat(64.0));
    let mut tree = LooseOctree::with_bounds(world);
    tree.insert(SpatialEntity::new(1, Vec3::new(4.0, 4.0, 4.0), 0.5));
    tree.insert(SpatialEntity::new(2, Vec3::new(10.0, 4.0, 4.0), 0.5));
    tree.insert(SpatialEntity::new(3, Vec3::new(40.0, 40.0, 40.0), 0.5));

    // Move entity 2 next to entity 3
    tree.update(SpatialEntity::new(2, Vec3::new(41.0, 40.0, 40.0), 0.5));

    let near = tree.query_radius(Vec3::splat(40.0), 2.0);
    println!("within 2 of (40,40,40): {near:?}");

    let corner = tree.query_range(&Aabb::new(Vec3::ZERO, Vec3::splat(8.0)));
    println!("in the low corner: {corner:?}");

    // A static snapshot answers the same questions through the same traits.
    let snapshot = KdTree::from_entities(&[
        SpatialEntity::point(1, Vec3::new(4.0, 4.0, 4.0)),
        SpatialEntity::point(2, Vec3::new(41.0, 40.0, 40.0)),
        SpatialEntity::point(3, Vec3::new(40.0, 40.0, 40.0)),
    ]);
    for r in snapshot.query_k_nearest(Vec3::splat(39.0), 2) {
        println!("id {} at distance {:.3}", r.id, r.distance);
    }
}
