// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cast a fan of rays through a field of spheres held in a BVH.
//!
//! Run:
//! - `cargo run -p understory_spatial_demos --example bvh_raycast`

use understory_spatial::{BatchBuildable, Bvh, Raycastable, SpatialEntity, SpatialIndex, Vec3};

fn main() {
    env_logger::init();

    // A 10×10 wall of spheres in the x = 20 plane.
    let mut spheres = Vec::new();
    for y in 0..10 {
        for z in 0..10 {
            let id = y * 10 + z;
            let p = Vec3::new(20.0, y as f32 * 3.0 - 13.5, z as f32 * 3.0 - 13.5);
            spheres.push(SpatialEntity::new(id, p, 1.0 + (id % 3) as f32 * 0.25));
        }
    }
    let mut bvh = Bvh::new();
    bvh.build(&spheres);
    println!("{} spheres in {} nodes", bvh.len(), bvh.node_count());

    let origin = Vec3::ZERO;
    for step in -4..=4 {
        let dir = Vec3::new(1.0, step as f32 * 0.1, 0.05);
        let hit = bvh.raycast(origin, dir, 50.0);
        if hit.is_hit() {
            println!(
                "dir {:>5.2}: hit id {:>3} at t = {:.3}, point ({:.2}, {:.2}, {:.2})",
                dir.y, hit.id, hit.distance, hit.position.x, hit.position.y, hit.position.z
            );
        } else {
            println!("dir {:>5.2}: miss", dir.y);
        }
    }

    // Short rays stop before the wall.
    assert!(!bvh.raycast(origin, Vec3::new(1.0, 0.0, 0.0), 10.0).is_hit());
}
