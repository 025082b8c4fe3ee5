// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index implementations.
//!
//! - `octree`: adaptive octree with per-leaf capacity and a depth limit.
//! - `loose_octree`: octree with enlarged node bounds and an id → node cache, for moving entities.
//! - `hash`: unbounded uniform bucket grid keyed by integer cell coordinates.
//! - `grid2d`: fixed-size 2D bucket array over caller-held positions.
//! - `kdtree`: batch-built, axis-cycling median tree for nearest-neighbour queries.
//! - `bvh`: batch-built binary hierarchy over bounding spheres, with ray queries.
//!
//! Tree backends store their nodes in a flat arena addressed by index. Children are owned
//! through the arena and there are no parent links.

pub mod bvh;
pub mod grid2d;
pub mod hash;
pub mod kdtree;
pub mod loose_octree;
pub mod octant;
pub mod octree;

/// Index of a node in a backend's arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    pub(crate) const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}
