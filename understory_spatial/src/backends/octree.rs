// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive octree over a fixed root box.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use super::NodeIdx;
use super::octant::Octant;
use crate::capability::{
    Insertable, NearestQueryable, RadiusQueryable, RangeQueryable, SpatialIndex,
};
use crate::knn::KNearest;
use crate::types::{Aabb, EntityId, QueryResult, SpatialEntity, Vec3};

const ROOT: NodeIdx = NodeIdx::new(0);

struct Node {
    bounds: Aabb,
    entities: Vec<SpatialEntity>,
    /// First of eight consecutive children, in [`Octant`] slot order.
    children: Option<NodeIdx>,
}

impl Node {
    fn leaf(bounds: Aabb) -> Self {
        Self {
            bounds,
            entities: Vec::new(),
            children: None,
        }
    }

    fn child_indices(&self) -> impl Iterator<Item = NodeIdx> + use<> {
        let first = self.children.map(NodeIdx::get);
        first
            .into_iter()
            .flat_map(|f| (0..8).map(move |o| NodeIdx::new(f + o)))
    }
}

/// Octree that splits a leaf into eight octants once it holds more than `max_entities`.
///
/// Entities are placed by position only. Entities outside the root bounds are ignored.
/// Nodes are never merged back; [`SpatialIndex::clear`] resets to a single root leaf.
pub struct Octree {
    bounds: Aabb,
    max_depth: usize,
    max_entities: usize,
    arena: Vec<Node>,
    len: usize,
}

impl Octree {
    /// Default depth limit.
    pub const DEFAULT_MAX_DEPTH: usize = 8;

    /// Default leaf capacity before subdivision.
    pub const DEFAULT_MAX_ENTITIES: usize = 8;

    /// Create an empty octree over `bounds`.
    ///
    /// A leaf at depth `< max_depth` holding more than `max_entities` is subdivided.
    pub fn new(bounds: Aabb, max_depth: usize, max_entities: usize) -> Self {
        debug_assert!(bounds.is_valid(), "octree bounds must have min <= max");
        Self {
            bounds,
            max_depth,
            max_entities,
            arena: vec![Node::leaf(bounds)],
            len: 0,
        }
    }

    /// Create an empty octree with the default depth limit and leaf capacity.
    pub fn with_bounds(bounds: Aabb) -> Self {
        Self::new(bounds, Self::DEFAULT_MAX_DEPTH, Self::DEFAULT_MAX_ENTITIES)
    }

    /// Root bounds.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Number of nodes, including internal ones.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Descend from `node` (at `depth`) to the leaf owning the entity and store it there.
    fn insert_at(&mut self, mut node: NodeIdx, entity: SpatialEntity, mut depth: usize) {
        while let Some(first) = self.arena[node.get()].children {
            let octant = Octant::of(&self.arena[node.get()].bounds, entity.position);
            node = NodeIdx::new(first.get() + octant.index());
            depth += 1;
        }
        let leaf = &mut self.arena[node.get()];
        leaf.entities.push(entity);
        if leaf.entities.len() > self.max_entities && depth < self.max_depth {
            self.subdivide(node, depth);
        }
    }

    fn subdivide(&mut self, node: NodeIdx, depth: usize) {
        let bounds = self.arena[node.get()].bounds;
        let first = NodeIdx::new(self.arena.len());
        self.arena
            .extend(Octant::iter_all().map(|o| Node::leaf(o.bounds_in(&bounds))));
        let held = core::mem::take(&mut self.arena[node.get()].entities);
        self.arena[node.get()].children = Some(first);
        log::trace!(
            "octree: subdivided node {} at depth {depth}, reclassifying {} entities",
            node.get(),
            held.len()
        );
        // Every held point is inside `bounds`, so the tie rule always finds it a child.
        for e in held {
            self.insert_at(node, e, depth);
        }
    }

    fn nearest_in(&self, node: NodeIdx, point: Vec3, best: &mut QueryResult) {
        let n = &self.arena[node.get()];
        for e in &n.entities {
            let d = e.position.distance(point);
            if d < best.distance {
                *best = QueryResult::new(e.id, d, e.position);
            }
        }
        for child in n.child_indices() {
            if self.arena[child.get()]
                .bounds
                .intersects_sphere(point, best.distance)
            {
                self.nearest_in(child, point, best);
            }
        }
    }

    fn k_nearest_in(&self, node: NodeIdx, knn: &mut KNearest) {
        let n = &self.arena[node.get()];
        for e in &n.entities {
            knn.offer(e);
        }
        for child in n.child_indices() {
            if self.arena[child.get()]
                .bounds
                .intersects_sphere(knn.point(), knn.bound())
            {
                self.k_nearest_in(child, knn);
            }
        }
    }
}

impl SpatialIndex for Octree {
    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.arena.push(Node::leaf(self.bounds));
        self.len = 0;
    }
}

impl Insertable for Octree {
    fn insert(&mut self, entity: SpatialEntity) -> bool {
        if !self.bounds.contains_point(entity.position) {
            return false;
        }
        self.insert_at(ROOT, entity, 0);
        self.len += 1;
        true
    }

    /// Linear scan over every node; removes the first entity with `id`.
    fn remove(&mut self, id: EntityId) -> bool {
        for node in &mut self.arena {
            if let Some(pos) = node.entities.iter().position(|e| e.id == id) {
                node.entities.remove(pos);
                self.len -= 1;
                return true;
            }
        }
        false
    }
}

impl RangeQueryable for Octree {
    fn query_range(&self, range: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !n.bounds.intersects(range) {
                continue;
            }
            out.extend(
                n.entities
                    .iter()
                    .filter(|e| range.contains_point(e.position))
                    .map(|e| e.id),
            );
            stack.extend(n.child_indices());
        }
        out
    }
}

impl RadiusQueryable for Octree {
    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let mut out = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return out;
        }
        let r2 = radius * radius;
        let mut stack = vec![ROOT];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !n.bounds.intersects_sphere(center, radius) {
                continue;
            }
            out.extend(
                n.entities
                    .iter()
                    .filter(|e| e.position.distance_squared(center) <= r2)
                    .map(|e| e.id),
            );
            stack.extend(n.child_indices());
        }
        out
    }
}

impl NearestQueryable for Octree {
    fn query_nearest(&self, point: Vec3) -> QueryResult {
        let mut best = QueryResult::NONE;
        self.nearest_in(ROOT, point, &mut best);
        best
    }

    fn query_k_nearest(&self, point: Vec3, k: usize) -> Vec<QueryResult> {
        if k == 0 {
            return Vec::new();
        }
        let mut knn = KNearest::new(point, k);
        self.k_nearest_in(ROOT, &mut knn);
        knn.into_sorted()
    }
}

impl Debug for Octree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Octree")
            .field("bounds", &self.bounds)
            .field("max_depth", &self.max_depth)
            .field("max_entities", &self.max_entities)
            .field("arena_nodes", &self.arena.len())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
