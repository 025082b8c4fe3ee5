// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loose octree: node regions enlarged about their centre, with an id → node cache.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;

use super::NodeIdx;
use super::octant::Octant;
use crate::capability::{
    CollisionQueryable, Insertable, NearestQueryable, RadiusQueryable, RangeQueryable,
    SpatialIndex,
};
use crate::collision::bucket_pairs;
use crate::knn::KNearest;
use crate::types::{Aabb, CollisionPair, EntityId, QueryResult, SpatialEntity, Vec3};

const ROOT: NodeIdx = NodeIdx::new(0);

struct Node {
    bounds: Aabb,
    loose: Aabb,
    entities: Vec<SpatialEntity>,
    children: Option<NodeIdx>,
}

impl Node {
    fn leaf(bounds: Aabb, looseness: f32) -> Self {
        Self {
            bounds,
            loose: bounds.scaled(looseness),
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

/// Octree whose nodes accept any point inside their loose bounds.
///
/// Every node's loose bounds are its tight octant scaled by `looseness` about the centre,
/// so an entity near a splitting plane can sink into a child instead of sticking at the
/// parent. Leaves above `max_depth` are split on the way down, and an entity is stored at
/// the deepest node whose loose bounds still contain it. Internal nodes may therefore
/// hold entities.
///
/// An id → node cache makes [`Insertable::remove`] and [`Insertable::update`] cheap, which
/// suits entities that move every frame.
pub struct LooseOctree {
    max_depth: usize,
    looseness: f32,
    arena: Vec<Node>,
    entity_nodes: HashMap<EntityId, NodeIdx>,
}

impl LooseOctree {
    /// Default depth limit.
    pub const DEFAULT_MAX_DEPTH: usize = 6;

    /// Default loose-bounds scale factor.
    pub const DEFAULT_LOOSENESS: f32 = 2.0;

    /// Create an empty loose octree whose root covers `bounds`.
    ///
    /// A `looseness` below 1 (or NaN) is raised to 1, giving tight nodes.
    pub fn new(bounds: Aabb, max_depth: usize, looseness: f32) -> Self {
        debug_assert!(bounds.is_valid(), "octree bounds must have min <= max");
        // Below 1 a child's loose box pokes out of its parent's and pruning goes wrong.
        let looseness = looseness.max(1.0);
        Self {
            max_depth,
            looseness,
            arena: vec![Node::leaf(bounds, looseness)],
            entity_nodes: HashMap::new(),
        }
    }

    /// Create an empty loose octree with the default depth limit and looseness.
    pub fn with_bounds(bounds: Aabb) -> Self {
        Self::new(bounds, Self::DEFAULT_MAX_DEPTH, Self::DEFAULT_LOOSENESS)
    }

    /// Tight bounds of the root.
    pub fn bounds(&self) -> Aabb {
        self.arena[ROOT.get()].bounds
    }

    /// Loose bounds of the root: the region in which inserts are accepted.
    pub fn loose_bounds(&self) -> Aabb {
        self.arena[ROOT.get()].loose
    }

    /// Loose-bounds scale factor.
    pub fn looseness(&self) -> f32 {
        self.looseness
    }

    /// Number of nodes, including internal ones.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Depth of the node holding `id`, if stored.
    pub fn depth_of(&self, id: EntityId) -> Option<usize> {
        let target = *self.entity_nodes.get(&id)?;
        let p = self.arena[target.get()]
            .entities
            .iter()
            .find(|e| e.id == id)?
            .position;
        // Replay the descent; node placement is a pure function of the position.
        let mut node = ROOT;
        let mut depth = 0;
        while node != target {
            let n = &self.arena[node.get()];
            let first = n.children?;
            node = NodeIdx::new(first.get() + Octant::of(&n.bounds, p).index());
            depth += 1;
        }
        Some(depth)
    }

    fn subdivide(&mut self, node: NodeIdx, depth: usize) {
        let bounds = self.arena[node.get()].bounds;
        let looseness = self.looseness;
        let first = NodeIdx::new(self.arena.len());
        self.arena.extend(
            Octant::iter_all().map(|o| Node::leaf(o.bounds_in(&bounds), looseness)),
        );
        self.arena[node.get()].children = Some(first);
        log::trace!(
            "loose octree: subdivided node {} at depth {depth}",
            node.get()
        );
    }

    /// The node that stores an entity at `p`, splitting leaves on the way.
    fn place(&mut self, p: Vec3) -> NodeIdx {
        let mut node = ROOT;
        let mut depth = 0;
        loop {
            if self.arena[node.get()].children.is_none() && depth < self.max_depth {
                self.subdivide(node, depth);
            }
            let n = &self.arena[node.get()];
            let Some(first) = n.children else {
                return node;
            };
            let child = NodeIdx::new(first.get() + Octant::of(&n.bounds, p).index());
            if !self.arena[child.get()].loose.contains_point(p) {
                return node;
            }
            node = child;
            depth += 1;
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
                .loose
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
                .loose
                .intersects_sphere(knn.point(), knn.bound())
            {
                self.k_nearest_in(child, knn);
            }
        }
    }
}

impl SpatialIndex for LooseOctree {
    fn len(&self) -> usize {
        self.entity_nodes.len()
    }

    fn clear(&mut self) {
        let bounds = self.bounds();
        self.arena.clear();
        self.arena.push(Node::leaf(bounds, self.looseness));
        self.entity_nodes.clear();
    }
}

impl Insertable for LooseOctree {
    /// Store the entity at the deepest node whose loose bounds contain it.
    ///
    /// An id that is already stored is removed first. Returns false, leaving the id
    /// absent, when the position is outside the root's loose bounds.
    fn insert(&mut self, entity: SpatialEntity) -> bool {
        self.remove(entity.id);
        if !self.loose_bounds().contains_point(entity.position) {
            return false;
        }
        let node = self.place(entity.position);
        self.arena[node.get()].entities.push(entity);
        self.entity_nodes.insert(entity.id, node);
        true
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let Some(node) = self.entity_nodes.remove(&id) else {
            return false;
        };
        self.arena[node.get()].entities.retain(|e| e.id != id);
        true
    }
}

impl RadiusQueryable for LooseOctree {
    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let mut out = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return out;
        }
        let r2 = radius * radius;
        let mut stack = vec![ROOT];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !n.loose.intersects_sphere(center, radius) {
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

impl RangeQueryable for LooseOctree {
    fn query_range(&self, range: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !n.loose.intersects(range) {
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

impl NearestQueryable for LooseOctree {
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

impl CollisionQueryable for LooseOctree {
    /// Overlapping pairs among the entities stored at the same node.
    ///
    /// Entities held by different nodes are never paired, even when their spheres overlap.
    fn find_collisions(&self) -> Vec<CollisionPair> {
        let mut out = Vec::new();
        for n in &self.arena {
            bucket_pairs(&n.entities, &mut out);
        }
        out
    }
}

impl Debug for LooseOctree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LooseOctree")
            .field("bounds", &self.bounds())
            .field("max_depth", &self.max_depth)
            .field("looseness", &self.looseness)
            .field("arena_nodes", &self.arena.len())
            .field("len", &self.entity_nodes.len())
            .finish_non_exhaustive()
    }
}
