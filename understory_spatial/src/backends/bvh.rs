// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch-built bounding volume hierarchy over entity bounding spheres.

use alloc::vec::Vec;
use core::fmt::Debug;

use super::NodeIdx;
use crate::capability::{
    BatchBuildable, NearestQueryable, RadiusQueryable, RangeQueryable, Raycastable,
    SpatialIndex,
};
use crate::knn::KNearest;
use crate::math;
use crate::types::{Aabb, EntityId, QueryResult, SpatialEntity, Vec3};

enum Kind {
    Leaf(SpatialEntity),
    Internal { left: NodeIdx, right: NodeIdx },
}

struct Node {
    bbox: Aabb,
    kind: Kind,
}

/// Ray parameters shared by every node visit.
struct Ray {
    origin: Vec3,
    dir: Vec3,
    inv_dir: Vec3,
    max_dist: f32,
}

/// Binary BVH with one entity per leaf.
///
/// Leaves are boxed by `position ± radius` and internal boxes are the union of their
/// children, so every bounding sphere lies inside each of its ancestors' boxes. Splits
/// are at the median along the longest axis of the entities' positions.
#[derive(Default)]
pub struct Bvh {
    arena: Vec<Node>,
    root: Option<NodeIdx>,
    len: usize,
}

impl Bvh {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from `entities`.
    pub fn from_entities(entities: &[SpatialEntity]) -> Self {
        let mut bvh = Self::new();
        bvh.build(entities);
        bvh
    }

    /// Number of arena nodes: `2 * len - 1`, or zero when empty.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Box of the whole hierarchy, if non-empty.
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.map(|r| self.arena[r.get()].bbox)
    }

    /// Build the subtree for a non-empty slice; children are pushed before their parent.
    fn build_rec(arena: &mut Vec<Node>, items: &mut [SpatialEntity]) -> NodeIdx {
        if let [e] = &*items {
            let bbox = Aabb::from_center_half_extents(e.position, Vec3::splat(e.radius.max(0.0)));
            arena.push(Node {
                bbox,
                kind: Kind::Leaf(*e),
            });
            return NodeIdx::new(arena.len() - 1);
        }
        let first = items[0].position;
        let spread = items[1..].iter().fold(Aabb::new(first, first), |b, e| {
            Aabb::new(b.min.min(e.position), b.max.max(e.position))
        });
        let axis = spread.size().largest_axis();
        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |a, b| {
            a.position.axis(axis).total_cmp(&b.position.axis(axis))
        });
        let (lo, hi) = items.split_at_mut(mid);
        let left = Self::build_rec(arena, lo);
        let right = Self::build_rec(arena, hi);
        let bbox = arena[left.get()].bbox.union(&arena[right.get()].bbox);
        arena.push(Node {
            bbox,
            kind: Kind::Internal { left, right },
        });
        NodeIdx::new(arena.len() - 1)
    }

    fn raycast_in(&self, node: NodeIdx, ray: &Ray, best: &mut QueryResult) {
        let n = &self.arena[node.get()];
        let Some((t_enter, _)) = n.bbox.ray_slab(ray.origin, ray.inv_dir) else {
            return;
        };
        if t_enter > ray.max_dist || t_enter > best.distance {
            return;
        }
        match n.kind {
            Kind::Leaf(e) => {
                if let Some(t) = ray_sphere(ray, e.position, e.radius)
                    && t < best.distance
                    && t <= ray.max_dist
                {
                    *best = QueryResult::new(e.id, t, ray.origin + ray.dir * t);
                }
            }
            Kind::Internal { left, right } => {
                self.raycast_in(left, ray, best);
                self.raycast_in(right, ray, best);
            }
        }
    }

    /// Children of an internal node ordered by box distance to `point`, with the squared
    /// distances.
    fn ordered_children(
        &self,
        left: NodeIdx,
        right: NodeIdx,
        point: Vec3,
    ) -> [(NodeIdx, f32); 2] {
        let dl = self.arena[left.get()].bbox.distance_squared_to_point(point);
        let dr = self.arena[right.get()].bbox.distance_squared_to_point(point);
        if dl <= dr {
            [(left, dl), (right, dr)]
        } else {
            [(right, dr), (left, dl)]
        }
    }

    fn nearest_in(&self, node: NodeIdx, point: Vec3, best: &mut QueryResult) {
        match self.arena[node.get()].kind {
            Kind::Leaf(e) => {
                let d = e.position.distance(point);
                if d < best.distance {
                    *best = QueryResult::new(e.id, d, e.position);
                }
            }
            Kind::Internal { left, right } => {
                for (child, d2) in self.ordered_children(left, right, point) {
                    if d2 <= best.distance * best.distance {
                        self.nearest_in(child, point, best);
                    }
                }
            }
        }
    }

    fn k_nearest_in(&self, node: NodeIdx, knn: &mut KNearest) {
        match self.arena[node.get()].kind {
            Kind::Leaf(e) => knn.offer(&e),
            Kind::Internal { left, right } => {
                for (child, d2) in self.ordered_children(left, right, knn.point()) {
                    let bound = knn.bound();
                    if d2 <= bound * bound {
                        self.k_nearest_in(child, knn);
                    }
                }
            }
        }
    }

    /// Depth-first walk over every leaf under boxes accepted by `visit_box`.
    fn for_each_leaf(
        &self,
        mut visit_box: impl FnMut(&Aabb) -> bool,
        mut leaf: impl FnMut(&SpatialEntity),
    ) {
        let mut stack: Vec<NodeIdx> = self.root.into_iter().collect();
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if !visit_box(&n.bbox) {
                continue;
            }
            match &n.kind {
                Kind::Leaf(e) => leaf(e),
                Kind::Internal { left, right } => {
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
    }
}

/// Smallest non-negative ray parameter at which the ray meets the sphere.
///
/// The ray direction is unit length. An origin inside the sphere yields the exit point.
fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let s = math::sqrt(disc);
    let (t0, t1) = (-b - s, -b + s);
    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        Some(t1)
    } else {
        None
    }
}

impl SpatialIndex for Bvh {
    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }
}

impl BatchBuildable for Bvh {
    fn build(&mut self, entities: &[SpatialEntity]) {
        self.clear();
        if entities.is_empty() {
            return;
        }
        let mut items = entities.to_vec();
        self.arena.reserve(2 * items.len() - 1);
        self.root = Some(Self::build_rec(&mut self.arena, &mut items));
        self.len = items.len();
        log::debug!(
            "bvh: built {} nodes over {} entities",
            self.arena.len(),
            self.len
        );
    }
}

impl RangeQueryable for Bvh {
    fn query_range(&self, range: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.for_each_leaf(
            |b| b.intersects(range),
            |e| {
                if range.contains_point(e.position) {
                    out.push(e.id);
                }
            },
        );
        out
    }
}

impl RadiusQueryable for Bvh {
    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let mut out = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return out;
        }
        let r2 = radius * radius;
        self.for_each_leaf(
            |b| b.intersects_sphere(center, radius),
            |e| {
                if e.position.distance_squared(center) <= r2 {
                    out.push(e.id);
                }
            },
        );
        out
    }
}

impl Raycastable for Bvh {
    /// Closest bounding-sphere hit, visiting the left child before the right.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_dist: f32) -> QueryResult {
        let mut best = QueryResult::NONE;
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || max_dist.is_nan() || max_dist < 0.0 {
            return best;
        }
        let Some(root) = self.root else {
            return best;
        };
        let ray = Ray {
            origin,
            dir,
            inv_dir: dir.recip(),
            max_dist,
        };
        self.raycast_in(root, &ray, &mut best);
        best
    }
}

impl NearestQueryable for Bvh {
    fn query_nearest(&self, point: Vec3) -> QueryResult {
        let mut best = QueryResult::NONE;
        if let Some(root) = self.root {
            self.nearest_in(root, point, &mut best);
        }
        best
    }

    fn query_k_nearest(&self, point: Vec3, k: usize) -> Vec<QueryResult> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }
        let mut knn = KNearest::new(point, k);
        self.k_nearest_in(root, &mut knn);
        knn.into_sorted()
    }
}

impl Debug for Bvh {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bvh")
            .field("arena_nodes", &self.arena.len())
            .field("len", &self.len)
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}
