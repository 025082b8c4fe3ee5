// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batch-built k-d tree with axis-cycling median splits.

use alloc::vec::Vec;
use core::fmt::Debug;

use super::NodeIdx;
use crate::capability::{
    BatchBuildable, NearestQueryable, RadiusQueryable, RangeQueryable, SpatialIndex,
};
use crate::knn::KNearest;
use crate::types::{Aabb, EntityId, QueryResult, SpatialEntity, Vec3};

struct Node {
    entity: SpatialEntity,
    axis: usize,
    left: Option<NodeIdx>,
    right: Option<NodeIdx>,
}

impl Node {
    #[inline]
    fn split(&self) -> f32 {
        self.entity.position.axis(self.axis)
    }
}

/// Static k-d tree over a snapshot of entities.
///
/// Each node holds one entity: the median of its subtree along `depth % 3`. The left
/// subtree holds entities at or below the split coordinate and the right subtree those
/// at or above it. Depth is `O(log n)`; there is no rebalancing, so moving or adding an
/// entity requires a full [`BatchBuildable::build`].
#[derive(Default)]
pub struct KdTree {
    arena: Vec<Node>,
    root: Option<NodeIdx>,
}

impl KdTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `entities`.
    pub fn from_entities(entities: &[SpatialEntity]) -> Self {
        let mut tree = Self::new();
        tree.build(entities);
        tree
    }

    /// Number of levels, zero when empty.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(NodeIdx, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((i, d)) = stack.pop() {
            max = max.max(d);
            let n = &self.arena[i.get()];
            stack.extend(n.left.map(|c| (c, d + 1)));
            stack.extend(n.right.map(|c| (c, d + 1)));
        }
        max
    }

    fn build_rec(
        arena: &mut Vec<Node>,
        items: &mut [SpatialEntity],
        depth: usize,
    ) -> Option<NodeIdx> {
        if items.is_empty() {
            return None;
        }
        let axis = depth % 3;
        let mid = items.len() / 2;
        items.select_nth_unstable_by(mid, |a, b| {
            a.position.axis(axis).total_cmp(&b.position.axis(axis))
        });
        let idx = NodeIdx::new(arena.len());
        arena.push(Node {
            entity: items[mid],
            axis,
            left: None,
            right: None,
        });
        let (below, rest) = items.split_at_mut(mid);
        let left = Self::build_rec(arena, below, depth + 1);
        let right = Self::build_rec(arena, &mut rest[1..], depth + 1);
        let node = &mut arena[idx.get()];
        node.left = left;
        node.right = right;
        Some(idx)
    }

    fn nearest_in(&self, node: Option<NodeIdx>, point: Vec3, best: &mut QueryResult) {
        let Some(i) = node else {
            return;
        };
        let n = &self.arena[i.get()];
        let d = n.entity.position.distance(point);
        if d < best.distance {
            *best = QueryResult::new(n.entity.id, d, n.entity.position);
        }
        let diff = point.axis(n.axis) - n.split();
        let (near, far) = if diff < 0.0 {
            (n.left, n.right)
        } else {
            (n.right, n.left)
        };
        self.nearest_in(near, point, best);
        if diff.abs() < best.distance {
            self.nearest_in(far, point, best);
        }
    }

    fn k_nearest_in(&self, node: Option<NodeIdx>, knn: &mut KNearest) {
        let Some(i) = node else {
            return;
        };
        let n = &self.arena[i.get()];
        knn.offer(&n.entity);
        let diff = knn.point().axis(n.axis) - n.split();
        let (near, far) = if diff < 0.0 {
            (n.left, n.right)
        } else {
            (n.right, n.left)
        };
        self.k_nearest_in(near, knn);
        if diff.abs() < knn.bound() {
            self.k_nearest_in(far, knn);
        }
    }
}

impl SpatialIndex for KdTree {
    fn len(&self) -> usize {
        self.arena.len()
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }
}

impl BatchBuildable for KdTree {
    fn build(&mut self, entities: &[SpatialEntity]) {
        self.clear();
        let mut items = entities.to_vec();
        self.arena.reserve(items.len());
        self.root = Self::build_rec(&mut self.arena, &mut items, 0);
        log::debug!(
            "kd-tree: built {} nodes, depth {}",
            self.arena.len(),
            self.depth()
        );
    }
}

impl NearestQueryable for KdTree {
    fn query_nearest(&self, point: Vec3) -> QueryResult {
        let mut best = QueryResult::NONE;
        self.nearest_in(self.root, point, &mut best);
        best
    }

    fn query_k_nearest(&self, point: Vec3, k: usize) -> Vec<QueryResult> {
        if k == 0 {
            return Vec::new();
        }
        let mut knn = KNearest::new(point, k);
        self.k_nearest_in(self.root, &mut knn);
        knn.into_sorted()
    }
}

impl RadiusQueryable for KdTree {
    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let mut out = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return out;
        }
        let r2 = radius * radius;
        let mut stack: Vec<NodeIdx> = self.root.into_iter().collect();
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if n.entity.position.distance_squared(center) <= r2 {
                out.push(n.entity.id);
            }
            let c = center.axis(n.axis);
            let split = n.split();
            if c - radius <= split {
                stack.extend(n.left);
            }
            if c + radius >= split {
                stack.extend(n.right);
            }
        }
        out
    }
}

impl RangeQueryable for KdTree {
    fn query_range(&self, range: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIdx> = self.root.into_iter().collect();
        while let Some(i) = stack.pop() {
            let n = &self.arena[i.get()];
            if range.contains_point(n.entity.position) {
                out.push(n.entity.id);
            }
            let split = n.split();
            if range.min.axis(n.axis) <= split {
                stack.extend(n.left);
            }
            if range.max.axis(n.axis) >= split {
                stack.extend(n.right);
            }
        }
        out
    }
}

impl Debug for KdTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KdTree")
            .field("nodes", &self.arena.len())
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}
