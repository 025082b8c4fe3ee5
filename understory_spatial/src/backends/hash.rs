// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Uniform spatial hash: unbounded bucket grid keyed by integer cell coordinates.

use alloc::vec::Vec;
use core::fmt::Debug;

use hashbrown::HashMap;

use crate::capability::{
    CollisionQueryable, Insertable, RadiusQueryable, RangeQueryable, SpatialIndex,
};
use crate::collision::bucket_pairs;
use crate::math;
use crate::types::{Aabb, CollisionPair, EntityId, SpatialEntity, Vec3};

/// Integer cell coordinate: `floor(position / cell_size)` per axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellCoord {
    /// Cell index along x.
    pub x: i32,
    /// Cell index along y.
    pub y: i32,
    /// Cell index along z.
    pub z: i32,
}

impl CellCoord {
    /// Create a cell coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Uniform spatial hash.
///
/// Insert, remove, and update are O(1) amortized plus the size of the touched bucket.
/// There is no subdivision and no bounds. Coordinates far enough out to leave the `i32`
/// cell range share the outermost cells.
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<CellCoord, Vec<SpatialEntity>>,
    entity_cells: HashMap<EntityId, CellCoord>,
}

impl SpatialHash {
    /// Create an empty hash with cubic cells of edge `cell_size`.
    ///
    /// A `cell_size` that is not positive makes every insert a no-op.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
        }
    }

    /// Edge length of a cell.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty buckets.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// The cell a position falls in.
    pub fn cell_of(&self, p: Vec3) -> CellCoord {
        CellCoord::new(
            math::floor_to_i32(p.x / self.cell_size),
            math::floor_to_i32(p.y / self.cell_size),
            math::floor_to_i32(p.z / self.cell_size),
        )
    }

    /// Ids stored in cell `(cx, cy, cz)`, in insertion order.
    pub fn query_cell(&self, cx: i32, cy: i32, cz: i32) -> Vec<EntityId> {
        self.cells
            .get(&CellCoord::new(cx, cy, cz))
            .map(|bucket| bucket.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    /// Visit the buckets of every occupied cell in `lo..=hi`.
    ///
    /// Walks the coordinate range when it is smaller than the number of occupied buckets,
    /// otherwise filters the occupied buckets. Both visit the same set of buckets.
    fn for_each_bucket_in(
        &self,
        lo: CellCoord,
        hi: CellCoord,
        mut f: impl FnMut(&[SpatialEntity]),
    ) {
        let span = |a: i32, b: i32| (i64::from(b) - i64::from(a) + 1).max(0) as u64;
        let volume = span(lo.x, hi.x)
            .saturating_mul(span(lo.y, hi.y))
            .saturating_mul(span(lo.z, hi.z));
        if volume > self.cells.len() as u64 {
            for (c, bucket) in &self.cells {
                if (lo.x..=hi.x).contains(&c.x)
                    && (lo.y..=hi.y).contains(&c.y)
                    && (lo.z..=hi.z).contains(&c.z)
                {
                    f(bucket);
                }
            }
            return;
        }
        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    if let Some(bucket) = self.cells.get(&CellCoord::new(x, y, z)) {
                        f(bucket);
                    }
                }
            }
        }
    }
}

impl SpatialIndex for SpatialHash {
    fn len(&self) -> usize {
        self.entity_cells.len()
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
    }
}

impl Insertable for SpatialHash {
    /// Append to the entity's bucket. An id that is already stored is moved instead.
    fn insert(&mut self, entity: SpatialEntity) -> bool {
        self.remove(entity.id);
        if self.cell_size.is_nan() || self.cell_size <= 0.0 {
            return false;
        }
        let cell = self.cell_of(entity.position);
        let bucket = self.cells.entry(cell).or_insert_with(|| {
            log::trace!("spatial hash: new bucket {cell:?}");
            Vec::new()
        });
        bucket.push(entity);
        self.entity_cells.insert(entity.id, cell);
        true
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let Some(cell) = self.entity_cells.remove(&id) else {
            return false;
        };
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|e| e.id != id);
            if bucket.is_empty() {
                self.cells.remove(&cell);
                log::trace!("spatial hash: dropped empty bucket {cell:?}");
            }
        }
        true
    }
}

impl RadiusQueryable for SpatialHash {
    /// Tests every entity in the cube of cells within `ceil(radius / cell_size)` of the
    /// center's cell.
    fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let mut out = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return out;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Reach saturates at the i64 range; infinite radii saturate."
        )]
        let reach = math::ceil(radius / self.cell_size) as i64;
        let c = self.cell_of(center);
        let lo = CellCoord::new(
            clamp_cell(i64::from(c.x).saturating_sub(reach)),
            clamp_cell(i64::from(c.y).saturating_sub(reach)),
            clamp_cell(i64::from(c.z).saturating_sub(reach)),
        );
        let hi = CellCoord::new(
            clamp_cell(i64::from(c.x).saturating_add(reach)),
            clamp_cell(i64::from(c.y).saturating_add(reach)),
            clamp_cell(i64::from(c.z).saturating_add(reach)),
        );
        let r2 = radius * radius;
        self.for_each_bucket_in(lo, hi, |bucket| {
            out.extend(
                bucket
                    .iter()
                    .filter(|e| e.position.distance_squared(center) <= r2)
                    .map(|e| e.id),
            );
        });
        out
    }
}

/// Clamp a widened cell index back into the `i32` cell range.
#[inline]
fn clamp_cell(v: i64) -> i32 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "The value is clamped to the i32 range first."
    )]
    let c = v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    c
}

impl RangeQueryable for SpatialHash {
    fn query_range(&self, range: &Aabb) -> Vec<EntityId> {
        let mut out = Vec::new();
        let lo = self.cell_of(range.min);
        let hi = self.cell_of(range.max);
        self.for_each_bucket_in(lo, hi, |bucket| {
            out.extend(
                bucket
                    .iter()
                    .filter(|e| range.contains_point(e.position))
                    .map(|e| e.id),
            );
        });
        out
    }
}

impl CollisionQueryable for SpatialHash {
    /// Overlapping pairs within each bucket.
    ///
    /// Pairs whose positions fall in different cells are not reported, even when their
    /// spheres overlap.
    fn find_collisions(&self) -> Vec<CollisionPair> {
        let mut out = Vec::new();
        for bucket in self.cells.values() {
            bucket_pairs(bucket, &mut out);
        }
        out
    }
}

impl Debug for SpatialHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialHash")
            .field("cell_size", &self.cell_size)
            .field("cells", &self.cells.len())
            .field("len", &self.entity_cells.len())
            .finish_non_exhaustive()
    }
}
