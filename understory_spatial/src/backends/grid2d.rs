// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-size 2D bucket grid over caller-held positions.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::RangeInclusive;

use hashbrown::HashMap;
use kurbo::{Point, Rect};

use crate::math;
use crate::types::EntityId;

/// Uniform 2D grid of `width × height` square cells.
///
/// Cells cover `[0, width * cell_size) × [0, height * cell_size)`; the cell of a point is
/// `floor(coord / cell_size)` per axis. Points outside the grid are dropped on insert.
///
/// Flooring differs from truncating toward zero: a coordinate in `(-cell_size, 0)` is
/// outside the grid and dropped rather than placed in cell 0.
///
/// Only ids are stored. Callers keep positions themselves, which makes
/// [`Grid2D::query_radius`] cell-granular: it returns everything in the cells that touch
/// the circle.
pub struct Grid2D {
    width: usize,
    height: usize,
    cell_size: f64,
    cells: Vec<Vec<EntityId>>,
    entity_cells: HashMap<EntityId, usize>,
}

impl Grid2D {
    /// Create an empty grid.
    ///
    /// A `cell_size` that is not positive and finite, or a `width * height` that
    /// overflows, yields a grid with no cells: every insert is dropped and every query
    /// is empty. The same holds when either dimension is zero.
    pub fn new(width: usize, height: usize, cell_size: f64) -> Self {
        let usable = cell_size > 0.0 && cell_size.is_finite();
        let (width, height, count) = match width.checked_mul(height) {
            Some(count) if usable => (width, height, count),
            _ => (0, 0, 0),
        };
        Self {
            width,
            height,
            cell_size,
            cells: (0..count).map(|_| Vec::new()).collect(),
            entity_cells: HashMap::new(),
        }
    }

    /// Number of cells along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells along y.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Edge length of a cell.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of stored ids.
    pub fn len(&self) -> usize {
        self.entity_cells.len()
    }

    /// Whether no ids are stored.
    pub fn is_empty(&self) -> bool {
        self.entity_cells.is_empty()
    }

    /// Remove every id, keeping the dimensions.
    pub fn clear(&mut self) {
        for bucket in &mut self.cells {
            bucket.clear();
        }
        self.entity_cells.clear();
    }

    /// Store `id` in the cell containing `pos`.
    ///
    /// An id that is already stored is removed first. Returns false, leaving the id
    /// absent, when `pos` is outside the grid.
    pub fn insert(&mut self, id: EntityId, pos: Point) -> bool {
        self.remove(id);
        let Some(slot) = self.slot_of(pos) else {
            return false;
        };
        self.cells[slot].push(id);
        self.entity_cells.insert(id, slot);
        true
    }

    /// Remove `id`. Returns false if it was not stored.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.entity_cells.remove(&id) else {
            return false;
        };
        self.cells[slot].retain(|&e| e != id);
        true
    }

    /// Move `id` to the cell containing `pos`.
    pub fn update(&mut self, id: EntityId, pos: Point) -> bool {
        self.remove(id);
        self.insert(id, pos)
    }

    /// Ids in cell `(cx, cy)` in insertion order; empty when out of range.
    pub fn query_cell(&self, cx: i64, cy: i64) -> Vec<EntityId> {
        let (Ok(x), Ok(y)) = (usize::try_from(cx), usize::try_from(cy)) else {
            return Vec::new();
        };
        if x >= self.width || y >= self.height {
            return Vec::new();
        }
        self.cells[self.slot(x, y)].clone()
    }

    /// Ids in every cell whose square touches the circle.
    ///
    /// A superset of the ids whose positions lie within `radius`. A negative or NaN
    /// radius yields nothing.
    pub fn query_radius(&self, center: Point, radius: f64) -> Vec<EntityId> {
        let mut out = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return out;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Reach saturates at the i64 range; infinite radii saturate."
        )]
        let reach = math::ceil_f64(radius / self.cell_size) as i64;
        let cx = self.cell_coord(center.x);
        let cy = self.cell_coord(center.y);
        let (Some(xs), Some(ys)) = (
            clamp_span(cx.saturating_sub(reach), cx.saturating_add(reach), self.width),
            clamp_span(cy.saturating_sub(reach), cy.saturating_add(reach), self.height),
        ) else {
            return out;
        };
        let r2 = radius * radius;
        for y in ys {
            for x in xs.clone() {
                let cell = self.cell_rect(x, y);
                let nearest = Point::new(
                    center.x.clamp(cell.x0, cell.x1),
                    center.y.clamp(cell.y0, cell.y1),
                );
                if nearest.distance_squared(center) <= r2 {
                    out.extend_from_slice(&self.cells[self.slot(x, y)]);
                }
            }
        }
        out
    }

    /// Ids in every in-range cell the rectangle covers (edges inclusive).
    pub fn query_rect(&self, rect: Rect) -> Vec<EntityId> {
        let mut out = Vec::new();
        let rect = rect.abs();
        let (Some(xs), Some(ys)) = (
            clamp_span(self.cell_coord(rect.x0), self.cell_coord(rect.x1), self.width),
            clamp_span(self.cell_coord(rect.y0), self.cell_coord(rect.y1), self.height),
        ) else {
            return out;
        };
        for y in ys {
            for x in xs.clone() {
                out.extend_from_slice(&self.cells[self.slot(x, y)]);
            }
        }
        out
    }

    #[inline]
    fn cell_coord(&self, v: f64) -> i64 {
        math::floor_f64_to_i64(v / self.cell_size)
    }

    #[inline]
    fn slot(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn slot_of(&self, pos: Point) -> Option<usize> {
        if !pos.is_finite() {
            return None;
        }
        let x = usize::try_from(self.cell_coord(pos.x)).ok()?;
        let y = usize::try_from(self.cell_coord(pos.y)).ok()?;
        (x < self.width && y < self.height).then(|| self.slot(x, y))
    }

    fn cell_rect(&self, x: usize, y: usize) -> Rect {
        let s = self.cell_size;
        let (x, y) = (x as f64, y as f64);
        Rect::new(x * s, y * s, (x + 1.0) * s, (y + 1.0) * s)
    }
}

/// Intersect the cell span `lo..=hi` with `0..n`.
fn clamp_span(lo: i64, hi: i64, n: usize) -> Option<RangeInclusive<usize>> {
    let last = i64::try_from(n).unwrap_or(i64::MAX) - 1;
    if hi < 0 || lo > last || lo > hi {
        return None;
    }
    let lo = usize::try_from(lo.max(0)).ok()?;
    let hi = usize::try_from(hi.min(last)).ok()?;
    Some(lo..=hi)
}

impl Debug for Grid2D {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Grid2D")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("cell_size", &self.cell_size)
            .field("len", &self.entity_cells.len())
            .finish_non_exhaustive()
    }
}
