// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types, entities, and query results.

use core::ops::{Add, Div, Mul, Neg, Sub};

use crate::math;

/// Caller-assigned identity of an entity.
///
/// Ids must be unique among the entities currently stored in one index. `-1` is reserved
/// as the "no result" sentinel of [`QueryResult`].
pub type EntityId = i32;

/// A pair of entities whose bounding spheres overlap.
pub type CollisionPair = (EntityId, EntityId);

/// A 3D vector of `f32` components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// All components zero.
    pub const ZERO: Self = Self::splat(0.0);

    /// Create a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a vector with all components set to `v`.
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Component along `axis` (0 = x, 1 = y, anything else = z).
    #[inline]
    pub const fn axis(self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, o: Self) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        math::sqrt(self.length_squared())
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, o: Self) -> f32 {
        (self - o).length_squared()
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, o: Self) -> f32 {
        (self - o).length()
    }

    /// Component-wise minimum.
    pub fn min(self, o: Self) -> Self {
        Self::new(self.x.min(o.x), self.y.min(o.y), self.z.min(o.z))
    }

    /// Component-wise maximum.
    pub fn max(self, o: Self) -> Self {
        Self::new(self.x.max(o.x), self.y.max(o.y), self.z.max(o.z))
    }

    /// Component-wise reciprocal. Zero components become signed infinity.
    pub fn recip(self) -> Self {
        Self::new(1.0 / self.x, 1.0 / self.y, 1.0 / self.z)
    }

    /// Index of the axis with the largest component; ties prefer x, then y.
    pub fn largest_axis(self) -> usize {
        if self.x >= self.y && self.x >= self.z {
            0
        } else if self.y >= self.z {
            1
        } else {
            2
        }
    }

    /// Unit vector in the same direction, or [`Vec3::ZERO`] for a zero-length vector.
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            self / len
        } else {
            Self::ZERO
        }
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, s: f32) -> Self {
        Self::new(self.x / s, self.y / s, self.z / s)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Axis-aligned bounding box in 3D.
///
/// `min` must be component-wise `<=` `max`. Boxes are never auto-corrected.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from min/max corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from its center and half-extents.
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Smallest AABB containing every point, or `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        Some(it.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Whether the point lies inside the box. Faces are inclusive.
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Whether two boxes overlap or touch.
    #[inline]
    pub fn intersects(&self, o: &Self) -> bool {
        self.min.x <= o.max.x
            && self.max.x >= o.min.x
            && self.min.y <= o.max.y
            && self.max.y >= o.min.y
            && self.min.z <= o.max.z
            && self.max.z >= o.min.z
    }

    /// Squared distance from the box to a point; zero when the point is inside.
    pub fn distance_squared_to_point(&self, p: Vec3) -> f32 {
        let mut d = 0.0;
        for axis in 0..3 {
            let v = p.axis(axis);
            let lo = self.min.axis(axis);
            let hi = self.max.axis(axis);
            if v < lo {
                d += (lo - v) * (lo - v);
            } else if v > hi {
                d += (v - hi) * (v - hi);
            }
        }
        d
    }

    /// Whether a sphere could touch this box.
    ///
    /// This is an intersection test, not containment: it is true as soon as any part of
    /// the sphere overlaps the box. An infinite radius touches every box.
    #[inline]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_squared_to_point(center) <= radius * radius
    }

    /// Smallest box containing both.
    pub fn union(&self, o: &Self) -> Self {
        Self::new(self.min.min(o.min), self.max.max(o.max))
    }

    /// The box scaled by `factor` about its center.
    pub fn scaled(&self, factor: f32) -> Self {
        Self::from_center_half_extents(self.center(), self.size() * (0.5 * factor))
    }

    /// Slab test against a ray given by its origin and component-wise inverse direction.
    ///
    /// Returns the entry and exit parameters when the ray's line crosses the box and the
    /// exit lies at or ahead of the origin. `t_min` may be negative when the origin is
    /// inside the box.
    pub fn ray_slab(&self, origin: Vec3, inv_dir: Vec3) -> Option<(f32, f32)> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin.axis(axis);
            let inv = inv_dir.axis(axis);
            let (lo, hi) = (self.min.axis(axis), self.max.axis(axis));
            if inv.is_infinite() {
                // Parallel to this slab: `(lo - o) * inv` would be NaN for an origin on a face.
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let t1 = (lo - o) * inv;
            let t2 = (hi - o) * inv;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }
        (t_max >= t_min && t_max >= 0.0).then_some((t_min, t_max))
    }
}

/// A point-like entity with an advisory bounding radius.
///
/// Indexes place entities by `position` alone. `radius` is only consulted by sphere
/// tests at query time (ray hits, collision pairs).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpatialEntity {
    /// Caller-assigned identity.
    pub id: EntityId,
    /// Position used for placement and distance queries.
    pub position: Vec3,
    /// Bounding-sphere radius.
    pub radius: f32,
}

impl SpatialEntity {
    /// Create an entity with a bounding radius.
    pub const fn new(id: EntityId, position: Vec3, radius: f32) -> Self {
        Self {
            id,
            position,
            radius,
        }
    }

    /// Create an entity with zero radius.
    pub const fn point(id: EntityId, position: Vec3) -> Self {
        Self::new(id, position, 0.0)
    }

    /// Whether the bounding spheres overlap (strictly; touching spheres do not).
    #[inline]
    pub fn overlaps(&self, o: &Self) -> bool {
        self.position.distance(o.position) < self.radius + o.radius
    }
}

/// Result of a nearest, k-nearest, or raycast query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QueryResult {
    /// Id of the entity found, or `-1`.
    pub id: EntityId,
    /// Distance to the query point (or along the ray), or `+inf`.
    pub distance: f32,
    /// Entity position, or the hit point for raycasts.
    pub position: Vec3,
}

impl QueryResult {
    /// The "nothing found" sentinel.
    pub const NONE: Self = Self {
        id: -1,
        distance: f32::INFINITY,
        position: Vec3::ZERO,
    };

    /// Create a result.
    pub const fn new(id: EntityId, distance: f32, position: Vec3) -> Self {
        Self {
            id,
            distance,
            position,
        }
    }

    /// Whether this result names an entity.
    pub const fn is_hit(&self) -> bool {
        self.id != Self::NONE.id
    }
}

impl Default for QueryResult {
    fn default() -> Self {
        Self::NONE
    }
}
