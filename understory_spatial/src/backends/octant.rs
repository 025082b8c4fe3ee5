// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Octant addressing shared by the octree backends.

use bitflags::bitflags;

use crate::types::{Aabb, Vec3};

bitflags! {
    /// Which half of a node each axis of an octant covers.
    ///
    /// A set flag selects the upper half (`>= center`) on that axis. The raw bits double as
    /// the child slot `0..8`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Octant: u8 {
        /// Upper half along x.
        const X = 1;
        /// Upper half along y.
        const Y = 2;
        /// Upper half along z.
        const Z = 4;
    }
}

impl Octant {
    /// The octant of `bounds` that owns `point`.
    ///
    /// A coordinate exactly on the splitting plane goes to the upper half.
    pub fn of(bounds: &Aabb, point: Vec3) -> Self {
        let c = bounds.center();
        let mut o = Self::empty();
        o.set(Self::X, point.x >= c.x);
        o.set(Self::Y, point.y >= c.y);
        o.set(Self::Z, point.z >= c.z);
        o
    }

    /// Child slot in `0..8`.
    #[inline]
    pub const fn index(self) -> usize {
        self.bits() as usize
    }

    /// All eight octants in slot order.
    pub fn iter_all() -> impl Iterator<Item = Self> {
        (0..8_u8).map(Self::from_bits_truncate)
    }

    /// The tight bounds of this octant within `parent`, split at the parent's center.
    pub fn bounds_in(self, parent: &Aabb) -> Aabb {
        let c = parent.center();
        let pick = |flag: Self, lo: f32, mid: f32, hi: f32| {
            if self.contains(flag) { (mid, hi) } else { (lo, mid) }
        };
        let (x0, x1) = pick(Self::X, parent.min.x, c.x, parent.max.x);
        let (y0, y1) = pick(Self::Y, parent.min.y, c.y, parent.max.y);
        let (z0, z1) = pick(Self::Z, parent.min.z, c.z, parent.max.z);
        Aabb::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }
}
