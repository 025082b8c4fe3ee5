// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Float functions that live in `std`, with a `libm` fallback for `no_std` builds.

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("understory_spatial requires either the `std` or `libm` feature");

#[cfg(feature = "std")]
mod imp {
    #[inline]
    pub(crate) fn sqrt(v: f32) -> f32 {
        v.sqrt()
    }

    #[inline]
    pub(crate) fn floor(v: f32) -> f32 {
        v.floor()
    }

    #[inline]
    pub(crate) fn ceil(v: f32) -> f32 {
        v.ceil()
    }

    #[inline]
    pub(crate) fn floor_f64(v: f64) -> f64 {
        v.floor()
    }

    #[inline]
    pub(crate) fn ceil_f64(v: f64) -> f64 {
        v.ceil()
    }
}

#[cfg(all(not(feature = "std"), feature = "libm"))]
mod imp {
    #[inline]
    pub(crate) fn sqrt(v: f32) -> f32 {
        libm::sqrtf(v)
    }

    #[inline]
    pub(crate) fn floor(v: f32) -> f32 {
        libm::floorf(v)
    }

    #[inline]
    pub(crate) fn ceil(v: f32) -> f32 {
        libm::ceilf(v)
    }

    #[inline]
    pub(crate) fn floor_f64(v: f64) -> f64 {
        libm::floor(v)
    }

    #[inline]
    pub(crate) fn ceil_f64(v: f64) -> f64 {
        libm::ceil(v)
    }
}

pub(crate) use imp::{ceil, ceil_f64, floor, floor_f64, sqrt};

/// Floor to a cell coordinate, saturating at the `i32` range (`as` saturates, NaN maps to 0).
#[inline]
pub(crate) fn floor_to_i32(v: f32) -> i32 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Cell coordinates saturate at the i32 range."
    )]
    let i = floor(v) as i32;
    i
}

/// Floor an `f64` to a cell coordinate, saturating at the `i64` range.
#[inline]
pub(crate) fn floor_f64_to_i64(v: f64) -> i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Cell coordinates saturate at the i64 range."
    )]
    let i = floor_f64(v) as i64;
    i
}
