// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pairwise bounding-sphere overlap within a single bucket.

use alloc::vec::Vec;

use crate::types::{CollisionPair, SpatialEntity};

/// Push every overlapping pair in `bucket` onto `out`, in storage order.
///
/// Only entities sharing the bucket are compared. Indexes built on this report pairs
/// that straddle a cell or node boundary as non-colliding.
pub(crate) fn bucket_pairs(bucket: &[SpatialEntity], out: &mut Vec<CollisionPair>) {
    for (i, a) in bucket.iter().enumerate() {
        for b in &bucket[i + 1..] {
            if a.overlaps(b) {
                out.push((a.id, b.id));
            }
        }
    }
}
