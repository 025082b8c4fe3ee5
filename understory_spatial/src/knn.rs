// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded max-heap used by the k-nearest queries.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::types::{QueryResult, SpatialEntity, Vec3};

/// Heap entry ordered by distance, then id, so ties resolve deterministically.
#[derive(Copy, Clone, Debug)]
struct Candidate(QueryResult);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .total_cmp(&other.0.distance)
            .then(self.0.id.cmp(&other.0.id))
    }
}

/// Keeps the `k` closest candidates seen so far.
///
/// The heap top is the current k-th best, which doubles as the pruning radius once the
/// collector is full.
#[derive(Debug)]
pub(crate) struct KNearest {
    k: usize,
    point: Vec3,
    heap: BinaryHeap<Candidate>,
}

impl KNearest {
    pub(crate) fn new(point: Vec3, k: usize) -> Self {
        Self {
            k,
            point,
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
        }
    }

    /// The query point.
    #[inline]
    pub(crate) fn point(&self) -> Vec3 {
        self.point
    }

    /// Distance a candidate must beat to be kept. Infinite until `k` are collected.
    #[inline]
    pub(crate) fn bound(&self) -> f32 {
        if self.heap.len() < self.k {
            f32::INFINITY
        } else {
            self.heap.peek().map_or(f32::NEG_INFINITY, |c| c.0.distance)
        }
    }

    /// Offer an entity; keeps it if it is among the `k` closest so far.
    pub(crate) fn offer(&mut self, e: &SpatialEntity) {
        if self.k == 0 {
            return;
        }
        let c = Candidate(QueryResult::new(
            e.id,
            e.position.distance(self.point),
            e.position,
        ));
        if self.heap.len() < self.k {
            self.heap.push(c);
        } else if let Some(mut top) = self.heap.peek_mut()
            && c < *top
        {
            *top = c;
        }
    }

    /// Results ascending by distance.
    pub(crate) fn into_sorted(self) -> Vec<QueryResult> {
        self.heap.into_sorted_vec().into_iter().map(|c| c.0).collect()
    }
}
