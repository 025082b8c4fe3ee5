// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Neighbour lookup on a 2D grid whose positions live with the caller.
//!
//! The grid only stores ids, so radius queries are cell-granular. This example refines
//! the candidates against the positions it owns.
//!
//! Run:
//! - `cargo run -p understory_spatial_demos --example grid2d_neighbors`

use kurbo::{Point, Rect};
use understory_spatial::Grid2D;

fn main() {
    env_logger::init();

    let mut grid = Grid2D::new(32, 32, 10.0);
    let mut positions = Vec::new();
    for i in 0..200_i32 {
        let p = Point::new(f64::from(i * 37 % 320), f64::from(i * 91 % 320));
        if grid.insert(i, p) {
            positions.push((i, p));
        }
    }
    // Outside the grid: dropped without error.
    assert!(!grid.insert(1000, Point::new(-1.0, 5.0)));

    let center = Point::new(160.0, 160.0);
    let radius = 25.0;
    let candidates = grid.query_radius(center, radius);
    let exact: Vec<_> = candidates
        .iter()
        .filter(|id| {
            positions
                .iter()
                .any(|(j, p)| j == *id && p.distance(center) <= radius)
        })
        .collect();
    println!(
        "{} candidates from touching cells, {} within {radius}",
        candidates.len(),
        exact.len()
    );

    let window = Rect::new(0.0, 0.0, 50.0, 50.0);
    println!("ids in {window:?}: {:?}", grid.query_rect(window));
    log::debug!("{grid:?}");
}
