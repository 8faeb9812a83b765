//! Occupancy statistics over the placement grid.

use serde::{Deserialize, Serialize};

/// Summary of how the grid is filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub total_cells: usize,
    pub occupied_cells: usize,
    pub available_cells: usize,
    pub occupancy_rate: f64,
    /// Occupied 8-neighbour links divided by the maximum possible
    /// (`8 × occupied`). Zero with fewer than two elements.
    pub connectivity: f64,
    /// Number of 8-connected groups of occupied cells.
    pub clusters: usize,
}

impl GridStats {
    /// Computes statistics from a row-major (`x * n + y`) occupancy mask.
    pub fn from_occupancy(occupied: &[bool], grid_size: usize) -> Self {
        let total_cells = grid_size * grid_size;
        let occupied_cells = occupied.iter().filter(|o| **o).count();

        Self {
            total_cells,
            occupied_cells,
            available_cells: total_cells - occupied_cells,
            occupancy_rate: if total_cells == 0 {
                0.0
            } else {
                occupied_cells as f64 / total_cells as f64
            },
            connectivity: connectivity(occupied, grid_size, occupied_cells),
            clusters: count_clusters(occupied, grid_size),
        }
    }
}

fn neighbours(x: usize, y: usize, n: usize) -> impl Iterator<Item = (usize, usize)> {
    (-1i64..=1)
        .flat_map(|dx| (-1i64..=1).map(move |dy| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            (nx >= 0 && ny >= 0 && (nx as usize) < n && (ny as usize) < n)
                .then_some((nx as usize, ny as usize))
        })
}

fn connectivity(occupied: &[bool], n: usize, occupied_cells: usize) -> f64 {
    if occupied_cells < 2 {
        return 0.0;
    }
    let mut links = 0usize;
    for x in 0..n {
        for y in 0..n {
            if occupied[x * n + y] {
                links += neighbours(x, y, n)
                    .filter(|&(nx, ny)| occupied[nx * n + ny])
                    .count();
            }
        }
    }
    links as f64 / (occupied_cells * 8) as f64
}

fn count_clusters(occupied: &[bool], n: usize) -> usize {
    let mut visited = vec![false; n * n];
    let mut clusters = 0;
    let mut stack = Vec::new();

    for start in 0..n * n {
        if !occupied[start] || visited[start] {
            continue;
        }
        clusters += 1;
        visited[start] = true;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            for (nx, ny) in neighbours(idx / n, idx % n, n) {
                let next = nx * n + ny;
                if occupied[next] && !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
    }
    clusters
}
