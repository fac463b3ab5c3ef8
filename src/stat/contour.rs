//! Two-dimensional density: points splatted onto a pixel grid, smoothed with a
//! separable Epanechnikov kernel, then traced into iso-density rings with
//! marching squares.

use super::kde::epanechnikov;
use crate::ir::Point;
use std::collections::HashMap;

/// Grid cell size in pixels.
pub const CELL_SIZE: f64 = 4.0;

/// Density sampled on grid nodes; node `(i, j)` sits at pixel `(i·cell, j·cell)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub nx: usize,
    pub ny: usize,
    pub cell: f64,
    pub width: f64,
    pub height: f64,
    pub values: Vec<f64>,
}

impl DensityGrid {
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.nx + i]
    }

    /// Node value with an implicit border below every density.
    fn padded(&self, i: isize, j: isize) -> f64 {
        if i < 0 || j < 0 || i >= self.nx as isize || j >= self.ny as isize {
            f64::NEG_INFINITY
        } else {
            self.at(i as usize, j as usize)
        }
    }

    pub fn extent(&self) -> Option<(f64, f64)> {
        crate::scale::extent(self.values.iter().copied())
    }
}

/// Normalized 1D kernel weights for offsets `-r..=r` cells.
fn kernel_weights(bandwidth: f64, cell: f64) -> Vec<f64> {
    let radius = if bandwidth > 0.0 { (bandwidth / cell).floor() as usize } else { 0 };
    if radius == 0 {
        return vec![1.0];
    }
    let raw: Vec<f64> = (-(radius as isize)..=radius as isize)
        .map(|d| epanechnikov(d as f64 * cell / bandwidth, bandwidth))
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

fn convolve(values: &[f64], nx: usize, ny: usize, weights: &[f64], horizontal: bool) -> Vec<f64> {
    let r = (weights.len() / 2) as isize;
    let mut out = vec![0.0; values.len()];
    for j in 0..ny {
        for i in 0..nx {
            let mut acc = 0.0;
            for (k, w) in weights.iter().enumerate() {
                let d = k as isize - r;
                let (si, sj) = if horizontal { (i as isize + d, j as isize) } else { (i as isize, j as isize + d) };
                if si >= 0 && sj >= 0 && (si as usize) < nx && (sj as usize) < ny {
                    acc += w * values[sj as usize * nx + si as usize];
                }
            }
            out[j * nx + i] = acc;
        }
    }
    out
}

/// Bivariate density of pixel-space points over a `width × height` cell.
///
/// Points outside the cell are ignored. Each point is split bilinearly over
/// its four surrounding nodes before smoothing.
pub fn density_grid(points: &[Point], width: f64, height: f64, bandwidth: f64, cell: f64) -> DensityGrid {
    let nx = ((width / cell).ceil() as usize + 1).max(2);
    let ny = ((height / cell).ceil() as usize + 1).max(2);
    let mut values = vec![0.0; nx * ny];

    let mut n = 0usize;
    for &(x, y) in points {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 || x > width || y > height {
            continue;
        }
        let gx = x / cell;
        let gy = y / cell;
        let i0 = (gx.floor() as usize).min(nx - 2);
        let j0 = (gy.floor() as usize).min(ny - 2);
        let fx = gx - i0 as f64;
        let fy = gy - j0 as f64;
        values[j0 * nx + i0] += (1.0 - fx) * (1.0 - fy);
        values[j0 * nx + i0 + 1] += fx * (1.0 - fy);
        values[(j0 + 1) * nx + i0] += (1.0 - fx) * fy;
        values[(j0 + 1) * nx + i0 + 1] += fx * fy;
        n += 1;
    }

    let weights = kernel_weights(bandwidth, cell);
    let values = convolve(&values, nx, ny, &weights, true);
    let mut values = convolve(&values, nx, ny, &weights, false);

    if n > 0 {
        let norm = n as f64 * cell * cell;
        values.iter_mut().for_each(|v| *v /= norm);
    }

    DensityGrid { nx, ny, cell, width, height, values }
}

/// `count` levels evenly spaced strictly between `min` and `max`.
pub fn threshold_levels(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !(max > min) || count == 0 {
        return Vec::new();
    }
    let step = (max - min) / (count + 1) as f64;
    (1..=count).map(|k| min + k as f64 * step).collect()
}

/// Grid edge crossed by a contour: horizontal edges run right from node
/// `(i, j)`, vertical edges run down from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Edge {
    H(isize, isize),
    V(isize, isize),
}

#[derive(Clone, Copy)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// Segments for each marching-squares case, corners weighted tl=8 tr=4 br=2 bl=1.
/// Saddles (5 and 10) are resolved by the cell center value.
fn case_segments(case: u8, center_inside: bool) -> &'static [(Side, Side)] {
    use Side::*;
    match case {
        1 => &[(Left, Bottom)],
        2 => &[(Bottom, Right)],
        3 => &[(Left, Right)],
        4 => &[(Top, Right)],
        5 if center_inside => &[(Top, Left), (Bottom, Right)],
        5 => &[(Top, Right), (Left, Bottom)],
        6 => &[(Top, Bottom)],
        7 => &[(Top, Left)],
        8 => &[(Left, Top)],
        9 => &[(Top, Bottom)],
        10 if center_inside => &[(Top, Right), (Left, Bottom)],
        10 => &[(Left, Top), (Bottom, Right)],
        11 => &[(Top, Right)],
        12 => &[(Left, Right)],
        13 => &[(Bottom, Right)],
        14 => &[(Left, Bottom)],
        _ => &[],
    }
}

fn crossing(a: f64, b: f64, level: f64) -> f64 {
    if !a.is_finite() {
        return 1.0;
    }
    if !b.is_finite() {
        return 0.0;
    }
    let d = b - a;
    if d == 0.0 {
        0.5
    } else {
        ((level - a) / d).clamp(0.0, 1.0)
    }
}

impl DensityGrid {
    fn edge_point(&self, edge: Edge, level: f64) -> Point {
        let (i, j, di, dj) = match edge {
            Edge::H(i, j) => (i, j, 1, 0),
            Edge::V(i, j) => (i, j, 0, 1),
        };
        let t = crossing(self.padded(i, j), self.padded(i + di, j + dj), level);
        let x = (i as f64 + t * di as f64) * self.cell;
        let y = (j as f64 + t * dj as f64) * self.cell;
        (x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }
}

/// Closed rings where the density crosses `level`. The first point of each ring
/// is repeated at its end.
pub fn contour_rings(grid: &DensityGrid, level: f64) -> Vec<Vec<Point>> {
    let mut segments: Vec<(Edge, Edge)> = Vec::new();
    for j in -1..grid.ny as isize {
        for i in -1..grid.nx as isize {
            let tl = grid.padded(i, j);
            let tr = grid.padded(i + 1, j);
            let br = grid.padded(i + 1, j + 1);
            let bl = grid.padded(i, j + 1);
            let case = (u8::from(tl >= level) << 3)
                | (u8::from(tr >= level) << 2)
                | (u8::from(br >= level) << 1)
                | u8::from(bl >= level);
            if case == 0 || case == 15 {
                continue;
            }
            let center_inside = (tl + tr + br + bl) / 4.0 >= level;
            let edge = |side: Side| match side {
                Side::Top => Edge::H(i, j),
                Side::Right => Edge::V(i + 1, j),
                Side::Bottom => Edge::H(i, j + 1),
                Side::Left => Edge::V(i, j),
            };
            for &(a, b) in case_segments(case, center_inside) {
                segments.push((edge(a), edge(b)));
            }
        }
    }

    // Each crossed edge is shared by exactly two segments.
    let mut by_edge: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (idx, (a, b)) in segments.iter().enumerate() {
        by_edge.entry(*a).or_default().push(idx);
        by_edge.entry(*b).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();
    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let (start, mut current) = segments[start_idx];
        let mut ring = vec![grid.edge_point(start, level), grid.edge_point(current, level)];

        while current != start {
            let next = by_edge
                .get(&current)
                .and_then(|idxs| idxs.iter().copied().find(|&k| !used[k]));
            let Some(k) = next else { break };
            used[k] = true;
            let (a, b) = segments[k];
            current = if a == current { b } else { a };
            ring.push(grid.edge_point(current, level));
        }

        if current == start && ring.len() >= 4 {
            rings.push(ring);
        }
    }
    rings
}

/// Iso-density rings per level, lowest level first. Levels without rings are dropped.
pub fn contour_density(
    points: &[Point],
    width: f64,
    height: f64,
    bandwidth: f64,
    thresholds: usize,
) -> Vec<(f64, Vec<Vec<Point>>)> {
    let grid = density_grid(points, width, height, bandwidth, CELL_SIZE);
    let Some((min, max)) = grid.extent() else {
        return Vec::new();
    };
    threshold_levels(min, max, thresholds)
        .into_iter()
        .map(|level| (level, contour_rings(&grid, level)))
        .filter(|(_, rings)| !rings.is_empty())
        .collect()
}
