//! APRIL rasterization (§4.3): approximate a polygon or line with two
//! Hilbert-ordered interval lists — ALL (every cell the geometry
//! touches) and FULL (every cell it fully covers) — at a fixed curve
//! order. Lines never produce a FULL list; they have no interior area.

use super::hilbert::{grid_index, xy_to_d};
use super::interval::{normalize, Interval};
use crate::geometry::predicates::{boundary_segments, point_in_ring, Placement};
use crate::geometry::{DataType, Mbr, Shape};

/// The two interval lists an APRIL-backed shape carries, plus the
/// curve order they were rasterized at (§4.3).
#[derive(Debug, Clone)]
pub struct AprilCells {
    pub order: u32,
    pub all: Vec<Interval>,
    pub full: Vec<Interval>,
}

fn cell_rect(dataspace: &Mbr, order: u32, gx: u32, gy: u32) -> Mbr {
    let side = (1u32 << order) as f64;
    let w = dataspace.width() / side;
    let h = dataspace.height() / side;
    let x0 = dataspace.x_min + gx as f64 * w;
    let y0 = dataspace.y_min + gy as f64 * h;
    Mbr::new(x0, y0, x0 + w, y0 + h)
}

fn ring_of(shape: &Shape) -> Vec<(f64, f64)> {
    match shape.data_type {
        DataType::Rectangle => shape.rectangle_ring(),
        _ => shape.vertices.clone(),
    }
}

/// Classify one grid cell against an areal shape: fully covered, only
/// touched, or outside. Full coverage is approximated the way APRIL's
/// rasterizer does it — by sampling the cell's four corners, which is
/// exact for convex cells against any ring whose edges don't clip a
/// corner back in without crossing it (the common case at realistic
/// curve orders).
fn classify_cell(ring: &[(f64, f64)], cell: &Mbr) -> Option<bool> {
    if !cell.overlaps(&Mbr::from_points(ring.iter()).unwrap_or(*cell)) {
        return None;
    }
    let corners = [
        (cell.x_min, cell.y_min),
        (cell.x_max, cell.y_min),
        (cell.x_max, cell.y_max),
        (cell.x_min, cell.y_max),
    ];
    let all_inside = corners
        .iter()
        .all(|&p| !matches!(point_in_ring(ring, p), Placement::Exterior));
    if all_inside {
        return Some(true);
    }
    let any_inside = corners
        .iter()
        .any(|&p| !matches!(point_in_ring(ring, p), Placement::Exterior));
    let cell_edges = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ];

    let touched = any_inside || edges_cross_ring(ring, &cell_edges);
    if touched {
        Some(false)
    } else {
        None
    }
}

fn ring_segments(ring: &[(f64, f64)]) -> Vec<((f64, f64), (f64, f64))> {
    if ring.len() < 2 {
        return Vec::new();
    }
    let mut segs: Vec<_> = ring.windows(2).map(|w| (w[0], w[1])).collect();
    segs.push((ring[ring.len() - 1], ring[0]));
    segs
}

fn edges_cross_ring(ring: &[(f64, f64)], cell_edges: &[((f64, f64), (f64, f64))]) -> bool {
    let ring_segs = ring_segments(ring);
    cell_edges.iter().any(|(c1, c2)| {
        ring_segs
            .iter()
            .any(|(r1, r2)| segments_cross(*c1, *c2, *r1, *r2))
    })
}

fn segments_cross(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> bool {
    fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    }
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Rasterize `shape` against `dataspace` at the given curve `order`.
pub fn rasterize(shape: &Shape, dataspace: &Mbr, order: u32) -> AprilCells {
    let gx0 = grid_index(shape.mbr.x_min, dataspace.x_min, dataspace.x_max, order);
    let gx1 = grid_index(shape.mbr.x_max, dataspace.x_min, dataspace.x_max, order);
    let gy0 = grid_index(shape.mbr.y_min, dataspace.y_min, dataspace.y_max, order);
    let gy1 = grid_index(shape.mbr.y_max, dataspace.y_min, dataspace.y_max, order);

    let mut all_d = Vec::new();
    let mut full_d = Vec::new();

    let areal = matches!(shape.data_type, DataType::Polygon | DataType::Rectangle);
    let ring = ring_of(shape);

    for gx in gx0..=gx1 {
        for gy in gy0..=gy1 {
            let cell = cell_rect(dataspace, order, gx, gy);
            let touched = if areal {
                match classify_cell(&ring, &cell) {
                    Some(true) => {
                        full_d.push(xy_to_d(order, gx, gy));
                        true
                    }
                    Some(false) => true,
                    None => false,
                }
            } else {
                // LineString: touched iff any segment crosses the cell
                // or an endpoint lies within it.
                let segs = boundary_segments(shape);
                let cell_edges = [
                    ((cell.x_min, cell.y_min), (cell.x_max, cell.y_min)),
                    ((cell.x_max, cell.y_min), (cell.x_max, cell.y_max)),
                    ((cell.x_max, cell.y_max), (cell.x_min, cell.y_max)),
                    ((cell.x_min, cell.y_max), (cell.x_min, cell.y_min)),
                ];
                segs.iter().any(|&(a, b)| {
                    cell.contains_point(a.0, a.1)
                        || cell.contains_point(b.0, b.1)
                        || cell_edges.iter().any(|&(c1, c2)| segments_cross(a, b, c1, c2))
                })
            };
            if touched {
                all_d.push(xy_to_d(order, gx, gy));
            }
        }
    }

    AprilCells {
        order,
        all: normalize(all_d.into_iter().map(|d| (d, d)).collect()),
        full: normalize(full_d.into_iter().map(|d| (d, d)).collect()),
    }
}
