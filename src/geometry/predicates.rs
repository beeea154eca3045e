//! Exact geometric predicate evaluation — the "refinement" arbiter of
//! §4.5 and the DE-9IM-flavoured mask of §4.6, implemented directly
//! (the production system defers this to an external library; this
//! crate provides the real thing since no such binding is available).

use super::{DataType, Shape};
use crate::error::Status;

const EPS: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPS
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    if cross(a, b, p).abs() > EPS {
        return false;
    }
    p.0 >= a.0.min(b.0) - EPS
        && p.0 <= a.0.max(b.0) + EPS
        && p.1 >= a.1.min(b.1) - EPS
        && p.1 <= a.1.max(b.1) + EPS
}

/// Returns `(intersect, proper)`: `proper` means the segments cross in
/// each other's interior, as opposed to merely touching at an endpoint
/// or being collinear-overlapping.
fn segments_intersect(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> (bool, bool) {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > EPS && d2 < -EPS) || (d1 < -EPS && d2 > EPS))
        && ((d3 > EPS && d4 < -EPS) || (d3 < -EPS && d4 > EPS))
    {
        return (true, true);
    }

    if on_segment(p1, q1, q2) || on_segment(p2, q1, q2) || on_segment(q1, p1, p2) || on_segment(q2, p1, p2) {
        return (true, false);
    }

    (false, false)
}

/// The placement of a point relative to a shape, used as the
/// fundamental containment primitive for every areal predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Interior,
    Boundary,
    Exterior,
}

/// Ring/path segments used by both boundary-intersection tests and
/// rasterization (§4.3 uses the same ring to classify full vs partial
/// Hilbert cells).
pub fn boundary_segments(shape: &Shape) -> Vec<((f64, f64), (f64, f64))> {
    match shape.data_type {
        DataType::Point => Vec::new(),
        DataType::LineString => shape.vertices.windows(2).map(|w| (w[0], w[1])).collect(),
        DataType::Rectangle => {
            let ring = shape.rectangle_ring();
            ring_segments(&ring)
        }
        DataType::Polygon => ring_segments(&shape.vertices),
    }
}

fn ring_segments(ring: &[(f64, f64)]) -> Vec<((f64, f64), (f64, f64))> {
    if ring.len() < 2 {
        return Vec::new();
    }
    let mut segs: Vec<_> = ring.windows(2).map(|w| (w[0], w[1])).collect();
    let first = ring[0];
    let last = ring[ring.len() - 1];
    if !approx_eq(first.0, last.0) || !approx_eq(first.1, last.1) {
        segs.push((last, first));
    }
    segs
}

/// Ray-casting point-in-polygon test with boundary detection.
pub fn point_in_ring(ring: &[(f64, f64)], p: (f64, f64)) -> Placement {
    let segs = ring_segments(ring);
    for (a, b) in &segs {
        if on_segment(p, *a, *b) {
            return Placement::Boundary;
        }
    }
    let mut inside = false;
    for (a, b) in &segs {
        let (x, y) = p;
        let (x1, y1) = *a;
        let (x2, y2) = *b;
        if (y1 > y) != (y2 > y) {
            let x_intersect = x1 + (y - y1) / (y2 - y1) * (x2 - x1);
            if x < x_intersect {
                inside = !inside;
            }
        }
    }
    if inside {
        Placement::Interior
    } else {
        Placement::Exterior
    }
}

/// Place a point relative to any shape variant.
pub fn place_point(shape: &Shape, p: (f64, f64)) -> Placement {
    match shape.data_type {
        DataType::Point => {
            let q = shape.vertices[0];
            if approx_eq(p.0, q.0) && approx_eq(p.1, q.1) {
                Placement::Interior
            } else {
                Placement::Exterior
            }
        }
        DataType::LineString => {
            for (a, b) in boundary_segments(shape) {
                if on_segment(p, a, b) {
                    let is_endpoint = (approx_eq(p.0, shape.vertices[0].0) && approx_eq(p.1, shape.vertices[0].1))
                        || (approx_eq(p.0, shape.vertices[shape.vertices.len() - 1].0)
                            && approx_eq(p.1, shape.vertices[shape.vertices.len() - 1].1));
                    return if is_endpoint {
                        Placement::Boundary
                    } else {
                        Placement::Interior
                    };
                }
            }
            Placement::Exterior
        }
        DataType::Rectangle => point_in_ring(&shape.rectangle_ring(), p),
        DataType::Polygon => point_in_ring(&shape.vertices, p),
    }
}

fn is_areal(dt: DataType) -> bool {
    matches!(dt, DataType::Rectangle | DataType::Polygon)
}

/// The DE-9IM-flavoured relationship mask between two shapes (§4.6).
///
/// This is not the literal 3x3 intersection-pattern matrix; it
/// aggregates the booleans every binary predicate in this crate
/// actually needs, computed once so `intersects`, `covers`, `meet`,
/// etc. all share the same underlying geometric work.
#[derive(Debug, Clone, Copy)]
pub struct Mask {
    pub disjoint: bool,
    pub equal: bool,
    pub touches: bool,
    pub a_covers_b: bool,
    pub b_covers_a: bool,
    pub a_contains_b: bool,
    pub b_contains_a: bool,
}

fn shapes_equal(a: &Shape, b: &Shape) -> bool {
    if a.data_type != b.data_type {
        return false;
    }
    let va = if a.data_type == DataType::Rectangle {
        a.rectangle_ring()
    } else {
        a.vertices.clone()
    };
    let vb = if b.data_type == DataType::Rectangle {
        b.rectangle_ring()
    } else {
        b.vertices.clone()
    };
    if va.len() != vb.len() {
        return false;
    }
    va.iter().all(|p| vb.iter().any(|q| approx_eq(p.0, q.0) && approx_eq(p.1, q.1)))
        && vb.iter().all(|p| va.iter().any(|q| approx_eq(p.0, q.0) && approx_eq(p.1, q.1)))
}

fn all_vertices_covered_by(target: &Shape, container: &Shape) -> bool {
    let verts = if target.data_type == DataType::Rectangle {
        target.rectangle_ring()
    } else {
        target.vertices.clone()
    };
    verts
        .iter()
        .all(|&p| !matches!(place_point(container, p), Placement::Exterior))
}

/// Compute the full relationship mask between `a` and `b`. Both MBRs
/// must already be known to overlap (callers are expected to have
/// passed the MBR filter first); this function still behaves
/// correctly if they don't (it will simply report `disjoint`).
pub fn relate(a: &Shape, b: &Shape) -> Mask {
    if shapes_equal(a, b) {
        return Mask {
            disjoint: false,
            equal: true,
            touches: false,
            a_covers_b: true,
            b_covers_a: true,
            a_contains_b: false,
            b_contains_a: false,
        };
    }

    let segs_a = boundary_segments(a);
    let segs_b = boundary_segments(b);

    let mut boundary_touch = false;
    let mut interior_cross = false;
    for (p1, p2) in &segs_a {
        for (q1, q2) in &segs_b {
            let (hit, proper) = segments_intersect(*p1, *p2, *q1, *q2);
            if hit {
                boundary_touch = true;
            }
            if proper {
                interior_cross = true;
            }
        }
    }

    let verts_a: Vec<(f64, f64)> = if a.data_type == DataType::Rectangle {
        a.rectangle_ring()
    } else if a.data_type == DataType::Point {
        vec![a.vertices[0]]
    } else {
        a.vertices.clone()
    };
    let verts_b: Vec<(f64, f64)> = if b.data_type == DataType::Rectangle {
        b.rectangle_ring()
    } else if b.data_type == DataType::Point {
        vec![b.vertices[0]]
    } else {
        b.vertices.clone()
    };

    let any_a_in_b_interior = verts_a.iter().any(|&p| place_point(b, p) == Placement::Interior);
    let any_b_in_a_interior = verts_b.iter().any(|&p| place_point(a, p) == Placement::Interior);

    let a_covers_b = all_vertices_covered_by(b, a);
    let b_covers_a = all_vertices_covered_by(a, b);

    let a_contains_b = a_covers_b && !any_b_touches_a_boundary(b, a);
    let b_contains_a = b_covers_a && !any_b_touches_a_boundary(a, b);

    let disjoint = !boundary_touch && !any_a_in_b_interior && !any_b_in_a_interior && !a_covers_b && !b_covers_a;

    let interior_overlap = interior_cross || any_a_in_b_interior || any_b_in_a_interior;
    let touches = !disjoint && boundary_touch && !interior_overlap && !a_contains_b && !b_contains_a;

    Mask {
        disjoint,
        equal: false,
        touches,
        a_covers_b,
        b_covers_a,
        a_contains_b,
        b_contains_a,
    }
}

fn any_b_touches_a_boundary(b: &Shape, a: &Shape) -> bool {
    let verts_b: Vec<(f64, f64)> = if b.data_type == DataType::Rectangle {
        b.rectangle_ring()
    } else if b.data_type == DataType::Point {
        vec![b.vertices[0]]
    } else {
        b.vertices.clone()
    };
    verts_b.iter().any(|&p| place_point(a, p) == Placement::Boundary)
        || (!boundary_segments(a).is_empty()
            && !boundary_segments(b).is_empty()
            && boundary_segments(a).iter().any(|(p1, p2)| {
                boundary_segments(b)
                    .iter()
                    .any(|(q1, q2)| segments_intersect(*p1, *p2, *q1, *q2).0)
            }))
}

/// The discriminated set of binary predicates (§3 Query, §4.3 decision
/// tables). `Distance` and `FindRelation` are handled outside this
/// boolean-valued function (see [`crate::query::types`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Intersects,
    Disjoint,
    Inside,
    Contains,
    Covers,
    CoveredBy,
    Meet,
    Equal,
}

/// Evaluate `predicate` between `a` (R) and `b` (S). Returns
/// `UnsupportedCombination` for variant pairs that don't admit the
/// predicate rather than silently defaulting (§4.6).
pub fn evaluate(a: &Shape, b: &Shape, predicate: Predicate) -> Result<bool, Status> {
    match predicate {
        Predicate::Intersects | Predicate::Disjoint | Predicate::Equal | Predicate::Meet => {}
        Predicate::Inside | Predicate::CoveredBy => {
            if !is_areal(b.data_type) && !(a.data_type == DataType::Point && b.data_type == DataType::LineString) {
                return Err(Status::UnsupportedCombination(format!(
                    "{:?} cannot contain {:?}",
                    b.data_type, a.data_type
                )));
            }
        }
        Predicate::Contains | Predicate::Covers => {
            if !is_areal(a.data_type) && !(b.data_type == DataType::Point && a.data_type == DataType::LineString) {
                return Err(Status::UnsupportedCombination(format!(
                    "{:?} cannot contain {:?}",
                    a.data_type, b.data_type
                )));
            }
        }
    }

    let mask = relate(a, b);
    Ok(match predicate {
        Predicate::Intersects => !mask.disjoint,
        Predicate::Disjoint => mask.disjoint,
        Predicate::Equal => mask.equal,
        Predicate::Meet => mask.touches,
        Predicate::Covers => mask.equal || mask.a_covers_b,
        Predicate::CoveredBy => mask.equal || mask.b_covers_a,
        Predicate::Contains => mask.equal || mask.a_contains_b,
        Predicate::Inside => mask.equal || mask.b_contains_a,
    })
}
