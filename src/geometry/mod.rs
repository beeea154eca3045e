//! The Shape abstraction (§4.6): a discriminated union over four
//! geometry variants, exposing construction, MBR computation and the
//! binary predicate suite.

pub mod mbr;
pub mod predicates;
pub mod wkt;

pub use mbr::{Class, Mbr, MbrRelation};
pub use predicates::{Mask, Placement, Predicate};

use crate::error::Status;

/// The four geometry variants the system understands (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Point,
    LineString,
    Rectangle,
    Polygon,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Point => "point",
            DataType::LineString => "line",
            DataType::Rectangle => "rectangle",
            DataType::Polygon => "polygon",
        }
    }

    /// Whether APRIL generation applies to this type (§3 Lifecycles:
    /// "when the dataset type admits it: polygons and lines").
    pub fn supports_april(&self) -> bool {
        matches!(self, DataType::Polygon | DataType::LineString)
    }
}

/// A geometry record: an opaque id, its variant, vertices, MBR, and
/// the partition assignments produced by the partitioning engine (§3).
#[derive(Debug, Clone)]
pub struct Shape {
    pub id: u64,
    pub data_type: DataType,
    pub vertices: Vec<(f64, f64)>,
    pub mbr: Mbr,
    /// Non-empty iff this shape has been through the partitioning
    /// engine; each partition id appears at most once (§3 invariant).
    pub partitions: Vec<(i32, Class)>,
}

impl Shape {
    /// construct-empty-of-type (§4.6).
    pub fn new_empty(id: u64, data_type: DataType) -> Self {
        Shape {
            id,
            data_type,
            vertices: Vec::new(),
            mbr: Mbr::new(0.0, 0.0, 0.0, 0.0),
            partitions: Vec::new(),
        }
    }

    /// append-vertex (§4.6). The MBR is not kept incrementally
    /// up to date; call [`Shape::compute_mbr`] once all vertices are
    /// appended.
    pub fn append_vertex(&mut self, x: f64, y: f64) {
        self.vertices.push((x, y));
    }

    /// compute-MBR-from-envelope (§4.6).
    pub fn compute_mbr(&mut self) -> Result<(), Status> {
        if self.vertices.is_empty() {
            return Err(Status::InvalidGeometry);
        }
        self.mbr = Mbr::from_points(&self.vertices).ok_or(Status::InvalidGeometry)?;
        Ok(())
    }

    /// serialise-vertices (§4.6): the flat `(x, y)` pair sequence, the
    /// exact payload the Batch wire format writes per object.
    pub fn serialize_vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    /// Rectangles are stored as two corners (min, max); this expands
    /// them to the four-vertex ring the predicate/raster code needs.
    pub fn rectangle_ring(&self) -> Vec<(f64, f64)> {
        debug_assert_eq!(self.data_type, DataType::Rectangle);
        if self.vertices.len() >= 4 {
            return self.vertices.clone();
        }
        let (x0, y0) = self.vertices[0];
        let (x1, y1) = self.vertices.get(1).copied().unwrap_or((x0, y0));
        vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
    }

    /// set-from-well-known-text (§4.6).
    pub fn from_wkt(id: u64, text: &str) -> Result<Shape, Status> {
        wkt::parse(id, text)
    }

    /// DE-9IM mask vs another shape (§4.6).
    pub fn mask(&self, other: &Shape) -> Mask {
        predicates::relate(self, other)
    }

    pub fn evaluate(&self, other: &Shape, predicate: Predicate) -> Result<bool, Status> {
        predicates::evaluate(self, other, predicate)
    }

    /// Register this shape's assignment to a partition cell, enforcing
    /// the "each partitionId appears at most once" invariant (§3).
    pub fn assign_partition(&mut self, cell_id: i32, class: Class) {
        if let Some(existing) = self.partitions.iter_mut().find(|(c, _)| *c == cell_id) {
            existing.1 = class;
        } else {
            self.partitions.push((cell_id, class));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(id: u64, pts: &[(f64, f64)]) -> Shape {
        let mut s = Shape::new_empty(id, DataType::Polygon);
        for &(x, y) in pts {
            s.append_vertex(x, y);
        }
        s.compute_mbr().unwrap();
        s
    }

    #[test]
    fn unit_squares_intersect() {
        let a = poly(1, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let b = poly(2, &[(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)]);
        assert!(a.evaluate(&b, Predicate::Intersects).unwrap());
        assert!(!a.evaluate(&b, Predicate::Disjoint).unwrap());
    }

    #[test]
    fn rectangle_inside() {
        let outer = {
            let mut s = Shape::new_empty(1, DataType::Rectangle);
            s.append_vertex(1.0, 1.0);
            s.append_vertex(11.0, 11.0);
            s.compute_mbr().unwrap();
            s
        };
        let inner = {
            let mut s = Shape::new_empty(2, DataType::Rectangle);
            s.append_vertex(0.0, 0.0);
            s.append_vertex(2.0, 2.0);
            s.compute_mbr().unwrap();
            s
        };
        assert!(inner.evaluate(&outer, Predicate::Inside).unwrap());
        assert!(outer.evaluate(&inner, Predicate::Contains).unwrap());
    }

    #[test]
    fn unsupported_combination_errors() {
        let a = {
            let mut s = Shape::new_empty(1, DataType::Point);
            s.append_vertex(0.0, 0.0);
            s.compute_mbr().unwrap();
            s
        };
        let b = {
            let mut s = Shape::new_empty(2, DataType::Point);
            s.append_vertex(1.0, 1.0);
            s.compute_mbr().unwrap();
            s
        };
        assert!(matches!(
            a.evaluate(&b, Predicate::Contains),
            Err(Status::UnsupportedCombination(_))
        ));
    }

    #[test]
    fn assign_partition_is_idempotent_per_cell() {
        let mut s = poly(1, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        s.assign_partition(4, Class::A);
        s.assign_partition(4, Class::B);
        assert_eq!(s.partitions, vec![(4, Class::B)]);
    }
}
