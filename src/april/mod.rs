//! APRIL: the rasterized interval-list intermediate filter (§4.3).
//! Every APRIL-eligible shape (polygons and lines, per
//! [`crate::geometry::DataType::supports_april`]) is rasterized once
//! against the dataset's dataspace into an ALL/FULL pair of Hilbert
//! interval lists; candidate pairs are classified against those lists
//! before ever touching the original vertices.

pub mod filter;
pub mod hilbert;
pub mod interval;
pub mod raster;

pub use filter::{classify, Verdict};
pub use raster::{rasterize, AprilCells};

use std::collections::HashMap;

use crate::error::Status;
use crate::geometry::{Mbr, Predicate, Shape};

/// The minimum and maximum curve order the configuration accepts
/// (§4.8 Ambient Configuration).
pub const MIN_ORDER: u32 = 10;
pub const MAX_ORDER: u32 = 16;

/// Per-dataset APRIL store: every object id that supports rasterization
/// maps to its cell lists, all computed against one shared dataspace.
#[derive(Debug, Default)]
pub struct AprilIndex {
    pub order: u32,
    cells: HashMap<u64, AprilCells>,
}

impl AprilIndex {
    /// create-APRIL: rasterize every eligible shape in `shapes` against
    /// `dataspace` at curve `order` (§4.3, §6 APRIL_CREATE).
    pub fn build(shapes: &[Shape], dataspace: &Mbr, order: u32) -> Result<Self, Status> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
            return Err(Status::AprilCreateFailed(format!(
                "curve order {order} out of range [{MIN_ORDER}, {MAX_ORDER}]"
            )));
        }
        let mut cells = HashMap::with_capacity(shapes.len());
        for shape in shapes {
            if !shape.data_type.supports_april() {
                continue;
            }
            cells.insert(shape.id, rasterize(shape, dataspace, order));
        }
        Ok(AprilIndex { order, cells })
    }

    pub fn get(&self, object_id: u64) -> Option<&AprilCells> {
        self.cells.get(&object_id)
    }

    pub fn contains(&self, object_id: u64) -> bool {
        self.cells.contains_key(&object_id)
    }
}

/// Consult the APRIL filter for one candidate pair, returning `None`
/// when either side has no cell lists (APRIL doesn't apply and the
/// caller should fall straight through to refinement).
pub fn classify_pair(
    index_a: &AprilIndex,
    id_a: u64,
    index_b: &AprilIndex,
    id_b: u64,
    predicate: Predicate,
) -> Option<Verdict> {
    let a = index_a.get(id_a)?;
    let b = index_b.get(id_b)?;
    Some(classify(a, b, predicate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DataType;

    fn square(id: u64, x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        let mut s = Shape::new_empty(id, DataType::Polygon);
        s.append_vertex(x0, y0);
        s.append_vertex(x1, y0);
        s.append_vertex(x1, y1);
        s.append_vertex(x0, y1);
        s.compute_mbr().unwrap();
        s
    }

    #[test]
    fn rejects_out_of_range_order() {
        let dataspace = Mbr::new(0.0, 0.0, 10.0, 10.0);
        let shapes = vec![square(1, 1.0, 1.0, 2.0, 2.0)];
        assert!(matches!(
            AprilIndex::build(&shapes, &dataspace, 4),
            Err(Status::AprilCreateFailed(_))
        ));
    }

    #[test]
    fn points_are_skipped() {
        let dataspace = Mbr::new(0.0, 0.0, 10.0, 10.0);
        let mut point = Shape::new_empty(1, DataType::Point);
        point.append_vertex(1.0, 1.0);
        point.compute_mbr().unwrap();
        let idx = AprilIndex::build(&[point], &dataspace, 10).unwrap();
        assert!(!idx.contains(1));
    }
}
