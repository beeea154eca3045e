//! The two-layer index (§4.2): per-partition buckets of shape
//! references split by class, sorted for the plane sweep after build.

use std::collections::HashMap;

use crate::geometry::{Class, Shape};

/// One partition cell's four class buckets. Stores indices into the
/// owning [`crate::dataset::Dataset`]'s shape arena rather than shape
/// values or pointers (§9 "Object identity & cross-references").
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub id: i32,
    pub a: Vec<usize>,
    pub b: Vec<usize>,
    pub c: Vec<usize>,
    pub d: Vec<usize>,
    sorted: bool,
}

impl Partition {
    pub fn new(id: i32) -> Self {
        Partition {
            id,
            ..Default::default()
        }
    }

    pub fn push(&mut self, class: Class, shape_idx: usize) {
        match class {
            Class::A => self.a.push(shape_idx),
            Class::B => self.b.push(shape_idx),
            Class::C => self.c.push(shape_idx),
            Class::D => self.d.push(shape_idx),
        }
        self.sorted = false;
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }
}

/// Per-dataset index: partitions keyed by partition id, plus the
/// shape arena each partition's buckets index into.
#[derive(Debug, Default)]
pub struct TwoLayerIndex {
    pub partitions: HashMap<i32, Partition>,
}

impl TwoLayerIndex {
    pub fn new() -> Self {
        TwoLayerIndex::default()
    }

    pub fn insert(&mut self, cell_id: i32, class: Class, shape_idx: usize) {
        self.partitions
            .entry(cell_id)
            .or_insert_with(|| Partition::new(cell_id))
            .push(class, shape_idx);
    }

    /// build-index: sort classes A and C ascending by MBR.yMin inside
    /// every partition (§3 Partition invariant, §4.2).
    pub fn build(&mut self, shapes: &[Shape]) {
        for part in self.partitions.values_mut() {
            part.a.sort_by(|&i, &j| {
                shapes[i]
                    .mbr
                    .y_min
                    .partial_cmp(&shapes[j].mbr.y_min)
                    .unwrap()
            });
            part.c.sort_by(|&i, &j| {
                shapes[i]
                    .mbr
                    .y_min
                    .partial_cmp(&shapes[j].mbr.y_min)
                    .unwrap()
            });
            part.sorted = true;
        }
    }

    pub fn partition(&self, id: i32) -> Option<&Partition> {
        self.partitions.get(&id)
    }

    pub fn partition_ids(&self) -> impl Iterator<Item = &i32> {
        self.partitions.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DataType;

    fn shape_with_mbr(id: u64, y_min: f64) -> Shape {
        let mut s = Shape::new_empty(id, DataType::Point);
        s.append_vertex(0.0, y_min);
        s.compute_mbr().unwrap();
        s
    }

    #[test]
    fn build_sorts_a_and_c_by_ymin() {
        let shapes = vec![
            shape_with_mbr(0, 3.0),
            shape_with_mbr(1, 1.0),
            shape_with_mbr(2, 2.0),
        ];
        let mut idx = TwoLayerIndex::new();
        idx.insert(0, Class::A, 0);
        idx.insert(0, Class::A, 1);
        idx.insert(0, Class::A, 2);
        idx.build(&shapes);
        let part = idx.partition(0).unwrap();
        assert_eq!(part.a, vec![1, 2, 0]);
        assert!(part.is_sorted());
    }
}
