//! Dataset lifecycle (§3 Dataset/Section/Lifecycles): prepare, ingest
//! (partition or load), build-index, query, unload.

use std::collections::HashMap;

use tracing::{info, instrument};

use crate::april::{AprilIndex, MAX_ORDER, MIN_ORDER};
use crate::error::Status;
use crate::geometry::{DataType, Mbr, Shape};
use crate::index::TwoLayerIndex;
use crate::partition::{classify_shape, Grid};

/// How a dataset's on-disk representation is encoded (§6 prepareDataset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Wkt,
    Csv,
    Binary,
}

/// Hilbert curve order, compression, and section count for APRIL
/// generation (§3 AprilConfig). Only uncompressed, single-section
/// datasets are implemented (§4.3 Sections, §9 Open question).
#[derive(Debug, Clone, Copy)]
pub struct AprilConfig {
    pub order: u32,
    pub compression: bool,
    pub sections: u32,
}

impl AprilConfig {
    pub fn new(order: u32) -> Result<Self, Status> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
            return Err(Status::ConfigInvalidValue {
                key: "april.N".into(),
                reason: format!("must be in [{MIN_ORDER}, {MAX_ORDER}]"),
            });
        }
        Ok(AprilConfig {
            order,
            compression: false,
            sections: 1,
        })
    }
}

impl Default for AprilConfig {
    fn default() -> Self {
        AprilConfig::new(16).expect("16 is within [MIN_ORDER, MAX_ORDER]")
    }
}

/// A rectangular sub-region of the dataspace APRIL generation is
/// scoped to. The current design implements only `sectionId = 0`
/// (§4.3 Sections, §9 Open question — sections).
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub id: u32,
    pub i: u32,
    pub j: u32,
    pub bounds: Mbr,
}

impl Section {
    pub fn whole_dataspace(bounds: Mbr) -> Self {
        Section { id: 0, i: 0, j: 0, bounds }
    }
}

/// A loaded dataset: its geometry arena, two-layer index, and (when
/// the type admits it) its APRIL cell lists.
pub struct Dataset {
    pub internal_id: u64,
    pub nickname: String,
    pub data_type: DataType,
    pub file_type: FileType,
    pub path: String,
    pub dataspace: Mbr,
    pub shapes: Vec<Shape>,
    id_to_index: HashMap<u64, usize>,
    pub index: TwoLayerIndex,
    pub april: Option<AprilIndex>,
    pub april_config: AprilConfig,
    pub sections: Vec<Section>,
}

impl Dataset {
    /// prepareDataset (§6): allocate an empty dataset shell. Geometry
    /// is populated afterwards by [`Dataset::partition`] or
    /// [`Dataset::load`].
    pub fn prepare(
        internal_id: u64,
        nickname: impl Into<String>,
        data_type: DataType,
        file_type: FileType,
        path: impl Into<String>,
        dataspace: Mbr,
    ) -> Self {
        Dataset {
            internal_id,
            nickname: nickname.into(),
            data_type,
            file_type,
            path: path.into(),
            dataspace,
            shapes: Vec::new(),
            id_to_index: HashMap::new(),
            index: TwoLayerIndex::new(),
            april: None,
            april_config: AprilConfig::default(),
            sections: Vec::new(),
        }
    }

    pub fn total_objects(&self) -> usize {
        self.shapes.len()
    }

    pub fn shape_by_id(&self, object_id: u64) -> Option<&Shape> {
        self.id_to_index.get(&object_id).map(|&i| &self.shapes[i])
    }

    /// partition (§4.4 Classification): classify every incoming shape
    /// against `grid` and absorb it into this dataset's arena and
    /// two-layer index. This realizes the Agent-side half of the
    /// distributed ingest; the Host/distributor side is
    /// [`crate::partition::distribute`].
    #[instrument(skip(self, grid, incoming), fields(dataset = self.internal_id, count = incoming.len()))]
    pub fn partition(&mut self, grid: &Grid, mut incoming: Vec<Shape>) -> Result<(), Status> {
        for mut shape in incoming.drain(..) {
            classify_shape(grid, &mut shape)?;
            let idx = self.shapes.len();
            self.id_to_index.insert(shape.id, idx);
            for &(cell_id, class) in &shape.partitions {
                self.index.insert(cell_id, class, idx);
            }
            self.shapes.push(shape);
        }
        info!(dataset = self.internal_id, total = self.shapes.len(), "partition complete");
        Ok(())
    }

    /// load (§6): ingest already-partitioned shapes from a persisted
    /// representation without reclassifying them (their `partitions`
    /// field is assumed authoritative).
    pub fn load(&mut self, shapes: Vec<Shape>) -> Result<(), Status> {
        for shape in shapes {
            if shape.partitions.is_empty() {
                return Err(Status::InvalidPartition(format!(
                    "shape {} has no partition assignment; use partition() instead",
                    shape.id
                )));
            }
            let idx = self.shapes.len();
            self.id_to_index.insert(shape.id, idx);
            for &(cell_id, class) in &shape.partitions {
                self.index.insert(cell_id, class, idx);
            }
            self.shapes.push(shape);
        }
        Ok(())
    }

    /// build-index (§3 Lifecycles, §4.2, §4.3): sort A/C buckets and,
    /// when the data type admits it, rasterize every shape for APRIL.
    #[instrument(skip(self), fields(dataset = self.internal_id))]
    pub fn build_index(&mut self) -> Result<(), Status> {
        self.index.build(&self.shapes);
        self.sections = vec![Section::whole_dataspace(self.dataspace)];
        if self.data_type.supports_april() {
            self.april = Some(AprilIndex::build(&self.shapes, &self.dataspace, self.april_config.order)?);
        }
        info!(dataset = self.internal_id, "build-index complete");
        Ok(())
    }

    /// unload (§3 Lifecycles): release this dataset's geometry and
    /// indices. The `Dataset` itself is dropped by its owner afterward.
    pub fn unload(&mut self) {
        self.shapes.clear();
        self.id_to_index.clear();
        self.index = TwoLayerIndex::new();
        self.april = None;
        self.sections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::PartitioningMethod;

    fn grid() -> Grid {
        Grid::new(Mbr::new(0.0, 0.0, 10.0, 10.0), PartitioningMethod::RoundRobin, 2, 1).unwrap()
    }

    fn point(id: u64, x: f64, y: f64) -> Shape {
        let mut s = Shape::new_empty(id, DataType::Point);
        s.append_vertex(x, y);
        s.compute_mbr().unwrap();
        s
    }

    #[test]
    fn partition_then_build_index_populates_buckets() {
        let mut ds = Dataset::prepare(0, "pts", DataType::Point, FileType::Wkt, "", Mbr::new(0.0, 0.0, 10.0, 10.0));
        ds.partition(&grid(), vec![point(1, 1.0, 1.0), point(2, 9.0, 9.0)]).unwrap();
        ds.build_index().unwrap();
        assert_eq!(ds.total_objects(), 2);
        assert!(ds.april.is_none()); // points don't support APRIL
    }

    #[test]
    fn empty_dataset_builds_index_successfully() {
        let mut ds = Dataset::prepare(0, "empty", DataType::Polygon, FileType::Wkt, "", Mbr::new(0.0, 0.0, 1.0, 1.0));
        ds.build_index().unwrap();
        assert_eq!(ds.total_objects(), 0);
        assert!(ds.april.is_some());
    }

    #[test]
    fn unload_clears_all_state() {
        let mut ds = Dataset::prepare(0, "pts", DataType::Point, FileType::Wkt, "", Mbr::new(0.0, 0.0, 10.0, 10.0));
        ds.partition(&grid(), vec![point(1, 1.0, 1.0)]).unwrap();
        ds.build_index().unwrap();
        ds.unload();
        assert_eq!(ds.total_objects(), 0);
        assert!(ds.shape_by_id(1).is_none());
    }
}
