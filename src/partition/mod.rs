//! The partitioning grid and distributor (§4.4): assigns geometries to
//! grid cells and streams them to owning workers as [`Batch`]es.

pub mod batch;
pub mod grid;

pub use batch::{Batch, BatchObject};
pub use grid::{Grid, PartitioningMethod};

use crate::error::Status;
use crate::geometry::{mbr::classify, Shape};

/// Assign `shape` to every grid cell its MBR overlaps, recording the
/// (cellId, class) pair on the shape itself (§4.4 Classification).
/// Returns the set of cell ids touched, for batching by owner.
pub fn classify_shape(grid: &Grid, shape: &mut Shape) -> Result<Vec<i32>, Status> {
    let cell_ids = grid.cells_overlapping(&shape.mbr);
    if cell_ids.is_empty() {
        return Err(Status::InvalidPartition(format!(
            "shape {} does not overlap the dataspace",
            shape.id
        )));
    }
    for &cell_id in &cell_ids {
        let cell_mbr = grid.cell_mbr(cell_id);
        let class = classify(&cell_mbr, &shape.mbr)
            .ok_or_else(|| Status::InvalidPartition(format!("cell {cell_id} does not overlap shape {}", shape.id)))?;
        shape.assign_partition(cell_id, class);
    }
    Ok(cell_ids)
}

/// Group a batch of classified shapes by owning worker rank, per the
/// grid's ownership rule, flushing each owner's accumulator whenever
/// it reaches `batch_size` objects (§4.4 Batch, Streaming discipline).
pub fn distribute(
    grid: &Grid,
    world_size: u32,
    shapes: &[Shape],
    batch_size: usize,
) -> Vec<(u32, Vec<Batch>)> {
    use std::collections::HashMap;

    let mut per_worker: HashMap<u32, Vec<BatchObject>> = HashMap::new();
    for shape in shapes {
        let mut owners: Vec<u32> = shape
            .partitions
            .iter()
            .map(|&(cell_id, _)| grid.owner(cell_id, world_size))
            .collect();
        owners.sort_unstable();
        owners.dedup();
        let obj = BatchObject::from_shape(shape);
        for owner in owners {
            per_worker.entry(owner).or_default().push(obj.clone());
        }
    }

    let data_type = shapes.first().map(|s| s.data_type);
    let mut out = Vec::with_capacity(per_worker.len());
    for (owner, objects) in per_worker {
        let Some(data_type) = data_type else { continue };
        let mut batches: Vec<Batch> = objects
            .chunks(batch_size.max(1))
            .map(|chunk| Batch::new(data_type, chunk.to_vec()))
            .collect();
        batches.push(Batch::end_of_stream(data_type));
        out.push((owner, batches));
    }
    out
}
