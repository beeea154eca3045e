//! The partitioning grid (§4.4): a uniform tiling of the dataspace
//! used to assign worker ownership (distribution grid) and, for the
//! two-grid method, a finer tiling used for two-layer bucketing inside
//! an owner.

use crate::error::Status;
use crate::geometry::Mbr;

/// One of the two grid schemes a dataset can be partitioned with (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitioningMethod {
    RoundRobin,
    TwoGrid,
}

/// `[FULL] Open question — two-grid round-robin mapping` (§9): this
/// crate adopts the flattened-global-id convention. A two-grid cell's
/// id is computed over the combined `distPPD * partPPD` grid directly
/// (the same formula the round-robin method uses over its single
/// grid), never as a separate (distribution id, local fine id) pair.
/// Ownership for the two-grid method is then derived by dividing the
/// flattened coordinates back down to the distribution cell they fall
/// in. This keeps one cell-id space end to end, which is what gets
/// persisted in the Batch wire format (§6) and in `Shape::partitions`.
#[derive(Debug, Clone)]
pub struct Grid {
    pub dataspace: Mbr,
    pub method: PartitioningMethod,
    pub dist_ppd: u32,
    pub part_ppd: u32,
}

impl Grid {
    pub fn new(
        dataspace: Mbr,
        method: PartitioningMethod,
        dist_ppd: u32,
        part_ppd: u32,
    ) -> Result<Self, Status> {
        if dist_ppd == 0 {
            return Err(Status::ConfigInvalidValue {
                key: "partitioning.distPPD".into(),
                reason: "must be positive".into(),
            });
        }
        if method == PartitioningMethod::TwoGrid && part_ppd == 0 {
            return Err(Status::ConfigInvalidValue {
                key: "partitioning.partPPD".into(),
                reason: "must be positive for TWO_GRID".into(),
            });
        }
        Ok(Grid {
            dataspace,
            method,
            dist_ppd,
            part_ppd,
        })
    }

    /// The side length of the grid actually used for two-layer
    /// partition ids: `distPPD` for round-robin, `distPPD * partPPD`
    /// for two-grid.
    pub fn effective_ppd(&self) -> u32 {
        match self.method {
            PartitioningMethod::RoundRobin => self.dist_ppd,
            PartitioningMethod::TwoGrid => self.dist_ppd * self.part_ppd,
        }
    }

    fn axis_index(&self, value: f64, lo: f64, hi: f64, ppd: u32) -> u32 {
        if hi <= lo {
            return 0;
        }
        let t = (value - lo) / (hi - lo);
        let idx = (t * ppd as f64) as i64;
        idx.clamp(0, ppd as i64 - 1) as u32
    }

    pub fn cell_indices(&self, x: f64, y: f64) -> (u32, u32) {
        let ppd = self.effective_ppd();
        let i = self.axis_index(x, self.dataspace.x_min, self.dataspace.x_max, ppd);
        let j = self.axis_index(y, self.dataspace.y_min, self.dataspace.y_max, ppd);
        (i, j)
    }

    /// `j * dPPD + i` (or the two-grid flattened equivalent), per §4.4.
    pub fn cell_id(&self, i: u32, j: u32) -> i32 {
        (j * self.effective_ppd() + i) as i32
    }

    pub fn cell_mbr(&self, cell_id: i32) -> Mbr {
        let ppd = self.effective_ppd();
        let i = (cell_id as u32) % ppd;
        let j = (cell_id as u32) / ppd;
        let w = self.dataspace.width() / ppd as f64;
        let h = self.dataspace.height() / ppd as f64;
        let x0 = self.dataspace.x_min + i as f64 * w;
        let y0 = self.dataspace.y_min + j as f64 * h;
        Mbr::new(x0, y0, x0 + w, y0 + h)
    }

    /// Every cell id whose rectangle overlaps `mbr` (§4.4 "for each
    /// object, compute which cells its MBR intersects").
    pub fn cells_overlapping(&self, mbr: &Mbr) -> Vec<i32> {
        let ppd = self.effective_ppd();
        let (i0, j0) = self.cell_indices(mbr.x_min, mbr.y_min);
        let (i1, j1) = self.cell_indices(mbr.x_max, mbr.y_max);
        let mut ids = Vec::new();
        for j in j0..=j1.min(ppd - 1) {
            for i in i0..=i1.min(ppd - 1) {
                ids.push(self.cell_id(i, j));
            }
        }
        ids
    }

    /// `ownerRank = cellId mod worldSize` (§3), adjusted for two-grid's
    /// flattened id by dividing back to the owning distribution cell.
    pub fn owner(&self, cell_id: i32, world_size: u32) -> u32 {
        match self.method {
            PartitioningMethod::RoundRobin => (cell_id as u32) % world_size,
            PartitioningMethod::TwoGrid => {
                let ppd = self.effective_ppd();
                let i = (cell_id as u32) % ppd;
                let j = (cell_id as u32) / ppd;
                let di = i / self.part_ppd;
                let dj = j / self.part_ppd;
                let dist_id = dj * self.dist_ppd + di;
                dist_id % world_size
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_owner_is_cell_mod_world_size() {
        let grid = Grid::new(
            Mbr::new(0.0, 0.0, 100.0, 100.0),
            PartitioningMethod::RoundRobin,
            4,
            1,
        )
        .unwrap();
        let (i, j) = grid.cell_indices(55.0, 55.0);
        let id = grid.cell_id(i, j);
        assert_eq!(grid.owner(id, 3), (id as u32) % 3);
    }

    #[test]
    fn two_grid_owner_collapses_fine_cells_to_their_distribution_cell() {
        let grid = Grid::new(
            Mbr::new(0.0, 0.0, 16.0, 16.0),
            PartitioningMethod::TwoGrid,
            4,
            4,
        )
        .unwrap();
        // Two different fine cells inside the same distribution cell
        // (top-left quadrant) must map to the same owner.
        let (i0, j0) = grid.cell_indices(1.0, 1.0);
        let (i1, j1) = grid.cell_indices(3.0, 3.0);
        let id0 = grid.cell_id(i0, j0);
        let id1 = grid.cell_id(i1, j1);
        assert_eq!(grid.owner(id0, 5), grid.owner(id1, 5));
    }

    #[test]
    fn rejects_zero_ppd() {
        let dataspace = Mbr::new(0.0, 0.0, 1.0, 1.0);
        assert!(Grid::new(dataspace, PartitioningMethod::RoundRobin, 0, 1).is_err());
        assert!(Grid::new(dataspace, PartitioningMethod::TwoGrid, 4, 0).is_err());
    }
}
