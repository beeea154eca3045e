//! Host-side query dispatch (§4.5 "Dispatch"): decide which workers a
//! Query is sent to.

use crate::partition::Grid;
use crate::query::types::Query;

/// The set of worker ranks a Query must be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    All,
    Ranks(Vec<u32>),
}

/// Decide dispatch targets for `query` given the grid each named
/// dataset was partitioned with and the cluster's world size.
///
/// - Join and kNN predicates broadcast to every worker.
/// - Range queries target only the workers owning partitions whose
///   cell overlaps the query window.
pub fn targets_for(query: &Query, grid: &Grid, world_size: u32) -> Targets {
    match query {
        Query::Join { .. } | Query::Knn { .. } => Targets::All,
        Query::Range { window, .. } => {
            let mut ranks: Vec<u32> = grid
                .cells_overlapping(window)
                .into_iter()
                .map(|cell_id| grid.owner(cell_id, world_size))
                .collect();
            ranks.sort_unstable();
            ranks.dedup();
            Targets::Ranks(ranks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mbr;
    use crate::partition::PartitioningMethod;
    use crate::query::types::ResultType;

    #[test]
    fn join_queries_broadcast() {
        let grid = Grid::new(Mbr::new(0.0, 0.0, 10.0, 10.0), PartitioningMethod::RoundRobin, 4, 1).unwrap();
        let q = Query::Join {
            query_id: 0,
            r_dataset_id: 0,
            s_dataset_id: 1,
            predicate: crate::query::types::QueryPredicate::Topology(crate::geometry::Predicate::Intersects),
            result_type: ResultType::Count,
        };
        assert_eq!(targets_for(&q, &grid, 4), Targets::All);
    }

    #[test]
    fn range_queries_target_only_overlapping_owners() {
        let grid = Grid::new(Mbr::new(0.0, 0.0, 10.0, 10.0), PartitioningMethod::RoundRobin, 4, 1).unwrap();
        let q = Query::Range {
            query_id: 0,
            dataset_id: 0,
            window: Mbr::new(0.0, 0.0, 1.0, 1.0),
            result_type: ResultType::Count,
        };
        match targets_for(&q, &grid, 4) {
            Targets::Ranks(ranks) => assert!(!ranks.is_empty()),
            Targets::All => panic!("range query should not broadcast"),
        }
    }
}
