//! Result merge semantics (§4.5): count sums, collects concatenate,
//! topology-count sums per relation, kNN merges two bounded heaps.
//! Count and topology-count merges are commutative and associative
//! (§8 invariant 7), so callers can fold partial results in any order.

use std::collections::BinaryHeap;

use crate::error::Status;
use crate::query::types::{KnnHit, QueryResult};

/// Merge two partial results of the same shape into one (§4.5).
pub fn merge(a: QueryResult, b: QueryResult, k: Option<usize>) -> Result<QueryResult, Status> {
    match (a, b) {
        (QueryResult::Count(x), QueryResult::Count(y)) => Ok(QueryResult::Count(x + y)),
        (QueryResult::CollectIds(mut x), QueryResult::CollectIds(mut y)) => {
            x.append(&mut y);
            Ok(QueryResult::CollectIds(x))
        }
        (QueryResult::CollectPairs(mut x), QueryResult::CollectPairs(mut y)) => {
            x.append(&mut y);
            Ok(QueryResult::CollectPairs(x))
        }
        (QueryResult::TopologyCount(mut x), QueryResult::TopologyCount(y)) => {
            for i in 0..8 {
                x[i] += y[i];
            }
            Ok(QueryResult::TopologyCount(x))
        }
        (QueryResult::TopologyCollect(mut x), QueryResult::TopologyCollect(mut y)) => {
            for i in 0..8 {
                x[i].append(&mut y[i]);
            }
            Ok(QueryResult::TopologyCollect(x))
        }
        (QueryResult::Knn(x), QueryResult::Knn(y)) => Ok(QueryResult::Knn(merge_knn(x, y, k.unwrap_or(usize::MAX)))),
        _ => Err(Status::InvalidResultType),
    }
}

/// Merge two kNN result lists by pushing the smaller list's elements
/// into a heap built from the larger one, evicting the farthest hit
/// whenever the heap grows past `k` (§4.5).
pub fn merge_knn(a: Vec<KnnHit>, b: Vec<KnnHit>, k: usize) -> Vec<KnnHit> {
    let (mut larger, smaller) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut heap: BinaryHeap<KnnHit> = larger.drain(..).collect();
    for hit in smaller {
        heap.push(hit);
        while heap.len() > k {
            heap.pop();
        }
    }
    let mut out: Vec<KnnHit> = heap.into_sorted_vec();
    out.reverse(); // into_sorted_vec is ascending by Ord (max last); we want nearest first
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(d: f64, id: u64) -> KnnHit {
        KnnHit { distance: d, object_id: id }
    }

    #[test]
    fn count_merge_is_commutative_and_associative() {
        let a = QueryResult::Count(3);
        let b = QueryResult::Count(4);
        let c = QueryResult::Count(5);
        let ab_c = merge(merge(a.clone(), b.clone(), None).unwrap(), c.clone(), None).unwrap();
        let a_bc = merge(a, merge(b, c, None).unwrap(), None).unwrap();
        assert_eq!(ab_c, a_bc);
    }

    #[test]
    fn knn_merge_keeps_the_k_nearest() {
        let a = vec![hit(1.0, 1), hit(5.0, 2)];
        let b = vec![hit(2.0, 3), hit(0.5, 4)];
        let merged = merge_knn(a, b, 3);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].object_id, 4);
        assert_eq!(merged[1].object_id, 1);
        assert_eq!(merged[2].object_id, 3);
    }

    #[test]
    fn topology_count_merge_sums_per_relation() {
        let a = QueryResult::TopologyCount([1, 0, 0, 0, 0, 0, 0, 0]);
        let b = QueryResult::TopologyCount([2, 1, 0, 0, 0, 0, 0, 0]);
        let merged = merge(a, b, None).unwrap();
        assert_eq!(merged, QueryResult::TopologyCount([3, 1, 0, 0, 0, 0, 0, 0]));
    }
}
