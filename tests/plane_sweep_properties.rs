//! Property-based checks for the plane-sweep join kernel and the wire
//! round-trip laws from spec.md §8.

use std::collections::HashSet;

use proptest::prelude::*;

use sqed::dataset::{Dataset, FileType};
use sqed::geometry::{DataType, Mbr, Shape};
use sqed::index;
use sqed::partition::{Grid, PartitioningMethod};
use sqed::query::QueryResult;

fn rect(id: u64, x: f64, y: f64, w: f64, h: f64) -> Shape {
    let mut s = Shape::new_empty(id, DataType::Rectangle);
    s.append_vertex(x, y);
    s.append_vertex(x + w, y + h);
    s.compute_mbr().unwrap();
    s
}

fn build_dataset(internal_id: u64, grid: &Grid, shapes: Vec<Shape>) -> Dataset {
    let mut dataset = Dataset::prepare(internal_id, "t", DataType::Rectangle, FileType::Wkt, "", grid.dataspace);
    dataset.partition(grid, shapes).unwrap();
    dataset.build_index().unwrap();
    dataset
}

fn rect_strategy() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (0.0..90.0f64, 0.0..90.0f64, 0.5..10.0f64, 0.5..10.0f64)
}

proptest! {
    /// Invariants 4 and 5 (§8): every emitted pair overlaps, and every
    /// overlapping pair is emitted exactly once.
    #[test]
    fn every_overlapping_pair_is_emitted_exactly_once(
        r_rects in prop::collection::vec(rect_strategy(), 1..12),
        s_rects in prop::collection::vec(rect_strategy(), 1..12),
    ) {
        let grid = Grid::new(Mbr::new(0.0, 0.0, 100.0, 100.0), PartitioningMethod::RoundRobin, 3, 1).unwrap();

        let r_shapes: Vec<Shape> = r_rects.iter().enumerate().map(|(i, &(x, y, w, h))| rect(i as u64, x, y, w, h)).collect();
        let s_shapes: Vec<Shape> = s_rects.iter().enumerate().map(|(i, &(x, y, w, h))| rect(i as u64, x, y, w, h)).collect();

        let r_dataset = build_dataset(0, &grid, r_shapes.clone());
        let s_dataset = build_dataset(1, &grid, s_shapes.clone());

        let mut emitted = Vec::new();
        index::join(&r_dataset.index, &r_dataset.shapes, &s_dataset.index, &s_dataset.shapes, |ri, si| {
            emitted.push((ri, si));
        });

        for &(ri, si) in &emitted {
            prop_assert!(r_dataset.shapes[ri].mbr.overlaps(&s_dataset.shapes[si].mbr));
        }

        let emitted_set: HashSet<(usize, usize)> = emitted.iter().copied().collect();
        prop_assert_eq!(emitted.len(), emitted_set.len(), "no pair should be emitted twice");

        let mut expected = HashSet::new();
        for (ri, r) in r_dataset.shapes.iter().enumerate() {
            for (si, s) in s_dataset.shapes.iter().enumerate() {
                if r.mbr.overlaps(&s.mbr) {
                    expected.insert((ri, si));
                }
            }
        }
        prop_assert_eq!(emitted_set, expected);
    }

    /// Round-trip law: Serialise(QueryResult) -> Deserialise = identity.
    #[test]
    fn query_result_count_round_trips(n in 0u64..1_000_000) {
        let result = QueryResult::Count(n);
        let back = QueryResult::deserialize(&result.serialize()).unwrap();
        prop_assert_eq!(result, back);
    }

    #[test]
    fn query_result_collect_pairs_round_trips(pairs in prop::collection::vec((0u64..1000, 0u64..1000), 0..50)) {
        let result = QueryResult::CollectPairs(pairs);
        let back = QueryResult::deserialize(&result.serialize()).unwrap();
        prop_assert_eq!(result, back);
    }
}
