//! The six end-to-end scenarios from spec.md §8, driven through the
//! public `Driver` API exactly as a client would use it.

use std::io::Write;

use sqed::config::Config;
use sqed::dataset::FileType;
use sqed::geometry::{DataType, Mbr};
use sqed::partition::PartitioningMethod;
use sqed::query::{topology_index, Query, QueryPredicate, QueryResult, ResultType};
use sqed::{Driver, Predicate};

fn config(worker_count: u32) -> Config {
    Config::default().with_worker_count(worker_count)
}

fn wkt_file(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

/// Scenario 1: R = {polygon with MBR (0,0,10,10)}, S = {polygon with
/// MBR (5,5,15,15)}. Intersection-join count = 1, disjoint-join count = 0.
#[test]
fn scenario_1_polygon_intersection_and_disjoint() {
    let r_file = wkt_file(&["POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))"]);
    let s_file = wkt_file(&["POLYGON ((5 5, 15 5, 15 15, 5 15, 5 5))"]);

    let mut driver = Driver::init(config(1)).unwrap();
    let r = driver
        .prepare_dataset(r_file.path().to_str().unwrap(), FileType::Wkt, DataType::Polygon, Some(Mbr::new(0.0, 0.0, 20.0, 20.0)))
        .unwrap();
    let s = driver
        .prepare_dataset(s_file.path().to_str().unwrap(), FileType::Wkt, DataType::Polygon, Some(Mbr::new(0.0, 0.0, 20.0, 20.0)))
        .unwrap();
    driver.partition(&[r, s], PartitioningMethod::RoundRobin, 2, 1, 1024).unwrap();
    driver.build_index(&[r, s]).unwrap();

    let intersects = driver
        .query(Query::Join {
            query_id: 0,
            r_dataset_id: r,
            s_dataset_id: s,
            predicate: QueryPredicate::Topology(Predicate::Intersects),
            result_type: ResultType::Count,
        })
        .unwrap();
    assert_eq!(intersects, QueryResult::Count(1));

    let disjoint = driver
        .query(Query::Join {
            query_id: 1,
            r_dataset_id: r,
            s_dataset_id: s,
            predicate: QueryPredicate::Topology(Predicate::Disjoint),
            result_type: ResultType::Count,
        })
        .unwrap();
    assert_eq!(disjoint, QueryResult::Count(0));

    driver.finalize();
}

/// Scenario 2: R = {rect(0,0,2,2), rect(10,10,12,12)}, S = {rect(1,1,11,11)}.
/// Intersection count = 2, inside(R inside S) count = 1.
#[test]
fn scenario_2_rectangle_intersection_and_inside() {
    let r_file = wkt_file(&["RECTANGLE (0 0, 2 2)", "RECTANGLE (10 10, 12 12)"]);
    let s_file = wkt_file(&["RECTANGLE (1 1, 11 11)"]);

    let mut driver = Driver::init(config(1)).unwrap();
    let r = driver
        .prepare_dataset(r_file.path().to_str().unwrap(), FileType::Wkt, DataType::Rectangle, Some(Mbr::new(0.0, 0.0, 20.0, 20.0)))
        .unwrap();
    let s = driver
        .prepare_dataset(s_file.path().to_str().unwrap(), FileType::Wkt, DataType::Rectangle, Some(Mbr::new(0.0, 0.0, 20.0, 20.0)))
        .unwrap();
    driver.partition(&[r, s], PartitioningMethod::RoundRobin, 2, 1, 1024).unwrap();
    driver.build_index(&[r, s]).unwrap();

    let intersects = driver
        .query(Query::Join {
            query_id: 0,
            r_dataset_id: r,
            s_dataset_id: s,
            predicate: QueryPredicate::Topology(Predicate::Intersects),
            result_type: ResultType::Count,
        })
        .unwrap();
    assert_eq!(intersects, QueryResult::Count(2));

    let inside = driver
        .query(Query::Join {
            query_id: 1,
            r_dataset_id: r,
            s_dataset_id: s,
            predicate: QueryPredicate::Topology(Predicate::Inside),
            result_type: ResultType::Count,
        })
        .unwrap();
    assert_eq!(inside, QueryResult::Count(1));

    driver.finalize();
}

/// Scenario 3: two overlapping unit squares, find-relation: exactly one
/// pair classified INTERSECT.
#[test]
fn scenario_3_find_relation_classifies_intersect() {
    let r_file = wkt_file(&["POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))"]);
    let s_file = wkt_file(&["POLYGON ((0.5 0, 1.5 0, 1.5 1, 0.5 1, 0.5 0))"]);

    let mut driver = Driver::init(config(1)).unwrap();
    let r = driver
        .prepare_dataset(r_file.path().to_str().unwrap(), FileType::Wkt, DataType::Polygon, Some(Mbr::new(-5.0, -5.0, 5.0, 5.0)))
        .unwrap();
    let s = driver
        .prepare_dataset(s_file.path().to_str().unwrap(), FileType::Wkt, DataType::Polygon, Some(Mbr::new(-5.0, -5.0, 5.0, 5.0)))
        .unwrap();
    driver.partition(&[r, s], PartitioningMethod::RoundRobin, 1, 1, 1024).unwrap();
    driver.build_index(&[r, s]).unwrap();

    let result = driver
        .query(Query::Join {
            query_id: 0,
            r_dataset_id: r,
            s_dataset_id: s,
            predicate: QueryPredicate::FindRelation,
            result_type: ResultType::Count,
        })
        .unwrap();
    match result {
        QueryResult::TopologyCount(counts) => {
            let intersects_idx = topology_index(Predicate::Intersects);
            assert_eq!(counts[intersects_idx], 1);
            let total: u64 = counts.iter().sum();
            assert_eq!(total, 1, "exactly one predicate should classify the pair");
        }
        other => panic!("expected TopologyCount, got {other:?}"),
    }

    driver.finalize();
}

/// Scenario 4: kNN around (0,0), k=3, over integer grid points.
#[test]
fn scenario_4_knn_returns_three_closest_grid_points() {
    let mut lines = Vec::new();
    for x in -2..=2 {
        for y in -2..=2 {
            lines.push(format!("POINT ({x} {y})"));
        }
    }
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let file = wkt_file(&line_refs);

    let mut driver = Driver::init(config(1)).unwrap();
    let dataset_id = driver
        .prepare_dataset(file.path().to_str().unwrap(), FileType::Wkt, DataType::Point, Some(Mbr::new(-10.0, -10.0, 10.0, 10.0)))
        .unwrap();
    driver.partition(&[dataset_id], PartitioningMethod::RoundRobin, 2, 1, 1024).unwrap();
    driver.build_index(&[dataset_id]).unwrap();

    let result = driver
        .query(Query::Knn {
            query_id: 0,
            dataset_id,
            point: (0.0, 0.0),
            k: 3,
        })
        .unwrap();
    match result {
        QueryResult::Knn(hits) => {
            assert_eq!(hits.len(), 3);
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
            // the origin itself, plus two of its unit-distance neighbours
            assert_eq!(hits[0].distance, 0.0);
        }
        other => panic!("expected Knn, got {other:?}"),
    }

    driver.finalize();
}

/// Scenario 5: range query (0,0,5,5) over points uniformly random in
/// (0,0,10,10); count equals points whose coordinates both lie in [0,5].
#[test]
fn scenario_5_range_query_matches_brute_force_count() {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let mut points = Vec::new();
    for i in 0..100 {
        let x: f64 = rng.gen_range(0.0..10.0);
        let y: f64 = rng.gen_range(0.0..10.0);
        points.push((i as u64, x, y));
    }
    let lines: Vec<String> = points.iter().map(|&(id, x, y)| format!("{id},{x},{y}")).collect();
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let file = wkt_file(&line_refs);

    let mut driver = Driver::init(config(1)).unwrap();
    let dataset_id = driver
        .prepare_dataset(file.path().to_str().unwrap(), FileType::Csv, DataType::Point, Some(Mbr::new(0.0, 0.0, 10.0, 10.0)))
        .unwrap();
    driver.partition(&[dataset_id], PartitioningMethod::RoundRobin, 4, 1, 1024).unwrap();
    driver.build_index(&[dataset_id]).unwrap();

    let result = driver
        .query(Query::Range {
            query_id: 0,
            dataset_id,
            window: Mbr::new(0.0, 0.0, 5.0, 5.0),
            result_type: ResultType::Count,
        })
        .unwrap();

    let expected = points.iter().filter(|&&(_, x, y)| x <= 5.0 && y <= 5.0).count() as u64;
    assert_eq!(result, QueryResult::Count(expected));

    driver.finalize();
}

/// Scenario 6: partition across a 4-worker cluster, unload, re-prepare
/// from the same file; subsequent queries on the new id match the
/// original counts.
#[test]
fn scenario_6_unload_then_reprepare_preserves_query_results() {
    let file = wkt_file(&[
        "POLYGON ((0 0, 4 0, 4 4, 0 4, 0 0))",
        "POLYGON ((6 6, 9 6, 9 9, 6 9, 6 6))",
    ]);

    let mut driver = Driver::init(config(4)).unwrap();
    let first_id = driver
        .prepare_dataset(file.path().to_str().unwrap(), FileType::Wkt, DataType::Polygon, Some(Mbr::new(0.0, 0.0, 10.0, 10.0)))
        .unwrap();
    driver.partition(&[first_id], PartitioningMethod::RoundRobin, 2, 1, 1024).unwrap();
    driver.build_index(&[first_id]).unwrap();

    let window = Mbr::new(0.0, 0.0, 10.0, 10.0);
    let before = driver
        .query(Query::Range { query_id: 0, dataset_id: first_id, window, result_type: ResultType::Count })
        .unwrap();

    driver.unload_dataset(first_id).unwrap();

    let second_id = driver
        .prepare_dataset(file.path().to_str().unwrap(), FileType::Wkt, DataType::Polygon, Some(Mbr::new(0.0, 0.0, 10.0, 10.0)))
        .unwrap();
    assert_ne!(first_id, second_id);
    driver.partition(&[second_id], PartitioningMethod::RoundRobin, 2, 1, 1024).unwrap();
    driver.build_index(&[second_id]).unwrap();

    let after = driver
        .query(Query::Range { query_id: 1, dataset_id: second_id, window, result_type: ResultType::Count })
        .unwrap();

    assert_eq!(before, after);

    driver.finalize();
}
