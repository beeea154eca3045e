//! Agent-side local query evaluation (§4.5 "Local evaluation"): the
//! plane sweep is the only source of candidates, APRIL filters what it
//! can, and refinement is the final arbiter.

use std::time::{Duration, Instant};

use crate::april::{self, AprilIndex, Verdict};
use crate::dataset::Dataset;
use crate::error::Status;
use crate::geometry::{Mbr, Predicate, Shape};
use crate::index;
use crate::query::types::{topology_index, KnnHit, Query, QueryPredicate, QueryResult, ResultType, TOPOLOGY_ORDER};
use crate::refinement;

/// Per-stage wall-clock cost, reported alongside the result (§4.5 Timing).
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalTimings {
    pub mbr_filter: Duration,
    pub intermediate_filter: Duration,
    pub refinement: Duration,
}

/// One Agent's local contribution to a query (§4.5).
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub result: QueryResult,
    pub post_mbr_filter_candidates: u64,
    pub timings: EvalTimings,
}

/// Which optional stages are enabled (§6 `query.intermediateFilter`,
/// `query.refinement`).
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    pub intermediate_filter: bool,
    pub refinement: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            intermediate_filter: true,
            refinement: true,
        }
    }
}

fn evaluate_pair(
    r: &Shape,
    s: &Shape,
    predicate: Predicate,
    april_r: Option<&AprilIndex>,
    april_s: Option<&AprilIndex>,
    opts: EvalOptions,
    timings: &mut EvalTimings,
) -> Result<Option<bool>, Status> {
    if opts.intermediate_filter {
        if let (Some(ar), Some(as_)) = (april_r, april_s) {
            let start = Instant::now();
            let verdict = april::classify_pair(ar, r.id, as_, s.id, predicate);
            timings.intermediate_filter += start.elapsed();
            match verdict {
                Some(Verdict::TrueHit) => return Ok(Some(true)),
                Some(Verdict::TrueNegative) => return Ok(Some(false)),
                _ => {}
            }
        }
    }
    if !opts.refinement {
        return Ok(None);
    }
    let (result, elapsed) = refinement::refine(r, s, predicate);
    timings.refinement += elapsed;
    result.map(Some)
}

/// Evaluate a join query's predicate over one partition pair of local
/// datasets R and S (§4.5 steps 1-4).
pub fn eval_join(
    r: &Dataset,
    s: &Dataset,
    predicate: QueryPredicate,
    result_type: ResultType,
    opts: EvalOptions,
) -> Result<EvalOutcome, Status> {
    let start = Instant::now();
    let mut candidates = Vec::new();
    index::join(&r.index, &r.shapes, &s.index, &s.shapes, |ri, si| {
        candidates.push((ri, si))
    });
    let mut timings = EvalTimings {
        mbr_filter: start.elapsed(),
        ..Default::default()
    };
    let post_mbr_filter_candidates = candidates.len() as u64;

    let result = match (predicate, result_type) {
        (QueryPredicate::Topology(p), ResultType::Count) => {
            let mut count = 0u64;
            for (ri, si) in candidates {
                let (rs, ss) = (&r.shapes[ri], &s.shapes[si]);
                if evaluate_pair(rs, ss, p, r.april.as_ref(), s.april.as_ref(), opts, &mut timings)?
                    .unwrap_or(false)
                {
                    count += 1;
                }
            }
            QueryResult::Count(count)
        }
        (QueryPredicate::Topology(p), ResultType::Collect) => {
            let mut pairs = Vec::new();
            for (ri, si) in candidates {
                let (rs, ss) = (&r.shapes[ri], &s.shapes[si]);
                if evaluate_pair(rs, ss, p, r.april.as_ref(), s.april.as_ref(), opts, &mut timings)?
                    .unwrap_or(false)
                {
                    pairs.push((rs.id, ss.id));
                }
            }
            QueryResult::CollectPairs(pairs)
        }
        (QueryPredicate::FindRelation, ResultType::Count) => {
            let mut counts = [0u64; 8];
            for (ri, si) in candidates {
                let (rs, ss) = (&r.shapes[ri], &s.shapes[si]);
                let relation = index::topology_mbr_relation(&rs.mbr, &ss.mbr);
                for &p in &TOPOLOGY_ORDER {
                    if !refinement::mbr_relation_admits(relation, p) {
                        continue;
                    }
                    if evaluate_pair(rs, ss, p, r.april.as_ref(), s.april.as_ref(), opts, &mut timings)?
                        .unwrap_or(false)
                    {
                        counts[topology_index(p)] += 1;
                    }
                }
            }
            QueryResult::TopologyCount(counts)
        }
        (QueryPredicate::FindRelation, ResultType::Collect) => {
            let mut collected: [Vec<(u64, u64)>; 8] = Default::default();
            for (ri, si) in candidates {
                let (rs, ss) = (&r.shapes[ri], &s.shapes[si]);
                let relation = index::topology_mbr_relation(&rs.mbr, &ss.mbr);
                for &p in &TOPOLOGY_ORDER {
                    if !refinement::mbr_relation_admits(relation, p) {
                        continue;
                    }
                    if evaluate_pair(rs, ss, p, r.april.as_ref(), s.april.as_ref(), opts, &mut timings)?
                        .unwrap_or(false)
                    {
                        collected[topology_index(p)].push((rs.id, ss.id));
                    }
                }
            }
            QueryResult::TopologyCollect(collected)
        }
        (QueryPredicate::Distance, _) => {
            return Err(Status::InvalidQueryInput(
                "distance is a per-pair metric, not a join predicate".into(),
            ))
        }
        (_, ResultType::Knn) => return Err(Status::InvalidQueryType),
    };

    Ok(EvalOutcome {
        result,
        post_mbr_filter_candidates,
        timings,
    })
}

/// Evaluate a range query against one local dataset: every shape
/// whose MBR intersects `window` qualifies (§4.5 Dispatch "Range queries").
pub fn eval_range(dataset: &Dataset, window: &Mbr, result_type: ResultType) -> Result<EvalOutcome, Status> {
    let start = Instant::now();
    let matches: Vec<&Shape> = dataset.shapes.iter().filter(|s| s.mbr.overlaps(window)).collect();
    let timings = EvalTimings {
        mbr_filter: start.elapsed(),
        ..Default::default()
    };
    let result = match result_type {
        ResultType::Count => QueryResult::Count(matches.len() as u64),
        ResultType::Collect => QueryResult::CollectIds(matches.iter().map(|s| s.id).collect()),
        ResultType::Knn => return Err(Status::InvalidQueryType),
    };
    Ok(EvalOutcome {
        result,
        post_mbr_filter_candidates: matches.len() as u64,
        timings,
    })
}

fn shape_centroid(shape: &Shape) -> (f64, f64) {
    let n = shape.vertices.len() as f64;
    let (sx, sy) = shape.vertices.iter().fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
    (sx / n, sy / n)
}

/// Evaluate a kNN query against one local dataset, returning this
/// Agent's local top-k (§4.5 Dispatch "kNN").
pub fn eval_knn(dataset: &Dataset, point: (f64, f64), k: usize) -> EvalOutcome {
    let start = Instant::now();
    let mut hits: Vec<KnnHit> = dataset
        .shapes
        .iter()
        .map(|s| {
            let (cx, cy) = shape_centroid(s);
            let d = ((cx - point.0).powi(2) + (cy - point.1).powi(2)).sqrt();
            KnnHit {
                distance: d,
                object_id: s.id,
            }
        })
        .collect();
    hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
    hits.truncate(k);
    EvalOutcome {
        post_mbr_filter_candidates: hits.len() as u64,
        result: QueryResult::Knn(hits),
        timings: EvalTimings {
            mbr_filter: start.elapsed(),
            ..Default::default()
        },
    }
}

/// Route a Query to the right local evaluator, given the datasets it
/// names (callers resolve dataset ids to `&Dataset` beforehand).
pub fn evaluate_local<'a>(
    query: &Query,
    resolve: impl Fn(u64) -> Option<&'a Dataset>,
    opts: EvalOptions,
) -> Result<EvalOutcome, Status> {
    match query {
        Query::Range {
            dataset_id,
            window,
            result_type,
            ..
        } => {
            let ds = resolve(*dataset_id).ok_or(Status::UnknownDataset(*dataset_id))?;
            eval_range(ds, window, *result_type)
        }
        Query::Join {
            r_dataset_id,
            s_dataset_id,
            predicate,
            result_type,
            ..
        } => {
            let r = resolve(*r_dataset_id).ok_or(Status::UnknownDataset(*r_dataset_id))?;
            let s = resolve(*s_dataset_id).ok_or(Status::UnknownDataset(*s_dataset_id))?;
            eval_join(r, s, *predicate, *result_type, opts)
        }
        Query::Knn { dataset_id, point, k, .. } => {
            let ds = resolve(*dataset_id).ok_or(Status::UnknownDataset(*dataset_id))?;
            Ok(eval_knn(ds, *point, *k))
        }
    }
}
