//! Refinement: the final arbiter (§4.5 step 4). Wraps the exact
//! geometric predicate evaluation in per-pair timing and, for
//! find-relation queries, uses the already-computed MBR relationship
//! tag to skip predicates the tag already rules out.

use std::time::{Duration, Instant};

use crate::error::Status;
use crate::geometry::{MbrRelation, Predicate, Shape};

/// Exact evaluation of one predicate between two shapes, with the
/// wall-clock cost of the call (§4.5 Timing: "refinement time").
pub fn refine(a: &Shape, b: &Shape, predicate: Predicate) -> (Result<bool, Status>, Duration) {
    let start = Instant::now();
    let result = a.evaluate(b, predicate);
    (result, start.elapsed())
}

/// find-relation (§3 Query predicates): whether `predicate` can
/// possibly hold given the already-computed MBR relationship tag (an
/// R-in-S pair can never satisfy `Contains`, for instance), so callers
/// can skip predicates the tag already rules out before refining.
pub fn mbr_relation_admits(relation: MbrRelation, predicate: Predicate) -> bool {
    match predicate {
        Predicate::Contains | Predicate::Covers => {
            matches!(relation, MbrRelation::RInS | MbrRelation::Equal)
        }
        Predicate::Inside | Predicate::CoveredBy => {
            matches!(relation, MbrRelation::SInR | MbrRelation::Equal)
        }
        Predicate::Equal => matches!(relation, MbrRelation::Equal),
        Predicate::Disjoint => true, // any relation could still be geometrically disjoint
        Predicate::Intersects | Predicate::Meet => true,
    }
}
