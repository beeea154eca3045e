//! The APRIL intermediate filter's decision tables (§4.3): classify a
//! candidate pair as a sure hit, a sure miss, or inconclusive (falls
//! through to refinement) using only the ALL/FULL interval lists, with
//! no access to the original vertices.

use super::interval::{any_overlap, contains, equal};
use super::raster::AprilCells;
use crate::geometry::Predicate;

/// The outcome of consulting the APRIL filter for one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    TrueHit,
    TrueNegative,
    Inconclusive,
}

/// `true` when either side's FULL list overlaps the other's ALL list —
/// the two-sided interior-touch test `intersects`/`disjoint`/`meet`
/// share, strictly stronger than a bare FULL-FULL overlap.
fn cross_full_overlap(a: &AprilCells, b: &AprilCells) -> bool {
    any_overlap(&a.all, &b.full) || any_overlap(&a.full, &b.all)
}

/// Classify a candidate pair for `predicate` using only `a`'s and
/// `b`'s rasterized cell lists. Mirrors the interval relationships
/// each predicate needs: any touch, full containment, or exact match.
pub fn classify(a: &AprilCells, b: &AprilCells, predicate: Predicate) -> Verdict {
    match predicate {
        Predicate::Disjoint => {
            if !any_overlap(&a.all, &b.all) {
                Verdict::TrueHit
            } else if cross_full_overlap(a, b) {
                Verdict::TrueNegative
            } else {
                Verdict::Inconclusive
            }
        }
        Predicate::Intersects => {
            if cross_full_overlap(a, b) {
                Verdict::TrueHit
            } else if !any_overlap(&a.all, &b.all) {
                Verdict::TrueNegative
            } else {
                Verdict::Inconclusive
            }
        }
        // A shared fully-covered cell means the interiors overlap,
        // which rules a pair *out* of meet rather than confirming it:
        // meet never gets a true hit from the cell lists alone.
        Predicate::Meet => {
            if !any_overlap(&a.all, &b.all) || cross_full_overlap(a, b) {
                Verdict::TrueNegative
            } else {
                Verdict::Inconclusive
            }
        }
        // Rasterization is lossy: distinct polygons can share identical
        // cell lists, so matching ALL lists can never confirm equality.
        Predicate::Equal => {
            if !equal(&a.all, &b.all) {
                Verdict::TrueNegative
            } else {
                Verdict::Inconclusive
            }
        }
        Predicate::Covers | Predicate::Contains => {
            if contains(&a.full, &b.all) {
                Verdict::TrueHit
            } else if !any_overlap(&a.all, &b.all) {
                Verdict::TrueNegative
            } else {
                Verdict::Inconclusive
            }
        }
        Predicate::CoveredBy | Predicate::Inside => {
            if contains(&b.full, &a.all) {
                Verdict::TrueHit
            } else if !any_overlap(&a.all, &b.all) {
                Verdict::TrueNegative
            } else {
                Verdict::Inconclusive
            }
        }
    }
}
