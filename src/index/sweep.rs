//! The nine-way plane sweep join kernel (§4.2).
//!
//! For a partition id common to both datasets' indices, enumerates
//! every candidate (r, s) pair whose MBRs overlap, each exactly once,
//! by running nine directed sweeps across the R/S class buckets.

use crate::geometry::{Mbr, Shape};
use crate::index::two_layer::TwoLayerIndex;

/// `true` when two MBRs overlap under the half-open semantics (already
/// implemented by [`Mbr::overlaps`]; kept as a free function so the
/// sweep's stage list reads as a sequence of named predicates).
#[inline]
fn mbrs_overlap(a: &Mbr, b: &Mbr) -> bool {
    a.overlaps(b)
}

/// Merge-style sweep between two sequences both sorted ascending by
/// MBR.yMin. Ties are resolved by advancing R first.
fn sweep_sorted_sorted(
    r_ids: &[usize],
    s_ids: &[usize],
    shapes_r: &[Shape],
    shapes_s: &[Shape],
    cb: &mut dyn FnMut(usize, usize),
) {
    let (mut i, mut j) = (0usize, 0usize);
    while i < r_ids.len() && j < s_ids.len() {
        let r = &shapes_r[r_ids[i]];
        let s = &shapes_s[s_ids[j]];
        if r.mbr.y_min <= s.mbr.y_min {
            let mut k = j;
            while k < s_ids.len() {
                let s2 = &shapes_s[s_ids[k]];
                if s2.mbr.y_min > r.mbr.y_max {
                    break;
                }
                if mbrs_overlap(&r.mbr, &s2.mbr) {
                    cb(r_ids[i], s_ids[k]);
                }
                k += 1;
            }
            i += 1;
        } else {
            let mut k = i;
            while k < r_ids.len() {
                let r2 = &shapes_r[r_ids[k]];
                if r2.mbr.y_min > s.mbr.y_max {
                    break;
                }
                if mbrs_overlap(&r2.mbr, &s.mbr) {
                    cb(r_ids[k], s_ids[j]);
                }
                k += 1;
            }
            j += 1;
        }
    }
}

/// One side is unsorted (B or D); the other is sorted (A or C). Scans
/// every element of the unsorted side against the sorted one, using
/// the sorted side's ascending yMin to break out early.
///
/// `swap` is `false` when `unsorted` is the R side and `sorted` is the
/// S side; `true` for the reverse, so the callback always receives
/// `(r_idx, s_idx)`.
fn sweep_one_sorted(
    unsorted: &[usize],
    sorted: &[usize],
    shapes_unsorted: &[Shape],
    shapes_sorted: &[Shape],
    swap: bool,
    cb: &mut dyn FnMut(usize, usize),
) {
    for &u_idx in unsorted {
        let u = &shapes_unsorted[u_idx];
        for &s_idx in sorted {
            let s = &shapes_sorted[s_idx];
            if s.mbr.y_min > u.mbr.y_max {
                break;
            }
            if mbrs_overlap(&u.mbr, &s.mbr) {
                if swap {
                    cb(s_idx, u_idx);
                } else {
                    cb(u_idx, s_idx);
                }
            }
        }
    }
}

/// Run the nine-way plane sweep over every partition id common to
/// both indices, invoking `cb(r_shape_idx, s_shape_idx)` for every
/// candidate pair exactly once (§4.2, §8 invariants 4 and 5).
pub fn join(
    idx_r: &TwoLayerIndex,
    shapes_r: &[Shape],
    idx_s: &TwoLayerIndex,
    shapes_s: &[Shape],
    mut cb: impl FnMut(usize, usize),
) {
    for (id, pr) in &idx_r.partitions {
        let Some(ps) = idx_s.partitions.get(id) else {
            continue;
        };
        if pr.a.is_empty() && pr.b.is_empty() && pr.c.is_empty() && pr.d.is_empty() {
            continue;
        }
        if ps.a.is_empty() && ps.b.is_empty() && ps.c.is_empty() && ps.d.is_empty() {
            continue;
        }

        // 1. (R.A, S.A)
        sweep_sorted_sorted(&pr.a, &ps.a, shapes_r, shapes_s, &mut cb);
        // 2. (S.B, R.A)
        sweep_one_sorted(&ps.b, &pr.a, shapes_s, shapes_r, true, &mut cb);
        // 3. (R.A, S.C)
        sweep_sorted_sorted(&pr.a, &ps.c, shapes_r, shapes_s, &mut cb);
        // 4. (S.D, R.A)
        sweep_one_sorted(&ps.d, &pr.a, shapes_s, shapes_r, true, &mut cb);
        // 5. (R.B, S.A)
        sweep_one_sorted(&pr.b, &ps.a, shapes_r, shapes_s, false, &mut cb);
        // 6. (R.B, S.C)
        sweep_one_sorted(&pr.b, &ps.c, shapes_r, shapes_s, false, &mut cb);
        // 7. (S.A, R.C)
        sweep_sorted_sorted(&pr.c, &ps.a, shapes_r, shapes_s, &mut cb);
        // 8. (S.B, R.C)
        sweep_one_sorted(&ps.b, &pr.c, shapes_s, shapes_r, true, &mut cb);
        // 9. (R.D, S.A)
        sweep_one_sorted(&pr.d, &ps.a, shapes_r, shapes_s, false, &mut cb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DataType;

    fn rect(id: u64, x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        let mut s = Shape::new_empty(id, DataType::Rectangle);
        s.append_vertex(x0, y0);
        s.append_vertex(x1, y1);
        s.compute_mbr().unwrap();
        s
    }

    #[test]
    fn every_emitted_pair_overlaps_and_is_unique() {
        // A small synthetic R/S set classified into a single partition
        // cell (0,0)-(20,20), exercising several of the nine sweeps.
        let cell = Mbr::new(0.0, 0.0, 20.0, 20.0);

        let r_shapes = vec![
            rect(0, 1.0, 1.0, 5.0, 5.0),   // class A
            rect(1, -1.0, 2.0, 2.0, 6.0),  // class B
            rect(2, 2.0, -1.0, 6.0, 2.0),  // class C
            rect(3, -2.0, -2.0, 1.0, 1.0), // class D
        ];
        let s_shapes = vec![
            rect(10, 0.5, 0.5, 6.0, 6.0),  // class A, overlaps r0..r3
            rect(11, -3.0, 3.0, 0.5, 4.0), // class B
        ];

        let mut idx_r = TwoLayerIndex::new();
        let mut idx_s = TwoLayerIndex::new();
        for (i, s) in r_shapes.iter().enumerate() {
            let class = crate::geometry::mbr::classify(&cell, &s.mbr).unwrap();
            idx_r.insert(0, class, i);
        }
        for (i, s) in s_shapes.iter().enumerate() {
            let class = crate::geometry::mbr::classify(&cell, &s.mbr).unwrap();
            idx_s.insert(0, class, i);
        }
        idx_r.build(&r_shapes);
        idx_s.build(&s_shapes);

        let mut pairs = Vec::new();
        join(&idx_r, &r_shapes, &idx_s, &s_shapes, |r, s| pairs.push((r, s)));

        // Brute-force ground truth.
        let mut expected = Vec::new();
        for (ri, rs) in r_shapes.iter().enumerate() {
            for (si, ss) in s_shapes.iter().enumerate() {
                if rs.mbr.overlaps(&ss.mbr) {
                    expected.push((ri, si));
                }
            }
        }

        pairs.sort();
        expected.sort();
        assert_eq!(pairs, expected);

        for &(r, s) in &pairs {
            assert!(r_shapes[r].mbr.overlaps(&s_shapes[s].mbr));
        }
    }
}
