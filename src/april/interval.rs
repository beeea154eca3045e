//! Interval-list primitives over sorted, non-overlapping `[lo, hi]`
//! ranges of Hilbert distances (§4.3). An interval list is always kept
//! sorted and merged so the primitives below can run in a single
//! linear scan, mirroring the plane sweep's own merge style.

/// A closed `[lo, hi]` range of Hilbert cell distances.
pub type Interval = (u64, u64);

/// Sort and merge touching/overlapping intervals into the canonical
/// representation every other primitive assumes.
pub fn normalize(mut list: Vec<Interval>) -> Vec<Interval> {
    list.sort_unstable_by_key(|&(lo, _)| lo);
    let mut merged: Vec<Interval> = Vec::with_capacity(list.len());
    for (lo, hi) in list {
        if let Some(last) = merged.last_mut() {
            if lo <= last.1 + 1 {
                last.1 = last.1.max(hi);
                continue;
            }
        }
        merged.push((lo, hi));
    }
    merged
}

/// Whether any interval in `a` overlaps any interval in `b`.
pub fn any_overlap(a: &[Interval], b: &[Interval]) -> bool {
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        let (a_lo, a_hi) = a[i];
        let (b_lo, b_hi) = b[j];
        if a_hi < b_lo {
            i += 1;
        } else if b_hi < a_lo {
            j += 1;
        } else {
            return true;
        }
    }
    false
}

/// Whether every point covered by `inner` is also covered by `outer`.
pub fn contains(outer: &[Interval], inner: &[Interval]) -> bool {
    let mut j = 0usize;
    'outer: for &(lo, hi) in inner {
        while j < outer.len() {
            let (o_lo, o_hi) = outer[j];
            if o_hi < lo {
                j += 1;
                continue;
            }
            if o_lo <= lo && o_hi >= hi {
                continue 'outer;
            }
            return false;
        }
        return false;
    }
    true
}

/// Exact equality of the covered point sets (both lists normalized).
pub fn equal(a: &[Interval], b: &[Interval]) -> bool {
    a == b
}

/// Total count of distinct distances covered by a normalized list.
pub fn weight(list: &[Interval]) -> u64 {
    list.iter().map(|&(lo, hi)| hi - lo + 1).sum()
}
