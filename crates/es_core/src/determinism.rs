//! Stable ordering helpers.
//!
//! Ranked output everywhere in the engine uses one total order:
//! votes descending, then party-list position ascending.

use core::cmp::Ordering;

/// Compare two `(list_index, votes)` entries in ranking order.
#[inline]
pub fn cmp_ranked(a: (usize, u64), b: (usize, u64)) -> Ordering {
    match b.1.cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        o => o,
    }
}

/// Indices of `counts` in ranking order.
pub fn ranked_indices(counts: &[u64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..counts.len()).collect();
    idx.sort_by(|&a, &b| cmp_ranked((a, counts[a]), (b, counts[b])));
    idx
}

/// Total order on finite `f64` values used for nearest-first scans;
/// `NaN` sorts last.
#[inline]
pub fn cmp_f64_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
