//! Divisor sequences of the highest-averages family and exact quotient comparison.
//!
//! Quotient for a party holding `s` seats: `votes / D(s)` with
//! - Huntington-Hill: D(s) = √(s(s+1))   (D(0) = 0, i.e. an infinite quotient)
//! - D'Hondt:         D(s) = s + 1
//! - Sainte-Laguë:    D(s) = 2s + 1
//!
//! Comparisons never divide: both sides are squared and cross-multiplied in
//! `u128` (`v_a² · D(s_b)²` vs `v_b² · D(s_a)²`). On overflow we fall back to
//! `f64` (deterministic, only reachable for astronomically large inputs).

use core::cmp::Ordering;

use es_core::variables::DivisorMethod;

/// D(s)² as an exact integer.
#[inline]
pub fn divisor_sq(method: DivisorMethod, s: u32) -> u128 {
    let s = s as u128;
    match method {
        DivisorMethod::HuntingtonHill => s * (s + 1),
        DivisorMethod::DHondt => (s + 1) * (s + 1),
        DivisorMethod::SainteLague => (2 * s + 1) * (2 * s + 1),
    }
}

/// Compare `v_a / D(s_a)` with `v_b / D(s_b)`.
pub fn cmp_quotients(method: DivisorMethod, v_a: u64, s_a: u32, v_b: u64, s_b: u32) -> Ordering {
    let da = divisor_sq(method, s_a);
    let db = divisor_sq(method, s_b);

    // Zero divisor = infinite quotient (for positive votes).
    match (da == 0, db == 0) {
        (true, true) => return Ordering::Equal,
        (true, false) => return if v_a > 0 { Ordering::Greater } else { Ordering::Less },
        (false, true) => return if v_b > 0 { Ordering::Less } else { Ordering::Greater },
        (false, false) => {}
    }

    let va2 = (v_a as u128) * (v_a as u128);
    let vb2 = (v_b as u128) * (v_b as u128);
    if let (Some(l), Some(r)) = (va2.checked_mul(db), vb2.checked_mul(da)) {
        l.cmp(&r)
    } else {
        let qa = v_a as f64 / (da as f64).sqrt();
        let qb = v_b as f64 / (db as f64).sqrt();
        qa.partial_cmp(&qb).unwrap_or(Ordering::Equal)
    }
}
