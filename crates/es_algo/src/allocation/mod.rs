//! Seat apportionment (highest averages).
//!
//! Contract:
//! - Threshold: a party qualifies iff it has votes and `100·v >= t·total`
//!   (u128 math). Non-qualifying parties get zero seats and never compete.
//! - Floor: `min_seats` go to every qualifying party in ranking order before
//!   competition; when the budget runs out the smaller parties miss out.
//! - Competition: seats are awarded one at a time to the largest quotient
//!   `votes / D(seats_so_far)`; see `divisors`.
//! - Ties: `MostVotes` (larger raw votes, then list order), `ListOrder`, or
//!   `Random` (seeded `SimRng`, logged as crumbs).
//! - Whenever at least one party qualifies, seats sum to the request.
//!   Otherwise every party gets zero and the whole budget is `unallocated`.
//!
//! Determinism:
//! - Scans follow party-list order; `Random` draws only when a tie occurs.

pub mod divisors;

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use es_core::determinism::ranked_indices;
use es_core::ids::PartyId;
use es_core::rng::{SimRng, TieCrumb};
use es_core::variables::{DivisorMethod, Pct, RunConfig, TiePolicy};

use crate::tabulation::VoteTally;

pub use divisors::{cmp_quotients, divisor_sq};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// `TiePolicy::Random` without an RNG.
    MissingRngForRandomPolicy,
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AllocError::MissingRngForRandomPolicy => write!(f, "random tie policy requires an rng"),
        }
    }
}

impl std::error::Error for AllocError {}

/// Seat rules of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRules {
    pub seats: u32,
    pub method: DivisorMethod,
    pub threshold: Pct,
    pub min_seats: u32,
    pub tie_policy: TiePolicy,
}

impl SeatRules {
    pub fn new(seats: u32, method: DivisorMethod) -> Self {
        Self {
            seats,
            method,
            threshold: Pct::default(),
            min_seats: 0,
            tie_policy: TiePolicy::MostVotes,
        }
    }

    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            seats: cfg.seats,
            method: cfg.divisor,
            threshold: cfg.threshold,
            min_seats: cfg.min_seats,
            tie_policy: cfg.tie_policy,
        }
    }
}

/// Seats per party, in the tally's party-list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apportionment {
    pub seats: Vec<(PartyId, u32)>,
    /// Seats nobody could take (only non-zero when no party qualifies).
    pub unallocated: u32,
    /// True iff the final competitive seat was decided by a tie-break.
    pub last_seat_tie: bool,
    /// Random tie decisions, in award order.
    pub ties: Vec<TieCrumb>,
}

impl Apportionment {
    pub fn total(&self) -> u32 {
        self.seats.iter().map(|(_, s)| s).sum()
    }

    pub fn seats_of(&self, id: PartyId) -> u32 {
        self.seats.iter().find(|(p, _)| *p == id).map_or(0, |(_, s)| *s)
    }
}

/// Apportion `rules.seats` over the tally.
pub fn apportion(
    tally: &VoteTally,
    rules: &SeatRules,
    mut rng: Option<&mut SimRng>,
) -> Result<Apportionment, AllocError> {
    if rules.tie_policy == TiePolicy::Random && rng.is_none() {
        return Err(AllocError::MissingRngForRandomPolicy);
    }

    let votes = &tally.counts;
    let eligible = filter_by_threshold(votes, rules.threshold);
    let mut alloc = vec![0u32; votes.len()];
    let mut out = Apportionment {
        seats: Vec::new(),
        unallocated: 0,
        last_seat_tie: false,
        ties: Vec::new(),
    };

    if !eligible.iter().any(|&e| e) {
        tracing::warn!(seats = rules.seats, "no party qualifies for seats; nothing allocated");
        out.unallocated = rules.seats;
        out.seats = tally.parties.iter().map(|&p| (p, 0)).collect();
        return Ok(out);
    }

    let mut remaining = rules.seats;

    if rules.min_seats > 0 {
        for idx in ranked_indices(votes) {
            if remaining == 0 {
                break;
            }
            if eligible[idx] {
                let give = rules.min_seats.min(remaining);
                alloc[idx] += give;
                remaining -= give;
            }
        }
    }

    for seat in 0..remaining {
        let (winner, tie) = next_award(
            votes,
            &alloc,
            &eligible,
            rules,
            rng.as_deref_mut(),
            seat,
            &mut out.ties,
        );
        alloc[winner] += 1;
        out.last_seat_tie = tie;
    }

    out.seats = tally.parties.iter().copied().zip(alloc).collect();
    tracing::debug!(seats = rules.seats, method = ?rules.method, "seats apportioned");
    Ok(out)
}

/// Qualifying mask: `v > 0 && 100*v >= t*total`. Empty total → nobody.
fn filter_by_threshold(votes: &[u64], threshold: Pct) -> Vec<bool> {
    let total: u128 = votes.iter().map(|&v| v as u128).sum();
    if total == 0 {
        return vec![false; votes.len()];
    }
    let t = threshold.as_u8() as u128;
    votes
        .iter()
        .map(|&v| v > 0 && (v as u128) * 100 >= t * total)
        .collect()
}

/// Argmax of quotients over eligible parties; ties per policy.
/// Returns `(index, was_tie)`.
fn next_award(
    votes: &[u64],
    alloc: &[u32],
    eligible: &[bool],
    rules: &SeatRules,
    rng: Option<&mut SimRng>,
    seat: u32,
    crumbs: &mut Vec<TieCrumb>,
) -> (usize, bool) {
    let mut best: Vec<usize> = Vec::new();
    for i in (0..votes.len()).filter(|&i| eligible[i]) {
        match best.first() {
            None => best.push(i),
            Some(&b) => match cmp_quotients(rules.method, votes[i], alloc[i], votes[b], alloc[b]) {
                Ordering::Greater => {
                    best.clear();
                    best.push(i);
                }
                Ordering::Equal => best.push(i),
                Ordering::Less => {}
            },
        }
    }

    // `eligible` has at least one entry (checked by the caller)
    let first = best[0];
    if best.len() == 1 {
        return (first, false);
    }

    let pick = match rules.tie_policy {
        TiePolicy::ListOrder => first,
        // strict `>` keeps the earliest among equal votes
        TiePolicy::MostVotes => best.iter().copied().fold(first, |acc, i| if votes[i] > votes[acc] { i } else { acc }),
        TiePolicy::Random => match rng {
            Some(rng) => {
                let ctx = format!("seat:{}", seat + 1);
                match rng.pick_index_with_crumb(&ctx, best.len()) {
                    Some((k, crumb)) => {
                        crumbs.push(crumb);
                        best[k]
                    }
                    None => first,
                }
            }
            None => first,
        },
    };
    (pick, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tally(votes: &[u64]) -> VoteTally {
        VoteTally {
            parties: (0..votes.len()).map(PartyId::from_index).collect(),
            counts: votes.to_vec(),
            abstentions: 0,
        }
    }

    fn seat_vec(a: &Apportionment) -> Vec<u32> {
        a.seats.iter().map(|(_, s)| *s).collect()
    }

    #[test]
    fn ten_seats_600_300_100_all_methods() {
        for m in [DivisorMethod::HuntingtonHill, DivisorMethod::DHondt, DivisorMethod::SainteLague] {
            let a = apportion(&tally(&[600, 300, 100]), &SeatRules::new(10, m), None).unwrap();
            assert_eq!(a.total(), 10, "{m:?}");
            assert_eq!(seat_vec(&a), vec![6, 3, 1], "{m:?}");
            assert_eq!(a.unallocated, 0);
        }
    }

    #[test]
    fn huntington_hill_gives_everyone_a_first_seat() {
        let a = apportion(&tally(&[10_000, 10, 1]), &SeatRules::new(3, DivisorMethod::HuntingtonHill), None).unwrap();
        assert_eq!(seat_vec(&a), vec![1, 1, 1]);
        // only the smallest party's quotient is still infinite for the last seat
        assert!(!a.last_seat_tie);
    }

    #[test]
    fn threshold_excludes_small_party() {
        let mut rules = SeatRules::new(10, DivisorMethod::HuntingtonHill);
        rules.threshold = Pct::new(15).unwrap();
        let a = apportion(&tally(&[600, 300, 100]), &rules, None).unwrap();
        assert_eq!(a.total(), 10);
        assert_eq!(seat_vec(&a)[2], 0);
    }

    #[test]
    fn zero_vote_party_never_seated() {
        let a = apportion(&tally(&[5, 0, 5]), &SeatRules::new(4, DivisorMethod::HuntingtonHill), None).unwrap();
        assert_eq!(seat_vec(&a), vec![2, 0, 2]);
    }

    #[test]
    fn floor_runs_in_ranking_order() {
        let mut rules = SeatRules::new(5, DivisorMethod::DHondt);
        rules.min_seats = 2;
        let a = apportion(&tally(&[50, 900, 50]), &rules, None).unwrap();
        assert_eq!(seat_vec(&a), vec![2, 2, 1]);

        rules.seats = 10;
        let a = apportion(&tally(&[50, 900, 50]), &rules, None).unwrap();
        assert!(seat_vec(&a).iter().all(|&s| s >= 2));
        assert_eq!(a.total(), 10);
    }

    #[test]
    fn zero_total_allocates_nothing() {
        let a = apportion(&tally(&[0, 0]), &SeatRules::new(7, DivisorMethod::SainteLague), None).unwrap();
        assert_eq!(seat_vec(&a), vec![0, 0]);
        assert_eq!(a.unallocated, 7);
    }

    #[test]
    fn most_votes_breaks_ties() {
        // D'Hondt: 400/2 == 600/3 for the fourth seat
        let a = apportion(&tally(&[400, 600]), &SeatRules::new(4, DivisorMethod::DHondt), None).unwrap();
        assert_eq!(seat_vec(&a), vec![1, 3]);
        assert!(a.last_seat_tie);

        let mut rules = SeatRules::new(4, DivisorMethod::DHondt);
        rules.tie_policy = TiePolicy::ListOrder;
        let a = apportion(&tally(&[400, 600]), &rules, None).unwrap();
        assert_eq!(seat_vec(&a), vec![2, 2]);
    }

    #[test]
    fn random_ties_need_rng_and_log_crumbs() {
        let mut rules = SeatRules::new(1, DivisorMethod::DHondt);
        rules.tie_policy = TiePolicy::Random;
        assert_eq!(
            apportion(&tally(&[5, 5]), &rules, None),
            Err(AllocError::MissingRngForRandomPolicy)
        );
        let mut rng = SimRng::from_seed_u64(17);
        let a = apportion(&tally(&[5, 5]), &rules, Some(&mut rng)).unwrap();
        assert_eq!(a.total(), 1);
        assert!(a.last_seat_tie);
        assert_eq!(a.ties.len(), 1);
        assert_eq!(a.ties[0].ctx.as_str(), "seat:1");
    }

    proptest! {
        #[test]
        fn seats_sum_exactly(
            votes in prop::collection::vec(0u64..1_000_000, 1..12),
            seats in 1u32..300,
            method in prop_oneof![
                Just(DivisorMethod::HuntingtonHill),
                Just(DivisorMethod::DHondt),
                Just(DivisorMethod::SainteLague),
            ],
        ) {
            prop_assume!(votes.iter().any(|&v| v > 0));
            let a = apportion(&tally(&votes), &SeatRules::new(seats, method), None).unwrap();
            prop_assert_eq!(a.total(), seats);
            prop_assert_eq!(a.unallocated, 0);
        }

        #[test]
        fn more_votes_never_fewer_seats(
            votes in prop::collection::vec(1u64..100_000, 2..8),
            seats in 1u32..120,
        ) {
            let a = apportion(&tally(&votes), &SeatRules::new(seats, DivisorMethod::SainteLague), None).unwrap();
            let s = seat_vec(&a);
            for i in 0..votes.len() {
                for j in 0..votes.len() {
                    if votes[i] > votes[j] {
                        prop_assert!(s[i] >= s[j]);
                    }
                }
            }
        }
    }
}
