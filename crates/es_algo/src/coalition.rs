// crates/es_algo/src/coalition.rs
//
// Coalition search over a final tally.
//
// Contract:
// - Candidates are the parties with votes, in ranking order. The first one
//   leads; shares are fractions of cast votes.
// - Partner distance to the leader: Σ dᵢ² + P·opposed_axes + W·share% with
//   P = 150000/7 and W = 300, so smaller parties are cheaper partners.
// - The nearest remaining partner is accepted if within `tolerance` and also
//   within `tolerance` of every committed partner under the unweighted metric
//   (Σ dᵢ² + P·opposed_axes). A cohesion failure marks it unavailable for
//   this leader and the scan continues.
// - No viable partner left: the attempt fails. The first failed attempt is
//   kept as the minority fallback, and leadership passes to the next-ranked
//   candidate with the running share reset to that party's own share.
// - Termination: leader advances are bounded by the candidate count.

use serde::{Deserialize, Serialize};

use es_core::determinism::cmp_f64_nan_last;
use es_core::ideology::AXIS_COUNT;
use es_core::ids::PartyId;
use es_core::party::Party;

use crate::government::compatibility;
use crate::tabulation::VoteTally;

pub const COALITION_SIGN_PENALTY: f64 = 150_000.0 / AXIS_COUNT as f64;
/// Added per percentage point of the partner's vote share.
pub const SHARE_WEIGHT: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoalitionParams {
    /// Largest acceptable partner distance (squared units).
    pub tolerance: f64,
}

impl CoalitionParams {
    /// `factor · non_voter_distance²`.
    pub fn new(coalition_factor: f64, non_voter_distance: f64) -> Self {
        Self { tolerance: coalition_factor * non_voter_distance * non_voter_distance }
    }
}

/// Audit trail entry. `share` is the running coalition share after the step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CoalitionStep {
    Leader { leader: PartyId, share: f64 },
    Partner { partner: PartyId, distance: f64, share: f64 },
    Rejected { partner: PartyId, conflicts_with: PartyId },
    Failed { leader: PartyId, share: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoalitionOutcome {
    pub leader: PartyId,
    pub partners: Vec<PartyId>,
    /// True iff `share >= 0.5`.
    pub success: bool,
    pub leader_advances: u32,
    /// Combined share of cast votes.
    pub share: f64,
    /// Leader/partner compatibility (0..=100) per partner.
    pub compatibility: Vec<(PartyId, f64)>,
    pub steps: Vec<CoalitionStep>,
}

impl CoalitionOutcome {
    pub fn members(&self) -> Vec<PartyId> {
        let mut m = Vec::with_capacity(self.partners.len() + 1);
        m.push(self.leader);
        m.extend(self.partners.iter().copied());
        m
    }
}

/// Unweighted distance, used for cohesion between partners.
pub fn cohesion_distance(a: &Party, b: &Party) -> f64 {
    let opposed = a.ideology.opposed_axes(&b.ideology) as f64;
    a.ideology.squared_distance(&b.ideology) + COALITION_SIGN_PENALTY * opposed
}

/// Distance of a prospective partner to the leader.
pub fn partner_distance(leader: &Party, other: &Party, other_share: f64) -> f64 {
    cohesion_distance(leader, other) + SHARE_WEIGHT * other_share * 100.0
}

struct Attempt {
    leader: usize,
    partners: Vec<usize>,
    share: f64,
}

/// Search for a majority coalition. `parties` must be the list the tally was
/// computed for (same order).
pub fn form_coalition(parties: &[Party], tally: &VoteTally, params: &CoalitionParams) -> CoalitionOutcome {
    let cast = tally.cast();
    let candidates: Vec<usize> = tally
        .ranked()
        .into_iter()
        .filter(|e| e.votes > 0)
        .map(|e| e.index)
        .collect();

    let mut steps = Vec::new();

    if cast == 0 || candidates.is_empty() {
        tracing::warn!("no votes cast; no coalition can be formed");
        let leader = tally.leader().map_or(PartyId::default(), |e| e.party);
        return CoalitionOutcome {
            leader,
            partners: Vec::new(),
            success: false,
            leader_advances: 0,
            share: 0.0,
            compatibility: Vec::new(),
            steps,
        };
    }

    let share_of = |i: usize| tally.counts[i] as f64 / cast as f64;
    let mut first_failure: Option<Attempt> = None;
    let mut advances: u32 = 0;
    let mut pos = 0usize;

    let result = loop {
        let leader = candidates[pos];
        let attempt = try_leader(parties, &candidates, leader, &share_of, params, &mut steps);
        if attempt.share >= 0.5 {
            break attempt;
        }

        steps.push(CoalitionStep::Failed { leader: parties[leader].id, share: attempt.share });
        tracing::debug!(leader = %parties[leader].label, share = attempt.share, "coalition attempt failed");
        if first_failure.is_none() {
            first_failure = Some(attempt);
        }

        if pos + 1 >= candidates.len() {
            // every candidate tried; fall back to the first attempt
            tracing::warn!(advances, "no majority coalition; minority government");
            break match first_failure.take() {
                Some(a) => a,
                None => Attempt { leader: candidates[0], partners: Vec::new(), share: share_of(candidates[0]) },
            };
        }
        pos += 1;
        advances += 1;
    };

    let leader = &parties[result.leader];
    let success = result.share >= 0.5;
    if success {
        tracing::info!(leader = %leader.label, partners = result.partners.len(), share = result.share, "coalition formed");
    }
    CoalitionOutcome {
        leader: leader.id,
        partners: result.partners.iter().map(|&i| parties[i].id).collect(),
        success,
        leader_advances: advances,
        share: result.share,
        compatibility: result
            .partners
            .iter()
            .map(|&i| (parties[i].id, compatibility(leader, &parties[i])))
            .collect(),
        steps,
    }
}

fn try_leader(
    parties: &[Party],
    candidates: &[usize],
    leader: usize,
    share_of: &dyn Fn(usize) -> f64,
    params: &CoalitionParams,
    steps: &mut Vec<CoalitionStep>,
) -> Attempt {
    let mut attempt = Attempt { leader, partners: Vec::new(), share: share_of(leader) };
    steps.push(CoalitionStep::Leader { leader: parties[leader].id, share: attempt.share });

    // (index, distance) in ranking order; stable sort keeps higher-ranked first on ties
    let mut pool: Vec<(usize, f64)> = candidates
        .iter()
        .copied()
        .filter(|&i| i != leader)
        .map(|i| (i, partner_distance(&parties[leader], &parties[i], share_of(i))))
        .collect();
    pool.sort_by(|a, b| cmp_f64_nan_last(a.1, b.1));

    for (cand, d) in pool {
        if attempt.share >= 0.5 {
            break;
        }
        if !(d <= params.tolerance) {
            // nearest remaining is already too far
            break;
        }
        let conflict = attempt
            .partners
            .iter()
            .copied()
            .find(|&p| cohesion_distance(&parties[cand], &parties[p]) > params.tolerance);
        if let Some(p) = conflict {
            steps.push(CoalitionStep::Rejected { partner: parties[cand].id, conflicts_with: parties[p].id });
            continue;
        }
        attempt.partners.push(cand);
        attempt.share += share_of(cand);
        steps.push(CoalitionStep::Partner { partner: parties[cand].id, distance: d, share: attempt.share });
    }
    attempt
}
