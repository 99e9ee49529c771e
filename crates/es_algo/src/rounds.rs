//! Multi-round (runoff) resolver.
//!
//! Contract:
//! - States: Counting → (Eliminating → Counting)* → Resolved.
//! - Counting tabulates the *same* electorate against the current party set.
//!   Regions are redrawn for each round's set.
//! - Counting → Eliminating iff the leader holds < 50% of cast votes, more
//!   than one party remains, and the round budget is not spent.
//! - Eliminating keeps the top `k` parties (by the round's ranking), keeping
//!   their list order and their ids. `k` is 2 for `TopTwo`; for
//!   `Decrementing` it starts at n − 1 and drops by one per round. At least
//!   one party is always eliminated.
//! - A spent budget without majority is the terminal `NoMajority` state,
//!   not an error.

use serde::{Deserialize, Serialize};

use es_core::ids::PartyId;
use es_core::party::Party;
use es_core::rng::SimRng;
use es_core::variables::{AssignmentParams, KeepRule, RegionSlots, RunoffRule};

use crate::electorate::Electorate;
use crate::regions::RegionPlan;
use crate::tabulation::{tabulate, SnapshotSink, VoteTally};

/// Knobs shared by every round.
#[derive(Debug, Clone, Copy)]
pub struct RoundContext {
    pub params: AssignmentParams,
    pub region_slots: RegionSlots,
    pub snapshot_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based.
    pub round: u32,
    pub tally: VoteTally,
    /// Leader's share of cast votes.
    pub leader_share: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundsStatus {
    Majority { winner: PartyId, share: f64 },
    /// Only one party was left; it wins without a majority of cast votes.
    LastStanding { winner: PartyId, share: f64 },
    /// Round budget spent.
    NoMajority { leader: PartyId, share: f64 },
}

impl RoundsStatus {
    pub fn has_majority(&self) -> bool {
        matches!(self, RoundsStatus::Majority { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundsOutcome {
    pub rounds: Vec<RoundRecord>,
    pub status: RoundsStatus,
    /// Parties contesting the final round.
    pub survivors: Vec<Party>,
}

impl RoundsOutcome {
    /// Tally of the last round played.
    pub fn final_tally(&self) -> &VoteTally {
        // at least one round is always played
        &self.rounds[self.rounds.len() - 1].tally
    }
}

enum State {
    Counting,
    Eliminating(VoteTally),
    Resolved(RoundsStatus),
}

/// Run rounds until resolved. `parties` must be non-empty.
pub fn resolve_rounds(
    electorate: &Electorate,
    parties: &[Party],
    rule: RunoffRule,
    ctx: &RoundContext,
    rng: &mut SimRng,
    sink: &mut dyn SnapshotSink,
) -> RoundsOutcome {
    let mut active: Vec<Party> = parties.to_vec();
    let mut keep = match rule.keep {
        KeepRule::TopTwo => 2,
        KeepRule::Decrementing => active.len().saturating_sub(1),
    };
    let max_rounds = rule.max_rounds.max(1);
    let mut rounds: Vec<RoundRecord> = Vec::new();
    let mut state = State::Counting;

    let status = loop {
        state = match state {
            State::Counting => {
                let plan = RegionPlan::draw(&active, electorate.population(), ctx.region_slots, rng);
                let tally = tabulate(electorate, &active, &plan, &ctx.params, ctx.snapshot_count, sink);
                let leader = tally.leader();
                let share = leader.map_or(0.0, |l| tally.share(l.index));
                let leader_id = leader.map_or(PartyId::default(), |l| l.party);
                let round = rounds.len() as u32 + 1;
                rounds.push(RoundRecord { round, tally: tally.clone(), leader_share: share });
                tracing::debug!(round, parties = active.len(), leader = %leader_id, share, "runoff round counted");

                if share >= 0.5 {
                    State::Resolved(RoundsStatus::Majority { winner: leader_id, share })
                } else if active.len() <= 1 {
                    State::Resolved(RoundsStatus::LastStanding { winner: leader_id, share })
                } else if round >= max_rounds {
                    tracing::warn!(round, share, "runoff budget exhausted without a majority");
                    State::Resolved(RoundsStatus::NoMajority { leader: leader_id, share })
                } else {
                    State::Eliminating(tally)
                }
            }
            State::Eliminating(tally) => {
                let k = keep.clamp(1, active.len() - 1);
                let mut survivors: Vec<usize> = tally.ranked().into_iter().take(k).map(|e| e.index).collect();
                survivors.sort_unstable();
                active = survivors.into_iter().map(|i| active[i].clone()).collect();
                if rule.keep == KeepRule::Decrementing {
                    keep = keep.saturating_sub(1).max(1);
                }
                State::Counting
            }
            State::Resolved(status) => break status,
        };
    };

    RoundsOutcome { rounds, status, survivors: active }
}
