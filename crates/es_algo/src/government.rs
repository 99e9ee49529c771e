//! Government profile and party compatibility.

use serde::{Deserialize, Serialize};

use es_core::ideology::{IdeologyVector, AXIS_COUNT};
use es_core::ids::PartyId;
use es_core::party::Party;

use crate::coalition::CoalitionOutcome;
use crate::tabulation::VoteTally;

/// Extra points of disagreement per axis where the two parties' signs differ.
const OPPOSED_AXIS_POINTS: f64 = 10.0;
/// Largest per-axis gap counted (|d| + opposed bonus tops out around here).
const MAX_AXIS_GAP: f64 = 150.0;

/// Compatibility of two parties, 100 = identical, 0 = as far apart as it gets.
pub fn compatibility(a: &Party, b: &Party) -> f64 {
    let gap: f64 = a
        .ideology
        .values()
        .iter()
        .zip(b.ideology.values().iter())
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
        + OPPOSED_AXIS_POINTS * a.ideology.opposed_axes(&b.ideology) as f64;
    let max = MAX_AXIS_GAP * AXIS_COUNT as f64;
    (100.0 * (1.0 - gap / max)).clamp(0.0, 100.0)
}

/// Who governs and where they stand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernmentProfile {
    pub members: Vec<PartyId>,
    /// Combined share of cast votes.
    pub share: f64,
    pub majority: bool,
    /// Unweighted mean of the members' positions.
    pub ideology: IdeologyVector,
}

impl GovernmentProfile {
    /// Profile of a coalition outcome over the list it was formed from.
    pub fn of_coalition(parties: &[Party], outcome: &CoalitionOutcome) -> Self {
        let members = outcome.members();
        Self {
            ideology: mean_ideology(parties, &members),
            share: outcome.share,
            majority: outcome.success,
            members,
        }
    }

    /// Single-party government of the tally leader.
    pub fn single_party(parties: &[Party], tally: &VoteTally) -> Option<Self> {
        let leader = tally.leader()?;
        let share = tally.share(leader.index);
        Some(Self {
            members: vec![leader.party],
            share,
            majority: share >= 0.5,
            ideology: parties.get(leader.index).map_or_else(IdeologyVector::centre, |p| p.ideology),
        })
    }
}

fn mean_ideology(parties: &[Party], members: &[PartyId]) -> IdeologyVector {
    IdeologyVector::mean_of(
        parties
            .iter()
            .filter(|p| members.contains(&p.id))
            .map(|p| &p.ideology),
    )
    .unwrap_or_else(IdeologyVector::centre)
}
