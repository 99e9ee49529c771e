// crates/es_algo/src/tabulation.rs
//
// Tabulator: run the voter assignment rule over every voter of an electorate.
//
// Contract:
// - Voters are visited in index order; the region plan supplies the favored
//   party for each index.
// - Every voter ends up either in exactly one party's count or in the
//   abstention counter: sum(counts) + abstentions == population.
// - Parties are read-only here.
// - Snapshots are emitted every `population / snapshot_count + 1` voters and
//   once at the end. Sinks only observe; results never depend on them.

use serde::{Deserialize, Serialize};

use es_core::determinism::ranked_indices;
use es_core::ids::PartyId;
use es_core::party::Party;
use es_core::variables::AssignmentParams;

use crate::assignment::{assign_voter, Choice};
use crate::electorate::Electorate;
use crate::regions::RegionPlan;

/// Final counts of one tabulation, in party-list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub parties: Vec<PartyId>,
    pub counts: Vec<u64>,
    pub abstentions: u64,
}

/// One row of a ranked tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Index into the party list the tally was computed for.
    pub index: usize,
    pub party: PartyId,
    pub votes: u64,
}

impl VoteTally {
    pub fn empty(parties: &[Party]) -> Self {
        Self {
            parties: parties.iter().map(|p| p.id).collect(),
            counts: vec![0; parties.len()],
            abstentions: 0,
        }
    }

    /// Votes actually cast (population minus abstentions).
    pub fn cast(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn population(&self) -> u64 {
        self.cast() + self.abstentions
    }

    /// Share of cast votes for list index `idx`; 0 when nothing was cast.
    pub fn share(&self, idx: usize) -> f64 {
        let cast = self.cast();
        match self.counts.get(idx) {
            Some(&v) if cast > 0 => v as f64 / cast as f64,
            _ => 0.0,
        }
    }

    /// Turnout as a fraction of the population; 0 for an empty tally.
    pub fn turnout(&self) -> f64 {
        let pop = self.population();
        if pop == 0 {
            0.0
        } else {
            self.cast() as f64 / pop as f64
        }
    }

    /// Sorted descending by votes, ties by party-list order.
    pub fn ranked(&self) -> Vec<RankedEntry> {
        ranked_indices(&self.counts)
            .into_iter()
            .map(|i| RankedEntry {
                index: i,
                party: self.parties[i],
                votes: self.counts[i],
            })
            .collect()
    }

    pub fn leader(&self) -> Option<RankedEntry> {
        self.ranked().into_iter().next()
    }
}

/// Partial tally handed to snapshot sinks.
#[derive(Debug, Clone, Copy)]
pub struct TallySnapshot<'a> {
    pub processed: u64,
    pub population: u64,
    pub counts: &'a [u64],
    pub abstentions: u64,
}

/// Progress observer. Must not influence the run.
pub trait SnapshotSink {
    fn on_snapshot(&mut self, snapshot: &TallySnapshot<'_>);
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshots;

impl SnapshotSink for NoSnapshots {
    #[inline]
    fn on_snapshot(&mut self, _snapshot: &TallySnapshot<'_>) {}
}

impl<F> SnapshotSink for F
where
    F: FnMut(&TallySnapshot<'_>),
{
    #[inline]
    fn on_snapshot(&mut self, snapshot: &TallySnapshot<'_>) {
        self(snapshot)
    }
}

/// Tabulate one round.
pub fn tabulate(
    electorate: &Electorate,
    parties: &[Party],
    plan: &RegionPlan,
    params: &AssignmentParams,
    snapshot_count: u32,
    sink: &mut dyn SnapshotSink,
) -> VoteTally {
    count(electorate, parties, plan, params, snapshot_count, sink, None)
}

/// Like [`tabulate`], also returning every voter's choice in voter order.
pub fn tabulate_with_choices(
    electorate: &Electorate,
    parties: &[Party],
    plan: &RegionPlan,
    params: &AssignmentParams,
    snapshot_count: u32,
    sink: &mut dyn SnapshotSink,
) -> (VoteTally, Vec<Choice>) {
    let mut choices = Vec::with_capacity(electorate.population() as usize);
    let tally = count(electorate, parties, plan, params, snapshot_count, sink, Some(&mut choices));
    (tally, choices)
}

fn count(
    electorate: &Electorate,
    parties: &[Party],
    plan: &RegionPlan,
    params: &AssignmentParams,
    snapshot_count: u32,
    sink: &mut dyn SnapshotSink,
    mut choices: Option<&mut Vec<Choice>>,
) -> VoteTally {
    let population = electorate.population();
    let every = population / u64::from(snapshot_count.max(1)) + 1;

    let mut tally = VoteTally::empty(parties);
    let mut cursor = plan.cursor();

    for i in 0..population {
        let voter = electorate.voter(i as usize);
        let choice = assign_voter(&voter, parties, cursor.favored_for(i), params);
        match choice {
            Choice::Vote(idx) => tally.counts[idx] += 1,
            Choice::Abstain => tally.abstentions += 1,
        }
        if let Some(out) = choices.as_deref_mut() {
            out.push(choice);
        }

        let processed = i + 1;
        if processed % every == 0 && processed < population {
            sink.on_snapshot(&TallySnapshot {
                processed,
                population,
                counts: &tally.counts,
                abstentions: tally.abstentions,
            });
        }
    }

    sink.on_snapshot(&TallySnapshot {
        processed: population,
        population,
        counts: &tally.counts,
        abstentions: tally.abstentions,
    });

    tracing::debug!(
        population,
        cast = tally.cast(),
        abstentions = tally.abstentions,
        "tabulation complete"
    );
    tally
}
