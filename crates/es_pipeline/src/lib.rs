//! es_pipeline — one deterministic election run, end to end.
//!
//! validate → merge → (baseline jitter) electorate → tabulate (or runoff rounds) → apportion →
//! coalition (only without a majority) → government profile.
//!
//! This crate stays I/O-free: callers load inputs however they like and hand
//! them over as an [`ElectionInput`]. Every random draw flows from
//! `RunConfig::seed`, so the same input reproduces the same outcome.

#![forbid(unsafe_code)]

pub mod campaign;
pub mod fingerprint;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use es_algo::{
    apportion, form_coalition, merge_parties, resolve_rounds, tabulate, AllocError, Apportionment,
    AutoAccept, CoalitionOutcome, CoalitionParams, Electorate, ElectorateSpec, GovernmentProfile,
    MergeDecider, MergeReport, NoSnapshots, RegionPlan, RoundContext, RoundsOutcome, SeatRules,
    SnapshotSink, VoteTally,
};
use es_core::variables::ElectoralSystem;
use es_core::{ConfigError, IdeologyVector, Party, PartyDef, RunConfig, RunId, SimRng};

pub use campaign::{run_campaign, CampaignEvent, CampaignParams, CampaignReport, EventRecord, PollRecord};
pub use fingerprint::run_fingerprint;

/// Single error surface for the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("apportionment: {0}")]
    Alloc(#[from] AllocError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionInput {
    pub parties: Vec<PartyDef>,
    pub electorate: ElectorateSpec,
    #[serde(default)]
    pub config: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionOutcome {
    pub run_id: RunId,
    /// Parties contesting the final count (after merging and eliminations).
    pub parties: Vec<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<RoundsOutcome>,
    /// Electorate baseline actually sampled (after jitter).
    pub baseline: IdeologyVector,
    /// Per-axis mean of the sampled voters.
    pub electorate_mean: IdeologyVector,
    /// Final tally; indices follow `parties`.
    pub tally: VoteTally,
    /// `tally.counts` scaled by the electorate's `scale_factor`.
    pub reported_votes: Vec<u64>,
    pub seats: Apportionment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coalition: Option<CoalitionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub government: Option<GovernmentProfile>,
}

impl ElectionOutcome {
    /// Leader's share of cast votes in the final count.
    pub fn leader_share(&self) -> f64 {
        self.tally.leader().map_or(0.0, |l| self.tally.share(l.index))
    }
}

/// Parties after validation and, when enabled, merging.
pub(crate) fn prepare_parties(
    input: &ElectionInput,
    decider: &mut dyn MergeDecider,
) -> Result<(Vec<Party>, Option<MergeReport>), PipelineError> {
    input.config.validate()?;
    input.electorate.validate()?;
    let initial = Party::list_from_defs(&input.parties)?;

    if !input.config.merge.enabled {
        return Ok((initial, None));
    }
    let report = merge_parties(&initial, input.config.merge.threshold, decider);
    Ok((report.parties.clone(), Some(report)))
}

/// Jitter the baseline when configured, then sample the voters. Returns the
/// baseline that was sampled.
pub(crate) fn sample_electorate(
    input: &ElectionInput,
    rng: &mut SimRng,
) -> Result<(IdeologyVector, Electorate), PipelineError> {
    let amplitude = input.config.baseline_jitter;
    let sampled = if amplitude > 0.0 {
        let spec = input.electorate.jittered(amplitude, rng);
        tracing::debug!(amplitude, baseline = ?spec.baseline.values(), "baseline jittered");
        (spec.baseline, Electorate::generate(&spec, rng)?)
    } else {
        (input.electorate.baseline, Electorate::generate(&input.electorate, rng)?)
    };
    Ok(sampled)
}

/// Run one election.
pub fn run_election(
    input: &ElectionInput,
    decider: &mut dyn MergeDecider,
    sink: &mut dyn SnapshotSink,
) -> Result<ElectionOutcome, PipelineError> {
    let cfg = &input.config;
    let run_id = run_fingerprint(cfg, &input.parties)?;
    let (parties, merge) = prepare_parties(input, decider)?;

    let mut rng = SimRng::from_seed_u64(cfg.seed);
    let (baseline, electorate) = sample_electorate(input, &mut rng)?;

    let (contest, tally, rounds) = match cfg.system {
        ElectoralSystem::Plurality | ElectoralSystem::Proportional => {
            let plan = RegionPlan::draw(&parties, electorate.population(), cfg.region_slots, &mut rng);
            let tally = tabulate(&electorate, &parties, &plan, &cfg.assignment, cfg.snapshot_count, sink);
            (parties, tally, None)
        }
        ElectoralSystem::Runoff(rule) => {
            let ctx = RoundContext {
                params: cfg.assignment,
                region_slots: cfg.region_slots,
                snapshot_count: cfg.snapshot_count,
            };
            let outcome = resolve_rounds(&electorate, &parties, rule, &ctx, &mut rng, sink);
            let tally = outcome.final_tally().clone();
            (outcome.survivors.clone(), tally, Some(outcome))
        }
    };

    let seats = apportion(&tally, &SeatRules::from_config(cfg), Some(&mut rng))?;

    let leader_share = tally.leader().map_or(0.0, |l| tally.share(l.index));
    let coalition = if leader_share < 0.5 && tally.cast() > 0 {
        let params = CoalitionParams::new(cfg.coalition_factor, cfg.assignment.non_voter_distance);
        Some(form_coalition(&contest, &tally, &params))
    } else {
        None
    };
    let government = match &coalition {
        Some(c) => {
            if !c.success {
                tracing::warn!(leader = %c.leader, share = c.share, "no coalition reaches a majority; minority government");
            }
            Some(GovernmentProfile::of_coalition(&contest, c))
        }
        None => GovernmentProfile::single_party(&contest, &tally),
    };

    tracing::info!(
        run = run_id.as_str(),
        parties = contest.len(),
        cast = tally.cast(),
        abstentions = tally.abstentions,
        leader_share,
        "election complete"
    );

    let reported_votes = tally.counts.iter().map(|&v| electorate.scale_votes(v)).collect();

    Ok(ElectionOutcome {
        run_id,
        parties: contest,
        merge,
        rounds,
        baseline,
        electorate_mean: electorate.mean(),
        tally,
        reported_votes,
        seats,
        coalition,
        government,
    })
}

/// `run_election` with every merge accepted and no snapshot observer.
pub fn run_election_default(input: &ElectionInput) -> Result<ElectionOutcome, PipelineError> {
    run_election(input, &mut AutoAccept, &mut NoSnapshots)
}

/// Pretty JSON of an outcome.
pub fn export_json(outcome: &ElectionOutcome) -> Result<String, PipelineError> {
    Ok(serde_json::to_string_pretty(outcome)?)
}
