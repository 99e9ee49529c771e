//! Campaign polling: a series of tabulations over one fixed electorate while
//! party popularity drifts, closed by an election-day count with higher turnout.
//!
//! Each count sees the electorate through a fresh per-voter wobble; scripted
//! events reposition parties between polls; published poll numbers carry a
//! small multiplicative noise. The report ends with a voter transfer matrix
//! from the first poll to election day.
//!
//! Poll history is returned as values (`PollRecord`s carrying their own deltas),
//! never kept in shared state, so two campaigns can run side by side.

use serde::{Deserialize, Serialize};

use es_algo::{
    apply_event_effect, tabulate, tabulate_with_choices, transfer_matrix, Choice, Electorate, EventEffect,
    MergeDecider, MergeReport, NoSnapshots, RegionPlan, VoteTally, VoterTransfer,
};
use es_core::{Axis, ConfigError, IdeologyVector, Party, PartyId, RunId, SimRng};

use crate::{prepare_parties, run_fingerprint, sample_electorate, ElectionInput, PipelineError};

/// A scripted campaign event: before poll `poll` is counted, `party` moves
/// along `shift` and its popularity reacts (see `es_algo::events`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignEvent {
    /// 1-based; `polls + 1` targets election day.
    pub poll: u32,
    /// Id in the active list, i.e. after merging.
    pub party: PartyId,
    #[serde(default)]
    pub shift: Vec<(Axis, f64)>,
    pub boost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignParams {
    /// Opinion polls before election day.
    pub polls: u32,
    /// Each poll, every party's popularity moves by a uniform draw in ±this.
    pub poll_volatility: f64,
    /// Each count, every voter value moves by a uniform draw in ±this. The
    /// wobble is per count; the electorate itself never drifts.
    pub voter_volatility: f64,
    /// Published poll counts are `floor(count · f)`, `f ~ U(1 − noise, 1 + noise)`
    /// drawn once per poll. Election day is published exactly.
    pub polling_noise: f64,
    /// Election day widens the abstention radius by this factor.
    pub election_day_turnout_boost: f64,
    pub events: Vec<CampaignEvent>,
}

impl Default for CampaignParams {
    fn default() -> Self {
        Self {
            polls: 10,
            poll_volatility: 0.5,
            voter_volatility: 2.0,
            polling_noise: 0.005,
            election_day_turnout_boost: 1.05,
            events: Vec::new(),
        }
    }
}

fn non_negative(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::DomainOutOfRange { field, value: v })
    }
}

impl CampaignParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("campaign.poll_volatility", self.poll_volatility)?;
        non_negative("campaign.voter_volatility", self.voter_volatility)?;
        non_negative("campaign.polling_noise", self.polling_noise)?;
        if self.polling_noise >= 1.0 {
            return Err(ConfigError::DomainOutOfRange {
                field: "campaign.polling_noise",
                value: self.polling_noise,
            });
        }
        if !(self.election_day_turnout_boost.is_finite() && self.election_day_turnout_boost > 0.0) {
            return Err(ConfigError::DomainOutOfRange {
                field: "campaign.election_day_turnout_boost",
                value: self.election_day_turnout_boost,
            });
        }
        for ev in &self.events {
            if ev.poll == 0 || ev.poll > self.polls.saturating_add(1) {
                return Err(ConfigError::DomainOutOfRange {
                    field: "campaign.events.poll",
                    value: f64::from(ev.poll),
                });
            }
            if !ev.boost.is_finite() {
                return Err(ConfigError::DomainOutOfRange { field: "campaign.events.boost", value: ev.boost });
            }
            if let Some(&(_, bad)) = ev.shift.iter().find(|(_, d)| !d.is_finite()) {
                return Err(ConfigError::DomainOutOfRange { field: "campaign.events.shift", value: bad });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollRecord {
    /// 1-based; election day is `polls + 1`.
    pub poll: u32,
    pub election_day: bool,
    /// Share of published votes per party, in party-list order.
    pub shares: Vec<(PartyId, f64)>,
    /// Change against the previous poll (zero for the first).
    pub delta_previous: Vec<f64>,
    /// Change against the first poll.
    pub delta_first: Vec<f64>,
    pub turnout: f64,
    /// Popularity each party polled with.
    pub popularity: Vec<f64>,
    /// Noise multiplier applied to the published counts (1 on election day).
    pub noise: f64,
    /// Counts as published, after noise.
    pub published: Vec<u64>,
    /// Exact count.
    pub tally: VoteTally,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub poll: u32,
    pub party: PartyId,
    pub effect: EventEffect,
    /// Popularity right after the event.
    pub popularity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignReport {
    pub run_id: RunId,
    /// Electorate baseline actually sampled (after jitter).
    pub baseline: IdeologyVector,
    /// Parties with their popularity and position as of election day.
    pub parties: Vec<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeReport>,
    pub polls: Vec<PollRecord>,
    pub events: Vec<EventRecord>,
    pub election: PollRecord,
    /// First poll → election day, per voter. Empty without polls.
    pub transfers: Vec<VoterTransfer>,
}

fn share_of(counts: &[u64], idx: usize) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        0.0
    } else {
        counts[idx] as f64 / total as f64
    }
}

fn deltas(now: &[(PartyId, f64)], then: Option<&PollRecord>) -> Vec<f64> {
    match then {
        Some(prev) => now
            .iter()
            .zip(prev.shares.iter())
            .map(|((_, a), (_, b))| a - b)
            .collect(),
        None => vec![0.0; now.len()],
    }
}

fn record(
    poll: u32,
    election_day: bool,
    parties: &[Party],
    tally: VoteTally,
    noise: f64,
    history: &[PollRecord],
) -> PollRecord {
    let published: Vec<u64> = if election_day {
        tally.counts.clone()
    } else {
        tally.counts.iter().map(|&v| (v as f64 * noise).floor() as u64).collect()
    };
    let shares: Vec<(PartyId, f64)> = tally
        .parties
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, share_of(&published, i)))
        .collect();
    let delta_previous = deltas(&shares, history.last());
    let delta_first = deltas(&shares, history.first());
    PollRecord {
        poll,
        election_day,
        delta_previous,
        delta_first,
        turnout: tally.turnout(),
        popularity: parties.iter().map(Party::popularity).collect(),
        noise,
        published,
        shares,
        tally,
    }
}

fn check_event_parties(params: &CampaignParams, parties: &[Party]) -> Result<(), ConfigError> {
    match params.events.iter().find(|ev| ev.party.get() as usize >= parties.len()) {
        Some(ev) => Err(ConfigError::DomainOutOfRange {
            field: "campaign.events.party",
            value: f64::from(ev.party.get()),
        }),
        None => Ok(()),
    }
}

fn apply_events(
    poll: u32,
    params: &CampaignParams,
    parties: &mut [Party],
    baseline: &IdeologyVector,
    rng: &mut SimRng,
    out: &mut Vec<EventRecord>,
) {
    for ev in params.events.iter().filter(|ev| ev.poll == poll) {
        let Some(party) = parties.get_mut(ev.party.get() as usize) else {
            continue;
        };
        let effect = apply_event_effect(party, &ev.shift, ev.boost, baseline, rng);
        out.push(EventRecord { poll, party: ev.party, effect, popularity: party.popularity() });
    }
}

/// This count's view of the electorate.
fn wobble(electorate: &Electorate, amplitude: f64, rng: &mut SimRng) -> Option<Electorate> {
    (amplitude > 0.0).then(|| electorate.perturbed(amplitude, rng))
}

/// Run `params.polls` opinion polls and the election-day count.
///
/// Draw order per poll: popularity drift, events, voter wobble, region plan,
/// polling noise. Election day skips the drift and the noise.
pub fn run_campaign(
    input: &ElectionInput,
    params: &CampaignParams,
    decider: &mut dyn MergeDecider,
) -> Result<CampaignReport, PipelineError> {
    params.validate()?;
    let cfg = &input.config;
    let run_id = run_fingerprint(cfg, &input.parties)?;
    let (mut parties, merge) = prepare_parties(input, decider)?;
    check_event_parties(params, &parties)?;

    let mut rng = SimRng::from_seed_u64(cfg.seed);
    let (baseline, electorate) = sample_electorate(input, &mut rng)?;
    let half = params.poll_volatility;
    let noise = params.polling_noise;

    let mut polls: Vec<PollRecord> = Vec::with_capacity(params.polls as usize);
    let mut events: Vec<EventRecord> = Vec::new();
    let mut first_choices: Option<Vec<Choice>> = None;
    for poll in 1..=params.polls {
        for p in parties.iter_mut() {
            let drift = rng.uniform(-half, half);
            p.nudge_popularity(drift);
        }
        apply_events(poll, params, &mut parties, &baseline, &mut rng, &mut events);

        let view = wobble(&electorate, params.voter_volatility, &mut rng);
        let voters = view.as_ref().unwrap_or(&electorate);
        let plan = RegionPlan::draw(&parties, voters.population(), cfg.region_slots, &mut rng);
        let tally = if first_choices.is_none() {
            let (tally, choices) =
                tabulate_with_choices(voters, &parties, &plan, &cfg.assignment, cfg.snapshot_count, &mut NoSnapshots);
            first_choices = Some(choices);
            tally
        } else {
            tabulate(voters, &parties, &plan, &cfg.assignment, cfg.snapshot_count, &mut NoSnapshots)
        };
        let factor = if noise > 0.0 { rng.uniform(1.0 - noise, 1.0 + noise) } else { 1.0 };

        let rec = record(poll, false, &parties, tally, factor, &polls);
        tracing::debug!(poll, turnout = rec.turnout, noise = factor, "poll counted");
        polls.push(rec);
    }

    let day = params.polls + 1;
    apply_events(day, params, &mut parties, &baseline, &mut rng, &mut events);
    let boosted = cfg.assignment.with_turnout_boost(params.election_day_turnout_boost);
    let view = wobble(&electorate, params.voter_volatility, &mut rng);
    let voters = view.as_ref().unwrap_or(&electorate);
    let plan = RegionPlan::draw(&parties, voters.population(), cfg.region_slots, &mut rng);
    let (tally, final_choices) =
        tabulate_with_choices(voters, &parties, &plan, &boosted, cfg.snapshot_count, &mut NoSnapshots);
    let election = record(day, true, &parties, tally, 1.0, &polls);

    let transfers = match &first_choices {
        Some(first) => transfer_matrix(&election.tally.parties, first, &final_choices),
        None => Vec::new(),
    };
    tracing::info!(
        polls = polls.len(),
        events = events.len(),
        turnout = election.turnout,
        "campaign complete"
    );

    Ok(CampaignReport { run_id, baseline, parties, merge, polls, events, election, transfers })
}
