//! End-to-end scenarios over the public pipeline surface.

use es_algo::{
    apportion, form_coalition, CoalitionParams, ElectorateSpec, SeatRules, TallySnapshot, VoteTally,
};
use es_core::variables::{DivisorMethod, ElectoralSystem, KeepRule, RunoffRule};
use es_core::{Axis, ConfigError, IdeologyVector, Party, PartyDef, PartyId, RunConfig};
use es_pipeline::{export_json, run_election, run_election_default, ElectionInput, PipelineError};
use proptest::prelude::*;

fn config(seed: u64) -> RunConfig {
    let mut cfg = RunConfig::default();
    cfg.seed = seed;
    cfg.merge.enabled = false;
    cfg
}

fn four_way(seed: u64, population: u64) -> ElectionInput {
    ElectionInput {
        parties: vec![
            PartyDef::new("Ada", "Left Bloc", IdeologyVector::new([-40.0, 10.0, -30.0, -50.0, 20.0, 0.0, 30.0]), 1.0),
            PartyDef::new("Ben", "Centre", IdeologyVector::new([0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0]), 0.5),
            PartyDef::new("Cy", "Right Union", IdeologyVector::new([45.0, -20.0, 35.0, 40.0, -10.0, 10.0, -40.0]), 1.5)
                .with_swing(0.8),
            PartyDef::new("Di", "Greens", IdeologyVector::new([-20.0, 40.0, -80.0, -10.0, 40.0, 0.0, 10.0]), -0.5),
        ],
        electorate: ElectorateSpec::new(population, IdeologyVector::centre()),
        config: config(seed),
    }
}

#[test]
fn identical_parties_go_to_the_more_popular_one() {
    let mut cfg = config(7);
    cfg.assignment.regional_effect = 1.0;
    cfg.assignment.non_voter_distance = 10_000.0;
    let input = ElectionInput {
        parties: vec![
            PartyDef::new("Twin A", "A", IdeologyVector::new([15.0; 7]), 5.0),
            PartyDef::new("Twin B", "B", IdeologyVector::new([15.0; 7]), 0.0),
        ],
        electorate: ElectorateSpec::new(1000, IdeologyVector::centre()),
        config: cfg,
    };

    let out = run_election_default(&input).unwrap();
    assert_eq!(out.tally.counts, vec![1000, 0]);
    assert_eq!(out.tally.abstentions, 0);
    assert_eq!(out.seats.seats_of(PartyId::new(0)), 100);
    assert!(out.coalition.is_none());
}

#[test]
fn centrist_beats_extremes() {
    let input = ElectionInput {
        parties: vec![
            PartyDef::new("Mid", "Centre", IdeologyVector::centre(), 0.0),
            PartyDef::new("Hi", "High", IdeologyVector::new([100.0; 7]), 0.0),
            PartyDef::new("Lo", "Low", IdeologyVector::new([-100.0; 7]), 0.0),
            PartyDef::new("Zig", "Zig", IdeologyVector::new([100.0, -100.0, 100.0, -100.0, 100.0, -100.0, 100.0]), 0.0),
            PartyDef::new("Zag", "Zag", IdeologyVector::new([-100.0, 100.0, -100.0, 100.0, -100.0, 100.0, -100.0]), 0.0),
        ],
        electorate: ElectorateSpec::new(100_000, IdeologyVector::centre()),
        config: config(42),
    };

    let out = run_election_default(&input).unwrap();
    let leader = out.tally.leader().unwrap();
    assert_eq!(leader.party, PartyId::new(0));
    for i in 1..5 {
        assert!(out.tally.counts[0] > out.tally.counts[i]);
    }
}

#[test]
fn apportionment_of_600_300_100() {
    let tally = VoteTally {
        parties: vec![PartyId::new(0), PartyId::new(1), PartyId::new(2)],
        counts: vec![600, 300, 100],
        abstentions: 0,
    };
    for method in [DivisorMethod::HuntingtonHill, DivisorMethod::DHondt, DivisorMethod::SainteLague] {
        let seats = apportion(&tally, &SeatRules::new(10, method), None).unwrap();
        assert_eq!(seats.total(), 10, "{method:?}");
        assert!(seats.seats_of(PartyId::new(0)) > seats.seats_of(PartyId::new(2)), "{method:?}");
    }
}

#[test]
fn isolated_parties_exhaust_every_leader() {
    let defs = [
        [100.0; 7],
        [-100.0; 7],
        [100.0, -100.0, 100.0, -100.0, 100.0, -100.0, 100.0],
        [-100.0, 100.0, -100.0, 100.0, -100.0, 100.0, -100.0],
    ];
    let parties: Vec<Party> = defs
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let def = PartyDef::new(format!("P{i}"), format!("L{i}"), IdeologyVector::new(*v), 0.0);
            Party::from_def(PartyId::from_index(i), &def).unwrap()
        })
        .collect();
    let tally = VoteTally {
        parties: parties.iter().map(|p| p.id).collect(),
        counts: vec![30, 25, 25, 20],
        abstentions: 0,
    };

    let out = form_coalition(&parties, &tally, &CoalitionParams::new(1.1, 190.0));
    assert!(!out.success);
    assert_eq!(out.leader_advances, 3);
    assert_eq!(out.leader, PartyId::new(0));
    assert!(out.partners.is_empty());
}

#[test]
fn same_seed_same_outcome() {
    let a = run_election_default(&four_way(99, 2000)).unwrap();
    let b = run_election_default(&four_way(99, 2000)).unwrap();
    assert_eq!(a, b);
    assert_eq!(export_json(&a).unwrap(), export_json(&b).unwrap());

    let c = run_election_default(&four_way(100, 2000)).unwrap();
    assert_ne!(a.run_id, c.run_id);
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let mut input = four_way(1, 100);
    input.config.seats = 0;
    assert!(matches!(
        run_election_default(&input),
        Err(PipelineError::Config(ConfigError::NoSeats))
    ));

    let mut input = four_way(1, 100);
    input.parties.clear();
    assert!(matches!(
        run_election_default(&input),
        Err(PipelineError::Config(ConfigError::NoParties))
    ));

    let mut input = four_way(1, 100);
    input.electorate.population = 0;
    assert!(matches!(
        run_election_default(&input),
        Err(PipelineError::Config(ConfigError::NonPositivePopulation))
    ));
}

#[test]
fn snapshots_reach_the_sink() {
    let mut input = four_way(5, 1000);
    input.config.system = ElectoralSystem::Plurality;
    input.config.snapshot_count = 10;

    let mut seen: Vec<u64> = Vec::new();
    let mut sink = |s: &TallySnapshot<'_>| seen.push(s.processed);
    run_election(&input, &mut es_algo::AutoAccept, &mut sink).unwrap();

    assert_eq!(seen.len(), 10);
    assert_eq!(seen.last(), Some(&1000));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn runoff_final_tally_matches_survivors() {
    let mut input = four_way(17, 1500);
    input.config.system = ElectoralSystem::Runoff(RunoffRule { keep: KeepRule::TopTwo, max_rounds: 4 });

    let out = run_election_default(&input).unwrap();
    let rounds = out.rounds.as_ref().unwrap();
    assert!(!rounds.rounds.is_empty());
    assert_eq!(&out.tally, rounds.final_tally());
    assert_eq!(out.tally.parties, out.parties.iter().map(|p| p.id).collect::<Vec<_>>());
    if rounds.rounds.len() > 1 {
        assert!(out.parties.len() <= 2);
    }
}

#[test]
fn close_parties_merge_before_the_count() {
    let mut input = four_way(3, 500);
    input.config.merge.enabled = true;
    input.parties = vec![
        PartyDef::new("Ann", "Liberal Party", IdeologyVector::new([10.0; 7]), 1.0),
        PartyDef::new("Bo", "Liberal Democrats", IdeologyVector::new([12.0; 7]), 2.0),
        PartyDef::new("Cal", "Nationals", IdeologyVector::new([-60.0; 7]), 0.0),
    ];

    let merged = run_election_default(&input).unwrap();
    assert_eq!(merged.merge.as_ref().map(|m| m.merges.len()), Some(1));
    assert_eq!(merged.parties.len(), 2);
    assert_eq!(merged.tally.counts.len(), 2);

    let mut refuse = |_: &Party, _: &Party, _: &str| -> Option<String> { None };
    let kept = run_election(&input, &mut refuse, &mut es_algo::NoSnapshots).unwrap();
    assert_eq!(kept.parties.len(), 3);
    assert!(kept.merge.as_ref().map_or(false, |m| m.merges.is_empty()));
}

#[test]
fn coalition_runs_only_without_majority() {
    for seed in 0..6 {
        let out = run_election_default(&four_way(seed, 1500)).unwrap();
        assert_eq!(out.coalition.is_some(), out.leader_share() < 0.5);
        let gov = out.government.as_ref().unwrap();
        if let Some(c) = &out.coalition {
            assert_eq!(gov.members, c.members());
            assert_eq!(gov.majority, c.success);
        }
    }
}

#[test]
fn baseline_jitter_moves_the_sampled_electorate() {
    let mut input = four_way(12, 5000);
    input.electorate.spread = [10.0; 7];

    let plain = run_election_default(&input).unwrap();
    assert_eq!(plain.baseline, IdeologyVector::centre());

    input.config.baseline_jitter = 40.0;
    let jittered = run_election_default(&input).unwrap();
    assert_ne!(jittered.baseline, IdeologyVector::centre());
    assert!(Axis::ALL.iter().all(|&a| jittered.baseline.get(a).abs() <= 20.0));

    let mut moved = false;
    for axis in Axis::ALL {
        // sample means sit within a fraction of a point of what was sampled
        assert!((plain.electorate_mean.get(axis) - plain.baseline.get(axis)).abs() < 1.0, "{axis}");
        assert!((jittered.electorate_mean.get(axis) - jittered.baseline.get(axis)).abs() < 1.0, "{axis}");
        moved |= (jittered.electorate_mean.get(axis) - plain.electorate_mean.get(axis)).abs() > 1.0;
    }
    assert!(moved);
    assert_ne!(plain.run_id, jittered.run_id);
}

#[test]
fn reported_votes_apply_the_scale_factor() {
    let mut input = four_way(4, 800);
    input.electorate.scale_factor = 250;
    let out = run_election_default(&input).unwrap();
    let expected: Vec<u64> = out.tally.counts.iter().map(|v| v * 250).collect();
    assert_eq!(out.reported_votes, expected);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn every_voter_is_counted_once(seed in any::<u64>(), population in 1u64..400) {
        let out = run_election_default(&four_way(seed, population)).unwrap();
        prop_assert_eq!(out.tally.cast() + out.tally.abstentions, population);
        prop_assert!(out.seats.total() + out.seats.unallocated == 100);
    }
}
