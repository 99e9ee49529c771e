//! Party-merge preprocessor.
//!
//! Contract:
//! - Distance between two parties: `√(Σ dᵢ² + P · opposed_axes)` with
//!   `P = 100000 / 7`, so parties on opposite sides of any axis are never
//!   "too similar".
//! - A pass walks anchors `0, 1, …`; each anchor is compared with its nearest
//!   other party. Below the threshold the decider is asked; an accepted merge
//!   builds a new list (merged party at the anchor's slot, partner dropped)
//!   and restarts the walk at anchor 0. The pass ends when the walk wraps.
//! - Passes repeat until one performs zero merges; the output is then a fixed
//!   point for the same threshold under auto-accept.
//! - Merged party: per-axis mean rounded to an integer, popularity
//!   `√(a² + b²)`, leader (display name, colour, swing) chosen by the decider.
//! - Ids are reassigned `0..n` at the end.

use serde::{Deserialize, Serialize};

use es_core::determinism::cmp_f64_nan_last;
use es_core::ideology::AXIS_COUNT;
use es_core::party::{reassign_ids, Party};

/// Penalty added (inside the root) per axis where the two parties disagree in sign.
pub const MERGE_SIGN_PENALTY: f64 = 100_000.0 / AXIS_COUNT as f64;

/// Party-list size the base threshold is calibrated for.
const STANDARD_LIST: f64 = 6.0;

/// Similarity (0..=100) above which the anchor's label is kept unchanged.
const SIMILAR_NAMES: f64 = 60.0;

/// Labels this long (after dropping a trailing "Party") are reduced to initials.
const LONG_LABEL: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeLeader {
    Anchor,
    Absorbed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
    Accept { label: String, leader: MergeLeader },
    Decline,
}

/// Decides on each proposed merge. The presentation layer may ask a human.
pub trait MergeDecider {
    fn decide(&mut self, anchor: &Party, other: &Party, proposed: &str) -> MergeDecision;
}

/// Accepts every proposal with the generated label; the anchor leads.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAccept;

impl MergeDecider for AutoAccept {
    fn decide(&mut self, _anchor: &Party, _other: &Party, proposed: &str) -> MergeDecision {
        MergeDecision::Accept {
            label: proposed.to_string(),
            leader: MergeLeader::Anchor,
        }
    }
}

/// Closures return the accepted label, or `None` to decline.
impl<F> MergeDecider for F
where
    F: FnMut(&Party, &Party, &str) -> Option<String>,
{
    fn decide(&mut self, anchor: &Party, other: &Party, proposed: &str) -> MergeDecision {
        match self(anchor, other, proposed) {
            Some(label) => MergeDecision::Accept { label, leader: MergeLeader::Anchor },
            None => MergeDecision::Decline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub anchor: String,
    pub absorbed: String,
    pub merged: String,
    pub leader: MergeLeader,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub parties: Vec<Party>,
    pub merges: Vec<MergeRecord>,
    /// `(anchor, other)` labels of declined proposals.
    pub declined: Vec<(String, String)>,
    /// Threshold actually used (after list-size scaling).
    pub threshold: f64,
    pub passes: u32,
}

/// Base threshold scaled to the list size: `base · (1 + (n − 6)/5)`, never negative.
pub fn scaled_threshold(base: f64, party_count: usize) -> f64 {
    (base * (1.0 + (party_count as f64 - STANDARD_LIST) / 5.0)).max(0.0)
}

pub fn merge_distance(a: &Party, b: &Party) -> f64 {
    let opposed = a.ideology.opposed_axes(&b.ideology) as f64;
    (a.ideology.squared_distance(&b.ideology) + MERGE_SIGN_PENALTY * opposed).sqrt()
}

/// Label for a merged party.
///
/// Similar labels keep the first one. Otherwise a trailing "Party" is dropped
/// from the first label, a long first label becomes its initials, and the
/// result is `"{first} - {second}"`.
pub fn merge_names(first: &str, second: &str) -> String {
    let similarity = strsim::normalized_levenshtein(first, second) * 100.0;
    if similarity > SIMILAR_NAMES {
        return first.to_string();
    }

    let words: Vec<&str> = first.split_whitespace().collect();
    let mut head = match words.split_last() {
        Some((&"Party", rest)) => rest.join(" "),
        _ => first.to_string(),
    };
    if head.chars().count() >= LONG_LABEL {
        head = words.iter().filter_map(|w| w.chars().next()).collect();
    }
    format!("{head} - {second}")
}

/// Combine two parties; `anchor`'s id is kept until ids are reassigned.
pub fn merge_pair(anchor: &Party, other: &Party, label: String, leader: MergeLeader) -> Party {
    let lead = match leader {
        MergeLeader::Anchor => anchor,
        MergeLeader::Absorbed => other,
    };
    let mut merged = lead.clone();
    merged.id = anchor.id;
    merged.label = label;
    merged.ideology = anchor.ideology.midpoint_rounded(&other.ideology);
    merged.set_popularity(anchor.popularity().hypot(other.popularity()));
    merged
}

/// Merge with the threshold scaled to the input list size.
pub fn merge_parties(parties: &[Party], base_threshold: f64, decider: &mut dyn MergeDecider) -> MergeReport {
    let threshold = scaled_threshold(base_threshold, parties.len());
    merge_with_threshold(parties, threshold, decider)
}

/// Merge with an explicit (already scaled) threshold.
pub fn merge_with_threshold(parties: &[Party], threshold: f64, decider: &mut dyn MergeDecider) -> MergeReport {
    let mut report = MergeReport {
        parties: parties.to_vec(),
        merges: Vec::new(),
        declined: Vec::new(),
        threshold,
        passes: 0,
    };

    loop {
        let before = report.merges.len();
        let current = core::mem::take(&mut report.parties);
        report.parties = merge_pass(current, threshold, decider, &mut report);
        report.passes += 1;
        if report.merges.len() == before {
            break;
        }
    }

    reassign_ids(&mut report.parties);
    tracing::info!(
        before = parties.len(),
        after = report.parties.len(),
        merges = report.merges.len(),
        threshold,
        "party merge complete"
    );
    report
}

fn nearest_other(list: &[Party], anchor: usize) -> Option<(usize, f64)> {
    list.iter()
        .enumerate()
        .filter(|(j, _)| *j != anchor)
        .map(|(j, p)| (j, merge_distance(&list[anchor], p)))
        .min_by(|a, b| cmp_f64_nan_last(a.1, b.1).then(a.0.cmp(&b.0)))
}

fn merge_pass(
    mut list: Vec<Party>,
    threshold: f64,
    decider: &mut dyn MergeDecider,
    report: &mut MergeReport,
) -> Vec<Party> {
    let mut x = 0usize;
    while list.len() > 1 {
        if let Some((j, d)) = nearest_other(&list, x) {
            if d < threshold {
                let proposed = merge_names(&list[x].label, &list[j].label);
                tracing::debug!(anchor = %list[x].label, other = %list[j].label, distance = d, "merge proposed");
                match decider.decide(&list[x], &list[j], &proposed) {
                    MergeDecision::Accept { label, leader } => {
                        let merged = merge_pair(&list[x], &list[j], label, leader);
                        report.merges.push(MergeRecord {
                            anchor: list[x].label.clone(),
                            absorbed: list[j].label.clone(),
                            merged: merged.label.clone(),
                            leader,
                            distance: d,
                        });
                        list = list
                            .into_iter()
                            .enumerate()
                            .filter(|(i, _)| *i != j)
                            .map(|(i, p)| if i == x { merged.clone() } else { p })
                            .collect();
                        x = 0;
                        continue;
                    }
                    MergeDecision::Decline => {
                        report.declined.push((list[x].label.clone(), list[j].label.clone()));
                    }
                }
            }
        }
        x += 1;
        if x >= list.len() {
            break;
        }
    }
    list
}
