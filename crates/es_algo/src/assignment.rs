//! Voter assignment rule: which party (if any) one voter picks.
//!
//! Contract:
//! - Adjusted distance = squared ideology distance
//!   − (popularity · k)²
//!   − (swing · k′) · |swing · k′|
//!   then × `regional_effect` for the regional favorite.
//! - The popularity term is subtracted whatever its sign, so a strongly
//!   negative popularity helps exactly as much as a strongly positive one.
//! - Parties are scanned in list order and the first strict minimum wins.
//! - The voter abstains when that minimum exceeds `non_voter_distance²`,
//!   unless voting is mandatory.

use es_core::ideology::IdeologyVector;
use es_core::party::Party;
use es_core::variables::AssignmentParams;

/// Outcome of the rule for one voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Index into the active party list.
    Vote(usize),
    Abstain,
}

/// Adjusted distance of one voter to one party.
#[inline]
pub fn adjusted_distance(
    voter: &IdeologyVector,
    party: &Party,
    favored: bool,
    params: &AssignmentParams,
) -> f64 {
    let pop = party.popularity() * params.popularity_factor;
    let mut d = voter.squared_distance(&party.ideology) - pop * pop;
    if let Some(swing) = party.swing {
        let s = swing * params.swing_factor;
        d -= s * s.abs();
    }
    if favored {
        // Applied as-is, so a negative distance gets *less* negative.
        d *= params.regional_effect;
    }
    d
}

/// Apply the rule. `favored` is the list index of the current regional favorite.
pub fn assign_voter(
    voter: &IdeologyVector,
    parties: &[Party],
    favored: Option<usize>,
    params: &AssignmentParams,
) -> Choice {
    let mut best: Option<(usize, f64)> = None;
    for (i, party) in parties.iter().enumerate() {
        let d = adjusted_distance(voter, party, favored == Some(i), params);
        if best.map_or(true, |(_, b)| d < b) {
            best = Some((i, d));
        }
    }

    let Some((idx, d)) = best else {
        return Choice::Abstain;
    };
    let limit = params.non_voter_distance * params.non_voter_distance;
    if params.mandatory_voting || d <= limit {
        Choice::Vote(idx)
    } else {
        Choice::Abstain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_core::ids::PartyId;
    use es_core::party::PartyDef;

    fn party(i: u32, at: f64, pop: f64) -> Party {
        let def = PartyDef::new("n", "l", IdeologyVector::new([at; 7]), pop);
        Party::from_def(PartyId::new(i), &def).unwrap()
    }

    fn flat() -> AssignmentParams {
        AssignmentParams { regional_effect: 1.0, ..AssignmentParams::default() }
    }

    #[test]
    fn nearest_party_wins() {
        let ps = vec![party(0, -50.0, 0.0), party(1, 40.0, 0.0)];
        let v = IdeologyVector::new([30.0; 7]);
        assert_eq!(assign_voter(&v, &ps, None, &flat()), Choice::Vote(1));
    }

    #[test]
    fn first_minimum_on_exact_tie() {
        let ps = vec![party(0, 10.0, 1.0), party(1, 10.0, 1.0)];
        let v = IdeologyVector::centre();
        assert_eq!(assign_voter(&v, &ps, None, &flat()), Choice::Vote(0));
    }

    #[test]
    fn popularity_sign_is_ignored() {
        let v = IdeologyVector::centre();
        let plus = party(0, 10.0, 5.0);
        let minus = party(1, 10.0, -5.0);
        let p = flat();
        assert_eq!(adjusted_distance(&v, &plus, false, &p), adjusted_distance(&v, &minus, false, &p));
    }

    #[test]
    fn swing_is_signed_quadratic() {
        let v = IdeologyVector::centre();
        let base = party(0, 10.0, 0.0);
        let mut up = base.clone();
        up.swing = Some(2.0);
        let mut down = base.clone();
        down.swing = Some(-2.0);
        let p = flat();
        let d0 = adjusted_distance(&v, &base, false, &p);
        assert_eq!(adjusted_distance(&v, &up, false, &p), d0 - 100.0);
        assert_eq!(adjusted_distance(&v, &down, false, &p), d0 + 100.0);
    }

    #[test]
    fn regional_favorite_is_scaled() {
        let v = IdeologyVector::centre();
        let p = AssignmentParams::default();
        let a = party(0, 10.0, 0.0);
        let plain = adjusted_distance(&v, &a, false, &p);
        let fav = adjusted_distance(&v, &a, true, &p);
        assert!((fav - plain * 0.9).abs() < 1e-9);
    }

    #[test]
    fn far_voter_abstains_unless_mandatory() {
        let ps = vec![party(0, 100.0, 0.0)];
        let v = IdeologyVector::new([-100.0; 7]);
        let mut p = flat();
        assert_eq!(assign_voter(&v, &ps, None, &p), Choice::Abstain);
        p.mandatory_voting = true;
        assert_eq!(assign_voter(&v, &ps, None, &p), Choice::Vote(0));
    }

    #[test]
    fn no_parties_abstains() {
        let v = IdeologyVector::centre();
        let mut p = flat();
        p.mandatory_voting = true;
        assert_eq!(assign_voter(&v, &[], None, &p), Choice::Abstain);
    }
}
