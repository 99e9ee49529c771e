//! Campaign events: a party repositions on some axes and its popularity moves
//! according to how that repositioning looks to the country at large.
//!
//! For each shifted axis, alignment gains `|baseline − old| − |baseline − new|`
//! (positive when the party moves toward the national mean). Then
//!
//! ```text
//! change = alignment / 30 · boost / 12 + U(-1, 1)
//! if |change| < 0.5 { change = sign(boost) · |boost| / 30 }    // sign(0) = +
//! change = clamp(change, -5, 5)
//! ```
//!
//! and the change is added to popularity, floored as usual.

use serde::{Deserialize, Serialize};

use es_core::ideology::{Axis, IdeologyVector};
use es_core::party::Party;
use es_core::rng::SimRng;

pub const ALIGNMENT_SCALE: f64 = 30.0;
pub const BOOST_SCALE: f64 = 12.0;
pub const MIN_EFFECT_DIVISOR: f64 = 30.0;
pub const MAX_POLLING_CHANGE: f64 = 5.0;

/// What one event did to a party.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    /// Net distance gained toward the baseline over the shifted axes.
    pub alignment: f64,
    /// Popularity change before the floor is applied.
    pub polling_change: f64,
}

/// Shift `party` along `shift` and move its popularity. Entries are applied in
/// order, each measured from the position the previous one left.
pub fn apply_event_effect(
    party: &mut Party,
    shift: &[(Axis, f64)],
    boost: f64,
    baseline: &IdeologyVector,
    rng: &mut SimRng,
) -> EventEffect {
    let mut alignment = 0.0;
    for &(axis, delta) in shift {
        let centre = baseline.get(axis);
        let old = party.ideology.get(axis);
        party.ideology.set(axis, old + delta);
        let new = party.ideology.get(axis);
        alignment += (centre - old).abs() - (centre - new).abs();
    }

    let mut change = alignment / ALIGNMENT_SCALE * (boost / BOOST_SCALE);
    change += rng.uniform(-1.0, 1.0);
    if change.abs() < 0.5 {
        let sign = if boost >= 0.0 { 1.0 } else { -1.0 };
        change = sign * boost.abs() / MIN_EFFECT_DIVISOR;
    }
    let change = change.clamp(-MAX_POLLING_CHANGE, MAX_POLLING_CHANGE);

    party.nudge_popularity(change);
    tracing::debug!(party = %party.id, alignment, change, popularity = party.popularity(), "event applied");
    EventEffect { alignment, polling_change: change }
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_core::ids::PartyId;
    use es_core::party::{PartyDef, POPULARITY_FLOOR};

    fn party(pos: f64, pop: f64) -> Party {
        let def = PartyDef::new("Ed", "Event Party", IdeologyVector::new([pos; 7]), pop);
        Party::from_def(PartyId::new(0), &def).unwrap()
    }

    #[test]
    fn moving_toward_the_centre_counts_as_alignment() {
        let mut p = party(40.0, 0.0);
        let fx = apply_event_effect(
            &mut p,
            &[(Axis::EnvEco, -30.0), (Axis::SocCap, 10.0)],
            12.0,
            &IdeologyVector::centre(),
            &mut SimRng::from_seed_u64(1),
        );
        assert_eq!(fx.alignment, 30.0 - 10.0);
        assert_eq!(p.ideology.get(Axis::EnvEco), 10.0);
        assert_eq!(p.ideology.get(Axis::SocCap), 50.0);
        assert_eq!(p.popularity(), fx.polling_change);
        assert!(fx.polling_change.abs() <= MAX_POLLING_CHANGE);
        assert!(fx.polling_change.abs() >= 0.4);
    }

    #[test]
    fn shift_is_clamped_and_measured_after_clamping() {
        let mut p = party(90.0, 0.0);
        let fx = apply_event_effect(
            &mut p,
            &[(Axis::ProgCons, 50.0)],
            0.0,
            &IdeologyVector::centre(),
            &mut SimRng::from_seed_u64(2),
        );
        assert_eq!(p.ideology.get(Axis::ProgCons), 100.0);
        assert_eq!(fx.alignment, -10.0);
    }

    #[test]
    fn change_is_capped_and_floored() {
        let mut p = party(100.0, -48.0);
        let fx = apply_event_effect(
            &mut p,
            &[(Axis::ProgCons, -100.0), (Axis::NatGlob, -100.0)],
            -1000.0,
            &IdeologyVector::centre(),
            &mut SimRng::from_seed_u64(3),
        );
        assert_eq!(fx.polling_change, -MAX_POLLING_CHANGE);
        assert_eq!(p.popularity(), POPULARITY_FLOOR);
    }

    #[test]
    fn small_changes_fall_back_to_the_boost_minimum() {
        // No shift means zero alignment, so the change is pure noise; whenever
        // that noise is small the boost minimum replaces it.
        let mut rng = SimRng::from_seed_u64(4);
        for _ in 0..200 {
            let mut p = party(0.0, 0.0);
            let fx = apply_event_effect(&mut p, &[], 6.0, &IdeologyVector::centre(), &mut rng);
            assert!(fx.polling_change.abs() >= 0.5 || fx.polling_change == 0.2);
        }
    }
}
