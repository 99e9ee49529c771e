//! variables.rs — run configuration domains and `RunConfig` with safe defaults.
//!
//! Every knob of a run lives here. `RunConfig::validate` is called by the
//! pipeline before any simulation work; algorithm code assumes validated input.

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ConfigError;

/// ------------ Macros ------------

/// Define a serde'd enum with explicit wire tokens.
macro_rules! serde_enum {
    ($name:ident => { $($variant:ident = $token:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }
    };
}

/// ------------ Newtypes with invariants (validated on deserialize) ------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pct(u8); // 0..=100

impl Pct {
    pub fn new(v: u8) -> Result<Self, ConfigError> {
        if v <= 100 {
            Ok(Self(v))
        } else {
            Err(ConfigError::range("pct", v as f64))
        }
    }
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Pct {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        if v <= 100 {
            Ok(Pct(v))
        } else {
            Err(D::Error::invalid_value(Unexpected::Unsigned(v as u64), &"0..=100"))
        }
    }
}

/// ------------ Canonical enums (wire tokens explicit) ------------

serde_enum!(TiePolicy => {
    MostVotes = "most_votes",
    ListOrder = "list_order",
    Random    = "random"
});

serde_enum!(DivisorMethod => {
    HuntingtonHill = "huntington_hill",
    DHondt         = "dhondt",
    SainteLague    = "sainte_lague"
});

serde_enum!(KeepRule => {
    TopTwo       = "top_two",
    Decrementing = "decrementing"
});

impl Default for TiePolicy {
    fn default() -> Self {
        TiePolicy::MostVotes
    }
}

impl Default for DivisorMethod {
    fn default() -> Self {
        DivisorMethod::HuntingtonHill
    }
}

/// How many parties survive each runoff elimination, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunoffRule {
    pub keep: KeepRule,
    pub max_rounds: u32,
}

impl Default for RunoffRule {
    fn default() -> Self {
        Self {
            keep: KeepRule::Decrementing,
            max_rounds: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElectoralSystem {
    /// One round; the largest party leads.
    Plurality,
    /// Repeated rounds over the same electorate until someone has a majority.
    Runoff(RunoffRule),
    /// One round; seats carry the result.
    Proportional,
}

impl Default for ElectoralSystem {
    fn default() -> Self {
        ElectoralSystem::Proportional
    }
}

/// Upper bound on pool slots per party. The region count is the pool size,
/// so this also bounds the number of regions per party.
pub const MAX_REGION_SLOTS: u32 = 1000;

/// Size of the regional favorite pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSlots {
    /// Every party gets the same number of slots.
    Fixed { per_party: u32 },
    /// `max(1, round(popularity * per_point))` slots per party.
    ByPopularity { per_point: f64 },
}

impl Default for RegionSlots {
    fn default() -> Self {
        RegionSlots::Fixed { per_party: 3 }
    }
}

/// Tuning of the voter assignment rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentParams {
    /// Voters whose best adjusted distance exceeds this squared stay home.
    pub non_voter_distance: f64,
    /// `k` in `(popularity * k)^2`.
    pub popularity_factor: f64,
    /// `k'` in `(swing * k') * |swing * k'|`.
    pub swing_factor: f64,
    /// Multiplier on the regional favorite's adjusted distance, in (0, 1].
    pub regional_effect: f64,
    pub mandatory_voting: bool,
}

impl Default for AssignmentParams {
    fn default() -> Self {
        Self {
            non_voter_distance: 190.0,
            popularity_factor: 4.0,
            swing_factor: 5.0,
            regional_effect: 0.9,
            mandatory_voting: false,
        }
    }
}

impl AssignmentParams {
    /// Same parameters with the abstention radius widened by `factor`.
    pub fn with_turnout_boost(mut self, factor: f64) -> Self {
        self.non_voter_distance *= factor;
        self
    }
}

/// Party-merge preprocessing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeParams {
    pub enabled: bool,
    /// Base distance below which two parties merge; scaled by list size.
    pub threshold: f64,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 100.0,
        }
    }
}

/// Full configuration of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Seed for every random draw of the run.
    pub seed: u64,
    pub system: ElectoralSystem,
    pub seats: u32,
    pub divisor: DivisorMethod,
    /// Vote-share entry threshold for seats.
    pub threshold: Pct,
    /// Seats guaranteed to each qualifying party before competition.
    pub min_seats: u32,
    pub tie_policy: TiePolicy,
    pub assignment: AssignmentParams,
    pub region_slots: RegionSlots,
    pub merge: MergeParams,
    /// Coalition tolerance is `coalition_factor * non_voter_distance^2`.
    pub coalition_factor: f64,
    /// Progress snapshots per tabulation.
    pub snapshot_count: u32,
    /// Width of the uniform per-axis shift applied to the electorate baseline
    /// before sampling. 0 samples the baseline exactly as given.
    pub baseline_jitter: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            system: ElectoralSystem::default(),
            seats: 100,
            divisor: DivisorMethod::default(),
            threshold: Pct::default(),
            min_seats: 0,
            tie_policy: TiePolicy::default(),
            assignment: AssignmentParams::default(),
            region_slots: RegionSlots::default(),
            merge: MergeParams::default(),
            coalition_factor: 1.1,
            snapshot_count: 50,
            baseline_jitter: 0.0,
        }
    }
}

fn positive_finite(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::range(field, v))
    }
}

impl RunConfig {
    /// Fail fast on anything the algorithms cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seats == 0 {
            return Err(ConfigError::NoSeats);
        }
        if let ElectoralSystem::Runoff(rule) = self.system {
            if rule.max_rounds == 0 {
                return Err(ConfigError::NoRounds);
            }
        }

        let a = &self.assignment;
        positive_finite("assignment.non_voter_distance", a.non_voter_distance)?;
        if !a.popularity_factor.is_finite() {
            return Err(ConfigError::range("assignment.popularity_factor", a.popularity_factor));
        }
        if !a.swing_factor.is_finite() {
            return Err(ConfigError::range("assignment.swing_factor", a.swing_factor));
        }
        if !(a.regional_effect > 0.0 && a.regional_effect <= 1.0) {
            return Err(ConfigError::range("assignment.regional_effect", a.regional_effect));
        }

        match self.region_slots {
            RegionSlots::Fixed { per_party } => {
                if per_party == 0 || per_party > MAX_REGION_SLOTS {
                    return Err(ConfigError::range("region_slots.per_party", f64::from(per_party)));
                }
            }
            RegionSlots::ByPopularity { per_point } => {
                positive_finite("region_slots.per_point", per_point)?;
                if per_point > f64::from(MAX_REGION_SLOTS) {
                    return Err(ConfigError::range("region_slots.per_point", per_point));
                }
            }
        }

        if !(self.merge.threshold.is_finite() && self.merge.threshold >= 0.0) {
            return Err(ConfigError::range("merge.threshold", self.merge.threshold));
        }
        positive_finite("coalition_factor", self.coalition_factor)?;
        if self.snapshot_count == 0 {
            return Err(ConfigError::range("snapshot_count", 0.0));
        }
        if !(self.baseline_jitter.is_finite() && (0.0..=200.0).contains(&self.baseline_jitter)) {
            return Err(ConfigError::range("baseline_jitter", self.baseline_jitter));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(RunConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_seats_rejected() {
        let cfg = RunConfig { seats: 0, ..RunConfig::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::NoSeats));
    }

    #[test]
    fn regional_effect_domain() {
        let mut cfg = RunConfig::default();
        cfg.assignment.regional_effect = 1.0;
        assert!(cfg.validate().is_ok());
        cfg.assignment.regional_effect = 1.2;
        assert!(cfg.validate().is_err());
        cfg.assignment.regional_effect = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn region_slots_are_bounded() {
        let huge = RunConfig {
            region_slots: RegionSlots::Fixed { per_party: u32::MAX },
            ..RunConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::DomainOutOfRange { field: "region_slots.per_party", .. })
        ));

        let at_cap = RunConfig {
            region_slots: RegionSlots::Fixed { per_party: MAX_REGION_SLOTS },
            ..RunConfig::default()
        };
        assert_eq!(at_cap.validate(), Ok(()));

        let steep = RunConfig {
            region_slots: RegionSlots::ByPopularity { per_point: 1e9 },
            ..RunConfig::default()
        };
        assert!(matches!(
            steep.validate(),
            Err(ConfigError::DomainOutOfRange { field: "region_slots.per_point", .. })
        ));
    }

    #[test]
    fn baseline_jitter_domain() {
        let mut cfg = RunConfig::default();
        assert_eq!(cfg.baseline_jitter, 0.0);
        cfg.baseline_jitter = 10.0;
        assert!(cfg.validate().is_ok());
        cfg.baseline_jitter = -1.0;
        assert!(cfg.validate().is_err());
        cfg.baseline_jitter = f64::INFINITY;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn runoff_needs_rounds() {
        let cfg = RunConfig {
            system: ElectoralSystem::Runoff(RunoffRule { keep: KeepRule::TopTwo, max_rounds: 0 }),
            ..RunConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoRounds));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{
                "seed": 9,
                "system": {"kind": "runoff", "keep": "top_two", "max_rounds": 3},
                "divisor": "sainte_lague",
                "threshold": 5,
                "assignment": {"mandatory_voting": true}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(
            cfg.system,
            ElectoralSystem::Runoff(RunoffRule { keep: KeepRule::TopTwo, max_rounds: 3 })
        );
        assert_eq!(cfg.divisor, DivisorMethod::SainteLague);
        assert_eq!(cfg.threshold.as_u8(), 5);
        assert!(cfg.assignment.mandatory_voting);
        assert_eq!(cfg.assignment.non_voter_distance, 190.0);
        assert_eq!(cfg.seats, 100);
    }

    #[test]
    fn pct_rejects_over_100() {
        assert!(serde_json::from_str::<Pct>("101").is_err());
        assert!(Pct::new(101).is_err());
        assert_eq!(Pct::new(100).unwrap().as_u8(), 100);
    }
}
