//! Electorate generation.
//!
//! Voters are stored column-wise: one array of N samples per axis, each drawn
//! from `Normal(baseline[axis], spread[axis])` and then shuffled on its own.
//! The per-axis shuffle decorrelates axes across voters, so voter `i` is a
//! position assembled from seven independent draws rather than a coherent
//! bundle. Raw samples may fall outside [-100, 100]; `voter(i)` clamps.

use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use es_core::errors::ConfigError;
use es_core::ideology::{Axis, IdeologyVector, AXIS_COUNT};
use es_core::rng::SimRng;

pub const DEFAULT_SPREAD: f64 = 100.0;

fn default_spread() -> [f64; AXIS_COUNT] {
    [DEFAULT_SPREAD; AXIS_COUNT]
}

fn default_scale() -> u64 {
    1
}

/// What the electorate looks like before sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectorateSpec {
    /// Number of simulated voters.
    pub population: u64,
    /// Country mean per axis.
    pub baseline: IdeologyVector,
    /// Standard deviation per axis.
    #[serde(default = "default_spread")]
    pub spread: [f64; AXIS_COUNT],
    /// Simulated votes × `scale_factor` = reported "real" votes.
    #[serde(default = "default_scale")]
    pub scale_factor: u64,
}

impl ElectorateSpec {
    pub fn new(population: u64, baseline: IdeologyVector) -> Self {
        Self {
            population,
            baseline,
            spread: default_spread(),
            scale_factor: 1,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::NonPositivePopulation);
        }
        for (axis, &s) in Axis::ALL.iter().zip(self.spread.iter()) {
            if !(s.is_finite() && s >= 0.0) {
                return Err(ConfigError::InvalidSpread { axis: axis.key(), value: s });
            }
        }
        if self.scale_factor == 0 {
            return Err(ConfigError::DomainOutOfRange { field: "electorate.scale_factor", value: 0.0 });
        }
        Ok(())
    }

    /// Shift every baseline axis by a whole-number offset drawn uniformly
    /// from `[-amplitude/2, amplitude/2)`, for run-to-run demographic variety.
    pub fn jittered(&self, amplitude: f64, rng: &mut SimRng) -> Self {
        let mut out = self.clone();
        let half = amplitude.abs() / 2.0;
        for axis in Axis::ALL {
            let offset = rng.uniform(-half, half).round();
            out.baseline.set(axis, self.baseline.get(axis) + offset);
        }
        out
    }
}

/// The sampled voters of one run. Fixed for the whole run, across runoff
/// rounds and campaign polls.
#[derive(Debug, Clone, PartialEq)]
pub struct Electorate {
    columns: Vec<Vec<f64>>,
    population: u64,
    scale_factor: u64,
}

impl Electorate {
    pub fn generate(spec: &ElectorateSpec, rng: &mut SimRng) -> Result<Self, ConfigError> {
        spec.validate()?;
        let n = usize::try_from(spec.population)
            .map_err(|_| ConfigError::DomainOutOfRange {
                field: "electorate.population",
                value: spec.population as f64,
            })?;

        let mut columns = Vec::with_capacity(AXIS_COUNT);
        for axis in Axis::ALL {
            let spread = spec.spread[axis.index()];
            let dist = Normal::new(spec.baseline.get(axis), spread)
                .map_err(|_| ConfigError::InvalidSpread { axis: axis.key(), value: spread })?;
            let mut column: Vec<f64> = (0..n).map(|_| rng.sample(&dist)).collect();
            rng.shuffle_in_place(&mut column);
            columns.push(column);
        }

        Ok(Self {
            columns,
            population: spec.population,
            scale_factor: spec.scale_factor,
        })
    }

    /// Build from explicit positions (one row per voter). Rows are clamped on
    /// read like sampled ones.
    pub fn from_rows(rows: &[[f64; AXIS_COUNT]]) -> Self {
        let columns = (0..AXIS_COUNT)
            .map(|a| rows.iter().map(|r| r[a]).collect())
            .collect();
        Self {
            columns,
            population: rows.len() as u64,
            scale_factor: 1,
        }
    }

    #[inline]
    pub fn population(&self) -> u64 {
        self.population
    }

    #[inline]
    pub fn scale_factor(&self) -> u64 {
        self.scale_factor
    }

    /// Unclamped sample for voter `i`.
    pub fn raw(&self, i: usize) -> [f64; AXIS_COUNT] {
        let mut out = [0.0; AXIS_COUNT];
        for (a, slot) in out.iter_mut().enumerate() {
            *slot = self.columns[a][i];
        }
        out
    }

    /// Voter `i`'s position, clamped to [-100, 100] on every axis.
    #[inline]
    pub fn voter(&self, i: usize) -> IdeologyVector {
        IdeologyVector::new(self.raw(i))
    }

    /// A copy where every voter value moves by its own uniform draw in
    /// `[-amplitude, amplitude)` and is then clamped to [-100, 100]. Used for
    /// poll-to-poll opinion wobble; `self` stays untouched.
    pub fn perturbed(&self, amplitude: f64, rng: &mut SimRng) -> Self {
        let half = amplitude.abs();
        let n = self.population as usize;
        let mut columns: Vec<Vec<f64>> = self.columns.iter().map(|c| Vec::with_capacity(c.len())).collect();
        // voter-major, matching the order voters are read in
        for i in 0..n {
            for (a, column) in columns.iter_mut().enumerate() {
                let v = self.columns[a][i] + rng.uniform(-half, half);
                column.push(v.clamp(-100.0, 100.0));
            }
        }
        Self {
            columns,
            population: self.population,
            scale_factor: self.scale_factor,
        }
    }

    /// Per-axis mean of the raw samples.
    pub fn mean(&self) -> IdeologyVector {
        if self.population == 0 {
            return IdeologyVector::centre();
        }
        let mut m = [0.0; AXIS_COUNT];
        for (a, slot) in m.iter_mut().enumerate() {
            *slot = self.columns[a].iter().sum::<f64>() / self.population as f64;
        }
        IdeologyVector::new(m)
    }

    /// Reported vote count for `simulated` votes.
    #[inline]
    pub fn scale_votes(&self, simulated: u64) -> u64 {
        simulated.saturating_mul(self.scale_factor)
    }
}
