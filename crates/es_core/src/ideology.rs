//! Seven-axis ideology space.
//!
//! Contract:
//! - Every `IdeologyVector` holds values in [-100, 100]; construction and
//!   mutation clamp, so no caller can observe an out-of-range axis.
//! - `NaN` inputs collapse to 0 (the political centre).
//! - Axis order is fixed (`Axis::ALL`) and is the order used on the wire.

use core::fmt;

use serde::{Deserialize, Serialize};

pub const AXIS_COUNT: usize = 7;
pub const AXIS_MIN: f64 = -100.0;
pub const AXIS_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// progressive ↔ conservative
    ProgCons,
    /// nationalist ↔ globalist
    NatGlob,
    /// environmentalist ↔ economic growth
    EnvEco,
    /// socialist ↔ capitalist
    SocCap,
    /// pacifist ↔ militarist
    PacMil,
    /// authoritarian ↔ anarchist
    AuthAna,
    /// religious ↔ secular
    RelSec,
}

impl Axis {
    pub const ALL: [Axis; AXIS_COUNT] = [
        Axis::ProgCons,
        Axis::NatGlob,
        Axis::EnvEco,
        Axis::SocCap,
        Axis::PacMil,
        Axis::AuthAna,
        Axis::RelSec,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn key(self) -> &'static str {
        match self {
            Axis::ProgCons => "prog_cons",
            Axis::NatGlob => "nat_glob",
            Axis::EnvEco => "env_eco",
            Axis::SocCap => "soc_cap",
            Axis::PacMil => "pac_mil",
            Axis::AuthAna => "auth_ana",
            Axis::RelSec => "rel_sec",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[inline]
fn clamp_axis(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(AXIS_MIN, AXIS_MAX)
    }
}

/// A position in ideology space. Serialized as a plain 7-element array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; AXIS_COUNT]", into = "[f64; AXIS_COUNT]")]
pub struct IdeologyVector([f64; AXIS_COUNT]);

impl IdeologyVector {
    pub fn new(values: [f64; AXIS_COUNT]) -> Self {
        Self(values.map(clamp_axis))
    }

    #[inline]
    pub fn centre() -> Self {
        Self([0.0; AXIS_COUNT])
    }

    #[inline]
    pub fn get(&self, axis: Axis) -> f64 {
        self.0[axis.index()]
    }

    #[inline]
    pub fn set(&mut self, axis: Axis, v: f64) {
        self.0[axis.index()] = clamp_axis(v);
    }

    #[inline]
    pub fn values(&self) -> &[f64; AXIS_COUNT] {
        &self.0
    }

    /// Sum of squared per-axis differences (not square-rooted).
    #[inline]
    pub fn squared_distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Number of axes where the two positions sit on strictly opposite sides
    /// of the centre. Zero is on neither side.
    pub fn opposed_axes(&self, other: &Self) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(a, b)| (**a > 0.0 && **b < 0.0) || (**a < 0.0 && **b > 0.0))
            .count()
    }

    /// Per-axis average rounded to the nearest integer (half away from zero).
    pub fn midpoint_rounded(&self, other: &Self) -> Self {
        let mut out = [0.0; AXIS_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = ((self.0[i] + other.0[i]) / 2.0).round();
        }
        Self::new(out)
    }

    /// Unweighted per-axis mean. `None` for an empty input.
    pub fn mean_of<'a, I>(vectors: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a IdeologyVector>,
    {
        let mut sum = [0.0; AXIS_COUNT];
        let mut n = 0usize;
        for v in vectors {
            for (s, x) in sum.iter_mut().zip(v.0.iter()) {
                *s += x;
            }
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(Self::new(sum.map(|s| s / n as f64)))
    }
}

impl From<[f64; AXIS_COUNT]> for IdeologyVector {
    fn from(values: [f64; AXIS_COUNT]) -> Self {
        Self::new(values)
    }
}

impl From<IdeologyVector> for [f64; AXIS_COUNT] {
    fn from(v: IdeologyVector) -> Self {
        v.0
    }
}
