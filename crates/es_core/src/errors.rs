//! Configuration errors. Raised before any simulation work begins.

use thiserror::Error;

/// Everything that can be wrong with the inputs of a run.
///
/// Convergence exhaustion (no runoff majority, no majority coalition) is not
/// an error; those are terminal states reported in the outcome types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("party list is empty")]
    NoParties,

    #[error("population must be positive")]
    NonPositivePopulation,

    #[error("seat budget must be positive")]
    NoSeats,

    #[error("runoff round budget must be positive")]
    NoRounds,

    #[error("domain out of range: {field} = {value}")]
    DomainOutOfRange { field: &'static str, value: f64 },

    #[error("invalid spread on axis {axis}: {value}")]
    InvalidSpread { axis: &'static str, value: f64 },

    #[error("invalid id: {0}")]
    InvalidId(String),
}

impl ConfigError {
    #[inline]
    pub(crate) fn range(field: &'static str, value: f64) -> Self {
        ConfigError::DomainOutOfRange { field, value }
    }
}
