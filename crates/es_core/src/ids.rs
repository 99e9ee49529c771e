//! Newtypes and parsers for party and run identifiers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

fn is_lower_hex_len(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Position of a party in the active list.
///
/// Ids are dense (`0..n`) and get reassigned after every merge pass, so they
/// are only stable within one stage of a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(u32);

impl PartyId {
    #[inline]
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn from_index(i: usize) -> Self {
        Self(u32::try_from(i).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// "RUN:" + 64-hex (lowercase) fingerprint of a run's configuration and party list.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Build from a raw digest (64 lowercase hex chars).
    pub fn from_digest_hex(hex: &str) -> Result<Self, ConfigError> {
        if is_lower_hex_len(hex, 64) {
            Ok(Self(format!("RUN:{hex}")))
        } else {
            Err(ConfigError::InvalidId(hex.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 64-hex digest without the prefix.
    pub fn digest(&self) -> &str {
        &self.0[4..]
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RunId {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("RUN:")
            .ok_or_else(|| ConfigError::InvalidId(s.to_string()))?;
        Self::from_digest_hex(rest)
    }
}

impl TryFrom<String> for RunId {
    type Error = ConfigError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> String {
        id.0
    }
}
