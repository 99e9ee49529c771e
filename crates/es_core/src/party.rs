//! Party input records and the runtime party value.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::ideology::IdeologyVector;
use crate::ids::PartyId;

/// Lowest popularity a party can have. Applied on construction and on every
/// popularity change.
pub const POPULARITY_FLOOR: f64 = -50.0;

/// Input record for one party, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyDef {
    /// Display name (usually the leader's name).
    pub name: String,
    /// Party label, e.g. "Green Party".
    pub label: String,
    pub ideology: IdeologyVector,
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
}

impl PartyDef {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        ideology: IdeologyVector,
        popularity: f64,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            ideology,
            popularity,
            swing: None,
            colour: None,
        }
    }

    pub fn with_swing(mut self, swing: f64) -> Self {
        self.swing = Some(swing);
        self
    }

    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = Some(colour.into());
        self
    }
}

/// Runtime party. Mutated only by merging (before simulation) and by the
/// campaign drift between polls; tabulation never touches it.
///
/// Deserialization goes through [`Party::from_def`], so a decoded party obeys
/// the same floor and finiteness rules as a constructed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PartyWire")]
pub struct Party {
    pub id: PartyId,
    pub name: String,
    pub label: String,
    pub ideology: IdeologyVector,
    popularity: f64,
    /// `None` means no swing bonus at all.
    pub swing: Option<f64>,
    pub colour: Option<String>,
}

/// Serialized shape of a [`Party`].
#[derive(Deserialize)]
struct PartyWire {
    id: PartyId,
    name: String,
    label: String,
    ideology: IdeologyVector,
    popularity: f64,
    #[serde(default)]
    swing: Option<f64>,
    #[serde(default)]
    colour: Option<String>,
}

impl TryFrom<PartyWire> for Party {
    type Error = ConfigError;

    fn try_from(w: PartyWire) -> Result<Self, Self::Error> {
        let def = PartyDef {
            name: w.name,
            label: w.label,
            ideology: w.ideology,
            popularity: w.popularity,
            swing: w.swing,
            colour: w.colour,
        };
        Party::from_def(w.id, &def)
    }
}

impl Party {
    /// Build a party from its input record. Non-finite numbers are rejected
    /// here so scoring code never has to look at them again.
    pub fn from_def(id: PartyId, def: &PartyDef) -> Result<Self, ConfigError> {
        if !def.popularity.is_finite() {
            return Err(ConfigError::range("party.popularity", def.popularity));
        }
        if let Some(s) = def.swing {
            if !s.is_finite() {
                return Err(ConfigError::range("party.swing", s));
            }
        }
        Ok(Self {
            id,
            name: def.name.clone(),
            label: def.label.clone(),
            ideology: def.ideology,
            popularity: def.popularity.max(POPULARITY_FLOOR),
            swing: def.swing,
            colour: def.colour.clone(),
        })
    }

    /// Build the full active list with sequential ids. Empty input is a
    /// configuration error.
    pub fn list_from_defs(defs: &[PartyDef]) -> Result<Vec<Party>, ConfigError> {
        if defs.is_empty() {
            return Err(ConfigError::NoParties);
        }
        defs.iter()
            .enumerate()
            .map(|(i, d)| Party::from_def(PartyId::from_index(i), d))
            .collect()
    }

    #[inline]
    pub fn popularity(&self) -> f64 {
        self.popularity
    }

    pub fn set_popularity(&mut self, v: f64) {
        self.popularity = v.max(POPULARITY_FLOOR);
    }

    pub fn nudge_popularity(&mut self, delta: f64) {
        self.set_popularity(self.popularity + delta);
    }

    #[inline]
    pub fn swing_or_zero(&self) -> f64 {
        self.swing.unwrap_or(0.0)
    }
}

/// Reassign dense ids `0..n` in list order.
pub fn reassign_ids(parties: &mut [Party]) {
    for (i, p) in parties.iter_mut().enumerate() {
        p.id = PartyId::from_index(i);
    }
}
