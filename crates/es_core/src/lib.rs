//! es_core — Core types, ideology space, run configuration, and seeded RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared by the
//! algorithm layer (`es_algo`) and the orchestration layer (`es_pipeline`):
//!
//! - Ideology space: `Axis`, `IdeologyVector` (always clamped to [-100, 100])
//! - Parties: `PartyDef` (input record) and `Party` (runtime value)
//! - Identifiers: `PartyId`, `RunId` (`RUN:` + 64-hex)
//! - Run configuration: `RunConfig` and its domains, validated up front
//! - Stable ranking order for tallies
//! - Seedable RNG (ChaCha20); every random draw in a run flows from one seed

#![forbid(unsafe_code)]

pub mod determinism;
pub mod errors;
pub mod ideology;
pub mod ids;
pub mod party;
pub mod rng;
pub mod variables;

pub use errors::ConfigError;
pub use ideology::{Axis, IdeologyVector, AXIS_COUNT};
pub use ids::{PartyId, RunId};
pub use party::{Party, PartyDef};
pub use rng::{SimRng, TieCrumb};
pub use variables::RunConfig;
