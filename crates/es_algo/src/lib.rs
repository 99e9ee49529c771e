//! es_algo — election mechanics on top of `es_core`.
//!
//! Stage order as the pipeline drives it:
//! merge → electorate → regions → assignment → tabulation (or rounds) →
//! allocation → coalition → government.
//!
//! Campaign helpers (`events`, `transfer`) sit beside that chain and are only
//! driven between polls.
//!
//! Nothing here does I/O. Randomness only enters through a `SimRng` handed in
//! by the caller, so a fixed seed reproduces every draw.

#![forbid(unsafe_code)]

pub mod allocation;
pub mod assignment;
pub mod coalition;
pub mod electorate;
pub mod events;
pub mod government;
pub mod merge;
pub mod regions;
pub mod rounds;
pub mod tabulation;
pub mod transfer;

// Tight, explicit re-exports (pipeline imports these from the crate root).
pub use allocation::{apportion, AllocError, Apportionment, SeatRules};
pub use assignment::{adjusted_distance, assign_voter, Choice};
pub use coalition::{form_coalition, CoalitionOutcome, CoalitionParams, CoalitionStep};
pub use electorate::{Electorate, ElectorateSpec};
pub use events::{apply_event_effect, EventEffect};
pub use government::{compatibility, GovernmentProfile};
pub use merge::{merge_parties, AutoAccept, MergeDecider, MergeDecision, MergeLeader, MergeReport};
pub use regions::{Region, RegionPlan};
pub use rounds::{resolve_rounds, RoundContext, RoundRecord, RoundsOutcome, RoundsStatus};
pub use tabulation::{
    tabulate, tabulate_with_choices, NoSnapshots, RankedEntry, SnapshotSink, TallySnapshot, VoteTally,
};
pub use transfer::{transfer_matrix, VoterTransfer};
