//! Internship seat allocation: scoring, batch placement, reallocation,
//! and offer responses.
//!
//! The batch engine derives allocation rows from the posted roster and
//! wish lists, the reallocation engine backfills seats freed by
//! rejections, and the response module walks offers through their
//! terminal states. All three compute against a versioned ledger
//! snapshot and publish their changes as a single commit.

pub mod domain;
pub(crate) mod engine;
pub mod ledger;
pub mod notify;
pub(crate) mod reallocation;
pub(crate) mod response;
pub mod roster;
pub mod router;
pub mod scoring;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    AllocationRecord, AllocationStatus, CandidateId, CandidateProfile, OfferDecision, Opportunity,
    OpportunityId, Preference, SeatSummary,
};
pub use engine::{AllocationEngine, AllocationTally};
pub use ledger::{
    AllocationLedger, LedgerCommit, LedgerError, LedgerSnapshot, LedgerVersion, MemoryLedger,
    MemoryPreferences, PreferenceLedger,
};
pub use notify::{NotificationSink, NotifyError, OfferNotice};
pub use reallocation::{ReallocationScope, ReallocationTally};
pub use response::RespondError;
pub use roster::{MemoryRoster, RosterError, RosterImportError, RosterImporter, RosterStore};
pub use router::placement_router;
pub use scoring::{
    FlatCreditAffinity, QualificationAffinity, ScoreBreakdown, ScoringConfig, ScoringEngine,
};
pub use service::{ImportTally, PlacementError, PlacementService, RespondReceipt};
pub use views::{AllocationView, SeatSummaryView};
