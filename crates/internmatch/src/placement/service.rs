//! Orchestration layer tying the roster, ledger, and engines together.
//!
//! Every mutating operation follows the same shape: take a ledger
//! snapshot, derive a commit from it, and submit the commit against the
//! snapshot version. A concurrent writer surfaces as a version conflict
//! and the whole pass is recomputed from a fresh snapshot, up to
//! [`MAX_COMMIT_ATTEMPTS`] times. Notifications and preference
//! resolutions are recorded only after the commit lands.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;

use super::domain::{
    CandidateId, CandidateProfile, OfferDecision, Opportunity, OpportunityId, Preference,
};
use super::engine::{AllocationEngine, AllocationTally};
use super::ledger::{AllocationLedger, LedgerCommit, LedgerError, LedgerSnapshot, PreferenceLedger};
use super::notify::{deliver_quietly, NotificationSink, OfferNotice};
use super::reallocation::{self, ReallocationScope, ReallocationTally};
use super::response;
use super::roster::{RosterError, RosterStore};
use super::scoring::{ScoringConfig, ScoringEngine};
use super::views::{self, AllocationView, SeatSummaryView};
use crate::config::AllocationConfig;

/// Commit attempts per pass before giving up on a contended ledger.
pub const MAX_COMMIT_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Respond(#[from] response::RespondError),
    #[error("decision '{0}' is not recognized; expected Accepted or Rejected")]
    InvalidDecision(String),
    #[error("no candidate '{0}' on the roster")]
    UnknownCandidate(CandidateId),
    #[error("ledger stayed contended across {0} attempts")]
    RetriesExhausted(usize),
}

impl PlacementError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidDecision(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnknownCandidate(_) => StatusCode::NOT_FOUND,
            Self::Respond(response::RespondError::UnknownPairing { .. }) => StatusCode::NOT_FOUND,
            Self::Respond(_) => StatusCode::CONFLICT,
            Self::Ledger(LedgerError::Conflict) | Self::RetriesExhausted(_) => StatusCode::CONFLICT,
            Self::Ledger(LedgerError::NotFound) => StatusCode::NOT_FOUND,
            Self::Ledger(LedgerError::Unavailable(_)) | Self::Roster(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Counts for a roster import, echoed back to the uploader.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportTally {
    pub candidates: usize,
    pub opportunities: usize,
    pub preferences: usize,
}

/// Outcome of an offer response, including the cascaded promotions.
#[derive(Debug, Clone, Serialize)]
pub struct RespondReceipt {
    pub confirmation: String,
    pub vacated: usize,
    pub promoted: usize,
}

pub struct PlacementService<L, P, R, N> {
    ledger: Arc<L>,
    preferences: Arc<P>,
    roster: Arc<R>,
    sink: Arc<N>,
    engine: AllocationEngine,
    caps: AllocationConfig,
}

impl<L, P, R, N> PlacementService<L, P, R, N>
where
    L: AllocationLedger,
    P: PreferenceLedger,
    R: RosterStore,
    N: NotificationSink,
{
    pub fn new(
        ledger: Arc<L>,
        preferences: Arc<P>,
        roster: Arc<R>,
        sink: Arc<N>,
        caps: AllocationConfig,
    ) -> Self {
        Self::with_scoring(
            ledger,
            preferences,
            roster,
            sink,
            ScoringEngine::new(ScoringConfig::default()),
            caps,
        )
    }

    /// Swaps in a custom scoring engine, e.g. one with a dataset-backed
    /// qualification affinity.
    pub fn with_scoring(
        ledger: Arc<L>,
        preferences: Arc<P>,
        roster: Arc<R>,
        sink: Arc<N>,
        scoring: ScoringEngine,
        caps: AllocationConfig,
    ) -> Self {
        Self {
            ledger,
            preferences,
            roster,
            sink,
            engine: AllocationEngine::new(scoring, caps),
            caps,
        }
    }

    /// Runs one full allocation pass over every candidate with posted
    /// preferences and returns the per-status counts.
    pub fn run_allocation(&self) -> Result<AllocationTally, PlacementError> {
        let candidates = self.roster.candidates()?;
        let opportunities = self.roster.opportunities()?;
        let (tally, notices, resolutions) = self.commit_with_retry(|snapshot| {
            let wishes = self.preferences.preferences()?;
            let outcome = self.engine.run(snapshot, &candidates, &opportunities, &wishes);
            Ok((
                outcome.commit,
                (outcome.tally, outcome.notices, outcome.resolutions),
            ))
        })?;

        if !resolutions.is_empty() {
            self.preferences.record_resolutions(&resolutions)?;
        }
        self.deliver(notices);
        Ok(tally)
    }

    /// Promotes waitlisted candidates into freed seats, either for one
    /// opportunity or across the whole ledger.
    pub fn reallocate(
        &self,
        scope: ReallocationScope,
    ) -> Result<ReallocationTally, PlacementError> {
        let opportunities = self.roster.opportunities()?;
        let (tally, notices) = self.commit_with_retry(|snapshot| {
            let outcome = reallocation::run(snapshot, &opportunities, &scope, &self.caps);
            Ok((outcome.commit, (outcome.tally, outcome.notices)))
        })?;

        self.deliver(notices);
        Ok(tally)
    }

    /// Records a candidate's decision on an open offer and backfills any
    /// seats it vacated.
    pub fn respond(
        &self,
        candidate: &CandidateId,
        opportunity: &OpportunityId,
        decision: &str,
    ) -> Result<RespondReceipt, PlacementError> {
        let decision = OfferDecision::parse(decision)
            .ok_or_else(|| PlacementError::InvalidDecision(decision.trim().to_string()))?;
        let opportunities = self.roster.opportunities()?;
        let (confirmation, notices, vacated) = self.commit_with_retry(|snapshot| {
            let outcome =
                response::respond(snapshot, &opportunities, candidate, opportunity, decision)?;
            Ok((
                outcome.commit,
                (outcome.confirmation, outcome.notices, outcome.vacated),
            ))
        })?;

        self.deliver(notices);

        let mut promoted = 0;
        let vacated_count = vacated.len();
        for freed in vacated {
            let tally = self.reallocate(ReallocationScope::Opportunity(freed))?;
            promoted += tally.promoted;
        }

        Ok(RespondReceipt {
            confirmation,
            vacated: vacated_count,
            promoted,
        })
    }

    /// Upserts roster rows and replaces each posting candidate's wish list
    /// wholesale.
    pub fn import_roster(
        &self,
        candidates: Vec<CandidateProfile>,
        opportunities: Vec<Opportunity>,
        preferences: Vec<Preference>,
    ) -> Result<ImportTally, PlacementError> {
        let tally = ImportTally {
            candidates: candidates.len(),
            opportunities: opportunities.len(),
            preferences: preferences.len(),
        };

        for profile in candidates {
            self.roster.upsert_candidate(profile)?;
        }
        for opportunity in opportunities {
            self.roster.upsert_opportunity(opportunity)?;
        }

        let mut by_candidate: BTreeMap<CandidateId, Vec<Preference>> = BTreeMap::new();
        for preference in preferences {
            by_candidate
                .entry(preference.candidate.clone())
                .or_default()
                .push(preference);
        }
        for (candidate, wishes) in by_candidate {
            self.preferences.replace_for_candidate(&candidate, wishes)?;
        }

        tracing::info!(
            candidates = tally.candidates,
            opportunities = tally.opportunities,
            preferences = tally.preferences,
            "roster import applied"
        );
        Ok(tally)
    }

    /// Seat utilization across the roster, one row per opportunity.
    pub fn seat_summaries(&self) -> Result<Vec<SeatSummaryView>, PlacementError> {
        let snapshot = self.ledger.snapshot()?;
        let opportunities = self.roster.opportunities()?;
        Ok(views::seat_summary_board(
            &snapshot.summaries,
            &opportunities,
        ))
    }

    /// A candidate's allocation records in their own preference order.
    pub fn candidate_allocations(
        &self,
        candidate: &CandidateId,
    ) -> Result<Vec<AllocationView>, PlacementError> {
        if self.roster.candidate(candidate)?.is_none() {
            return Err(PlacementError::UnknownCandidate(candidate.clone()));
        }
        let snapshot = self.ledger.snapshot()?;
        let mut rows: Vec<AllocationView> = snapshot
            .records
            .iter()
            .filter(|record| &record.candidate == candidate)
            .map(AllocationView::from_record)
            .collect();
        rows.sort_by(|a, b| {
            a.preference_rank
                .cmp(&b.preference_rank)
                .then_with(|| a.opportunity.cmp(&b.opportunity))
        });
        Ok(rows)
    }

    fn deliver(&self, notices: Vec<OfferNotice>) {
        for notice in notices {
            deliver_quietly(self.sink.as_ref(), notice);
        }
    }

    /// Snapshot, derive, commit. A version conflict recomputes the pass
    /// from a fresh snapshot; an empty commit short-circuits without
    /// bumping the ledger version.
    fn commit_with_retry<T>(
        &self,
        mut pass: impl FnMut(&LedgerSnapshot) -> Result<(LedgerCommit, T), PlacementError>,
    ) -> Result<T, PlacementError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let snapshot = self.ledger.snapshot()?;
            let (commit, output) = pass(&snapshot)?;
            if commit.is_empty() {
                return Ok(output);
            }
            match self.ledger.commit(snapshot.version, commit) {
                Ok(_) => return Ok(output),
                Err(LedgerError::Conflict) => {
                    if attempt == MAX_COMMIT_ATTEMPTS {
                        return Err(PlacementError::RetriesExhausted(attempt));
                    }
                    tracing::warn!(attempt, "ledger moved underneath the pass, recomputing");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(PlacementError::RetriesExhausted(MAX_COMMIT_ATTEMPTS))
    }
}
