use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::AllocationConfig;
use crate::placement::domain::{
    AllocationRecord, AllocationStatus, CandidateId, CandidateProfile, Opportunity, OpportunityId,
    Preference,
};
use crate::placement::engine::AllocationEngine;
use crate::placement::ledger::{
    AllocationLedger, LedgerCommit, LedgerError, LedgerSnapshot, LedgerVersion, MemoryLedger,
    MemoryPreferences,
};
use crate::placement::notify::{NotificationSink, NotifyError, OfferNotice};
use crate::placement::roster::{MemoryRoster, RosterError, RosterStore};
use crate::placement::scoring::{ScoringConfig, ScoringEngine};
use crate::placement::service::PlacementService;

/// Full-rubric profile: 8.5 grade with an improving trend, both required
/// skills, exact location match. Scores 92.5 against [`opportunity`].
pub(super) fn profile(id: &str) -> CandidateProfile {
    CandidateProfile {
        id: CandidateId(id.to_string()),
        full_name: format!("Candidate {id}"),
        email: format!("{id}@example.org"),
        qualification: "B.Tech Computer Science".to_string(),
        skills: vec!["Python".to_string(), "SQL".to_string()],
        grade_average: Some(8.5),
        secondary_percentage: Some(78.0),
        higher_secondary_percentage: Some(82.0),
        location_preferences: vec!["Pune, Maharashtra".to_string()],
    }
}

/// Same profile minus one required skill; scores 75.0 against
/// [`opportunity`].
pub(super) fn weaker_profile(id: &str) -> CandidateProfile {
    CandidateProfile {
        skills: vec!["Python".to_string()],
        ..profile(id)
    }
}

pub(super) fn opportunity(id: &str, seats: u32) -> Opportunity {
    Opportunity {
        id: OpportunityId(id.to_string()),
        role: "Data Analyst".to_string(),
        organization: "Helios Analytics".to_string(),
        sector: "Technology".to_string(),
        location: "Pune, Maharashtra".to_string(),
        seats,
        required_skills: vec!["Python".to_string(), "SQL".to_string()],
        min_score: 0.0,
        required_education: "B.Tech".to_string(),
        stipend: Some("15000 INR".to_string()),
        duration: Some("6 months".to_string()),
    }
}

/// Distinct role so several postings can coexist without colliding on the
/// (sector, role, location) wish lookup.
pub(super) fn opportunity_role(id: &str, seats: u32, role: &str) -> Opportunity {
    Opportunity {
        role: role.to_string(),
        ..opportunity(id, seats)
    }
}

/// Unresolved wish described by the opportunity's own triple.
pub(super) fn wish(candidate: &str, rank: u32, opportunity: &Opportunity) -> Preference {
    Preference {
        candidate: CandidateId(candidate.to_string()),
        rank,
        sector: opportunity.sector.clone(),
        role: opportunity.role.clone(),
        location: opportunity.location.clone(),
        opportunity: None,
    }
}

/// Wish already resolved to a concrete opportunity id.
pub(super) fn pinned_wish(candidate: &str, rank: u32, opportunity: &Opportunity) -> Preference {
    Preference {
        opportunity: Some(opportunity.id.clone()),
        ..wish(candidate, rank, opportunity)
    }
}

pub(super) fn record(
    profile: &CandidateProfile,
    opportunity: &Opportunity,
    status: AllocationStatus,
    score: f64,
    preference_rank: u32,
) -> AllocationRecord {
    AllocationRecord {
        candidate: profile.id.clone(),
        opportunity: opportunity.id.clone(),
        status,
        score,
        preference_rank,
        candidate_name: profile.full_name.clone(),
        candidate_email: profile.email.clone(),
        role: opportunity.role.clone(),
        organization: opportunity.organization.clone(),
        sector: opportunity.sector.clone(),
        seats: opportunity.seats,
        min_score: opportunity.min_score,
    }
}

pub(super) fn engine() -> AllocationEngine {
    AllocationEngine::new(
        ScoringEngine::new(ScoringConfig::default()),
        AllocationConfig::default(),
    )
}

pub(super) fn empty_snapshot() -> LedgerSnapshot {
    LedgerSnapshot {
        version: 0,
        records: Vec::new(),
        summaries: Vec::new(),
    }
}

pub(super) fn seeded_ledger(records: Vec<AllocationRecord>) -> MemoryLedger {
    let ledger = MemoryLedger::default();
    if !records.is_empty() {
        ledger
            .commit(
                0,
                LedgerCommit {
                    records,
                    deletes: Vec::new(),
                    summaries: Vec::new(),
                },
            )
            .expect("seed commit");
    }
    ledger
}

pub(super) fn build_service() -> (
    PlacementService<MemoryLedger, MemoryPreferences, MemoryRoster, RecordingSink>,
    Arc<MemoryLedger>,
    Arc<MemoryPreferences>,
    Arc<MemoryRoster>,
    Arc<RecordingSink>,
) {
    let ledger = Arc::new(MemoryLedger::default());
    let preferences = Arc::new(MemoryPreferences::default());
    let roster = Arc::new(MemoryRoster::default());
    let sink = Arc::new(RecordingSink::default());
    let service = PlacementService::new(
        ledger.clone(),
        preferences.clone(),
        roster.clone(),
        sink.clone(),
        AllocationConfig::default(),
    );
    (service, ledger, preferences, roster, sink)
}

#[derive(Default)]
pub(super) struct RecordingSink {
    notices: Mutex<Vec<OfferNotice>>,
}

impl RecordingSink {
    pub(super) fn notices(&self) -> Vec<OfferNotice> {
        self.notices.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notice: OfferNotice) -> Result<(), NotifyError> {
        self.notices
            .lock()
            .expect("sink mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingSink;

impl NotificationSink for FailingSink {
    fn deliver(&self, _notice: OfferNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp relay offline".to_string()))
    }
}

/// Ledger that rejects the first `conflicts` commits with a version
/// conflict and delegates afterwards.
pub(super) struct ContestedLedger {
    inner: MemoryLedger,
    conflicts: Mutex<usize>,
}

impl ContestedLedger {
    pub(super) fn new(conflicts: usize) -> Self {
        Self {
            inner: MemoryLedger::default(),
            conflicts: Mutex::new(conflicts),
        }
    }
}

impl AllocationLedger for ContestedLedger {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        self.inner.snapshot()
    }

    fn commit(
        &self,
        expected: LedgerVersion,
        commit: LedgerCommit,
    ) -> Result<LedgerVersion, LedgerError> {
        let mut remaining = self.conflicts.lock().expect("contention counter poisoned");
        if *remaining > 0 {
            *remaining -= 1;
            return Err(LedgerError::Conflict);
        }
        self.inner.commit(expected, commit)
    }
}

pub(super) struct UnavailableRoster;

impl RosterStore for UnavailableRoster {
    fn candidates(&self) -> Result<Vec<CandidateProfile>, RosterError> {
        Err(RosterError::Unavailable("roster database offline".to_string()))
    }

    fn opportunities(&self) -> Result<Vec<Opportunity>, RosterError> {
        Err(RosterError::Unavailable("roster database offline".to_string()))
    }

    fn candidate(&self, _id: &CandidateId) -> Result<Option<CandidateProfile>, RosterError> {
        Err(RosterError::Unavailable("roster database offline".to_string()))
    }

    fn opportunity(&self, _id: &OpportunityId) -> Result<Option<Opportunity>, RosterError> {
        Err(RosterError::Unavailable("roster database offline".to_string()))
    }

    fn upsert_candidate(&self, _profile: CandidateProfile) -> Result<(), RosterError> {
        Err(RosterError::Unavailable("roster database offline".to_string()))
    }

    fn upsert_opportunity(&self, _opportunity: Opportunity) -> Result<(), RosterError> {
        Err(RosterError::Unavailable("roster database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}
