use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{
    AllocationRecord, CandidateId, OpportunityId, Preference, SeatSummary,
};

/// Monotonic counter attached to every snapshot. A commit must present the
/// version it read; any intervening commit invalidates it.
pub type LedgerVersion = u64;

/// Point-in-time copy of the allocation ledger a pass computes against.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub version: LedgerVersion,
    pub records: Vec<AllocationRecord>,
    pub summaries: Vec<SeatSummary>,
}

/// Atomic change set produced by one pass: row-level upserts keyed by
/// (candidate, opportunity), row deletions for pairings that no longer
/// stand, and summary upserts keyed by opportunity. Rows absent from the
/// commit are untouched by construction.
#[derive(Debug, Clone, Default)]
pub struct LedgerCommit {
    pub records: Vec<AllocationRecord>,
    pub deletes: Vec<(CandidateId, OpportunityId)>,
    pub summaries: Vec<SeatSummary>,
}

impl LedgerCommit {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.deletes.is_empty() && self.summaries.is_empty()
    }
}

/// Storage abstraction for the system of record. Engines read a snapshot,
/// work on it in memory, and commit the change set in one shot; a stale
/// version fails the whole commit with [`LedgerError::Conflict`] and no
/// partial application.
pub trait AllocationLedger: Send + Sync {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError>;
    fn commit(
        &self,
        expected: LedgerVersion,
        commit: LedgerCommit,
    ) -> Result<LedgerVersion, LedgerError>;
}

/// Storage abstraction for candidates' ranked wishes. Resubmission replaces
/// a candidate's list wholesale; resolution updates are recorded per row.
pub trait PreferenceLedger: Send + Sync {
    fn preferences(&self) -> Result<Vec<Preference>, LedgerError>;
    fn replace_for_candidate(
        &self,
        candidate: &CandidateId,
        preferences: Vec<Preference>,
    ) -> Result<(), LedgerError>;
    fn record_resolutions(&self, resolved: &[Preference]) -> Result<(), LedgerError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger version moved, commit rejected")]
    Conflict,
    #[error("allocation record not found")]
    NotFound,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Mutex-guarded in-memory ledger with optimistic version checking. Commits
/// validate the version first and apply second, so a rejected commit leaves
/// prior state intact.
#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<MemoryLedgerState>,
}

#[derive(Default)]
struct MemoryLedgerState {
    version: LedgerVersion,
    records: BTreeMap<(CandidateId, OpportunityId), AllocationRecord>,
    summaries: BTreeMap<OpportunityId, SeatSummary>,
}

impl AllocationLedger for MemoryLedger {
    fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let state = self.state.lock().expect("ledger mutex poisoned");
        Ok(LedgerSnapshot {
            version: state.version,
            records: state.records.values().cloned().collect(),
            summaries: state.summaries.values().cloned().collect(),
        })
    }

    fn commit(
        &self,
        expected: LedgerVersion,
        commit: LedgerCommit,
    ) -> Result<LedgerVersion, LedgerError> {
        let mut state = self.state.lock().expect("ledger mutex poisoned");
        if state.version != expected {
            return Err(LedgerError::Conflict);
        }
        for pair in &commit.deletes {
            state.records.remove(pair);
        }
        for record in commit.records {
            state
                .records
                .insert((record.candidate.clone(), record.opportunity.clone()), record);
        }
        for summary in commit.summaries {
            state.summaries.insert(summary.opportunity.clone(), summary);
        }
        state.version += 1;
        Ok(state.version)
    }
}

/// Mutex-guarded in-memory preference store keyed by (candidate, rank).
#[derive(Default)]
pub struct MemoryPreferences {
    state: Mutex<BTreeMap<(CandidateId, u32), Preference>>,
}

impl PreferenceLedger for MemoryPreferences {
    fn preferences(&self) -> Result<Vec<Preference>, LedgerError> {
        let state = self.state.lock().expect("preference mutex poisoned");
        Ok(state.values().cloned().collect())
    }

    fn replace_for_candidate(
        &self,
        candidate: &CandidateId,
        preferences: Vec<Preference>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().expect("preference mutex poisoned");
        state.retain(|(owner, _), _| owner != candidate);
        for preference in preferences {
            state.insert(
                (preference.candidate.clone(), preference.rank),
                preference,
            );
        }
        Ok(())
    }

    fn record_resolutions(&self, resolved: &[Preference]) -> Result<(), LedgerError> {
        let mut state = self.state.lock().expect("preference mutex poisoned");
        for preference in resolved {
            if let Some(stored) =
                state.get_mut(&(preference.candidate.clone(), preference.rank))
            {
                stored.opportunity = preference.opportunity.clone();
            }
        }
        Ok(())
    }
}
