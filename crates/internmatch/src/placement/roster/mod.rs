mod import;

pub use import::{RosterImportError, RosterImporter};

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{CandidateId, CandidateProfile, Opportunity, OpportunityId};

/// Storage abstraction for the attribute inputs to scoring: candidate
/// profiles and posted opportunities. Profiles are superseded on update,
/// never deleted.
pub trait RosterStore: Send + Sync {
    fn candidates(&self) -> Result<Vec<CandidateProfile>, RosterError>;
    fn opportunities(&self) -> Result<Vec<Opportunity>, RosterError>;
    fn candidate(&self, id: &CandidateId) -> Result<Option<CandidateProfile>, RosterError>;
    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, RosterError>;
    fn upsert_candidate(&self, profile: CandidateProfile) -> Result<(), RosterError>;
    fn upsert_opportunity(&self, opportunity: Opportunity) -> Result<(), RosterError>;
}

/// Error enumeration for roster failures.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster unavailable: {0}")]
    Unavailable(String),
}

/// Mutex-guarded in-memory roster.
#[derive(Default)]
pub struct MemoryRoster {
    candidates: Mutex<BTreeMap<CandidateId, CandidateProfile>>,
    opportunities: Mutex<BTreeMap<OpportunityId, Opportunity>>,
}

impl RosterStore for MemoryRoster {
    fn candidates(&self) -> Result<Vec<CandidateProfile>, RosterError> {
        let guard = self.candidates.lock().expect("roster mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn opportunities(&self) -> Result<Vec<Opportunity>, RosterError> {
        let guard = self.opportunities.lock().expect("roster mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn candidate(&self, id: &CandidateId) -> Result<Option<CandidateProfile>, RosterError> {
        let guard = self.candidates.lock().expect("roster mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, RosterError> {
        let guard = self.opportunities.lock().expect("roster mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn upsert_candidate(&self, profile: CandidateProfile) -> Result<(), RosterError> {
        let mut guard = self.candidates.lock().expect("roster mutex poisoned");
        guard.insert(profile.id.clone(), profile);
        Ok(())
    }

    fn upsert_opportunity(&self, opportunity: Opportunity) -> Result<(), RosterError> {
        let mut guard = self.opportunities.lock().expect("roster mutex poisoned");
        guard.insert(opportunity.id.clone(), opportunity);
        Ok(())
    }
}
