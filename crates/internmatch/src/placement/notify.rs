use serde::{Deserialize, Serialize};

use super::domain::{AllocationRecord, AllocationStatus, CandidateId, OpportunityId};

/// Trait describing outbound status notifications (e-mail adapters and the
/// like). Delivery failure is non-fatal to every caller; use
/// [`deliver_quietly`] from engine code.
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notice: OfferNotice) -> Result<(), NotifyError>;
}

/// Status event payload handed to the sink at every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferNotice {
    pub recipient: String,
    pub candidate_name: String,
    pub role: String,
    pub organization: String,
    pub score: f64,
    pub candidate: CandidateId,
    pub opportunity: OpportunityId,
    pub status: AllocationStatus,
    /// 1-based position within the opportunity's waitlist, for `Waiting`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_rank: Option<u32>,
}

impl OfferNotice {
    pub fn for_record(record: &AllocationRecord, waitlist_rank: Option<u32>) -> Self {
        Self {
            recipient: record.candidate_email.clone(),
            candidate_name: record.candidate_name.clone(),
            role: record.role.clone(),
            organization: record.organization.clone(),
            score: record.score,
            candidate: record.candidate.clone(),
            opportunity: record.opportunity.clone(),
            status: record.status,
            waitlist_rank,
        }
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Delivers a notice, logging and swallowing any failure. Notification
/// trouble must never abort or roll back a pass.
pub fn deliver_quietly<N: NotificationSink + ?Sized>(sink: &N, notice: OfferNotice) {
    let candidate = notice.candidate.clone();
    let opportunity = notice.opportunity.clone();
    let status = notice.status;
    if let Err(err) = sink.deliver(notice) {
        tracing::warn!(
            candidate = %candidate,
            opportunity = %opportunity,
            status = status.label(),
            error = %err,
            "notification delivery failed, continuing"
        );
    }
}
