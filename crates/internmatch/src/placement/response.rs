//! Accept/reject processing for open offers.
//!
//! Accepting settles the target pair and deactivates every other live row
//! the candidate holds, atomically with the summary refresh. Seats vacated
//! by deactivated open offers are reported back so the caller can run a
//! targeted reallocation pass per opportunity after this commit lands.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use super::domain::{
    AllocationRecord, AllocationStatus, CandidateId, OfferDecision, Opportunity, OpportunityId,
    SeatSummary,
};
use super::engine::{refresh_summary, same_counts, OpportunityFacts, PairKey};
use super::ledger::{LedgerCommit, LedgerSnapshot};
use super::notify::OfferNotice;

#[derive(Debug, thiserror::Error)]
pub enum RespondError {
    #[error("no allocation record for candidate '{candidate}' at opportunity '{opportunity}'")]
    UnknownPairing {
        candidate: CandidateId,
        opportunity: OpportunityId,
    },
    #[error("offer for candidate '{candidate}' at opportunity '{opportunity}' was already {status}")]
    AlreadySettled {
        candidate: CandidateId,
        opportunity: OpportunityId,
        status: &'static str,
    },
    #[error("candidate '{candidate}' already accepted the offer at '{accepted}'")]
    AlreadyAccepted {
        candidate: CandidateId,
        accepted: OpportunityId,
    },
}

#[derive(Debug)]
pub struct ResponseOutcome {
    pub commit: LedgerCommit,
    pub notices: Vec<OfferNotice>,
    /// Opportunities whose open offer was vacated; each wants a targeted
    /// reallocation pass once this commit lands.
    pub vacated: Vec<OpportunityId>,
    pub confirmation: String,
}

pub fn respond(
    snapshot: &LedgerSnapshot,
    opportunities: &[Opportunity],
    candidate: &CandidateId,
    opportunity: &OpportunityId,
    decision: OfferDecision,
) -> Result<ResponseOutcome, RespondError> {
    let baseline: BTreeMap<PairKey, AllocationRecord> = snapshot
        .records
        .iter()
        .map(|record| {
            (
                (record.candidate.clone(), record.opportunity.clone()),
                record.clone(),
            )
        })
        .collect();
    let baseline_summaries: BTreeMap<OpportunityId, SeatSummary> = snapshot
        .summaries
        .iter()
        .map(|summary| (summary.opportunity.clone(), summary.clone()))
        .collect();
    let roster: BTreeMap<&OpportunityId, &Opportunity> =
        opportunities.iter().map(|opp| (&opp.id, opp)).collect();

    let pair = (candidate.clone(), opportunity.clone());
    let Some(target) = baseline.get(&pair) else {
        return Err(RespondError::UnknownPairing {
            candidate: candidate.clone(),
            opportunity: opportunity.clone(),
        });
    };
    if target.status.is_terminal() {
        return Err(RespondError::AlreadySettled {
            candidate: candidate.clone(),
            opportunity: opportunity.clone(),
            status: target.status.label(),
        });
    }
    if decision == OfferDecision::Accepted {
        if let Some(other) = baseline.values().find(|record| {
            &record.candidate == candidate && record.status == AllocationStatus::Accepted
        }) {
            return Err(RespondError::AlreadyAccepted {
                candidate: candidate.clone(),
                accepted: other.opportunity.clone(),
            });
        }
    }

    let confirmation = format!(
        "Your response '{}' for {} at {} has been recorded.",
        decision.as_status().label(),
        target.role,
        target.organization
    );

    let mut current = baseline.clone();
    let mut notices = Vec::new();
    let mut vacated = Vec::new();
    let mut touched: BTreeSet<OpportunityId> = BTreeSet::new();
    touched.insert(opportunity.clone());

    match decision {
        OfferDecision::Accepted => {
            if let Some(record) = current.get_mut(&pair) {
                record.status = AllocationStatus::Accepted;
                notices.push(OfferNotice::for_record(record, None));
            }

            let others: Vec<PairKey> = current
                .values()
                .filter(|record| {
                    &record.candidate == candidate
                        && &record.opportunity != opportunity
                        && record.status.is_live()
                })
                .map(|record| (record.candidate.clone(), record.opportunity.clone()))
                .collect();
            for key in others {
                if let Some(record) = current.get_mut(&key) {
                    let held_seat = record.status == AllocationStatus::Allocated;
                    record.status = AllocationStatus::Deactivated;
                    notices.push(OfferNotice::for_record(record, None));
                    touched.insert(key.1.clone());
                    if held_seat {
                        vacated.push(key.1.clone());
                    }
                }
            }
        }
        OfferDecision::Rejected => {
            if let Some(record) = current.get_mut(&pair) {
                record.status = AllocationStatus::Rejected;
                notices.push(OfferNotice::for_record(record, None));
            }
            vacated.push(opportunity.clone());
        }
    }

    let now = Utc::now().naive_utc();
    let mut summaries = Vec::new();
    for touched_id in &touched {
        let Some(facts) = OpportunityFacts::resolve(
            touched_id,
            roster.get(touched_id).copied(),
            &current,
            &baseline_summaries,
        ) else {
            continue;
        };
        let summary = refresh_summary(&facts, &current, now);
        if !same_counts(baseline_summaries.get(touched_id), &summary) {
            summaries.push(summary);
        }
    }

    let records: Vec<AllocationRecord> = current
        .iter()
        .filter(|(key, record)| baseline.get(*key) != Some(*record))
        .map(|(_, record)| record.clone())
        .collect();

    tracing::info!(
        candidate = %candidate,
        opportunity = %opportunity,
        decision = decision.as_status().label(),
        deactivated = notices.len().saturating_sub(1),
        vacated = vacated.len(),
        "offer response processed"
    );

    Ok(ResponseOutcome {
        commit: LedgerCommit {
            records,
            deletes: Vec::new(),
            summaries,
        },
        notices,
        vacated,
        confirmation,
    })
}
