//! Waitlist promotion into freed seats, scoped to one opportunity or run as
//! a global sweep.
//!
//! Promotions mutate the working set before seat summaries are recomputed,
//! so a summary always reflects the promotions of its own pass. Rows and
//! summaries outside the scope never enter the change set.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AllocationConfig;

use super::domain::{
    AllocationRecord, AllocationStatus, CandidateId, Opportunity, OpportunityId, SeatSummary,
};
use super::engine::{build_notices, refresh_summary, same_counts, seat_counts, OpportunityFacts, PairKey};
use super::ledger::{LedgerCommit, LedgerSnapshot};
use super::notify::OfferNotice;

/// Pass scope: one vacated opportunity or the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReallocationScope {
    Opportunity(OpportunityId),
    Global,
}

/// Post-run counts for the affected scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReallocationTally {
    pub opportunities: usize,
    pub promoted: usize,
    pub allocated: usize,
    pub waiting: usize,
    pub remaining: usize,
}

#[derive(Debug)]
pub struct ReallocationOutcome {
    pub commit: LedgerCommit,
    pub notices: Vec<OfferNotice>,
    pub tally: ReallocationTally,
}

pub fn run(
    snapshot: &LedgerSnapshot,
    opportunities: &[Opportunity],
    scope: &ReallocationScope,
    caps: &AllocationConfig,
) -> ReallocationOutcome {
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

    let in_scope: BTreeSet<OpportunityId> = match scope {
        ReallocationScope::Opportunity(id) => std::iter::once(id.clone()).collect(),
        ReallocationScope::Global => {
            let mut ids: BTreeSet<OpportunityId> = BTreeSet::new();
            ids.extend(baseline.values().map(|record| record.opportunity.clone()));
            ids.extend(baseline_summaries.keys().cloned());
            ids.extend(opportunities.iter().map(|opp| opp.id.clone()));
            ids
        }
    };

    let accepted_holders: BTreeSet<CandidateId> = baseline
        .values()
        .filter(|record| record.status == AllocationStatus::Accepted)
        .map(|record| record.candidate.clone())
        .collect();
    let mut offers_held: BTreeMap<CandidateId, usize> = BTreeMap::new();
    for record in baseline.values() {
        if matches!(
            record.status,
            AllocationStatus::Allocated | AllocationStatus::Accepted
        ) {
            *offers_held.entry(record.candidate.clone()).or_default() += 1;
        }
    }

    let mut current = baseline.clone();
    let mut tally = ReallocationTally::default();
    let now = Utc::now().naive_utc();
    let mut summaries = Vec::new();

    for opportunity_id in &in_scope {
        let Some(facts) = OpportunityFacts::resolve(
            opportunity_id,
            roster.get(opportunity_id).copied(),
            &current,
            &baseline_summaries,
        ) else {
            continue;
        };
        tally.opportunities += 1;

        let (allocated, _) = seat_counts(&current, opportunity_id);
        let mut freed = facts.seats.saturating_sub(allocated);
        if freed > 0 {
            for candidate in waiting_order(&current, opportunity_id) {
                if freed == 0 {
                    break;
                }
                if accepted_holders.contains(&candidate) {
                    tracing::debug!(
                        candidate = %candidate,
                        opportunity = %opportunity_id,
                        "candidate accepted elsewhere, not promoted"
                    );
                    continue;
                }
                if offers_held.get(&candidate).copied().unwrap_or(0) >= caps.max_offers {
                    tracing::debug!(
                        candidate = %candidate,
                        opportunity = %opportunity_id,
                        "offer cap reached, not promoted"
                    );
                    continue;
                }
                if let Some(record) =
                    current.get_mut(&(candidate.clone(), opportunity_id.clone()))
                {
                    record.status = AllocationStatus::Allocated;
                    *offers_held.entry(candidate).or_default() += 1;
                    freed -= 1;
                    tally.promoted += 1;
                }
            }
        }

        let summary = refresh_summary(&facts, &current, now);
        tally.allocated += summary.allocated as usize;
        tally.waiting += summary.waiting as usize;
        tally.remaining += summary.remaining as usize;
        if !same_counts(baseline_summaries.get(opportunity_id), &summary) {
            summaries.push(summary);
        }
    }

    let records: Vec<AllocationRecord> = current
        .iter()
        .filter(|(pair, record)| baseline.get(*pair) != Some(*record))
        .map(|(_, record)| record.clone())
        .collect();
    let notices = build_notices(&baseline, &current, &records);

    tracing::info!(
        opportunities = tally.opportunities,
        promoted = tally.promoted,
        allocated = tally.allocated,
        waiting = tally.waiting,
        remaining = tally.remaining,
        "reallocation pass computed"
    );

    ReallocationOutcome {
        commit: LedgerCommit {
            records,
            deletes: Vec::new(),
            summaries,
        },
        notices,
        tally,
    }
}

/// Waiting candidates for one opportunity, best first: score descending,
/// earlier preference rank, then candidate id.
fn waiting_order(
    rows: &BTreeMap<PairKey, AllocationRecord>,
    opportunity: &OpportunityId,
) -> Vec<CandidateId> {
    let mut waiting: Vec<&AllocationRecord> = rows
        .values()
        .filter(|record| {
            &record.opportunity == opportunity && record.status == AllocationStatus::Waiting
        })
        .collect();
    waiting.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.preference_rank.cmp(&b.preference_rank))
            .then_with(|| a.candidate.cmp(&b.candidate))
    });
    waiting
        .into_iter()
        .map(|record| record.candidate.clone())
        .collect()
}
