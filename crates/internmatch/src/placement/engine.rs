//! Full allocation pass: filter, score, group, rank, fill seats, waitlist.
//!
//! The pass computes against a ledger snapshot and an in-memory working set;
//! nothing is persisted until the caller commits the returned change set in
//! one shot. Pairs re-derived by the pass replace their previous live rows;
//! every other row is preserved by construction.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AllocationConfig;

use super::domain::{
    AllocationRecord, AllocationStatus, CandidateId, CandidateProfile, Opportunity,
    OpportunityId, Preference, SeatSummary,
};
use super::ledger::{LedgerCommit, LedgerSnapshot};
use super::notify::OfferNotice;
use super::scoring::{education_eligible, ScoringEngine};

pub(crate) type PairKey = (CandidateId, OpportunityId);

/// Per-status counts reported back to the pass trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTally {
    pub candidates: usize,
    pub qualified: usize,
    pub skipped: usize,
    pub allocated: usize,
    pub waiting: usize,
    pub dropped: usize,
    pub unresolved: usize,
}

/// Everything one pass produced: the atomic change set, the notices to send
/// after commit, newly resolved preferences, and the counts.
#[derive(Debug)]
pub struct AllocationPassOutcome {
    pub commit: LedgerCommit,
    pub notices: Vec<OfferNotice>,
    pub resolutions: Vec<Preference>,
    pub tally: AllocationTally,
}

struct ScoredPair<'a> {
    profile: &'a CandidateProfile,
    opportunity: &'a Opportunity,
    score: f64,
    preference_rank: u32,
}

/// Runs the batch pass over every candidate holding preferences.
pub struct AllocationEngine {
    scoring: ScoringEngine,
    caps: AllocationConfig,
}

impl AllocationEngine {
    pub fn new(scoring: ScoringEngine, caps: AllocationConfig) -> Self {
        Self { scoring, caps }
    }

    pub fn run(
        &self,
        snapshot: &LedgerSnapshot,
        candidates: &[CandidateProfile],
        opportunities: &[Opportunity],
        preferences: &[Preference],
    ) -> AllocationPassOutcome {
        let candidate_index: BTreeMap<&CandidateId, &CandidateProfile> = candidates
            .iter()
            .map(|profile| (&profile.id, profile))
            .collect();
        let by_id: BTreeMap<&OpportunityId, &Opportunity> =
            opportunities.iter().map(|opp| (&opp.id, opp)).collect();
        let by_wish: BTreeMap<(String, String, String), &Opportunity> = opportunities
            .iter()
            .map(|opp| (wish_key(&opp.sector, &opp.role, &opp.location), opp))
            .collect();

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

        let accepted_holders: BTreeSet<&CandidateId> = baseline
            .values()
            .filter(|record| record.status == AllocationStatus::Accepted)
            .map(|record| &record.candidate)
            .collect();
        let mut records_by_candidate: BTreeMap<&CandidateId, Vec<&AllocationRecord>> =
            BTreeMap::new();
        for record in baseline.values() {
            records_by_candidate
                .entry(&record.candidate)
                .or_default()
                .push(record);
        }

        let mut by_candidate: BTreeMap<&CandidateId, Vec<&Preference>> = BTreeMap::new();
        for preference in preferences {
            by_candidate
                .entry(&preference.candidate)
                .or_default()
                .push(preference);
        }
        for wishes in by_candidate.values_mut() {
            wishes.sort_by_key(|preference| preference.rank);
        }

        let mut tally = AllocationTally::default();
        let mut resolutions: Vec<Preference> = Vec::new();
        let mut rederived: BTreeSet<PairKey> = BTreeSet::new();
        let mut qualified: BTreeMap<OpportunityId, Vec<ScoredPair<'_>>> = BTreeMap::new();

        for (candidate_id, wishes) in &by_candidate {
            tally.candidates += 1;

            let Some(profile) = candidate_index.get(candidate_id).copied() else {
                tracing::warn!(
                    candidate = %candidate_id,
                    "candidate missing from roster, preferences left for a later pass"
                );
                continue;
            };

            if accepted_holders.contains(candidate_id) {
                tracing::debug!(
                    candidate = %candidate_id,
                    "candidate already accepted an offer, not reconsidered"
                );
                continue;
            }

            // Resolve the whole wish list first so carried-over rows can be
            // told apart from rows this pass will re-derive.
            let mut resolved: Vec<(&Preference, &Opportunity)> = Vec::new();
            for preference in wishes.iter().copied() {
                match resolve(preference, &by_id, &by_wish) {
                    Some(opportunity) => {
                        if preference.opportunity.as_ref() != Some(&opportunity.id) {
                            let mut updated = preference.clone();
                            updated.opportunity = Some(opportunity.id.clone());
                            resolutions.push(updated);
                        }
                        resolved.push((preference, opportunity));
                    }
                    None => {
                        tally.unresolved += 1;
                        tracing::debug!(
                            candidate = %candidate_id,
                            rank = preference.rank,
                            sector = %preference.sector,
                            role = %preference.role,
                            "preference matches no live opportunity, retained unresolved"
                        );
                    }
                }
            }

            let wished: BTreeSet<&OpportunityId> = resolved
                .iter()
                .map(|(_, opportunity)| &opportunity.id)
                .collect();
            let mut carried_offers = 0usize;
            let mut carried_waiting = 0usize;
            if let Some(existing) = records_by_candidate.get(candidate_id) {
                for record in existing {
                    if wished.contains(&record.opportunity) {
                        continue;
                    }
                    match record.status {
                        AllocationStatus::Allocated | AllocationStatus::Accepted => {
                            carried_offers += 1
                        }
                        AllocationStatus::Waiting => carried_waiting += 1,
                        _ => {}
                    }
                }
            }
            if carried_offers >= self.caps.max_offers
                && carried_waiting >= self.caps.max_waiting
            {
                tracing::debug!(
                    candidate = %candidate_id,
                    "offer and waitlist caps already reached, wish list not considered"
                );
                continue;
            }

            let mut seen: BTreeSet<&OpportunityId> = BTreeSet::new();
            for (preference, opportunity) in resolved {
                if !seen.insert(&opportunity.id) {
                    continue;
                }
                let pair = ((*candidate_id).clone(), opportunity.id.clone());
                if let Some(existing) = baseline.get(&pair) {
                    if existing.status.is_terminal() {
                        tally.skipped += 1;
                        tracing::debug!(
                            candidate = %candidate_id,
                            opportunity = %opportunity.id,
                            status = existing.status.label(),
                            "pair already settled, left untouched"
                        );
                        continue;
                    }
                }

                rederived.insert(pair);

                if !education_eligible(&opportunity.required_education, &profile.qualification)
                {
                    tally.skipped += 1;
                    tracing::debug!(
                        candidate = %candidate_id,
                        opportunity = %opportunity.id,
                        required = %opportunity.required_education,
                        "education requirement not met"
                    );
                    continue;
                }

                let breakdown = self.scoring.score(profile, opportunity, preference.rank);
                if let Some(shortfall) = &breakdown.shortfall {
                    tally.skipped += 1;
                    tracing::info!(
                        candidate = %candidate_id,
                        opportunity = %opportunity.id,
                        computed = shortfall.computed,
                        required = shortfall.required,
                        "below minimum score, disqualified"
                    );
                    continue;
                }

                tally.qualified += 1;
                qualified
                    .entry(opportunity.id.clone())
                    .or_default()
                    .push(ScoredPair {
                        profile,
                        opportunity,
                        score: breakdown.total,
                        preference_rank: preference.rank,
                    });
            }
        }

        // Seed counters with the rows this pass leaves in place.
        let mut allocated_count: BTreeMap<&OpportunityId, u32> = BTreeMap::new();
        let mut offers_held: BTreeMap<&CandidateId, usize> = BTreeMap::new();
        let mut waiting_held: BTreeMap<&CandidateId, usize> = BTreeMap::new();
        for (pair, record) in &baseline {
            if rederived.contains(pair) {
                continue;
            }
            match record.status {
                AllocationStatus::Allocated => {
                    *allocated_count.entry(&record.opportunity).or_default() += 1;
                    *offers_held.entry(&record.candidate).or_default() += 1;
                }
                AllocationStatus::Accepted => {
                    *offers_held.entry(&record.candidate).or_default() += 1;
                }
                AllocationStatus::Waiting => {
                    *waiting_held.entry(&record.candidate).or_default() += 1;
                }
                _ => {}
            }
        }

        let mut current = baseline.clone();
        for pair in &rederived {
            current.remove(pair);
        }

        for (opportunity_id, mut group) in qualified {
            rank_group(&mut group);
            let Some(opportunity) = group.first().map(|scored| scored.opportunity) else {
                continue;
            };
            let mut filled = allocated_count
                .get(&opportunity_id)
                .copied()
                .unwrap_or_default();

            for scored in group {
                let candidate_id = &scored.profile.id;
                let offers = offers_held.get(candidate_id).copied().unwrap_or(0);
                let waits = waiting_held.get(candidate_id).copied().unwrap_or(0);

                let status = if filled < opportunity.seats && offers < self.caps.max_offers {
                    filled += 1;
                    *offers_held.entry(candidate_id).or_default() += 1;
                    tally.allocated += 1;
                    AllocationStatus::Allocated
                } else if waits < self.caps.max_waiting {
                    *waiting_held.entry(candidate_id).or_default() += 1;
                    tally.waiting += 1;
                    AllocationStatus::Waiting
                } else {
                    tally.dropped += 1;
                    tracing::debug!(
                        candidate = %candidate_id,
                        opportunity = %opportunity_id,
                        "offer and waitlist caps reached, pairing dropped"
                    );
                    continue;
                };

                let record = build_record(
                    scored.profile,
                    scored.opportunity,
                    status,
                    scored.score,
                    scored.preference_rank,
                );
                current.insert((candidate_id.clone(), opportunity.id.clone()), record);
            }
        }

        let touched: BTreeSet<&OpportunityId> =
            rederived.iter().map(|(_, opportunity)| opportunity).collect();
        let now = Utc::now().naive_utc();
        let mut summaries = Vec::new();
        for opportunity_id in &touched {
            let Some(opportunity) = by_id.get(opportunity_id).copied() else {
                continue;
            };
            let facts = OpportunityFacts::from_opportunity(opportunity);
            let summary = refresh_summary(&facts, &current, now);
            if !same_counts(baseline_summaries.get(*opportunity_id), &summary) {
                summaries.push(summary);
            }
        }

        let deletes: Vec<PairKey> = rederived
            .iter()
            .filter(|pair| baseline.contains_key(*pair) && !current.contains_key(*pair))
            .cloned()
            .collect();
        let records: Vec<AllocationRecord> = current
            .iter()
            .filter(|(pair, record)| baseline.get(*pair) != Some(*record))
            .map(|(_, record)| record.clone())
            .collect();

        let notices = build_notices(&baseline, &current, &records);

        tracing::info!(
            candidates = tally.candidates,
            qualified = tally.qualified,
            skipped = tally.skipped,
            allocated = tally.allocated,
            waiting = tally.waiting,
            dropped = tally.dropped,
            unresolved = tally.unresolved,
            "allocation pass computed"
        );

        AllocationPassOutcome {
            commit: LedgerCommit {
                records,
                deletes,
                summaries,
            },
            notices,
            resolutions,
            tally,
        }
    }
}

fn resolve<'a>(
    preference: &Preference,
    by_id: &BTreeMap<&OpportunityId, &'a Opportunity>,
    by_wish: &BTreeMap<(String, String, String), &'a Opportunity>,
) -> Option<&'a Opportunity> {
    if let Some(id) = &preference.opportunity {
        if let Some(opportunity) = by_id.get(id) {
            return Some(opportunity);
        }
    }
    by_wish
        .get(&wish_key(
            &preference.sector,
            &preference.role,
            &preference.location,
        ))
        .copied()
}

fn wish_key(sector: &str, role: &str, location: &str) -> (String, String, String) {
    (
        sector.trim().to_lowercase(),
        role.trim().to_lowercase(),
        location.trim().to_lowercase(),
    )
}

/// Deterministic seat competition order: score descending, earlier preference
/// rank, then candidate id.
fn rank_group(group: &mut [ScoredPair<'_>]) {
    group.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.preference_rank.cmp(&b.preference_rank))
            .then_with(|| a.profile.id.cmp(&b.profile.id))
    });
}

fn build_record(
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

/// Metadata needed to rebuild a seat summary, assembled from the roster when
/// the opportunity is still posted, else from denormalized row or summary
/// fields.
pub(crate) struct OpportunityFacts {
    pub(crate) id: OpportunityId,
    pub(crate) role: String,
    pub(crate) organization: String,
    pub(crate) seats: u32,
    pub(crate) min_score: f64,
}

impl OpportunityFacts {
    pub(crate) fn from_opportunity(opportunity: &Opportunity) -> Self {
        Self {
            id: opportunity.id.clone(),
            role: opportunity.role.clone(),
            organization: opportunity.organization.clone(),
            seats: opportunity.seats,
            min_score: opportunity.min_score,
        }
    }

    fn from_record(record: &AllocationRecord) -> Self {
        Self {
            id: record.opportunity.clone(),
            role: record.role.clone(),
            organization: record.organization.clone(),
            seats: record.seats,
            min_score: record.min_score,
        }
    }

    fn from_summary(summary: &SeatSummary) -> Self {
        Self {
            id: summary.opportunity.clone(),
            role: summary.role.clone(),
            organization: summary.organization.clone(),
            seats: summary.seats,
            min_score: summary.min_score,
        }
    }

    pub(crate) fn resolve(
        id: &OpportunityId,
        roster: Option<&Opportunity>,
        rows: &BTreeMap<PairKey, AllocationRecord>,
        summaries: &BTreeMap<OpportunityId, SeatSummary>,
    ) -> Option<Self> {
        if let Some(opportunity) = roster {
            return Some(Self::from_opportunity(opportunity));
        }
        if let Some(record) = rows.values().find(|record| &record.opportunity == id) {
            return Some(Self::from_record(record));
        }
        summaries.get(id).map(Self::from_summary)
    }
}

pub(crate) fn seat_counts(
    rows: &BTreeMap<PairKey, AllocationRecord>,
    opportunity: &OpportunityId,
) -> (u32, u32) {
    let mut allocated = 0u32;
    let mut waiting = 0u32;
    for record in rows.values() {
        if &record.opportunity != opportunity {
            continue;
        }
        match record.status {
            AllocationStatus::Allocated => allocated += 1,
            AllocationStatus::Waiting => waiting += 1,
            _ => {}
        }
    }
    (allocated, waiting)
}

pub(crate) fn refresh_summary(
    facts: &OpportunityFacts,
    rows: &BTreeMap<PairKey, AllocationRecord>,
    refreshed_at: chrono::NaiveDateTime,
) -> SeatSummary {
    let (allocated, waiting) = seat_counts(rows, &facts.id);
    SeatSummary {
        opportunity: facts.id.clone(),
        role: facts.role.clone(),
        organization: facts.organization.clone(),
        seats: facts.seats,
        allocated,
        remaining: facts.seats.saturating_sub(allocated),
        waiting,
        min_score: facts.min_score,
        refreshed_at,
    }
}

/// Compares everything except the refresh stamp, so an unchanged rollup is
/// not rewritten.
pub(crate) fn same_counts(previous: Option<&SeatSummary>, next: &SeatSummary) -> bool {
    match previous {
        Some(previous) => {
            previous.seats == next.seats
                && previous.allocated == next.allocated
                && previous.remaining == next.remaining
                && previous.waiting == next.waiting
                && previous.role == next.role
                && previous.organization == next.organization
                && previous.min_score == next.min_score
        }
        None => false,
    }
}

/// One notice per row whose status actually changed: `Allocated` without a
/// rank, `Waiting` with its 1-based position on the opportunity's waitlist.
pub(crate) fn build_notices(
    baseline: &BTreeMap<PairKey, AllocationRecord>,
    current: &BTreeMap<PairKey, AllocationRecord>,
    changed: &[AllocationRecord],
) -> Vec<OfferNotice> {
    let mut notices = Vec::new();
    for record in changed {
        let pair = (record.candidate.clone(), record.opportunity.clone());
        let previous_status = baseline.get(&pair).map(|previous| previous.status);
        if previous_status == Some(record.status) {
            continue;
        }
        match record.status {
            AllocationStatus::Allocated => {
                notices.push(OfferNotice::for_record(record, None));
            }
            AllocationStatus::Waiting => {
                let rank = waitlist_rank(current, record);
                notices.push(OfferNotice::for_record(record, rank));
            }
            _ => {}
        }
    }
    notices
}

fn waitlist_rank(
    rows: &BTreeMap<PairKey, AllocationRecord>,
    record: &AllocationRecord,
) -> Option<u32> {
    let mut waiting: Vec<&AllocationRecord> = rows
        .values()
        .filter(|row| {
            row.opportunity == record.opportunity && row.status == AllocationStatus::Waiting
        })
        .collect();
    waiting.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.preference_rank.cmp(&b.preference_rank))
            .then_with(|| a.candidate.cmp(&b.candidate))
    });
    waiting
        .iter()
        .position(|row| row.candidate == record.candidate)
        .map(|index| index as u32 + 1)
}
