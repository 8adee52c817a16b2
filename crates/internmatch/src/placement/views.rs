//! Serializable reporting views for dashboards and API responses.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::domain::{AllocationRecord, Opportunity, OpportunityId, SeatSummary};

/// Candidate-facing view of one allocation record.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationView {
    pub opportunity: OpportunityId,
    pub role: String,
    pub organization: String,
    pub sector: String,
    pub status: &'static str,
    pub score: f64,
    pub preference_rank: u32,
}

impl AllocationView {
    pub fn from_record(record: &AllocationRecord) -> Self {
        Self {
            opportunity: record.opportunity.clone(),
            role: record.role.clone(),
            organization: record.organization.clone(),
            sector: record.sector.clone(),
            status: record.status.label(),
            score: record.score,
            preference_rank: record.preference_rank,
        }
    }
}

/// Seat utilization row. Opportunities no pass has touched yet get a
/// synthesized row with every seat open and no refresh stamp.
#[derive(Debug, Clone, Serialize)]
pub struct SeatSummaryView {
    pub opportunity: OpportunityId,
    pub role: String,
    pub organization: String,
    pub seats: u32,
    pub allocated: u32,
    pub remaining: u32,
    pub waiting: u32,
    pub min_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<NaiveDateTime>,
}

/// Merges ledger summaries with the posted roster, ordered by opportunity id.
pub fn seat_summary_board(
    summaries: &[SeatSummary],
    opportunities: &[Opportunity],
) -> Vec<SeatSummaryView> {
    let mut board: BTreeMap<OpportunityId, SeatSummaryView> = opportunities
        .iter()
        .map(|opportunity| {
            (
                opportunity.id.clone(),
                SeatSummaryView {
                    opportunity: opportunity.id.clone(),
                    role: opportunity.role.clone(),
                    organization: opportunity.organization.clone(),
                    seats: opportunity.seats,
                    allocated: 0,
                    remaining: opportunity.seats,
                    waiting: 0,
                    min_score: opportunity.min_score,
                    refreshed_at: None,
                },
            )
        })
        .collect();

    for summary in summaries {
        board.insert(
            summary.opportunity.clone(),
            SeatSummaryView {
                opportunity: summary.opportunity.clone(),
                role: summary.role.clone(),
                organization: summary.organization.clone(),
                seats: summary.seats,
                allocated: summary.allocated,
                remaining: summary.remaining,
                waiting: summary.waiting,
                min_score: summary.min_score,
                refreshed_at: Some(summary.refreshed_at),
            },
        );
    }

    board.into_values().collect()
}
