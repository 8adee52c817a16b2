use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidates who submitted preferences.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for posted internship opportunities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpportunityId(pub String);

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candidate attributes consumed by scoring. Academic fields are optional
/// because onboarding accepts free-text records that may not parse; scoring
/// degrades to documented partial credit instead of failing the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: CandidateId,
    pub full_name: String,
    pub email: String,
    /// Degree or stream as entered, e.g. "B.Tech Computer Science".
    pub qualification: String,
    pub skills: Vec<String>,
    /// Grade average on a 10-point scale.
    pub grade_average: Option<f64>,
    pub secondary_percentage: Option<f64>,
    pub higher_secondary_percentage: Option<f64>,
    /// Ordered preferred work locations, most preferred first, at most three.
    pub location_preferences: Vec<String>,
}

/// A capacity-limited position posted by an organization. Immutable during a
/// pass; seat usage is tracked through allocation records, never decremented
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub role: String,
    pub organization: String,
    pub sector: String,
    pub location: String,
    pub seats: u32,
    pub required_skills: Vec<String>,
    /// Minimum qualifying score; 0 disables the cutoff.
    pub min_score: f64,
    /// Required education as free text; empty means no constraint.
    pub required_education: String,
    pub stipend: Option<String>,
    pub duration: Option<String>,
}

/// One ranked wish of a candidate. Ranks are 1-based and gap-tolerant; a
/// wish may already be resolved to a concrete opportunity or remain a
/// (sector, role, location) description awaiting resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub candidate: CandidateId,
    pub rank: u32,
    pub sector: String,
    pub role: String,
    pub location: String,
    pub opportunity: Option<OpportunityId>,
}

/// Lifecycle states persisted on allocation records. `Accepted`,
/// `Deactivated` and `Rejected` are terminal for their pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStatus {
    Allocated,
    Waiting,
    Accepted,
    Deactivated,
    Rejected,
}

impl AllocationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AllocationStatus::Allocated => "allocated",
            AllocationStatus::Waiting => "waiting",
            AllocationStatus::Accepted => "accepted",
            AllocationStatus::Deactivated => "deactivated",
            AllocationStatus::Rejected => "rejected",
        }
    }

    /// Live records still occupy an offer or waitlist slot.
    pub const fn is_live(self) -> bool {
        matches!(self, AllocationStatus::Allocated | AllocationStatus::Waiting)
    }

    pub const fn is_terminal(self) -> bool {
        !self.is_live()
    }
}

/// A candidate's answer to an open offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferDecision {
    Accepted,
    Rejected,
}

impl OfferDecision {
    /// Exact-match parse of the decision carried on the response link.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Accepted" => Some(OfferDecision::Accepted),
            "Rejected" => Some(OfferDecision::Rejected),
            _ => None,
        }
    }

    pub const fn as_status(self) -> AllocationStatus {
        match self {
            OfferDecision::Accepted => AllocationStatus::Accepted,
            OfferDecision::Rejected => AllocationStatus::Rejected,
        }
    }
}

/// The system-of-record row for one (candidate, opportunity) pairing. Carries
/// a denormalized snapshot of both sides so reporting and notifications need
/// no joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub candidate: CandidateId,
    pub opportunity: OpportunityId,
    pub status: AllocationStatus,
    pub score: f64,
    /// Rank of the preference that produced this pairing.
    pub preference_rank: u32,
    pub candidate_name: String,
    pub candidate_email: String,
    pub role: String,
    pub organization: String,
    pub sector: String,
    pub seats: u32,
    pub min_score: f64,
}

/// Derived per-opportunity seat utilization. Recomputed after every pass;
/// never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub opportunity: OpportunityId,
    pub role: String,
    pub organization: String,
    pub seats: u32,
    pub allocated: u32,
    pub remaining: u32,
    pub waiting: u32,
    pub min_score: f64,
    pub refreshed_at: NaiveDateTime,
}
