mod config;
mod rules;

pub use config::ScoringConfig;
pub use rules::education_eligible;

use super::domain::{CandidateId, CandidateProfile, Opportunity, OpportunityId};
use serde::{Deserialize, Serialize};

/// Extension point for the branch/qualification sub-score. The exact-match
/// rule is an open product decision; until it lands, [`FlatCreditAffinity`]
/// grants every pairing half credit. Returned credit is clamped to [0, 15].
pub trait QualificationAffinity: Send + Sync {
    fn credit(&self, profile: &CandidateProfile, opportunity: &Opportunity) -> f64;
}

/// Placeholder affinity awarding a flat 7.5 of the 15 available points.
pub struct FlatCreditAffinity;

impl QualificationAffinity for FlatCreditAffinity {
    fn credit(&self, _profile: &CandidateProfile, _opportunity: &Opportunity) -> f64 {
        7.5
    }
}

/// Stateless scorer applying the rubric to a (candidate, opportunity,
/// preference-rank) triple.
pub struct ScoringEngine {
    config: ScoringConfig,
    affinity: Box<dyn QualificationAffinity>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            affinity: Box::new(FlatCreditAffinity),
        }
    }

    pub fn with_affinity(config: ScoringConfig, affinity: Box<dyn QualificationAffinity>) -> Self {
        Self { config, affinity }
    }

    pub fn score(
        &self,
        profile: &CandidateProfile,
        opportunity: &Opportunity,
        preference_rank: u32,
    ) -> ScoreBreakdown {
        let affinity_credit = self
            .affinity
            .credit(profile, opportunity)
            .clamp(0.0, 15.0);

        let components = vec![
            rules::academic_component(profile, &self.config),
            rules::preference_component(preference_rank, &self.config),
            rules::skills_component(profile, opportunity),
            ScoreComponent {
                factor: ScoreFactor::Qualification,
                score: affinity_credit,
                notes: format!("branch affinity credit {affinity_credit:.1} of 15"),
            },
            rules::location_component(profile, opportunity),
        ];

        let computed: f64 = components.iter().map(|component| component.score).sum();

        let shortfall = (opportunity.min_score > 0.0 && computed < opportunity.min_score).then(
            || ScoreShortfall {
                required: opportunity.min_score,
                computed,
            },
        );

        let total = if shortfall.is_some() { 0.0 } else { computed };

        ScoreBreakdown {
            candidate: profile.id.clone(),
            opportunity: opportunity.id.clone(),
            preference_rank,
            total,
            computed,
            components,
            shortfall,
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

/// Rubric factors, one per independently-capped sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreFactor {
    Academic,
    PreferenceRank,
    Skills,
    Qualification,
    Location,
}

/// Discrete contribution to a fitness score, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub score: f64,
    pub notes: String,
}

/// Scoring output for one pairing. `total` is the effective score used in
/// seat competition; `computed` keeps the pre-cutoff sum so disqualified
/// pairings stay auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub candidate: CandidateId,
    pub opportunity: OpportunityId,
    pub preference_rank: u32,
    pub total: f64,
    pub computed: f64,
    pub components: Vec<ScoreComponent>,
    pub shortfall: Option<ScoreShortfall>,
}

impl ScoreBreakdown {
    pub fn is_disqualified(&self) -> bool {
        self.shortfall.is_some()
    }
}

/// Minimum-score cutoff miss retained for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreShortfall {
    pub required: f64,
    pub computed: f64,
}
