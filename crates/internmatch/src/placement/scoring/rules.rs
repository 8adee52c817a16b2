use std::collections::BTreeSet;

use super::super::domain::{CandidateProfile, Opportunity};
use super::config::ScoringConfig;
use super::{ScoreComponent, ScoreFactor};

/// Case-insensitive containment of the required education in the candidate's
/// qualification text; an empty requirement admits everyone.
pub fn education_eligible(required: &str, qualification: &str) -> bool {
    let required = required.trim();
    if required.is_empty() {
        return true;
    }
    qualification.to_lowercase().contains(&required.to_lowercase())
}

pub(crate) fn academic_component(
    profile: &CandidateProfile,
    config: &ScoringConfig,
) -> ScoreComponent {
    let Some(grade) = profile.grade_average else {
        return ScoreComponent {
            factor: ScoreFactor::Academic,
            score: 7.5 + 2.0,
            notes: "grade average missing, half credit".to_string(),
        };
    };

    let grade_score = if grade >= config.grade_high_water {
        15.0
    } else {
        15.0 * grade / config.grade_high_water
    };

    let (trend_score, trend_note) = match (
        profile.secondary_percentage,
        profile.higher_secondary_percentage,
    ) {
        (Some(secondary), Some(higher_secondary)) => {
            let degree_equivalent = grade * 10.0;
            if secondary <= higher_secondary && higher_secondary <= degree_equivalent {
                (5.0, "improving trend")
            } else if (degree_equivalent - higher_secondary).abs() < config.consistency_band {
                (3.0, "consistent trend")
            } else {
                (1.0, "declining trend")
            }
        }
        _ => (2.0, "trend data incomplete"),
    };

    ScoreComponent {
        factor: ScoreFactor::Academic,
        score: grade_score + trend_score,
        notes: format!("grade {grade:.2} earns {grade_score:.1}, {trend_note}"),
    }
}

pub(crate) fn preference_component(rank: u32, config: &ScoringConfig) -> ScoreComponent {
    let steps = rank.saturating_sub(1) as f64;
    let score = (20.0 * (1.0 - steps * config.rank_decay)).max(0.0);
    ScoreComponent {
        factor: ScoreFactor::PreferenceRank,
        score,
        notes: format!("rank {rank} earns {score:.1} of 20"),
    }
}

pub(crate) fn skills_component(
    profile: &CandidateProfile,
    opportunity: &Opportunity,
) -> ScoreComponent {
    let candidate = tokenize(&profile.skills);
    let required = tokenize(&opportunity.required_skills);

    if candidate.is_empty() || required.is_empty() {
        return ScoreComponent {
            factor: ScoreFactor::Skills,
            score: 17.5,
            notes: "skill data incomplete, half credit".to_string(),
        };
    }

    let matched = required.intersection(&candidate).count();
    let score = 35.0 * matched as f64 / required.len() as f64;
    ScoreComponent {
        factor: ScoreFactor::Skills,
        score,
        notes: format!("{matched} of {} required skills", required.len()),
    }
}

pub(crate) fn location_component(
    profile: &CandidateProfile,
    opportunity: &Opportunity,
) -> ScoreComponent {
    let target = normalize(&opportunity.location);
    let target_region = region_token(&opportunity.location);

    let mut score = 0.0;
    let mut note = "no preferred location match";
    for preferred in &profile.location_preferences {
        if !target.is_empty() && normalize(preferred) == target {
            score = 10.0;
            note = "exact location match";
            break;
        }
        if score < 5.0 && !target_region.is_empty() && region_token(preferred) == target_region {
            score = 5.0;
            note = "same region";
        }
    }

    ScoreComponent {
        factor: ScoreFactor::Location,
        score,
        notes: note.to_string(),
    }
}

fn tokenize(entries: &[String]) -> BTreeSet<String> {
    entries
        .iter()
        .flat_map(|entry| entry.split(|c: char| c == ',' || c.is_whitespace()))
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

fn normalize(location: &str) -> String {
    location.trim().to_lowercase()
}

/// Trailing region token: the text after the last comma, or the whole string
/// when no comma is present.
fn region_token(location: &str) -> String {
    location
        .rsplit(',')
        .next()
        .unwrap_or(location)
        .trim()
        .to_lowercase()
}
