use super::common::*;
use crate::placement::scoring::{
    education_eligible, ScoreBreakdown, ScoreFactor, ScoringConfig, ScoringEngine,
};

fn score_of(breakdown: &ScoreBreakdown, factor: ScoreFactor) -> f64 {
    breakdown
        .components
        .iter()
        .find(|component| component.factor == factor)
        .map(|component| component.score)
        .expect("factor present")
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn full_alignment_earns_full_rubric_marks() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let breakdown = engine.score(&profile("cand-1"), &opportunity("opp-1", 1), 1);

    assert_close(score_of(&breakdown, ScoreFactor::Academic), 20.0);
    assert_close(score_of(&breakdown, ScoreFactor::PreferenceRank), 20.0);
    assert_close(score_of(&breakdown, ScoreFactor::Skills), 35.0);
    assert_close(score_of(&breakdown, ScoreFactor::Qualification), 7.5);
    assert_close(score_of(&breakdown, ScoreFactor::Location), 10.0);
    assert_close(breakdown.total, 92.5);
    assert!(!breakdown.is_disqualified());
}

#[test]
fn grade_below_high_water_scales_linearly() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.grade_average = Some(6.0);
    candidate.secondary_percentage = Some(55.0);
    candidate.higher_secondary_percentage = Some(58.0);

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    // 15 * 6.0 / 8.0 for the grade, plus 5 for the improving trend.
    assert_close(score_of(&breakdown, ScoreFactor::Academic), 16.25);
}

#[test]
fn missing_grade_takes_partial_credit() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.grade_average = None;

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&breakdown, ScoreFactor::Academic), 9.5);
}

#[test]
fn consistent_trend_scores_middle_band() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.grade_average = Some(8.0);
    candidate.secondary_percentage = Some(90.0);
    candidate.higher_secondary_percentage = Some(78.0);

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&breakdown, ScoreFactor::Academic), 18.0);
}

#[test]
fn declining_trend_scores_bottom() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.grade_average = Some(7.0);
    candidate.secondary_percentage = Some(90.0);
    candidate.higher_secondary_percentage = Some(80.0);

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&breakdown, ScoreFactor::Academic), 14.125);
}

#[test]
fn incomplete_trend_data_takes_two_points() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.secondary_percentage = None;

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&breakdown, ScoreFactor::Academic), 17.0);
}

#[test]
fn preference_credit_decays_with_rank() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let candidate = profile("cand-1");
    let posting = opportunity("opp-1", 1);

    let second = engine.score(&candidate, &posting, 2);
    assert_close(score_of(&second, ScoreFactor::PreferenceRank), 16.0);

    let fifth = engine.score(&candidate, &posting, 5);
    assert_close(score_of(&fifth, ScoreFactor::PreferenceRank), 4.0);

    let sixth = engine.score(&candidate, &posting, 6);
    assert_close(score_of(&sixth, ScoreFactor::PreferenceRank), 0.0);
}

#[test]
fn partial_skill_overlap_scales_by_required_count() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut posting = opportunity("opp-1", 1);
    posting.required_skills = vec![
        "Python".to_string(),
        "SQL".to_string(),
        "Excel".to_string(),
        "Tableau".to_string(),
    ];

    let breakdown = engine.score(&profile("cand-1"), &posting, 1);
    assert_close(score_of(&breakdown, ScoreFactor::Skills), 17.5);
}

#[test]
fn unspecified_skills_take_half_credit() {
    let engine = ScoringEngine::new(ScoringConfig::default());

    let mut posting = opportunity("opp-1", 1);
    posting.required_skills = Vec::new();
    let no_requirement = engine.score(&profile("cand-1"), &posting, 1);
    assert_close(score_of(&no_requirement, ScoreFactor::Skills), 17.5);

    let mut candidate = profile("cand-1");
    candidate.skills = Vec::new();
    let no_skills = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&no_skills, ScoreFactor::Skills), 17.5);
}

#[test]
fn same_region_location_takes_half_credit() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.location_preferences = vec!["Mumbai, Maharashtra".to_string()];

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&breakdown, ScoreFactor::Location), 5.0);
}

#[test]
fn unrelated_location_scores_zero() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.location_preferences = vec!["Chennai, Tamil Nadu".to_string()];

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&breakdown, ScoreFactor::Location), 0.0);
}

#[test]
fn exact_location_match_beats_region_match() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.location_preferences = vec![
        "Mumbai, Maharashtra".to_string(),
        "Pune, Maharashtra".to_string(),
    ];

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert_close(score_of(&breakdown, ScoreFactor::Location), 10.0);
}

#[test]
fn minimum_score_cutoff_disqualifies_but_keeps_the_audit_trail() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut posting = opportunity("opp-1", 1);
    posting.min_score = 95.0;

    let breakdown = engine.score(&profile("cand-1"), &posting, 1);
    assert!(breakdown.is_disqualified());
    assert_close(breakdown.total, 0.0);
    assert_close(breakdown.computed, 92.5);
    let shortfall = breakdown.shortfall.as_ref().expect("shortfall recorded");
    assert_close(shortfall.required, 95.0);
    assert_close(shortfall.computed, 92.5);
}

#[test]
fn zero_minimum_disables_the_cutoff() {
    let engine = ScoringEngine::new(ScoringConfig::default());
    let mut candidate = profile("cand-1");
    candidate.skills = Vec::new();
    candidate.grade_average = None;
    candidate.location_preferences = Vec::new();

    let breakdown = engine.score(&candidate, &opportunity("opp-1", 1), 1);
    assert!(!breakdown.is_disqualified());
    assert!(breakdown.total > 0.0);
}

#[test]
fn education_requirement_matches_case_insensitively() {
    assert!(education_eligible("b.tech", "B.Tech Computer Science"));
    assert!(education_eligible("B.Tech", "Integrated b.tech and M.Tech"));
    assert!(!education_eligible("MBA", "B.Tech Computer Science"));
    assert!(education_eligible("", "anything at all"));
    assert!(education_eligible("   ", "anything at all"));
}
