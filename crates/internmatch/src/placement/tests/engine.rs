use super::common::*;
use crate::placement::domain::{
    AllocationRecord, AllocationStatus, CandidateId, OpportunityId, Preference,
};
use crate::placement::ledger::AllocationLedger;

fn status_of(records: &[AllocationRecord], candidate: &str) -> AllocationStatus {
    records
        .iter()
        .find(|record| record.candidate.0 == candidate)
        .map(|record| record.status)
        .expect("record present")
}

#[test]
fn fills_seats_in_score_order_and_waitlists_overflow() {
    let posting = opportunity("opp-data", 1);
    let candidates = vec![profile("cand-1"), weaker_profile("cand-2")];
    let wishes = vec![
        wish("cand-1", 1, &posting),
        wish("cand-2", 1, &posting),
    ];

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting.clone()], &wishes);

    assert_eq!(outcome.tally.candidates, 2);
    assert_eq!(outcome.tally.qualified, 2);
    assert_eq!(outcome.tally.allocated, 1);
    assert_eq!(outcome.tally.waiting, 1);

    let records = &outcome.commit.records;
    assert_eq!(records.len(), 2);
    assert_eq!(status_of(records, "cand-1"), AllocationStatus::Allocated);
    assert_eq!(status_of(records, "cand-2"), AllocationStatus::Waiting);

    let summary = outcome
        .commit
        .summaries
        .iter()
        .find(|summary| summary.opportunity == posting.id)
        .expect("summary refreshed");
    assert_eq!(summary.allocated, 1);
    assert_eq!(summary.remaining, 0);
    assert_eq!(summary.waiting, 1);

    let waiting_notice = outcome
        .notices
        .iter()
        .find(|notice| notice.status == AllocationStatus::Waiting)
        .expect("waitlist notice");
    assert_eq!(waiting_notice.waitlist_rank, Some(1));

    assert_eq!(outcome.resolutions.len(), 2);
    assert!(outcome
        .resolutions
        .iter()
        .all(|preference| preference.opportunity.as_ref() == Some(&posting.id)));
}

#[test]
fn education_mismatch_skips_the_pairing() {
    let mut posting = opportunity("opp-data", 1);
    posting.required_education = "MBA".to_string();
    let candidates = vec![profile("cand-1")];
    let wishes = vec![wish("cand-1", 1, &posting)];

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting], &wishes);

    assert_eq!(outcome.tally.skipped, 1);
    assert_eq!(outcome.tally.qualified, 0);
    assert!(outcome.commit.records.is_empty());
    // The pairing was re-derived to nothing, so the rollup still refreshes.
    assert_eq!(outcome.commit.summaries.len(), 1);
    assert_eq!(outcome.commit.summaries[0].allocated, 0);
}

#[test]
fn score_shortfall_disqualifies_without_a_row() {
    let mut posting = opportunity("opp-data", 1);
    posting.min_score = 95.0;
    let candidates = vec![profile("cand-1")];
    let wishes = vec![pinned_wish("cand-1", 1, &posting)];

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting], &wishes);

    assert_eq!(outcome.tally.skipped, 1);
    assert!(outcome.commit.records.is_empty());
    assert!(outcome.commit.deletes.is_empty());
}

#[test]
fn disqualifying_rederivation_deletes_the_stale_row() {
    let mut posting = opportunity("opp-data", 1);
    posting.min_score = 95.0;
    let incumbent = profile("cand-1");
    let ledger = seeded_ledger(vec![record(
        &incumbent,
        &posting,
        AllocationStatus::Allocated,
        92.5,
        1,
    )]);
    let snapshot = ledger.snapshot().expect("snapshot");
    let wishes = vec![pinned_wish("cand-1", 1, &posting)];

    let outcome = engine().run(&snapshot, &[incumbent], &[posting.clone()], &wishes);

    assert!(outcome.commit.records.is_empty());
    assert_eq!(
        outcome.commit.deletes,
        vec![(CandidateId("cand-1".to_string()), posting.id.clone())]
    );

    ledger
        .commit(snapshot.version, outcome.commit)
        .expect("commit applies");
    assert!(ledger.snapshot().expect("snapshot").records.is_empty());
}

#[test]
fn offer_cap_spreads_a_candidate_across_opportunities() {
    let postings = vec![
        opportunity_role("opp-a", 1, "Backend Analyst"),
        opportunity_role("opp-b", 1, "Data Analyst"),
        opportunity_role("opp-c", 1, "Platform Analyst"),
    ];
    let candidates = vec![profile("cand-1")];
    let wishes = vec![
        wish("cand-1", 1, &postings[0]),
        wish("cand-1", 2, &postings[1]),
        wish("cand-1", 3, &postings[2]),
    ];

    let outcome = engine().run(&empty_snapshot(), &candidates, &postings, &wishes);

    assert_eq!(outcome.tally.allocated, 2);
    assert_eq!(outcome.tally.waiting, 1);
    let by_opportunity = |id: &str| {
        outcome
            .commit
            .records
            .iter()
            .find(|record| record.opportunity.0 == id)
            .map(|record| record.status)
            .expect("record present")
    };
    assert_eq!(by_opportunity("opp-a"), AllocationStatus::Allocated);
    assert_eq!(by_opportunity("opp-b"), AllocationStatus::Allocated);
    assert_eq!(by_opportunity("opp-c"), AllocationStatus::Waiting);
}

#[test]
fn waitlist_cap_drops_the_overflow() {
    let postings = vec![
        opportunity_role("opp-a", 0, "Backend Analyst"),
        opportunity_role("opp-b", 0, "Data Analyst"),
        opportunity_role("opp-c", 0, "Platform Analyst"),
    ];
    let candidates = vec![profile("cand-1")];
    let wishes = vec![
        wish("cand-1", 1, &postings[0]),
        wish("cand-1", 2, &postings[1]),
        wish("cand-1", 3, &postings[2]),
    ];

    let outcome = engine().run(&empty_snapshot(), &candidates, &postings, &wishes);

    assert_eq!(outcome.tally.waiting, 2);
    assert_eq!(outcome.tally.dropped, 1);
    assert_eq!(outcome.commit.records.len(), 2);
}

#[test]
fn second_run_makes_no_changes() {
    let posting = opportunity("opp-data", 1);
    let candidates = vec![profile("cand-1"), weaker_profile("cand-2")];
    let wishes = vec![
        pinned_wish("cand-1", 1, &posting),
        pinned_wish("cand-2", 1, &posting),
    ];
    let ledger = seeded_ledger(Vec::new());

    let snapshot = ledger.snapshot().expect("snapshot");
    let first = engine().run(&snapshot, &candidates, &[posting.clone()], &wishes);
    assert!(!first.commit.is_empty());
    ledger
        .commit(snapshot.version, first.commit)
        .expect("first commit");

    let snapshot = ledger.snapshot().expect("snapshot");
    let second = engine().run(&snapshot, &candidates, &[posting], &wishes);
    assert!(second.commit.is_empty(), "rerun must not rewrite rows");
    assert!(second.notices.is_empty());
}

#[test]
fn accepted_candidates_are_not_reconsidered() {
    let held = opportunity_role("opp-held", 1, "Backend Analyst");
    let open = opportunity_role("opp-open", 1, "Data Analyst");
    let candidate = profile("cand-1");
    let ledger = seeded_ledger(vec![record(
        &candidate,
        &held,
        AllocationStatus::Accepted,
        92.5,
        1,
    )]);
    let snapshot = ledger.snapshot().expect("snapshot");
    let wishes = vec![pinned_wish("cand-1", 1, &open)];

    let outcome = engine().run(
        &snapshot,
        &[candidate],
        &[held, open],
        &wishes,
    );

    assert!(outcome.commit.is_empty());
    assert_eq!(outcome.tally.candidates, 1);
    assert_eq!(outcome.tally.qualified, 0);
}

#[test]
fn rejected_pair_is_never_rederived() {
    let posting = opportunity("opp-data", 1);
    let candidate = profile("cand-1");
    let ledger = seeded_ledger(vec![record(
        &candidate,
        &posting,
        AllocationStatus::Rejected,
        92.5,
        1,
    )]);
    let snapshot = ledger.snapshot().expect("snapshot");
    let wishes = vec![pinned_wish("cand-1", 1, &posting)];

    let outcome = engine().run(&snapshot, &[candidate], &[posting], &wishes);

    assert_eq!(outcome.tally.skipped, 1);
    assert!(outcome.commit.is_empty());
}

#[test]
fn saturated_candidates_skip_the_whole_wish_list() {
    let held_a = opportunity_role("opp-h1", 1, "Backend Analyst");
    let held_b = opportunity_role("opp-h2", 1, "Data Analyst");
    let wait_a = opportunity_role("opp-w1", 1, "Platform Analyst");
    let wait_b = opportunity_role("opp-w2", 1, "Research Analyst");
    let fresh = opportunity_role("opp-new", 3, "Support Analyst");
    let candidate = profile("cand-1");
    let ledger = seeded_ledger(vec![
        record(&candidate, &held_a, AllocationStatus::Allocated, 90.0, 1),
        record(&candidate, &held_b, AllocationStatus::Allocated, 88.0, 2),
        record(&candidate, &wait_a, AllocationStatus::Waiting, 86.0, 3),
        record(&candidate, &wait_b, AllocationStatus::Waiting, 84.0, 4),
    ]);
    let snapshot = ledger.snapshot().expect("snapshot");
    let wishes = vec![pinned_wish("cand-1", 5, &fresh)];

    let outcome = engine().run(
        &snapshot,
        &[candidate],
        &[held_a, held_b, wait_a, wait_b, fresh],
        &wishes,
    );

    assert!(outcome.commit.is_empty());
    assert_eq!(outcome.tally.qualified, 0);
}

#[test]
fn stronger_late_arrival_demotes_the_incumbent() {
    let posting = opportunity("opp-data", 1);
    let incumbent = weaker_profile("cand-2");
    let ledger = seeded_ledger(vec![record(
        &incumbent,
        &posting,
        AllocationStatus::Allocated,
        75.0,
        1,
    )]);
    let snapshot = ledger.snapshot().expect("snapshot");
    let candidates = vec![profile("cand-1"), incumbent];
    let wishes = vec![
        pinned_wish("cand-1", 1, &posting),
        pinned_wish("cand-2", 1, &posting),
    ];

    let outcome = engine().run(&snapshot, &candidates, &[posting.clone()], &wishes);

    let records = &outcome.commit.records;
    assert_eq!(status_of(records, "cand-1"), AllocationStatus::Allocated);
    assert_eq!(status_of(records, "cand-2"), AllocationStatus::Waiting);

    ledger
        .commit(snapshot.version, outcome.commit)
        .expect("commit applies");
    let after = ledger.snapshot().expect("snapshot");
    assert_eq!(status_of(&after.records, "cand-1"), AllocationStatus::Allocated);
    assert_eq!(status_of(&after.records, "cand-2"), AllocationStatus::Waiting);
}

#[test]
fn duplicate_wishes_keep_the_best_rank() {
    let posting = opportunity("opp-data", 2);
    let candidates = vec![profile("cand-1")];
    let wishes = vec![
        wish("cand-1", 1, &posting),
        pinned_wish("cand-1", 3, &posting),
    ];

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting], &wishes);

    assert_eq!(outcome.commit.records.len(), 1);
    assert_eq!(outcome.commit.records[0].preference_rank, 1);
}

#[test]
fn unmatched_wishes_stay_unresolved() {
    let posting = opportunity("opp-data", 1);
    let candidates = vec![profile("cand-1")];
    let wishes = vec![Preference {
        candidate: CandidateId("cand-1".to_string()),
        rank: 1,
        sector: "Finance".to_string(),
        role: "Risk Analyst".to_string(),
        location: "Delhi, NCR".to_string(),
        opportunity: None,
    }];

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting], &wishes);

    assert_eq!(outcome.tally.unresolved, 1);
    assert!(outcome.resolutions.is_empty());
    assert!(outcome.commit.is_empty());
}

#[test]
fn wish_matching_tolerates_case_and_whitespace() {
    let posting = opportunity("opp-data", 1);
    let candidates = vec![profile("cand-1")];
    let wishes = vec![Preference {
        candidate: CandidateId("cand-1".to_string()),
        rank: 1,
        sector: " TECHNOLOGY ".to_string(),
        role: "data analyst".to_string(),
        location: "PUNE, MAHARASHTRA".to_string(),
        opportunity: None,
    }];

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting.clone()], &wishes);

    assert_eq!(outcome.tally.unresolved, 0);
    assert_eq!(outcome.commit.records.len(), 1);
    assert_eq!(outcome.resolutions.len(), 1);
    assert_eq!(
        outcome.resolutions[0].opportunity.as_ref(),
        Some(&posting.id)
    );
}

#[test]
fn stale_pins_are_rerouted_by_triple() {
    let posting = opportunity("opp-data", 1);
    let candidates = vec![profile("cand-1")];
    let mut stale = wish("cand-1", 1, &posting);
    stale.opportunity = Some(OpportunityId("opp-delisted".to_string()));

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting.clone()], &vec![stale]);

    assert_eq!(outcome.commit.records.len(), 1);
    assert_eq!(outcome.commit.records[0].opportunity, posting.id);
    assert_eq!(outcome.resolutions.len(), 1);
    assert_eq!(
        outcome.resolutions[0].opportunity.as_ref(),
        Some(&posting.id)
    );
}

#[test]
fn equal_scores_break_ties_by_candidate_id() {
    let posting = opportunity("opp-data", 2);
    let candidates = vec![
        profile("cand-1"),
        profile("cand-2"),
        profile("cand-3"),
        profile("cand-4"),
    ];
    let wishes = vec![
        pinned_wish("cand-1", 1, &posting),
        pinned_wish("cand-2", 1, &posting),
        pinned_wish("cand-3", 1, &posting),
        pinned_wish("cand-4", 1, &posting),
    ];

    let outcome = engine().run(&empty_snapshot(), &candidates, &[posting], &wishes);

    let records = &outcome.commit.records;
    assert_eq!(status_of(records, "cand-1"), AllocationStatus::Allocated);
    assert_eq!(status_of(records, "cand-2"), AllocationStatus::Allocated);
    assert_eq!(status_of(records, "cand-3"), AllocationStatus::Waiting);
    assert_eq!(status_of(records, "cand-4"), AllocationStatus::Waiting);

    let rank_for = |candidate: &str| {
        outcome
            .notices
            .iter()
            .find(|notice| notice.candidate.0 == candidate)
            .and_then(|notice| notice.waitlist_rank)
    };
    assert_eq!(rank_for("cand-3"), Some(1));
    assert_eq!(rank_for("cand-4"), Some(2));
}

#[test]
fn missing_roster_profile_defers_the_candidate() {
    let posting = opportunity("opp-data", 1);
    let wishes = vec![pinned_wish("cand-ghost", 1, &posting)];

    let outcome = engine().run(&empty_snapshot(), &[], &[posting], &wishes);

    assert_eq!(outcome.tally.candidates, 1);
    assert_eq!(outcome.tally.qualified, 0);
    assert!(outcome.commit.is_empty());
}
