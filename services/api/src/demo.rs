use crate::infra::RecordingSink;
use chrono::Local;
use clap::Args;
use internmatch::config::{AllocationConfig, AppConfig};
use internmatch::error::AppError;
use internmatch::placement::{
    AllocationTally, CandidateId, CandidateProfile, MemoryLedger, MemoryPreferences, MemoryRoster,
    Opportunity, OpportunityId, PlacementService, Preference, ReallocationScope, RosterImporter,
    SeatSummaryView,
};
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = PlacementService<MemoryLedger, MemoryPreferences, MemoryRoster, RecordingSink>;

#[derive(Args, Debug)]
pub(crate) struct AllocateArgs {
    /// Candidate roster CSV export
    #[arg(long)]
    pub(crate) candidates: PathBuf,
    /// Opportunity roster CSV export
    #[arg(long)]
    pub(crate) opportunities: PathBuf,
    /// Ranked preference CSV export
    #[arg(long)]
    pub(crate) preferences: PathBuf,
    /// Override the per-candidate cap on simultaneous offers
    #[arg(long)]
    pub(crate) max_offers: Option<usize>,
    /// Override the per-candidate cap on waitlist spots
    #[arg(long)]
    pub(crate) max_waiting: Option<usize>,
    /// Print every candidate's allocation rows after the pass
    #[arg(long)]
    pub(crate) list_allocations: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the per-candidate cap on simultaneous offers
    #[arg(long)]
    pub(crate) max_offers: Option<usize>,
    /// Override the per-candidate cap on waitlist spots
    #[arg(long)]
    pub(crate) max_waiting: Option<usize>,
    /// Skip the offer response portion of the demo.
    #[arg(long)]
    pub(crate) skip_responses: bool,
}

/// One batch pass over exported roster files, printed as a report.
pub(crate) fn run_allocate(args: AllocateArgs) -> Result<(), AppError> {
    let AllocateArgs {
        candidates,
        opportunities,
        preferences,
        max_offers,
        max_waiting,
        list_allocations,
    } = args;

    let config = AppConfig::load()?;
    let mut caps = config.allocation;
    if let Some(value) = max_offers {
        caps.max_offers = value;
    }
    if let Some(value) = max_waiting {
        caps.max_waiting = value;
    }

    let candidate_rows = RosterImporter::candidates_from_path(&candidates)?;
    let opportunity_rows = RosterImporter::opportunities_from_path(&opportunities)?;
    let preference_rows = RosterImporter::preferences_from_path(&preferences)?;
    let profiles = candidate_rows.clone();

    let (service, sink) = build_service(caps);
    let import = service.import_roster(candidate_rows, opportunity_rows, preference_rows)?;

    println!("Allocation pass over roster exports");
    println!(
        "- imported {} candidates | {} opportunities | {} preference rows",
        import.candidates, import.opportunities, import.preferences
    );
    println!(
        "- caps: {} open offers | {} waitlist spots per candidate",
        caps.max_offers, caps.max_waiting
    );

    let tally = service.run_allocation()?;
    render_tally(&tally);
    println!("- completed at {}", Local::now().format("%Y-%m-%d %H:%M"));

    render_board(&service.seat_summaries()?);
    if list_allocations {
        render_candidate_rows(&service, &profiles)?;
    }
    println!("- {} notices queued for dispatch", sink.events().len());

    Ok(())
}

/// Seeded walkthrough: import, batch pass, an acceptance with its cascade,
/// a rejection, and a closing reallocation sweep.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        max_offers,
        max_waiting,
        skip_responses,
    } = args;

    let mut caps = AllocationConfig::default();
    if let Some(value) = max_offers {
        caps.max_offers = value;
    }
    if let Some(value) = max_waiting {
        caps.max_waiting = value;
    }

    println!("Internship seat allocation demo");
    println!(
        "- caps: {} open offers | {} waitlist spots per candidate",
        caps.max_offers, caps.max_waiting
    );

    let (service, sink) = build_service(caps);
    let (candidates, opportunities, preferences) = demo_roster();
    let profiles = candidates.clone();
    let import = service.import_roster(candidates, opportunities, preferences)?;
    println!(
        "- roster: {} candidates | {} opportunities | {} preference rows",
        import.candidates, import.opportunities, import.preferences
    );

    println!("\nAllocation pass");
    let tally = service.run_allocation()?;
    render_tally(&tally);

    render_board(&service.seat_summaries()?);
    render_candidate_rows(&service, &profiles)?;

    if skip_responses {
        render_notices(&sink);
        return Ok(());
    }

    println!("\nOffer responses");
    let ananya = CandidateId("CAND-01".to_string());
    let data_analyst = OpportunityId("OPP-101".to_string());
    match service.respond(&ananya, &data_analyst, "Accepted") {
        Ok(receipt) => {
            println!("- {ananya} accepts {data_analyst}");
            println!("  {}", receipt.confirmation);
            println!(
                "  {} offer(s) released | {} promoted from waitlists",
                receipt.vacated, receipt.promoted
            );
        }
        Err(err) => {
            println!("  Response refused: {err}");
            return Ok(());
        }
    }

    let priya = CandidateId("CAND-03".to_string());
    let accountant = OpportunityId("OPP-103".to_string());
    match service.respond(&priya, &accountant, "Rejected") {
        Ok(receipt) => {
            println!("- {priya} rejects {accountant}");
            println!("  {}", receipt.confirmation);
            println!(
                "  {} offer(s) released | {} promoted from waitlists",
                receipt.vacated, receipt.promoted
            );
        }
        Err(err) => {
            println!("  Response refused: {err}");
            return Ok(());
        }
    }

    // An accepted offer stops holding a capacity slot, so a sweep can seat
    // waitlisted candidates the cascades never reached.
    let sweep = service.reallocate(ReallocationScope::Global)?;
    println!(
        "- global sweep: {} opportunities checked | {} promoted",
        sweep.opportunities, sweep.promoted
    );

    println!();
    render_board(&service.seat_summaries()?);

    let rows = service.candidate_allocations(&ananya)?;
    match serde_json::to_string_pretty(&rows) {
        Ok(json) => println!("\nAllocation payload for {ananya}:\n{json}"),
        Err(err) => println!("\nAllocation payload unavailable: {err}"),
    }

    render_notices(&sink);
    Ok(())
}

fn build_service(caps: AllocationConfig) -> (Arc<DemoService>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let service = Arc::new(PlacementService::new(
        Arc::new(MemoryLedger::default()),
        Arc::new(MemoryPreferences::default()),
        Arc::new(MemoryRoster::default()),
        sink.clone(),
        caps,
    ));
    (service, sink)
}

fn render_tally(tally: &AllocationTally) {
    println!(
        "- considered {} candidates | {} qualified pairings | {} skipped",
        tally.candidates, tally.qualified, tally.skipped
    );
    println!(
        "- {} offers extended | {} waitlisted | {} dropped | {} unresolved wishes",
        tally.allocated, tally.waiting, tally.dropped, tally.unresolved
    );
}

fn render_board(rows: &[SeatSummaryView]) {
    println!("Seat board");
    for row in rows {
        let refreshed = row
            .refreshed_at
            .map(|stamp| stamp.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  - {} {} at {}: {}/{} seats filled | {} waiting | {} open | refreshed {}",
            row.opportunity,
            row.role,
            row.organization,
            row.allocated,
            row.seats,
            row.waiting,
            row.remaining,
            refreshed
        );
    }
}

fn render_candidate_rows(
    service: &DemoService,
    profiles: &[CandidateProfile],
) -> Result<(), AppError> {
    println!("Candidate allocations");
    for profile in profiles {
        println!("  {} {}", profile.id, profile.full_name);
        let rows = service.candidate_allocations(&profile.id)?;
        if rows.is_empty() {
            println!("    no rows this pass");
            continue;
        }
        for row in rows {
            println!(
                "    #{} {} at {} [{}] score {:.1}",
                row.preference_rank, row.role, row.organization, row.status, row.score
            );
        }
    }
    Ok(())
}

fn render_notices(sink: &RecordingSink) {
    let events = sink.events();
    if events.is_empty() {
        println!("\nNotifications: none dispatched");
        return;
    }
    println!("\nNotifications dispatched");
    for notice in events {
        match notice.waitlist_rank {
            Some(rank) => println!(
                "  - {}: {} at {} [{} #{rank}]",
                notice.recipient,
                notice.role,
                notice.organization,
                notice.status.label()
            ),
            None => println!(
                "  - {}: {} at {} [{}]",
                notice.recipient,
                notice.role,
                notice.organization,
                notice.status.label()
            ),
        }
    }
}

fn demo_roster() -> (Vec<CandidateProfile>, Vec<Opportunity>, Vec<Preference>) {
    let candidates = vec![
        CandidateProfile {
            id: CandidateId("CAND-01".to_string()),
            full_name: "Ananya Sharma".to_string(),
            email: "ananya.sharma@example.in".to_string(),
            qualification: "B.Tech Computer Science".to_string(),
            skills: vec![
                "Python".to_string(),
                "SQL".to_string(),
                "Excel".to_string(),
            ],
            grade_average: Some(8.9),
            secondary_percentage: Some(88.0),
            higher_secondary_percentage: Some(91.0),
            location_preferences: vec![
                "Bengaluru, Karnataka".to_string(),
                "Pune, Maharashtra".to_string(),
            ],
        },
        CandidateProfile {
            id: CandidateId("CAND-02".to_string()),
            full_name: "Rohan Verma".to_string(),
            email: "rohan.verma@example.in".to_string(),
            qualification: "B.Sc Statistics".to_string(),
            skills: vec!["Python".to_string(), "Excel".to_string()],
            grade_average: Some(8.1),
            secondary_percentage: Some(82.0),
            higher_secondary_percentage: Some(79.0),
            location_preferences: vec!["Bengaluru, Karnataka".to_string()],
        },
        CandidateProfile {
            id: CandidateId("CAND-03".to_string()),
            full_name: "Priya Nair".to_string(),
            email: "priya.nair@example.in".to_string(),
            qualification: "B.Com Accounting".to_string(),
            skills: vec!["Tally".to_string(), "Excel".to_string()],
            grade_average: Some(8.4),
            secondary_percentage: Some(85.0),
            higher_secondary_percentage: Some(87.0),
            location_preferences: vec!["Mumbai, Maharashtra".to_string()],
        },
        CandidateProfile {
            id: CandidateId("CAND-04".to_string()),
            full_name: "Arjun Patel".to_string(),
            email: "arjun.patel@example.in".to_string(),
            qualification: "Diploma Mechanical Engineering".to_string(),
            skills: vec!["Excel".to_string()],
            grade_average: Some(7.2),
            secondary_percentage: Some(70.0),
            higher_secondary_percentage: Some(68.0),
            location_preferences: vec!["Pune, Maharashtra".to_string()],
        },
    ];

    let opportunities = vec![
        Opportunity {
            id: OpportunityId("OPP-101".to_string()),
            role: "Data Analyst".to_string(),
            organization: "Finstack Payments".to_string(),
            sector: "Technology".to_string(),
            location: "Bengaluru, Karnataka".to_string(),
            seats: 1,
            required_skills: vec!["Python".to_string(), "SQL".to_string()],
            min_score: 40.0,
            required_education: String::new(),
            stipend: Some("15000 INR".to_string()),
            duration: Some("12 months".to_string()),
        },
        Opportunity {
            id: OpportunityId("OPP-102".to_string()),
            role: "Operations Trainee".to_string(),
            organization: "Bharat Forge Works".to_string(),
            sector: "Manufacturing".to_string(),
            location: "Pune, Maharashtra".to_string(),
            seats: 2,
            required_skills: vec!["Excel".to_string()],
            min_score: 0.0,
            required_education: String::new(),
            stipend: Some("10000 INR".to_string()),
            duration: Some("6 months".to_string()),
        },
        Opportunity {
            id: OpportunityId("OPP-103".to_string()),
            role: "Junior Accountant".to_string(),
            organization: "Meridian Finserv".to_string(),
            sector: "Finance".to_string(),
            location: "Mumbai, Maharashtra".to_string(),
            seats: 1,
            required_skills: vec!["Tally".to_string(), "Excel".to_string()],
            min_score: 50.0,
            required_education: "B.Com".to_string(),
            stipend: Some("12000 INR".to_string()),
            duration: Some("12 months".to_string()),
        },
    ];

    let preferences = vec![
        wish("CAND-01", 1, "Technology", "Data Analyst", "Bengaluru, Karnataka"),
        wish("CAND-01", 2, "Manufacturing", "Operations Trainee", "Pune, Maharashtra"),
        wish("CAND-02", 1, "Technology", "Data Analyst", "Bengaluru, Karnataka"),
        wish("CAND-02", 2, "Manufacturing", "Operations Trainee", "Pune, Maharashtra"),
        wish("CAND-03", 1, "Finance", "Junior Accountant", "Mumbai, Maharashtra"),
        wish("CAND-04", 1, "Manufacturing", "Operations Trainee", "Pune, Maharashtra"),
    ];

    (candidates, opportunities, preferences)
}

fn wish(candidate: &str, rank: u32, sector: &str, role: &str, location: &str) -> Preference {
    Preference {
        candidate: CandidateId(candidate.to_string()),
        rank,
        sector: sector.to_string(),
        role: role.to_string(),
        location: location.to_string(),
        opportunity: None,
    }
}
