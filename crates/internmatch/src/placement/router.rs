use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CandidateId, OpportunityId};
use super::ledger::{AllocationLedger, PreferenceLedger};
use super::notify::NotificationSink;
use super::reallocation::ReallocationScope;
use super::roster::{RosterImportError, RosterImporter, RosterStore};
use super::service::{PlacementError, PlacementService};

/// Router builder exposing HTTP endpoints for allocation, offer
/// responses, roster import, and reporting.
pub fn placement_router<L, P, R, N>(service: Arc<PlacementService<L, P, R, N>>) -> Router
where
    L: AllocationLedger + 'static,
    P: PreferenceLedger + 'static,
    R: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/api/v1/allocation/run", post(run_handler::<L, P, R, N>))
        .route(
            "/api/v1/allocation/reallocate",
            post(reallocate_handler::<L, P, R, N>),
        )
        .route(
            "/api/v1/allocation/summary",
            get(summary_handler::<L, P, R, N>),
        )
        .route("/api/v1/respond", get(respond_handler::<L, P, R, N>))
        .route("/api/v1/roster/import", post(import_handler::<L, P, R, N>))
        .route(
            "/api/v1/candidates/:candidate_id/allocations",
            get(candidate_allocations_handler::<L, P, R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReallocateBody {
    #[serde(default)]
    opportunity_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespondQuery {
    candidate_id: String,
    opportunity_id: String,
    decision: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RosterImportBody {
    #[serde(default)]
    candidates_csv: Option<String>,
    #[serde(default)]
    opportunities_csv: Option<String>,
    #[serde(default)]
    preferences_csv: Option<String>,
}

pub(crate) async fn run_handler<L, P, R, N>(
    State(service): State<Arc<PlacementService<L, P, R, N>>>,
) -> Response
where
    L: AllocationLedger + 'static,
    P: PreferenceLedger + 'static,
    R: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.run_allocation() {
        Ok(tally) => (StatusCode::OK, axum::Json(tally)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn reallocate_handler<L, P, R, N>(
    State(service): State<Arc<PlacementService<L, P, R, N>>>,
    body: Option<axum::Json<ReallocateBody>>,
) -> Response
where
    L: AllocationLedger + 'static,
    P: PreferenceLedger + 'static,
    R: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let scope = body
        .and_then(|axum::Json(body)| body.opportunity_id)
        .map(|id| ReallocationScope::Opportunity(OpportunityId(id)))
        .unwrap_or(ReallocationScope::Global);

    match service.reallocate(scope) {
        Ok(tally) => (StatusCode::OK, axum::Json(tally)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn summary_handler<L, P, R, N>(
    State(service): State<Arc<PlacementService<L, P, R, N>>>,
) -> Response
where
    L: AllocationLedger + 'static,
    P: PreferenceLedger + 'static,
    R: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    match service.seat_summaries() {
        Ok(board) => (StatusCode::OK, axum::Json(board)).into_response(),
        Err(error) => error_response(&error),
    }
}

/// Offer response link target. Human-facing, so both arms render HTML.
pub(crate) async fn respond_handler<L, P, R, N>(
    State(service): State<Arc<PlacementService<L, P, R, N>>>,
    Query(query): Query<RespondQuery>,
) -> Response
where
    L: AllocationLedger + 'static,
    P: PreferenceLedger + 'static,
    R: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let candidate = CandidateId(query.candidate_id);
    let opportunity = OpportunityId(query.opportunity_id);
    match service.respond(&candidate, &opportunity, &query.decision) {
        Ok(receipt) => {
            let page = format!(
                "<!DOCTYPE html><html><head><title>Offer response</title></head>\
                 <body><h2>Thank you!</h2><p>{}</p></body></html>",
                receipt.confirmation
            );
            (StatusCode::OK, Html(page)).into_response()
        }
        Err(error) => {
            let page = format!(
                "<!DOCTYPE html><html><head><title>Offer response</title></head>\
                 <body><h2>Something went wrong</h2><p>{}</p></body></html>",
                error
            );
            (error.status_code(), Html(page)).into_response()
        }
    }
}

pub(crate) async fn import_handler<L, P, R, N>(
    State(service): State<Arc<PlacementService<L, P, R, N>>>,
    axum::Json(body): axum::Json<RosterImportBody>,
) -> Response
where
    L: AllocationLedger + 'static,
    P: PreferenceLedger + 'static,
    R: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let parsed = (|| -> Result<_, RosterImportError> {
        let candidates = parse_csv(body.candidates_csv.as_deref(), |bytes| {
            RosterImporter::candidates_from_reader(bytes)
        })?;
        let opportunities = parse_csv(body.opportunities_csv.as_deref(), |bytes| {
            RosterImporter::opportunities_from_reader(bytes)
        })?;
        let preferences = parse_csv(body.preferences_csv.as_deref(), |bytes| {
            RosterImporter::preferences_from_reader(bytes)
        })?;
        Ok((candidates, opportunities, preferences))
    })();

    let (candidates, opportunities, preferences) = match parsed {
        Ok(rows) => rows,
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    match service.import_roster(candidates, opportunities, preferences) {
        Ok(tally) => (StatusCode::OK, axum::Json(tally)).into_response(),
        Err(error) => error_response(&error),
    }
}

pub(crate) async fn candidate_allocations_handler<L, P, R, N>(
    State(service): State<Arc<PlacementService<L, P, R, N>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    L: AllocationLedger + 'static,
    P: PreferenceLedger + 'static,
    R: RosterStore + 'static,
    N: NotificationSink + 'static,
{
    let candidate = CandidateId(candidate_id);
    match service.candidate_allocations(&candidate) {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => error_response(&error),
    }
}

fn error_response(error: &PlacementError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error.status_code(), axum::Json(payload)).into_response()
}

fn parse_csv<T>(
    payload: Option<&str>,
    parse: impl FnOnce(&[u8]) -> Result<Vec<T>, RosterImportError>,
) -> Result<Vec<T>, RosterImportError> {
    match payload {
        Some(csv) => parse(csv.as_bytes()),
        None => Ok(Vec::new()),
    }
}
