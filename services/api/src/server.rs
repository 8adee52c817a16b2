use crate::cli::ServeArgs;
use crate::infra::{AppState, LoggingSink};
use crate::routes::with_placement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use internmatch::config::AppConfig;
use internmatch::error::AppError;
use internmatch::placement::{MemoryLedger, MemoryPreferences, MemoryRoster, PlacementService};
use internmatch::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = Arc::new(MemoryLedger::default());
    let preferences = Arc::new(MemoryPreferences::default());
    let roster = Arc::new(MemoryRoster::default());
    let sink = Arc::new(LoggingSink);
    let placement_service = Arc::new(PlacementService::new(
        ledger,
        preferences,
        roster,
        sink,
        config.allocation,
    ));

    let app = with_placement_routes(placement_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "internship seat allocator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
