use crate::cli::ServeArgs;
use crate::infra::{AppState, Fixture, InMemoryAuditSink, InMemoryVerificationRepository};
use crate::routes::with_verification_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use regproc_citizenship::citizenship::CitizenshipVerificationService;
use regproc_citizenship::config::AppConfig;
use regproc_citizenship::error::AppError;
use regproc_citizenship::telemetry;
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

    let fixture = match args.fixtures.take() {
        Some(path) => Fixture::load(&path)?,
        None => Fixture::default(),
    };
    let (store, ledger) = fixture.into_collaborators(config.nin_usage_limit);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let verification_service = Arc::new(CitizenshipVerificationService::new(
        Arc::new(store),
        Arc::new(ledger),
        Arc::new(InMemoryVerificationRepository::default()),
        Arc::new(InMemoryAuditSink::default()),
        config.eligibility.clone(),
    ));

    let app = with_verification_routes(verification_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "citizenship verification stage ready");

    axum::serve(listener, app).await?;
    Ok(())
}
