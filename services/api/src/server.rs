use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryNotificationLog};
use crate::routes::with_league_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use umpcast::config::AppConfig;
use umpcast::error::AppError;
use umpcast::league::LeagueServices;
use umpcast::telemetry;

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
    let notifications = Arc::new(InMemoryNotificationLog::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        notifications: notifications.clone(),
    };

    let services = LeagueServices::in_memory(&config.ordering, notifications);

    let app = with_league_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        lock_timeout_ms = config.ordering.scope_lock_timeout_ms,
        "umpcast service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
