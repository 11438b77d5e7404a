use crate::cli::ServeArgs;
use crate::infra::{build_exit_service, AppState};
use crate::routes::with_exit_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use exit_recon::config::AppConfig;
use exit_recon::error::AppError;
use exit_recon::telemetry;
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

    let exit_service = Arc::new(build_exit_service(&config)?);
    let systems = exit_service.fanout().len();

    let app = with_exit_routes(exit_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, systems, "employee exit reconciliation ready");

    axum::serve(listener, app).await?;
    Ok(())
}
