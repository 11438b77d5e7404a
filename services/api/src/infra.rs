use exit_recon::config::AppConfig;
use exit_recon::error::AppError;
use exit_recon::workflows::offboarding::{
    adapter_for, DeliveryError, DeliveryRequest, ExitStatusService, FanOut, HttpRosterProvider,
    ReportAssembler, ReportDelivery, UpstreamClient,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type ExitService = ExitStatusService<HttpRosterProvider, LoggingReportDelivery>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Delivery collaborator that records the hand-off in the log instead of sending mail.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoggingReportDelivery;

#[async_trait::async_trait]
impl ReportDelivery for LoggingReportDelivery {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        if request.recipients.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }

        let recipients: Vec<&str> = request.recipients.iter().map(String::as_str).collect();
        info!(
            recipients = %recipients.join(","),
            subject = %request.subject,
            attachment = %request.attachment_path.display(),
            "employee exit report handed to delivery"
        );
        Ok(())
    }
}

/// Wire the roster provider, one adapter per catalog entry, and the report pipeline.
pub(crate) fn build_exit_service(config: &AppConfig) -> Result<ExitService, AppError> {
    let roster_source = config.roster_source()?.clone();
    let client = UpstreamClient::new(config.batch.upstream_timeout)?;

    if config.systems.is_empty() {
        warn!("no downstream systems configured; reports will only list the roster");
    }

    let adapters = config
        .systems
        .iter()
        .cloned()
        .map(|descriptor| adapter_for(descriptor, client.clone()))
        .collect();

    Ok(ExitStatusService::new(
        Arc::new(HttpRosterProvider::new(roster_source, client)),
        FanOut::new(adapters, config.batch.max_concurrency),
        ReportAssembler::new(config.report.output_dir.clone()),
        Arc::new(LoggingReportDelivery),
        config.report.delivery.clone(),
    ))
}
