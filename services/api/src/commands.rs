use crate::infra::build_exit_service;
use clap::Args;
use exit_recon::config::AppConfig;
use exit_recon::error::AppError;
use exit_recon::telemetry;
use exit_recon::workflows::offboarding::{BatchOutcome, BatchSummary, SingleEmployeeQuery};

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Employee code as known to the HR roster
    #[arg(long)]
    pub(crate) employee_code: String,
    /// Company e-mail address echoed back in the result
    #[arg(long, default_value = "")]
    pub(crate) email: String,
}

pub(crate) async fn run_report() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = build_exit_service(&config)?;

    match service.run_batch().await? {
        BatchOutcome::NothingToDo => println!("No exiting employees found"),
        BatchOutcome::Delivered(summary) => render_summary(&summary),
    }
    Ok(())
}

pub(crate) async fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = build_exit_service(&config)?;

    let query = SingleEmployeeQuery::new(args.employee_code, args.email);
    let view = service.lookup(&query).await?;
    let rendered = serde_json::to_string_pretty(&view)
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    println!("{rendered}");
    Ok(())
}

fn render_summary(summary: &BatchSummary) {
    println!("Employee exit report");
    println!(
        "  Generated: {}",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Employees: {}", summary.employees);
    if !summary.delivered {
        println!("  Delivery skipped: no recipients configured");
    }
    if summary.artifact_retained {
        println!("  Artifact: {}", summary.report_path.display());
    }
    if summary.failed_systems.is_empty() {
        println!("  All systems responded");
    } else {
        println!("  Unavailable systems:");
        for failure in &summary.failed_systems {
            println!("    {} ({}): {}", failure.label, failure.system, failure.reason);
        }
    }
}
