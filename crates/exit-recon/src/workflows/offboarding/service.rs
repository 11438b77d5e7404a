use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::aggregator::{join_rows, SystemColumn};
use super::delivery::{DeliveryError, DeliverySettings, ReportDelivery};
use super::domain::{EmployeeRecord, ReportRow, SystemId, ValidationError};
use super::fanout::{FanOut, SystemRun};
use super::report::{ReportAssembler, ReportError};
use super::resolver::{resolve_employee, SingleEmployeeQuery, SingleEmployeeView};
use super::roster::{RosterError, RosterProvider};

/// Facade composing the roster source, system fan-out, report assembler, and delivery hook.
pub struct ExitStatusService<R, D> {
    roster: Arc<R>,
    fanout: FanOut,
    assembler: ReportAssembler,
    delivery: Arc<D>,
    settings: DeliverySettings,
    batch_gate: Mutex<()>,
}

/// System that could not be queried during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSystem {
    pub system: SystemId,
    pub label: String,
    pub reason: String,
}

/// Rows plus the columns they were built from, before any artifact is written.
#[derive(Debug, Clone)]
pub struct ConsolidatedRows {
    pub columns: Vec<SystemColumn>,
    pub rows: Vec<ReportRow>,
    pub failed_systems: Vec<FailedSystem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub employees: usize,
    pub report_path: PathBuf,
    /// False when no recipients are configured; the artifact is then kept on disk.
    pub delivered: bool,
    pub artifact_retained: bool,
    pub failed_systems: Vec<FailedSystem>,
    pub generated_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// The roster was empty; no report was produced or delivered.
    NothingToDo,
    Delivered(BatchSummary),
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("an employee exit batch is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl<R, D> ExitStatusService<R, D>
where
    R: RosterProvider + 'static,
    D: ReportDelivery + 'static,
{
    pub fn new(
        roster: Arc<R>,
        fanout: FanOut,
        assembler: ReportAssembler,
        delivery: Arc<D>,
        settings: DeliverySettings,
    ) -> Self {
        Self {
            roster,
            fanout,
            assembler,
            delivery,
            settings,
            batch_gate: Mutex::new(()),
        }
    }

    pub fn fanout(&self) -> &FanOut {
        &self.fanout
    }

    /// Run one full reconciliation pass: roster, fan-out, join, artifact, delivery.
    ///
    /// At most one batch runs at a time; an overlapping call fails with
    /// [`BatchError::AlreadyRunning`].
    pub async fn run_batch(&self) -> Result<BatchOutcome, BatchError> {
        let _running = self
            .batch_gate
            .try_lock()
            .map_err(|_| BatchError::AlreadyRunning)?;

        info!(systems = self.fanout.len(), "starting employee exit batch");

        let Some(consolidated) = self.consolidate().await? else {
            warn!("no exiting employees found, skipping report");
            return Ok(BatchOutcome::NothingToDo);
        };

        let generated_at = Local::now();
        let report_path =
            self.assembler
                .write(&consolidated.columns, &consolidated.rows, generated_at)?;

        let delivered = if self.settings.recipients.is_empty() {
            warn!(path = %report_path.display(), "no report recipients configured, skipping delivery");
            false
        } else {
            self.delivery
                .send(&self.settings.request_for(report_path.clone()))
                .await?;
            true
        };

        let artifact_retained =
            !delivered || self.settings.keep_artifact || !remove_artifact(&report_path);

        let summary = BatchSummary {
            employees: consolidated.rows.len(),
            report_path,
            delivered,
            artifact_retained,
            failed_systems: consolidated.failed_systems,
            generated_at,
        };

        info!(
            employees = summary.employees,
            delivered = summary.delivered,
            failed_systems = summary.failed_systems.len(),
            "employee exit batch completed"
        );
        Ok(BatchOutcome::Delivered(summary))
    }

    /// Fetch the roster and build report rows without writing or delivering anything.
    /// Returns `None` when the roster is empty.
    pub async fn consolidate(&self) -> Result<Option<ConsolidatedRows>, BatchError> {
        let roster = self.roster.fetch().await?;
        if roster.is_empty() {
            return Ok(None);
        }

        let roster: Arc<[EmployeeRecord]> = Arc::from(roster);
        let runs = self.fanout.collect(Arc::clone(&roster)).await;
        let columns: Vec<SystemColumn> = runs.iter().map(SystemColumn::from_run).collect();
        let rows = join_rows(&roster, &columns);

        Ok(Some(ConsolidatedRows {
            columns,
            rows,
            failed_systems: failed_systems(&runs),
        }))
    }

    /// Status of one employee across every configured system.
    pub async fn lookup(
        &self,
        query: &SingleEmployeeQuery,
    ) -> Result<SingleEmployeeView, BatchError> {
        query.validate()?;
        let roster = self.roster.fetch().await?;
        Ok(resolve_employee(&self.fanout, Arc::from(roster), query).await)
    }
}

fn failed_systems(runs: &[SystemRun]) -> Vec<FailedSystem> {
    runs.iter()
        .filter_map(|run| {
            run.failure().map(|err| FailedSystem {
                system: run.descriptor.id.clone(),
                label: run.descriptor.label.clone(),
                reason: err.to_string(),
            })
        })
        .collect()
}

fn remove_artifact(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not remove delivered report");
            false
        }
    }
}
