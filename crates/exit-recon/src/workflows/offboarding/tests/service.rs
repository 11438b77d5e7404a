use super::common::*;
use std::sync::Arc;
use std::time::Duration;

use crate::workflows::offboarding::adapters::{SystemAdapter, SystemDescriptor};
use crate::workflows::offboarding::delivery::{
    DeliveryError, DeliveryRequest, DeliverySettings, ReportDelivery,
};
use crate::workflows::offboarding::domain::{StatusCell, SystemId};
use crate::workflows::offboarding::normalizer::CanonicalStatus;
use crate::workflows::offboarding::resolver::{SingleEmployeeQuery, SystemLookupResult};
use crate::workflows::offboarding::service::{BatchError, BatchOutcome};

#[tokio::test]
async fn consolidate_fills_reported_and_pending_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(
        Arc::new(MemoryRoster::with(vec![employee("E1", "A", "a@x.com")])),
        scenario_adapters(),
        Arc::new(MemoryDelivery::default()),
        dir.path(),
        settings(),
    );

    let consolidated = service
        .consolidate()
        .await
        .expect("consolidated")
        .expect("roster not empty");

    assert_eq!(consolidated.rows.len(), 1);
    let row = &consolidated.rows[0];
    assert_eq!(
        row.status_for(&SystemId::from("system_a")),
        Some(StatusCell::Reported(CanonicalStatus::Deactivated))
    );
    assert_eq!(
        row.status_for(&SystemId::from("system_b")),
        Some(StatusCell::Pending)
    );
    assert!(consolidated.failed_systems.is_empty());
}

#[tokio::test]
async fn batch_writes_report_delivers_and_removes_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delivery = Arc::new(MemoryDelivery::default());
    let service = build_service(
        Arc::new(MemoryRoster::with(roster())),
        scenario_adapters(),
        delivery.clone(),
        dir.path(),
        settings(),
    );

    let outcome = service.run_batch().await.expect("batch succeeds");
    let BatchOutcome::Delivered(summary) = outcome else {
        panic!("expected a delivered report");
    };

    assert_eq!(summary.employees, 2);
    assert!(summary.delivered);
    assert!(!summary.artifact_retained);
    assert!(!summary.report_path.exists());

    let sent = delivery.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Employee Exit Report");
    assert!(sent[0].recipients.contains("hr@x.com"));
    assert_eq!(sent[0].attachment_path, summary.report_path);
    assert_eq!(delivery.attachment_existed(), vec![true]);
}

#[tokio::test]
async fn batch_keeps_artifact_when_configured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(
        Arc::new(MemoryRoster::with(roster())),
        scenario_adapters(),
        Arc::new(MemoryDelivery::default()),
        dir.path(),
        DeliverySettings {
            keep_artifact: true,
            ..settings()
        },
    );

    let BatchOutcome::Delivered(summary) = service.run_batch().await.expect("batch succeeds") else {
        panic!("expected a delivered report");
    };

    assert!(summary.artifact_retained);
    let contents = std::fs::read_to_string(&summary.report_path).expect("artifact readable");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "ID,Name,Email,System A,System B",
            "E1,A,a@x.com,Employee is deactivated,Pending",
            "E2,B,b@x.com,Pending,Pending",
        ]
    );
}

#[tokio::test]
async fn empty_roster_produces_no_report_and_no_delivery() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delivery = Arc::new(MemoryDelivery::default());
    let service = build_service(
        Arc::new(MemoryRoster::with(Vec::new())),
        scenario_adapters(),
        delivery.clone(),
        dir.path(),
        settings(),
    );

    let outcome = service.run_batch().await.expect("empty roster is not an error");

    assert!(matches!(outcome, BatchOutcome::NothingToDo));
    assert!(delivery.sent().is_empty());
    let written = std::fs::read_dir(dir.path()).expect("dir listing").count();
    assert_eq!(written, 0);
}

#[tokio::test]
async fn failed_system_renders_unavailable_and_is_summarized() {
    let dir = tempfile::tempdir().expect("tempdir");
    let adapters: Vec<Arc<dyn SystemAdapter>> = vec![
        Arc::new(ScriptedAdapter::reporting(system_a(), &[("E1", "NA")])),
        Arc::new(ScriptedAdapter::failing(SystemDescriptor::batched(
            "dms",
            "Document Management",
            "http://unused/dms",
            "dms",
        ))),
    ];
    let service = build_service(
        Arc::new(MemoryRoster::with(roster())),
        adapters,
        Arc::new(MemoryDelivery::default()),
        dir.path(),
        settings(),
    );

    let consolidated = service
        .consolidate()
        .await
        .expect("batch survives a failed system")
        .expect("roster not empty");

    for row in &consolidated.rows {
        assert_eq!(
            row.status_for(&SystemId::from("dms")),
            Some(StatusCell::Unavailable)
        );
    }
    assert_eq!(
        consolidated.rows[0].status_for(&SystemId::from("system_a")),
        Some(StatusCell::Reported(CanonicalStatus::NotAvailable))
    );
    assert_eq!(consolidated.failed_systems.len(), 1);
    assert_eq!(consolidated.failed_systems[0].system, SystemId::from("dms"));
    assert!(consolidated.failed_systems[0].reason.contains("503"));
}

#[tokio::test]
async fn roster_failure_aborts_the_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delivery = Arc::new(MemoryDelivery::default());
    let service = build_service(
        Arc::new(UnreachableRoster),
        scenario_adapters(),
        delivery.clone(),
        dir.path(),
        settings(),
    );

    let error = service.run_batch().await.expect_err("roster failure");
    assert!(matches!(error, BatchError::Roster(_)));
    assert!(error.to_string().contains("employee_data"));
    assert!(delivery.sent().is_empty());
}

#[tokio::test]
async fn delivery_failure_leaves_artifact_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = build_service(
        Arc::new(MemoryRoster::with(roster())),
        scenario_adapters(),
        Arc::new(OfflineDelivery),
        dir.path(),
        settings(),
    );

    let error = service.run_batch().await.expect_err("delivery failure");
    assert!(matches!(error, BatchError::Delivery(_)));
    let written = std::fs::read_dir(dir.path()).expect("dir listing").count();
    assert_eq!(written, 1);
}

#[tokio::test]
async fn batch_without_recipients_keeps_artifact_and_skips_delivery() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delivery = Arc::new(MemoryDelivery::default());
    let service = build_service(
        Arc::new(MemoryRoster::with(roster())),
        scenario_adapters(),
        delivery.clone(),
        dir.path(),
        DeliverySettings::default(),
    );

    let BatchOutcome::Delivered(summary) = service.run_batch().await.expect("batch succeeds") else {
        panic!("expected a report");
    };

    assert!(!summary.delivered);
    assert!(summary.artifact_retained);
    assert!(summary.report_path.exists());
    assert!(delivery.sent().is_empty());
}

struct SlowDelivery {
    sent: std::sync::Mutex<Vec<DeliveryRequest>>,
}

#[async_trait::async_trait]
impl ReportDelivery for SlowDelivery {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(request.attachment_path.exists(), "artifact present while sending");
        self.sent.lock().expect("delivery lock").push(request.clone());
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn batch_awaits_async_delivery_before_removing_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let delivery = Arc::new(SlowDelivery {
        sent: std::sync::Mutex::new(Vec::new()),
    });
    let service = build_service(
        Arc::new(MemoryRoster::with(roster())),
        scenario_adapters(),
        delivery.clone(),
        dir.path(),
        settings(),
    );

    let BatchOutcome::Delivered(summary) = service.run_batch().await.expect("batch succeeds") else {
        panic!("expected a delivered report");
    };

    assert!(summary.delivered);
    assert!(!summary.report_path.exists());
    assert_eq!(delivery.sent.lock().expect("delivery lock").len(), 1);
}

#[tokio::test]
async fn overlapping_batches_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let adapters: Vec<Arc<dyn SystemAdapter>> = vec![Arc::new(
        ScriptedAdapter::reporting(system_a(), &[("E1", "NA")]).slow(Duration::from_millis(200)),
    )];
    let service = Arc::new(build_service(
        Arc::new(MemoryRoster::with(roster())),
        adapters,
        Arc::new(MemoryDelivery::default()),
        dir.path(),
        settings(),
    ));

    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.run_batch().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = service.run_batch().await;
    assert!(matches!(second, Err(BatchError::AlreadyRunning)));

    let first = first.await.expect("task joins");
    assert!(matches!(first, Ok(BatchOutcome::Delivered(_))));

    let third = service.run_batch().await;
    assert!(third.is_ok(), "guard released after the first batch");
}

#[tokio::test]
async fn lookup_reports_not_found_for_every_system_when_employee_is_absent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let roster = Arc::new(MemoryRoster::with(roster()));
    let service = build_service(
        roster.clone(),
        scenario_adapters(),
        Arc::new(MemoryDelivery::default()),
        dir.path(),
        settings(),
    );

    let view = service
        .lookup(&SingleEmployeeQuery::new("E404", "ghost@x.com"))
        .await
        .expect("lookup succeeds");

    assert_eq!(roster.fetches(), 1);
    assert_eq!(
        view.result_for("system_a"),
        Some(&SystemLookupResult::not_found())
    );
    assert_eq!(
        view.result_for("system_b"),
        Some(&SystemLookupResult::not_found())
    );
}

#[tokio::test]
async fn lookup_rejects_blank_employee_code_before_fetching() {
    let dir = tempfile::tempdir().expect("tempdir");
    let roster = Arc::new(MemoryRoster::with(roster()));
    let service = build_service(
        roster.clone(),
        scenario_adapters(),
        Arc::new(MemoryDelivery::default()),
        dir.path(),
        settings(),
    );

    let error = service
        .lookup(&SingleEmployeeQuery::new("", "a@x.com"))
        .await
        .expect_err("blank code");

    assert!(matches!(error, BatchError::Validation(_)));
    assert_eq!(roster.fetches(), 0);
}
