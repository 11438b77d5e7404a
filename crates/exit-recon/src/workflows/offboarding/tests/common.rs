use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use crate::workflows::offboarding::adapters::{SystemAdapter, SystemDescriptor};
use crate::workflows::offboarding::delivery::{
    DeliveryError, DeliveryRequest, DeliverySettings, ReportDelivery,
};
use crate::workflows::offboarding::domain::{EmployeeRecord, SystemStatusEntry};
use crate::workflows::offboarding::fanout::FanOut;
use crate::workflows::offboarding::report::ReportAssembler;
use crate::workflows::offboarding::roster::{RosterError, RosterProvider};
use crate::workflows::offboarding::router::exit_router;
use crate::workflows::offboarding::service::ExitStatusService;
use crate::workflows::offboarding::upstream::UpstreamError;

pub(super) fn employee(id: &str, name: &str, email: &str) -> EmployeeRecord {
    EmployeeRecord {
        id: id.to_string(),
        full_name: name.to_string(),
        company_email: email.to_string(),
    }
}

pub(super) fn roster() -> Vec<EmployeeRecord> {
    vec![
        employee("E1", "A", "a@x.com"),
        employee("E2", "B", "b@x.com"),
    ]
}

#[derive(Default)]
pub(super) struct MemoryRoster {
    employees: Vec<EmployeeRecord>,
    fetches: AtomicUsize,
}

impl MemoryRoster {
    pub(super) fn with(employees: Vec<EmployeeRecord>) -> Self {
        Self {
            employees,
            fetches: AtomicUsize::new(0),
        }
    }

    pub(super) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RosterProvider for MemoryRoster {
    async fn fetch(&self) -> Result<Vec<EmployeeRecord>, RosterError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.employees.clone())
    }
}

pub(super) struct UnreachableRoster;

#[async_trait]
impl RosterProvider for UnreachableRoster {
    async fn fetch(&self) -> Result<Vec<EmployeeRecord>, RosterError> {
        Err(RosterError::Upstream(UpstreamError::MissingKey {
            system: "roster".to_string(),
            key: "employee_data".to_string(),
        }))
    }
}

#[derive(Default)]
pub(super) struct MemoryDelivery {
    sent: Mutex<Vec<DeliveryRequest>>,
    attachment_existed: Mutex<Vec<bool>>,
}

impl MemoryDelivery {
    pub(super) fn sent(&self) -> Vec<DeliveryRequest> {
        self.sent.lock().expect("delivery lock").clone()
    }

    pub(super) fn attachment_existed(&self) -> Vec<bool> {
        self.attachment_existed.lock().expect("delivery lock").clone()
    }
}

#[async_trait]
impl ReportDelivery for MemoryDelivery {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError> {
        self.attachment_existed
            .lock()
            .expect("delivery lock")
            .push(request.attachment_path.exists());
        self.sent.lock().expect("delivery lock").push(request.clone());
        Ok(())
    }
}

pub(super) struct OfflineDelivery;

#[async_trait]
impl ReportDelivery for OfflineDelivery {
    async fn send(&self, _request: &DeliveryRequest) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("smtp relay offline".to_string()))
    }
}

/// Adapter answering from a fixed script instead of the network.
#[derive(Debug)]
pub(super) struct ScriptedAdapter {
    descriptor: SystemDescriptor,
    reply: Option<Vec<(String, String)>>,
    delay: Duration,
}

impl ScriptedAdapter {
    pub(super) fn reporting(descriptor: SystemDescriptor, reply: &[(&str, &str)]) -> Self {
        Self {
            descriptor,
            reply: Some(
                reply
                    .iter()
                    .map(|(id, status)| (id.to_string(), status.to_string()))
                    .collect(),
            ),
            delay: Duration::ZERO,
        }
    }

    pub(super) fn failing(descriptor: SystemDescriptor) -> Self {
        Self {
            descriptor,
            reply: None,
            delay: Duration::ZERO,
        }
    }

    pub(super) fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SystemAdapter for ScriptedAdapter {
    fn descriptor(&self) -> &SystemDescriptor {
        &self.descriptor
    }

    async fn fetch_statuses(
        &self,
        roster: &[EmployeeRecord],
    ) -> Result<Vec<SystemStatusEntry>, UpstreamError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.reply.as_ref().ok_or_else(|| UpstreamError::ServerStatus {
            system: self.descriptor.id.to_string(),
            status: 503,
        })?;

        Ok(reply
            .iter()
            .map(|(id, status)| SystemStatusEntry {
                employee_id: id.clone(),
                employee_email: roster
                    .iter()
                    .find(|employee| &employee.id == id)
                    .map(|employee| employee.company_email.clone())
                    .unwrap_or_default(),
                raw_status: status.clone(),
            })
            .collect())
    }
}

pub(super) fn system_a() -> SystemDescriptor {
    SystemDescriptor::batched("system_a", "System A", "http://unused/a", "systemA")
}

pub(super) fn system_b() -> SystemDescriptor {
    SystemDescriptor::batched("system_b", "System B", "http://unused/b", "systemB")
}

pub(super) fn scenario_adapters() -> Vec<Arc<dyn SystemAdapter>> {
    vec![
        Arc::new(ScriptedAdapter::reporting(
            system_a(),
            &[("E1", "deactivated")],
        )),
        Arc::new(ScriptedAdapter::reporting(system_b(), &[])),
    ]
}

pub(super) fn build_service<R, D>(
    roster: Arc<R>,
    adapters: Vec<Arc<dyn SystemAdapter>>,
    delivery: Arc<D>,
    output_dir: &Path,
    settings: DeliverySettings,
) -> ExitStatusService<R, D>
where
    R: RosterProvider + 'static,
    D: ReportDelivery + 'static,
{
    ExitStatusService::new(
        roster,
        FanOut::new(adapters, 4),
        ReportAssembler::new(output_dir),
        delivery,
        settings,
    )
}

pub(super) fn settings() -> DeliverySettings {
    DeliverySettings {
        recipients: ["hr@x.com".to_string()].into_iter().collect(),
        ..DeliverySettings::default()
    }
}

pub(super) fn exit_router_with_service<R, D>(service: ExitStatusService<R, D>) -> Router
where
    R: RosterProvider + 'static,
    D: ReportDelivery + 'static,
{
    exit_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
