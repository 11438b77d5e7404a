use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::descriptor::SystemDescriptor;
use super::SystemAdapter;
use crate::workflows::offboarding::domain::{EmployeeRecord, SystemStatusEntry};
use crate::workflows::offboarding::normalizer::REQUEST_FAILED_MARKER;
use crate::workflows::offboarding::upstream::{scalar_text, UpstreamClient, UpstreamError};

const RESPONSE_MESSAGE_KEY: &str = "RESPONSE_MESSAGE";

/// Adapter for the deactivation service that only accepts one employee per call.
///
/// A failed call for one employee records [`REQUEST_FAILED_MARKER`] for that employee and
/// the loop carries on; this adapter never fails the whole system.
#[derive(Debug)]
pub struct PerEmployeeAdapter {
    descriptor: SystemDescriptor,
    client: UpstreamClient,
    service_key: String,
}

impl PerEmployeeAdapter {
    pub(super) fn new(
        descriptor: SystemDescriptor,
        client: UpstreamClient,
        service_key: String,
    ) -> Self {
        Self {
            descriptor,
            client,
            service_key,
        }
    }

    fn request_body(&self, employee: &EmployeeRecord) -> Value {
        let mut services = serde_json::Map::new();
        services.insert(
            self.service_key.clone(),
            json!([{
                "X_USER_ID": employee.id,
                "X_LOGIN_ID": employee.company_email,
            }]),
        );

        json!({
            "interfaces": {},
            "services": services,
        })
    }

    async fn query_one(&self, employee: &EmployeeRecord) -> Result<String, UpstreamError> {
        let system = self.descriptor.id.as_str();
        let response = self
            .client
            .post_json(
                system,
                &self.descriptor.url,
                &self.descriptor.headers,
                &self.request_body(employee),
            )
            .await?;

        response_message(&response, &self.service_key).ok_or_else(|| UpstreamError::MissingKey {
            system: system.to_string(),
            key: RESPONSE_MESSAGE_KEY.to_string(),
        })
    }
}

#[async_trait]
impl SystemAdapter for PerEmployeeAdapter {
    fn descriptor(&self) -> &SystemDescriptor {
        &self.descriptor
    }

    async fn fetch_statuses(
        &self,
        roster: &[EmployeeRecord],
    ) -> Result<Vec<SystemStatusEntry>, UpstreamError> {
        let system = self.descriptor.id.as_str();
        let mut entries = Vec::with_capacity(roster.len());

        for employee in roster {
            let raw_status = match self.query_one(employee).await {
                Ok(message) => message,
                Err(err) => {
                    warn!(system, employee = %employee.id, error = %err, "per-employee call failed");
                    REQUEST_FAILED_MARKER.to_string()
                }
            };

            entries.push(SystemStatusEntry {
                employee_id: employee.id.clone(),
                employee_email: employee.company_email.clone(),
                raw_status,
            });
        }

        debug!(system, reported = entries.len(), "per-employee statuses collected");
        Ok(entries)
    }
}

/// `services.<service_key>.records[0].data[0].RESPONSE_MESSAGE`
pub(crate) fn response_message(response: &Value, service_key: &str) -> Option<String> {
    response
        .get("services")?
        .get(service_key)?
        .get("records")?
        .get(0)?
        .get("data")?
        .get(0)?
        .get(RESPONSE_MESSAGE_KEY)
        .and_then(scalar_text)
}
