use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::descriptor::SystemDescriptor;
use super::SystemAdapter;
use crate::workflows::offboarding::domain::{EmployeeRecord, SystemStatusEntry};
use crate::workflows::offboarding::upstream::{scalar_text, UpstreamClient, UpstreamError};

const EMPLOYEE_DETAILS_KEY: &str = "employeeDetails";
const SYSTEM_RESULT_KEY: &str = "systemResult";
const STATUS_KEY: &str = "status";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeStatusQuery<'a> {
    employee_email_id: &'a str,
    employee_code: &'a str,
    #[serde(rename = "rMEmailId")]
    rm_email_id: &'static str,
}

/// Request body: the bare query list, or the list wrapped under one envelope key.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum BatchedRequest<'a> {
    Flat(Vec<EmployeeStatusQuery<'a>>),
    Enveloped(BTreeMap<&'a str, Vec<EmployeeStatusQuery<'a>>>),
}

/// Adapter that sends the whole roster in one call.
#[derive(Debug)]
pub struct BatchedAdapter {
    descriptor: SystemDescriptor,
    client: UpstreamClient,
    result_key: String,
    envelope: Option<String>,
}

impl BatchedAdapter {
    pub(super) fn new(
        descriptor: SystemDescriptor,
        client: UpstreamClient,
        result_key: String,
        envelope: Option<String>,
    ) -> Self {
        Self {
            descriptor,
            client,
            result_key,
            envelope,
        }
    }

    fn request_body<'a>(&'a self, roster: &'a [EmployeeRecord]) -> BatchedRequest<'a> {
        let queries: Vec<EmployeeStatusQuery<'a>> = roster
            .iter()
            .map(|employee| EmployeeStatusQuery {
                employee_email_id: &employee.company_email,
                employee_code: &employee.id,
                rm_email_id: "",
            })
            .collect();

        match &self.envelope {
            Some(key) => BatchedRequest::Enveloped(BTreeMap::from([(key.as_str(), queries)])),
            None => BatchedRequest::Flat(queries),
        }
    }
}

#[async_trait]
impl SystemAdapter for BatchedAdapter {
    fn descriptor(&self) -> &SystemDescriptor {
        &self.descriptor
    }

    async fn fetch_statuses(
        &self,
        roster: &[EmployeeRecord],
    ) -> Result<Vec<SystemStatusEntry>, UpstreamError> {
        if roster.is_empty() {
            return Ok(Vec::new());
        }

        let system = self.descriptor.id.as_str();
        let body = self.request_body(roster);
        let response = self
            .client
            .post_json(system, &self.descriptor.url, &self.descriptor.headers, &body)
            .await?;

        let entries = extract_statuses(system, &self.result_key, &response)?;
        debug!(system, reported = entries.len(), "system statuses extracted");
        Ok(entries)
    }
}

/// Walk `employeeDetails[].systemResult.<result_key>.status`.
///
/// A missing `employeeDetails` fails the whole call; a missing nested key only skips
/// that employee.
pub(crate) fn extract_statuses(
    system: &str,
    result_key: &str,
    response: &Value,
) -> Result<Vec<SystemStatusEntry>, UpstreamError> {
    let details = response
        .get(EMPLOYEE_DETAILS_KEY)
        .ok_or_else(|| UpstreamError::MissingKey {
            system: system.to_string(),
            key: EMPLOYEE_DETAILS_KEY.to_string(),
        })?
        .as_array()
        .ok_or_else(|| UpstreamError::MalformedKey {
            system: system.to_string(),
            key: EMPLOYEE_DETAILS_KEY.to_string(),
            expected: "list",
        })?;

    let mut entries = Vec::with_capacity(details.len());
    for detail in details {
        let Some(employee_id) = detail.get("employeeCode").and_then(scalar_text) else {
            warn!(system, "skipping employee entry without 'employeeCode'");
            continue;
        };

        let status = detail
            .get(SYSTEM_RESULT_KEY)
            .and_then(|result| result.get(result_key))
            .and_then(|system_result| system_result.get(STATUS_KEY))
            .and_then(scalar_text);

        let Some(raw_status) = status else {
            warn!(
                system,
                employee = %employee_id,
                key = result_key,
                "missing status key for employee, skipping"
            );
            continue;
        };

        let employee_email = detail
            .get("employeeEmailId")
            .and_then(scalar_text)
            .unwrap_or_default();

        entries.push(SystemStatusEntry {
            employee_id,
            employee_email,
            raw_status,
        });
    }

    Ok(entries)
}
