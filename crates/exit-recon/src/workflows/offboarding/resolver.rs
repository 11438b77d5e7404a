use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::domain::{EmployeeRecord, ValidationError};
use super::fanout::{FanOut, SystemRun};
use super::normalizer::normalize;

/// On-demand status check for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEmployeeQuery {
    #[serde(default)]
    pub employee_code: String,
    #[serde(default)]
    pub employee_email_id: String,
}

impl SingleEmployeeQuery {
    pub fn new(employee_code: impl Into<String>, employee_email_id: impl Into<String>) -> Self {
        Self {
            employee_code: employee_code.into(),
            employee_email_id: employee_email_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.employee_code.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "employeeCode",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemLookupResult {
    pub code: String,
    pub status: String,
}

impl SystemLookupResult {
    fn found(status: &str) -> Self {
        Self {
            code: "200".to_string(),
            status: status.to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            code: "404".to_string(),
            status: "NA".to_string(),
        }
    }

    fn unavailable() -> Self {
        Self {
            code: "502".to_string(),
            status: "Unavailable".to_string(),
        }
    }
}

/// Per-system results keyed by system id, serialized as a JSON object in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemResults(Vec<(String, SystemLookupResult)>);

impl SystemResults {
    pub fn get(&self, system: &str) -> Option<&SystemLookupResult> {
        self.0
            .iter()
            .find(|(id, _)| id == system)
            .map(|(_, result)| result)
    }

    pub fn system_ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(id, _)| id.as_str())
    }
}

impl FromIterator<(String, SystemLookupResult)> for SystemResults {
    fn from_iter<I: IntoIterator<Item = (String, SystemLookupResult)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for SystemResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, result) in &self.0 {
            map.serialize_entry(id, result)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEmployeeDetail {
    pub employee_email_id: String,
    pub employee_code: String,
    pub system_result: SystemResults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleEmployeeView {
    pub employee_details: Vec<SingleEmployeeDetail>,
}

impl SingleEmployeeView {
    pub fn result_for(&self, system: &str) -> Option<&SystemLookupResult> {
        self.employee_details
            .first()
            .and_then(|detail| detail.system_result.get(system))
    }
}

/// Query every system with the full roster and keep only the requested employee.
///
/// Every configured system appears in the result; systems that did not mention the
/// employee report `{code: "404", status: "NA"}`.
pub async fn resolve_employee(
    fanout: &FanOut,
    roster: Arc<[EmployeeRecord]>,
    query: &SingleEmployeeQuery,
) -> SingleEmployeeView {
    if roster.is_empty() {
        let system_result = fanout
            .descriptors()
            .map(|descriptor| (descriptor.id.to_string(), SystemLookupResult::not_found()))
            .collect();
        return view(query, system_result);
    }

    let runs = fanout.collect(roster).await;
    project_employee(&runs, query)
}

pub(crate) fn project_employee(runs: &[SystemRun], query: &SingleEmployeeQuery) -> SingleEmployeeView {
    let employee_code = query.employee_code.trim();
    let system_result = runs
        .iter()
        .map(|run| {
            let result = match &run.result {
                Ok(entries) => entries
                    .iter()
                    .find(|entry| entry.employee_id == employee_code)
                    .map(|entry| {
                        SystemLookupResult::found(
                            normalize(run.descriptor.status_domain, &entry.raw_status).label(),
                        )
                    })
                    .unwrap_or_else(SystemLookupResult::not_found),
                Err(_) => SystemLookupResult::unavailable(),
            };
            (run.descriptor.id.to_string(), result)
        })
        .collect();

    view(query, system_result)
}

fn view(
    query: &SingleEmployeeQuery,
    system_result: SystemResults,
) -> SingleEmployeeView {
    SingleEmployeeView {
        employee_details: vec![SingleEmployeeDetail {
            employee_email_id: query.employee_email_id.clone(),
            employee_code: query.employee_code.clone(),
            system_result,
        }],
    }
}
