use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::domain::{EmployeeRecord, ValidationError};
use super::upstream::{scalar_text, UpstreamClient, UpstreamError};

const ROSTER_SYSTEM: &str = "roster";
const EMPLOYEE_DATA_KEY: &str = "employee_data";

/// Source of the exiting-employee roster for one batch.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// An empty roster is a normal outcome, not an error.
    async fn fetch(&self) -> Result<Vec<EmployeeRecord>, RosterError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RosterError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Connection details for the HR roster endpoint.
#[derive(Debug, Clone)]
pub struct RosterSource {
    pub url: String,
    pub api_key: String,
    pub dataset_key: String,
    pub auth_header: Option<String>,
    pub last_modified: String,
}

#[derive(Debug, Serialize)]
struct RosterRequest<'a> {
    api_key: &'a str,
    #[serde(rename = "datasetKey")]
    dataset_key: &'a str,
    last_modified: &'a str,
}

/// Roster provider backed by the HR system's dataset endpoint.
#[derive(Debug, Clone)]
pub struct HttpRosterProvider {
    source: RosterSource,
    client: UpstreamClient,
}

impl HttpRosterProvider {
    pub fn new(source: RosterSource, client: UpstreamClient) -> Self {
        Self { source, client }
    }

    fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(auth) = &self.source.auth_header {
            headers.insert("Authorization".to_string(), auth.clone());
        }
        headers
    }
}

#[async_trait]
impl RosterProvider for HttpRosterProvider {
    async fn fetch(&self) -> Result<Vec<EmployeeRecord>, RosterError> {
        let request = RosterRequest {
            api_key: &self.source.api_key,
            dataset_key: &self.source.dataset_key,
            last_modified: &self.source.last_modified,
        };

        let response = self
            .client
            .post_json(ROSTER_SYSTEM, &self.source.url, &self.headers(), &request)
            .await?;

        let roster = parse_roster(&response)?;
        info!(employees = roster.len(), "fetched exiting employee roster");
        Ok(roster)
    }
}

/// Decode the roster payload `{employee_data: [...]}`.
pub(crate) fn parse_roster(response: &Value) -> Result<Vec<EmployeeRecord>, RosterError> {
    let entries = response
        .get(EMPLOYEE_DATA_KEY)
        .ok_or_else(|| UpstreamError::MissingKey {
            system: ROSTER_SYSTEM.to_string(),
            key: EMPLOYEE_DATA_KEY.to_string(),
        })?
        .as_array()
        .ok_or_else(|| UpstreamError::MalformedKey {
            system: ROSTER_SYSTEM.to_string(),
            key: EMPLOYEE_DATA_KEY.to_string(),
            expected: "list",
        })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_employee(index, entry))
        .collect()
}

fn parse_employee(index: usize, entry: &Value) -> Result<EmployeeRecord, RosterError> {
    let text = |key: &str| {
        entry
            .get(key)
            .and_then(scalar_text)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let id = text("employee_id").ok_or(ValidationError::RosterField {
        index,
        field: "employee_id",
    })?;
    let company_email = text("company_email_id").ok_or(ValidationError::RosterField {
        index,
        field: "company_email_id",
    })?;
    let full_name = text("full_name").unwrap_or_else(|| "Unknown".to_string());

    Ok(EmployeeRecord {
        id,
        full_name,
        company_email,
    })
}
