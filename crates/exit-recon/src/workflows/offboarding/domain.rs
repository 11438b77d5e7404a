use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::normalizer::CanonicalStatus;

/// Identifier of one downstream system as declared in the system catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub String);

impl SystemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SystemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One exiting employee as reported by the roster source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeRecord {
    pub id: String,
    pub full_name: String,
    pub company_email: String,
}

/// Raw status one system reported for one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatusEntry {
    pub employee_id: String,
    pub employee_email: String,
    pub raw_status: String,
}

/// Value shown in one report cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCell {
    Reported(CanonicalStatus),
    /// The system answered but said nothing about this employee.
    Pending,
    /// The system call failed for the whole batch.
    Unavailable,
}

impl StatusCell {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reported(status) => status.label(),
            Self::Pending => "Pending",
            Self::Unavailable => "Unavailable",
        }
    }
}

impl Serialize for StatusCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatusCell {
    pub system: SystemId,
    pub status: StatusCell,
}

/// Consolidated row for one roster employee. Cells follow catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub employee_id: String,
    pub full_name: String,
    pub email: String,
    pub status_by_system: Vec<SystemStatusCell>,
}

impl ReportRow {
    pub fn status_for(&self, system: &SystemId) -> Option<StatusCell> {
        self.status_by_system
            .iter()
            .find(|cell| &cell.system == system)
            .map(|cell| cell.status)
    }
}

/// Input that cannot be processed because a required field is absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("roster entry {index} is missing required field '{field}'")]
    RosterField { index: usize, field: &'static str },
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },
}
