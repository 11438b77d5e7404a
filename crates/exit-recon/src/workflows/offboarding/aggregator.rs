use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use super::domain::{
    EmployeeRecord, ReportRow, StatusCell, SystemId, SystemStatusCell, SystemStatusEntry,
};
use super::fanout::SystemRun;
use super::normalizer::{normalize, CanonicalStatus, StatusDomain};

/// Employee id -> canonical status for one system.
///
/// On duplicate ids the first entry wins. Employees the system did not report are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusIndex {
    statuses: HashMap<String, CanonicalStatus>,
}

impl StatusIndex {
    pub fn build(domain: StatusDomain, entries: &[SystemStatusEntry]) -> Self {
        let mut statuses = HashMap::with_capacity(entries.len());
        for entry in entries {
            match statuses.entry(entry.employee_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(normalize(domain, &entry.raw_status));
                }
                Entry::Occupied(_) => {
                    debug!(employee = %entry.employee_id, "duplicate status entry ignored");
                }
            }
        }
        Self { statuses }
    }

    pub fn get(&self, employee_id: &str) -> Option<CanonicalStatus> {
        self.statuses.get(employee_id).copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    Reported(StatusIndex),
    /// The system failed; every row shows it as unavailable.
    Unavailable,
}

/// One report column: a system and what it told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemColumn {
    pub system: SystemId,
    pub label: String,
    pub source: ColumnSource,
}

impl SystemColumn {
    pub fn from_run(run: &SystemRun) -> Self {
        let source = match &run.result {
            Ok(entries) => ColumnSource::Reported(StatusIndex::build(
                run.descriptor.status_domain,
                entries,
            )),
            Err(_) => ColumnSource::Unavailable,
        };

        Self {
            system: run.descriptor.id.clone(),
            label: run.descriptor.label.clone(),
            source,
        }
    }

    fn cell_for(&self, employee_id: &str) -> StatusCell {
        match &self.source {
            ColumnSource::Reported(index) => index
                .get(employee_id)
                .map(StatusCell::Reported)
                .unwrap_or(StatusCell::Pending),
            ColumnSource::Unavailable => StatusCell::Unavailable,
        }
    }
}

/// One row per roster employee, in roster order; index misses become `Pending`.
pub fn join_rows(roster: &[EmployeeRecord], columns: &[SystemColumn]) -> Vec<ReportRow> {
    roster
        .iter()
        .map(|employee| ReportRow {
            employee_id: employee.id.clone(),
            full_name: employee.full_name.clone(),
            email: employee.company_email.clone(),
            status_by_system: columns
                .iter()
                .map(|column| SystemStatusCell {
                    system: column.system.clone(),
                    status: column.cell_for(&employee.id),
                })
                .collect(),
        })
        .collect()
}
