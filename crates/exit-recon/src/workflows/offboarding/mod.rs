//! Employee offboarding reconciliation: pull the exiting-employee roster, ask every
//! downstream system whether each employee was deprovisioned, and consolidate the answers
//! into one report row per employee.

pub mod adapters;
pub mod aggregator;
pub mod delivery;
pub mod domain;
pub mod fanout;
pub mod normalizer;
pub mod report;
pub mod resolver;
pub mod roster;
pub mod router;
pub mod service;
pub mod upstream;

#[cfg(test)]
mod tests;

pub use adapters::{adapter_for, RequestShape, SystemAdapter, SystemDescriptor};
pub use aggregator::{join_rows, ColumnSource, StatusIndex, SystemColumn};
pub use delivery::{DeliveryError, DeliveryRequest, DeliverySettings, ReportDelivery};
pub use domain::{
    EmployeeRecord, ReportRow, StatusCell, SystemId, SystemStatusCell, SystemStatusEntry,
    ValidationError,
};
pub use fanout::{FanOut, SystemRun};
pub use normalizer::{normalize, CanonicalStatus, StatusDomain};
pub use report::{ReportAssembler, ReportError};
pub use resolver::{
    resolve_employee, SingleEmployeeDetail, SingleEmployeeQuery, SingleEmployeeView,
    SystemLookupResult, SystemResults,
};
pub use roster::{HttpRosterProvider, RosterError, RosterProvider, RosterSource};
pub use router::{batch_error_response, batch_error_status, exit_router};
pub use service::{
    BatchError, BatchOutcome, BatchSummary, ConsolidatedRows, ExitStatusService, FailedSystem,
};
pub use upstream::{UpstreamClient, UpstreamError};
