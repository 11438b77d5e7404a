//! One adapter per downstream system, built from a declarative [`SystemDescriptor`].

mod batched;
mod descriptor;
mod per_employee;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use super::domain::{EmployeeRecord, SystemStatusEntry};
use super::upstream::{UpstreamClient, UpstreamError};

use batched::BatchedAdapter;
pub use descriptor::{RequestShape, SystemDescriptor};
use per_employee::PerEmployeeAdapter;

/// Translates the roster into one system's request and that system's response back into
/// raw status entries. Employees the system does not mention are simply absent.
#[async_trait]
pub trait SystemAdapter: Send + Sync + Debug {
    fn descriptor(&self) -> &SystemDescriptor;

    async fn fetch_statuses(
        &self,
        roster: &[EmployeeRecord],
    ) -> Result<Vec<SystemStatusEntry>, UpstreamError>;
}

/// Build the adapter variant matching the descriptor's request shape.
pub fn adapter_for(descriptor: SystemDescriptor, client: UpstreamClient) -> Arc<dyn SystemAdapter> {
    match descriptor.request.clone() {
        RequestShape::PerEmployee { service_key } => {
            Arc::new(PerEmployeeAdapter::new(descriptor, client, service_key))
        }
        RequestShape::Batched {
            result_key,
            envelope,
        } => Arc::new(BatchedAdapter::new(descriptor, client, result_key, envelope)),
    }
}
